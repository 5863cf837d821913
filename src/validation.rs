//! Client-side checks run by forms before anything is sent.
//!
//! The façades never call these; the server validates again on its side.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::auth::ProfileUpdate;
use crate::error::FieldErrors;
use crate::fetch::Upload;

static ALPHA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-zÁÉÍÓÚáéíóúÑñ\s'-]+$").expect("alpha pattern"));
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9+()\-\s]+$").expect("phone pattern"));
static INSTITUTIONAL_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Za-z0-9._%+-]+@(uci\.cu|estudiantes\.uci\.cu)$").expect("email pattern")
});

/// Default upload size limit, in megabytes
pub const MAX_UPLOAD_MB: u64 = 10;
pub const PUBLICATION_EXTENSIONS: &[&str] = &[".pdf"];
pub const REQUEST_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx"];

/// Letters (Spanish accents included), spaces, hyphens and apostrophes
pub fn is_alpha(value: &str) -> bool {
    ALPHA.is_match(value.trim())
}

/// Digits, spaces and `+()-`
pub fn is_numeric_phone(value: &str) -> bool {
    PHONE.is_match(value.trim())
}

/// `@uci.cu` or `@estudiantes.uci.cu` address
pub fn is_institutional_email(value: &str) -> bool {
    INSTITUTIONAL_EMAIL.is_match(value.trim())
}

/// Length in characters, ignoring surrounding whitespace
pub fn min_length(value: &str, len: usize) -> bool {
    value.trim().chars().count() >= len
}

pub fn max_length(value: &str, len: usize) -> bool {
    value.trim().chars().count() <= len
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// Check the fields of a profile update. Empty optional text is accepted.
pub fn validate_profile(update: &ProfileUpdate) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Some(email) = &update.email {
        if !is_institutional_email(email) {
            push(
                &mut errors,
                "email",
                "Correo no válido. Use una cuenta institucional @uci.cu o @estudiantes.uci.cu.",
            );
        }
    }

    if let Some(phone) = update.telefono.as_deref().filter(|p| !p.is_empty()) {
        if !is_numeric_phone(phone) {
            push(
                &mut errors,
                "telefono",
                "El teléfono solo debe contener números, espacios o símbolos +()-.",
            );
        }
    }

    let alpha_fields = [
        ("first_name", &update.first_name, "El nombre solo debe contener letras y espacios."),
        ("last_name", &update.last_name, "El apellido solo debe contener letras y espacios."),
        ("carrera", &update.carrera, "La carrera solo debe contener letras y espacios."),
        (
            "especialidad",
            &update.especialidad,
            "La especialidad solo debe contener letras y espacios.",
        ),
    ];
    for (field, value, message) in alpha_fields {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            if !is_alpha(value) {
                push(&mut errors, field, message);
            }
        }
    }

    errors
}

/// Check an upload against a size limit and a list of extensions
/// (lowercase, with the dot).
pub fn validate_upload(upload: &Upload, max_mb: u64, allowed_extensions: &[&str]) -> Result<(), String> {
    if upload.size() > max_mb * 1024 * 1024 {
        return Err(format!("El archivo no puede superar los {}MB", max_mb));
    }

    let name = upload.file_name.to_lowercase();
    let extension = name.rfind('.').map(|i| &name[i..]).unwrap_or("");
    if !allowed_extensions.contains(&extension) {
        return Err(format!(
            "Solo se permiten archivos {}",
            allowed_extensions.join(", ")
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validators() {
        assert!(is_alpha("José Ñúñez-O'Neil"));
        assert!(!is_alpha("R2D2"));
        assert!(!is_alpha("   "));
        assert!(is_numeric_phone("+53 (7) 835-8000"));
        assert!(!is_numeric_phone("53-abc"));
        assert!(is_institutional_email("ana.perez@estudiantes.uci.cu"));
        assert!(is_institutional_email("JEFE@UCI.CU"));
        assert!(!is_institutional_email("ana@gmail.com"));
        assert!(min_length(" ñandú ", 5));
        assert!(!max_length("abcdef", 5));
    }

    #[test]
    fn test_validate_profile() {
        let update = ProfileUpdate {
            email: Some("ana@gmail.com".into()),
            first_name: Some("Ana".into()),
            last_name: Some("P3rez".into()),
            telefono: Some(String::new()),
            ..Default::default()
        };
        let errors = validate_profile(&update);
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("last_name"));

        assert!(validate_profile(&ProfileUpdate::default()).is_empty());
    }

    #[test]
    fn test_validate_upload() {
        let pdf = Upload::new("Tesis.PDF", vec![0; 1024]);
        assert!(validate_upload(&pdf, MAX_UPLOAD_MB, PUBLICATION_EXTENSIONS).is_ok());

        let doc = Upload::new("solicitud.docx", vec![0; 16]);
        assert!(validate_upload(&doc, MAX_UPLOAD_MB, PUBLICATION_EXTENSIONS).is_err());
        assert!(validate_upload(&doc, MAX_UPLOAD_MB, REQUEST_EXTENSIONS).is_ok());

        let large = Upload::new("grande.pdf", vec![0; 2 * 1024 * 1024]);
        assert_eq!(
            validate_upload(&large, 1, PUBLICATION_EXTENSIONS).unwrap_err(),
            "El archivo no puede superar los 1MB"
        );

        let no_extension = Upload::new("archivo", vec![1]);
        assert!(validate_upload(&no_extension, MAX_UPLOAD_MB, REQUEST_EXTENSIONS).is_err());
    }
}
