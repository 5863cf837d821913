//! Fixed API paths, relative to the configured base URL.
//!
//! Collection paths end with a slash, as the server expects.

// Auth
pub const LOGIN: &str = "/auth/login/";
pub const REGISTER: &str = "/auth/register/";
pub const LOGOUT: &str = "/auth/logout/";
pub const PROFILE: &str = "/auth/profile/";
pub const PROFILE_STATS: &str = "/auth/profile/stats/";
pub const CHANGE_PASSWORD: &str = "/auth/change-password/";
pub const TOKEN_REFRESH: &str = "/token/refresh/";

// Users
pub const USERS: &str = "/auth/users/";
pub const USERS_ME: &str = "/auth/users/me/";
pub const USERS_STUDENTS: &str = "/auth/users/estudiantes/";
pub const USERS_TUTORS: &str = "/auth/users/tutores/";
pub const USERS_STATS: &str = "/auth/users/stats/";

// Publications
pub const PUBLICATIONS: &str = "/publications/";
pub const TUTOR_OPINIONS: &str = "/publications/tutor-opinions/";
pub const TUTOR_STUDENTS: &str = "/publications/tutor-students/";

// ECE requests and administration
pub const ECE_REQUESTS: &str = "/requests/";
pub const SYSTEM_LOGS: &str = "/requests/system-logs/";
pub const SYSTEM_CONFIG: &str = "/requests/system-config/";
pub const NOTIFICATIONS: &str = "/requests/notifications/";

/// `{collection}{id}/`
pub fn detail(collection: &str, id: i64) -> String {
    format!("{}{}/", collection, id)
}

/// `{collection}{id}/{action}/`
pub fn detail_action(collection: &str, id: i64, action: &str) -> String {
    format!("{}{}/{}/", collection, id, action)
}

/// `{collection}{action}/`
pub fn list_action(collection: &str, action: &str) -> String {
    format!("{}{}/", collection, action)
}
