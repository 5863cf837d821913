mod common;

use chrono::NaiveDate;
use common::{harness, log_in, user_json};
use ece_client::admin::{LogAction, LogFilter, NotificationFilter, Severity};
use ece_client::auth::Role;
use ece_client::fetch::Upload;
use ece_client::opinions::{OpinionDraft, Recommendation};
use ece_client::publications::{Nivel, NewPublication, PublicationStatus, PublicationUpdate};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn publication_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "student": 1,
        "title": "Redes definidas por software",
        "authors": "A. Pérez, J. Gómez",
        "journal": "Revista Cubana de Ciencias Informáticas",
        "abstract": "Estudio de controladores SDN",
        "nivel": "2",
        "status": status
    })
}

fn log_json(id: i64, action: &str) -> Value {
    json!({
        "id": id,
        "user": 3,
        "user_name": "admin",
        "action": action,
        "model_name": "Publication",
        "object_id": 9,
        "description": "Publicación aprobada",
        "created_at": "2026-05-14T09:30:00Z"
    })
}

#[tokio::test]
async fn test_publication_create_sends_spanish_form_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/publications/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(publication_json(11, "en_proceso")))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    log_in(&h.client, "token", "refresh", "estudiante");

    let mut new = NewPublication::new("Redes definidas por software", "A. Pérez, J. Gómez", Nivel::Dos);
    new.fecha_publicacion = NaiveDate::from_ymd_opt(2026, 2, 1);
    new.archivo = Some(Upload::new("articulo.pdf", b"%PDF".to_vec()).with_mime("application/pdf"));

    let created = h.client.publications().create(&new).await.unwrap();
    assert_eq!(created.status, PublicationStatus::EnProceso);
    assert_eq!(created.nivel, Nivel::Dos);
    assert_eq!(created.summary.as_deref(), Some("Estudio de controladores SDN"));

    let received = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&received[0].body);
    assert!(body.contains("name=\"titulo\""));
    assert!(body.contains("name=\"fecha_publicacion\"\r\n\r\n2026-02-01"));
    assert!(body.contains("name=\"archivo\"; filename=\"articulo.pdf\""));
    assert!(body.contains("application/pdf"));
}

#[tokio::test]
async fn test_publication_update_is_a_multipart_patch() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/publications/11/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(publication_json(11, "en_proceso")))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    log_in(&h.client, "token", "refresh", "estudiante");

    let update = PublicationUpdate {
        summary: Some("Nuevo resumen".into()),
        ..Default::default()
    };
    h.client.publications().update(11, &update).await.unwrap();

    let received = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&received[0].body);
    assert!(body.contains("name=\"abstract\""));
    assert!(!body.contains("name=\"title\""));
}

#[tokio::test]
async fn test_publication_workflow_actions() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/publications/11/submit_for_review/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Publicación enviada a revisión",
            "publication": publication_json(11, "pending")
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/publications/11/review/"))
        .and(body_json(json!({ "is_approved": false, "comments": "Falta el DOI" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Publicación rechazada",
            "publication": publication_json(11, "rejected")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    log_in(&h.client, "token", "refresh", "jefe");

    let submitted = h.client.publications().submit_for_review(11).await.unwrap();
    assert_eq!(submitted.item.status, PublicationStatus::Pending);

    let reviewed = h
        .client
        .publications()
        .review(11, false, Some("Falta el DOI"))
        .await
        .unwrap();
    assert_eq!(reviewed.item.status, PublicationStatus::Rejected);
}

#[tokio::test]
async fn test_opinions_and_assignments() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/publications/tutor-opinions/"))
        .and(body_json(json!({
            "publication": 11,
            "opinion": "Trabajo sólido",
            "recommendation": "aprobada"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 1,
            "publication": 11,
            "tutor": 2,
            "opinion": "Trabajo sólido",
            "recommendation": "aprobada"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/publications/tutor-students/"))
        .and(query_param("is_active", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/publications/tutor-students/4/"))
        .and(body_json(json!({ "progress": 100 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4, "tutor": 2, "student": 1, "progress": 100
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    log_in(&h.client, "token", "refresh", "tutor");

    let opinion = h
        .client
        .opinions()
        .create(11, &OpinionDraft::new("Trabajo sólido", Recommendation::Aprobada))
        .await
        .unwrap();
    assert_eq!(opinion.recommendation, Recommendation::Aprobada);

    assert!(h.client.tutor_students().list(true).await.unwrap().is_empty());

    let assignment = h.client.tutor_students().update_progress(4, 150).await.unwrap();
    assert_eq!(assignment.progress, 100);
    assert!(assignment.is_active);
}

#[tokio::test]
async fn test_users_filtered_by_role() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/users/"))
        .and(query_param("role", "tutor"))
        .and(query_param("activo", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": null,
            "previous": null,
            "results": [user_json(2, "tutor1", "tutor"), user_json(5, "tutor2", "tutor")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    log_in(&h.client, "token", "refresh", "admin");

    let tutors = h.client.users().list(Some(Role::Tutor), Some(true)).await.unwrap();
    assert_eq!(tutors.len(), 2);
    assert!(tutors.iter().all(|u| u.role == Role::Tutor));
}

#[tokio::test]
async fn test_system_logs_page_and_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/requests/system-logs/"))
        .and(query_param("action", "approve"))
        .and(query_param("created_at__gte", "2026-05-01"))
        .and(query_param("created_at__lte", "2026-05-31"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 21,
            "next": null,
            "previous": "http://127.0.0.1:8000/api/requests/system-logs/?page=1",
            "results": [log_json(21, "approve")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/requests/system-logs/by_user/"))
        .and(query_param("user_id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([log_json(1, "login")])))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    log_in(&h.client, "token", "refresh", "admin");

    let filter = LogFilter {
        action: Some(LogAction::Approve),
        from: NaiveDate::from_ymd_opt(2026, 5, 1),
        to: NaiveDate::from_ymd_opt(2026, 5, 31),
        page: Some(2),
        ..Default::default()
    };
    let page = h.client.system_logs().list(&filter).await.unwrap();
    assert_eq!(page.count, 21);
    assert!(!page.has_next());
    assert!(page.results.iter().all(|log| filter.matches(log)));

    let by_user = h.client.system_logs().by_user(3).await.unwrap();
    assert_eq!(by_user[0].action, LogAction::Login);
}

#[tokio::test]
async fn test_system_logs_with_security_entries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/requests/system-logs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 4,
            "next": null,
            "previous": null,
            "results": [
                log_json(1, "login"),
                log_json(2, "unauthorized_attempt"),
                log_json(3, "login_failed"),
                log_json(4, "session_hijack")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    log_in(&h.client, "token", "refresh", "admin");

    let page = h.client.system_logs().list(&LogFilter::default()).await.unwrap();
    let actions = page.results.iter().map(|log| log.action).collect::<Vec<_>>();
    assert_eq!(
        actions,
        vec![
            LogAction::Login,
            LogAction::UnauthorizedAttempt,
            LogAction::LoginFailed,
            LogAction::Other
        ]
    );
    assert_eq!(page.results[1].action.label(), "Intento de Acceso No Autorizado");
    assert!(h.notices.is_empty());
}

#[tokio::test]
async fn test_config_upsert_creates_missing_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/requests/system-config/"))
        .and(query_param("key", "tiempo_sesion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "key": "email_contacto", "value": "soporte@uci.cu" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/requests/system-config/"))
        .and(body_json(json!({ "key": "tiempo_sesion", "value": "60" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 2, "key": "tiempo_sesion", "value": "60", "is_active": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    log_in(&h.client, "token", "refresh", "admin");

    let entry = h
        .client
        .system_config()
        .upsert("tiempo_sesion", &json!(60), None)
        .await
        .unwrap();
    assert_eq!(entry.parsed_value(), json!(60));
}

#[tokio::test]
async fn test_config_upsert_replaces_existing_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/requests/system-config/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 7, "key": "requiere_2fa", "value": "false" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/requests/system-config/7/"))
        .and(body_json(json!({
            "key": "requiere_2fa",
            "value": "true",
            "description": "Autenticación en dos pasos"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "key": "requiere_2fa", "value": "true"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    log_in(&h.client, "token", "refresh", "admin");

    let entry = h
        .client
        .system_config()
        .upsert("requiere_2fa", &json!(true), Some("Autenticación en dos pasos"))
        .await
        .unwrap();
    assert_eq!(entry.parsed_value(), json!(true));
}

#[tokio::test]
async fn test_notifications() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/requests/notifications/"))
        .and(query_param("severity", "critical"))
        .and(query_param("is_read", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 3,
            "notification_type": "failed_login",
            "severity": "critical",
            "title": "Intentos fallidos",
            "message": "5 intentos fallidos para admin"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/requests/notifications/stats/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 10, "unread": 4, "pending": 3, "resolved": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/requests/notifications/3/mark_read/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Notificación marcada como leída",
            "notification": {
                "id": 3,
                "notification_type": "failed_login",
                "severity": "critical",
                "title": "Intentos fallidos",
                "message": "5 intentos fallidos para admin",
                "is_read": true
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    log_in(&h.client, "token", "refresh", "admin");

    let filter = NotificationFilter {
        severity: Some(Severity::Critical),
        is_read: Some(false),
        ..Default::default()
    };
    let notifications = h.client.notifications().list(&filter).await.unwrap();
    assert_eq!(notifications.len(), 1);

    assert_eq!(h.client.notifications().unread_count().await.unwrap(), 4);

    let read = h.client.notifications().mark_read(3).await.unwrap();
    assert!(read.item.is_read);
}

#[tokio::test]
async fn test_delete_accepts_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/publications/11/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    log_in(&h.client, "token", "refresh", "estudiante");

    h.client.publications().delete(11).await.unwrap();
    assert!(h.notices.is_empty());
}
