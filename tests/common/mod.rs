#![allow(dead_code)]

use std::sync::Arc;

use ece_client::auth::{Session, UserSummary};
use ece_client::interceptor::{HistoryNavigator, NoticeQueue};
use ece_client::EceClient;
use serde_json::{json, Value};
use wiremock::MockServer;

pub struct Harness {
    pub client: EceClient,
    pub navigator: Arc<HistoryNavigator>,
    pub notices: Arc<NoticeQueue>,
}

pub fn harness(server: &MockServer) -> Harness {
    let _ = pretty_env_logger::try_init();

    let navigator = Arc::new(HistoryNavigator::new());
    let notices = Arc::new(NoticeQueue::new());
    let client = EceClient::new(&format!("{}/api", server.uri()))
        .unwrap()
        .with_navigator(navigator.clone())
        .with_notifier(notices.clone());

    Harness {
        client,
        navigator,
        notices,
    }
}

pub fn user_json(id: i64, username: &str, role: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{}@uci.cu", username),
        "first_name": "",
        "last_name": "",
        "role": role
    })
}

pub fn user(id: i64, username: &str, role: &str) -> UserSummary {
    serde_json::from_value(user_json(id, username, role)).unwrap()
}

/// Store a session as a previous login would have
pub fn log_in(client: &EceClient, access: &str, refresh: &str, role: &str) {
    client
        .session()
        .persist(&Session::new(
            access.to_string(),
            refresh.to_string(),
            Some(user(1, "usuario", role)),
        ))
        .unwrap();
}
