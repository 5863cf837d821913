use dotenv::dotenv;
use ece_client::admin::{LogFilter, NotificationFilter, SystemConfigClient};
use ece_client::auth::{Credentials, Role};
use ece_client::config::ClientOptions;
use ece_client::EceClient;
use std::env;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    pretty_env_logger::init();

    let client = EceClient::new_with_options(ClientOptions::from_env()?)?;

    if !client.guard(Role::Admin).render(()).is_render() {
        let username = env::var("ECE_ADMIN_USERNAME").expect("ECE_ADMIN_USERNAME must be set");
        let password = env::var("ECE_ADMIN_PASSWORD").expect("ECE_ADMIN_PASSWORD must be set");
        client
            .auth()
            .login(&Credentials::new(&username, &password))
            .await?;
    }

    if !client.guard(Role::Admin).render(()).is_render() {
        eprintln!("This dashboard is for administrators only");
        client.auth().logout().await?;
        return Ok(());
    }

    // Configuration
    let entries = client.system_config().list().await?;
    println!("Configuration ({} entries)", entries.len());
    for entry in &entries {
        println!("  {} = {}", entry.key, entry.parsed_value());
    }
    if let Some(minutes) = SystemConfigClient::apply_session_timeout(&entries, client.session())? {
        println!("Session timeout: {} minutes", minutes);
    }

    // Notifications
    let unread = client.notifications().unread_count().await?;
    println!("\n{} unread notifications", unread);
    let filter = NotificationFilter {
        is_resolved: Some(false),
        ..Default::default()
    };
    let mut open = client.notifications().list(&filter).await?;
    open.sort_by(|a, b| b.severity.cmp(&a.severity));
    for notification in open.iter().take(10) {
        println!(
            "  [{}] {}: {}",
            notification.severity.label(),
            notification.notification_type.label(),
            notification.title
        );
    }

    // Audit log
    let page = client.system_logs().list(&LogFilter::default()).await?;
    println!("\nAudit log: {} entries", page.count);
    for entry in page.results.iter().take(10) {
        println!(
            "  {} {} {} {}",
            entry.created_at,
            entry.user_name.as_deref().unwrap_or("Sistema"),
            entry.action.label(),
            entry.description
        );
    }

    let stats = client.users().stats().await?;
    println!("\nUsers by role: {}", serde_json::to_string(&stats.por_rol)?);

    Ok(())
}
