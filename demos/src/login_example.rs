use dotenv::dotenv;
use ece_client::auth::{Credentials, Role};
use ece_client::config::ClientOptions;
use ece_client::guard::GuardOutput;
use ece_client::EceClient;
use std::env;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();
    pretty_env_logger::init();

    // ECE_API_URL and ECE_SESSION_FILE are read here
    let options = ClientOptions::from_env()?;
    let username = env::var("ECE_USERNAME").expect("ECE_USERNAME must be set");
    let password = env::var("ECE_PASSWORD").expect("ECE_PASSWORD must be set");

    let client = EceClient::new_with_options(options)?;

    if client.auth().is_authenticated() {
        println!("Reusing stored session for {}", client.auth().display_name());
    } else {
        println!("Logging in as {}", username);
        let session = client
            .auth()
            .login(&Credentials::new(&username, &password))
            .await?;
        log::info!("Access token expires at {:?}", session.expires_at().ok().flatten());
    }

    let user = client.auth().get_profile().await?;
    println!("Hola, {} ({})", user.full_name(), user.role.label());

    for role in Role::ALL {
        let verdict = match client.guard(role).render(()) {
            GuardOutput::Render(()) => "allowed".to_string(),
            GuardOutput::Redirect(route) => format!("redirect to {}", route),
            GuardOutput::Loading => "loading".to_string(),
        };
        println!("  {} area: {}", role.label(), verdict);
    }

    match user.role {
        Role::Estudiante => {
            let publications = client.publications().list_mine().await?;
            println!("\n{} publications", publications.len());
            for publication in publications {
                println!("  [{}] {}", publication.status.label(), publication.title);
            }

            let requests = client.requests().list_mine().await?;
            println!("{} ECE requests", requests.len());
        }
        Role::Tutor => {
            let students = client.tutor_students().my_students().await?;
            println!("\n{} students assigned", students.len());
            let pending = client.opinions().pending_publications().await?;
            println!("{} publications waiting for an opinion", pending.len());
        }
        Role::Jefe => {
            let pending = client.publications().pending_review().await?;
            println!("\n{} publications to review", pending.len());
            let stats = client.requests().stats().await?;
            println!("{} requests, {} pending", stats.total, stats.pendientes);
        }
        Role::Admin => {
            let stats = client.users().stats().await?;
            println!("\n{} users, {} active", stats.total, stats.activos);
        }
    }

    if env::var("ECE_KEEP_SESSION").is_err() {
        println!("\nLogging out");
        client.auth().logout().await?;
    }

    Ok(())
}
