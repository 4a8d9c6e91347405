use tracing::{info, Instrument};
use user_admin::app_system::{setup_tracing, AdminConfig, AdminSystem};

#[tokio::main]
async fn main() -> Result<(), String> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();
    setup_tracing();

    let config = AdminConfig::from_env();
    info!(api = %config.api_base_url, path = %config.resource_path, "Starting user admin");

    let system = AdminSystem::new(config)?;

    let span = tracing::info_span!("initial_load");
    let users = async {
        info!("Loading users");
        system.user_client.list_users().await.map_err(|e| e.to_string())
    }
    .instrument(span)
    .await;

    match users {
        Ok(users) => {
            info!(count = users.len(), "Users loaded");
            for user in users.iter() {
                info!(id = %user.id, name = %user.name, role = %user.role, status = %user.status, "User");
            }
        }
        Err(e) => {
            system.shutdown().await?;
            return Err(e);
        }
    }

    system.shutdown().await
}
