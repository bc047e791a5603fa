use std::net::TcpListener;
use std::sync::Arc;

use authgate::auth::{AuthenticationGate, BcryptPasswordHasher};
use authgate::configuration::get_configuration;
use authgate::startup::run;
use authgate::store::{CredentialStore, InMemoryCredentialStore, PostgresCredentialStore};
use authgate::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!(jwt = ?config.jwt, "Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let store: Arc<dyn CredentialStore> = match &configuration.database {
        Some(database) => {
            tracing::info!("Attempting to connect to database");
            let pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .connect(&database.connection_string())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create connection pool: {}", e);
                    std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "Database connection error",
                    )
                })?;

            sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
            })?;

            tracing::info!("Database connection pool created successfully");
            Arc::new(PostgresCredentialStore::new(pool))
        }
        None => {
            tracing::warn!("No database configured, using in-memory credential store");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let passwords = Arc::new(BcryptPasswordHasher::new(configuration.password.bcrypt_cost));
    let gate = AuthenticationGate::new(store, &configuration.jwt, passwords).map_err(|e| {
        tracing::error!("Failed to build authentication gate: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, gate)?.await
}
