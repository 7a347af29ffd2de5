use codebreak::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 4000;

#[tokio::main]
async fn main() -> Result<(), CodebreakError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = match std::env::var("PORT") {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(%raw, "PORT is not a valid port, using {DEFAULT_PORT}");
            DEFAULT_PORT
        }),
        Err(_) => DEFAULT_PORT,
    };

    let server = CodebreakServer::builder()
        .bind(&format!("0.0.0.0:{port}"))
        .registry_config(RegistryConfig::default())
        .build()
        .await?;
    server.run().await
}
