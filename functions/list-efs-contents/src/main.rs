//! list-efs-contents
//!
//! Custom-runtime Lambda behind the BRender REST API. Lists the shared render
//! file system, mounted through its access point at `EFS_MOUNT_PATH`.

mod error;
mod handler;
mod listing;
mod runtime;
#[cfg(test)]
mod runtime_test;

use anyhow::{Context, Result};
use lambda_runtime_client::{ErrorReport, RuntimeApi, RuntimeClient};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Variable naming the local mount path, set by the stack
const MOUNT_PATH_ENV: &str = "EFS_MOUNT_PATH";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .with_writer(std::io::stderr)
        .init();

    let client = RuntimeClient::from_env().context("Failed to create Runtime API client")?;

    let root = match std::env::var(MOUNT_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => {
            let report = ErrorReport::new("Runtime.Configuration", &format!("{MOUNT_PATH_ENV} is not set"));
            client
                .send_init_error(&report)
                .await
                .context("Failed to report initialization error")?;
            anyhow::bail!("{MOUNT_PATH_ENV} is not set");
        }
    };

    info!("Serving listings of {}", root.display());
    runtime::run(&client, &root).await.context("Runtime API loop stopped")?;
    Ok(())
}
