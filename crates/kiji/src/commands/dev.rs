//! Development server command.

use std::path::Path;

use anyhow::Result;
use kiji_server::{DevServer, DevServerConfig};

use crate::config::load_config;

/// Run the dev server.
pub async fn run(config_path: &Path, port: Option<u16>, open: bool) -> Result<()> {
    let file_config = load_config(config_path)?;
    let port = port.unwrap_or(file_config.server.port);

    tracing::info!("Starting development server on port {}", port);

    let config = DevServerConfig {
        content_dir: file_config.content.dir,
        public_dir: file_config.content.public_dir,
        port,
        host: file_config.server.host,
        open,
        live_reload: file_config.server.live_reload,
        site: file_config.site.with_env_overrides(),
        // Resolved from the environment on every request
        visibility: None,
    };

    DevServer::new(config).start().await?;

    Ok(())
}
