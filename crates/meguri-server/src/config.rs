//! Server configuration.

use clap::Parser;
use std::path::PathBuf;

/// Where the server listens and where it keeps its workflows.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "meguri-server", version, about = "Finite-state workflow engine over HTTP")]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, env = "MEGURI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind.
    #[arg(long, short, env = "MEGURI_PORT", default_value_t = 5080)]
    pub port: u16,

    /// JSON file holding every workflow.
    #[arg(long, env = "MEGURI_STORE", default_value = "workflows.json")]
    pub store_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5080,
            store_path: PathBuf::from("workflows.json"),
        }
    }
}

impl ServerConfig {
    /// The `host:port` string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
