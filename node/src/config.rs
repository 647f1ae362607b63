use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    /// Directory holding the ledger journal. Created on startup.
    pub data_dir: PathBuf,
    /// Bearer token required on /v1 routes when set.
    pub auth_token: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:4380".parse().unwrap(),
            data_dir: PathBuf::from("./data"),
            auth_token: None,
        }
    }
}

impl NodeConfig {
    /// Defaults overridden by TRACELINE_BIND, TRACELINE_DATA_DIR, and
    /// TRACELINE_AUTH_TOKEN.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(bind) = std::env::var("TRACELINE_BIND") {
            match bind.parse() {
                Ok(addr) => cfg.bind_addr = addr,
                Err(_) => tracing::warn!("Ignoring unparseable TRACELINE_BIND: {bind}"),
            }
        }
        if let Ok(dir) = std::env::var("TRACELINE_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Ok(token) = std::env::var("TRACELINE_AUTH_TOKEN") {
            if !token.is_empty() {
                cfg.auth_token = Some(token);
            }
        }
        cfg
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join("ledger.journal")
    }
}
