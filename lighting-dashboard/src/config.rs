use serde::Deserialize;
use std::fs;

pub const CONFIG_ENV: &str = "LIGHTING_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "lighting-config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub kind: StoreKind,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Users granted `admin` when the memory store is used.
    #[serde(default)]
    pub memory_admin_user_ids: Vec<String>,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub token: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff_ms: 200,
            overwrite: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub rows_per_page: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { rows_per_page: 40 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub export: ExportConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config file '{path}': {e}"))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        if cfg.store.kind == StoreKind::Postgres && cfg.store.uri.is_none() {
            anyhow::bail!("store.uri is required when store.kind = \"postgres\"");
        }
        Ok(cfg)
    }
}
