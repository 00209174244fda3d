// src/config/mod.rs
// All tunables load from the environment (.env supported); endpoints default
// to the public USGS services.

use once_cell::sync::Lazy;

#[derive(Debug, Clone)]
pub struct NwisMcpConfig {
    // ── USGS endpoints
    pub waterservices_base_url: String,
    pub waterdata_base_url: String,
    pub wateruse_base_url: String,

    // ── HTTP client
    pub request_timeout_secs: u64,
    pub user_agent: String,

    // ── Anthropic (conversational driver)
    pub anthropic_base_url: String,
    pub anthropic_model: String,
    pub anthropic_max_tokens: u32,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a valid number, got '{}'", key, raw)),
        Err(_) => default,
    }
}

impl NwisMcpConfig {
    fn from_env() -> Self {
        Self {
            waterservices_base_url: env_or(
                "NWIS_WATERSERVICES_URL",
                "https://waterservices.usgs.gov",
            ),
            waterdata_base_url: env_or("NWIS_WATERDATA_URL", "https://nwis.waterdata.usgs.gov"),
            wateruse_base_url: env_or("NWIS_WATERUSE_URL", "https://waterdata.usgs.gov"),
            request_timeout_secs: env_parse("NWIS_REQUEST_TIMEOUT_SECS", 60),
            user_agent: env_or(
                "NWIS_USER_AGENT",
                concat!("nwis-mcp/", env!("CARGO_PKG_VERSION")),
            ),
            anthropic_base_url: env_or("ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
            anthropic_model: env_or("ANTHROPIC_MODEL", "claude-3-haiku-20240307"),
            anthropic_max_tokens: env_parse("ANTHROPIC_MAX_TOKENS", 1024u32),
        }
    }
}

pub static CONFIG: Lazy<NwisMcpConfig> = Lazy::new(|| {
    dotenvy::dotenv().ok();
    NwisMcpConfig::from_env()
});
