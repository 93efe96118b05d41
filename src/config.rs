use std::env;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub authority_url: String,
    pub request_timeout_ms: u64,
    pub debounce_ms: u64,
    pub storage_dir: String,
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let authority_url = env::var("PRICING_AUTHORITY_URL")?;
        let request_timeout_ms = env::var("REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5000);
        let debounce_ms = env::var("EVALUATE_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(300);
        let storage_dir = env::var("CART_STORAGE_DIR").unwrap_or_else(|_| ".cart".to_string());
        Ok(Self {
            authority_url,
            request_timeout_ms,
            debounce_ms,
            storage_dir,
        })
    }
}
