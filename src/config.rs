use serde::Deserialize;
use std::fs;

fn default_notifications() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    300
}

fn default_first_check_delay() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api_key: String,
    pub from_currency: String,
    pub to_currency: String,
    #[serde(default = "default_notifications")]
    pub notifications_enabled: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_first_check_delay")]
    pub first_check_delay_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: "demo".to_string(),
            from_currency: "EUR".to_string(),
            to_currency: "USD".to_string(),
            notifications_enabled: true,
            poll_interval_seconds: default_poll_interval(),
            first_check_delay_seconds: default_first_check_delay(),
        }
    }
}

impl AppConfig {
    pub fn pair_symbol(&self) -> String {
        format!("{}{}", self.from_currency, self.to_currency)
    }
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
