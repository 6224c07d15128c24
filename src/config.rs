use std::net::IpAddr;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub environment: Environment,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub draft_ttl_secs: u64,
    pub submit_rate_limit: u32,
    pub submit_rate_window_secs: u64,
    pub static_dir: String,
    pub log_level: String,
    pub sheets: SheetsConfig,
}

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub service_account_email: String,
    pub private_key: String,
    pub spreadsheet_id: String,
    pub owner_email: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let sheets = SheetsConfig {
            service_account_email: env_required("GOOGLE_SERVICE_ACCOUNT_EMAIL")?,
            private_key: env_required("GOOGLE_PRIVATE_KEY")?,
            spreadsheet_id: env_required("GOOGLE_SHEETS_SHEET_ID")?,
            owner_email: env_required("GOOGLE_SHEETS_OWNER_EMAIL")?,
            timeout_secs: env_parse("PORTAL_SHEETS_TIMEOUT_SECS", "30")?,
        };

        let host: IpAddr = env_parse("PORTAL_HOST", "0.0.0.0")?;
        let port: u16 = env_parse("PORTAL_PORT", "3000")?;

        let environment = match env_or("PORTAL_ENV", "production").as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        };

        // Multipart uploads go through this limit too.
        let max_body_size: usize = env_parse("PORTAL_MAX_BODY_SIZE", "26214400")?;

        let trusted_proxies: Vec<IpNet> = env_or("PORTAL_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid PORTAL_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let draft_ttl_secs: u64 = env_parse("PORTAL_DRAFT_TTL_SECS", "7200")?;
        let submit_rate_limit: u32 = env_parse("PORTAL_SUBMIT_RATE_LIMIT", "5")?;
        let submit_rate_window_secs: u64 = env_parse("PORTAL_SUBMIT_RATE_WINDOW_SECS", "60")?;
        let static_dir = env_or("PORTAL_STATIC_DIR", "static");
        let log_level = env_or("PORTAL_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            environment,
            max_body_size,
            trusted_proxies,
            draft_ttl_secs,
            submit_rate_limit,
            submit_rate_window_secs,
            static_dir,
            log_level,
            sheets,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or(key, default)
        .parse()
        .map_err(|e| format!("Invalid {key}: {e}"))
}
