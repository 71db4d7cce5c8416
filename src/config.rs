use std::env;

/// Application configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub database_name: String,
    pub bind_address: String,
    pub port: u16,
    pub pin_secret: String,
    pub program_admin_code: Option<String>,
    pub admin_reset_code: Option<String>,
    pub allowed_origin: Option<String>,
    pub log_level: String,
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let mongodb_uri =
            optional("MONGODB_URI").ok_or("MONGODB_URI environment variable is required")?;
        let pin_secret =
            optional("PIN_SECRET").ok_or("PIN_SECRET environment variable is required")?;

        let port = match optional("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("PORT must be a valid port number, got {:?}", raw))?,
            None => 8080,
        };

        Ok(Self {
            mongodb_uri,
            database_name: optional("DATABASE_NAME").unwrap_or_else(|| "OpenSplit".to_string()),
            bind_address: optional("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            pin_secret,
            program_admin_code: optional("PROGRAM_ADMIN_CODE"),
            admin_reset_code: optional("ADMIN_RESET_CODE"),
            allowed_origin: optional("ALLOWED_ORIGIN"),
            log_level: optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}
