use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Storage
    pub database_path: String,

    // Content
    pub locales_dir: String,
    pub content_dir: String,

    // Geolocation (ipinfo.io)
    pub ipinfo_token: Option<String>,
    pub geo_api_url: String,

    // Dashboard operator credentials
    pub dashboard_email: String,
    pub dashboard_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            // Storage
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/cv-site.db".to_string()),

            // Content
            locales_dir: std::env::var("LOCALES_DIR")
                .unwrap_or_else(|_| "locales".to_string()),
            content_dir: std::env::var("CONTENT_DIR")
                .unwrap_or_else(|_| "content".to_string()),

            // Geolocation - lookups are skipped entirely without a token
            ipinfo_token: std::env::var("IPINFO_TOKEN").ok(),
            geo_api_url: std::env::var("GEO_API_URL")
                .unwrap_or_else(|_| "https://ipinfo.io".to_string()),

            // Dashboard
            dashboard_email: std::env::var("DASHBOARD_EMAIL")
                .context("DASHBOARD_EMAIL not set")?,
            dashboard_password: std::env::var("DASHBOARD_PASSWORD")
                .context("DASHBOARD_PASSWORD not set")?,
        })
    }
}
