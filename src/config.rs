use std::env;

/// SMTP settings for the password-reset delivery collaborator.
///
/// Only assembled when `SMTP_HOST` is present; without it the application
/// falls back to logging reset links instead of emailing them.
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    /// Session token validity window in hours (2 days by default).
    pub token_ttl_hours: i64,
    /// Password-reset credential validity window in minutes.
    pub reset_ttl_minutes: i64,
    /// bcrypt work factor for password hashing.
    pub bcrypt_cost: u32,
    /// Directory holding uploaded avatar files, for best-effort cleanup.
    pub uploads_dir: String,
    /// Base URL embedded in password-reset links.
    pub app_base_url: String,
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        let smtp = env::var("SMTP_HOST").ok().map(|host| SmtpConfig {
            host,
            port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .expect("SMTP_PORT must be a number"),
            username: env::var("SMTP_USERNAME").expect("SMTP_USERNAME must be set with SMTP_HOST"),
            password: env::var("SMTP_PASSWORD").expect("SMTP_PASSWORD must be set with SMTP_HOST"),
            from: env::var("SMTP_FROM").expect("SMTP_FROM must be set with SMTP_HOST"),
        });

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "48".to_string())
                .parse()
                .expect("TOKEN_TTL_HOURS must be a number"),
            reset_ttl_minutes: env::var("RESET_TTL_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("RESET_TTL_MINUTES must be a number"),
            bcrypt_cost: env::var("BCRYPT_COST")
                .unwrap_or_else(|_| "12".to_string())
                .parse()
                .expect("BCRYPT_COST must be a number"),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            smtp,
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
