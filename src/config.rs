// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Default number of questions when a quiz request omits `count`.
pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Default quiz duration in seconds.
pub const DEFAULT_DURATION_SECONDS: i64 = 600;

/// Number of questions served by a practice (demo) quiz.
pub const DEMO_QUESTION_COUNT: usize = 10;

/// Duration of a practice (demo) quiz in seconds.
pub const DEMO_DURATION_SECONDS: i64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Shared code required to register as faculty. Faculty registration is
    /// refused when unset.
    pub faculty_code: Option<String>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            faculty_code: env::var("FACULTY_CODE").ok().filter(|c| !c.is_empty()),
            port,
        }
    }
}
