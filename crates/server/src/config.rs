use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub jwt_secret: String,
    pub jwt_expire_hours: i64,
    pub host: String,
    pub port: u16,
    /// Drop a match as soon as its last participant leaves. Off by default:
    /// matches live as long as the process.
    pub reclaim_empty_matches: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-key-change-in-production".to_string(),
            jwt_expire_hours: 168, // 7 days
            host: "0.0.0.0".to_string(),
            port: 8000,
            reclaim_empty_matches: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            jwt_secret: env::var("JWT_SECRET_KEY").unwrap_or(defaults.jwt_secret),
            jwt_expire_hours: env::var("JWT_EXPIRE_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.jwt_expire_hours),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            reclaim_empty_matches: env::var("RECLAIM_EMPTY_MATCHES")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.reclaim_empty_matches),
        }
    }
}
