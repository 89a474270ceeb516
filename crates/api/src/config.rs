//! Process configuration, read from the environment.

/// Runtime configuration.
///
/// Every field has a development default so the service starts with no
/// environment at all; production deployments set the real values.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Absent means the in-memory store
    /// (tests/dev only — nothing survives a restart).
    pub database_url: Option<String>,

    /// HS256 secret for bearer-token validation.
    pub jwt_secret: String,

    /// Address the HTTP listener binds to.
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.is_empty());

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let bind_addr = format!("0.0.0.0:{port}");

        Self {
            database_url,
            jwt_secret,
            bind_addr,
        }
    }
}
