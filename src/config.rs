pub const DEFAULT_JWT_SECRET: &str = "secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Staging,
    Testing,
    Production,
}

impl AppEnv {
    /// Unknown or missing values fall back to development.
    fn parse(raw: Option<String>) -> Self {
        match raw.map(|v| v.to_lowercase()).as_deref() {
            Some("staging") => AppEnv::Staging,
            Some("testing") => AppEnv::Testing,
            Some("production") => AppEnv::Production,
            _ => AppEnv::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: String,
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.name, self.ssl_mode
        )
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl JwtConfig {
    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_JWT_SECRET
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig").field("secret", &"<redacted>").finish()
    }
}

#[derive(Debug, Clone)]
pub struct OtelConfig {
    pub endpoint: String,
}

impl OtelConfig {
    /// Collector URL for the gRPC exporters; bare `host:port` values get `http://`.
    pub fn collector_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("http://{}", self.endpoint)
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: AppEnv,
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub otel: OtelConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let env = AppEnv::parse(lookup("APP_ENV"));
        let http = HttpConfig {
            host: var("APP_HOST", "0.0.0.0"),
            port: var("HTTP_PORT", "8080")
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid HTTP_PORT: {e}"))?,
        };
        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            host: var("DB_HOST", "localhost"),
            port: var("DB_PORT", "5432")
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid DB_PORT: {e}"))?,
            user: var("DB_USER", "postgres"),
            password: lookup("DB_PASS").unwrap_or_default(),
            name: var("DB_NAME", "postgres"),
            ssl_mode: var("DB_SSL_MODE", "disable"),
        };
        let jwt = JwtConfig {
            secret: var("JWT_SECRET", DEFAULT_JWT_SECRET),
        };
        let otel = OtelConfig {
            endpoint: var("OTEL_ENDPOINT", "localhost:4317"),
        };

        let config = Self {
            env,
            http,
            database,
            jwt,
            otel,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.env == AppEnv::Production && self.jwt.uses_default_secret() {
            anyhow::bail!("JWT_SECRET must be set explicitly in production");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).expect("defaults load");
        assert_eq!(config.env, AppEnv::Development);
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.otel.endpoint, "localhost:4317");
        assert!(config.jwt.uses_default_secret());
        assert_eq!(
            config.database.connection_url(),
            "postgres://postgres:@localhost:5432/postgres?sslmode=disable"
        );
    }

    #[test]
    fn database_url_overrides_components() {
        let config = load(&[
            ("DATABASE_URL", "postgres://u:p@db:5433/auth"),
            ("DB_HOST", "ignored"),
        ])
        .expect("load");
        assert_eq!(config.database.connection_url(), "postgres://u:p@db:5433/auth");
    }

    #[test]
    fn env_name_is_case_insensitive() {
        let config = load(&[("APP_ENV", "Staging")]).expect("load");
        assert_eq!(config.env, AppEnv::Staging);
        let config = load(&[("APP_ENV", "whatever")]).expect("load");
        assert_eq!(config.env, AppEnv::Development);
    }

    #[test]
    fn production_rejects_default_secret() {
        let err = load(&[("APP_ENV", "production")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let config = load(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cr3t")])
            .expect("explicit secret accepted");
        assert!(!config.jwt.uses_default_secret());
    }

    #[test]
    fn collector_url_gets_a_scheme() {
        let config = load(&[]).expect("load");
        assert_eq!(config.otel.collector_url(), "http://localhost:4317");
        let config = load(&[("OTEL_ENDPOINT", "https://otel.internal:4317")]).expect("load");
        assert_eq!(config.otel.collector_url(), "https://otel.internal:4317");
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(load(&[("HTTP_PORT", "http")]).is_err());
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = load(&[("JWT_SECRET", "very-private")]).expect("load");
        assert!(!format!("{:?}", config).contains("very-private"));
    }
}
