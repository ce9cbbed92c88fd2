/*
 * Responsibility
 * - 環境変数から設定を読む (待ち受けポート, secret, サービス識別子など)
 * - 起動時にバリデーション (不足・不正なら起動失敗)
 * - chain の全段で共有する読み取り専用の GateConfig を組み立てる
 */
use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Read-only settings consumed by the interceptor chain.
///
/// Built once at startup and shared by every call; nothing in here changes
/// after construction.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// This service's identity. Service tokens must list it in `aud`.
    pub service_name: String,
    /// Stamped on every error envelope.
    pub error_domain: String,
    /// Full method paths that skip service-token verification.
    pub service_auth_exempt_methods: HashSet<String>,
}

impl GateConfig {
    pub fn new(
        service_name: impl Into<String>,
        error_domain: impl Into<String>,
        exempt_methods: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            error_domain: error_domain.into(),
            service_auth_exempt_methods: exempt_methods.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_exempt(&self, method: &str) -> bool {
        self.service_auth_exempt_methods.contains(method)
    }
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // Postgres backing the user directory. Optional outside production.
    pub database_url: Option<String>,

    pub gate: GateConfig,

    pub service_token_secret: String,
    pub user_token_secret: String,
    pub token_leeway_seconds: u64,

    pub max_body_bytes: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets stay out of logs
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("gate", &self.gate)
            .field("token_leeway_seconds", &self.token_leeway_seconds)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parsed_var("PORT", 3000)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::from_env();

        let database_url = optional_var("DATABASE_URL");
        if app_env.is_production() && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let service_name = non_empty_var("SERVICE_NAME")?;
        let error_domain = optional_var("ERROR_DOMAIN").unwrap_or_else(|| service_name.clone());
        let exempt_methods =
            parse_exempt_methods(&optional_var("SERVICE_AUTH_EXEMPT_METHODS").unwrap_or_default())?;

        Ok(Self {
            addr,
            app_env,
            database_url,
            gate: GateConfig::new(service_name, error_domain, exempt_methods),
            service_token_secret: non_empty_var("SERVICE_TOKEN_SECRET")?,
            user_token_secret: non_empty_var("USER_TOKEN_SECRET")?,
            token_leeway_seconds: parsed_var("TOKEN_LEEWAY_SECONDS", 60)?,
            max_body_bytes: parsed_var("MAX_BODY_BYTES", 1024 * 1024)?,
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn non_empty_var(key: &'static str) -> Result<String, ConfigError> {
    let value = std::env::var(key).map_err(|_| ConfigError::Missing(key))?;
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(key));
    }
    Ok(value)
}

/// Unset means `default`; set but unparsable is a startup error.
fn parsed_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Comma-separated full method paths (`/package.Service/Method`).
fn parse_exempt_methods(raw: &str) -> Result<Vec<String>, ConfigError> {
    let methods: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect();

    if methods.iter().any(|m| !m.starts_with('/')) {
        return Err(ConfigError::Invalid("SERVICE_AUTH_EXEMPT_METHODS"));
    }
    Ok(methods)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exempt_lookup_matches_full_method_path_only() {
        let gate = GateConfig::new(
            "user-service",
            "user-service",
            ["/internal.v1.InternalService/Ping"],
        );

        assert!(gate.is_exempt("/internal.v1.InternalService/Ping"));
        assert!(!gate.is_exempt("/internal.v1.InternalService/ResolveUser"));
        assert!(!gate.is_exempt("Ping"));
    }

    #[test]
    fn exempt_methods_are_trimmed_and_blank_entries_dropped() {
        let methods = parse_exempt_methods(
            " /internal.v1.InternalService/Ping , ,/health.v1.Health/Check",
        )
        .unwrap();

        assert_eq!(
            methods,
            vec![
                "/internal.v1.InternalService/Ping".to_string(),
                "/health.v1.Health/Check".to_string(),
            ]
        );
        assert!(parse_exempt_methods("").unwrap().is_empty());
    }

    #[test]
    fn exempt_methods_must_be_full_paths() {
        assert!(matches!(
            parse_exempt_methods("/internal.v1.InternalService/Ping,Ping"),
            Err(ConfigError::Invalid("SERVICE_AUTH_EXEMPT_METHODS"))
        ));
    }
}
