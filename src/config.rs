use std::env;
use std::net::SocketAddr;

/// Which implementation backs the credential, session and blog stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Upper bound for `SESSION_TTL_SECS`: 10 years.
pub const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 86_400;

#[derive(Clone)]
pub struct Config {
    // Storage
    pub store_backend: StoreBackend,
    pub redis_url: Option<String>,

    // Server
    pub bind_addr: SocketAddr,
    pub max_body_bytes: usize,

    // Sessions
    pub session_ttl_secs: u64,
    pub session_cookie_name: String,
    pub cookie_secure: bool,
    pub session_sweep_secs: u64,

    // Passwords
    pub min_password_len: usize,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("store_backend", &self.store_backend)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[REDACTED]"))
            .field("bind_addr", &self.bind_addr)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("session_cookie_name", &self.session_cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("session_sweep_secs", &self.session_sweep_secs)
            .field("min_password_len", &self.min_password_len)
            .field("argon2_memory_kib", &self.argon2_memory_kib)
            .field("argon2_iterations", &self.argon2_iterations)
            .field("argon2_parallelism", &self.argon2_parallelism)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // Storage
        let store_backend_str = env::var("STORE_BACKEND").unwrap_or_else(|_| "redis".to_string());
        let store_backend = store_backend_str
            .parse::<StoreBackend>()
            .map_err(|e| ConfigError::InvalidValue("STORE_BACKEND".to_string(), e))?;

        // Redis is required for the redis backend; never fall back to a default URL
        let redis_url = env::var("REDIS_URL").ok().filter(|s| !s.is_empty());
        if store_backend == StoreBackend::Redis && redis_url.is_none() {
            return Err(ConfigError::MissingVar("REDIS_URL".to_string()));
        }

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;
        let max_body_bytes = parse_env_or_default("MAX_BODY_BYTES", 1_048_576)?;

        // Sessions
        let session_ttl_secs = parse_env_or_default("SESSION_TTL_SECS", 86_400)?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        if session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                format!("must be at most {} (10 years)", MAX_SESSION_TTL_SECS),
            ));
        }

        let session_cookie_name =
            env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "blogpad_session".to_string());
        if session_cookie_name.is_empty()
            || !session_cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::InvalidValue(
                "SESSION_COOKIE_NAME".to_string(),
                "may only contain ASCII alphanumeric characters, hyphens, and underscores"
                    .to_string(),
            ));
        }

        let cookie_secure = parse_env_or_default("COOKIE_SECURE", false)?;
        let session_sweep_secs = parse_env_or_default("SESSION_SWEEP_SECS", 60)?;
        if session_sweep_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_SWEEP_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        // Passwords
        let min_password_len = parse_env_or_default("MIN_PASSWORD_LEN", 8)?;
        let (argon2_memory_kib, argon2_iterations, argon2_parallelism) =
            argon2_params_from_env()?;

        Ok(Config {
            store_backend,
            redis_url,
            bind_addr,
            max_body_bytes,
            session_ttl_secs,
            session_cookie_name,
            cookie_secure,
            session_sweep_secs,
            min_password_len,
            argon2_memory_kib,
            argon2_iterations,
            argon2_parallelism,
        })
    }
}

/// Argon2id cost parameters `(memory_kib, iterations, parallelism)` from
/// `ARGON2_MEMORY_KIB`, `ARGON2_ITERATIONS` and `ARGON2_PARALLELISM`.
///
/// Shared by [`Config::from_env`] and the `hash-password` subcommand so that
/// hand-seeded hashes carry the same cost as the server's own.
pub fn argon2_params_from_env() -> Result<(u32, u32, u32), ConfigError> {
    let _ = dotenvy::dotenv();

    Ok((
        parse_env_or_default("ARGON2_MEMORY_KIB", 19_456)?,
        parse_env_or_default("ARGON2_ITERATIONS", 2)?,
        parse_env_or_default("ARGON2_PARALLELISM", 1)?,
    ))
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}

/// In-memory configuration with cheap Argon2 parameters.
#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        store_backend: StoreBackend::Memory,
        redis_url: None,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        max_body_bytes: 1_048_576,
        session_ttl_secs: 3600,
        session_cookie_name: "blogpad_session".to_string(),
        cookie_secure: false,
        session_sweep_secs: 60,
        min_password_len: 8,
        argon2_memory_kib: 1024,
        argon2_iterations: 1,
        argon2_parallelism: 1,
    }
}
