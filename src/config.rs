use std::env;

use chrono_tz::Tz;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Supabase credentials are missing. Set SUPABASE_URL and SUPABASE_ANON_KEY")]
    MissingCredentials,
    #[error("DATABASE_URL is required when STORE_BACKEND=postgres")]
    MissingDatabaseUrl,
    #[error("unknown STORE_BACKEND `{0}` (expected rest, postgres or memory)")]
    UnknownBackend(String),
    #[error("APP_TIMEZONE `{0}` is not a valid IANA timezone")]
    InvalidTimezone(String),
}

/// Where appointment data lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Hosted store reached through its REST gateway with the public anon key.
    Rest { url: String, anon_key: String },
    /// Direct connection to the Postgres database behind the hosted store.
    Postgres { database_url: String },
    /// Process-local store, nothing persists across restarts.
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub backend: Backend,
    pub bind_addr: String,
    pub timezone: Tz,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match get("STORE_BACKEND").as_deref().unwrap_or("rest") {
            "rest" => {
                let url = get("SUPABASE_URL").or_else(|| get("NEXT_PUBLIC_SUPABASE_URL"));
                let anon_key =
                    get("SUPABASE_ANON_KEY").or_else(|| get("NEXT_PUBLIC_SUPABASE_ANON_KEY"));
                match (url, anon_key) {
                    (Some(url), Some(anon_key)) => Backend::Rest { url, anon_key },
                    _ => return Err(ConfigError::MissingCredentials),
                }
            }
            "postgres" => Backend::Postgres {
                database_url: get("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?,
            },
            "memory" => Backend::Memory,
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());

        let tz_name = get("APP_TIMEZONE").unwrap_or_else(|| "Europe/Berlin".to_string());
        let timezone = tz_name
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(tz_name.clone()))?;

        let http_timeout_secs = get("HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        Ok(Self {
            backend,
            bind_addr,
            timezone,
            http_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn rest_backend_requires_both_credentials() {
        let err = Config::from_lookup(lookup(&[("SUPABASE_URL", "https://x.supabase.co")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));

        let err = Config::from_lookup(lookup(&[("SUPABASE_ANON_KEY", "anon")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));
    }

    #[test]
    fn blank_credentials_count_as_missing() {
        let err = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_ANON_KEY", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));
    }

    #[test]
    fn public_env_names_are_accepted() {
        let cfg = Config::from_lookup(lookup(&[
            ("NEXT_PUBLIC_SUPABASE_URL", "https://x.supabase.co"),
            ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();
        assert_eq!(
            cfg.backend,
            Backend::Rest {
                url: "https://x.supabase.co".into(),
                anon_key: "anon".into()
            }
        );
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(cfg.http_timeout_secs, 30);
    }

    #[test]
    fn postgres_backend_needs_database_url() {
        let err = Config::from_lookup(lookup(&[("STORE_BACKEND", "postgres")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingDatabaseUrl));
    }

    #[test]
    fn rejects_unknown_backend_and_bad_timezone() {
        let err = Config::from_lookup(lookup(&[("STORE_BACKEND", "sqlite")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(b) if b == "sqlite"));

        let err = Config::from_lookup(lookup(&[
            ("STORE_BACKEND", "memory"),
            ("APP_TIMEZONE", "Mars/Olympus"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimezone(_)));
    }
}
