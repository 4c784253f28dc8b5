//! Startup configuration.
//!
//! Resolved once by the host and handed to [`crate::AppServices`]; nothing
//! below this layer reads the environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use nexus_core::model::ProfileId;

use crate::error::ConfigError;

pub const ENV_DB_URL: &str = "NEXUS_DB_URL";
pub const ENV_PROFILE_ID: &str = "NEXUS_PROFILE_ID";
pub const ENV_WRITE_POLICY: &str = "NEXUS_WRITE_POLICY";

pub const DEFAULT_DB_URL: &str = "sqlite://nexus.sqlite3";

//
// ─── WRITE POLICY ──────────────────────────────────────────────────────────────
//

/// How an attempt transition relates to its persistence write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Apply the transition in memory first; a failed write is logged and
    /// reported, the transition stays.
    #[default]
    Optimistic,
    /// Write first; the in-memory transition is kept only if the write succeeds.
    Confirmed,
}

impl WritePolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WritePolicy::Optimistic => "optimistic",
            WritePolicy::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WritePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Ok(WritePolicy::Optimistic),
            "confirmed" => Ok(WritePolicy::Confirmed),
            _ => Err(ConfigError::InvalidWritePolicy(s.to_owned())),
        }
    }
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Values supplied on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub profile_id: Option<ProfileId>,
    pub write_policy: Option<WritePolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub profile_id: ProfileId,
    pub write_policy: WritePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: normalize_sqlite_url(DEFAULT_DB_URL),
            profile_id: ProfileId::new(1),
            write_policy: WritePolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present), then resolve against the process environment.
    ///
    /// Variables already set in the environment are not replaced by `.env`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when an override or variable holds an invalid value.
    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            log::debug!("loaded environment from {}", path.display());
        }
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve with precedence overrides > `lookup` > defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a value cannot be parsed.
    pub fn resolve(
        overrides: ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_url = match overrides.database_url.or_else(|| lookup(ENV_DB_URL)) {
            Some(raw) if raw.trim().is_empty() => return Err(ConfigError::InvalidDatabaseUrl(raw)),
            Some(raw) => normalize_sqlite_url(&raw),
            None => defaults.database_url,
        };

        let profile_id = match overrides.profile_id {
            Some(id) => id,
            None => match lookup(ENV_PROFILE_ID) {
                Some(raw) => raw
                    .parse::<ProfileId>()
                    .map_err(|_| ConfigError::InvalidProfileId(raw.clone()))?,
                None => defaults.profile_id,
            },
        };

        let write_policy = match overrides.write_policy {
            Some(policy) => policy,
            None => match lookup(ENV_WRITE_POLICY) {
                Some(raw) => raw.parse()?,
                None => defaults.write_policy,
            },
        };

        Ok(Self {
            database_url,
            profile_id,
            write_policy,
        })
    }
}

/// Turn a bare path or relative `sqlite:` URL into an absolute `sqlite://` URL.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::resolve(ConfigOverrides::default(), env(&[])).unwrap();
        assert_eq!(config.profile_id, ProfileId::new(1));
        assert_eq!(config.write_policy, WritePolicy::Optimistic);
        assert!(config.database_url.starts_with("sqlite://"));
        assert!(config.database_url.ends_with("nexus.sqlite3"));
    }

    #[test]
    fn environment_is_read_when_no_override() {
        let config = AppConfig::resolve(
            ConfigOverrides::default(),
            env(&[
                (ENV_DB_URL, "sqlite::memory:"),
                (ENV_PROFILE_ID, "7"),
                (ENV_WRITE_POLICY, "Confirmed"),
            ]),
        )
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.profile_id, ProfileId::new(7));
        assert_eq!(config.write_policy, WritePolicy::Confirmed);
    }

    #[test]
    fn overrides_beat_environment() {
        let overrides = ConfigOverrides {
            database_url: Some("sqlite:///tmp/a.sqlite3".into()),
            profile_id: Some(ProfileId::new(3)),
            write_policy: Some(WritePolicy::Optimistic),
        };
        let config = AppConfig::resolve(
            overrides,
            env(&[
                (ENV_DB_URL, "sqlite::memory:"),
                (ENV_PROFILE_ID, "7"),
                (ENV_WRITE_POLICY, "confirmed"),
            ]),
        )
        .unwrap();
        assert_eq!(config.database_url, "sqlite:///tmp/a.sqlite3");
        assert_eq!(config.profile_id, ProfileId::new(3));
        assert_eq!(config.write_policy, WritePolicy::Optimistic);
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = AppConfig::resolve(
            ConfigOverrides::default(),
            env(&[(ENV_WRITE_POLICY, "eventually")]),
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::InvalidWritePolicy("eventually".into()));

        let err =
            AppConfig::resolve(ConfigOverrides::default(), env(&[(ENV_PROFILE_ID, "abc")]))
                .unwrap_err();
        assert_eq!(err, ConfigError::InvalidProfileId("abc".into()));

        let err = AppConfig::resolve(ConfigOverrides::default(), env(&[(ENV_DB_URL, "  ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDatabaseUrl(_)));
    }

    #[test]
    fn sqlite_urls_are_made_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///var/db.sqlite3"),
            "sqlite:///var/db.sqlite3"
        );
        assert_eq!(normalize_sqlite_url("/var/db.sqlite3"), "sqlite:///var/db.sqlite3");
        let relative = normalize_sqlite_url("sqlite:data/db.sqlite3");
        assert!(relative.starts_with("sqlite:///"));
        assert!(relative.ends_with("data/db.sqlite3"));
    }
}
