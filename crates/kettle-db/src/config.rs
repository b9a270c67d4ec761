use std::env;

/// Database configuration for the generation audit log.
///
/// Reads from the `KETTLE_DATABASE_URL` environment variable, falling back to
/// `postgresql://localhost:5432/kettle` when unset.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// Environment variable consulted by [`DbConfig::from_env`].
    pub const ENV_VAR: &str = "KETTLE_DATABASE_URL";

    /// The default connection URL used when no environment variable is set.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/kettle";

    /// Build a config from the environment, then the compile-time default.
    pub fn from_env() -> Self {
        let database_url =
            env::var(Self::ENV_VAR).unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        Self { database_url }
    }

    /// Build a config from an explicit URL (CLI flags, tests).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Extract the database name from the URL, ignoring any query string.
    pub fn database_name(&self) -> Option<&str> {
        let without_query = self
            .database_url
            .split_once('?')
            .map_or(self.database_url.as_str(), |(base, _)| base);
        without_query.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// URL of the `postgres` maintenance database on the same server, used to
    /// issue `CREATE DATABASE` for a missing target.
    pub fn maintenance_url(&self) -> String {
        match self.database_url.rfind('/') {
            Some(pos) => format!("{}/postgres", &self.database_url[..pos]),
            None => self.database_url.clone(),
        }
    }

    /// Connection URL with the password replaced, for log lines.
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.database_url.split_once("://") else {
            return self.database_url.clone();
        };
        match rest.split_once('@') {
            Some((credentials, host)) => {
                let user = credentials.split(':').next().unwrap_or_default();
                format!("{scheme}://{user}:***@{host}")
            }
            None => self.database_url.clone(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
