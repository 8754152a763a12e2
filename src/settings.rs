//! Process settings from the environment (load `.env` first with dotenvy).

use std::path::PathBuf;

pub const DEFAULT_LINK_PREFIX: &str = "/forest";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    /// Schema document produced by schema discovery.
    pub schema_path: PathBuf,
    /// Root of self/related links in documents.
    pub link_prefix: String,
    pub bind_addr: String,
    /// Table schema applied to collections that do not name one.
    pub db_schema: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "postgres://localhost/jsonapi".into(),
            schema_path: PathBuf::from("schema.json"),
            link_prefix: DEFAULT_LINK_PREFIX.into(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            db_schema: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();
        let get = |k: &str| get(k).filter(|v| !v.trim().is_empty());
        Settings {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            schema_path: get("SCHEMA_PATH").map(PathBuf::from).unwrap_or(defaults.schema_path),
            link_prefix: get("LINK_PREFIX").unwrap_or(defaults.link_prefix),
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            db_schema: get("DB_SCHEMA"),
        }
    }
}
