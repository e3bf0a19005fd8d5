use crate::application_port::USERS_COLLECTION;
use anyhow::{Result, anyhow};
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub log: Log,
    pub store: Store,
    pub identity: Identity,
    #[serde(default)]
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "mongo"
    pub mongo: Option<Mongo>,
}

#[derive(Debug, Deserialize)]
pub struct Mongo {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Deserialize)]
pub struct Identity {
    pub backend: String, // "memory" or "firebase"
    pub memory: Option<MemoryIdentity>,
    pub firebase: Option<Firebase>,
}

#[derive(Deserialize)]
pub struct MemoryIdentity {
    pub signing_key: String,
}

#[derive(Deserialize)]
pub struct Firebase {
    pub project_id: String,
    pub api_base: Option<String>,
    pub access_token: Option<String>,
    pub jwks_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub collection: String,
}

impl Default for User {
    fn default() -> Self {
        User {
            collection: USERS_COLLECTION.to_string(),
        }
    }
}

impl fmt::Debug for MemoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryIdentity")
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for Firebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Firebase")
            .field("project_id", &self.project_id)
            .field("api_base", &self.api_base)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("jwks_url", &self.jwks_url)
            .finish()
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Environment overrides, e.g. `PROFILE_SERVICE__IDENTITY__BACKEND=firebase`.
const ENV_PREFIX: &str = "PROFILE_SERVICE";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);
    build(Config::builder().add_source(File::with_name(path)))
}

pub fn parse_settings_str(toml: &str) -> Result<Settings> {
    build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<Settings> {
    let settings: Settings = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMORY: &str = r#"
[log]
filter = "debug"

[store]
backend = "memory"

[identity]
backend = "memory"

[identity.memory]
signing_key = "dev-signing-key"
"#;

    #[test]
    fn parses_memory_settings_with_default_collection() {
        let settings = parse_settings_str(MEMORY).unwrap();

        assert_eq!(settings.log.filter, "debug");
        assert_eq!(settings.store.backend, "memory");
        assert!(settings.store.mongo.is_none());
        assert_eq!(
            settings.identity.memory.as_ref().unwrap().signing_key,
            "dev-signing-key"
        );
        assert_eq!(settings.user.collection, "users");
    }

    #[test]
    fn parses_mongo_and_firebase_sections() {
        let settings = parse_settings_str(
            r#"
[log]
filter = "info"

[store]
backend = "mongo"
mongo = { uri = "mongodb://localhost:27017", database = "profiles" }

[identity]
backend = "firebase"
firebase = { project_id = "generic-project", access_token = "secret-token" }

[user]
collection = "profiles"
"#,
        )
        .unwrap();

        assert_eq!(settings.store.mongo.as_ref().unwrap().database, "profiles");
        let firebase = settings.identity.firebase.as_ref().unwrap();
        assert_eq!(firebase.project_id, "generic-project");
        assert!(firebase.api_base.is_none());
        assert_eq!(settings.user.collection, "profiles");

        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn missing_sections_are_errors() {
        assert!(parse_settings_str("[log]\nfilter = \"info\"\n").is_err());
        assert!(parse_settings(Some("settings/does-not-exist")).is_err());
    }
}
