use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub sslmode: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            name: "subscriptions".to_string(),
            sslmode: "disable".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Key/value connection string understood by `tokio_postgres::connect`.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={} sslmode={}",
            quote(&self.host),
            self.port,
            quote(&self.user),
            quote(&self.password),
            quote(&self.name),
            quote(&self.sslmode),
        )
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml(s: &str) -> Result<Self, anyhow::Error> {
        serde_yaml::from_str(s).context("Unable to parse config")
    }

    /// Returns `None` when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>, anyhow::Error> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(s) => Self::from_yaml(&s)
                .with_context(|| format!("Invalid config file {}", path.display()))
                .map(Some),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(anyhow::anyhow!(
                "Unable to read config file {}: {err}",
                path.display()
            )),
        }
    }

    /// `DB_HOST` and `DB_PASSWORD` override the file, as do `DB_PORT`,
    /// `DB_USER`, `DB_NAME` and `SERVER_PORT`.
    pub fn apply_env(&mut self) -> Result<(), anyhow::Error> {
        if let Some(host) = env_string("DB_HOST") {
            self.database.host = host;
        }
        if let Some(password) = env_string("DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(user) = env_string("DB_USER") {
            self.database.user = user;
        }
        if let Some(name) = env_string("DB_NAME") {
            self.database.name = name;
        }
        if let Some(port) = env_string("DB_PORT") {
            self.database.port = port.trim().parse().context("DB_PORT is not a port number")?;
        }
        if let Some(port) = env_string("SERVER_PORT") {
            self.server.port = port.trim().parse().context("SERVER_PORT is not a port number")?;
        }
        Ok(())
    }
}

/// Unset and empty variables are ignored. Values are taken verbatim.
fn env_string(key: &str) -> Option<String> {
    envmnt::get_parse::<String>(key)
        .ok()
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_with_defaults() {
        let config = Config::from_yaml(
            r#"
server:
  port: 9000
database:
  host: db
  password: secret
logging:
  level: debug
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.password, "secret");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(Config::from_yaml("server: { port: not-a-port }").is_err());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        assert_eq!(Config::load("definitely/not/here.yaml").unwrap(), None);
    }

    #[test]
    fn renders_connection_string() {
        let db = DatabaseConfig {
            password: "it's a \\secret".to_string(),
            ..DatabaseConfig::default()
        };
        assert_eq!(
            db.connection_string(),
            "host='localhost' port=5432 user='postgres' password='it\\'s a \\\\secret' \
            dbname='subscriptions' sslmode='disable'"
        );
    }

    #[test]
    fn environment_overrides_host_and_password() {
        envmnt::set("DB_HOST", "10.0.0.5");
        envmnt::set("DB_PASSWORD", " from env ");
        envmnt::set("DB_USER", "");
        let mut config = Config::default();
        config.apply_env().unwrap();
        envmnt::remove("DB_HOST");
        envmnt::remove("DB_PASSWORD");
        envmnt::remove("DB_USER");
        assert_eq!(config.database.host, "10.0.0.5");
        assert_eq!(config.database.password, " from env ");
        assert_eq!(config.database.user, "postgres");
    }
}
