use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// IRC client configuration
    pub irc: IrcConfig,
    /// Database configuration
    pub database: DbConfig,
    /// Tracing configuration
    #[serde(default)]
    pub tracing: TracingConfig,
    /// Initial values for the runtime settings store, keyed as `<plugin>.<option>`.
    #[serde(default)]
    pub settings: HashMap<String, String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DbConfig {
    /// Connection URL
    pub url: String,
    /// Maximum number of connections to keep in the connection pool
    #[serde(default = "default_max_db_connections")]
    pub max_connections: u32,
    /// Maximum idle duration for individual connections, in seconds
    #[serde(default = "default_db_idle_timeout", with = "humantime_serde")]
    pub idle_timeout: Duration,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TracingConfig {
    /// Enable span export over OTLP
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct IrcChannelConfig {
    /// The shared key to access the channel.
    pub key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct IrcTlsConfig {
    /// Enable TLS.
    pub enabled: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct IrcConfig {
    /// The client's nickname.
    pub nickname: String,
    /// Alternative nicknames for the client, if the default is taken.
    #[serde(default)]
    pub alt_nicks: Vec<String>,
    /// The client's username.
    pub username: Option<String>,
    /// The client's real name.
    pub realname: Option<String>,
    /// The hostname of the server to connect to.
    pub hostname: String,
    /// The password to connect to the server.
    pub password: Option<String>,
    /// The port number of the server to connect to.
    pub port: Option<u16>,
    /// TLS configuration.
    pub tls: Option<IrcTlsConfig>,
    /// List of channels to automatically manage.
    #[serde(default)]
    pub channels: HashMap<String, Option<IrcChannelConfig>>,
    /// Nicknames that may drive owner-only commands such as `.set`.
    #[serde(default)]
    pub owners: Vec<String>,
}

impl IrcConfig {
    #[must_use]
    pub fn port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None => self.fallback_port(),
        }
    }

    /// Return the port number to use based on whether the connection requires TLS or not.
    fn fallback_port(&self) -> u16 {
        if self.tls.as_ref().map(|tls| tls.enabled) == Some(true) {
            6697
        } else {
            6667
        }
    }

    /// Whether the given nickname is listed as an owner.
    #[must_use]
    pub fn is_owner(&self, nickname: &str) -> bool {
        self.owners.iter().any(|owner| owner == nickname)
    }
}

impl From<IrcConfig> for irc::client::data::Config {
    fn from(config: IrcConfig) -> Self {
        let port = config.port();
        let channels = config.channels.into_keys().collect::<Vec<_>>();
        let use_tls = config.tls.map(|x| x.enabled);

        irc::client::data::Config {
            nickname: Some(config.nickname),
            username: config.username,
            realname: config.realname,
            server: Some(config.hostname),
            password: config.password,
            port: Some(port),
            use_tls,
            channels,
            alt_nicks: config.alt_nicks,
            ..Default::default()
        }
    }
}

/// Loads the configuration from the given TOML file, with `IOTA_`-prefixed environment variables
/// layered on top.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read or a value fails to deserialize.
pub fn load(path: impl AsRef<Path>) -> Result<Config, Error> {
    Figment::new()
        .merge(Toml::file(path.as_ref()))
        .merge(Env::prefixed("IOTA_").split("__"))
        .extract()
        .map_err(|err| Error::Config(Box::new(err)))
}

#[must_use]
pub const fn default_max_db_connections() -> u32 {
    crate::consts::DEFAULT_MAX_DB_CONNECTIONS
}

#[must_use]
pub const fn default_db_idle_timeout() -> Duration {
    crate::consts::DEFAULT_DB_IDLE_TIMEOUT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> IrcConfig {
        IrcConfig {
            nickname: "iota".to_string(),
            hostname: "irc.example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn fallback_port_depends_on_tls() {
        let mut config = minimal();
        assert_eq!(config.port(), 6667);

        config.tls = Some(IrcTlsConfig { enabled: true });
        assert_eq!(config.port(), 6697);

        config.port = Some(7000);
        assert_eq!(config.port(), 7000);
    }

    #[test]
    fn owner_check_is_exact() {
        let mut config = minimal();
        config.owners = vec!["mk".to_string()];

        assert!(config.is_owner("mk"));
        assert!(!config.is_owner("mk_"));
        assert!(!config.is_owner("MK"));
    }
}
