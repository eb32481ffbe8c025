use hickory_resolver::TokioResolver;

use crate::Config;
use crate::Settings;
use crate::database::Database;

/// Shared context for plugin invocations.
pub struct Context {
    /// The database connection pool.
    pub db: Database,
    /// The default DNS resolver.
    pub dns: TokioResolver,
    /// The shared HTTP client.
    pub http: reqwest::Client,
    /// The runtime settings store.
    pub settings: Settings,
    /// The bot configuration.
    pub config: Config,
}

impl Context {
    /// Creates a new context. The settings store is seeded from the configuration file's
    /// `[settings]` section; database overrides are loaded separately at startup.
    #[must_use]
    pub fn new(db: Database, dns: TokioResolver, config: Config) -> Self {
        let settings = Settings::new(db.clone());
        settings.apply(&config.settings);

        Self {
            db,
            dns,
            http: crate::http::build_client(),
            settings,
            config,
        }
    }
}
