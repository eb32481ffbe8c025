use async_trait::async_trait;
use irc::client::Client;
use irc::proto::Message;
use tracing::debug;

use crate::settings::Setting;
use crate::{Context, Error};

/// The name of a plugin.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Name(&'static str);
/// The author of a plugin.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author(&'static str);
/// The version of a plugin.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Version(&'static str);

macro_rules! str_newtype {
    ($name:ident) => {
        impl $name {
            /// The wrapped string.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                self.0
            }
        }

        impl From<&'static str> for $name {
            fn from(s: &'static str) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.0)
            }
        }
    };
}

str_newtype!(Name);
str_newtype!(Author);
str_newtype!(Version);

/// Per-channel activity counters
#[cfg(feature = "plugin-activity")]
pub mod activity;
/// Mirror the owner's presence as away status
#[cfg(feature = "plugin-auto-away")]
pub mod auto_away;
/// Query nameservers
#[cfg(feature = "plugin-dig")]
pub mod dig;
/// Process health information
#[cfg(feature = "plugin-health")]
pub mod health;
/// Substitution-table text transformations
#[cfg(feature = "plugin-leet")]
pub mod leet;
/// Announce the currently playing track
#[cfg(feature = "plugin-now-playing")]
pub mod now_playing;
/// Forward highlights to a push notification service
#[cfg(feature = "plugin-pushover")]
pub mod pushover;
/// Automatic replies to stored triggers
#[cfg(feature = "plugin-trigger-reply")]
pub mod trigger_reply;
/// Announce the titles of posted links
#[cfg(feature = "plugin-url-title")]
pub mod url_title;

/// Common includes used in plugins.
#[allow(unused)]
mod prelude {
    pub use super::{Author, Name, Plugin, Version};
    pub use crate::command::{Args, Trigger};
    pub use crate::settings::Setting;
    pub use crate::{Context, Error as IotaError};
    pub use async_trait::async_trait;
    pub use irc::client::Client;
    pub use irc::proto::{Command, Message};
}

/// The base trait that all plugins must implement.
///
/// Every handler has a default empty body; a plugin implements only the events it subscribes
/// to. Handlers are invoked one at a time by the dispatch loop, so plugin state needs interior
/// mutability but no further synchronization discipline.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Returns the name of the plugin.
    fn name() -> Name
    where
        Self: Sized;

    /// Returns the author of the plugin.
    fn author() -> Author
    where
        Self: Sized;

    /// Returns the version of the plugin.
    fn version() -> Version
    where
        Self: Sized;

    /// Returns the plugin's settings table, synchronized into the store at registration.
    fn settings() -> &'static [Setting]
    where
        Self: Sized,
    {
        &[]
    }

    /// The constructor for a new plugin.
    fn new(ctx: &Context) -> Self
    where
        Self: Sized;

    /// Process an IRC protocol message.
    async fn handle_message(
        &self,
        _ctx: &Context,
        _client: &Client,
        _message: &Message,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Process a periodic timer event.
    async fn handle_tick(&self, _ctx: &Context, _client: &Client) -> Result<(), Error> {
        Ok(())
    }

    /// Process a settings change notification for the option named `name`.
    async fn handle_config_change(
        &self,
        _ctx: &Context,
        _client: &Client,
        _name: &str,
    ) -> Result<(), Error> {
        Ok(())
    }
}

/// A registered plugin together with the metadata captured at registration.
pub struct Entry {
    /// The plugin's name.
    pub name: Name,
    /// The plugin's version.
    pub version: Version,
    /// The plugin itself.
    pub plugin: Box<dyn Plugin>,
}

/// Plugin registry.
#[derive(Default)]
pub struct Registry {
    /// List of loaded plugins.
    pub entries: Vec<Entry>,
}

impl Registry {
    /// Constructs and returns a new, empty plugin registry.
    #[must_use]
    pub fn new() -> Registry {
        Registry { entries: vec![] }
    }

    /// Constructs and returns a new plugin registry with initialized plugins.
    #[must_use]
    pub fn preloaded(ctx: &Context) -> Registry {
        let mut registry = Self::new();
        debug!("registering plugins");

        #[cfg(feature = "plugin-activity")]
        registry.register::<activity::Activity>(ctx);
        #[cfg(feature = "plugin-auto-away")]
        registry.register::<auto_away::AutoAway>(ctx);
        #[cfg(feature = "plugin-dig")]
        registry.register::<dig::Dig>(ctx);
        #[cfg(feature = "plugin-health")]
        registry.register::<health::Health>(ctx);
        #[cfg(feature = "plugin-leet")]
        registry.register::<leet::Leet>(ctx);
        #[cfg(feature = "plugin-now-playing")]
        registry.register::<now_playing::NowPlaying>(ctx);
        #[cfg(feature = "plugin-pushover")]
        registry.register::<pushover::Pushover>(ctx);
        #[cfg(feature = "plugin-trigger-reply")]
        registry.register::<trigger_reply::TriggerReply>(ctx);
        #[cfg(feature = "plugin-url-title")]
        registry.register::<url_title::UrlTitle>(ctx);

        let num_plugins = registry.entries.len();
        debug!(%num_plugins, "finished registering plugins");

        registry
    }

    /// Registers a new plugin based on its type, synchronizing its settings defaults into the
    /// store first so the constructor can read them.
    pub fn register<P: Plugin + 'static>(&mut self, ctx: &Context) {
        ctx.settings.sync_defaults(P::name().as_str(), P::settings());

        self.entries.push(Entry {
            name: P::name(),
            version: P::version(),
            plugin: Box::new(P::new(ctx)),
        });
    }

    /// Returns a `name version` line for each registered plugin.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| format!("{} {}", entry.name, entry.version))
            .collect()
    }
}
