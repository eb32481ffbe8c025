//! The main process for communicating over IRC and managing state.
use std::sync::Arc;

use futures::stream::StreamExt;
use hickory_resolver::TokioResolver;
use irc::client::prelude::Client;
use irc::proto::{Command, Message};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::command::Trigger;
use crate::config::Config;
use crate::database::Database;
use crate::{Context, Error, Registry, consts};

/// The main IRC bot struct that manages connection state and event dispatch.
pub struct Iota {
    /// The complete configuration loaded from file or environment
    config: Config,
    /// The IRC client - None until connection is established
    client: Option<Client>,
    /// The registry containing all loaded plugins
    registry: Registry,
    /// The shared context for plugins
    context: Arc<Context>,
    /// The owner-only `.set` command
    set_command: Trigger,
    /// The owner-only `.get` command
    get_command: Trigger,
    /// The owner-only `.plugins` command
    plugins_command: Trigger,
}

impl Iota {
    /// Creates a new Iota instance from the provided configuration.
    ///
    /// This initializes the plugin registry with preloaded plugins but doesn't establish the
    /// IRC connection yet. Call `run()` to start the bot.
    #[must_use]
    pub fn new(config: Config, db: Database, dns: TokioResolver) -> Self {
        let context = Arc::new(Context::new(db, dns, config.clone()));
        let registry = Registry::preloaded(&context);

        Iota {
            client: None,
            registry,
            config,
            context,
            set_command: Trigger::new(".set"),
            get_command: Trigger::new(".get"),
            plugins_command: Trigger::new(".plugins"),
        }
    }

    /// Starts the bot and begins processing events.
    ///
    /// Events are dispatched one at a time: every plugin handles the current message or timer
    /// tick before the next event is taken from the stream, and queued settings changes are
    /// delivered in between.
    ///
    /// # Errors
    ///
    /// This function will return an error in the following situations:
    ///
    /// - [`Error::Database`] - if persisted settings overrides cannot be loaded.
    /// - [`Error::IrcClient`] - if the instantiation of the IRC client fails (e.g. due to
    ///   configuration issues.)
    /// - [`Error::IrcRegistration`] - if user registration fails (e.g. if the nickname is
    ///   already taken.)
    /// - [`Error::Irc`] - if a protocol or communication error occurred.
    pub async fn run(&mut self) -> Result<(), Error> {
        self.context.settings.load_overrides().await?;

        let mut client = Client::from_config(self.config.irc.clone().into())
            .await
            .map_err(Error::IrcClient)?;

        client.identify().map_err(Error::IrcRegistration)?;

        let mut stream = client.stream()?;

        self.client = Some(client);

        let mut interval = tokio::time::interval(consts::TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if let Some(client) = &self.client {
            // Deliver the notifications queued while loading persisted overrides.
            self.flush_setting_changes(client).await;

            loop {
                tokio::select! {
                    message = stream.next() => match message.transpose()? {
                        Some(message) => self.handle_message(client, message).await,
                        None => break,
                    },
                    _ = interval.tick() => self.handle_tick(client).await,
                }

                self.flush_setting_changes(client).await;
            }
        }

        Ok(())
    }

    /// Processes a single IRC message by dispatching it to all registered plugins.
    ///
    /// A plugin that fails to handle the message is logged and skipped; one misbehaving
    /// plugin never takes the connection down.
    async fn handle_message(&self, client: &Client, message: Message) {
        debug!(?message, "processing irc message");

        match self.handle_control(client, &message).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                warn!(error = ?err, "control command failed");
                return;
            }
        }

        for entry in &self.registry.entries {
            if let Err(err) = entry
                .plugin
                .handle_message(&self.context, client, &message)
                .await
            {
                warn!(plugin = entry.name.as_str(), error = ?err, "plugin failed to handle message");
            }
        }
    }

    /// Dispatches a timer event to all registered plugins.
    async fn handle_tick(&self, client: &Client) {
        for entry in &self.registry.entries {
            if let Err(err) = entry.plugin.handle_tick(&self.context, client).await {
                warn!(plugin = entry.name.as_str(), error = ?err, "plugin failed to handle tick");
            }
        }
    }

    /// Delivers queued settings change notifications to all registered plugins.
    async fn flush_setting_changes(&self, client: &Client) {
        for name in self.context.settings.drain_changes() {
            debug!(setting = %name, "notifying plugins of settings change");

            for entry in &self.registry.entries {
                if let Err(err) = entry
                    .plugin
                    .handle_config_change(&self.context, client, &name)
                    .await
                {
                    warn!(plugin = entry.name.as_str(), error = ?err, "plugin failed to handle settings change");
                }
            }
        }
    }

    /// Handles the owner-only control commands, returning `true` when the message was one.
    async fn handle_control(&self, client: &Client, message: &Message) -> Result<bool, Error> {
        let Command::PRIVMSG(_, ref text) = message.command else {
            return Ok(false);
        };
        let Some(nick) = message.source_nickname() else {
            return Ok(false);
        };
        let Some(target) = message.response_target() else {
            return Ok(false);
        };

        if !self.config.irc.is_owner(nick) {
            return Ok(false);
        }

        if let Some(args) = self.set_command.parse(text) {
            match args.shift() {
                Some((name, value)) if !value.is_empty() => {
                    self.context.settings.set(name, value.rest()).await?;
                    client.send_privmsg(target, format!("{name} = {}", value.rest()))?;
                }
                Some((name, _)) => match self.context.settings.get(name) {
                    Some(value) => client.send_privmsg(target, format!("{name} = {value}"))?,
                    None => client.send_privmsg(target, format!("{name} is not set"))?,
                },
                None => client.send_privmsg(target, "Usage: .set <name> [value]")?,
            }

            return Ok(true);
        }

        if let Some(args) = self.get_command.parse(text) {
            match args.shift() {
                Some((name, _)) => {
                    let value = self.context.settings.get(name);
                    let description = self.context.settings.description(name).unwrap_or("");

                    match value {
                        Some(value) => client
                            .send_privmsg(target, format!("{name} = {value} ({description})"))?,
                        None => client.send_privmsg(target, format!("{name} is not set"))?,
                    }
                }
                None => client.send_privmsg(target, "Usage: .get <name>")?,
            }

            return Ok(true);
        }

        if self.plugins_command.parse(text).is_some() {
            client.send_privmsg(target, self.registry.names().join(", "))?;

            return Ok(true);
        }

        Ok(false)
    }
}
