//! Error types

use miette::Diagnostic;
use thiserror::Error;

/// Application errors for configuration, database, IRC, and subprocess operations.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Failed to load or parse the configuration.
    #[error("Could not load configuration")]
    Config(#[source] Box<figment::Error>),
    /// Failed to open the database.
    #[error("Cannot open database")]
    OpenDatabase(#[source] sqlx::Error),
    /// Database schema migration failed.
    #[error("Database migration failed")]
    DatabaseMigration(#[source] sqlx::migrate::MigrateError),
    /// A database query operation failed.
    #[error("Database query failed")]
    Database(#[from] sqlx::Error),
    /// Failed to create the IRC client.
    #[error("Could not create IRC client")]
    IrcClient(#[source] irc::error::Error),
    /// Failed to register with the IRC server.
    #[error("Could not send registration details for IRC")]
    IrcRegistration(#[source] irc::error::Error),
    /// General IRC communication error.
    #[error("IRC error")]
    Irc(#[from] irc::error::Error),
    /// An outgoing HTTP request failed.
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),
    /// A delegated command line could not be split into words.
    #[error("Invalid command line")]
    InvalidCommandLine,
    /// A delegated subprocess could not be spawned or awaited.
    #[error("Could not run subprocess")]
    ProcessSpawn(#[source] std::io::Error),
    /// A delegated subprocess exceeded its timeout and was killed.
    #[error("Subprocess timed out")]
    ProcessTimedOut,
}
