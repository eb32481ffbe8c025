pub mod command;
pub mod config;
pub mod consts;
mod context;
pub mod database;
mod error;
pub mod http;
mod iota;
pub mod plugin;
pub mod process;
pub mod settings;
pub mod tracing;

pub use config::Config;
pub use context::Context;
pub use error::Error;
pub use iota::Iota;
pub use plugin::{Plugin, Registry};
pub use settings::Settings;
