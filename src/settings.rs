//! Runtime key-value settings store.
//!
//! Every plugin declares a table of named options with default values. The defaults are
//! synchronized into this store when the plugin is registered, values from the configuration
//! file's `[settings]` section and the `settings` database table are layered on top, and owners
//! can change values at runtime with `.set`. Plugins read their options on every event, so a
//! change takes effect immediately; changed names are also queued and delivered to plugins as
//! configuration-change notifications after the current event finishes dispatching.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use crate::Error;
use crate::database::Database;

/// A single named option with its default value and help text.
#[derive(Debug, Clone, Copy)]
pub struct Setting {
    /// The option name, without the plugin prefix.
    pub name: &'static str,
    /// The value used until one is configured.
    pub default: &'static str,
    /// One-line help text shown by `.get`.
    pub description: &'static str,
}

/// The store itself. Values live in memory; writes are mirrored to the `settings` table.
pub struct Settings {
    values: RwLock<HashMap<String, String>>,
    descriptions: RwLock<HashMap<String, &'static str>>,
    pending: Mutex<Vec<String>>,
    db: Database,
}

impl Settings {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            descriptions: RwLock::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
            db,
        }
    }

    /// Inserts the given defaults under `<plugin>.<name>` keys, keeping any value that is
    /// already present.
    pub fn sync_defaults(&self, plugin: &str, defaults: &[Setting]) {
        let mut values = self.values.write().expect("settings lock poisoned");
        let mut descriptions = self.descriptions.write().expect("settings lock poisoned");

        for setting in defaults {
            let name = format!("{plugin}.{}", setting.name);

            values
                .entry(name.clone())
                .or_insert_with(|| setting.default.to_string());
            descriptions.insert(name, setting.description);
        }
    }

    /// Overlays values from the configuration file without queueing notifications.
    pub fn apply(&self, overrides: &HashMap<String, String>) {
        let mut values = self.values.write().expect("settings lock poisoned");

        for (name, value) in overrides {
            values.insert(name.clone(), value.clone());
        }
    }

    /// Overlays values persisted in the `settings` table and queues a change notification for
    /// each, so plugins constructed before the load still pick the values up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] if the table cannot be read.
    pub async fn load_overrides(&self) -> Result<(), Error> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT name, value FROM settings")
            .fetch_all(&self.db)
            .await?;

        let mut values = self.values.write().expect("settings lock poisoned");
        let mut pending = self.pending.lock().expect("settings lock poisoned");

        for (name, value) in rows {
            pending.push(name.clone());
            values.insert(name, value);
        }

        Ok(())
    }

    /// Returns the current value for `name`, if the option exists.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.values
            .read()
            .expect("settings lock poisoned")
            .get(name)
            .cloned()
    }

    /// Returns the help text registered for `name`.
    #[must_use]
    pub fn description(&self, name: &str) -> Option<&'static str> {
        self.descriptions
            .read()
            .expect("settings lock poisoned")
            .get(name)
            .copied()
    }

    /// Sets `name` to `value`, persists the pair, and queues a change notification.
    ///
    /// Setting an option to its current value still notifies, matching the behavior of the
    /// chat clients this store is modeled on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] if the value cannot be persisted.
    pub async fn set(&self, name: &str, value: &str) -> Result<(), Error> {
        {
            let mut values = self.values.write().expect("settings lock poisoned");
            values.insert(name.to_string(), value.to_string());
        }

        sqlx::query(
            "INSERT INTO settings (name, value) VALUES (?1, ?2) \
             ON CONFLICT (name) DO UPDATE SET value = excluded.value",
        )
        .bind(name)
        .bind(value)
        .execute(&self.db)
        .await?;

        self.pending
            .lock()
            .expect("settings lock poisoned")
            .push(name.to_string());

        Ok(())
    }

    /// Takes the queued change notifications, leaving the queue empty.
    #[must_use]
    pub fn drain_changes(&self) -> Vec<String> {
        std::mem::take(&mut *self.pending.lock().expect("settings lock poisoned"))
    }

    /// Reads `name` as a boolean. Unknown options read as `false`.
    #[must_use]
    pub fn bool_value(&self, name: &str) -> bool {
        self.get(name).as_deref().is_some_and(as_bool)
    }

    /// Reads `name` as an integer, if it has one.
    #[must_use]
    pub fn int_value(&self, name: &str) -> Option<i64> {
        self.get(name).as_deref().and_then(as_int)
    }

    /// Reads `name` as a comma-separated list.
    #[must_use]
    pub fn list_value(&self, name: &str) -> Vec<String> {
        self.get(name).as_deref().map(as_list).unwrap_or_default()
    }
}

/// Interprets a stored string as a boolean, the way chat client config stores do.
#[must_use]
pub fn as_bool(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "on" | "yes" | "true"
    )
}

/// Interprets a stored string as an integer.
#[must_use]
pub fn as_int(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}

/// Interprets a stored string as a comma-separated list, dropping empty items.
#[must_use]
pub fn as_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_coercion() {
        for input in ["1", "on", "ON", "yes", "true", " true "] {
            assert!(as_bool(input), "{input:?} should read as true");
        }

        for input in ["0", "off", "no", "false", "", "2"] {
            assert!(!as_bool(input), "{input:?} should read as false");
        }
    }

    #[test]
    fn int_coercion() {
        assert_eq!(as_int("300"), Some(300));
        assert_eq!(as_int(" -5 "), Some(-5));
        assert_eq!(as_int("ten"), None);
    }

    #[test]
    fn list_coercion() {
        assert_eq!(as_list("a, b,c"), vec!["a", "b", "c"]);
        assert_eq!(as_list(""), Vec::<String>::new());
        assert_eq!(as_list("one,,two,"), vec!["one", "two"]);
    }
}
