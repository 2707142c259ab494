mod config;
mod database;
mod entry_store;

pub use config::{Config, NotificationsConfig, ScheduleConfig};
pub use database::Database;
pub use entry_store::{EntryStore, JsonEntryStore};

use std::path::PathBuf;

/// Returns `~/.config/flowtimer[-dev]/` based on FLOWTIMER_ENV.
///
/// Set FLOWTIMER_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FLOWTIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("flowtimer-dev")
    } else {
        base_dir.join("flowtimer")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
