//! Record management commands
//!
//! Reads and replaces the configuration record held in the store.

use crate::cli::args::{ConfigArgs, ConfigCommands, OutputFormat};
use crate::cli::output::{print_output, Message, TableDisplay};
use crate::commands::{control_surface, now_epoch};
use crate::config::Settings;
use crate::error::{AppError, ConfigError, Result};
use crate::rules::parse_record;
use crate::store::{ConfigStore, DirStore};
use serde::Serialize;

/// Stored record for display
#[derive(Debug, Clone, Serialize)]
pub struct StoredRecord {
    pub key: String,
    pub record: serde_json::Value,
}

impl TableDisplay for StoredRecord {
    fn to_table(&self) -> String {
        serde_json::to_string_pretty(&self.record).unwrap_or_default()
    }

    fn to_compact(&self) -> String {
        self.record.to_string()
    }
}

/// Execute a config subcommand
pub fn run_config(args: &ConfigArgs, settings: &Settings, format: OutputFormat) -> Result<()> {
    match &args.command {
        ConfigCommands::Get => {
            let store = DirStore::open(&settings.store.dir)?;
            let key = &settings.store.key;
            let text = store
                .fetch(key)?
                .ok_or_else(|| AppError::RecordNotFound(key.clone()))?;
            let record = serde_json::from_str(&text)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;

            print_output(
                &StoredRecord {
                    key: key.clone(),
                    record,
                },
                format,
            )?;
        }

        ConfigCommands::Set { file, no_reload } => {
            let text = std::fs::read_to_string(file)?;
            let rules = parse_record(&text)?;

            let store = DirStore::create(&settings.store.dir)?;
            store.store(&settings.store.key, text.trim_end())?;
            log::info!(
                "Stored {} symbol(s), {} command(s) in {}",
                rules.symbol_count(),
                rules.commands().len(),
                store.describe()
            );

            let message = if *no_reload {
                "Record stored".to_string()
            } else {
                control_surface(settings).signal_reload(now_epoch())?;
                "Record stored, reload requested".to_string()
            };
            print_output(
                &Message {
                    message,
                    success: true,
                },
                format,
            )?;
        }
    }

    Ok(())
}
