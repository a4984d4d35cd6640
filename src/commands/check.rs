//! Check command implementation
//!
//! Parses and validates a configuration record without touching the running
//! monitor.

use crate::cli::args::{CheckArgs, OutputFormat};
use crate::cli::output::{print_output, RuleListing};
use crate::commands::load_rules;
use crate::config::Settings;
use crate::error::Result;
use crate::rules::parse_record;
use crate::store::DirStore;

/// Execute the check command
pub fn run_check(args: &CheckArgs, settings: &Settings, format: OutputFormat) -> Result<()> {
    let (source, rules) = match &args.file {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            (path.display().to_string(), parse_record(&text)?)
        }
        None => {
            let store = DirStore::open(&settings.store.dir)?;
            let rules = load_rules(&store, &settings.store.key)?;
            (format!("{} [{}]", settings.store.dir.display(), settings.store.key), rules)
        }
    };

    print_output(&RuleListing::new(source, &rules), format)?;
    Ok(())
}
