//! tqalert - trading data liveness monitor
//!
//! Watches tick and quote activity markers and runs alert commands when a
//! symbol goes quiet inside its trading window.

use clap::Parser;
use tqalert::cli::args::{generate_completions, Cli, Commands};
use tqalert::commands::{
    run_check, run_config, run_monitor, run_mute, run_reload, run_status, run_test, run_unmute,
};
use tqalert::config::{log_level, ConfigBuilder, Settings};
use tqalert::error::{AppError, SettingsError, StoreError};

fn main() {
    let cli = Cli::parse();

    // Level follows -v until the settings file is read; RUST_LOG wins
    let daemon = matches!(cli.command, Commands::Run(_));
    let env_filter = std::env::var_os("RUST_LOG").is_some();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .format_timestamp_secs()
        .init();
    if !env_filter {
        log::set_max_level(log_level(cli.verbose, daemon));
    }

    let result = load_settings(&cli).and_then(|settings| {
        if !env_filter {
            log::set_max_level(settings.log_level(daemon));
        }
        run(&cli, &settings)
    });

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, AppError> {
    let mut builder = ConfigBuilder::new()
        .with_file(cli.config.as_deref())?
        .with_verbose(cli.verbose.then_some(true))
        .with_dry_run(cli.dry_run.then_some(true));

    if let Commands::Run(args) = &cli.command {
        builder = builder
            .with_interval(args.interval)
            .with_utc(args.utc.then_some(true));
    }

    Ok(builder.build()?)
}

fn run(cli: &Cli, settings: &Settings) -> Result<(), AppError> {
    match &cli.command {
        Commands::Run(args) => run_monitor(args, settings),

        Commands::Check(args) => run_check(args, settings, cli.format),

        Commands::Status => run_status(settings, cli.format),

        Commands::Mute { symbols } => run_mute(symbols, settings, cli.format),

        Commands::Unmute { symbols } => run_unmute(symbols, settings, cli.format),

        Commands::Test { index } => run_test(*index, settings, cli.format),

        Commands::Reload => run_reload(settings, cli.format),

        Commands::Config(args) => run_config(args, settings, cli.format),

        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Store(StoreError::Unavailable { .. }) => {
            eprintln!();
            eprintln!("Hint: Check [store] dir in the settings file.");
            eprintln!("      'tqalert config set FILE' creates the store directory.");
        }
        AppError::RecordNotFound(key) => {
            eprintln!();
            eprintln!("Hint: Store a record with 'tqalert config set FILE'.");
            eprintln!("      The monitor reads key '{}'.", key);
        }
        AppError::Settings(SettingsError::FileNotFound(_)) => {
            eprintln!();
            eprintln!("Hint: Check the --config path or the TQALERT_CONFIG variable.");
        }
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Hint: Run 'tqalert check --file FILE' to validate a record.");
        }
        _ => {}
    }
}
