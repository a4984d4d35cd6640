//! Unified error types for tqalert
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from alert configuration record parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from the process settings file
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Error from the configuration store
    #[error("Configuration store error: {0}")]
    Store(#[from] StoreError),

    /// Error from domain type validation
    #[error("Domain validation error: {0}")]
    Domain(#[from] DomainError),

    /// Error from alert dispatch
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Error from control signal handling
    #[error("Control signal error: {0}")]
    Control(#[from] ControlSignalError),

    /// The store holds no record under the configured key
    #[error("No configuration record found under key '{0}'")]
    RecordNotFound(String),

    /// Failed to install the termination signal handler
    #[error("Failed to install signal handler: {0}")]
    Signal(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from domain type validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Weekday mask is not exactly seven binary digits
    #[error("Invalid weekday mask '{0}' (expected 7 digits of 0/1, Monday first)")]
    InvalidWeekdayMask(String),

    /// Time of day could not be parsed or is out of range
    #[error("Invalid time of day '{0}' (expected HHMMSS, HH:MM:SS or <seconds>s)")]
    InvalidTimeOfDay(String),

    /// Seconds since midnight out of range
    #[error("Seconds since midnight out of range: {0} (must be below 86400)")]
    SecondsOutOfRange(u64),

    /// Unknown data kind
    #[error("Unknown data kind: {0} (expected tick or quote)")]
    UnknownKind(String),
}

/// Errors from parsing and validating the alert configuration record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Record is not valid JSON
    #[error("Failed to parse configuration record: {0}")]
    ParseError(String),

    /// Missing required top-level field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// Field has the wrong shape
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// A rule of a symbol failed validation
    #[error("Invalid rule #{index} for symbol '{symbol}' ({field}): {message}")]
    InvalidRule {
        symbol: String,
        index: usize,
        field: String,
        message: String,
    },
}

/// Errors from the process settings file
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings file not found
    #[error("Settings file not found: {0}")]
    FileNotFound(String),

    /// Invalid settings value
    #[error("Invalid settings value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Errors from the configuration store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store location is unreachable
    #[error("Store unavailable at {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters not allowed in a store key
    #[error("Invalid store key: {0}")]
    InvalidKey(String),

    /// Read or write failed
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from reading activity markers
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Marker does not exist
    #[error("Activity marker not found: {0}")]
    Missing(String),

    /// Marker exists but could not be read
    #[error("Failed to read activity marker {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Marker content is not an epoch timestamp
    #[error("Malformed activity marker {path}: '{content}'")]
    Malformed { path: String, content: String },
}

/// Errors from alert command dispatch
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Process could not be spawned
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited unsuccessfully
    #[error("Command '{command}' exited with status {status}")]
    ExitStatus { command: String, status: String },

    /// Process exceeded the configured timeout and was killed
    #[error("Command '{command}' timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    /// Worker queue is full
    #[error("Dispatch queue full, dropped alert for {0}")]
    QueueFull(String),

    /// Worker pool has shut down
    #[error("Dispatcher is shut down")]
    Closed,
}

/// Errors from malformed control signals
#[derive(Error, Debug)]
pub enum ControlSignalError {
    /// Test-fire marker with a non-numeric index
    #[error("Malformed test-fire marker '{0}'")]
    BadIndex(String),

    /// Test-fire index beyond the command list
    #[error("Test-fire index {index} out of range ({count} alert commands configured)")]
    IndexOutOfRange { index: usize, count: usize },

    /// Mute marker without a usable symbol
    #[error("Malformed mute marker '{0}'")]
    BadSymbol(String),

    /// Marker could not be read or removed
    #[error("Control marker {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
