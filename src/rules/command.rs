//! Alert command templates

use serde::Serialize;
use std::fmt;

/// Placeholder replaced by the alert header
pub const HEADER_PLACEHOLDER: &str = "{HEADER}";
/// Placeholder replaced by the alert body
pub const BODY_PLACEHOLDER: &str = "{BODY}";

/// Command line template with `{HEADER}` and `{BODY}` placeholders
///
/// A template whose first non-blank character is `#` is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AlertCommand(String);

impl AlertCommand {
    /// Wrap a template
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Raw template text
    pub fn template(&self) -> &str {
        &self.0
    }

    /// Whether the template is commented out
    pub fn is_enabled(&self) -> bool {
        !self.0.trim_start().starts_with('#')
    }

    /// Substitute the placeholders literally
    ///
    /// No escaping is applied: whatever the header and body contain ends up
    /// on the command line.
    pub fn render(&self, header: &str, body: &str) -> String {
        self.0
            .replace(HEADER_PLACEHOLDER, header)
            .replace(BODY_PLACEHOLDER, body)
    }
}

impl fmt::Display for AlertCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
