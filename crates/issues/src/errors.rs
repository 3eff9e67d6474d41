//! Startup errors with causes and fixes.
//!
//! Request-level failures are typed (`ServiceError`, `StoreError`); this
//! module is for the failures an operator has to act on before the server
//! can run at all.

use std::fmt;
use std::path::Path;

/// A startup failure: what happened, why it might have happened, and what
/// the operator can do about it.
///
/// # Example
///
/// ```
/// use issues::errors::ActionableError;
///
/// let error = ActionableError::new("Database is locked")
///     .with_cause("Another server may be using the same file")
///     .with_remedy("Stop the other server or pass --database <other-path>");
///
/// assert!(error.to_error_message().contains("To fix:"));
/// ```
#[derive(Debug, Clone)]
pub struct ActionableError {
    summary: String,
    hints: Vec<Hint>,
}

#[derive(Debug, Clone)]
enum Hint {
    Cause(String),
    Remedy(String),
}

impl ActionableError {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            hints: Vec::new(),
        }
    }

    /// Add a possible cause. Blank causes are dropped.
    pub fn with_cause(self, cause: impl Into<String>) -> Self {
        self.hint(Hint::Cause, cause.into())
    }

    /// Add a remediation step.
    pub fn with_remedy(self, remedy: impl Into<String>) -> Self {
        self.hint(Hint::Remedy, remedy.into())
    }

    fn hint(mut self, kind: fn(String) -> Hint, text: String) -> Self {
        let text = text.trim();
        if !text.is_empty() {
            self.hints.push(kind(text.to_string()));
        }
        self
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    fn causes(&self) -> impl Iterator<Item = &str> {
        self.hints.iter().filter_map(|h| match h {
            Hint::Cause(text) => Some(text.as_str()),
            Hint::Remedy(_) => None,
        })
    }

    fn remedies(&self) -> impl Iterator<Item = &str> {
        self.hints.iter().filter_map(|h| match h {
            Hint::Remedy(text) => Some(text.as_str()),
            Hint::Cause(_) => None,
        })
    }

    /// Render as a multi-line message for stderr.
    pub fn to_error_message(&self) -> String {
        self.to_string()
    }
}

fn write_section<'a>(
    f: &mut fmt::Formatter<'_>,
    heading: &str,
    items: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    let mut items = items.peekable();
    if items.peek().is_none() {
        return Ok(());
    }
    write!(f, "\n{}:\n", heading)?;
    for item in items {
        writeln!(f, "  • {}", item)?;
    }
    Ok(())
}

impl fmt::Display for ActionableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error: {}", self.summary)?;
        write_section(f, "Possible causes", self.causes())?;
        write_section(f, "To fix", self.remedies())
    }
}

impl std::error::Error for ActionableError {}

/// The issue database could not be opened or migrated.
pub fn database_unavailable(path: &Path, reason: &str) -> ActionableError {
    ActionableError::new(format!("Cannot open issue database {}", path.display()))
        .with_cause(reason)
        .with_cause("The parent directory may not exist or may not be writable")
        .with_cause("The file may not be a SQLite database")
        .with_remedy("Point at another file: issues-server --database <path>")
        .with_remedy("Run without persistence: issues-server --in-memory")
}

/// The configuration file exists but could not be used.
pub fn config_invalid(path: &Path, reason: &str) -> ActionableError {
    ActionableError::new(format!("Invalid configuration file {}", path.display()))
        .with_cause(reason)
        .with_remedy("Check the file against the [server], [database] and [list] tables")
        .with_remedy("Remove the file to fall back to defaults")
}

/// The listen address could not be bound.
pub fn bind_failed(addr: &str, reason: &str) -> ActionableError {
    ActionableError::new(format!("Cannot listen on {}", addr))
        .with_cause(reason)
        .with_cause("Another process may already be using the port")
        .with_remedy("Choose another address: issues-server --bind 127.0.0.1:3001")
        .with_remedy("Or set ISSUES_BIND in the environment")
}
