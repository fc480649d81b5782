//! Error types for Mizan.
//!
//! Unresolvable dependencies are *findings*, not errors. Errors are kept for
//! misuse of the container and for configurations the analysis cannot run on.

use std::fmt;

/// Main error type for all Mizan operations.
#[derive(Debug, thiserror::Error)]
pub enum MizanError {
    /// A component with the same name is already registered.
    #[error("{}", .0)]
    AlreadyRegistered(AlreadyRegisteredError),

    /// The registry has no factory support, so factory indirection cannot be analyzed.
    #[error(
        "Factory support is not enabled on this registry\n  \
         Hint: Without it every factory-deferred dependency would be reported as unresolvable. \
         Call .with_factory_support() on the container builder"
    )]
    FactorySupportRequired,
}

/// Error when trying to register a component name that already exists.
#[derive(Debug)]
pub struct AlreadyRegisteredError {
    pub name: String,
}

impl fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component already registered: {}", self.name)?;
        write!(
            f,
            "\n  Hint: Give the component a distinct .named(..), or enable allow_override on the builder"
        )
    }
}

/// Convenient Result type for Mizan operations.
pub type Result<T> = std::result::Result<T, MizanError>;
