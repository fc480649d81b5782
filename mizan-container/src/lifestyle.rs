//! Component lifestyles.
//!
//! The analysis never activates components, so a lifestyle is purely
//! descriptive here: it travels with the [`ComponentModel`] and shows up
//! in reports.
//!
//! [`ComponentModel`]: crate::model::ComponentModel
use std::fmt;

/// How long an activated component lives inside the host container.
///
/// # Examples
/// ```
/// use mizan_container::lifestyle::Lifestyle;
///
/// assert_eq!(Lifestyle::default(), Lifestyle::Singleton);
/// assert!(Lifestyle::Transient.is_transient());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifestyle {
    /// One instance for the whole container. The default for registered components.
    #[default]
    Singleton,

    /// One instance per scope (e.g. per request).
    Scoped,

    /// A new instance on every resolve.
    ///
    /// Factories, explicit or synthesized, are always transient.
    Transient,
}

impl Lifestyle {
    /// Returns `true` for [`Lifestyle::Transient`].
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, Lifestyle::Transient)
    }
}

impl fmt::Display for Lifestyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifestyle::Singleton => write!(f, "Singleton"),
            Lifestyle::Scoped => write!(f, "Scoped"),
            Lifestyle::Transient => write!(f, "Transient"),
        }
    }
}
