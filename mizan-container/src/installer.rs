//! Installers: modules of related component registrations.
//!
//! # Examples
//! ```rust
//! use mizan_container::prelude::*;
//!
//! struct Mailer;
//! struct Smtp;
//!
//! struct MailInstaller;
//!
//! impl Installer for MailInstaller {
//!     fn install(&self, registry: &mut dyn InstallerRegistry) {
//!         registry.add(ComponentRegistration::of::<Smtp>());
//!         registry.add(ComponentRegistration::of::<Mailer>().depends_on::<Smtp>());
//!     }
//! }
//!
//! let container = Container::builder()
//!     .with_factory_support()
//!     .install(&MailInstaller)
//!     .build()
//!     .unwrap();
//! assert_eq!(container.snapshot().len(), 2);
//! ```

use crate::container::ComponentRegistration;

/// A module that registers related components.
///
/// Split registrations by domain instead of one giant block:
///
/// ```rust,ignore
/// Container::builder()
///     .install(&PersistenceInstaller)
///     .install(&MailInstaller)
///     .build()?;
/// ```
pub trait Installer: Send + Sync {
    /// Register components. Called once per builder.
    fn install(&self, registry: &mut dyn InstallerRegistry);

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// The registration surface handed to [`Installer::install`].
pub trait InstallerRegistry {
    fn add(&mut self, registration: ComponentRegistration);
}
