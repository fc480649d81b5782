//! # Mizan
//!
//! Describe a component graph, then ask which dependencies can actually
//! never be resolved, taking typed factories into account.
//!
//! ```
//! use mizan::prelude::*;
//!
//! struct ServiceWithUnknownArg;
//! struct ConsumingService;
//!
//! let container = Container::builder()
//!     .with_factory_support()
//!     .register(ComponentRegistration::of::<ServiceWithUnknownArg>().depends_on::<i32>())
//!     .register(
//!         ComponentRegistration::of::<ConsumingService>()
//!             .depends_on_factory::<dyn Fn(i32) -> ServiceWithUnknownArg>(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let findings = unresolvable_dependencies(&*container.snapshot()).unwrap();
//! assert!(findings.is_empty());
//! ```

pub use mizan_container::*;
pub use mizan_support as support;
pub use mizan_validation as validation;
pub use mizan_validation::{FactoryCatalog, Findings, Report, unresolvable_dependencies};

pub mod prelude {
    pub use mizan_container::prelude::*;
    pub use mizan_validation::{Finding, Findings, Report, unresolvable_dependencies};
}
