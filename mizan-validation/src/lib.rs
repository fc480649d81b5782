//! # Mizan Validation
//!
//! Factory-aware resolvability analysis.
//!
//! A container marks a component as waiting when one of its dependencies
//! has no handler. With typed factories that is often a false alarm: the
//! caller of `Fn(i32) -> Service` supplies the `i32` itself. This crate
//! builds a [`FactoryCatalog`] of every factory reachable in a registry
//! and reports only the dependencies that no factory can supply.
//!
//! ```
//! use mizan_container::prelude::*;
//! use mizan_validation::unresolvable_dependencies;
//!
//! struct ServiceWithUnknownArg;
//!
//! let container = Container::builder()
//!     .with_factory_support()
//!     .register(ComponentRegistration::of::<ServiceWithUnknownArg>().depends_on::<i32>())
//!     .register(ComponentRegistration::delegate_factory::<dyn Fn(i32) -> ServiceWithUnknownArg>())
//!     .build()
//!     .unwrap();
//!
//! let registry = container.snapshot();
//! let findings = unresolvable_dependencies(&*registry).unwrap();
//! assert!(findings.is_empty());
//! println!("{}", findings.report(&*registry));
//! ```

pub mod catalog;
pub mod checker;
pub mod findings;
pub mod report;

pub use catalog::FactoryCatalog;
pub use checker::{ResolvabilityChecker, unresolvable_dependencies};
pub use findings::{Finding, Findings};
pub use report::{Report, ReportEntry, ReportSummary, UnresolvedDependency};
