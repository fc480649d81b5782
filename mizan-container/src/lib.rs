//! Component model and host container for Mizan.
//!
//! Everything the resolvability analysis reads lives here: type keys,
//! component models, factory metadata, handlers and the
//! [`HandlerRegistry`] seam.

pub mod container;
pub mod error;
pub mod factory;
pub mod handler;
pub mod installer;
pub mod key;
pub mod lifestyle;
pub mod model;
pub mod registry;
mod state;

pub use container::{ComponentRegistration, Container, ContainerBuilder, prelude};
pub use error::{MizanError, Result};
pub use factory::{Delegate, FactoryInterface, FactoryMap, FactoryMethod, FactoryMethodKind};
pub use handler::{Handler, HandlerId, HandlerState};
pub use key::TypeKey;
pub use model::{ComponentModel, Dependency};
pub use registry::{HandlerRegistry, Registry};
