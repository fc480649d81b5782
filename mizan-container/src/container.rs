//! # The Container
//!
//! A registration-only host for component models. It never activates
//! anything; it exists to describe a component graph, compute handler
//! states and hand out immutable [`Registry`] snapshots for analysis.
//!
//! # Architecture
//! ```text
//! ContainerBuilder  ──build()──>  Container  ──snapshot()──>  Arc<Registry>
//!                                    │
//!                               register()   (copy-on-write, new snapshot)
//! ```
//!
//! # Examples
//! ```rust
//! use mizan_container::prelude::*;
//!
//! struct ServiceWithUnknownArg;
//!
//! let container = Container::builder()
//!     .with_factory_support()
//!     .register(ComponentRegistration::of::<ServiceWithUnknownArg>().depends_on::<i32>())
//!     .register(ComponentRegistration::delegate_factory::<dyn Fn(i32) -> ServiceWithUnknownArg>())
//!     .build()
//!     .expect("Failed to build container");
//!
//! let snapshot = container.snapshot();
//! let handler = snapshot.handler::<ServiceWithUnknownArg>().unwrap();
//! assert_eq!(handler.state(), HandlerState::Waiting);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use crate::error::{MizanError, Result};
use crate::factory::{Delegate, FactoryInterface, FactoryMap, FactoryMethod};
use crate::installer::{Installer, InstallerRegistry};
use crate::key::TypeKey;
use crate::lifestyle::Lifestyle;
use crate::model::{ComponentModel, Dependency};
use crate::registry::{Registrations, Registry, delegate_signature};

// ============================================================
// ComponentRegistration
// ============================================================

/// Describes one component to register.
///
/// Without reflection, constructor parameters are declared explicitly.
pub struct ComponentRegistration {
    name: Option<String>,
    implementation: TypeKey,
    services: Vec<TypeKey>,
    lifestyle: Lifestyle,
    dependencies: Vec<Dependency>,
    factory: Option<FactoryMap>,
    delegates: Vec<FactoryMethod>,
}

impl ComponentRegistration {
    /// A component implemented by `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            name: None,
            implementation: TypeKey::of::<T>(),
            services: Vec::new(),
            lifestyle: Lifestyle::default(),
            dependencies: Vec::new(),
            factory: None,
            delegates: Vec::new(),
        }
    }

    /// An explicitly registered delegate factory `F`, e.g. `dyn Fn(i32) -> Service`.
    pub fn delegate_factory<F: ?Sized + Delegate>() -> Self {
        let mut registration = Self::of::<F>().lifestyle(Lifestyle::Transient);
        registration.factory = Some(F::factory_map());
        registration.delegates.push(delegate_signature::<F>());
        registration
    }

    /// An explicitly registered factory interface.
    pub fn factory(interface: FactoryInterface) -> Self {
        let (service, methods) = interface.into_parts();
        let mut registration = Self {
            implementation: service,
            ..Self::of::<()>()
        }
        .lifestyle(Lifestyle::Transient);
        registration.factory = Some(methods);
        registration
    }

    /// Overrides the component name (defaults to the implementation type name).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a service type the component can be requested as.
    pub fn service<S: ?Sized + 'static>(mut self) -> Self {
        self.services.push(TypeKey::of::<S>());
        self
    }

    pub fn lifestyle(mut self, lifestyle: Lifestyle) -> Self {
        self.lifestyle = lifestyle;
        self
    }

    /// Adds a required dependency on `D`.
    pub fn depends_on<D: ?Sized + 'static>(self) -> Self {
        self.dependency(Dependency::on::<D>())
    }

    /// Adds a required dependency on `D` under a key.
    pub fn depends_on_named<D: ?Sized + 'static>(self, key: impl Into<String>) -> Self {
        self.dependency(Dependency::on::<D>().with_key(key))
    }

    /// Adds an optional dependency on `D`.
    pub fn optional<D: ?Sized + 'static>(self) -> Self {
        self.dependency(Dependency::on::<D>().optional())
    }

    /// Adds a dependency on `D` that has a default value.
    pub fn defaulted<D: ?Sized + 'static>(self) -> Self {
        self.dependency(Dependency::on::<D>().with_default())
    }

    /// Adds a required dependency on the delegate factory `F` and records
    /// its signature so the container can synthesize it implicitly.
    pub fn depends_on_factory<F: ?Sized + Delegate>(mut self) -> Self {
        self.delegates.push(delegate_signature::<F>());
        self.dependency(Dependency::on::<F>())
    }

    pub fn dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// The name the component will be registered under.
    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.implementation.type_name().to_string())
    }

    fn into_parts(self) -> (ComponentModel, Vec<FactoryMethod>) {
        let mut model = ComponentModel::new(self.name(), self.implementation)
            .with_services(self.services)
            .with_lifestyle(self.lifestyle)
            .with_dependencies(self.dependencies);
        if let Some(map) = self.factory {
            model = model.with_factory_map(map);
        }
        (model, self.delegates)
    }
}

impl fmt::Debug for ComponentRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistration")
            .field("name", &self.name())
            .field("services", &self.services)
            .field("dependencies", &self.dependencies)
            .field("is_factory", &self.factory.is_some())
            .finish()
    }
}

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`].
pub struct ContainerBuilder {
    registrations: Registrations,
    allow_override: bool,
    factory_support: bool,
    error: Option<MizanError>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            registrations: Registrations::default(),
            allow_override: false,
            factory_support: false,
            error: None,
        }
    }

    /// Allow re-registering a component name, replacing the earlier one.
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    /// Enables factory support: explicit factories become valid and unregistered
    /// delegate factories can be synthesized.
    pub fn with_factory_support(mut self) -> Self {
        self.factory_support = true;
        self
    }

    pub fn register(mut self, registration: ComponentRegistration) -> Self {
        self.add(registration);
        self
    }

    /// Teaches the container the signature of delegate `F` without registering it,
    /// so it can be synthesized when a factory returns it.
    pub fn with_delegate<F: ?Sized + Delegate>(mut self) -> Self {
        self.registrations.add_delegate(delegate_signature::<F>());
        self
    }

    /// Runs an [`Installer`] against this builder.
    pub fn install(mut self, installer: &dyn Installer) -> Self {
        debug!(installer = installer.name(), "Running installer");
        installer.install(&mut self);
        self
    }

    /// Build the container and compute the initial handler states.
    ///
    /// # Errors
    /// Returns the first registration error, e.g. [`MizanError::AlreadyRegistered`].
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        if let Some(err) = self.error {
            return Err(err);
        }

        info!(
            registered = self.registrations.len(),
            factory_support = self.factory_support,
            "Building container"
        );

        let snapshot = Arc::new(self.registrations.freeze(self.factory_support));
        Ok(Container {
            inner: RwLock::new(Inner {
                registrations: self.registrations,
                snapshot,
            }),
            allow_override: self.allow_override,
            factory_support: self.factory_support,
        })
    }
}

impl InstallerRegistry for ContainerBuilder {
    fn add(&mut self, registration: ComponentRegistration) {
        if self.error.is_some() {
            return;
        }
        let (model, delegates) = registration.into_parts();
        if let Err(err) = self.registrations.add(model, delegates, self.allow_override) {
            self.error = Some(err);
        }
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

struct Inner {
    registrations: Registrations,
    snapshot: Arc<Registry>,
}

/// Thread-safe component container.
///
/// Registrations may still be added after build; each one publishes a new
/// snapshot. Snapshots already handed out are never mutated.
pub struct Container {
    inner: RwLock<Inner>,
    allow_override: bool,
    factory_support: bool,
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// The current registry snapshot.
    pub fn snapshot(&self) -> Arc<Registry> {
        self.inner.read().snapshot.clone()
    }

    /// Registers one more component and publishes a fresh snapshot.
    ///
    /// # Errors
    /// Returns [`MizanError::AlreadyRegistered`] if the name is taken and
    /// override is not allowed.
    pub fn register(&self, registration: ComponentRegistration) -> Result<()> {
        let (model, delegates) = registration.into_parts();
        let mut inner = self.inner.write();
        inner.registrations.add(model, delegates, self.allow_override)?;
        inner.snapshot = Arc::new(inner.registrations.freeze(self.factory_support));
        Ok(())
    }

    pub fn supports_factories(&self) -> bool {
        self.factory_support
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.inner.read().registrations.len())
            .field("factory_support", &self.factory_support)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{ComponentRegistration, Container, ContainerBuilder};
    pub use crate::error::{MizanError, Result};
    pub use crate::factory::{Delegate, FactoryInterface};
    pub use crate::handler::{Handler, HandlerState};
    pub use crate::installer::{Installer, InstallerRegistry};
    pub use crate::key::TypeKey;
    pub use crate::lifestyle::Lifestyle;
    pub use crate::registry::{HandlerRegistry, Registry};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
