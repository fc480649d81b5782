//! Handler registry: the read-only surface the resolvability analysis runs on.
//!
//! [`HandlerRegistry`] is the seam between the analysis and whatever
//! container hosts the components. [`Registry`] is Mizan's own immutable
//! snapshot implementing it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::error::{AlreadyRegisteredError, MizanError};
use crate::factory::{Delegate, FactoryMap, FactoryMethod, FactoryMethodKind};
use crate::handler::{Handler, HandlerId, HandlerState};
use crate::key::TypeKey;
use crate::lifestyle::Lifestyle;
use crate::model::{ComponentModel, Dependency};
use crate::state::{StateSolver, Topology};

/// Read-only access to a component registry.
///
/// Implementations must return a stable handler order for as long as the
/// value is borrowed, and must never panic from [`synthesize`].
///
/// [`synthesize`]: HandlerRegistry::synthesize
pub trait HandlerRegistry {
    /// Every registered handler, in registration order.
    fn all_handlers(&self) -> Vec<Arc<Handler>>;

    /// Every handler that can be requested as `ty`.
    fn handlers_for(&self, ty: &TypeKey) -> Vec<Arc<Handler>>;

    /// The primary handler for `ty`: the first one registered.
    fn handler_for(&self, ty: &TypeKey) -> Option<Arc<Handler>> {
        self.handlers_for(ty).into_iter().next()
    }

    /// Builds a component model for an unregistered type, if the host can.
    ///
    /// `key` is the dependency key the type was requested under.
    fn synthesize(&self, key: Option<&str>, ty: &TypeKey) -> Option<Arc<ComponentModel>>;

    /// The factory-method map attached to `model`.
    fn factory_map<'m>(&self, model: &'m ComponentModel) -> Option<&'m FactoryMap> {
        model.factory_map()
    }

    /// Current validity of `handler`.
    fn state(&self, handler: &Handler) -> HandlerState {
        handler.state()
    }

    /// Whether factory indirection is available at all.
    fn supports_factories(&self) -> bool;
}

/// Registrations collected before a snapshot is frozen.
#[derive(Debug, Clone, Default)]
pub(crate) struct Registrations {
    models: Vec<ComponentModel>,
    delegates: HashMap<TypeKey, FactoryMethod>,
}

impl Registrations {
    /// Adds a component model plus the delegate signatures it knows about.
    ///
    /// # Errors
    /// Returns [`MizanError::AlreadyRegistered`] if the name is taken and
    /// `allow_override` is false.
    pub fn add(
        &mut self,
        model: ComponentModel,
        delegates: Vec<FactoryMethod>,
        allow_override: bool,
    ) -> Result<(), MizanError> {
        let existing = self.models.iter().position(|m| m.name() == model.name());

        match existing {
            Some(_) if !allow_override => {
                return Err(MizanError::AlreadyRegistered(AlreadyRegisteredError {
                    name: model.name().to_string(),
                }));
            }
            Some(index) => {
                debug!(component = model.name(), "Overriding component");
                self.models[index] = model;
            }
            None => {
                debug!(component = model.name(), lifestyle = %model.lifestyle(), "Registered component");
                self.models.push(model);
            }
        }

        for method in delegates {
            self.add_delegate(method);
        }
        Ok(())
    }

    /// Records a delegate signature without registering a component.
    pub fn add_delegate(&mut self, method: FactoryMethod) {
        self.delegates.entry(method.declaring_type()).or_insert(method);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Freezes the registrations into a snapshot, computing handler states.
    pub fn freeze(&self, factory_support: bool) -> Registry {
        Registry::new(self.models.clone(), self.delegates.clone(), factory_support)
    }
}

/// Immutable registry snapshot.
///
/// Handler states are computed once, when the snapshot is frozen.
/// Implicit delegate factories are synthesized on demand and cached per
/// snapshot.
pub struct Registry {
    handlers: Vec<Arc<Handler>>,
    models: Vec<Arc<ComponentModel>>,
    by_service: HashMap<TypeKey, Vec<usize>>,
    delegates: HashMap<TypeKey, FactoryMethod>,
    states: Vec<HandlerState>,
    factory_support: bool,
    implicit: DashMap<TypeKey, Option<Arc<ComponentModel>>>,
}

impl Registry {
    fn new(
        models: Vec<ComponentModel>,
        delegates: HashMap<TypeKey, FactoryMethod>,
        factory_support: bool,
    ) -> Self {
        let models: Vec<Arc<ComponentModel>> = models.into_iter().map(Arc::new).collect();

        let mut by_service: HashMap<TypeKey, Vec<usize>> = HashMap::new();
        for (index, model) in models.iter().enumerate() {
            for service in model.services() {
                by_service.entry(*service).or_default().push(index);
            }
        }

        let states = StateSolver::solve(Topology {
            models: &models,
            by_service: &by_service,
            delegates: &delegates,
            factory_support,
        });

        let handlers = models
            .iter()
            .zip(&states)
            .enumerate()
            .map(|(index, (model, state))| Arc::new(Handler::new(HandlerId(index), model.clone(), *state)))
            .collect();

        Self {
            handlers,
            models,
            by_service,
            delegates,
            states,
            factory_support,
            implicit: DashMap::new(),
        }
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Primary handler for `T`.
    pub fn handler<T: ?Sized + 'static>(&self) -> Option<Arc<Handler>> {
        self.handler_for(&TypeKey::of::<T>())
    }

    fn topology(&self) -> Topology<'_> {
        Topology {
            models: &self.models,
            by_service: &self.by_service,
            delegates: &self.delegates,
            factory_support: self.factory_support,
        }
    }

    fn build_implicit(&self, key: Option<&str>, ty: &TypeKey) -> Option<Arc<ComponentModel>> {
        let solver = StateSolver::new(self.topology(), &self.states);
        if !solver.can_synthesize(ty) {
            trace!(ty = %ty, key, "No implicit factory for type");
            return None;
        }

        let invoke = self.delegates.get(ty)?;
        let map: FactoryMap = std::iter::once((invoke.clone(), FactoryMethodKind::Resolve)).collect();
        debug!(ty = %ty, key, produces = %invoke.returns(), "Synthesized implicit delegate factory");

        // the product is listed so a walk reaches factories returned by factories
        Some(Arc::new(
            ComponentModel::new(format!("implicit {ty}"), *ty)
                .with_lifestyle(Lifestyle::Transient)
                .with_dependencies(vec![Dependency::new(invoke.returns()).optional()])
                .with_factory_map(map),
        ))
    }
}

impl HandlerRegistry for Registry {
    fn all_handlers(&self) -> Vec<Arc<Handler>> {
        self.handlers.clone()
    }

    fn handlers_for(&self, ty: &TypeKey) -> Vec<Arc<Handler>> {
        self.by_service
            .get(ty)
            .map(|ids| ids.iter().map(|&i| self.handlers[i].clone()).collect())
            .unwrap_or_default()
    }

    fn synthesize(&self, key: Option<&str>, ty: &TypeKey) -> Option<Arc<ComponentModel>> {
        if let Some(cached) = self.implicit.get(ty) {
            return cached.value().clone();
        }
        let model = self.build_implicit(key, ty);
        self.implicit.entry(*ty).or_insert(model).value().clone()
    }

    fn supports_factories(&self) -> bool {
        self.factory_support
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("handlers", &self.handlers.len())
            .field("factory_support", &self.factory_support)
            .field("known_delegates", &self.delegates.len())
            .finish()
    }
}

/// Collects the delegate signature of `F` for registration.
pub(crate) fn delegate_signature<F: ?Sized + Delegate>() -> FactoryMethod {
    F::invoke_method()
}
