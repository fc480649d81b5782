//! Factory catalog: which factory resolve methods can produce which type.
//!
//! Built by walking every registered component and, transitively, the
//! components behind its dependencies. Dependencies on unregistered types
//! are handed to [`HandlerRegistry::synthesize`]; whatever the host can
//! synthesize (typically a delegate factory nobody registered) is walked
//! too, so factories of factories end up indexed.

use std::collections::{HashMap, HashSet};

use mizan_container::factory::FactoryMethod;
use mizan_container::key::TypeKey;
use mizan_container::model::ComponentModel;
use mizan_container::registry::HandlerRegistry;
use tracing::{debug, instrument, trace};

/// Index from produced type to the factory resolve methods producing it.
#[derive(Debug, Default)]
pub struct FactoryCatalog {
    methods: HashMap<TypeKey, Vec<FactoryMethod>>,
    implicit: HashSet<TypeKey>,
}

impl FactoryCatalog {
    /// Walks `registry` and indexes every reachable factory resolve method.
    #[instrument(skip(registry), name = "factory_catalog")]
    pub fn build<R: HandlerRegistry + ?Sized>(registry: &R) -> Self {
        let mut builder = CatalogBuilder {
            registry,
            visited: HashSet::new(),
            catalog: FactoryCatalog::default(),
        };

        for handler in registry.all_handlers() {
            builder.visit(handler.model());
        }

        let catalog = builder.catalog;
        debug!(
            produced_types = catalog.methods.len(),
            implicit_factories = catalog.implicit.len(),
            "Factory catalog built"
        );
        catalog
    }

    /// Resolve methods producing `ty`. Empty if none.
    pub fn producing(&self, ty: &TypeKey) -> &[FactoryMethod] {
        self.methods.get(ty).map(Vec::as_slice).unwrap_or_default()
    }

    /// Types that were only reachable through implicit synthesis.
    pub fn implicit_types(&self) -> &HashSet<TypeKey> {
        &self.implicit
    }

    pub fn is_implicit(&self, ty: &TypeKey) -> bool {
        self.implicit.contains(ty)
    }

    /// Number of distinct produced types.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    fn index(&mut self, method: &FactoryMethod) {
        let methods = self.methods.entry(method.returns()).or_default();
        if !methods.contains(method) {
            trace!(
                produces = %method.returns(),
                factory = %method.declaring_type(),
                method = method.name(),
                "Indexed factory resolve method"
            );
            methods.push(method.clone());
        }
    }
}

struct CatalogBuilder<'r, R: ?Sized> {
    registry: &'r R,
    // component names; a name identifies a component within one registry
    visited: HashSet<String>,
    catalog: FactoryCatalog,
}

impl<R: HandlerRegistry + ?Sized> CatalogBuilder<'_, R> {
    fn visit(&mut self, model: &ComponentModel) {
        if !self.visited.insert(model.name().to_string()) {
            return;
        }

        if let Some(map) = self.registry.factory_map(model) {
            for method in map.resolve_methods() {
                if method.is_delegate_helper() {
                    debug!(
                        factory = %method.declaring_type(),
                        method = method.name(),
                        "Skipping delegate method that is not its invocation"
                    );
                    continue;
                }
                self.catalog.index(method);
            }
        }

        for dependency in model.dependencies() {
            let handlers = self.registry.handlers_for(dependency.target());
            if !handlers.is_empty() {
                for handler in handlers {
                    self.visit(handler.model());
                }
                continue;
            }

            if let Some(implicit) = self.registry.synthesize(dependency.key(), dependency.target()) {
                trace!(ty = %dependency.target(), consumer = model.name(), "Following implicit factory");
                self.catalog.implicit.insert(*dependency.target());
                self.visit(&implicit);
            }
        }
    }
}
