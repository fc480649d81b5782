//! Resolvability checking.
//!
//! A naive validator flags every dependency without a registered handler.
//! That is wrong when the consumer is only ever obtained through a factory
//! that takes the missing value as an argument: the factory's caller
//! supplies it at invoke time.
//!
//! # Rule
//! A required dependency with no handler is accepted iff at least one
//! catalogued factory produces one of the consumer's service types, and
//! *every* such factory takes the dependency's type as a parameter. A
//! single factory that can build the consumer without the value means
//! the value may never be provided.
//!
//! Candidate factories are gathered over all service types of the
//! consumer, not only the one a particular caller asked for.

use std::collections::HashSet;
use std::sync::Arc;

use mizan_container::error::{MizanError, Result};
use mizan_container::factory::FactoryMethod;
use mizan_container::handler::{Handler, HandlerId, HandlerState};
use mizan_container::registry::HandlerRegistry;
use tracing::{debug, info, instrument, trace, warn};

use crate::catalog::FactoryCatalog;
use crate::findings::{Finding, Findings};

/// Finds every dependency that is actually unresolvable in `registry`.
///
/// Builds a fresh [`FactoryCatalog`] and walks every handler. Nothing in
/// the registry is modified.
///
/// # Errors
/// [`MizanError::FactorySupportRequired`] if the registry has no factory
/// support; without it the result would degenerate to the naive check.
///
/// # Examples
/// ```
/// use mizan_container::prelude::*;
/// use mizan_validation::unresolvable_dependencies;
///
/// struct ServiceWithUnknownArg;
///
/// let container = Container::builder()
///     .with_factory_support()
///     .register(ComponentRegistration::of::<ServiceWithUnknownArg>().depends_on::<i32>())
///     .build()
///     .unwrap();
///
/// let findings = unresolvable_dependencies(&*container.snapshot()).unwrap();
/// assert!(findings.has_invalid_component::<ServiceWithUnknownArg>());
/// ```
#[instrument(skip(registry), name = "resolvability_analysis")]
pub fn unresolvable_dependencies<R: HandlerRegistry + ?Sized>(registry: &R) -> Result<Findings> {
    if !registry.supports_factories() {
        warn!("Refusing to analyze a registry without factory support");
        return Err(MizanError::FactorySupportRequired);
    }

    let catalog = FactoryCatalog::build(registry);
    let findings = ResolvabilityChecker::new(registry, &catalog).run();

    info!(findings = findings.len(), "Resolvability analysis finished");
    Ok(findings)
}

/// Depth-first, memoized walk over the handlers of one registry.
pub struct ResolvabilityChecker<'a, R: ?Sized> {
    registry: &'a R,
    catalog: &'a FactoryCatalog,
    visited: HashSet<HandlerId>,
    findings: Findings,
}

impl<'a, R: HandlerRegistry + ?Sized> ResolvabilityChecker<'a, R> {
    pub fn new(registry: &'a R, catalog: &'a FactoryCatalog) -> Self {
        Self {
            registry,
            catalog,
            visited: HashSet::new(),
            findings: Findings::default(),
        }
    }

    /// Checks every handler and returns the findings.
    pub fn run(mut self) -> Findings {
        for handler in self.registry.all_handlers() {
            self.check(&handler);
        }
        self.findings
    }

    fn check(&mut self, handler: &Arc<Handler>) {
        if self.registry.state(handler) == HandlerState::Valid || !self.visited.insert(handler.id()) {
            return;
        }
        trace!(component = handler.model().name(), "Checking handler");

        // factories able to produce this handler's component, collected on first need
        let mut candidates: Option<Vec<&'a FactoryMethod>> = None;

        for dependency in handler.model().required_dependencies() {
            if let Some(dependency_handler) = self.registry.handler_for(dependency.target()) {
                self.check(&dependency_handler);
                continue;
            }

            let candidates = candidates.get_or_insert_with(|| self.producing_factories(handler));
            let covered = !candidates.is_empty() && candidates.iter().all(|m| m.accepts(dependency.target()));

            if covered {
                trace!(
                    component = handler.model().name(),
                    dependency = %dependency,
                    "Dependency is supplied by every producing factory"
                );
            } else {
                debug!(
                    component = handler.model().name(),
                    dependency = %dependency,
                    factories = candidates.len(),
                    "Unresolvable dependency"
                );
                self.findings.insert(Finding::new(dependency.clone(), handler.clone()));
            }
        }
    }

    fn producing_factories(&self, handler: &Handler) -> Vec<&'a FactoryMethod> {
        let catalog = self.catalog;
        handler
            .model()
            .services()
            .iter()
            .flat_map(|service| catalog.producing(service))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mizan_container::handler::HandlerId;
    use mizan_container::key::TypeKey;
    use mizan_container::model::{ComponentModel, Dependency};
    use mizan_container::prelude::*;

    struct ServiceWithUnknownArg;
    struct ConsumingService;

    type IntFactory = dyn Fn(i32) -> ServiceWithUnknownArg;
    type BareFactory = dyn Fn() -> ServiceWithUnknownArg;

    fn analyze(builder: ContainerBuilder) -> Findings {
        let container = builder.build().unwrap();
        unresolvable_dependencies(&*container.snapshot()).unwrap()
    }

    fn service_with_unknown_arg() -> ComponentRegistration {
        ComponentRegistration::of::<ServiceWithUnknownArg>().depends_on_named::<i32>("arg")
    }

    // === scenarios ===

    #[test]
    fn service_with_unknown_arg_alone_is_invalid() {
        let findings = analyze(Container::builder().with_factory_support().register(service_with_unknown_arg()));

        assert_eq!(findings.len(), 1);
        let finding = findings.iter().next().unwrap();
        assert!(finding.dependency().target().is::<i32>());
        assert_eq!(finding.dependency().key(), Some("arg"));
        assert!(finding.handler().supports_type::<ServiceWithUnknownArg>());
    }

    #[test]
    fn explicit_factory_supplying_arg_makes_service_valid() {
        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .register(service_with_unknown_arg())
                .register(ComponentRegistration::delegate_factory::<IntFactory>()),
        );

        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn implicit_factory_supplying_arg_makes_both_valid() {
        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .register(service_with_unknown_arg())
                .register(ComponentRegistration::of::<ConsumingService>().depends_on_factory::<IntFactory>()),
        );

        assert!(findings.has_valid_component::<ServiceWithUnknownArg>());
        assert!(findings.has_valid_component::<ConsumingService>());
        assert!(findings.is_empty());
    }

    #[test]
    fn explicit_factory_consumed_by_service_makes_both_valid() {
        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .register(service_with_unknown_arg())
                .register(ComponentRegistration::of::<ConsumingService>().depends_on_factory::<IntFactory>())
                .register(ComponentRegistration::delegate_factory::<IntFactory>()),
        );

        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn implicit_factory_missing_arg_makes_both_invalid() {
        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .register(service_with_unknown_arg())
                .register(ComponentRegistration::of::<ConsumingService>().depends_on_factory::<BareFactory>()),
        );

        assert!(findings.has_invalid_component::<ServiceWithUnknownArg>());
        assert!(findings.has_invalid_component::<ConsumingService>());

        let consumer = findings.for_component::<ConsumingService>();
        assert_eq!(consumer.len(), 1);
        assert!(consumer[0].dependency().target().is::<BareFactory>());
    }

    #[test]
    fn improper_factory_next_to_explicit_one_invalidates_only_consumer() {
        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .register(service_with_unknown_arg())
                .register(ComponentRegistration::of::<ConsumingService>().depends_on_factory::<BareFactory>())
                .register(ComponentRegistration::delegate_factory::<IntFactory>()),
        );

        assert!(findings.has_valid_component::<ServiceWithUnknownArg>());
        assert!(findings.has_invalid_component::<ConsumingService>());
    }

    #[test]
    fn nested_factory_supplying_arg_makes_chain_valid() {
        struct Outer;
        type Inner = dyn Fn(i32) -> ServiceWithUnknownArg;
        type Middle = dyn Fn() -> Box<Inner>;

        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .with_delegate::<Box<Inner>>()
                .register(service_with_unknown_arg())
                .register(ComponentRegistration::of::<Outer>().depends_on_factory::<Middle>()),
        );

        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn nested_factory_missing_arg_invalidates_chain() {
        struct Outer;
        type Inner = dyn Fn() -> ServiceWithUnknownArg;
        type Middle = dyn Fn() -> Box<Inner>;

        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .with_delegate::<Box<Inner>>()
                .register(service_with_unknown_arg())
                .register(ComponentRegistration::of::<Outer>().depends_on_factory::<Middle>()),
        );

        assert!(findings.has_invalid_component::<ServiceWithUnknownArg>());
        assert!(findings.has_invalid_component::<Outer>());
        let outer = findings.for_component::<Outer>();
        assert_eq!(outer.len(), 1);
        assert!(outer[0].dependency().target().is::<Middle>());
    }

    // === coverage rule ===

    #[test]
    fn one_factory_without_the_arg_is_enough_to_fail() {
        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .register(service_with_unknown_arg())
                .register(ComponentRegistration::delegate_factory::<IntFactory>())
                .register(ComponentRegistration::delegate_factory::<BareFactory>()),
        );

        assert!(findings.has_invalid_component::<ServiceWithUnknownArg>());
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn identical_unkeyed_dependencies_are_one_finding() {
        let findings = analyze(
            Container::builder().with_factory_support().register(
                ComponentRegistration::of::<ServiceWithUnknownArg>()
                    .depends_on::<i32>()
                    .depends_on::<i32>()
                    .depends_on_named::<i32>("other"),
            ),
        );

        // the keyed one stays distinct
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn factory_interface_supplying_arg_covers_dependency() {
        trait ServiceFactory {}

        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .register(service_with_unknown_arg())
                .register(ComponentRegistration::factory(
                    FactoryInterface::of::<dyn ServiceFactory>()
                        .resolve::<ServiceWithUnknownArg>("create", &[TypeKey::of::<i32>()])
                        .other::<()>("release", &[TypeKey::of::<ServiceWithUnknownArg>()]),
                )),
        );

        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn each_missing_dependency_is_judged_separately() {
        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .register(
                    ComponentRegistration::of::<ServiceWithUnknownArg>()
                        .depends_on::<i32>()
                        .depends_on::<String>(),
                )
                .register(ComponentRegistration::delegate_factory::<IntFactory>()),
        );

        assert_eq!(findings.len(), 1);
        assert!(findings.iter().all(|f| f.dependency().target().is::<String>()));
    }

    #[test]
    fn factories_are_matched_against_every_service_type() {
        trait Primary {}
        trait Secondary {}
        trait PrimaryFactory {}
        trait SecondaryFactory {}
        struct Impl;

        let registration = ComponentRegistration::of::<Impl>()
            .service::<dyn Primary>()
            .service::<dyn Secondary>()
            .depends_on::<i32>();

        let covered = analyze(
            Container::builder()
                .with_factory_support()
                .register(registration)
                .register(ComponentRegistration::factory(
                    FactoryInterface::of::<dyn PrimaryFactory>()
                        .resolve::<dyn Primary>("create", &[TypeKey::of::<i32>()]),
                )),
        );
        assert!(covered.is_empty(), "{covered:?}");

        let registration = ComponentRegistration::of::<Impl>()
            .service::<dyn Primary>()
            .service::<dyn Secondary>()
            .depends_on::<i32>();

        // a factory for the other service type that lacks the argument spoils it
        let spoiled = analyze(
            Container::builder()
                .with_factory_support()
                .register(registration)
                .register(ComponentRegistration::factory(
                    FactoryInterface::of::<dyn PrimaryFactory>()
                        .resolve::<dyn Primary>("create", &[TypeKey::of::<i32>()]),
                ))
                .register(ComponentRegistration::factory(
                    FactoryInterface::of::<dyn SecondaryFactory>().resolve::<dyn Secondary>("create", &[]),
                )),
        );
        assert!(spoiled.has_invalid_component::<dyn Primary>());
    }

    // === graph shapes ===

    #[test]
    fn failures_are_attributed_to_innermost_consumer() {
        struct Outer;

        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .register(service_with_unknown_arg())
                .register(ComponentRegistration::of::<Outer>().depends_on::<ServiceWithUnknownArg>()),
        );

        assert!(findings.has_invalid_component::<ServiceWithUnknownArg>());
        assert!(findings.has_valid_component::<Outer>());
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn valid_graph_has_no_findings() {
        struct Database;
        struct Repo;
        struct Api;

        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .register(ComponentRegistration::of::<Database>())
                .register(ComponentRegistration::of::<Repo>().depends_on::<Database>())
                .register(ComponentRegistration::of::<Api>().depends_on::<Repo>().depends_on::<Database>()),
        );

        assert!(findings.is_empty());
    }

    #[test]
    fn cycles_terminate_and_report_only_real_gaps() {
        struct A;
        struct B;

        let findings = analyze(
            Container::builder()
                .with_factory_support()
                .register(ComponentRegistration::of::<A>().depends_on::<B>())
                .register(ComponentRegistration::of::<B>().depends_on::<A>().depends_on::<u16>()),
        );

        assert_eq!(findings.len(), 1);
        assert!(findings.has_invalid_component::<B>());
        assert!(findings.iter().all(|f| f.dependency().target().is::<u16>()));
    }

    #[test]
    fn optional_and_defaulted_dependencies_are_ignored() {
        let findings = analyze(
            Container::builder().with_factory_support().register(
                ComponentRegistration::of::<ServiceWithUnknownArg>()
                    .optional::<i32>()
                    .defaulted::<String>(),
            ),
        );

        assert!(findings.is_empty());
    }

    #[test]
    fn later_registration_changes_the_next_analysis() {
        let container = Container::builder()
            .with_factory_support()
            .register(service_with_unknown_arg())
            .build()
            .unwrap();

        let before = unresolvable_dependencies(&*container.snapshot()).unwrap();
        container
            .register(ComponentRegistration::delegate_factory::<IntFactory>())
            .unwrap();
        let after = unresolvable_dependencies(&*container.snapshot()).unwrap();

        assert_eq!(before.len(), 1);
        assert!(after.is_empty());
    }

    #[test]
    fn refuses_registry_without_factory_support() {
        let container = Container::builder().register(service_with_unknown_arg()).build().unwrap();

        let err = unresolvable_dependencies(&*container.snapshot()).unwrap_err();
        assert!(matches!(err, MizanError::FactorySupportRequired));
    }

    // === checker in isolation, over a registry that marks nothing valid ===

    struct WaitingRegistry {
        handlers: Vec<Arc<Handler>>,
    }

    impl WaitingRegistry {
        fn new(models: Vec<ComponentModel>) -> Self {
            let handlers = models
                .into_iter()
                .enumerate()
                .map(|(i, m)| Arc::new(Handler::new(HandlerId(i), Arc::new(m), HandlerState::Waiting)))
                .collect();
            Self { handlers }
        }
    }

    impl HandlerRegistry for WaitingRegistry {
        fn all_handlers(&self) -> Vec<Arc<Handler>> {
            self.handlers.clone()
        }

        fn handlers_for(&self, ty: &TypeKey) -> Vec<Arc<Handler>> {
            self.handlers.iter().filter(|h| h.supports(ty)).cloned().collect()
        }

        fn synthesize(&self, _key: Option<&str>, _ty: &TypeKey) -> Option<Arc<ComponentModel>> {
            None
        }

        fn supports_factories(&self) -> bool {
            true
        }
    }

    fn component<T: 'static>(dependencies: Vec<Dependency>) -> ComponentModel {
        ComponentModel::new(std::any::type_name::<T>(), TypeKey::of::<T>()).with_dependencies(dependencies)
    }

    #[test]
    fn zero_dependency_components_never_produce_findings() {
        let registry = WaitingRegistry::new(vec![component::<ServiceWithUnknownArg>(vec![])]);
        assert!(unresolvable_dependencies(&registry).unwrap().is_empty());
    }

    #[test]
    fn optional_dependencies_are_ignored_even_when_handler_is_waiting() {
        let registry = WaitingRegistry::new(vec![component::<ServiceWithUnknownArg>(vec![
            Dependency::on::<i32>().optional(),
            Dependency::on::<String>().with_default(),
        ])]);
        assert!(unresolvable_dependencies(&registry).unwrap().is_empty());
    }

    #[test]
    fn only_the_primary_handler_is_followed() {
        struct Store;

        let registry = WaitingRegistry::new(vec![
            component::<ConsumingService>(vec![Dependency::on::<Store>()]),
            ComponentModel::new("primary", TypeKey::of::<Store>()),
            ComponentModel::new("replica", TypeKey::of::<Store>()).with_dependencies(vec![Dependency::on::<u8>()]),
        ]);

        // the replica is still checked as a top-level handler
        let findings = unresolvable_dependencies(&registry).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings.iter().next().unwrap().handler().model().name(), "replica");
    }

    #[test]
    fn valid_handlers_are_trusted() {
        let handler = Arc::new(Handler::new(
            HandlerId(0),
            Arc::new(component::<ServiceWithUnknownArg>(vec![Dependency::on::<i32>()])),
            HandlerState::Valid,
        ));
        let registry = WaitingRegistry { handlers: vec![handler] };
        assert!(unresolvable_dependencies(&registry).unwrap().is_empty());
    }
}
