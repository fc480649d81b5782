//! Host-side handler state computation.
//!
//! This is the container's own, factory-unaware idea of validity. The
//! resolvability analysis treats the result as opaque: it only skips
//! handlers that come out [`HandlerState::Valid`].
//!
//! # Algorithm
//! Greatest fixed point. Every handler starts out valid (factories without
//! factory support start out invalid) and is demoted to waiting while some
//! required dependency is neither a valid registered handler nor an
//! implicitly synthesizable delegate factory. Cycles whose members are all
//! registered therefore stay valid.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::factory::FactoryMethod;
use crate::handler::HandlerState;
use crate::key::TypeKey;
use crate::model::ComponentModel;

/// Read-only view of a registry's structure.
#[derive(Clone, Copy)]
pub(crate) struct Topology<'a> {
    pub models: &'a [Arc<ComponentModel>],
    pub by_service: &'a HashMap<TypeKey, Vec<usize>>,
    pub delegates: &'a HashMap<TypeKey, FactoryMethod>,
    pub factory_support: bool,
}

/// Answers validity questions against a topology and a state vector.
pub(crate) struct StateSolver<'a> {
    topology: Topology<'a>,
    states: &'a [HandlerState],
}

impl<'a> StateSolver<'a> {
    pub fn new(topology: Topology<'a>, states: &'a [HandlerState]) -> Self {
        Self { topology, states }
    }

    /// Computes the state of every handler in `topology`.
    pub fn solve(topology: Topology<'_>) -> Vec<HandlerState> {
        let mut states: Vec<HandlerState> = topology
            .models
            .iter()
            .map(|model| {
                if model.factory_map().is_some() && !topology.factory_support {
                    HandlerState::Invalid
                } else {
                    HandlerState::Valid
                }
            })
            .collect();

        let mut rounds = 0usize;
        loop {
            rounds += 1;
            let demoted: Vec<usize> = {
                let solver = StateSolver::new(topology, &states);
                (0..states.len())
                    .filter(|&i| {
                        states[i] == HandlerState::Valid
                            && !solver.satisfied(&topology.models[i], &[], &mut HashSet::new())
                    })
                    .collect()
            };

            if demoted.is_empty() {
                break;
            }

            for i in demoted {
                trace!(component = topology.models[i].name(), "Handler is waiting for dependencies");
                states[i] = HandlerState::Waiting;
            }
        }

        debug!(
            handlers = states.len(),
            waiting = states.iter().filter(|s| **s == HandlerState::Waiting).count(),
            rounds,
            "Handler states computed"
        );
        states
    }

    /// Returns `true` if an unregistered delegate factory for `ty` can be built.
    pub fn can_synthesize(&self, ty: &TypeKey) -> bool {
        self.synthesizable(ty, &mut HashSet::new())
    }

    /// Every required dependency is supplied by the caller or otherwise available.
    fn satisfied(
        &self,
        model: &ComponentModel,
        supplied: &[TypeKey],
        guard: &mut HashSet<TypeKey>,
    ) -> bool {
        model
            .required_dependencies()
            .all(|dep| supplied.contains(dep.target()) || self.available(dep.target(), guard))
    }

    fn available(&self, ty: &TypeKey, guard: &mut HashSet<TypeKey>) -> bool {
        self.registered_valid(ty) || self.synthesizable(ty, guard)
    }

    fn registered_valid(&self, ty: &TypeKey) -> bool {
        self.topology
            .by_service
            .get(ty)
            .is_some_and(|ids| ids.iter().any(|&i| self.states[i] == HandlerState::Valid))
    }

    // A delegate is only synthesized when its product can be built from the
    // delegate's own parameters plus whatever the registry already offers.
    fn synthesizable(&self, ty: &TypeKey, guard: &mut HashSet<TypeKey>) -> bool {
        if !self.topology.factory_support || self.topology.by_service.contains_key(ty) {
            return false;
        }
        let Some(invoke) = self.topology.delegates.get(ty) else {
            return false;
        };
        if !guard.insert(*ty) {
            return true;
        }

        let buildable = self.producible(&invoke.returns(), invoke.parameters(), guard);
        guard.remove(ty);
        buildable
    }

    fn producible(&self, product: &TypeKey, supplied: &[TypeKey], guard: &mut HashSet<TypeKey>) -> bool {
        match self.topology.by_service.get(product) {
            Some(ids) => ids.iter().any(|&i| {
                self.states[i] != HandlerState::Invalid
                    && self.satisfied(&self.topology.models[i], supplied, guard)
            }),
            None => self.synthesizable(product, guard),
        }
    }
}
