//! Handlers: the resolvable units wrapping component models.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::key::TypeKey;
use crate::model::ComponentModel;

/// Validity of a handler as judged by the host container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerState {
    /// Every required dependency is available.
    Valid,
    /// The component can never be built (e.g. a factory without factory support).
    Invalid,
    /// Waiting on at least one dependency.
    Waiting,
}

impl fmt::Display for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerState::Valid => write!(f, "Valid"),
            HandlerState::Invalid => write!(f, "Invalid"),
            HandlerState::Waiting => write!(f, "Waiting"),
        }
    }
}

/// Identity of a handler within one registry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub usize);

/// A registered component together with its host-computed state.
///
/// Equality and hashing go through [`HandlerId`].
pub struct Handler {
    id: HandlerId,
    model: Arc<ComponentModel>,
    state: HandlerState,
}

impl Handler {
    pub fn new(id: HandlerId, model: Arc<ComponentModel>, state: HandlerState) -> Self {
        Self { id, model, state }
    }

    #[inline]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    #[inline]
    pub fn model(&self) -> &Arc<ComponentModel> {
        &self.model
    }

    #[inline]
    pub fn state(&self) -> HandlerState {
        self.state
    }

    /// Returns `true` if the component can be requested as `ty`.
    pub fn supports(&self, ty: &TypeKey) -> bool {
        self.model.supports(ty)
    }

    /// Typed shorthand for [`Handler::supports`].
    pub fn supports_type<T: ?Sized + 'static>(&self) -> bool {
        self.supports(&TypeKey::of::<T>())
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handler {}

impl Hash for Handler {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id.0)
            .field("component", &self.model.name())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mailer;
    trait Notifier {}

    #[test]
    fn supports_follows_model_services() {
        let model = ComponentModel::new("mailer", TypeKey::of::<Mailer>())
            .with_services(vec![TypeKey::of::<dyn Notifier>()]);
        let handler = Handler::new(HandlerId(0), Arc::new(model), HandlerState::Valid);

        assert!(handler.supports_type::<dyn Notifier>());
        assert!(!handler.supports_type::<Mailer>());
    }

    #[test]
    fn identity_is_the_id() {
        let model = Arc::new(ComponentModel::new("mailer", TypeKey::of::<Mailer>()));
        let a = Handler::new(HandlerId(1), model.clone(), HandlerState::Valid);
        let b = Handler::new(HandlerId(1), model.clone(), HandlerState::Waiting);
        let c = Handler::new(HandlerId(2), model, HandlerState::Valid);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
