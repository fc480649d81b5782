//! Factory metadata.
//!
//! A factory is a component that produces another component on demand.
//! Two shapes are supported:
//!
//! - **delegate factories**: `dyn Fn(A, B) -> R` types. Their only
//!   resolve method is the implicit `invoke`. See [`Delegate`].
//! - **factory interfaces**: traits such as
//!   `trait SessionFactory { fn create(&self, user: UserId) -> Session; fn release(&self, s: Session); }`.
//!   Their methods are described once with [`FactoryInterface`].
//!
//! Either way the result is a [`FactoryMap`] stored in the component's
//! extended properties, tagging every method as [`FactoryMethodKind::Resolve`]
//! or [`FactoryMethodKind::Other`].

use crate::key::TypeKey;

/// Name of the single invocation method of a delegate factory.
pub const INVOKE: &str = "invoke";

/// What kind of type declares a factory method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclaringKind {
    /// A factory trait with any number of named methods.
    Interface,
    /// A `dyn Fn(..) -> R` delegate.
    Delegate,
}

/// Role of a method on a factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactoryMethodKind {
    /// Produces a component.
    Resolve,
    /// Release, dispose or any helper method.
    Other,
}

/// Signature of one method declared on a factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactoryMethod {
    declaring_type: TypeKey,
    declaring_kind: DeclaringKind,
    name: &'static str,
    returns: TypeKey,
    parameters: Vec<TypeKey>,
}

impl FactoryMethod {
    /// Describes a method declared on a factory interface.
    pub fn interface(
        declaring_type: TypeKey,
        name: &'static str,
        returns: TypeKey,
        parameters: Vec<TypeKey>,
    ) -> Self {
        Self {
            declaring_type,
            declaring_kind: DeclaringKind::Interface,
            name,
            returns,
            parameters,
        }
    }

    /// Describes a method declared on a delegate type.
    ///
    /// Usually only [`INVOKE`] exists; anything else is treated as a helper
    /// and ignored by the factory catalog.
    pub fn delegate(
        declaring_type: TypeKey,
        name: &'static str,
        returns: TypeKey,
        parameters: Vec<TypeKey>,
    ) -> Self {
        Self {
            declaring_type,
            declaring_kind: DeclaringKind::Delegate,
            name,
            returns,
            parameters,
        }
    }

    #[inline]
    pub fn declaring_type(&self) -> TypeKey {
        self.declaring_type
    }

    #[inline]
    pub fn declaring_kind(&self) -> DeclaringKind {
        self.declaring_kind
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The produced type.
    #[inline]
    pub fn returns(&self) -> TypeKey {
        self.returns
    }

    #[inline]
    pub fn parameters(&self) -> &[TypeKey] {
        &self.parameters
    }

    /// Returns `true` if a caller must pass a value of type `ty` to invoke this method.
    pub fn accepts(&self, ty: &TypeKey) -> bool {
        self.parameters.contains(ty)
    }

    /// Returns `true` for delegate methods other than [`INVOKE`].
    pub fn is_delegate_helper(&self) -> bool {
        self.declaring_kind == DeclaringKind::Delegate && self.name != INVOKE
    }
}

/// Per-component map of factory methods and their kinds.
///
/// Stored in a component's extended properties. Entries keep their
/// declaration order and a method appears at most once.
#[derive(Debug, Clone, Default)]
pub struct FactoryMap {
    entries: Vec<(FactoryMethod, FactoryMethodKind)>,
}

impl FactoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a method. Re-inserting the same method replaces its kind.
    pub fn insert(&mut self, method: FactoryMethod, kind: FactoryMethodKind) {
        match self.entries.iter_mut().find(|(m, _)| *m == method) {
            Some(entry) => entry.1 = kind,
            None => self.entries.push((method, kind)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FactoryMethod, FactoryMethodKind)> {
        self.entries.iter().map(|(m, k)| (m, *k))
    }

    /// Methods tagged [`FactoryMethodKind::Resolve`].
    pub fn resolve_methods(&self) -> impl Iterator<Item = &FactoryMethod> {
        self.entries
            .iter()
            .filter(|(_, kind)| *kind == FactoryMethodKind::Resolve)
            .map(|(m, _)| m)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(FactoryMethod, FactoryMethodKind)> for FactoryMap {
    fn from_iter<I: IntoIterator<Item = (FactoryMethod, FactoryMethodKind)>>(iter: I) -> Self {
        let mut map = FactoryMap::new();
        for (method, kind) in iter {
            map.insert(method, kind);
        }
        map
    }
}

/// A `dyn Fn(..) -> R` type usable as a delegate factory.
///
/// Implemented for closures of up to four arguments, with and without
/// `Send + Sync` bounds, and for `Box`/`Arc` around any delegate.
///
/// # Examples
/// ```
/// use mizan_container::factory::{Delegate, INVOKE};
/// use mizan_container::key::TypeKey;
///
/// struct Session;
///
/// let invoke = <dyn Fn(u64) -> Session>::invoke_method();
/// assert_eq!(invoke.name(), INVOKE);
/// assert_eq!(invoke.returns(), TypeKey::of::<Session>());
/// assert_eq!(invoke.parameters(), &[TypeKey::of::<u64>()]);
/// ```
pub trait Delegate: 'static {
    /// The signature of the delegate's `invoke` method.
    fn invoke_method() -> FactoryMethod;

    /// A factory map holding just the `invoke` method.
    fn factory_map() -> FactoryMap {
        std::iter::once((Self::invoke_method(), FactoryMethodKind::Resolve)).collect()
    }
}

macro_rules! impl_delegate {
    ($($arg:ident),*) => {
        impl<R: 'static, $($arg: 'static),*> Delegate for dyn Fn($($arg),*) -> R {
            fn invoke_method() -> FactoryMethod {
                FactoryMethod::delegate(
                    TypeKey::of::<Self>(),
                    INVOKE,
                    TypeKey::of::<R>(),
                    vec![$(TypeKey::of::<$arg>()),*],
                )
            }
        }

        impl<R: 'static, $($arg: 'static),*> Delegate for dyn Fn($($arg),*) -> R + Send + Sync {
            fn invoke_method() -> FactoryMethod {
                FactoryMethod::delegate(
                    TypeKey::of::<Self>(),
                    INVOKE,
                    TypeKey::of::<R>(),
                    vec![$(TypeKey::of::<$arg>()),*],
                )
            }
        }
    };
}

impl_delegate!();
impl_delegate!(A);
impl_delegate!(A, B);
impl_delegate!(A, B, C);
impl_delegate!(A, B, C, D);

// Boxed and shared delegates: how a factory hands out another factory.
impl<F: ?Sized + Delegate> Delegate for Box<F> {
    fn invoke_method() -> FactoryMethod {
        let inner = F::invoke_method();
        FactoryMethod::delegate(TypeKey::of::<Self>(), INVOKE, inner.returns(), inner.parameters().to_vec())
    }
}

impl<F: ?Sized + Delegate> Delegate for std::sync::Arc<F> {
    fn invoke_method() -> FactoryMethod {
        let inner = F::invoke_method();
        FactoryMethod::delegate(TypeKey::of::<Self>(), INVOKE, inner.returns(), inner.parameters().to_vec())
    }
}

/// Describes a factory trait and its methods.
///
/// # Examples
/// ```
/// use mizan_container::factory::FactoryInterface;
///
/// trait SessionFactory {}
/// struct Session;
///
/// let factory = FactoryInterface::of::<dyn SessionFactory>()
///     .resolve::<Session>("create", &[mizan_container::key::TypeKey::of::<u64>()])
///     .other::<()>("release", &[mizan_container::key::TypeKey::of::<Session>()]);
///
/// assert_eq!(factory.factory_map().resolve_methods().count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct FactoryInterface {
    service: TypeKey,
    methods: FactoryMap,
}

impl FactoryInterface {
    /// Starts describing the factory trait `F` (usually `dyn Trait`).
    pub fn of<F: ?Sized + 'static>() -> Self {
        Self {
            service: TypeKey::of::<F>(),
            methods: FactoryMap::new(),
        }
    }

    /// Adds a method that produces an `R`.
    pub fn resolve<R: ?Sized + 'static>(mut self, name: &'static str, parameters: &[TypeKey]) -> Self {
        let method = FactoryMethod::interface(self.service, name, TypeKey::of::<R>(), parameters.to_vec());
        self.methods.insert(method, FactoryMethodKind::Resolve);
        self
    }

    /// Adds a non-producing method (release, dispose, ...).
    pub fn other<R: ?Sized + 'static>(mut self, name: &'static str, parameters: &[TypeKey]) -> Self {
        let method = FactoryMethod::interface(self.service, name, TypeKey::of::<R>(), parameters.to_vec());
        self.methods.insert(method, FactoryMethodKind::Other);
        self
    }

    /// The factory trait's type.
    pub fn service(&self) -> TypeKey {
        self.service
    }

    pub fn factory_map(&self) -> &FactoryMap {
        &self.methods
    }

    pub(crate) fn into_parts(self) -> (TypeKey, FactoryMap) {
        (self.service, self.methods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;
    trait WidgetFactory {}

    #[test]
    fn delegate_arity_is_captured() {
        let m = <dyn Fn(i32, String) -> Widget>::invoke_method();
        assert_eq!(m.declaring_kind(), DeclaringKind::Delegate);
        assert_eq!(m.declaring_type(), TypeKey::of::<dyn Fn(i32, String) -> Widget>());
        assert_eq!(m.parameters(), &[TypeKey::of::<i32>(), TypeKey::of::<String>()]);
        assert!(m.accepts(&TypeKey::of::<String>()));
        assert!(!m.accepts(&TypeKey::of::<u8>()));
    }

    #[test]
    fn send_sync_delegate_is_its_own_type() {
        let plain = <dyn Fn() -> Widget>::invoke_method();
        let shared = <dyn Fn() -> Widget + Send + Sync>::invoke_method();
        assert_ne!(plain.declaring_type(), shared.declaring_type());
        assert_eq!(plain.returns(), shared.returns());
    }

    #[test]
    fn delegate_factory_map_has_single_resolve_method() {
        let map = <dyn Fn() -> Widget>::factory_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.resolve_methods().count(), 1);
    }

    #[test]
    fn boxed_delegate_keeps_inner_signature() {
        let boxed = <Box<dyn Fn(u8) -> Widget> as Delegate>::invoke_method();
        assert_eq!(boxed.declaring_type(), TypeKey::of::<Box<dyn Fn(u8) -> Widget>>());
        assert_eq!(boxed.returns(), TypeKey::of::<Widget>());
        assert_eq!(boxed.parameters(), &[TypeKey::of::<u8>()]);
    }

    #[test]
    fn delegate_helper_detection() {
        let helper = FactoryMethod::delegate(
            TypeKey::of::<dyn Fn() -> Widget>(),
            "clone_box",
            TypeKey::of::<Widget>(),
            vec![],
        );
        assert!(helper.is_delegate_helper());
        assert!(!<dyn Fn() -> Widget>::invoke_method().is_delegate_helper());
    }

    #[test]
    fn interface_methods_are_tagged() {
        let factory = FactoryInterface::of::<dyn WidgetFactory>()
            .resolve::<Widget>("create", &[TypeKey::of::<u32>()])
            .other::<()>("release", &[TypeKey::of::<Widget>()]);

        let kinds: Vec<_> = factory.factory_map().iter().map(|(m, k)| (m.name(), k)).collect();
        assert_eq!(
            kinds,
            [("create", FactoryMethodKind::Resolve), ("release", FactoryMethodKind::Other)]
        );
        assert!(!factory.factory_map().resolve_methods().any(|m| m.is_delegate_helper()));
    }

    #[test]
    fn reinserting_a_method_keeps_one_entry() {
        let m = <dyn Fn() -> Widget>::invoke_method();
        let mut map = FactoryMap::new();
        map.insert(m.clone(), FactoryMethodKind::Other);
        map.insert(m, FactoryMethodKind::Resolve);
        assert_eq!(map.len(), 1);
        assert_eq!(map.resolve_methods().count(), 1);
    }
}
