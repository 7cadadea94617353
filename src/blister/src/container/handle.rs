use std::error::Error;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::container::core::ContainerCore;
use crate::container::picked::Picked;
use crate::container::{self, ContainerError, Managed, Object};
use crate::kind::Kind;
use crate::provider::{ProviderShape, ServiceProvider};
use crate::util::any::AsAny;
use crate::wrapper::{Definition, Link, Original, WrapperFactory};

/// A string-keyed dependency container.
///
/// A [`Container`] is a cheap handle around shared state: clones refer to
/// the same registrations, and it can be sent across threads.
///
/// Containers form a tree through [`Container::create_scope`]. A scope sees
/// every entry of its ancestors, including ones registered after the scope
/// was created, unless it registers an entry under the same identifier.
///
/// # Examples
///
/// ```rust
/// # use std::convert::Infallible;
/// # use blister::prelude::*;
/// let container = Container::new();
/// container
///     .value("host", String::from("example.com"))?
///     .factory("url", |_, c| {
///         let host: String = c.get("host")?;
///         Ok(Ok::<_, Infallible>(format!("https://{host}")))
///     })?;
///
/// let request = container.create_scope();
/// request.value("host", String::from("localhost"))?;
///
/// assert_eq!(container.get::<String>("url")?, "https://example.com");
/// assert_eq!(request.get::<String>("url")?, "https://localhost");
/// # Ok::<_, ContainerError>(())
/// ```
#[derive(Clone)]
pub struct Container {
    core: Arc<ContainerCore>,
}

impl Container {
    /// Creates an empty root container.
    pub fn new() -> Self {
        Self::from_core(Arc::new(ContainerCore::new_root()))
    }

    fn from_core(core: Arc<ContainerCore>) -> Self {
        Self { core }
    }

    /// Creates a child container whose parent is `self`.
    pub fn create_scope(&self) -> Self {
        let core = ContainerCore::new_sub(Arc::clone(&self.core));
        debug!(depth = core.depth(), "created scope");
        Self::from_core(Arc::new(core))
    }

    /// Creates a child container and registers each of `initial_values` in
    /// it as a value.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidIdentifier`] on the first empty
    /// identifier, in which case no scope is returned.
    pub fn with_scope<I, K, T>(&self, initial_values: I) -> Result<Self, ContainerError>
    where
        I: IntoIterator<Item = (K, T)>,
        K: AsRef<str>,
        T: Managed,
    {
        let scope = self.create_scope();
        for (id, payload) in initial_values {
            scope.value(id.as_ref(), payload)?;
        }
        Ok(scope)
    }

    pub fn parent(&self) -> Option<Self> {
        self.core.parent().cloned().map(Self::from_core)
    }

    /// Returns the number of ancestors of `self`.
    pub fn depth(&self) -> usize {
        self.core.depth()
    }

    /// Returns true if both handles refer to the same container.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.core, &other.core)
    }

    pub(crate) fn downgrade(&self) -> WeakContainer {
        WeakContainer {
            core: Arc::downgrade(&self.core),
        }
    }

    /// Returns true if `id` is registered in `self` or any ancestor.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidIdentifier`] if `id` is empty.
    pub fn has(&self, id: &str) -> Result<bool, ContainerError> {
        container::validate_id(id)?;
        Ok(self.core.contains(id))
    }

    /// Returns the identifiers registered in `self` in insertion order,
    /// followed by the inherited ones which `self` doesn't shadow.
    pub fn keys(&self) -> Vec<String> {
        self.core.keys()
    }

    /// Returns the kind of the entry `id` resolves to, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidIdentifier`] if `id` is empty.
    pub fn kind_of(&self, id: &str) -> Result<Option<Kind>, ContainerError> {
        container::validate_id(id)?;
        Ok(self.core.lookup(id).map(|resolver| resolver.kind()))
    }

    /// Resolves `id` into a type-erased object.
    ///
    /// The entry is looked up in `self` first, then in its ancestors.
    /// Factories run against `self`, so their own lookups see entries that
    /// `self` shadows. Singletons always run against the container they are
    /// stored in.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidIdentifier`] if `id` is empty,
    /// [`ContainerError::UnregisteredDependency`] if `id` isn't registered
    /// anywhere in the chain, or any error raised by the definition.
    pub fn get_object(&self, id: &str) -> Result<Object, ContainerError> {
        container::validate_id(id)?;
        let Some(resolver) = self.core.lookup(id) else {
            return Err(ContainerError::UnregisteredDependency { id: id.to_owned() });
        };
        trace!(id, kind = %resolver.kind(), depth = self.depth(), "resolving dependency");
        resolver.resolve(id, self)
    }

    /// Resolves `id` and downcasts it to a shared `T`.
    ///
    /// A value resolves to the very object it was registered with.
    ///
    /// # Errors
    ///
    /// See [`Container::get_object`]. Additionally returns
    /// [`ContainerError::TypeMismatch`] if the object isn't a `T`.
    pub fn get_shared<T>(&self, id: &str) -> Result<Arc<T>, ContainerError>
    where
        T: Managed,
    {
        container::downcast_object(id, self.get_object(id)?)
    }

    /// Resolves `id` and clones it out as a `T`.
    ///
    /// # Errors
    ///
    /// See [`Container::get_shared`].
    pub fn get<T>(&self, id: &str) -> Result<T, ContainerError>
    where
        T: Managed + Clone,
    {
        self.get_shared::<T>(id).map(|obj| T::clone(&obj))
    }

    /// Registers `payload` as a value.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidIdentifier`] if `id` is empty.
    pub fn value<T>(&self, id: &str, payload: T) -> Result<&Self, ContainerError>
    where
        T: Managed,
    {
        self.set(id, Definition::value(payload), Some(Kind::Value))
    }

    /// Registers an already type-erased object as a value.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidIdentifier`] if `id` is empty.
    pub fn value_object(&self, id: &str, obj: Object) -> Result<&Self, ContainerError> {
        self.set(id, Definition::Value(obj), Some(Kind::Value))
    }

    /// Registers a definition which runs on every request.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidIdentifier`] if `id` is empty.
    pub fn factory<F, T, E>(&self, id: &str, definition: F) -> Result<&Self, ContainerError>
    where
        F: Fn(Original<'_>, &Container) -> Result<Result<T, E>, ContainerError>,
        F: Send + Sync + 'static,
        T: Managed,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        self.set(id, Definition::function(definition), Some(Kind::Factory))
    }

    /// Registers a definition which runs once, on the first successful
    /// request, and whose result is cached.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidIdentifier`] if `id` is empty.
    pub fn singleton<F, T, E>(&self, id: &str, definition: F) -> Result<&Self, ContainerError>
    where
        F: Fn(Original<'_>, &Container) -> Result<Result<T, E>, ContainerError>,
        F: Send + Sync + 'static,
        T: Managed,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        self.set(id, Definition::function(definition), Some(Kind::Singleton))
    }

    /// Same as [`Container::singleton`].
    ///
    /// # Errors
    ///
    /// See [`Container::singleton`].
    pub fn service<F, T, E>(&self, id: &str, definition: F) -> Result<&Self, ContainerError>
    where
        F: Fn(Original<'_>, &Container) -> Result<Result<T, E>, ContainerError>,
        F: Send + Sync + 'static,
        T: Managed,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        self.singleton(id, definition)
    }

    /// Registers `definition` as a dependency of `kind`.
    ///
    /// Without a kind, functions are registered as singletons and anything
    /// else as a value. A function registered as a value is stored as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidIdentifier`] if `id` is empty, or
    /// [`ContainerError::InvalidDefinition`] if a factory or a singleton is
    /// requested for a non-function definition.
    pub fn set(
        &self,
        id: &str,
        definition: Definition,
        kind: Option<Kind>,
    ) -> Result<&Self, ContainerError> {
        container::validate_id(id)?;
        let kind = kind.unwrap_or_else(|| definition.default_kind());
        let resolver = WrapperFactory::wrap(id, kind, definition, self, None)?;
        let previous = self.core.insert(id, resolver);
        debug!(id, %kind, replaced = previous.is_some(), "registered dependency");
        Ok(self)
    }

    /// Replaces the entry `id` with `definition`, which receives the
    /// previous definition's object through its [`Original`] handle.
    ///
    /// The new entry keeps the kind of the previous one, except that an
    /// extended value becomes a singleton. It's always stored in `self`, so
    /// extending an inherited entry shadows it without touching the
    /// ancestor.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidIdentifier`] if `id` is empty, or
    /// [`ContainerError::UnregisteredExtendedDependency`] if `id` isn't
    /// registered anywhere in the chain.
    pub fn extend<F, T, E>(&self, id: &str, definition: F) -> Result<&Self, ContainerError>
    where
        F: Fn(Original<'_>, &Container) -> Result<Result<T, E>, ContainerError>,
        F: Send + Sync + 'static,
        T: Managed,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        self.extend_with(id, Definition::function(definition))
    }

    /// Type-erased variant of [`Container::extend`].
    ///
    /// # Errors
    ///
    /// See [`Container::extend`]. Additionally returns
    /// [`ContainerError::InvalidDefinition`] if `definition` isn't a
    /// function.
    pub fn extend_with(&self, id: &str, definition: Definition) -> Result<&Self, ContainerError> {
        container::validate_id(id)?;
        let Some(existing) = self.core.lookup(id) else {
            return Err(ContainerError::UnregisteredExtendedDependency { id: id.to_owned() });
        };
        let original = Link::new(existing);
        let kind = original.kind().extended();
        if !definition.is_function() {
            return Err(ContainerError::InvalidDefinition {
                id: id.to_owned(),
                kind,
            });
        }

        debug!(id, %kind, extended = %original.kind(), "extending dependency");
        let resolver = WrapperFactory::wrap(id, kind, definition, self, Some(original))?;
        self.core.insert(id, resolver);
        Ok(self)
    }

    /// Lets `provider` register its dependencies into `self`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the provider.
    pub fn register<P>(&self, provider: P) -> Result<&Self, ContainerError>
    where
        P: ServiceProvider,
    {
        debug!(provider = std::any::type_name::<P>(), "registering provider");
        provider.register(self)?;
        Ok(self)
    }

    /// Lets a type-erased provider register its dependencies into `self`.
    ///
    /// `provider` is accepted if it holds a
    /// [`ProviderFn`](crate::provider::ProviderFn) or a
    /// [`SharedProvider`](crate::provider::SharedProvider).
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidProvider`] if `provider` has neither
    /// shape, or the first error raised by the provider.
    pub fn register_object(&self, provider: &Object) -> Result<&Self, ContainerError> {
        let Some(shape) = ProviderShape::detect(provider) else {
            return Err(ContainerError::InvalidProvider {
                type_name: (**provider).type_name(),
            });
        };
        debug!(provider = (**provider).type_name(), "registering provider");
        shape.register(self)?;
        Ok(self)
    }

    /// Resolves each of `ids` and collects the objects by identifier.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while resolving, discarding whatever
    /// was resolved before it.
    pub fn pick<I, K>(&self, ids: I) -> Result<Picked, ContainerError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let objects = ids
            .into_iter()
            .map(|id| {
                let id = id.as_ref();
                self.get_object(id).map(|obj| (id.to_owned(), obj))
            })
            .collect::<Result<IndexMap<_, _>, _>>()?;
        Ok(Picked::new(objects))
    }
}

/// A non-owning reference to a [`Container`].
#[derive(Clone)]
pub(crate) struct WeakContainer {
    core: Weak<ContainerCore>,
}

impl WeakContainer {
    pub fn upgrade(&self) -> Option<Container> {
        self.core.upgrade().map(Container::from_core)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    use crate::provider::{self, MockServiceProvider, ProviderFn, SharedProvider};

    use super::*;

    type Counter = Result<Result<u32, Infallible>, ContainerError>;

    fn counter() -> (
        Arc<AtomicU32>,
        impl Fn(Original<'_>, &Container) -> Counter + Send + Sync + 'static,
    ) {
        let count = Arc::new(AtomicU32::new(0));
        let definition = {
            let count = Arc::clone(&count);
            move |_: Original<'_>, _: &Container| -> Counter {
                Ok(Ok(count.fetch_add(1, Ordering::SeqCst) + 1))
            }
        };
        (count, definition)
    }

    #[test]
    fn container_value_get_succeeds() {
        let container = Container::new();
        container
            .value("string", "foo")
            .unwrap()
            .value("number", 4)
            .unwrap()
            .value("boolean", false)
            .unwrap()
            .value("unit", ())
            .unwrap()
            .value("none", None::<i32>)
            .unwrap();

        assert_eq!(container.get::<&str>("string").unwrap(), "foo");
        assert_eq!(container.get::<i32>("number").unwrap(), 4);
        assert!(!container.get::<bool>("boolean").unwrap());
        container.get::<()>("unit").unwrap();
        assert_eq!(container.get::<Option<i32>>("none").unwrap(), None);
    }

    #[test]
    fn container_value_preserves_identity() {
        let container = Container::new();
        let obj: Object = Arc::new(String::from("shared"));
        container.value_object("object", Arc::clone(&obj)).unwrap();
        let function: ProviderFn = Arc::new(|_: &Container| Ok(()));
        container.value("function", Arc::clone(&function)).unwrap();

        assert!(Arc::ptr_eq(&container.get_object("object").unwrap(), &obj));
        let first = container.get_shared::<String>("object").unwrap();
        let second = container.get_shared::<String>("object").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(
            &container.get::<ProviderFn>("function").unwrap(),
            &function
        ));
    }

    #[test]
    fn container_register_returns_the_container_for_chaining() {
        let container = Container::new();
        let returned = container.value("id", "value").unwrap();
        assert!(Container::ptr_eq(returned, &container));
    }

    #[test]
    fn container_set_overwrites_previous_entries() {
        let container = Container::new();
        let (_, counter) = counter();

        container.value("id", "foo").unwrap();
        container.value("id", 5).unwrap();
        assert_eq!(container.get::<i32>("id").unwrap(), 5);

        container.factory("id", counter).unwrap();
        assert_eq!(container.get::<u32>("id").unwrap(), 1);
        assert_eq!(container.keys(), ["id"]);
    }

    #[test]
    fn container_operations_fail_when_id_is_empty() {
        let container = Container::new();

        assert!(matches!(
            container.value("", 1),
            Err(ContainerError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            container.has(""),
            Err(ContainerError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            container.get::<i32>(""),
            Err(ContainerError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            container.extend("", |_, _| Ok(Ok::<_, Infallible>(1))),
            Err(ContainerError::InvalidIdentifier { .. })
        ));
        assert!(container.keys().is_empty());
    }

    #[test]
    fn container_factory_runs_definition_on_every_request() {
        let container = Container::new();
        let (_, counter) = counter();
        container.factory("factory", counter).unwrap();

        assert_eq!(container.get::<u32>("factory").unwrap(), 1);
        assert_eq!(container.get::<u32>("factory").unwrap(), 2);
        assert_eq!(container.get::<u32>("factory").unwrap(), 3);
    }

    #[test]
    fn container_singleton_runs_definition_once_and_lazily() {
        let container = Container::new();
        let (count, counter) = counter();
        container.singleton("singleton", counter).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(container.get::<u32>("singleton").unwrap(), 1);
        assert_eq!(container.get::<u32>("singleton").unwrap(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn container_definitions_receive_the_container() {
        let container = Container::new();
        let expected = container.clone();
        container
            .singleton("singleton", move |original, c| {
                assert!(!original.is_present());
                Ok(Ok::<_, Infallible>(Container::ptr_eq(c, &expected)))
            })
            .unwrap();

        assert!(container.get::<bool>("singleton").unwrap());
    }

    #[test]
    fn container_set_infers_kind_from_definition() {
        let container = Container::new();
        let (_, counter) = counter();

        container
            .set("singleton", Definition::function(counter), None)
            .unwrap()
            .set("value", Definition::value("foo"), None)
            .unwrap();

        assert_eq!(container.kind_of("singleton").unwrap(), Some(Kind::Singleton));
        assert_eq!(container.get::<u32>("singleton").unwrap(), 1);
        assert_eq!(container.get::<u32>("singleton").unwrap(), 1);
        assert_eq!(container.kind_of("value").unwrap(), Some(Kind::Value));
        assert_eq!(container.kind_of("missing").unwrap(), None);
    }

    #[test]
    fn container_set_fails_when_definition_is_not_a_function() {
        let container = Container::new();

        for kind in [Kind::Factory, Kind::Singleton] {
            assert!(matches!(
                container.set("id", Definition::value("foo"), Some(kind)),
                Err(ContainerError::InvalidDefinition { .. })
            ));
        }
        assert!(!container.has("id").unwrap());
    }

    #[test]
    fn container_get_fails_when_id_is_not_registered() {
        let container = Container::new();

        assert!(!container.has("missing").unwrap());
        assert!(matches!(
            container.get::<i32>("missing"),
            Err(ContainerError::UnregisteredDependency { ref id }) if id == "missing"
        ));
    }

    #[test]
    fn container_get_fails_when_type_differs() {
        let container = Container::new();
        container.value("id", 1u8).unwrap();

        assert!(matches!(
            container.get::<String>("id"),
            Err(ContainerError::TypeMismatch { found: "u8", .. })
        ));
    }

    #[test]
    fn container_extend_keeps_factory_semantics() {
        let container = Container::new();
        let (_, counter) = counter();
        container.factory("id", counter).unwrap();
        container
            .extend("id", |original, _| {
                let previous: u32 = original.get()?.unwrap_or_default();
                Ok(Ok::<_, Infallible>(previous * 10))
            })
            .unwrap();

        assert_eq!(container.kind_of("id").unwrap(), Some(Kind::Factory));
        assert_eq!(container.get::<u32>("id").unwrap(), 10);
        assert_eq!(container.get::<u32>("id").unwrap(), 20);
    }

    #[test]
    fn container_extend_promotes_value_to_singleton() {
        let container = Container::new();
        let count = Arc::new(AtomicU32::new(0));
        container.value("id", String::from("value")).unwrap();
        container
            .extend("id", {
                let count = Arc::clone(&count);
                move |original: Original<'_>, _: &Container| {
                    count.fetch_add(1, Ordering::SeqCst);
                    let previous: String = original.get()?.unwrap_or_default();
                    Ok(Ok::<_, Infallible>(format!("{previous}-extended")))
                }
            })
            .unwrap();

        assert_eq!(container.kind_of("id").unwrap(), Some(Kind::Singleton));
        assert_eq!(container.get::<String>("id").unwrap(), "value-extended");
        assert_eq!(container.get::<String>("id").unwrap(), "value-extended");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn container_extend_chains_definitions() {
        let container = Container::new();
        container
            .factory("id", |_, _| Ok(Ok::<_, Infallible>(1u32)))
            .unwrap();
        for _ in 0..3 {
            container
                .extend("id", |original, _| {
                    let previous: u32 = original.get()?.unwrap_or_default();
                    Ok(Ok::<_, Infallible>(previous * 2))
                })
                .unwrap();
        }

        assert_eq!(container.get::<u32>("id").unwrap(), 8);
    }

    #[test]
    fn container_extend_fails_when_id_is_not_registered() {
        let container = Container::new();

        assert!(matches!(
            container.extend("missing", |_, _| Ok(Ok::<_, Infallible>(1))),
            Err(ContainerError::UnregisteredExtendedDependency { ref id }) if id == "missing"
        ));
        assert!(!container.has("missing").unwrap());
    }

    #[test]
    fn container_extend_with_fails_when_definition_is_not_a_function() {
        let container = Container::new();
        container.value("id", 1).unwrap();

        assert!(matches!(
            container.extend_with("id", Definition::value(2)),
            Err(ContainerError::InvalidDefinition { kind: Kind::Singleton, .. })
        ));
        assert_eq!(container.kind_of("id").unwrap(), Some(Kind::Value));
    }

    #[test]
    fn container_register_invokes_provider_once() {
        let container = Container::new();
        let expected = container.clone();
        let mut provider = MockServiceProvider::new();
        provider
            .expect_register()
            .withf(move |c| Container::ptr_eq(c, &expected))
            .times(1)
            .returning(|_| Ok(()));

        let returned = container.register(provider).unwrap();
        assert!(Container::ptr_eq(returned, &container));
    }

    #[test]
    fn container_register_accepts_closures() {
        let container = Container::new();
        container
            .register(provider::from_fn(|c| {
                c.value("protocol", "http://")?.value("host", "example.com")?;
                Ok(())
            }))
            .unwrap();

        assert_eq!(container.keys(), ["protocol", "host"]);
    }

    #[test]
    fn container_register_object_detects_provider_shape() {
        let container = Container::new();
        let function: ProviderFn = Arc::new(|c: &Container| {
            c.value("from-function", 1)?;
            Ok(())
        });
        let shared: SharedProvider = Arc::new(provider::from_fn(|c| {
            c.value("from-object", 2)?;
            Ok(())
        }));

        container
            .register_object(&(Arc::new(function) as Object))
            .unwrap()
            .register_object(&(Arc::new(shared) as Object))
            .unwrap();

        assert_eq!(container.keys(), ["from-function", "from-object"]);
    }

    #[test]
    fn container_register_object_fails_when_object_is_not_a_provider() {
        let container = Container::new();

        assert!(matches!(
            container.register_object(&(Arc::new(5) as Object)),
            Err(ContainerError::InvalidProvider { type_name: "i32" })
        ));
    }

    #[test]
    fn container_pick_succeeds() {
        let container = Container::new();
        container.value("a", 1).unwrap().value("b", "two").unwrap();

        let picked = container.pick(["b", "a"]).unwrap();
        assert_eq!(picked.keys().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(picked.get::<i32>("a").unwrap(), 1);
        assert_eq!(picked.get::<&str>("b").unwrap(), "two");
    }

    #[test]
    fn container_pick_fails_when_any_id_is_not_registered() {
        let container = Container::new();
        container.value("a", 1).unwrap();

        assert!(matches!(
            container.pick(["a", "missing"]),
            Err(ContainerError::UnregisteredDependency { ref id }) if id == "missing"
        ));
    }

    #[test]
    fn container_is_shared_across_threads() {
        let container = Container::new();
        let (count, counter) = counter();
        container.singleton("singleton", counter).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let container = container.clone();
                thread::spawn(move || container.get::<u32>("singleton").unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("thread should not panic"), 1);
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
