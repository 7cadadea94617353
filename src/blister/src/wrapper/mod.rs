mod factory;
mod original;
mod singleton;
mod value;

use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::{Container, ContainerError, Managed, Object};
use crate::kind::Kind;
use crate::util::any::AsAny;

pub use original::Original;

pub(crate) use factory::FactoryResolver;
pub(crate) use singleton::SingletonResolver;
pub(crate) use value::ValueResolver;

/// A type-erased dependency definition.
///
/// A definition is called with the [`Original`] handle of the dependency it
/// extends (absent when it extends nothing) and the container the request
/// is resolved against.
pub type DefinitionFn =
    Arc<dyn Fn(Original<'_>, &Container) -> Result<Object, ContainerError> + Send + Sync>;

/// The stored producer of a dependency.
///
/// A [`Resolver`] is built by the [`WrapperFactory`] and yields the current
/// object of the dependency each time it's invoked. `context` is the
/// container on which the request was originally made.
pub(crate) trait Resolver: Send + Sync + 'static {
    fn kind(&self) -> Kind;

    fn resolve(&self, id: &str, context: &Container) -> Result<Object, ContainerError>;
}

/// The previous resolver of an extended dependency.
#[derive(Clone)]
pub(crate) struct Link {
    resolver: Arc<dyn Resolver>,
}

impl Link {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    pub fn kind(&self) -> Kind {
        self.resolver.kind()
    }

    pub fn resolve(&self, id: &str, context: &Container) -> Result<Object, ContainerError> {
        self.resolver.resolve(id, context)
    }
}

/// What a dependency is registered with: either a ready object or a
/// function producing one.
#[derive(Clone)]
pub enum Definition {
    Value(Object),
    Function(DefinitionFn),
}

impl Definition {
    /// Creates a value definition holding `payload`.
    pub fn value<T>(payload: T) -> Self
    where
        T: Managed,
    {
        Self::Value(Arc::new(payload))
    }

    /// Creates a function definition from a closure.
    ///
    /// The closure receives the [`Original`] handle and the resolving
    /// container. The outer [`Result`] carries failures of the container
    /// itself, such as a missing sub-dependency, so they can be propagated
    /// with `?`. The inner [`Result`] carries the closure's own failure,
    /// which is reported as [`ContainerError::Definition`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use std::convert::Infallible;
    /// # use blister::prelude::*;
    /// let definition = Definition::function(|_, container| {
    ///     let port: u16 = container.get("port")?;
    ///     Ok(Ok::<_, Infallible>(format!("localhost:{port}")))
    /// });
    /// assert!(definition.is_function());
    /// ```
    pub fn function<F, T, E>(definition: F) -> Self
    where
        F: Fn(Original<'_>, &Container) -> Result<Result<T, E>, ContainerError>,
        F: Send + Sync + 'static,
        T: Managed,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        Self::Function(Arc::new(move |original: Original<'_>, container: &Container| {
            match definition(original, container) {
                Ok(Ok(obj)) => Ok(Arc::new(obj) as Object),
                Ok(Err(err)) => {
                    let source: Box<dyn Error + Send + Sync> = err.into();
                    Err(ContainerError::Definition {
                        id: original.id().to_owned(),
                        source: Arc::from(source),
                    })
                }
                Err(err) => Err(err),
            }
        }))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    /// Returns the kind a definition is registered as when no kind is
    /// given: functions become singletons and everything else a value.
    pub fn default_kind(&self) -> Kind {
        match self {
            Self::Value(_) => Kind::Value,
            Self::Function(_) => Kind::Singleton,
        }
    }
}

impl Debug for Definition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Value(obj) => f
                .debug_tuple("Value")
                .field(&(**obj).type_name())
                .finish(),
            Self::Function(_) => f.debug_tuple("Function").finish_non_exhaustive(),
        }
    }
}

/// Builds resolvers from definitions.
pub(crate) struct WrapperFactory;

impl WrapperFactory {
    /// Wraps `definition` in a resolver of `kind`.
    ///
    /// `owner` is the container the resolver is stored in; singletons
    /// resolve their definition against it. `original` is the resolver the
    /// new one replaces when extending.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::InvalidDefinition`] if a factory or a
    /// singleton is requested for a non-function definition.
    pub fn wrap(
        id: &str,
        kind: Kind,
        definition: Definition,
        owner: &Container,
        original: Option<Link>,
    ) -> Result<Arc<dyn Resolver>, ContainerError> {
        match (kind, definition) {
            (Kind::Value, Definition::Value(obj)) => Ok(Arc::new(ValueResolver::new(obj))),
            (Kind::Value, Definition::Function(function)) => {
                Ok(Arc::new(ValueResolver::new(Arc::new(function))))
            }
            (Kind::Factory, Definition::Function(function)) => {
                Ok(Arc::new(FactoryResolver::new(function, original)))
            }
            (Kind::Singleton, Definition::Function(function)) => Ok(Arc::new(
                SingletonResolver::new(function, owner.downgrade(), original),
            )),
            (kind, Definition::Value(_)) => Err(ContainerError::InvalidDefinition {
                id: id.to_owned(),
                kind,
            }),
        }
    }
}
