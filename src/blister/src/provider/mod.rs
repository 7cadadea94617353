mod configuration;

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::{Container, ContainerError, Object};
use crate::util::any::AsAny;

pub use configuration::Configuration;

/// A collaborator which registers a batch of dependencies into a container.
///
/// Closures of `Fn(&Container) -> Result<(), ContainerError>` are service
/// providers as well. When a closure's argument type can't be inferred at the
/// call site, wrap it with [`from_fn`].
///
/// # Examples
///
/// ```rust
/// # use blister::prelude::*;
/// struct HttpProvider;
///
/// impl ServiceProvider for HttpProvider {
///     fn register(&self, container: &Container) -> Result<(), ContainerError> {
///         container.value("protocol", "http://")?;
///         container.value("host", "example.com")?;
///         Ok(())
///     }
/// }
///
/// let container = Container::new();
/// container.register(HttpProvider).unwrap();
/// assert!(container.has("host").unwrap());
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ServiceProvider: Send + Sync + 'static {
    /// Registers dependencies into `container`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a registration.
    fn register(&self, container: &Container) -> Result<(), ContainerError>;
}

impl<F> ServiceProvider for F
where
    F: Fn(&Container) -> Result<(), ContainerError> + Send + Sync + 'static,
{
    fn register(&self, container: &Container) -> Result<(), ContainerError> {
        self(container)
    }
}

/// A [`ServiceProvider`] backed by a closure.
pub struct FnProvider<F>
where
    F: Fn(&Container) -> Result<(), ContainerError> + Send + Sync + 'static,
{
    register: F,
}

impl<F> Debug for FnProvider<F>
where
    F: Fn(&Container) -> Result<(), ContainerError> + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FnProvider<F>").finish_non_exhaustive()
    }
}

impl<F> ServiceProvider for FnProvider<F>
where
    F: Fn(&Container) -> Result<(), ContainerError> + Send + Sync + 'static,
{
    fn register(&self, container: &Container) -> Result<(), ContainerError> {
        (self.register)(container)
    }
}

/// Creates a [`ServiceProvider`] from a closure.
///
/// # Examples
///
/// ```rust
/// # use blister::prelude::*;
/// let container = Container::new();
/// container
///     .register(provider::from_fn(|container| {
///         container.value("answer", 42)?;
///         Ok(())
///     }))
///     .unwrap();
/// assert_eq!(container.get::<i32>("answer").unwrap(), 42);
/// ```
pub fn from_fn<F>(register: F) -> FnProvider<F>
where
    F: Fn(&Container) -> Result<(), ContainerError> + Send + Sync + 'static,
{
    FnProvider { register }
}

/// A type-erased provider function, recognized by
/// [`Container::register_object`].
pub type ProviderFn = Arc<dyn Fn(&Container) -> Result<(), ContainerError> + Send + Sync>;

/// A type-erased provider object, recognized by
/// [`Container::register_object`].
pub type SharedProvider = Arc<dyn ServiceProvider>;

/// The shapes a type-erased object can take to act as a provider.
pub(crate) enum ProviderShape<'a> {
    Function(&'a ProviderFn),
    Shared(&'a SharedProvider),
}

impl<'a> ProviderShape<'a> {
    pub fn detect(obj: &'a Object) -> Option<Self> {
        let any = (**obj).as_any();
        if let Some(function) = any.downcast_ref::<ProviderFn>() {
            Some(Self::Function(function))
        } else {
            any.downcast_ref::<SharedProvider>().map(Self::Shared)
        }
    }

    pub fn register(self, container: &Container) -> Result<(), ContainerError> {
        match self {
            Self::Function(function) => function(container),
            Self::Shared(provider) => provider.register(container),
        }
    }
}
