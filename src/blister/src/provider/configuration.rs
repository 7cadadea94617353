use tracing::debug;

use crate::container::{Container, ContainerError};
use crate::provider::ServiceProvider;

/// An ordered composite of [`ServiceProvider`]s, itself a provider.
///
/// Providers are registered in the order they were added, and registration
/// stops at the first failing provider.
///
/// # Examples
///
/// ```rust
/// # use blister::prelude::*;
/// let config = Configuration::new()
///     .with(provider::from_fn(|c| c.value("host", "localhost").map(|_| ())))
///     .with(provider::from_fn(|c| c.value("port", 8080u16).map(|_| ())));
///
/// let container = Container::new();
/// container.register(config).unwrap();
/// assert_eq!(container.keys(), ["host", "port"]);
/// ```
#[derive(Default)]
pub struct Configuration {
    providers: Vec<Box<dyn ServiceProvider>>,
}

impl Configuration {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with<P: ServiceProvider>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn compose(mut self, mut other: Configuration) -> Self {
        self.providers.append(&mut other.providers);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ServiceProvider for Configuration {
    fn register(&self, container: &Container) -> Result<(), ContainerError> {
        debug!(providers = self.providers.len(), "registering configuration");
        self.providers
            .iter()
            .try_for_each(|provider| provider.register(container))
    }
}
