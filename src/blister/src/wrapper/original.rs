use std::sync::Arc;

use crate::container::{self, Container, ContainerError, Managed, Object};
use crate::wrapper::Link;

/// A lazy handle on the previous definition of an extended dependency.
///
/// Nothing is resolved until one of the accessors is called, so an
/// extension decides by itself whether the previous definition runs. Each
/// call resolves the previous definition again under its own caching policy:
/// a previous factory produces a fresh object every time, while a previous
/// value or singleton keeps returning the same one.
///
/// Every accessor returns `Ok(None)` when the dependency extends nothing.
#[derive(Clone, Copy)]
pub struct Original<'a> {
    id: &'a str,
    link: Option<&'a Link>,
    context: &'a Container,
}

impl<'a> Original<'a> {
    pub(crate) fn new(id: &'a str, link: Option<&'a Link>, context: &'a Container) -> Self {
        Self { id, link, context }
    }

    /// Returns the identifier of the dependency being defined.
    pub fn id(&self) -> &'a str {
        self.id
    }

    /// Returns true if there is a previous definition to resolve.
    pub fn is_present(&self) -> bool {
        self.link.is_some()
    }

    /// Resolves the previous definition into a type-erased object.
    ///
    /// # Errors
    ///
    /// Returns any error raised while resolving the previous definition.
    pub fn object(&self) -> Result<Option<Object>, ContainerError> {
        match self.link {
            Some(link) => link.resolve(self.id, self.context).map(Some),
            None => Ok(None),
        }
    }

    /// Resolves the previous definition and downcasts it to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::TypeMismatch`] if the previous object is
    /// not a `T`, or any error raised while resolving it.
    pub fn get_shared<T>(&self) -> Result<Option<Arc<T>>, ContainerError>
    where
        T: Managed,
    {
        self.object()?
            .map(|obj| container::downcast_object(self.id, obj))
            .transpose()
    }

    /// Resolves the previous definition and clones it out as a `T`.
    ///
    /// # Errors
    ///
    /// See [`Original::get_shared`].
    pub fn get<T>(&self) -> Result<Option<T>, ContainerError>
    where
        T: Managed + Clone,
    {
        Ok(self.get_shared::<T>()?.map(|obj| T::clone(&obj)))
    }
}
