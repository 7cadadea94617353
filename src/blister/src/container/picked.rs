use std::sync::Arc;

use indexmap::IndexMap;

use crate::container::{self, ContainerError, Managed, Object};

/// A batch of resolved dependencies keyed by identifier, in the order they
/// were requested.
#[derive(Clone, Default)]
pub struct Picked {
    objects: IndexMap<String, Object>,
}

impl Picked {
    pub(super) fn new(objects: IndexMap<String, Object>) -> Self {
        Self { objects }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn object(&self, id: &str) -> Option<&Object> {
        self.objects.get(id)
    }

    /// Returns the picked object `id` as a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnregisteredDependency`] if `id` wasn't
    /// picked and [`ContainerError::TypeMismatch`] if it isn't a `T`.
    pub fn get_shared<T>(&self, id: &str) -> Result<Arc<T>, ContainerError>
    where
        T: Managed,
    {
        match self.objects.get(id) {
            Some(obj) => container::downcast_object(id, Arc::clone(obj)),
            None => Err(ContainerError::UnregisteredDependency { id: id.to_owned() }),
        }
    }

    /// Returns a clone of the picked object `id` as a `T`.
    ///
    /// # Errors
    ///
    /// See [`Picked::get_shared`].
    pub fn get<T>(&self, id: &str) -> Result<T, ContainerError>
    where
        T: Managed + Clone,
    {
        self.get_shared::<T>(id).map(|obj| T::clone(&obj))
    }
}
