use std::sync::Arc;

use crate::container::{Container, ContainerError, Object};
use crate::kind::Kind;
use crate::wrapper::Resolver;

pub struct ValueResolver {
    object: Object,
}

impl ValueResolver {
    pub fn new(object: Object) -> Self {
        Self { object }
    }
}

impl Resolver for ValueResolver {
    fn kind(&self) -> Kind {
        Kind::Value
    }

    fn resolve(&self, _id: &str, _context: &Container) -> Result<Object, ContainerError> {
        Ok(Arc::clone(&self.object))
    }
}
