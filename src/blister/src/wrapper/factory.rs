use tracing::trace;

use crate::container::{Container, ContainerError, Object};
use crate::kind::Kind;
use crate::wrapper::{DefinitionFn, Link, Original, Resolver};

/// Runs its definition on every request, against the container the request
/// was made on.
pub struct FactoryResolver {
    definition: DefinitionFn,
    original: Option<Link>,
}

impl FactoryResolver {
    pub fn new(definition: DefinitionFn, original: Option<Link>) -> Self {
        Self {
            definition,
            original,
        }
    }
}

impl Resolver for FactoryResolver {
    fn kind(&self) -> Kind {
        Kind::Factory
    }

    fn resolve(&self, id: &str, context: &Container) -> Result<Object, ContainerError> {
        trace!(id, depth = context.depth(), "running factory");
        let original = Original::new(id, self.original.as_ref(), context);
        (self.definition)(original, context)
    }
}
