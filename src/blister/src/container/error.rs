use std::error::Error;
use std::sync::Arc;

use snafu::prelude::*;

use crate::kind::Kind;

#[derive(Debug, Clone, Snafu)]
#[non_exhaustive]
pub enum ContainerError {
    #[snafu(display("the dependency identifier should be a non-empty string"))]
    InvalidIdentifier {},
    #[snafu(display("could not define the {kind} dependency {id} without a function"))]
    #[non_exhaustive]
    InvalidDefinition { id: String, kind: Kind },
    #[snafu(display("could not find the dependency {id}"))]
    #[non_exhaustive]
    UnregisteredDependency { id: String },
    #[snafu(display("could not extend the dependency {id} which is not registered"))]
    #[non_exhaustive]
    UnregisteredExtendedDependency { id: String },
    #[snafu(display("could not register {type_name} which is not a service provider"))]
    #[non_exhaustive]
    InvalidProvider { type_name: &'static str },
    #[snafu(display("could not read the dependency {id} of type {found} as {expected}"))]
    #[non_exhaustive]
    TypeMismatch {
        id: String,
        expected: &'static str,
        found: &'static str,
    },
    #[snafu(display("could not construct the singleton {id} which depends on itself somehow"))]
    #[non_exhaustive]
    CyclicDependency { id: String },
    #[snafu(display("could not construct the dependency {id} because its definition panicked"))]
    #[non_exhaustive]
    DefinitionPanicked { id: String },
    #[snafu(display("could not construct the dependency {id}"))]
    #[non_exhaustive]
    Definition {
        id: String,
        source: Arc<dyn Error + Send + Sync>,
    },
}
