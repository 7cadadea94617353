#![allow(clippy::new_without_default)]

pub mod container;
pub mod kind;
pub mod provider;
pub mod wrapper;
mod util;

pub mod prelude {
    pub use crate::container::{Container, ContainerError, Managed, Object, Picked};
    pub use crate::kind::Kind;
    pub use crate::provider::{self, Configuration, ServiceProvider};
    pub use crate::wrapper::{Definition, Original};
}
