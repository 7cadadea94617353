mod core;
mod error;
mod handle;
mod picked;

use std::any;
use std::sync::Arc;

use crate::util::any::{AsAny, Downcast};

pub use error::ContainerError;
pub use handle::Container;
pub(crate) use handle::WeakContainer;
pub use picked::Picked;

/// Anything a container can store and hand out.
pub trait Managed: AsAny + Send + Sync + 'static {}

impl<T> Managed for T where T: AsAny + Send + Sync + 'static {}

/// A type-erased, shared object produced by a container.
pub type Object = Arc<dyn Managed>;

pub(crate) fn downcast_object<T>(id: &str, obj: Object) -> Result<Arc<T>, ContainerError>
where
    T: Managed,
{
    obj.downcast::<T>()
        .map_err(|obj| ContainerError::TypeMismatch {
            id: id.to_owned(),
            expected: any::type_name::<T>(),
            found: (*obj).type_name(),
        })
}

pub(crate) fn validate_id(id: &str) -> Result<(), ContainerError> {
    if id.is_empty() {
        Err(ContainerError::InvalidIdentifier {})
    } else {
        Ok(())
    }
}
