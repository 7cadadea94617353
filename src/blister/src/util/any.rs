use std::any::{self, Any};
use std::sync::Arc;

pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>
    where
        Self: Send + Sync;

    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>
    where
        Self: Send + Sync,
    {
        self
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

pub trait Downcast: Sized {
    type Output<T>;

    fn downcast<T: Any + Send + Sync>(self) -> Result<Self::Output<T>, Self>;
}

impl<S> Downcast for Arc<S>
where
    S: AsAny + Send + Sync + ?Sized,
{
    type Output<T> = Arc<T>;

    fn downcast<T: Any + Send + Sync>(self) -> Result<Self::Output<T>, Self> {
        if (*self).as_any().is::<T>() {
            let res = AsAny::into_any_arc(self)
                .downcast::<T>()
                .unwrap_or_else(|_| std::unreachable!("`self` should be `Arc<T>`"));
            Ok(res)
        } else {
            Err(self)
        }
    }
}
