use std::sync::Arc;

use blister::prelude::*;
use blister::provider::{ProviderFn, SharedProvider};

struct Unit;

impl ServiceProvider for Unit {
    fn register(&self, _: &Container) -> Result<(), ContainerError> {
        Ok(())
    }
}

fn register_fn(container: &Container) -> Result<(), ContainerError> {
    container.value("fn", ())?;
    Ok(())
}

fn main() -> Result<(), ContainerError> {
    let container = Container::new();

    container
        .register(Unit)?
        .register(register_fn)?
        .register(|container: &Container| -> Result<(), ContainerError> {
            container.value("closure", ())?;
            Ok(())
        })?
        .register(provider::from_fn(|container| {
            container.value("from_fn", ())?;
            Ok(())
        }))?
        .register(Configuration::new().with(Unit).compose(Configuration::new()))?;

    let function: ProviderFn = Arc::new(register_fn);
    let shared: SharedProvider = Arc::new(Unit);
    container
        .register_object(&(Arc::new(function) as Object))?
        .register_object(&(Arc::new(shared) as Object))?;

    Ok(())
}
