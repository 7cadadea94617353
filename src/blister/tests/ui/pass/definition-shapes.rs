use std::convert::Infallible;
use std::io;

use blister::prelude::*;

fn from_fn_item(
    _: Original<'_>,
    container: &Container,
) -> Result<Result<u16, io::Error>, ContainerError> {
    let port: u16 = container.get("port")?;
    Ok(Ok(port))
}

fn main() -> Result<(), ContainerError> {
    let container = Container::new();

    container
        .factory("infallible", |_, _| Ok(Ok::<_, Infallible>(1)))?
        .factory("io", |_, _| Ok(Err::<(), _>(io::Error::other("boom"))))?
        .factory("boxed", |_, _| Ok(Err::<(), _>(String::from("boom"))))?
        .singleton("fn-item", from_fn_item)?
        .service("service", |original, container| {
            let _: Option<u8> = original.get()?;
            let _: Vec<String> = container.keys();
            Ok(Ok::<_, Infallible>(()))
        })?
        .extend("infallible", |original, _| {
            let previous: i32 = original.get()?.unwrap_or_default();
            Ok(Ok::<_, Infallible>(previous + 1))
        })?;

    let captured = String::from("captured");
    container.singleton("captured", move |_, _| Ok(Ok::<_, Infallible>(captured.clone())))?;

    container.set(
        "set",
        Definition::function(|_, _| Ok(Ok::<_, Infallible>("set"))),
        None,
    )?;

    Ok(())
}
