use std::convert::Infallible;
use std::env;
use std::error::Error;
use std::sync::Arc;

use blister::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // A value logger would store the function itself, so only the kinds
    // which run it are accepted.
    let logger_kind = match env::var("GREETER_LOGGER_KIND") {
        Ok(name) => match name.parse::<Kind>()? {
            Kind::Value => return Err(format!("the logger can't be a {}", Kind::Value).into()),
            kind => kind,
        },
        Err(_) => Kind::Factory,
    };

    let configuration = Configuration::new()
        .with(AppProvider::new("greeter", logger_kind))
        .with(provider::from_fn(|container| {
            container.extend("greeters", |original, c| {
                let mut greeters: Greeters = original.get()?.unwrap_or_default();
                greeters.push(Arc::new(ChineseGreeter {
                    logger: c.get("logger")?,
                }));
                Ok(Ok::<_, Infallible>(greeters))
            })?;
            Ok(())
        }));

    let container = Container::new();
    container.register(configuration)?;

    let app = container.get_shared::<App>("app")?;
    app.run();

    let request = container.with_scope([("app_name", "greeter/request")])?;
    let app = request.get_shared::<App>("app")?;
    app.run();

    Ok(())
}

type Greeters = Vec<Arc<dyn Greeter>>;

struct AppProvider {
    app_name: &'static str,
    logger_kind: Kind,
}

impl AppProvider {
    fn new(app_name: &'static str, logger_kind: Kind) -> Self {
        Self {
            app_name,
            logger_kind,
        }
    }
}

impl ServiceProvider for AppProvider {
    fn register(&self, container: &Container) -> Result<(), ContainerError> {
        container
            .value("app_name", self.app_name)?
            // As a factory, the logger is resolved against the requesting
            // scope, so every scope logs under its own name.
            .set(
                "logger",
                Definition::function(|_, c| {
                    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger {
                        app_name: c.get("app_name")?,
                    });
                    Ok(Ok::<_, Infallible>(logger))
                }),
                Some(self.logger_kind),
            )?
            .singleton("greeters", |_, c| {
                let greeters: Greeters = vec![Arc::new(EnglishGreeter {
                    logger: c.get("logger")?,
                })];
                Ok(Ok::<_, Infallible>(greeters))
            })?
            .factory("app", |_, c| {
                Ok(Ok::<_, Infallible>(App {
                    logger: c.get("logger")?,
                    greeters: c.get("greeters")?,
                }))
            })?;
        Ok(())
    }
}

trait Logger: Send + Sync + 'static {
    fn log(&self, message: &str);
}

struct ConsoleLogger {
    app_name: &'static str,
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        eprintln!("[{}] {}", self.app_name, message);
    }
}

trait Greeter: Send + Sync + 'static {
    fn greet(&self);
}

struct EnglishGreeter {
    logger: Arc<dyn Logger>,
}

impl Greeter for EnglishGreeter {
    fn greet(&self) {
        self.logger.log("Hello World!");
    }
}

struct ChineseGreeter {
    logger: Arc<dyn Logger>,
}

impl Greeter for ChineseGreeter {
    fn greet(&self) {
        self.logger.log("你好世界!");
    }
}

struct App {
    logger: Arc<dyn Logger>,
    greeters: Greeters,
}

impl App {
    fn run(&self) {
        self.logger.log("Greeting from blister managed objects:");
        for greeter in &self.greeters {
            greeter.greet();
        }
    }
}
