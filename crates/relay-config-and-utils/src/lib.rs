//! Configuration, paths and logging setup for the OMF relay publisher.

mod endpoint;
mod error;
mod logging;
mod paths;
mod settings;

pub use endpoint::{EndpointConfig, RunMode};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
pub use settings::{Settings, DEFAULT_LOG_LEVEL};
