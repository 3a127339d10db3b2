mod converter;
mod executor;
mod metrics;
mod staging;

pub use converter::DwgConverter;
pub use executor::CommandExecutor;
pub use metrics::{get_metrics, init_metrics};
pub use staging::Staging;
