pub mod convert;
pub mod health;
pub mod metrics;

pub use convert::convert_drawing;
pub use health::health_check;
pub use metrics::metrics_endpoint;
