pub mod aggregator;
pub mod error;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod status_machine;
pub mod store;

pub use aggregator::*;
pub use error::*;
pub use events::*;
pub use handlers::*;
pub use metrics::*;
pub use models::*;
pub use status_machine::*;
pub use store::*;
