pub mod error;
pub mod handlers;
pub mod models;
pub mod service;
pub mod status_machine;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::*;
pub use handlers::*;
pub use models::*;
pub use service::*;
pub use status_machine::*;
