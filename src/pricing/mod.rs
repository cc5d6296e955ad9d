pub mod error;
pub mod handlers;
pub mod models;
pub mod price_calculator;

pub use error::*;
pub use handlers::*;
pub use models::*;
pub use price_calculator::*;
