pub mod error;
pub mod health;
pub mod subscriptions;

pub use error::AppError;
