mod counter;
mod error;
mod http_mapping;
mod traits;

pub use counter::{counter_key, fetch_count};
pub use error::{Result, StoreError, ValidationError};
pub use http_mapping::store_error_to_status_code;
pub use traits::ItemStore;
