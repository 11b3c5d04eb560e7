pub mod error;
pub mod paths;
pub mod schema;
pub mod store;

pub use error::{Result, StoreError};
pub use paths::{DATA_DIR_ENV, DB_FILE, open_data_dir, resolve_base_dir};
pub use store::{NotificationEntry, Store};
