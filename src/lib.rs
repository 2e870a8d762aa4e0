pub mod config;
pub mod models;
pub mod processing;
pub mod session;
pub mod utils;
pub mod validation;

pub use config::ScanConfig;
pub use session::{Notification, NotificationLevel, ScanSession};
pub use utils::ScanError;
