pub mod format;
pub mod models;
pub mod pii;

pub use format::{format_currency, format_duration};
pub use pii::Masked;
