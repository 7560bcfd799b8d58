mod error;
mod outcome;
mod work_item;

pub use error::ErrorKind;
pub use outcome::{Outcome, Status};
pub use work_item::WorkItem;

/// The volley `Result` type
pub type Result<T> = std::result::Result<T, ErrorKind>;
