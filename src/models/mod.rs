pub mod answer;
pub mod enums;
pub mod knowledge;
pub mod response;
pub mod severity;

pub use answer::*;
pub use enums::*;
pub use knowledge::*;
pub use response::*;
pub use severity::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Severity {0} is outside the 1-5 range")]
    SeverityOutOfRange(i64),
}
