use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("unknown object class: {0}")]
    UnknownClass(String),

    #[error("name must be between 1 and {max} characters")]
    InvalidName { max: usize },
}
