use crate::PathSegment;
use thiserror::Error;

pub type ChangeResult<T> = Result<T, ChangeError>;

#[derive(Error, Debug)]
pub enum ChangeError {
    #[error("Key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("{type_name} has no field {field}")]
    NoSuchField { type_name: &'static str, field: String },

    #[error("{type_name} is not a container")]
    NotAContainer { type_name: &'static str },

    #[error("Unknown change function: {0}")]
    UnknownFunction(String),

    #[error("Change function {function} is not supported on {type_name}")]
    Unsupported {
        function: &'static str,
        type_name: &'static str,
    },

    #[error("Invalid arguments for {function}: {message}")]
    InvalidArguments { function: String, message: String },

    #[error("Cannot cast value: {0}")]
    Cast(#[from] serde_json::Error),

    #[error("Change function {name} failed: {message}")]
    Function { name: String, message: String },
}

impl ChangeError {
    pub fn key_not_found(key: &PathSegment) -> Self {
        Self::KeyNotFound {
            key: key.to_string(),
        }
    }

    pub fn no_such_field(type_name: &'static str, field: &PathSegment) -> Self {
        Self::NoSuchField {
            type_name,
            field: field.to_string(),
        }
    }

    pub fn invalid_arguments(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn function(name: impl Into<String>, message: impl ToString) -> Self {
        Self::Function {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// True for errors raised while walking a change path.
    pub fn is_navigation_error(&self) -> bool {
        matches!(
            self,
            Self::KeyNotFound { .. }
                | Self::IndexOutOfRange { .. }
                | Self::NoSuchField { .. }
                | Self::NotAContainer { .. }
        )
    }
}
