use std::fmt;

use crate::Jsonable;

/// A static type that cannot be classified into any descriptor kind.
///
/// Raised when a descriptor is constructed, before any value is processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported type `{type_name}`: {reason}")]
pub struct UnsupportedTypeError {
    pub type_name: &'static str,
    pub reason: String,
}

impl UnsupportedTypeError {
    pub fn new(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            type_name,
            reason: reason.into(),
        }
    }
}

/// A runtime value the encoder cannot represent as a [`Jsonable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonJsonableValueError {
    pub path: Vec<String>,
    pub type_name: &'static str,
    /// Debug rendering of the offending value.
    pub value: String,
    pub message: String,
}

impl NonJsonableValueError {
    pub fn new(
        type_name: &'static str,
        value: impl fmt::Debug,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: Vec::new(),
            type_name,
            value: format!("{value:?}"),
            message: message.into(),
        }
    }

    /// Prepends a path segment as the error travels out of a container.
    pub fn with_path_prefix(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    pub fn path_string(&self) -> String {
        render_path(&self.path)
    }
}

impl fmt::Display for NonJsonableValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to convert {} of type {} to a jsonable value: {} at {}",
            self.value,
            self.type_name,
            self.message,
            self.path_string()
        )
    }
}

impl std::error::Error for NonJsonableValueError {}

/// A jsonable value whose shape does not fit the target descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    pub path: Vec<String>,
    /// Name of the descriptor kind being decoded.
    pub expected: &'static str,
    /// The offending fragment; `None` when the value was missing altogether.
    pub got: Option<Jsonable>,
    pub message: String,
    pub source: Option<Box<DecodeError>>,
}

impl DecodeError {
    pub fn new(
        path: Vec<String>,
        expected: &'static str,
        got: Option<Jsonable>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path,
            expected,
            got,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: Option<DecodeError>) -> Self {
        self.source = source.map(Box::new);
        self
    }

    pub fn path_string(&self) -> String {
        render_path(&self.path)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (expected {}, got ", self.message, self.expected)?;
        match &self.got {
            Some(value) => write!(f, "{value}")?,
            None => f.write_str("<missing>")?,
        }
        write!(f, ") at {}", self.path_string())
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

/// Any failure surfaced by the public conversion entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    UnsupportedType(#[from] UnsupportedTypeError),

    #[error(transparent)]
    NonJsonableValue(#[from] NonJsonableValueError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),
}

fn render_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(".")
    }
}
