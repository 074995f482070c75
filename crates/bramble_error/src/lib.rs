//! Error type and helpers shared across the workspace.
//!
//! All fallible paths return [`Result`] and propagate with `?`. Panics are
//! reserved for internal invariant violations.

use std::error::Error;
use std::fmt;

pub type Result<T, E = BrambleError> = std::result::Result<T, E>;

/// The workspace error type.
///
/// Boxed internally to keep `Result` small on the happy path.
pub struct BrambleError {
    inner: Box<ErrorInner>,
}

struct ErrorInner {
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
    /// Extra key/value context attached at the error site.
    fields: Vec<(&'static str, String)>,
}

impl BrambleError {
    pub fn new(message: impl Into<String>) -> Self {
        BrambleError {
            inner: Box::new(ErrorInner {
                message: message.into(),
                source: None,
                fields: Vec::new(),
            }),
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: Box<dyn Error + Send + Sync>,
    ) -> Self {
        BrambleError {
            inner: Box::new(ErrorInner {
                message: message.into(),
                source: Some(source),
                fields: Vec::new(),
            }),
        }
    }

    /// Attach a labeled value to the error for diagnostics.
    pub fn with_field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.inner.fields.push((key, value.to_string()));
        self
    }

    pub fn message(&self) -> &str {
        &self.inner.message
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.inner
            .fields
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
    }
}

impl fmt::Display for BrambleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.message)?;
        for (key, value) in &self.inner.fields {
            write!(f, ", {key}: {value}")?;
        }
        if let Some(source) = &self.inner.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BrambleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Error for BrambleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<fmt::Error> for BrambleError {
    fn from(err: fmt::Error) -> Self {
        BrambleError::with_source("Format error", Box::new(err))
    }
}

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn context(self, msg: &'static str) -> Result<T>;
    fn context_fn<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| BrambleError::with_source(msg, Box::new(e)))
    }

    fn context_fn<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| BrambleError::with_source(f(), Box::new(e)))
    }
}

/// Extension trait for turning `None` into a descriptive error.
pub trait OptionExt<T> {
    fn required(self, what: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, what: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(BrambleError::new(format!("Missing required value: {what}"))),
        }
    }
}

/// Return early with a "not implemented" error.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        return Err($crate::BrambleError::new(format!("Not implemented: {msg}")));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_fields_and_source() {
        let err = BrambleError::with_source(
            "outer",
            Box::new(BrambleError::new("inner")),
        )
        .with_field("position", 2);

        assert_eq!("outer, position: 2: inner", err.to_string());
    }

    #[test]
    fn option_required() {
        let v: Option<i32> = None;
        let err = v.required("thing").unwrap_err();
        assert!(err.to_string().contains("thing"));
    }
}
