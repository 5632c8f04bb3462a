use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

/// Broad classification of an error.
///
/// Callers can match on the kind to decide how to surface a failure. None of
/// these are retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Inputs that cannot be assembled into a valid structure (mismatched
    /// lengths, bitmap/value pairing, duplicate column names).
    Construction,
    /// Index at or past the length of the thing being indexed.
    OutOfBounds,
    /// Operand kinds that don't work together, or a column of the wrong kind.
    Type,
    /// Unknown column name.
    Resolution,
    /// Expression used in a context where it's not valid (aggregate outside
    /// of a group by, missing group key).
    Context,
    /// Memory could not be allocated.
    Allocation,
    /// Invalid argument or setting value.
    InvalidInput,
    /// Everything else.
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construction => write!(f, "Construction"),
            Self::OutOfBounds => write!(f, "OutOfBounds"),
            Self::Type => write!(f, "Type"),
            Self::Resolution => write!(f, "Resolution"),
            Self::Context => write!(f, "Context"),
            Self::Allocation => write!(f, "Allocation"),
            Self::InvalidInput => write!(f, "InvalidInput"),
            Self::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug)]
pub struct DbError {
    inner: Box<DbErrorInner>,
}

#[derive(Debug)]
struct DbErrorInner {
    kind: ErrorKind,
    msg: String,
    source: Option<Box<dyn Error + Send + Sync>>,
    /// Extra diagnostic fields, printed after the message.
    fields: Vec<(Cow<'static, str>, String)>,
    backtrace: Backtrace,
}

impl DbError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::new_with_kind(ErrorKind::Other, msg)
    }

    pub fn new_with_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        DbError {
            inner: Box::new(DbErrorInner {
                kind,
                msg: msg.into(),
                source: None,
                fields: Vec::new(),
                backtrace: Backtrace::capture(),
            }),
        }
    }

    pub fn with_source(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        let mut err = Self::new(msg);
        err.inner.source = Some(source);
        err
    }

    pub fn construction(msg: impl Into<String>) -> Self {
        Self::new_with_kind(ErrorKind::Construction, msg)
    }

    pub fn out_of_bounds(idx: usize, len: usize) -> Self {
        Self::new_with_kind(ErrorKind::OutOfBounds, "Index out of bounds")
            .with_field("index", idx)
            .with_field("len", len)
    }

    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::new_with_kind(ErrorKind::Type, msg)
    }

    pub fn resolution(name: impl fmt::Display) -> Self {
        Self::new_with_kind(ErrorKind::Resolution, format!("Missing column '{name}'"))
    }

    pub fn context(msg: impl Into<String>) -> Self {
        Self::new_with_kind(ErrorKind::Context, msg)
    }

    pub fn allocation(bytes: usize) -> Self {
        Self::new_with_kind(ErrorKind::Allocation, "Failed to allocate memory")
            .with_field("bytes", bytes)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new_with_kind(ErrorKind::InvalidInput, msg)
    }

    /// Attach a diagnostic field to the error.
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<Cow<'static, str>>,
        V: fmt::Display,
    {
        self.inner.fields.push((key.into(), value.to_string()));
        self
    }

    pub fn with_fields<K, V, I>(mut self, fields: I) -> Self
    where
        K: Into<Cow<'static, str>>,
        V: fmt::Display,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in fields {
            self = self.with_field(key, value);
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    pub fn get_msg(&self) -> &str {
        &self.inner.msg
    }

    /// Get the value of a diagnostic field if it was set.
    pub fn get_field(&self, key: &str) -> Option<&str> {
        self.inner
            .fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.inner.backtrace
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.msg)?;

        for (key, value) in &self.inner.fields {
            write!(f, "\n  {key}: {value}")?;
        }

        if let Some(source) = &self.inner.source {
            write!(f, "\nError source: {source}")?;
        }

        if self.inner.backtrace.status() == BacktraceStatus::Captured {
            write!(f, "\nBacktrace: {}", self.inner.backtrace)?;
        }

        Ok(())
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<fmt::Error> for DbError {
    fn from(value: fmt::Error) -> Self {
        DbError::with_source("Format error", Box::new(value))
    }
}

/// Extension trait for wrapping foreign errors.
pub trait ResultExt<T, E> {
    /// Wrap an error with a static context string.
    fn context(self, msg: &'static str) -> Result<T>;

    /// Wrap an error with a context string produced by a function.
    fn context_fn<F: Fn() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Error + Send + Sync + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn context(self, msg: &'static str) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(DbError::with_source(msg, Box::new(e))),
        }
    }

    fn context_fn<F: Fn() -> String>(self, f: F) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(DbError::with_source(f(), Box::new(e))),
        }
    }
}

pub trait OptionExt<T> {
    /// Return an error if the option is None.
    fn required(self, msg: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, msg: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(DbError::new(msg)),
        }
    }
}

/// Return a "not implemented" error.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)+) => {{
        let msg = format!($($arg)+);
        return Err($crate::DbError::new(format!("Not yet implemented: {msg}")));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_displayed() {
        let err = DbError::out_of_bounds(5, 3);
        assert_eq!(ErrorKind::OutOfBounds, err.kind());
        assert_eq!(Some("5"), err.get_field("index"));
        assert_eq!(Some("3"), err.get_field("len"));

        let s = err.to_string();
        assert!(s.contains("index: 5"), "{s}");
    }

    #[test]
    fn context_wraps_source() {
        let res: std::result::Result<i32, _> = "abc".parse::<i32>();
        let err = res.context("failed to parse").unwrap_err();
        assert_eq!("failed to parse", err.get_msg());
        assert!(err.source().is_some());
    }

    #[test]
    fn required_on_none() {
        let v: Option<i32> = None;
        let err = v.required("missing value").unwrap_err();
        assert_eq!(ErrorKind::Other, err.kind());
    }

    #[test]
    fn not_implemented_returns_err() {
        fn f() -> Result<()> {
            not_implemented!("list {}", "pivot")
        }
        let err = f().unwrap_err();
        assert!(err.get_msg().contains("list pivot"));
    }
}
