//! Error types for invalid serial line configuration.

/// A parity setting was not one of `n`/`no`/`none`, `e`/`ev`/`even` or `o`/`odd`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvalidParityError(Box<str>);

impl InvalidParityError {
    /// Create an instance of the error
    pub(crate) fn new(value: &str) -> Self {
        InvalidParityError(value.into())
    }

    /// Get the rejected value.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl_error_display! {
    InvalidParityError,
    self => "invalid parity value \"{}\", accepting case insensitive: n|no|none|e|ev|even|o|odd", self.0
}

/// A stop bits setting was not one of `1`, `1.5` or `2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvalidStopBitsError(Box<str>);

impl InvalidStopBitsError {
    /// Create an instance of the error
    pub(crate) fn new(value: &str) -> Self {
        InvalidStopBitsError(value.into())
    }

    /// Get the rejected value.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl_error_display! {
    InvalidStopBitsError,
    self => "unknown stop bits value \"{}\", valid are \"1\", \"1.5\", \"2\"", self.0
}

/// A data bits setting was outside of 5 to 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidDataBitsError(i64);

impl InvalidDataBitsError {
    /// Create an instance of the error
    pub(crate) fn new<T: Into<i64>>(value: T) -> Self {
        InvalidDataBitsError(value.into())
    }

    /// Get the rejected value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl_error_display! {
    InvalidDataBitsError,
    self => "invalid data bits value {}, valid are 5-9", self.0
}

error_enum! {
    /// The serial line configuration is invalid.
    ///
    /// These errors are raised before any attempt to open the port.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    #[non_exhaustive]
    pub enum ConfigError {
        Parity(InvalidParityError),
        StopBits(InvalidStopBitsError),
        DataBits(InvalidDataBitsError),
    }
}
