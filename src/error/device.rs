//! Error types for the SCPI session with the power supply.

/// A command contained a line terminator, which would split it into two
/// commands on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReservedCharacterError(Box<str>);

impl ReservedCharacterError {
    /// Create a new `ReservedCharacterError` error
    pub(crate) fn new(command: &str) -> Self {
        ReservedCharacterError(command.into())
    }

    /// Get the command that caused the error
    pub fn command(&self) -> &str {
        &self.0
    }

    /// Get the first offending byte
    pub fn reserved(&self) -> u8 {
        self.0
            .bytes()
            .find(|b| matches!(b, b'\r' | b'\n'))
            .unwrap_or(b'\n')
    }
}

impl_error_display! {
    ReservedCharacterError,
    self => "command contains a reserved character ({:#04x}): {:?}", self.reserved(), self.0
}

/// The backend accepted fewer bytes than the command line is long.
///
/// The device may have received a truncated command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShortWriteError {
    written: usize,
    expected: usize,
}

impl ShortWriteError {
    /// Create a new `ShortWriteError` error
    pub(crate) fn new(written: usize, expected: usize) -> Self {
        ShortWriteError { written, expected }
    }

    /// The number of bytes actually written.
    pub fn written(&self) -> usize {
        self.written
    }

    /// The number of bytes that should have been written.
    pub fn expected(&self) -> usize {
        self.expected
    }
}

impl_error_display! {
    ShortWriteError,
    self => "wrote only {} bytes and not {} bytes", self.written, self.expected
}

/// A query did not produce any response data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoAnswerError(Box<str>);

impl NoAnswerError {
    /// Create a new `NoAnswerError` error
    pub(crate) fn new(command: &str) -> Self {
        NoAnswerError(command.into())
    }

    /// Get the query that went unanswered.
    pub fn command(&self) -> &str {
        &self.0
    }
}

impl_error_display! {
    NoAnswerError,
    self => "no answer from the power supply to {:?}", self.0
}

/// The identity string returned by `*IDN?` did not start with the expected prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityMismatchError(Box<(String, String)>);

impl IdentityMismatchError {
    /// Create a new `IdentityMismatchError` error
    pub(crate) fn new<E: Into<String>, R: Into<String>>(expected: E, response: R) -> Self {
        IdentityMismatchError(Box::new((expected.into(), response.into())))
    }

    /// The identity prefix that was expected.
    pub fn expected(&self) -> &str {
        &self.0 .0
    }

    /// The response actually received.
    pub fn response(&self) -> &str {
        &self.0 .1
    }
}

impl_error_display! {
    IdentityMismatchError,
    self => "{} not connected, device identified as {:?}", self.0.0, self.0.1.trim_end()
}

/// A channel-scoped operation was given a channel the device does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidChannelError(i64);

impl InvalidChannelError {
    /// Create a new `InvalidChannelError` error
    pub(crate) fn new<T: Into<i64>>(channel: T) -> Self {
        InvalidChannelError(channel.into())
    }

    /// The rejected channel number.
    pub fn channel(&self) -> i64 {
        self.0
    }
}

impl_error_display! {
    InvalidChannelError,
    self => "invalid channel {}, a specific output channel (1, 2, ...) is required", self.0
}

/// A voltage step direction was not `UP` or `DOWN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvalidDirectionError(Box<str>);

impl InvalidDirectionError {
    /// Create a new `InvalidDirectionError` error
    pub(crate) fn new(value: &str) -> Self {
        InvalidDirectionError(value.into())
    }

    /// Get the rejected value.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl_error_display! {
    InvalidDirectionError,
    self => "invalid direction \"{}\", valid are UP and DOWN", self.0
}

/// A power supply model was unknown, or its identity prefix was empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvalidModelError(Box<str>);

impl InvalidModelError {
    /// Create a new `InvalidModelError` error
    pub(crate) fn new(value: &str) -> Self {
        InvalidModelError(value.into())
    }

    /// Get the rejected value.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl_error_display! {
    InvalidModelError,
    self => "invalid model \"{}\", valid are HMP2020, HMP4040 or a non-empty identity prefix", self.0
}
