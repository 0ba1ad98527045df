//! Settle delays.
//!
//! The power supply has no reliable "done" signal over the serial link, so the
//! session waits a fixed time after every write before issuing the next one.
//! How long those waits are is described by [`SettleTimes`]; how they are
//! performed is abstracted by the [`Delay`] trait so tests can substitute a
//! fake clock for real sleeps.

use std::time::Duration;

/// Types that can block the session for a period of time.
pub trait Delay {
	/// Wait for `duration` before returning.
	fn delay(&mut self, duration: Duration);
}

impl<D: Delay + ?Sized> Delay for &mut D {
	fn delay(&mut self, duration: Duration) {
		(**self).delay(duration);
	}
}

impl<D: Delay + ?Sized> Delay for Box<D> {
	fn delay(&mut self, duration: Duration) {
		(**self).delay(duration);
	}
}

/// A [`Delay`] that puts the current thread to sleep.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ThreadSleep;

impl Delay for ThreadSleep {
	fn delay(&mut self, duration: Duration) {
		if !duration.is_zero() {
			std::thread::sleep(duration);
		}
	}
}

/// A [`Delay`] that returns immediately.
///
/// Useful for backends that answer synchronously, such as an in-memory mock.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct NoDelay;

impl Delay for NoDelay {
	fn delay(&mut self, _duration: Duration) {}
}

/// How long to wait after writing each kind of command.
///
/// ## Example
///
/// ```
/// # use hmp::delay::SettleTimes;
/// # use std::time::Duration;
/// let mut settle = SettleTimes::default();
/// settle.query(Duration::from_millis(250));
/// assert_eq!(settle.get_command(), Duration::from_millis(100));
/// assert_eq!(settle.get_query(), Duration::from_millis(250));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SettleTimes {
	/// The wait after a command that expects no response.
	command: Duration,
	/// The wait between sending a query and reading its response.
	query: Duration,
	/// The wait between sending the identity query and reading its response.
	identify: Duration,
}

impl SettleTimes {
	/// The default wait after a command: 100 ms.
	pub const DEFAULT_COMMAND: Duration = Duration::from_millis(100);
	/// The default wait before reading a query response: 500 ms.
	pub const DEFAULT_QUERY: Duration = Duration::from_millis(500);
	/// The default wait before reading the identity response: 100 ms.
	pub const DEFAULT_IDENTIFY: Duration = Duration::from_millis(100);

	/// Create the default settle times.
	pub const fn new() -> Self {
		SettleTimes {
			command: SettleTimes::DEFAULT_COMMAND,
			query: SettleTimes::DEFAULT_QUERY,
			identify: SettleTimes::DEFAULT_IDENTIFY,
		}
	}

	/// Settle times of zero, for backends that answer instantly.
	pub const fn zero() -> Self {
		SettleTimes {
			command: Duration::ZERO,
			query: Duration::ZERO,
			identify: Duration::ZERO,
		}
	}

	/// Set the wait after a command.
	pub fn command(&mut self, duration: Duration) -> &mut Self {
		self.command = duration;
		self
	}

	/// Set the wait before reading a query response.
	pub fn query(&mut self, duration: Duration) -> &mut Self {
		self.query = duration;
		self
	}

	/// Set the wait before reading the identity response.
	pub fn identify(&mut self, duration: Duration) -> &mut Self {
		self.identify = duration;
		self
	}

	/// The wait after a command.
	pub fn get_command(&self) -> Duration {
		self.command
	}

	/// The wait before reading a query response.
	pub fn get_query(&self) -> Duration {
		self.query
	}

	/// The wait before reading the identity response.
	pub fn get_identify(&self) -> Duration {
		self.identify
	}
}

impl Default for SettleTimes {
	fn default() -> Self {
		SettleTimes::new()
	}
}
