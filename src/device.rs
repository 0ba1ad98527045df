//! The SCPI session with a Rohde&Schwarz HMP series power supply.
//!
//! All communication starts with a [`Device`] wrapping an open [`Backend`]:
//!
//! ```rust
//! # use hmp::{device::Device, error::Error};
//! # fn wrapper() -> Result<(), Error> {
//! let mut device = Device::open_serial("/dev/ttyUSB0")?;
//! device.connect()?;
//! device.set_voltage(2, "3.3")?;
//! device.output_on(2)?;
//! device.output_on(0)?;
//! println!("{}", device.voltage(2)?);
//! device.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! The instrument has no acknowledgement over this link, so every write is
//! followed by a fixed settle delay (see [`SettleTimes`]). Channel-scoped
//! operations always select the channel first, because the instrument applies
//! settings to whichever channel was selected last.

mod channel;
#[cfg(test)]
mod test;

use crate::{
	backend::{Backend, Serial, UNKNOWN_BACKEND_NAME},
	delay::{Delay, SettleTimes, ThreadSleep},
	options::OpenSerialOptions,
};
#[allow(clippy::wildcard_imports)]
use crate::error::*;
pub use channel::*;
use std::{fmt, io, time::Duration};

/// The line ending appended to every command.
pub const LINE_ENDING: &str = "\r\n";

/// The size of the receive buffer for responses. Longer responses are truncated.
pub const RESPONSE_BUFFER_SIZE: usize = 64;

/// A Rohde&Schwarz HMP power supply reachable through a [`Backend`].
///
/// A device is parameterized by two types:
///
/// 1. `B`: the type of [`Backend`] used to send/receive bytes.
///    * Use [`Device::open_serial`] or the [`OpenSerialOptions`] builder to
///      construct a serial device (`Device<Serial>`).
/// 2. `D`: the type of [`Delay`] used for settle delays.
///    * This defaults to sleeping the current thread and only needs changing
///      in tests.
///
/// The device exclusively owns its backend. It is released when the device
/// is [closed](Device::close) or dropped.
pub struct Device<B, D = ThreadSleep> {
	/// The underlying backend
	backend: B,
	/// How settle delays are performed
	delay: D,
	/// How long the settle delays are
	settle: SettleTimes,
	/// The model expected on the other end
	model: Model,
	/// The identity reported by the device, once connected.
	identity: Option<String>,
}

impl<B: Backend, D> fmt::Debug for Device<B, D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Device")
			.field("name", &self.backend.name())
			.field("model", &self.model)
			.field("identity", &self.identity)
			.finish_non_exhaustive()
	}
}

impl Device<Serial> {
	/// Open the serial port at the specified path using the default options.
	///
	/// Alternatively, use [`Device::open_serial_options`] to customize how the port is opened.
	pub fn open_serial(path: &str) -> Result<Device<Serial>, Error> {
		OpenSerialOptions::new().open_device(path)
	}

	/// Get an [`OpenSerialOptions`] to customize how a serial port is opened.
	pub fn open_serial_options() -> OpenSerialOptions {
		OpenSerialOptions::default()
	}
}

#[cfg(any(test, feature = "mock"))]
impl Device<crate::backend::Mock, crate::delay::NoDelay> {
	/// Create a device backed by a [`Mock`](crate::backend::Mock) that never waits.
	pub fn open_mock() -> Self {
		Device::new(
			crate::backend::Mock::new(),
			Model::default(),
			crate::delay::NoDelay,
		)
	}
}

impl<B: Backend, D: Delay> Device<B, D> {
	/// Create a `Device` from a [`Backend`] and a [`Delay`] with the default settle times.
	pub fn new(backend: B, model: Model, delay: D) -> Self {
		Device {
			backend,
			delay,
			settle: SettleTimes::default(),
			model,
			identity: None,
		}
	}

	/// Validate the identity of the connected device.
	///
	/// Sends `*IDN?` and requires the response to start with the identity of
	/// the configured [`Model`]. This is the only success path: a mismatched,
	/// truncated, or missing response is an error, and the session should be
	/// abandoned. A model with an empty identity prefix is rejected before
	/// anything is sent, since it would accept any response.
	pub fn connect(&mut self) -> Result<(), Error> {
		self.identity = None;
		if self.model.identity().is_empty() {
			return Err(InvalidModelError::new("").into());
		}
		let response = self.query_with_settle("*IDN?", self.settle.get_identify())?;
		let expected = self.model.identity();
		if !response.starts_with(expected) {
			return Err(IdentityMismatchError::new(expected, response).into());
		}
		let identity = response.trim_end().to_string();
		log::info!("{} {} connected", self.backend_name(), identity);
		self.identity = Some(identity);
		Ok(())
	}

	/// Send a command. A response is not read.
	///
	/// The command must not contain a line ending; one is appended. After
	/// writing, the device is given the command settle time to process it.
	///
	/// ## Example
	///
	/// ```rust
	/// # use hmp::{device::Device, backend::Backend};
	/// # fn wrapper<B: Backend>(mut device: Device<B>) -> Result<(), Box<dyn std::error::Error>> {
	/// device.command("SYST:BEEP")?;
	/// # Ok(())
	/// # }
	/// ```
	pub fn command(&mut self, cmd: &str) -> Result<(), Error> {
		self.send(cmd)?;
		let settle = self.settle.get_command();
		self.settle(settle);
		Ok(())
	}

	/// Send a query and read back the response.
	///
	/// After writing, the device is given the query settle time to answer
	/// before a single read of at most [`RESPONSE_BUFFER_SIZE`] bytes. The
	/// response is returned as is, including any line ending. An empty read
	/// is a [`NoAnswerError`].
	///
	/// ## Example
	///
	/// ```rust
	/// # use hmp::{device::Device, backend::Backend};
	/// # fn wrapper<B: Backend>(mut device: Device<B>) -> Result<(), Box<dyn std::error::Error>> {
	/// let voltage = device.query("MEASURE:SCALAR:VOLTAGE:DC?")?;
	/// # Ok(())
	/// # }
	/// ```
	pub fn query(&mut self, cmd: &str) -> Result<String, Error> {
		let settle = self.settle.get_query();
		self.query_with_settle(cmd, settle)
	}

	/// Switch an output off. Zero or a negative channel switches all outputs.
	pub fn output_off(&mut self, channel: i32) -> Result<(), Error> {
		self.set_output(Output::from_index(channel)?, false)
	}

	/// Switch an output on. Zero or a negative channel switches all outputs.
	///
	/// Switching a single channel on only selects it; it is energized once the
	/// general output (channel zero) is on as well.
	pub fn output_on(&mut self, channel: i32) -> Result<(), Error> {
		self.set_output(Output::from_index(channel)?, true)
	}

	/// Switch an output on or off.
	///
	/// [`Output::All`] uses the general output switch and does not change the
	/// selected channel.
	pub fn set_output(&mut self, output: Output, on: bool) -> Result<(), Error> {
		let state = if on { "ON" } else { "OFF" };
		match output {
			Output::All => self.command(&format!("OUTPUT:GENERAL {state}")),
			Output::Channel(channel) => {
				self.select(channel)?;
				self.command(&format!("OUTPUT:SELECT {state}"))
			}
		}
	}

	/// Set the voltage of a channel, in volts.
	///
	/// The value is sent verbatim; the device itself rejects out of range values.
	pub fn set_voltage<V: fmt::Display>(&mut self, channel: u8, volts: V) -> Result<(), Error> {
		self.select_channel(channel)?;
		self.command(&format!("SOURCE:VOLTAGE:LEVEL {volts}"))
	}

	/// Set the current limit of a channel, in the instrument's native units.
	///
	/// The value is sent verbatim; the device itself rejects out of range values.
	pub fn set_current<V: fmt::Display>(&mut self, channel: u8, current: V) -> Result<(), Error> {
		self.select_channel(channel)?;
		self.command(&format!("SOURCE:CURRENT:LEVEL {current}"))
	}

	/// Measure the voltage of a channel. The reading is returned unparsed.
	pub fn voltage(&mut self, channel: u8) -> Result<String, Error> {
		self.select_channel(channel)?;
		self.query("MEASURE:SCALAR:VOLTAGE:DC?")
	}

	/// Measure the current of a channel. The reading is returned unparsed.
	pub fn current(&mut self, channel: u8) -> Result<String, Error> {
		self.select_channel(channel)?;
		self.query("MEASURE:SCALAR:CURRENT:DC?")
	}

	/// Step the voltage of a channel `count` times.
	///
	/// The step size (in volts) is configured once, then each step waits
	/// `interval` before stepping in `direction`. The direction is forwarded
	/// verbatim; see [`Direction`] for the values the device accepts.
	///
	/// ## Example
	///
	/// ```rust
	/// # use hmp::{device::{Device, Direction}, backend::Backend};
	/// # use std::time::Duration;
	/// # fn wrapper<B: Backend>(mut device: Device<B>) -> Result<(), Box<dyn std::error::Error>> {
	/// // Raise channel 1 by 1 V in 0.1 V steps, one step per second.
	/// device.voltage_ramp(1, Direction::Up, "0.1", Duration::from_secs(1), 10)?;
	/// # Ok(())
	/// # }
	/// ```
	pub fn voltage_ramp<R, S>(
		&mut self,
		channel: u8,
		direction: R,
		step_size: S,
		interval: Duration,
		count: u32,
	) -> Result<(), Error>
	where
		R: fmt::Display,
		S: fmt::Display,
	{
		self.select_channel(channel)?;
		self.command(&format!("SOURCE:VOLTAGE:STEP {step_size}"))?;
		let step = format!("STEP {direction}");
		for n in 1..=count {
			log::trace!("{} ramp step {n}/{count}", self.backend_name());
			self.settle(interval);
			self.command(&step)?;
		}
		Ok(())
	}

	/// Toggle an output `cycles` times.
	///
	/// Each cycle leaves the output in its current state for `on_time`, switches
	/// it off, waits `off_time`, and switches it back on.
	pub fn cycle_output(
		&mut self,
		output: Output,
		on_time: Duration,
		off_time: Duration,
		cycles: u32,
	) -> Result<(), Error> {
		for _ in 0..cycles {
			self.settle(on_time);
			self.set_output(output, false)?;
			self.settle(off_time);
			self.set_output(output, true)?;
		}
		Ok(())
	}

	/// Make the device beep.
	pub fn beep(&mut self) -> Result<(), Error> {
		self.command("SYST:BEEP")
	}

	/// Flush and release the backend.
	///
	/// Errors are reported, but the backend is released either way.
	pub fn close(mut self) -> Result<(), Error> {
		log::info!("closing {}", self.backend_name());
		self.backend.close()?;
		Ok(())
	}

	/// Get the settle times.
	pub fn settle_times(&self) -> SettleTimes {
		self.settle
	}

	/// Set the settle times.
	///
	/// The previous value is returned.
	pub fn set_settle_times(&mut self, settle: SettleTimes) -> SettleTimes {
		std::mem::replace(&mut self.settle, settle)
	}

	/// The identity reported by the device during the last successful
	/// [`connect`](Device::connect), without its line ending.
	pub fn identity(&self) -> Option<&str> {
		self.identity.as_deref()
	}

	/// Whether the last [`connect`](Device::connect) succeeded.
	pub fn is_connected(&self) -> bool {
		self.identity.is_some()
	}

	/// The model expected on the other end.
	pub fn model(&self) -> &Model {
		&self.model
	}

	/// Get the "name" of the device's backend.
	///
	/// This is often the path passed to [`Device::open_serial`].
	pub fn name(&self) -> Option<String> {
		self.backend.name()
	}

	/// Get a referenced to the backend.
	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Get a mutable reference to the backend.
	pub fn backend_mut(&mut self) -> &mut B {
		&mut self.backend
	}

	/// Consume the device and return the underlying backend.
	pub fn into_backend(self) -> B {
		self.backend
	}

	/// Get a mutable reference to the delay.
	pub fn delay_mut(&mut self) -> &mut D {
		&mut self.delay
	}

	/// Write a command line.
	fn send(&mut self, cmd: &str) -> Result<(), Error> {
		if cmd.contains(['\r', '\n']) {
			return Err(ReservedCharacterError::new(cmd).into());
		}
		let line = format!("{cmd}{LINE_ENDING}");
		log::debug!("{} TX:   {}", self.backend_name(), cmd);
		let written = self.backend.write(line.as_bytes())?;
		if written != line.len() {
			log::warn!(
				"{} wrote only {written} bytes and not {} bytes of {cmd:?}",
				self.backend_name(),
				line.len()
			);
			return Err(ShortWriteError::new(written, line.len()).into());
		}
		self.backend.flush()?;
		Ok(())
	}

	/// Send a query, wait `settle`, then read the response.
	fn query_with_settle(&mut self, cmd: &str, settle: Duration) -> Result<String, Error> {
		self.send(cmd)?;
		self.settle(settle);
		let mut buf = [0; RESPONSE_BUFFER_SIZE];
		let n = match self.backend.read(&mut buf) {
			Ok(n) => n,
			Err(e) if e.kind() == io::ErrorKind::TimedOut => 0,
			Err(e) => return Err(e.into()),
		};
		if n == 0 {
			return Err(NoAnswerError::new(cmd).into());
		}
		let response = String::from_utf8_lossy(&buf[..n]).into_owned();
		log::debug!("{} RECV: {}", self.backend_name(), response.trim_end());
		Ok(response)
	}

	/// Validate a channel number and select it.
	fn select_channel(&mut self, channel: u8) -> Result<(), Error> {
		self.select(Channel::try_from(channel)?)
	}

	/// Select the channel subsequent settings apply to.
	///
	/// Channels beyond the model's channel count are rejected.
	fn select(&mut self, channel: Channel) -> Result<(), Error> {
		if let Some(max) = self.model.channels() {
			if channel.get() > max {
				return Err(InvalidChannelError::new(channel.get()).into());
			}
		}
		self.command(&format!("INST:SEL OUT{channel}"))
	}

	fn settle(&mut self, duration: Duration) {
		log::trace!("{} settle {duration:?}", self.backend_name());
		self.delay.delay(duration);
	}

	fn backend_name(&self) -> String {
		self.backend
			.name()
			.unwrap_or_else(|| UNKNOWN_BACKEND_NAME.to_string())
	}
}
