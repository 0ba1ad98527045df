//! Discover serial ports a power supply might be attached to.
//!
//! Scanning is purely diagnostic: each port is opened with the default line
//! configuration and immediately closed again. Nothing is written to it.

use crate::{backend::Backend, error::Error, options::OpenSerialOptions};
use std::fmt;

/// The result of probing a single serial port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortStatus {
	/// The OS name of the port, e.g. `/dev/ttyUSB0` or `COM3`.
	pub name: String,
	/// Whether the port could be opened. A port that could not be opened is
	/// usually in use by another process.
	pub available: bool,
}

impl fmt::Display for PortStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.available {
			write!(f, "{}", self.name)
		} else {
			write!(f, "{} (used)", self.name)
		}
	}
}

/// Enumerate the serial ports visible to the OS and probe each one.
///
/// A machine without serial ports yields an empty list, not an error.
///
/// ## Example
///
/// ```rust,no_run
/// # fn wrapper() -> Result<(), hmp::error::Error> {
/// for port in hmp::scan::scan_ports()? {
///     println!("Found port: {port}");
/// }
/// # Ok(())
/// # }
/// ```
pub fn scan_ports() -> Result<Vec<PortStatus>, Error> {
	let ports = serialport::available_ports()?;
	let options = OpenSerialOptions::new();
	Ok(scan_with(ports.into_iter().map(|port| port.port_name), |name| {
		probe(&options, name)
	}))
}

/// Open the named port and release it again.
fn probe(options: &OpenSerialOptions, name: &str) -> Result<(), Error> {
	options.open(name)?.close()?;
	Ok(())
}

/// Probe every named port with `probe`, which should open and release it.
fn scan_with<I, F>(names: I, mut probe: F) -> Vec<PortStatus>
where
	I: IntoIterator<Item = String>,
	F: FnMut(&str) -> Result<(), Error>,
{
	names
		.into_iter()
		.map(|name| {
			let available = match probe(&name) {
				Ok(()) => true,
				Err(e) => {
					log::debug!("{name} probe failed: {e}");
					false
				}
			};
			PortStatus { name, available }
		})
		.collect()
}
