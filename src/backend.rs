//! Types that can exchange (read/write) bytes with a connected power supply.
//!
//! The [`Backend`] trait represents all such types. [`Serial`] is the
//! production backend; `Mock` (behind the `mock` feature) is an in-memory
//! stand-in for tests.

use std::io;

use serialport as sp;

#[cfg(windows)]
use sp::COMPort as ExternSerial;
use sp::SerialPort;
#[cfg(unix)]
use sp::TTYPort as ExternSerial;

/// The placeholder name for a backend that doesn't have a name.
pub(crate) const UNKNOWN_BACKEND_NAME: &str = "<unknown backend>";

/// Types that allow reading and writing bytes with a connected device.
///
/// Reads block until at least one byte is available or the underlying I/O
/// fails. A backend is opened by its constructor and released when it is
/// dropped; [`close`](Backend::close) gives the caller a chance to observe
/// errors while doing so.
pub trait Backend: io::Read + io::Write {
	/// Get the "name" of the backend.
	///
	/// This can be in any format, but should uniquely identify the backend
	/// instance.
	fn name(&self) -> Option<String>;

	/// Flush any pending output and release the connection.
	///
	/// Calling this more than once is not guaranteed to succeed.
	fn close(&mut self) -> io::Result<()> {
		self.flush()
	}
}

impl<C: Backend + ?Sized> Backend for Box<C> {
	fn name(&self) -> Option<String> {
		(**self).name()
	}
	fn close(&mut self) -> io::Result<()> {
		(**self).close()
	}
}

impl<C: Backend + ?Sized> Backend for &mut C {
	fn name(&self) -> Option<String> {
		(**self).name()
	}
	fn close(&mut self) -> io::Result<()> {
		(**self).close()
	}
}

/// A platform agnostic serial port backend.
//
// The `serialport` crate exposes two platform specific serial ports, `COMPort`
// and `TTYPort` for windows and unix, respectively. Wrapping whichever one the
// platform uses in a new type keeps every consumer platform agnostic without
// dynamic dispatch or an extra type parameter.
#[derive(Debug)]
pub struct Serial(pub(crate) ExternSerial);

impl io::Read for Serial {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		io::Read::read(&mut self.0, buf)
	}
}

impl io::Write for Serial {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		io::Write::write(&mut self.0, buf)
	}

	fn flush(&mut self) -> io::Result<()> {
		io::Write::flush(&mut self.0)
	}
}

impl Backend for Serial {
	fn name(&self) -> Option<String> {
		self.0.name()
	}
}

/// A mock backend for use in testing.
///
/// It has the following features:
///   * It records all data written to it.
///   * It can be filled with data for reading. Reading with no data available
///     returns `Ok(0)`, the way a port with nothing to say does.
///   * Specific errors can be inserted for calls to `read`, `write`, and `flush`.
///   * Writes can be cut short to simulate partial transmission.
///   * It remembers being closed, after which all I/O fails.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug)]
pub struct Mock {
	/// The buffer data is read from
	buffer: io::Cursor<Vec<u8>>,
	/// Everything written so far
	written: Vec<u8>,
	/// The maximum number of bytes accepted per write, if any.
	write_limit: Option<usize>,
	/// The error to surface on the next read, if any. It is only surfaced once.
	read_error: Option<io::Error>,
	/// The error to surface on the next write, if any. It is only surfaced once.
	write_error: Option<io::Error>,
	/// The error to surface on the next flush, if any. It is only surfaced once.
	flush_error: Option<io::Error>,
	/// Whether `close` has been called.
	closed: bool,
}

#[cfg(any(test, feature = "mock"))]
impl Mock {
	/// Create a new Mock backend.
	pub fn new() -> Self {
		Mock {
			buffer: io::Cursor::new(Vec::new()),
			written: Vec::new(),
			write_limit: None,
			read_error: None,
			write_error: None,
			flush_error: None,
			closed: false,
		}
	}
	/// Append data to the read buffer.
	///
	/// The data is not validated in any way.
	pub fn append_data<T: AsRef<[u8]>>(&mut self, bytes: T) {
		self.buffer.get_mut().extend_from_slice(bytes.as_ref());
	}
	/// Clear the read buffer.
	pub fn clear_buffer(&mut self) {
		self.buffer.get_mut().clear();
		self.buffer.set_position(0);
	}
	/// Whether the mock has any data available or not
	pub fn is_empty(&self) -> bool {
		usize::try_from(self.buffer.position()).unwrap_or(usize::MAX) >= self.buffer.get_ref().len()
	}
	/// All data written to the mock so far.
	pub fn written(&self) -> &[u8] {
		&self.written
	}
	/// Take all data written to the mock so far, leaving it empty.
	pub fn take_written(&mut self) -> Vec<u8> {
		std::mem::take(&mut self.written)
	}
	/// Limit the number of bytes accepted by each `write`, if any.
	pub fn write_limit(&mut self, limit: Option<usize>) {
		self.write_limit = limit;
	}
	/// Set the error for the next `read`, if any.
	pub fn read_error(&mut self, err: Option<io::Error>) {
		self.read_error = err;
	}
	/// Set the error for the next `write`, if any.
	pub fn write_error(&mut self, err: Option<io::Error>) {
		self.write_error = err;
	}
	/// Set the error for the next `flush`, if any.
	pub fn flush_error(&mut self, err: Option<io::Error>) {
		self.flush_error = err;
	}
	/// Whether the mock has been closed.
	pub fn is_closed(&self) -> bool {
		self.closed
	}

	fn check_open(&self) -> io::Result<()> {
		if self.closed {
			Err(io::Error::new(io::ErrorKind::NotConnected, "mock port is closed"))
		} else {
			Ok(())
		}
	}
}

#[cfg(any(test, feature = "mock"))]
impl Default for Mock {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(any(test, feature = "mock"))]
impl Backend for Mock {
	fn name(&self) -> Option<String> {
		Some(format!("<mock 0x{:x}>", std::ptr::from_ref(self) as usize))
	}

	fn close(&mut self) -> io::Result<()> {
		self.check_open()?;
		self.closed = true;
		Ok(())
	}
}

#[cfg(any(test, feature = "mock"))]
impl io::Read for Mock {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.check_open()?;
		if let Some(err) = self.read_error.take() {
			Err(err)
		} else {
			io::Read::read(&mut self.buffer, buf)
		}
	}
}

#[cfg(any(test, feature = "mock"))]
impl io::Write for Mock {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.check_open()?;
		if let Some(err) = self.write_error.take() {
			Err(err)
		} else {
			let n = self.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
			self.written.extend_from_slice(&buf[..n]);
			Ok(n)
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		self.check_open()?;
		if let Some(err) = self.flush_error.take() {
			Err(err)
		} else {
			Ok(())
		}
	}
}
