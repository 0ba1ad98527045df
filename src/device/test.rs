use std::{cell::RefCell, collections::HashMap, io, rc::Rc, time::Duration};

use crate::{
	backend::{Backend, Mock},
	delay::{Delay, NoDelay, SettleTimes},
	device::{Device, Direction, Model, Output, RESPONSE_BUFFER_SIZE},
	error::*,
};

/// Something observable that happened during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
	/// A command line was transmitted (without its line ending).
	Tx(String),
	/// The session waited.
	Wait(Duration),
}

type Log = Rc<RefCell<Vec<Event>>>;

/// A backend that logs every transmitted line into a shared log and answers
/// every read with nothing.
struct Transcript {
	log: Log,
	pending: Vec<u8>,
}

impl io::Read for Transcript {
	fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
		Ok(0)
	}
}

impl io::Write for Transcript {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.pending.extend_from_slice(buf);
		while let Some(end) = self.pending.windows(2).position(|w| w == b"\r\n") {
			let line: Vec<u8> = self.pending.drain(..end + 2).collect();
			self.log.borrow_mut().push(Event::Tx(
				String::from_utf8_lossy(&line[..end]).into_owned(),
			));
		}
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl Backend for Transcript {
	fn name(&self) -> Option<String> {
		Some("transcript".to_string())
	}
}

/// A fake clock that logs every wait into a shared log instead of sleeping.
struct Clock(Log);

impl Delay for Clock {
	fn delay(&mut self, duration: Duration) {
		self.0.borrow_mut().push(Event::Wait(duration));
	}
}

fn transcript_device() -> (Device<Transcript, Clock>, Log) {
	let log = Log::default();
	let device = Device::new(
		Transcript {
			log: log.clone(),
			pending: Vec::new(),
		},
		Model::Hmp4040,
		Clock(log.clone()),
	);
	(device, log)
}

fn tx(line: &str) -> Event {
	Event::Tx(line.to_string())
}

fn wait_ms(ms: u64) -> Event {
	Event::Wait(Duration::from_millis(ms))
}

/// A simulated power supply that keeps per-channel setpoints and reports
/// them back when measured.
#[derive(Default)]
struct SimulatedSupply {
	identity: String,
	selected: Option<String>,
	voltages: HashMap<String, String>,
	currents: HashMap<String, String>,
	pending: Vec<u8>,
	responses: Vec<u8>,
}

impl SimulatedSupply {
	fn new(identity: &str) -> Self {
		SimulatedSupply {
			identity: identity.to_string(),
			..SimulatedSupply::default()
		}
	}

	fn execute(&mut self, line: &str) {
		if line == "*IDN?" {
			let identity = format!("{}\n", self.identity);
			self.responses.extend_from_slice(identity.as_bytes());
		} else if let Some(channel) = line.strip_prefix("INST:SEL ") {
			self.selected = Some(channel.to_string());
		} else if let Some(value) = line.strip_prefix("SOURCE:VOLTAGE:LEVEL ") {
			if let Some(channel) = self.selected.clone() {
				self.voltages.insert(channel, value.to_string());
			}
		} else if let Some(value) = line.strip_prefix("SOURCE:CURRENT:LEVEL ") {
			if let Some(channel) = self.selected.clone() {
				self.currents.insert(channel, value.to_string());
			}
		} else if line == "MEASURE:SCALAR:VOLTAGE:DC?" || line == "MEASURE:SCALAR:CURRENT:DC?" {
			let setpoints = if line.contains("VOLTAGE") {
				&self.voltages
			} else {
				&self.currents
			};
			let value = self
				.selected
				.as_ref()
				.and_then(|channel| setpoints.get(channel))
				.cloned()
				.unwrap_or_default();
			self.responses.extend_from_slice(value.as_bytes());
		}
	}
}

impl io::Read for SimulatedSupply {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		let n = buf.len().min(self.responses.len());
		buf[..n].copy_from_slice(&self.responses[..n]);
		self.responses.drain(..n);
		Ok(n)
	}
}

impl io::Write for SimulatedSupply {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.pending.extend_from_slice(buf);
		while let Some(end) = self.pending.windows(2).position(|w| w == b"\r\n") {
			let line: Vec<u8> = self.pending.drain(..end + 2).collect();
			self.execute(&String::from_utf8_lossy(&line[..end]));
		}
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl Backend for SimulatedSupply {
	fn name(&self) -> Option<String> {
		Some("simulated".to_string())
	}
}

fn written(device: &mut Device<Mock, NoDelay>) -> String {
	String::from_utf8(device.backend_mut().take_written()).unwrap()
}

#[test]
fn output_off_all_uses_general_switch() {
	let mut device = Device::open_mock();
	device.output_off(0).unwrap();
	assert_eq!(written(&mut device), "OUTPUT:GENERAL OFF\r\n");
	device.output_off(-1).unwrap();
	assert_eq!(written(&mut device), "OUTPUT:GENERAL OFF\r\n");
	device.output_on(i32::MIN).unwrap();
	assert_eq!(written(&mut device), "OUTPUT:GENERAL ON\r\n");
	device.set_output(Output::All, true).unwrap();
	assert_eq!(written(&mut device), "OUTPUT:GENERAL ON\r\n");
}

#[test]
fn output_off_channel_selects_first() {
	let mut device = Device::open_mock();
	device.output_off(1).unwrap();
	assert_eq!(written(&mut device), "INST:SEL OUT1\r\nOUTPUT:SELECT OFF\r\n");
	device.output_on(2).unwrap();
	assert_eq!(written(&mut device), "INST:SEL OUT2\r\nOUTPUT:SELECT ON\r\n");
}

#[test]
fn setpoints_select_the_channel_every_time() {
	let mut device = Device::open_mock();
	device.set_voltage(2, "2").unwrap();
	device.set_current(2, 10).unwrap();
	device.set_voltage(1, 3.3).unwrap();
	assert_eq!(
		written(&mut device),
		"INST:SEL OUT2\r\nSOURCE:VOLTAGE:LEVEL 2\r\n\
		 INST:SEL OUT2\r\nSOURCE:CURRENT:LEVEL 10\r\n\
		 INST:SEL OUT1\r\nSOURCE:VOLTAGE:LEVEL 3.3\r\n"
	);
}

#[test]
fn measurement_returns_raw_reading() {
	let mut device = Device::open_mock();
	device.backend_mut().append_data(b"1.234\n");
	assert_eq!(device.voltage(1).unwrap(), "1.234\n");
	assert_eq!(
		written(&mut device),
		"INST:SEL OUT1\r\nMEASURE:SCALAR:VOLTAGE:DC?\r\n"
	);
	device.backend_mut().append_data(b"0.0100\n");
	assert_eq!(device.current(2).unwrap(), "0.0100\n");
	assert_eq!(
		written(&mut device),
		"INST:SEL OUT2\r\nMEASURE:SCALAR:CURRENT:DC?\r\n"
	);
}

#[test]
fn set_then_measure_round_trips_through_simulated_supply() {
	let mut device = Device::new(
		SimulatedSupply::new("ROHDE&SCHWARZ,HMP4040,123456,HW50020001/SW2.51"),
		Model::Hmp4040,
		NoDelay,
	);
	device.connect().unwrap();
	device.set_voltage(2, "2").unwrap();
	device.set_voltage(3, "5").unwrap();
	device.set_current(2, "500").unwrap();
	assert_eq!(device.voltage(2).unwrap(), "2");
	assert_eq!(device.voltage(3).unwrap(), "5");
	assert_eq!(device.current(2).unwrap(), "500");
}

#[test]
fn voltage_ramp_sequence() {
	let (mut device, log) = transcript_device();
	device
		.voltage_ramp(2, "UP", "0.1", Duration::from_millis(1000), 3)
		.unwrap();
	let mut expected = vec![
		tx("INST:SEL OUT2"),
		wait_ms(100),
		tx("SOURCE:VOLTAGE:STEP 0.1"),
		wait_ms(100),
	];
	for _ in 0..3 {
		expected.extend([wait_ms(1000), tx("STEP UP"), wait_ms(100)]);
	}
	assert_eq!(*log.borrow(), expected);
}

#[test]
fn voltage_ramp_without_steps_only_configures() {
	let (mut device, log) = transcript_device();
	device.set_settle_times(SettleTimes::zero());
	device
		.voltage_ramp(4, Direction::Down, 0.5, Duration::from_secs(1), 0)
		.unwrap();
	assert_eq!(
		*log.borrow(),
		vec![
			tx("INST:SEL OUT4"),
			Event::Wait(Duration::ZERO),
			tx("SOURCE:VOLTAGE:STEP 0.5"),
			Event::Wait(Duration::ZERO),
		]
	);
}

#[test]
fn settle_times_per_kind_of_command() {
	let (mut device, log) = transcript_device();
	device.beep().unwrap();
	// The transcript never answers, so the query fails after waiting.
	let err = device.query("SYST:ERR?").unwrap_err();
	assert!(matches!(err, Error::NoAnswer(_)), "{err:?}");
	let err = device.connect().unwrap_err();
	assert!(matches!(err, Error::NoAnswer(_)), "{err:?}");
	assert_eq!(
		*log.borrow(),
		vec![
			tx("SYST:BEEP"),
			wait_ms(100),
			tx("SYST:ERR?"),
			wait_ms(500),
			tx("*IDN?"),
			wait_ms(100),
		]
	);
}

#[test]
fn cycle_output_toggles() {
	let (mut device, log) = transcript_device();
	device.set_settle_times(SettleTimes::zero());
	let output = Output::from_index(2).unwrap();
	device
		.cycle_output(output, Duration::from_secs(5), Duration::from_secs(1), 2)
		.unwrap();
	let log: Vec<_> = log
		.borrow()
		.iter()
		.filter(|event| **event != Event::Wait(Duration::ZERO))
		.cloned()
		.collect();
	let mut expected = Vec::new();
	for _ in 0..2 {
		expected.extend([
			wait_ms(5000),
			tx("INST:SEL OUT2"),
			tx("OUTPUT:SELECT OFF"),
			wait_ms(1000),
			tx("INST:SEL OUT2"),
			tx("OUTPUT:SELECT ON"),
		]);
	}
	assert_eq!(log, expected);
}

#[test]
fn connect_ok() {
	let mut device = Device::open_mock();
	assert!(!device.is_connected());
	device
		.backend_mut()
		.append_data(b"ROHDE&SCHWARZ,HMP2020,101234,HW50020001/SW2.30\n");
	device.connect().unwrap();
	assert!(device.is_connected());
	assert_eq!(
		device.identity(),
		Some("ROHDE&SCHWARZ,HMP2020,101234,HW50020001/SW2.30")
	);
	assert_eq!(written(&mut device), "*IDN?\r\n");
}

#[test]
fn connect_fail() {
	let mut device = Device::open_mock();

	// Different model
	device
		.backend_mut()
		.append_data(b"ROHDE&SCHWARZ,HMP4040,101234,HW50020001/SW2.30\n");
	let err = device.connect().unwrap_err();
	let err = IdentityMismatchError::try_from(err).unwrap();
	assert_eq!(err.expected(), "ROHDE&SCHWARZ,HMP2020");
	assert!(err.response().starts_with("ROHDE&SCHWARZ,HMP4040"));
	assert!(!device.is_connected());

	// Truncated identity
	device.backend_mut().append_data(b"ROHDE&SCHW");
	let err = device.connect().unwrap_err();
	assert!(matches!(err, Error::IdentityMismatch(_)), "{err:?}");

	// Some other instrument
	device.backend_mut().append_data(b"Keysight Technologies,E36312A\n");
	let err = device.connect().unwrap_err();
	assert!(matches!(err, Error::IdentityMismatch(_)), "{err:?}");

	// No response at all
	let err = device.connect().unwrap_err();
	assert!(matches!(err, Error::NoAnswer(_)), "{err:?}");

	// Transport failure
	device
		.backend_mut()
		.read_error(Some(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")));
	let err = device.connect().unwrap_err();
	assert!(matches!(err, Error::Io(_)), "{err:?}");
	assert!(!device.is_connected());
}

#[test]
fn connect_refuses_empty_identity_prefix() {
	let mut device = Device::new(
		Mock::new(),
		Model::Other {
			identity: String::new(),
			channels: None,
		},
		NoDelay,
	);
	device.backend_mut().append_data(b"anything at all\n");
	let err = device.connect().unwrap_err();
	assert!(matches!(err, Error::InvalidModel(_)), "{err:?}");
	assert!(!device.is_connected());
	assert!(device.backend().written().is_empty());
}

#[test]
fn connect_failure_clears_previous_identity() {
	let mut device = Device::open_mock();
	device.backend_mut().append_data(b"ROHDE&SCHWARZ,HMP2020\n");
	device.connect().unwrap();
	assert!(device.is_connected());
	let _ = device.connect().unwrap_err();
	assert_eq!(device.identity(), None);
}

#[test]
fn query_without_answer() {
	let mut device = Device::open_mock();
	let err = device.query("MEASURE:SCALAR:VOLTAGE:DC?").unwrap_err();
	let err = NoAnswerError::try_from(err).unwrap();
	assert_eq!(err.command(), "MEASURE:SCALAR:VOLTAGE:DC?");

	// A read timeout is also a missing answer, not a transport failure.
	device
		.backend_mut()
		.read_error(Some(io::Error::new(io::ErrorKind::TimedOut, "slow")));
	let err = device.query("*IDN?").unwrap_err();
	assert!(matches!(err, Error::NoAnswer(_)), "{err:?}");

	device
		.backend_mut()
		.read_error(Some(io::Error::new(io::ErrorKind::Other, "framing error")));
	let err = device.query("*IDN?").unwrap_err();
	assert!(matches!(err, Error::Io(_)), "{err:?}");
}

#[test]
fn query_response_is_bounded() {
	let mut device = Device::open_mock();
	let long = "X".repeat(RESPONSE_BUFFER_SIZE + 10);
	device.backend_mut().append_data(&long);
	let response = device.query("SYST:ERR?").unwrap();
	assert_eq!(response.len(), RESPONSE_BUFFER_SIZE);
	assert!(!device.backend().is_empty());
}

#[test]
fn commands_with_line_endings_are_rejected() {
	let mut device = Device::open_mock();
	let err = device.command("OUTPUT:GENERAL ON\nSYST:BEEP").unwrap_err();
	let err = ReservedCharacterError::try_from(err).unwrap();
	assert_eq!(err.reserved(), b'\n');
	let err = device.set_voltage(1, "1\r").unwrap_err();
	assert!(matches!(err, Error::ReservedCharacter(_)), "{err:?}");
	// The channel selection before the bad value has already gone out.
	assert_eq!(written(&mut device), "INST:SEL OUT1\r\n");
}

#[test]
fn short_write_is_an_error() {
	let mut device = Device::open_mock();
	device.backend_mut().write_limit(Some(4));
	let err = device.command("SYST:BEEP").unwrap_err();
	let err = ShortWriteError::try_from(err).unwrap();
	assert_eq!(err.written(), 4);
	assert_eq!(err.expected(), "SYST:BEEP\r\n".len());
}

#[test]
fn write_failure_is_propagated() {
	let mut device = Device::open_mock();
	device
		.backend_mut()
		.write_error(Some(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")));
	let err = device.output_on(0).unwrap_err();
	assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
}

#[test]
fn channels_are_validated() {
	let mut device = Device::open_mock();
	let err = device.set_voltage(0, "1").unwrap_err();
	assert_eq!(InvalidChannelError::try_from(err).unwrap().channel(), 0);
	let err = device.voltage_ramp(0, "UP", "0.1", Duration::ZERO, 1).unwrap_err();
	assert!(matches!(err, Error::InvalidChannel(_)), "{err:?}");
	// An HMP2020 has no third channel.
	let err = device.current(3).unwrap_err();
	assert_eq!(InvalidChannelError::try_from(err).unwrap().channel(), 3);
	let err = device.output_on(3).unwrap_err();
	assert!(matches!(err, Error::InvalidChannel(_)), "{err:?}");
	let err = device.output_on(1000).unwrap_err();
	assert_eq!(InvalidChannelError::try_from(err).unwrap().channel(), 1000);
	assert!(device.backend().written().is_empty());
}

#[test]
fn unknown_channel_count_is_not_limited() {
	let mut device = Device::new(
		Mock::new(),
		Model::Other {
			identity: "HAMEG".into(),
			channels: None,
		},
		NoDelay,
	);
	device.set_voltage(7, "1").unwrap();
	assert_eq!(written(&mut device), "INST:SEL OUT7\r\nSOURCE:VOLTAGE:LEVEL 1\r\n");
}

#[test]
fn close_releases_backend() {
	let mut mock = Mock::new();
	let mut device = Device::new(&mut mock, Model::Hmp2020, NoDelay);
	device.beep().unwrap();
	device.close().unwrap();
	assert!(mock.is_closed());
	assert_eq!(mock.written(), b"SYST:BEEP\r\n");
}

#[test]
fn close_failure_is_reported() {
	let mut mock = Mock::new();
	mock.close().unwrap();
	let device = Device::new(mock, Model::Hmp2020, NoDelay);
	let err = device.close().unwrap_err();
	assert!(
		matches!(&err, Error::Io(e) if e.kind() == io::ErrorKind::NotConnected),
		"{err:?}"
	);
}
