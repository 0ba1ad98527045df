//! `hmp`: control a Rohde&Schwarz HMP2020/HMP4040 power supply from the command line.
//!
//! Operations are applied in a fixed order: all outputs off, setpoints,
//! output on, voltage ramp, measurements, beep, and finally on/off cycling.

use clap::{Parser, Subcommand};
use hmp::{
	backend::Backend,
	delay::Delay,
	device::{Device, Direction, Model, Output},
	options::OpenSerialOptions,
	scan::scan_ports,
};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "hmp", version, about = "Control a Rohde&Schwarz HMP series power supply over a serial port")]
struct Args {
	#[command(subcommand)]
	command: Option<Command>,

	/// Serial port path (e.g., /dev/ttyACM0 or COM3)
	#[arg(short, long)]
	port: Option<String>,

	/// Baud rate
	#[arg(short, long, default_value_t = OpenSerialOptions::DEFAULT_BAUD_RATE)]
	baud_rate: u32,

	/// Data bits (5 to 9)
	#[arg(long, default_value_t = 8)]
	data_bits: i64,

	/// Parity (none, even or odd)
	#[arg(long, default_value = "none")]
	parity: String,

	/// Stop bits (1, 1.5 or 2)
	#[arg(long, default_value = "1")]
	stop_bits: String,

	/// Expected model (hmp2020 or hmp4040)
	#[arg(short, long, default_value = "hmp2020")]
	model: Model,

	/// Log every command and response
	#[arg(short, long)]
	verbose: bool,

	/// Output channel the operations below apply to
	#[arg(short, long, default_value_t = 1)]
	channel: u8,

	/// Switch all outputs off before anything else
	#[arg(long)]
	off: bool,

	/// Voltage setpoint in volts
	#[arg(long)]
	voltage: Option<String>,

	/// Current limit in milliamps
	#[arg(long)]
	current: Option<String>,

	/// Switch the outputs and the channel on after applying the setpoints
	#[arg(long)]
	on: bool,

	/// Ramp the channel voltage UP or DOWN
	#[arg(long)]
	ramp: Option<Direction>,

	/// Ramp step size in volts
	#[arg(long, default_value = "0.1")]
	ramp_step: String,

	/// Time between ramp steps, in milliseconds
	#[arg(long, default_value_t = 1000)]
	ramp_interval_ms: u64,

	/// Number of ramp steps
	#[arg(long, default_value_t = 10)]
	ramp_count: u32,

	/// Print the measured voltage and current of the channel
	#[arg(long)]
	measure: bool,

	/// Make the device beep
	#[arg(long)]
	beep: bool,

	/// Toggle the channel output off and on this many times
	#[arg(long)]
	cycles: Option<u32>,

	/// Time the output stays on during each cycle, in milliseconds
	#[arg(long, default_value_t = 1000)]
	on_ms: u64,

	/// Time the output stays off during each cycle, in milliseconds
	#[arg(long, default_value_t = 1000)]
	off_ms: u64,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// List the serial ports and whether they are in use
	Scan,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	let level = if args.verbose {
		LevelFilter::Debug
	} else {
		LevelFilter::Warn
	};
	SimpleLogger::new().with_level(level).init()?;

	if let Some(Command::Scan) = args.command {
		return scan();
	}

	let Some(port) = args.port.as_deref() else {
		return Err("no port given, use `hmp scan` to list the available ports".into());
	};

	// Invalid line parameters are fatal and never reach the OS.
	let mut options = OpenSerialOptions::from_line(args.data_bits, &args.parity, &args.stop_bits)?;
	options.baud_rate(args.baud_rate).model(args.model.clone());

	let mut device = match options.open_device(port) {
		Ok(device) => device,
		Err(e) => {
			eprintln!("could not open {port}: {e}");
			eprintln!("use `hmp scan` to list the available ports");
			return Err(e.into());
		}
	};
	device.connect()?;

	let result = run(&mut device, &args);
	if let Err(e) = device.close() {
		log::warn!("failed to close {port}: {e}");
	}
	result
}

fn scan() -> Result<(), Box<dyn std::error::Error>> {
	let ports = scan_ports()?;
	if ports.is_empty() {
		println!("No serial ports found!");
	}
	for port in ports {
		println!("Found port: {port}");
	}
	Ok(())
}

fn run<B: Backend, D: Delay>(device: &mut Device<B, D>, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
	let channel = args.channel;

	if args.off {
		device.output_off(0)?;
	}
	if let Some(voltage) = &args.voltage {
		device.set_voltage(channel, voltage)?;
	}
	if let Some(current) = &args.current {
		device.set_current(channel, current)?;
	}
	if args.on {
		// A selected channel only delivers power once the general output is on.
		device.output_on(0)?;
		device.output_on(i32::from(channel))?;
	}
	if let Some(direction) = args.ramp {
		device.voltage_ramp(
			channel,
			direction,
			&args.ramp_step,
			Duration::from_millis(args.ramp_interval_ms),
			args.ramp_count,
		)?;
	}
	if args.measure {
		let voltage = device.voltage(channel)?;
		let current = device.current(channel)?;
		println!("CH{channel} voltage: {}", voltage.trim_end());
		println!("CH{channel} current: {}", current.trim_end());
	}
	if args.beep {
		device.beep()?;
	}
	if let Some(cycles) = args.cycles {
		device.cycle_output(
			Output::from_index(i32::from(channel))?,
			Duration::from_millis(args.on_ms),
			Duration::from_millis(args.off_ms),
			cycles,
		)?;
	}
	Ok(())
}
