//! A small library for driving Rohde&Schwarz HMP2020 and HMP4040 power
//! supplies over a serial link.
//!
//! The instruments speak SCPI, a line based text protocol with no framing or
//! acknowledgement of its own. Every command is written as one `\r\n`
//! terminated line, followed by a fixed settle delay; queries additionally
//! read back a single short response. The serial line defaults to the
//! instrument's factory settings of 115,200 baud, 8N1.
//!
//! ```rust,no_run
//! # use hmp::device::Device;
//! # fn wrapper() -> Result<(), hmp::error::Error> {
//! let mut device = Device::open_serial("/dev/ttyACM0")?;
//! device.connect()?;
//! device.output_off(0)?;
//! device.set_voltage(1, "5")?;
//! device.set_current(1, "100")?;
//! device.output_on(1)?;
//! device.output_on(0)?; // The general output switch energizes selected channels.
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(missing_debug_implementations)]

pub mod backend;
pub mod delay;
pub mod device;
pub mod error;
pub mod line;
pub mod options;
pub mod scan;
