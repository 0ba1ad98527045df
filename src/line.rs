//! Serial line parameters: data bits, parity and stop bits.
//!
//! Each parameter can be parsed from the case-insensitive spellings accepted
//! on the command line:
//!
//! ```
//! use hmp::line::{DataBits, Parity, StopBits};
//!
//! # fn wrapper() -> Result<(), hmp::error::ConfigError> {
//! let parity: Parity = "Even".parse()?;
//! let stop_bits: StopBits = "1.5".parse()?;
//! let data_bits = DataBits::try_from(8)?;
//! assert_eq!(parity, Parity::Even);
//! assert_eq!(stop_bits, StopBits::OnePointFive);
//! assert_eq!(data_bits, DataBits::Eight);
//! # Ok(())
//! # }
//! ```

use crate::error::{InvalidDataBitsError, InvalidParityError, InvalidStopBitsError};
use serialport as sp;
use std::{fmt, io, str::FromStr};

/// The number of data bits per character.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum DataBits {
	/// 5 bits
	Five,
	/// 6 bits
	Six,
	/// 7 bits
	Seven,
	/// 8 bits
	#[default]
	Eight,
	/// 9 bits
	Nine,
}

impl DataBits {
	/// The number of bits.
	pub fn get(self) -> u8 {
		match self {
			DataBits::Five => 5,
			DataBits::Six => 6,
			DataBits::Seven => 7,
			DataBits::Eight => 8,
			DataBits::Nine => 9,
		}
	}
}

impl TryFrom<i64> for DataBits {
	type Error = InvalidDataBitsError;

	fn try_from(value: i64) -> Result<Self, Self::Error> {
		match value {
			5 => Ok(DataBits::Five),
			6 => Ok(DataBits::Six),
			7 => Ok(DataBits::Seven),
			8 => Ok(DataBits::Eight),
			9 => Ok(DataBits::Nine),
			_ => Err(InvalidDataBitsError::new(value)),
		}
	}
}

impl TryFrom<i32> for DataBits {
	type Error = InvalidDataBitsError;

	fn try_from(value: i32) -> Result<Self, Self::Error> {
		DataBits::try_from(i64::from(value))
	}
}

impl TryFrom<u8> for DataBits {
	type Error = InvalidDataBitsError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		DataBits::try_from(i64::from(value))
	}
}

impl FromStr for DataBits {
	type Err = InvalidDataBitsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		// Anything that is not an integer can never be in range.
		let value = s.trim().parse::<i64>().unwrap_or(i64::MIN);
		DataBits::try_from(value)
	}
}

impl fmt::Display for DataBits {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.get())
	}
}

impl TryFrom<DataBits> for sp::DataBits {
	type Error = io::Error;

	fn try_from(value: DataBits) -> Result<Self, Self::Error> {
		match value {
			DataBits::Five => Ok(sp::DataBits::Five),
			DataBits::Six => Ok(sp::DataBits::Six),
			DataBits::Seven => Ok(sp::DataBits::Seven),
			DataBits::Eight => Ok(sp::DataBits::Eight),
			// A valid line setting, but the OS serial drivers cannot express it.
			DataBits::Nine => Err(io::Error::new(
				io::ErrorKind::Unsupported,
				"9 data bits are not supported by the serial driver",
			)),
		}
	}
}

/// The parity checking mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Parity {
	/// No parity bit.
	#[default]
	None,
	/// Parity bit sets odd number of 1 bits.
	Odd,
	/// Parity bit sets even number of 1 bits.
	Even,
}

impl FromStr for Parity {
	type Err = InvalidParityError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"n" | "no" | "none" => Ok(Parity::None),
			"e" | "ev" | "even" => Ok(Parity::Even),
			"o" | "odd" => Ok(Parity::Odd),
			_ => Err(InvalidParityError::new(s)),
		}
	}
}

impl fmt::Display for Parity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Parity::None => "none",
			Parity::Odd => "odd",
			Parity::Even => "even",
		})
	}
}

impl From<Parity> for sp::Parity {
	fn from(value: Parity) -> Self {
		match value {
			Parity::None => sp::Parity::None,
			Parity::Odd => sp::Parity::Odd,
			Parity::Even => sp::Parity::Even,
		}
	}
}

/// The number of stop bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum StopBits {
	/// One stop bit.
	#[default]
	One,
	/// One and a half stop bits.
	OnePointFive,
	/// Two stop bits.
	Two,
}

impl FromStr for StopBits {
	type Err = InvalidStopBitsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"1" | "one" => Ok(StopBits::One),
			"1.5" => Ok(StopBits::OnePointFive),
			"2" | "two" => Ok(StopBits::Two),
			_ => Err(InvalidStopBitsError::new(s)),
		}
	}
}

impl fmt::Display for StopBits {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			StopBits::One => "1",
			StopBits::OnePointFive => "1.5",
			StopBits::Two => "2",
		})
	}
}

impl TryFrom<StopBits> for sp::StopBits {
	type Error = io::Error;

	fn try_from(value: StopBits) -> Result<Self, Self::Error> {
		match value {
			StopBits::One => Ok(sp::StopBits::One),
			StopBits::Two => Ok(sp::StopBits::Two),
			// serialport only models whole stop bits.
			StopBits::OnePointFive => Err(io::Error::new(
				io::ErrorKind::Unsupported,
				"1.5 stop bits are not supported by the serial driver",
			)),
		}
	}
}
