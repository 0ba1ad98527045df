//! Options for configuring and opening a serial port to a power supply.

use crate::{
    backend::{Backend, Serial},
    delay::ThreadSleep,
    device::{Device, Model},
    error::{ConfigError, Error},
    line::{DataBits, Parity, StopBits},
};
use serialport as sp;
use std::time::Duration;

/// Options for configuring and opening a serial port.
///
/// The line configuration is fixed once the port is open; changing it requires
/// closing the port and opening it again.
///
/// ## Example
///
/// ```rust
/// # use hmp::{options::OpenSerialOptions, line::Parity};
/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
/// let mut device = OpenSerialOptions::new()
///     .baud_rate(9600)
///     .parity(Parity::Even)
///     .open_device("/dev/ttyUSB0")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSerialOptions {
    /// The custom baud rate
    baud_rate: u32,
    /// The number of data bits per character
    data_bits: DataBits,
    /// The parity mode
    parity: Parity,
    /// The number of stop bits
    stop_bits: StopBits,
    /// The custom timeout
    timeout: Option<Duration>,
    /// The power supply model expected on the port.
    model: Model,
}

impl OpenSerialOptions {
    /// The default baud rate of the HMP series: 115,200.
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;

    /// The timeout standing in for "block indefinitely".
    const BLOCKING_TIMEOUT: Duration = Duration::from_secs(0xFFFF_FFFF);

    /// Create a blank set of options ready for configuration.
    ///
    /// The defaults are 115,200 baud, 8 data bits, no parity, 1 stop bit, no
    /// read timeout, and an HMP2020 on the other end.
    ///
    /// Equivalent to [`default`](OpenSerialOptions::default).
    pub fn new() -> Self {
        OpenSerialOptions {
            baud_rate: OpenSerialOptions::DEFAULT_BAUD_RATE,
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            timeout: None,
            model: Model::default(),
        }
    }

    /// Create options from unvalidated line parameters, as typed by a user.
    ///
    /// Every parameter is validated before anything else happens; an invalid
    /// one is a configuration error that should not be retried.
    ///
    /// ```
    /// # use hmp::{options::OpenSerialOptions, error::ConfigError};
    /// assert!(OpenSerialOptions::from_line(8, "N", "1").is_ok());
    /// assert!(matches!(
    ///     OpenSerialOptions::from_line(8, "mark", "1"),
    ///     Err(ConfigError::Parity(_)),
    /// ));
    /// ```
    pub fn from_line(data_bits: i64, parity: &str, stop_bits: &str) -> Result<Self, ConfigError> {
        let mut options = OpenSerialOptions::new();
        options
            .data_bits(DataBits::try_from(data_bits)?)
            .parity(parity.parse()?)
            .stop_bits(stop_bits.parse()?);
        Ok(options)
    }

    /// Set a custom baud rate.
    ///
    /// The default is 115,200.
    pub fn baud_rate(&mut self, baud_rate: u32) -> &mut Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the number of data bits.
    ///
    /// The default is 8.
    pub fn data_bits(&mut self, data_bits: DataBits) -> &mut Self {
        self.data_bits = data_bits;
        self
    }

    /// Set the parity mode.
    ///
    /// The default is [`Parity::None`].
    pub fn parity(&mut self, parity: Parity) -> &mut Self {
        self.parity = parity;
        self
    }

    /// Set the number of stop bits.
    ///
    /// The default is 1.
    pub fn stop_bits(&mut self, stop_bits: StopBits) -> &mut Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Set a custom read timeout.
    ///
    /// If duration is `None`, reads will block indefinitely. The default is `None`.
    pub fn timeout(&mut self, duration: Option<Duration>) -> &mut Self {
        self.timeout = duration;
        self
    }

    /// Set the power supply model expected on the port.
    ///
    /// The default is [`Model::Hmp2020`].
    pub fn model(&mut self, model: Model) -> &mut Self {
        self.model = model;
        self
    }

    /// Open a [`Serial`] port at the specified path with the configured line parameters.
    pub fn open(&self, path: &str) -> Result<Serial, Error> {
        // Due to https://gitlab.com/susurrus/serialport-rs/-/issues/102, the
        // baud rate passed to new is ignored. It must be defined using the
        // baud_rate method below.
        let port = sp::new(path, OpenSerialOptions::DEFAULT_BAUD_RATE)
            .data_bits(self.data_bits.try_into()?)
            .parity(self.parity.into())
            .flow_control(sp::FlowControl::None)
            .stop_bits(self.stop_bits.try_into()?)
            // The serialport API does not support infinite timeouts, and adds
            // the timeout to `Instant::now()` when flushing, so `Duration::MAX`
            // overflows. Over a century is practically infinite.
            .timeout(self.timeout.unwrap_or(OpenSerialOptions::BLOCKING_TIMEOUT))
            .baud_rate(self.baud_rate)
            .open_native()
            .map(Serial)?;
        log::info!(
            "opened {path} at {} baud, {}{}{}",
            self.baud_rate,
            self.data_bits,
            self.parity_letter(),
            self.stop_bits
        );
        Ok(port)
    }

    /// Open the port at the specified path and wrap it in a [`Device`].
    ///
    /// The device is not yet [connected](Device::connect).
    pub fn open_device(&self, path: &str) -> Result<Device<Serial>, Error> {
        Ok(Device::new(self.open(path)?, self.model.clone(), ThreadSleep))
    }

    /// Open the port at the specified path and wrap it in a [`Device`].
    ///
    /// The type of the underlying backend is erased via dynamic dispatch,
    /// which does have runtime overhead. [`OpenSerialOptions::open_device`]
    /// should generally be used instead, except when the type of the
    /// underlying backend may not be known at compile time.
    pub fn open_device_dyn(&self, path: &str) -> Result<Device<Box<dyn Backend>>, Error> {
        Ok(Device::new(
            Box::new(self.open(path)?),
            self.model.clone(),
            ThreadSleep,
        ))
    }

    /// The usual one letter abbreviation of the parity mode, as in "8N1".
    fn parity_letter(&self) -> char {
        match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        }
    }
}

impl Default for OpenSerialOptions {
    fn default() -> Self {
        OpenSerialOptions::new()
    }
}
