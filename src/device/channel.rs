//! Addressing the outputs of a power supply and identifying its model.

use crate::error::{InvalidChannelError, InvalidDirectionError, InvalidModelError};
use std::{fmt, num::NonZeroU8, str::FromStr};

/// A specific output channel, numbered from 1.
///
/// ```
/// # use hmp::device::Channel;
/// let channel = Channel::try_from(2_u8).unwrap();
/// assert_eq!(channel.get(), 2);
/// assert_eq!(channel.to_string(), "2");
/// assert!(Channel::try_from(0_u8).is_err());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel(NonZeroU8);

impl Channel {
    /// Get the channel number.
    pub fn get(self) -> u8 {
        self.0.get()
    }
}

impl From<NonZeroU8> for Channel {
    fn from(value: NonZeroU8) -> Self {
        Channel(value)
    }
}

impl TryFrom<u8> for Channel {
    type Error = InvalidChannelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        NonZeroU8::new(value)
            .map(Channel)
            .ok_or_else(|| InvalidChannelError::new(value))
    }
}

impl TryFrom<i32> for Channel {
    type Error = InvalidChannelError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(NonZeroU8::new)
            .map(Channel)
            .ok_or_else(|| InvalidChannelError::new(value))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The target of an output enable/disable operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Output {
    /// Every output at once, via the general output switch.
    All,
    /// A single output channel.
    Channel(Channel),
}

impl Output {
    /// Interpret a channel index where zero or any negative value means all outputs.
    ///
    /// ```
    /// # use hmp::device::{Channel, Output};
    /// assert_eq!(Output::from_index(0).unwrap(), Output::All);
    /// assert_eq!(Output::from_index(-1).unwrap(), Output::All);
    /// assert_eq!(
    ///     Output::from_index(3).unwrap(),
    ///     Output::Channel(Channel::try_from(3_u8).unwrap()),
    /// );
    /// assert!(Output::from_index(300).is_err());
    /// ```
    pub fn from_index(index: i32) -> Result<Output, InvalidChannelError> {
        if index <= 0 {
            Ok(Output::All)
        } else {
            Channel::try_from(index).map(Output::Channel)
        }
    }
}

impl From<Channel> for Output {
    fn from(value: Channel) -> Self {
        Output::Channel(value)
    }
}

/// The direction of a voltage step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Increase the voltage by one step.
    Up,
    /// Decrease the voltage by one step.
    Down,
}

impl Direction {
    /// The SCPI keyword for the direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = InvalidDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UP" => Ok(Direction::Up),
            "DOWN" => Ok(Direction::Down),
            _ => Err(InvalidDirectionError::new(s)),
        }
    }
}

/// A power supply model, which determines the expected identity and how
/// many output channels exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Model {
    /// The two channel HMP2020.
    #[default]
    Hmp2020,
    /// The four channel HMP4040.
    Hmp4040,
    /// Any other instrument speaking the same command set.
    Other {
        /// The prefix the `*IDN?` response must start with. Connecting
        /// fails if it is empty; [`Model::other`] checks this up front.
        identity: String,
        /// The number of output channels, if known.
        channels: Option<u8>,
    },
}

impl Model {
    /// Describe another instrument speaking the same command set.
    ///
    /// The identity prefix must not be empty, since an empty prefix would
    /// match any response to `*IDN?`.
    ///
    /// ```
    /// # use hmp::device::Model;
    /// let model = Model::other("HAMEG,HMP4030", Some(3)).unwrap();
    /// assert_eq!(model.channels(), Some(3));
    /// assert!(Model::other("", None).is_err());
    /// ```
    pub fn other<S: Into<String>>(identity: S, channels: Option<u8>) -> Result<Model, InvalidModelError> {
        let identity = identity.into();
        if identity.is_empty() {
            return Err(InvalidModelError::new(&identity));
        }
        Ok(Model::Other { identity, channels })
    }

    /// The prefix the response to `*IDN?` must start with.
    pub fn identity(&self) -> &str {
        match self {
            Model::Hmp2020 => "ROHDE&SCHWARZ,HMP2020",
            Model::Hmp4040 => "ROHDE&SCHWARZ,HMP4040",
            Model::Other { identity, .. } => identity,
        }
    }

    /// The number of output channels, if known.
    pub fn channels(&self) -> Option<u8> {
        match self {
            Model::Hmp2020 => Some(2),
            Model::Hmp4040 => Some(4),
            Model::Other { channels, .. } => *channels,
        }
    }
}

impl FromStr for Model {
    type Err = InvalidModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hmp2020" | "2020" => Ok(Model::Hmp2020),
            "hmp4040" | "4040" => Ok(Model::Hmp4040),
            _ => Err(InvalidModelError::new(s)),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Hmp2020 => f.write_str("HMP2020"),
            Model::Hmp4040 => f.write_str("HMP4040"),
            Model::Other { identity, .. } => f.write_str(identity),
        }
    }
}
