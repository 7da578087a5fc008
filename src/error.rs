//! Error types of the two drivers
//!
//! Both are generic over the GPIO error type `E`, and convert from it, so
//! HAL calls can be chained with `?`.

use core::fmt;

/// Failure of one sensor read
///
/// No partial reading ever comes with an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError<E> {
    /// The line did not go high (idle) before the idle timeout
    SensorBusy,
    /// One of the two acknowledgement pulses was missing or too long
    AckTimeout,
    /// The line stopped toggling while receiving data bit `bit`
    DataTimeout {
        /// Index of the bit being received, 0 is the first (MSB of humidity)
        bit: u8,
    },
    /// The received frame failed its integrity check
    ChecksumMismatch {
        /// Low 8 bits of the sum of the first four bytes
        computed: u8,
        /// Checksum byte sent by the sensor
        received: u8,
    },
    /// GPIO error
    Pin(E),
}

impl<E> From<E> for SensorError<E> {
    fn from(e: E) -> Self {
        SensorError::Pin(e)
    }
}

impl<E: fmt::Debug> fmt::Display for SensorError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::SensorBusy => write!(f, "sensor is busy"),
            SensorError::AckTimeout => write!(f, "failed to receive acknowledgement"),
            SensorError::DataTimeout { bit } => write!(f, "line stuck while reading bit {bit}"),
            SensorError::ChecksumMismatch { computed, received } => {
                write!(f, "checksum mismatch: {computed} != {received}")
            }
            SensorError::Pin(e) => write!(f, "pin error: {e:?}"),
        }
    }
}

/// Failure of an LCD operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LcdError<E> {
    /// The busy flag did not clear within the busy timeout
    ControllerTimeout,
    /// Requested position is outside the configured geometry
    CursorOutOfBounds {
        /// requested row
        row: u8,
        /// requested column
        col: u8,
    },
    /// Reading needs a RW pin, and this bus has none
    NotSupported,
    /// Configured columns do not fit in one DDRAM line
    ColumnsOutOfRange {
        /// configured columns
        columns: u8,
        /// cells per line in the configured line mode
        capacity: u8,
    },
    /// GPIO error
    Pin(E),
}

impl<E> From<E> for LcdError<E> {
    fn from(e: E) -> Self {
        LcdError::Pin(e)
    }
}

impl<E: fmt::Debug> fmt::Display for LcdError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LcdError::ControllerTimeout => write!(f, "controller is not responding"),
            LcdError::CursorOutOfBounds { row, col } => {
                write!(f, "cursor ({row}, {col}) is outside the display")
            }
            LcdError::NotSupported => write!(f, "bus has no read/write pin"),
            LcdError::ColumnsOutOfRange { columns, capacity } => {
                write!(f, "{columns} columns do not fit in a {capacity} cell line")
            }
            LcdError::Pin(e) => write!(f, "pin error: {e:?}"),
        }
    }
}
