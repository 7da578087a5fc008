//! Pure decoding of one RHT03 transmission
//!
//! Capture and decoding are split so the decoder can be checked without any
//! hardware: [`decode_sensor_frame`] only looks at pulse durations.

use crate::error::SensorError;

/// Bits in one frame
pub const FRAME_BITS: usize = 40;

/// Bytes in one frame
pub const FRAME_BYTES: usize = FRAME_BITS / 8;

/// Durations of the low and high half of one transmitted bit, in microseconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pulse {
    /// Length of the low level that starts the bit (~50 µs)
    pub low_us: u32,
    /// Length of the high level that carries the bit (~26 µs for 0, ~70 µs for 1)
    pub high_us: u32,
}

/// One pulse pair per transmitted bit, in transmission order
pub type PulseTrain = [Pulse; FRAME_BITS];

/// Five raw bytes: humidity (2), temperature (2), checksum (1)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    bytes: [u8; FRAME_BYTES],
}

impl Frame {
    /// Pack bits MSB first; a bit is 1 when its high pulse is longer than `threshold_us`
    pub fn from_pulses(pulses: &PulseTrain, threshold_us: u32) -> Self {
        let mut bytes = [0u8; FRAME_BYTES];

        pulses.iter().enumerate().for_each(|(index, pulse)| {
            let byte = &mut bytes[index / 8];
            *byte <<= 1;
            if pulse.high_us > threshold_us {
                *byte |= 1;
            }
        });

        Self { bytes }
    }

    /// Wrap already assembled bytes
    pub const fn from_bytes(bytes: [u8; FRAME_BYTES]) -> Self {
        Self { bytes }
    }

    /// Raw bytes in transmission order
    pub fn bytes(&self) -> [u8; FRAME_BYTES] {
        self.bytes
    }

    /// Humidity in tenths of a percent
    pub fn humidity_raw(&self) -> u16 {
        u16::from_be_bytes([self.bytes[0], self.bytes[1]])
    }

    /// Temperature in tenths of a degree
    pub fn temperature_raw(&self) -> u16 {
        u16::from_be_bytes([self.bytes[2], self.bytes[3]])
    }

    /// Checksum byte as received
    pub fn checksum(&self) -> u8 {
        self.bytes[4]
    }

    /// Sum of the four data bytes, truncated to 8 bits
    pub fn computed_checksum(&self) -> u8 {
        self.bytes[..4]
            .iter()
            .fold(0u8, |sum, &byte| sum.wrapping_add(byte))
    }

    /// Check integrity and convert to engineering units
    pub fn reading<E>(&self) -> Result<Reading, SensorError<E>> {
        let computed = self.computed_checksum();
        let received = self.checksum();

        if computed != received {
            return Err(SensorError::ChecksumMismatch { computed, received });
        }

        Ok(Reading {
            humidity: self.humidity_raw() as f32 / 10.0,
            temperature: self.temperature_raw() as f32 / 10.0,
        })
    }
}

/// One valid measurement
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Relative humidity in percent
    pub humidity: f32,
    /// Temperature in degrees Celsius
    pub temperature: f32,
}

impl Reading {
    /// Highest temperature the RHT03 is rated for
    pub const MAX_TEMPERATURE: f32 = 80.0;

    /// Whether the values are inside the sensor's physical range
    ///
    /// A frame can pass its checksum and still carry nonsense (an all-ones
    /// frame does). This only flags it; the caller decides what to do.
    pub fn is_plausible(&self) -> bool {
        (0.0..=100.0).contains(&self.humidity) && self.temperature <= Self::MAX_TEMPERATURE
    }
}

/// Decode captured pulses into a checked reading
pub fn decode_sensor_frame<E>(
    pulses: &PulseTrain,
    threshold_us: u32,
) -> Result<Reading, SensorError<E>> {
    Frame::from_pulses(pulses, threshold_us).reading()
}
