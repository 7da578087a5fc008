//! RHT03 (DHT22) single-wire humidity / temperature sensor
//!
//! One read is a strictly sequential exchange on a single open-drain line:
//!
//! 1. idle check: the line must be high (released) within
//!    [`SensorConfig::set_idle_timeout_us`]
//! 2. request: the MCU holds the line low for at least 10 ms, then releases it
//! 3. acknowledgement: the sensor answers with ~80 µs low and ~80 µs high
//! 4. data: 40 bits, each a ~50 µs low followed by a high whose length is the
//!    bit value (~26 µs for 0, ~70 µs for 1)
//!
//! Pulses are timed with the shared [`Timer`], then decoded by
//! [`frame::decode_sensor_frame`].
//!
//! The line must be wired to a pin in open-drain mode with a pull-up:
//! `set_high()` releases it (the "input" state), `set_low()` drives it.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, trace, warn};

use crate::error::SensorError;
use crate::timer::{TickCounter, Timer};

pub mod frame;

pub use frame::{decode_sensor_frame, Frame, Pulse, PulseTrain, Reading, FRAME_BITS};

/// Timing parameters of a read
///
/// Defaults follow the RHT03 datasheet with generous margins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    idle_timeout_us: u32,
    request_hold_ms: u32,
    release_wait_us: u32,
    ack_timeout_us: u32,
    bit_timeout_us: u32,
    bit_threshold_us: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            idle_timeout_us: 1000,
            request_hold_ms: 10,
            release_wait_us: 40,
            ack_timeout_us: 1000,
            bit_timeout_us: 1000,
            bit_threshold_us: 50,
        }
    }
}

#[allow(missing_docs)]
impl SensorConfig {
    pub fn get_idle_timeout_us(&self) -> u32 {
        self.idle_timeout_us
    }

    /// How long the line may stay low before the sensor counts as busy
    pub fn set_idle_timeout_us(mut self, us: u32) -> Self {
        self.idle_timeout_us = us;
        self
    }

    pub fn get_request_hold_ms(&self) -> u32 {
        self.request_hold_ms
    }

    /// Length of the start signal; the datasheet asks for at least 1 ms,
    /// sensors in the wild need more
    pub fn set_request_hold_ms(mut self, ms: u32) -> Self {
        self.request_hold_ms = ms;
        self
    }

    pub fn get_release_wait_us(&self) -> u32 {
        self.release_wait_us
    }

    pub fn set_release_wait_us(mut self, us: u32) -> Self {
        self.release_wait_us = us;
        self
    }

    pub fn get_ack_timeout_us(&self) -> u32 {
        self.ack_timeout_us
    }

    pub fn set_ack_timeout_us(mut self, us: u32) -> Self {
        self.ack_timeout_us = us;
        self
    }

    pub fn get_bit_timeout_us(&self) -> u32 {
        self.bit_timeout_us
    }

    /// Longest accepted pulse while receiving data
    pub fn set_bit_timeout_us(mut self, us: u32) -> Self {
        self.bit_timeout_us = us;
        self
    }

    pub fn get_bit_threshold_us(&self) -> u32 {
        self.bit_threshold_us
    }

    /// High pulses longer than this are 1 bits
    pub fn set_bit_threshold_us(mut self, us: u32) -> Self {
        self.bit_threshold_us = us;
        self
    }
}

/// Level of the data line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Level {
    Low,
    High,
}

/// RHT03 driver
///
/// Owns its data pin; borrows the shared [`Timer`].
pub struct Rht03<'t, Pin, C>
where
    Pin: InputPin + OutputPin,
    C: TickCounter,
{
    pin: Pin,
    timer: &'t Timer<C>,
    config: SensorConfig,
}

impl<'t, Pin, C> Rht03<'t, Pin, C>
where
    Pin: InputPin + OutputPin,
    C: TickCounter,
{
    /// Create a driver with default timings
    pub fn new(pin: Pin, timer: &'t Timer<C>) -> Self {
        Self::with_config(pin, timer, SensorConfig::default())
    }

    /// Create a driver with custom timings
    pub fn with_config(pin: Pin, timer: &'t Timer<C>, config: SensorConfig) -> Self {
        Self { pin, timer, config }
    }

    /// Current timing parameters
    pub fn config(&self) -> SensorConfig {
        self.config
    }

    /// Give the pin back
    pub fn release(self) -> Pin {
        self.pin
    }

    /// Run one complete exchange and decode it
    ///
    /// `delay` provides the millisecond-long start signal; everything shorter
    /// is timed on the counter.
    ///
    /// On every exit path the line is left released. There are no retries:
    /// a failed read should be repeated by the caller after the sensor's
    /// 2 s sampling period.
    pub fn read(&mut self, delay: &mut impl DelayNs) -> Result<Reading, SensorError<Pin::Error>> {
        let result = self.exchange(delay);

        // keep the first error, the release only matters when all went well
        let released = self.pin.set_high();
        let reading = result?;
        released?;

        debug!(
            "RHT03: humidity {}%, temperature {}C",
            reading.humidity, reading.temperature
        );
        Ok(reading)
    }

    fn exchange(&mut self, delay: &mut impl DelayNs) -> Result<Reading, SensorError<Pin::Error>> {
        self.wait_for_idle()?;
        self.send_request(delay)?;
        self.receive_ack()?;
        let pulses = self.receive_pulses()?;

        let frame = Frame::from_pulses(&pulses, self.config.bit_threshold_us);
        frame.reading().inspect_err(|_| {
            warn!(
                "RHT03: checksum mismatch: {} != {}",
                frame.computed_checksum(),
                frame.checksum()
            );
        })
    }

    fn wait_for_idle(&mut self) -> Result<(), SensorError<Pin::Error>> {
        self.pin.set_high()?;

        let deadline = self.timer.deadline_us(self.config.idle_timeout_us);
        loop {
            if self.pin.is_high()? {
                return Ok(());
            }
            if deadline.expired() {
                warn!("RHT03 is busy");
                return Err(SensorError::SensorBusy);
            }
        }
    }

    fn send_request(&mut self, delay: &mut impl DelayNs) -> Result<(), SensorError<Pin::Error>> {
        self.pin.set_low()?;
        delay.delay_ms(self.config.request_hold_ms);
        self.pin.set_high()?;
        self.timer.wait_us(self.config.release_wait_us);
        Ok(())
    }

    fn receive_ack(&mut self) -> Result<(), SensorError<Pin::Error>> {
        let timeout_us = self.config.ack_timeout_us;

        let low = self.measure_pulse(Level::Low, timeout_us)?;
        let high = match low {
            Some(_) => self.measure_pulse(Level::High, timeout_us)?,
            None => None,
        };

        match (low, high) {
            (Some(low), Some(high)) => {
                trace!("RHT03: ack {}us low, {}us high", low, high);
                Ok(())
            }
            _ => {
                warn!("RHT03: failed to receive acknowledgement");
                Err(SensorError::AckTimeout)
            }
        }
    }

    fn receive_pulses(&mut self) -> Result<PulseTrain, SensorError<Pin::Error>> {
        let timeout_us = self.config.bit_timeout_us;
        let mut pulses = [Pulse::default(); FRAME_BITS];

        for (bit, pulse) in (0u8..).zip(pulses.iter_mut()) {
            let low_us = self.measure_pulse(Level::Low, timeout_us)?;
            let high_us = match low_us {
                Some(_) => self.measure_pulse(Level::High, timeout_us)?,
                None => None,
            };

            match (low_us, high_us) {
                (Some(low_us), Some(high_us)) => *pulse = Pulse { low_us, high_us },
                _ => {
                    warn!("RHT03: line stuck at bit {}", bit);
                    return Err(SensorError::DataTimeout { bit });
                }
            }
        }

        trace!("RHT03: pulses {:?}", pulses);
        Ok(pulses)
    }

    /// Spin while the line stays at `level`, return how long that took
    ///
    /// `None` when the level outlasts `timeout_us`.
    fn measure_pulse(
        &mut self,
        level: Level,
        timeout_us: u32,
    ) -> Result<Option<u32>, SensorError<Pin::Error>> {
        let deadline = self.timer.deadline_us(timeout_us);
        loop {
            let elapsed = deadline.elapsed_ticks();
            let current = match self.pin.is_high()? {
                true => Level::High,
                false => Level::Low,
            };
            if current != level {
                return Ok(Some(Timer::<C>::us_from_ticks(elapsed)));
            }
            if deadline.expired() {
                return Ok(None);
            }
        }
    }
}
