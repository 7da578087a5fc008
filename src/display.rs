//! Display Abstraction
//!
//! [`Display`] sits on top of any [`CharacterDisplay`] and keeps a copy of its
//! configuration and settings, so reading them never touches the bus. Cursor
//! requests are checked against the configured geometry and refused, never
//! clamped.

use core::fmt::Debug;

use log::warn;

use crate::{
    command::DisplaySettings,
    error::LcdError,
    lcd::{Lcd, LcdConfig},
    sender::SendCommand,
    timer::TickCounter,
};

/// One character display controller family
#[allow(missing_docs)]
pub trait CharacterDisplay {
    type Error: Debug;

    fn get_config(&self) -> LcdConfig;
    fn get_display_settings(&self) -> DisplaySettings;
    fn set_display_settings(&mut self, settings: DisplaySettings) -> Result<(), Self::Error>;
    fn clear(&mut self) -> Result<(), Self::Error>;
    fn return_home(&mut self) -> Result<(), Self::Error>;
    fn set_address(&mut self, address: u8) -> Result<(), Self::Error>;
    /// Write one character at the current address
    fn write(&mut self, byte: u8) -> Result<(), Self::Error>;
    /// Characters that still fit from the current address on
    fn write_room(&mut self) -> Result<usize, Self::Error>;
    /// Busy flag and address counter
    fn is_busy(&mut self) -> Result<(bool, u8), Self::Error>;
}

impl<Sender, C> CharacterDisplay for Lcd<'_, '_, Sender, C>
where
    Sender: SendCommand,
    Sender::Error: Debug,
    C: TickCounter,
{
    type Error = LcdError<Sender::Error>;

    fn get_config(&self) -> LcdConfig {
        Lcd::get_config(self)
    }

    fn get_display_settings(&self) -> DisplaySettings {
        Lcd::get_display_settings(self)
    }

    fn set_display_settings(&mut self, settings: DisplaySettings) -> Result<(), Self::Error> {
        Lcd::set_display_settings(self, settings)
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        Lcd::clear(self)
    }

    fn return_home(&mut self) -> Result<(), Self::Error> {
        Lcd::return_home(self)
    }

    fn set_address(&mut self, address: u8) -> Result<(), Self::Error> {
        Lcd::set_address(self, address)
    }

    fn write(&mut self, byte: u8) -> Result<(), Self::Error> {
        Lcd::write(self, byte)
    }

    fn write_room(&mut self) -> Result<usize, Self::Error> {
        Lcd::write_room(self)
    }

    fn is_busy(&mut self) -> Result<(bool, u8), Self::Error> {
        Lcd::is_busy(self)
    }
}

/// Stateful façade over a [`CharacterDisplay`]
pub struct Display<D: CharacterDisplay> {
    device: D,
    config: LcdConfig,
    settings: DisplaySettings,
}

impl<D: CharacterDisplay> Display<D> {
    /// Wrap an initialized device
    pub fn new(device: D) -> Self {
        Self {
            config: device.get_config(),
            settings: device.get_display_settings(),
            device,
        }
    }

    /// Give the device back
    pub fn release(self) -> D {
        self.device
    }

    /// Direct access to the device, for operations the façade does not cover
    ///
    /// Settings changed through it are not seen by [`Display::get_settings`].
    pub fn device(&mut self) -> &mut D {
        &mut self.device
    }

    #[allow(missing_docs)]
    pub fn get_config(&self) -> LcdConfig {
        self.config
    }

    /// Cached settings, no bus access
    pub fn get_settings(&self) -> DisplaySettings {
        self.settings
    }

    /// Update the device, then the cache
    ///
    /// On error the cache keeps the settings the device last accepted.
    pub fn set_settings(&mut self, settings: DisplaySettings) -> Result<(), D::Error> {
        self.device.set_display_settings(settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Move the cursor, `false` if `(row, col)` is outside the display or the device failed
    pub fn set_cursor(&mut self, row: u8, col: u8) -> bool {
        let Some(address) = self.config.cursor_address(row, col) else {
            return false;
        };

        match self.device.set_address(address) {
            Ok(()) => true,
            Err(e) => {
                warn!("Display: set cursor ({}, {}) failed: {:?}", row, col, e);
                false
            }
        }
    }

    /// Write at the cursor, returns how many bytes made it to the display
    ///
    /// Stops at the first device error, bytes written before it are counted.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let room = match self.device.write_room() {
            Ok(room) => room,
            Err(e) => {
                warn!("Display: write failed: {:?}", e);
                return 0;
            }
        };

        let mut written = 0;
        for &byte in data.iter().take(room) {
            if let Err(e) = self.device.write(byte) {
                warn!("Display: write failed after {} bytes: {:?}", written, e);
                break;
            }
            written += 1;
        }
        written
    }

    #[allow(missing_docs)]
    pub fn clear(&mut self) -> Result<(), D::Error> {
        self.device.clear()
    }

    #[allow(missing_docs)]
    pub fn return_home(&mut self) -> Result<(), D::Error> {
        self.device.return_home()
    }

    #[allow(missing_docs)]
    pub fn is_busy(&mut self) -> Result<(bool, u8), D::Error> {
        self.device.is_busy()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;
    use crate::command::{DataWidth, LineMode};
    use crate::testing::SimBus;
    use crate::timer::{fake::StepCounter, Timer};

    #[derive(Debug, PartialEq)]
    enum Call {
        Settings(DisplaySettings),
        Address(u8),
        Write(u8),
    }

    #[derive(Default)]
    struct Recorder {
        config: LcdConfig,
        calls: Vec<Call>,
        fail: bool,
        /// writes accepted before every further one fails
        write_budget: Option<usize>,
        /// unlimited when `None`
        room: Option<usize>,
    }

    impl Recorder {
        fn outcome(&self) -> Result<(), ()> {
            match self.fail {
                true => Err(()),
                false => Ok(()),
            }
        }
    }

    impl CharacterDisplay for Recorder {
        type Error = ();

        fn get_config(&self) -> LcdConfig {
            self.config
        }

        fn get_display_settings(&self) -> DisplaySettings {
            DisplaySettings::default()
        }

        fn set_display_settings(&mut self, settings: DisplaySettings) -> Result<(), ()> {
            self.calls.push(Call::Settings(settings));
            self.outcome()
        }

        fn clear(&mut self) -> Result<(), ()> {
            Ok(())
        }

        fn return_home(&mut self) -> Result<(), ()> {
            Ok(())
        }

        fn set_address(&mut self, address: u8) -> Result<(), ()> {
            self.calls.push(Call::Address(address));
            self.outcome()
        }

        fn write(&mut self, byte: u8) -> Result<(), ()> {
            match self.write_budget {
                Some(0) => return Err(()),
                Some(left) => self.write_budget = Some(left - 1),
                None => {}
            }
            self.calls.push(Call::Write(byte));
            Ok(())
        }

        fn write_room(&mut self) -> Result<usize, ()> {
            self.outcome()?;
            Ok(self.room.unwrap_or(usize::MAX))
        }

        fn is_busy(&mut self) -> Result<(bool, u8), ()> {
            Ok((false, 0))
        }
    }

    #[test]
    fn cursor_maps_rows_to_offsets() {
        let mut display = Display::new(Recorder::default());

        assert!(display.set_cursor(0, 0));
        assert!(display.set_cursor(1, 15));
        assert!(!display.set_cursor(2, 0));
        assert!(!display.set_cursor(0, 16));

        assert_eq!(
            display.release().calls,
            [Call::Address(0x00), Call::Address(0x4F)]
        );
    }

    #[test]
    fn cursor_never_leaves_its_line() {
        let mut display = Display::new(Recorder {
            config: LcdConfig::default().set_columns(100),
            ..Default::default()
        });
        assert!(display.set_cursor(0, 39));
        // column 64 of row 0 would land on row 1
        assert!(!display.set_cursor(0, 64));

        let mut display = Display::new(Recorder {
            config: LcdConfig::default().set_columns(255),
            ..Default::default()
        });
        assert!(!display.set_cursor(1, 200));
        assert!(display.device().calls.is_empty());
    }

    #[test]
    fn settings_are_cached() {
        let mut display = Display::new(Recorder::default());
        let settings = DisplaySettings::new(true, false, true);

        display.set_settings(settings).unwrap();
        assert_eq!(display.get_settings(), settings);
        assert_eq!(display.get_settings(), settings);
        assert_eq!(display.device().calls, [Call::Settings(settings)]);
    }

    #[test]
    fn rejected_settings_are_not_cached() {
        let mut display = Display::new(Recorder {
            fail: true,
            ..Default::default()
        });

        assert_eq!(
            display.set_settings(DisplaySettings::new(true, true, true)),
            Err(())
        );
        assert_eq!(display.get_settings(), DisplaySettings::default());
    }

    #[test]
    fn device_failures_become_false_and_zero() {
        let mut display = Display::new(Recorder {
            fail: true,
            ..Default::default()
        });

        assert!(!display.set_cursor(0, 1));
        assert_eq!(display.write(b"abc"), 0);
    }

    #[test]
    fn write_counts_bytes_before_a_failure() {
        let mut display = Display::new(Recorder {
            write_budget: Some(2),
            ..Default::default()
        });

        assert_eq!(display.write(b"abcd"), 2);
        assert_eq!(
            display.release().calls,
            [Call::Write(b'a'), Call::Write(b'b')]
        );
    }

    #[test]
    fn write_stops_at_the_room_left() {
        let mut display = Display::new(Recorder {
            room: Some(3),
            ..Default::default()
        });

        assert_eq!(display.write(b"abcdef"), 3);
    }

    #[test]
    fn one_line_geometry() {
        let mut display = Display::new(Recorder {
            config: LcdConfig::default()
                .set_line_mode(LineMode::OneLine)
                .set_columns(8),
            ..Default::default()
        });

        assert!(display.set_cursor(0, 7));
        assert!(!display.set_cursor(1, 0));
        assert!(!display.set_cursor(0, 8));
        assert_eq!(display.release().calls, [Call::Address(0x07)]);
    }

    #[test]
    fn over_real_bus() {
        let timer = Timer::new(StepCounter::new(100));
        let bus = SimBus::new(DataWidth::Bit8);
        let mut sender = bus.sender_8pin(&timer, true);
        let lcd = Lcd::new(&mut sender, &timer, LcdConfig::default()).unwrap();
        let mut display = Display::new(lcd);
        bus.clear_log();

        assert!(!display.set_cursor(5, 5));
        assert!(bus.events().is_empty());

        assert!(display.set_cursor(1, 0));
        assert_eq!(display.write(b"42.0%"), 5);
        assert_eq!(bus.ddram(0x40, 5), b"42.0%");
        assert_eq!(display.is_busy().unwrap(), (false, 0x45));

        display.clear().unwrap();
        assert_eq!(bus.ac(), 0);
    }
}
