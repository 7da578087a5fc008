//! LCD1602 driver over a [`SendCommand`] bus
//!
//! Every instruction is followed by a settle step: with a readable bus the
//! busy flag is polled, otherwise a fixed per-instruction delay is waited.

use log::warn;

use crate::{
    command::{
        CommandSet, DisplaySettings, MoveDirection, ShiftType, ADDRESS_MASK, BUSY_FLAG_MASK,
    },
    error::LcdError,
    sender::SendCommand,
    state::LcdState,
    timer::{TickCounter, Timer},
    utils::BitOps,
};

mod init;

pub use init::LcdConfig;

/// DDRAM address of the first cell of each row
pub const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

/// Cells `write_row` may fill, counted from address 0
pub const ROW_WRITE_LIMIT: u8 = 80;

/// Character written by [`Lcd::write_str`] for anything outside the shared ASCII range
pub const REPLACEMENT_CHAR: u8 = 0xFF;

/// The LCD1602 driver
///
/// Holds the sender and timer by reference, so they can be shared with other
/// drivers once this one is dropped.
pub struct Lcd<'a, 't, Sender, C>
where
    Sender: SendCommand,
    C: TickCounter,
{
    sender: &'a mut Sender,
    timer: &'t Timer<C>,
    state: LcdState,
}

type Result<T, Sender> = core::result::Result<T, LcdError<<Sender as SendCommand>::Error>>;

impl<Sender, C> Lcd<'_, '_, Sender, C>
where
    Sender: SendCommand,
    C: TickCounter,
{
    /// Config the driver was created with
    pub fn get_config(&self) -> LcdConfig {
        self.state.get_config()
    }

    /// Last settings sent with [`Lcd::set_display_settings`]
    pub fn get_display_settings(&self) -> DisplaySettings {
        self.state.get_display_settings()
    }

    /// Display, cursor and blink on/off
    pub fn set_display_settings(&mut self, settings: DisplaySettings) -> Result<(), Sender> {
        self.send_and_settle(CommandSet::DisplayOnOff(settings))?;
        self.state.set_display_settings(settings);
        Ok(())
    }

    /// Fill DDRAM with spaces and move the cursor home
    pub fn clear(&mut self) -> Result<(), Sender> {
        self.send_and_settle(CommandSet::ClearDisplay)?;
        self.state.set_address(0);
        Ok(())
    }

    /// Move the cursor home and undo any display shift, DDRAM is untouched
    pub fn return_home(&mut self) -> Result<(), Sender> {
        self.send_and_settle(CommandSet::ReturnHome)?;
        self.state.set_address(0);
        Ok(())
    }

    /// Set the DDRAM address counter
    pub fn set_address(&mut self, address: u8) -> Result<(), Sender> {
        self.send_and_settle(CommandSet::SetDDRAM(address))?;
        self.state.set_address(address);
        Ok(())
    }

    /// Move the cursor to `(row, col)`, both zero based
    ///
    /// Out of bounds positions are rejected before anything touches the bus.
    pub fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Sender> {
        let address = self
            .get_config()
            .cursor_address(row, col)
            .ok_or(LcdError::CursorOutOfBounds { row, col })?;
        self.set_address(address)
    }

    /// Write one character at the cursor
    pub fn write(&mut self, byte: u8) -> Result<(), Sender> {
        self.send_and_settle(CommandSet::WriteDataToRAM(byte))?;
        self.state.step_address();
        Ok(())
    }

    /// Write characters from the cursor on, returns how many were written
    ///
    /// Stops once address 80 is reached.
    pub fn write_row(&mut self, data: &[u8]) -> Result<usize, Sender> {
        let room = self.write_room()?;
        let size = data.len().min(room);
        for &byte in &data[..size] {
            self.write(byte)?;
        }
        Ok(size)
    }

    /// Like [`Lcd::write_row`], with characters outside `' '..='}'` shown as a full block
    pub fn write_str(&mut self, text: &str) -> Result<usize, Sender> {
        let room = self.write_room()?;
        let mut written = 0;
        for ch in text.chars().take(room) {
            let byte = match ch {
                ' '..='}' => ch as u8,
                _ => REPLACEMENT_CHAR,
            };
            self.write(byte)?;
            written += 1;
        }
        Ok(written)
    }

    /// Read the character at the cursor
    pub fn read(&mut self) -> Result<u8, Sender> {
        if !self.sender.can_read() {
            return Err(LcdError::NotSupported);
        }
        let byte = self
            .sender
            .send(CommandSet::ReadDataFromRAM)?
            .ok_or(LcdError::NotSupported)?;
        self.settle(CommandSet::ReadDataFromRAM)?;
        self.state.step_address();
        Ok(byte)
    }

    /// Fill `buf` with characters from the cursor on
    pub fn read_row(&mut self, buf: &mut [u8]) -> Result<usize, Sender> {
        for slot in buf.iter_mut() {
            *slot = self.read()?;
        }
        Ok(buf.len())
    }

    /// Busy flag and address counter
    pub fn is_busy(&mut self) -> Result<(bool, u8), Sender> {
        if !self.sender.can_read() {
            return Err(LcdError::NotSupported);
        }
        let status = self
            .sender
            .send(CommandSet::ReadBusyFlagAndAddress)?
            .ok_or(LcdError::NotSupported)?;
        Ok((status.field(BUSY_FLAG_MASK) != 0, status.field(ADDRESS_MASK)))
    }

    /// Poll the busy flag until it clears
    ///
    /// Gives up with [`LcdError::ControllerTimeout`] after the configured busy timeout.
    pub fn wait_until_ready(&mut self) -> Result<(), Sender> {
        let config = self.get_config();
        let poll_interval_us = config.get_poll_interval_us().max(1);
        let polls = (config.get_busy_timeout_us() / poll_interval_us).max(1);

        for _ in 0..polls {
            self.timer.wait_us(poll_interval_us);
            if !self.is_busy()?.0 {
                return Ok(());
            }
        }
        Err(LcdError::ControllerTimeout)
    }

    /// Shift the whole display along with the cursor on every write
    pub fn set_display_scroll(&mut self, enable: bool) -> Result<(), Sender> {
        let shift_type = match enable {
            true => ShiftType::CursorAndDisplay,
            false => ShiftType::CursorOnly,
        };
        self.set_entry_mode(self.state.get_direction(), shift_type)
    }

    /// Whether writes also shift the display
    pub fn get_display_scroll(&self) -> bool {
        self.state.get_shift_type() == ShiftType::CursorAndDisplay
    }

    /// Shift the display one cell, DDRAM is untouched
    pub fn scroll_display(&mut self, direction: MoveDirection) -> Result<(), Sender> {
        self.send_and_settle(CommandSet::CursorOrDisplayShift(
            ShiftType::CursorAndDisplay,
            direction,
        ))
    }

    fn set_entry_mode(&mut self, direction: MoveDirection, shift_type: ShiftType) -> Result<(), Sender> {
        self.send_and_settle(CommandSet::EntryModeSet(direction, shift_type))?;
        self.state.set_direction(direction);
        self.state.set_shift_type(shift_type);
        Ok(())
    }

    /// Characters [`Lcd::write_row`] would still take from the current address
    ///
    /// Reads the address counter when the bus can read, otherwise uses the mirrored one.
    pub fn write_room(&mut self) -> Result<usize, Sender> {
        let address = match self.sender.can_read() {
            true => self.is_busy()?.1,
            false => self.state.get_address(),
        };
        Ok(ROW_WRITE_LIMIT.saturating_sub(address) as usize)
    }

    fn send_and_settle(&mut self, command: CommandSet) -> Result<(), Sender> {
        self.sender.send(command)?;
        self.settle(command)
    }

    /// Give the controller time to execute `command`
    fn settle(&mut self, command: CommandSet) -> Result<(), Sender> {
        if !self.sender.can_read() {
            self.timer.wait_us(command.blind_wait_us());
            return Ok(());
        }

        match self.wait_until_ready() {
            Err(LcdError::ControllerTimeout) => {
                // a late controller only costs a dropped instruction, keep going
                warn!("LCD: still busy after {:?}", command);
                Ok(())
            }
            other => other,
        }
    }
}
