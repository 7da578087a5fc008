use log::debug;

use crate::{
    command::{CommandSet, DataWidth, DisplaySettings, Font, LineMode, MoveDirection, ShiftType},
    error::LcdError,
    lcd::{Lcd, ROW_OFFSETS},
    sender::SendCommand,
    state::LcdState,
    timer::{TickCounter, Timer},
};

/// Wait after power reaches 2.7 V
const POWER_ON_WAIT_US: u32 = 80_000;
/// Gap after the first function set of the reset sequence
const FIRST_RESET_GAP_US: u32 = 8_000;
/// Gap after the following ones
const RESET_GAP_US: u32 = 200;

/// [`LcdConfig`] is the init config of a [`Lcd`]
///
/// Data width is not part of it, it always follows the sender's wiring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LcdConfig {
    data_width: DataWidth,
    line_mode: LineMode,
    font: Font,
    columns: u8,
    poll_interval_us: u32,
    busy_timeout_us: u32,
}

impl Default for LcdConfig {
    fn default() -> Self {
        Self {
            data_width: DataWidth::default(),
            line_mode: LineMode::TwoLine,
            font: Font::Font5x8,
            columns: 16,
            poll_interval_us: 10,
            busy_timeout_us: 5_000,
        }
    }
}

#[allow(missing_docs)]
impl LcdConfig {
    pub fn get_data_width(&self) -> DataWidth {
        self.data_width
    }

    pub(crate) fn set_data_width(mut self, data_width: DataWidth) -> Self {
        self.data_width = data_width;
        self
    }

    pub fn get_line_mode(&self) -> LineMode {
        self.line_mode
    }

    pub fn set_line_mode(mut self, line_mode: LineMode) -> Self {
        self.line_mode = line_mode;
        self
    }

    pub fn get_font(&self) -> Font {
        self.font
    }

    /// Note: the controller only honors [`Font::Font5x10`] in one line mode
    pub fn set_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn get_rows(&self) -> u8 {
        self.line_mode.rows()
    }

    /// DDRAM cells per line: 80 in one line mode, 40 in two line mode
    pub fn get_line_capacity(&self) -> u8 {
        match self.line_mode {
            LineMode::OneLine => 80,
            LineMode::TwoLine => 40,
        }
    }

    pub fn get_columns(&self) -> u8 {
        self.columns
    }

    /// Note: [`Lcd::new`] refuses more columns than [`LcdConfig::get_line_capacity`]
    pub fn set_columns(mut self, columns: u8) -> Self {
        self.columns = columns;
        self
    }

    pub fn get_poll_interval_us(&self) -> u32 {
        self.poll_interval_us
    }

    pub fn set_poll_interval_us(mut self, poll_interval_us: u32) -> Self {
        self.poll_interval_us = poll_interval_us;
        self
    }

    pub fn get_busy_timeout_us(&self) -> u32 {
        self.busy_timeout_us
    }

    pub fn set_busy_timeout_us(mut self, busy_timeout_us: u32) -> Self {
        self.busy_timeout_us = busy_timeout_us;
        self
    }

    /// DDRAM address of `(row, col)`, `None` if it is not a visible cell of this geometry
    pub fn cursor_address(&self, row: u8, col: u8) -> Option<u8> {
        if row >= self.get_rows() || col >= self.columns || col >= self.get_line_capacity() {
            return None;
        }
        ROW_OFFSETS.get(row as usize)?.checked_add(col)
    }
}

impl<'a, 't, Sender, C> Lcd<'a, 't, Sender, C>
where
    Sender: SendCommand,
    C: TickCounter,
{
    /// Create a [`Lcd`] driver, and init LCD hardware
    ///
    /// After init the display is off and cleared, with the cursor moving left to right.
    pub fn new(
        sender: &'a mut Sender,
        timer: &'t Timer<C>,
        config: LcdConfig,
    ) -> Result<Self, LcdError<Sender::Error>> {
        let config = config.set_data_width(sender.get_data_width());
        debug!("LCD init: {:?}", config);

        let capacity = config.get_line_capacity();
        let columns = config.get_columns();
        if columns == 0 || columns > capacity {
            return Err(LcdError::ColumnsOutOfRange { columns, capacity });
        }

        let function_set = CommandSet::FunctionSet(
            config.get_data_width(),
            config.get_line_mode(),
            config.get_font(),
        );

        // in initialization process, the busy flag cannot be checked,
        // only fixed waits from the datasheet are used
        timer.wait_us(POWER_ON_WAIT_US);

        // only the reset sequence differs between 4 pin and 8 pin mode
        match config.get_data_width() {
            DataWidth::Bit4 => {
                let reset = CommandSet::InitNibble(DataWidth::Bit8);
                sender.send(reset)?;
                timer.wait_us(FIRST_RESET_GAP_US);
                sender.send(reset)?;
                timer.wait_us(RESET_GAP_US);
                sender.send(reset)?;
                timer.wait_us(RESET_GAP_US);
                // still in 8 bit mode, so this one is a single nibble too
                sender.send(CommandSet::InitNibble(DataWidth::Bit4))?;
                timer.wait_us(RESET_GAP_US);
            }
            DataWidth::Bit8 => {
                sender.send(function_set)?;
                timer.wait_us(FIRST_RESET_GAP_US);
                sender.send(function_set)?;
                timer.wait_us(RESET_GAP_US);
                sender.send(function_set)?;
                timer.wait_us(RESET_GAP_US);
            }
        }

        let mut lcd = Lcd {
            sender,
            timer,
            state: LcdState::new(config),
        };

        lcd.send_and_settle(function_set)?;
        lcd.set_display_settings(DisplaySettings::default())?;
        lcd.clear()?;
        lcd.set_entry_mode(MoveDirection::LeftToRight, ShiftType::CursorOnly)?;

        Ok(lcd)
    }
}
