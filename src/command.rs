//! HD44780-family instruction set
//!
//! Every instruction is an 8 bit image built from the mask constants below;
//! [`CommandSet`] names the instructions, [`Command`] is what goes over the bus.

use crate::utils::BitOps;

/// `0b0000_0001`, clear DDRAM and set address counter to 0
pub const CLEAR_DISPLAY: u8 = 0b0000_0001;
/// `0b0000_001x`, set address counter to 0 and undo display shift
pub const RETURN_HOME: u8 = 0b0000_0010;
/// `0b0000_01IS`
pub const ENTRY_MODE_SET: u8 = 0b0000_0100;
/// `0b0000_1DCB`
pub const DISPLAY_CONTROL: u8 = 0b0000_1000;
/// `0b0001_SRxx`
pub const CURSOR_DISPLAY_SHIFT: u8 = 0b0001_0000;
/// `0b001D_NFxx`
pub const FUNCTION_SET: u8 = 0b0010_0000;
/// `0b1AAA_AAAA`
pub const SET_DDRAM_ADDRESS: u8 = 0b1000_0000;

/// Busy flag in the status register
pub const BUSY_FLAG_MASK: u8 = 0b1000_0000;
/// Address counter in the status register, also the DDRAM address range
pub const ADDRESS_MASK: u8 = 0b0111_1111;

/// Entry mode: increment address (left to right)
const ENTRY_INCREMENT_BIT: u8 = 1;
/// Entry mode: shift display on write
const ENTRY_SHIFT_BIT: u8 = 0;
/// Display control: display on
const DISPLAY_ON_BIT: u8 = 2;
/// Display control: cursor on
const CURSOR_ON_BIT: u8 = 1;
/// Display control: cursor blink
const CURSOR_BLINK_BIT: u8 = 0;
/// Shift: move display, not only the cursor
const SHIFT_DISPLAY_BIT: u8 = 3;
/// Shift: to the right
const SHIFT_RIGHT_BIT: u8 = 2;
/// Function set: 8 bit bus
const DATA_LENGTH_BIT: u8 = 4;
/// Function set: 2 lines
const LINES_BIT: u8 = 3;
/// Function set: 5x10 font
const FONT_BIT: u8 = 2;

/// Named instructions
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandSet {
    ClearDisplay,
    ReturnHome,
    EntryModeSet(MoveDirection, ShiftType),
    DisplayOnOff(DisplaySettings),
    CursorOrDisplayShift(ShiftType, MoveDirection),
    /// High nibble of a function set on its own.
    /// Only valid during power-on init, before the controller knows the bus width.
    InitNibble(DataWidth),
    FunctionSet(DataWidth, LineMode, Font),
    SetDDRAM(u8),
    ReadBusyFlagAndAddress,
    WriteDataToRAM(u8),
    ReadDataFromRAM,
}

#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveDirection {
    RightToLeft,
    #[default]
    LeftToRight,
}

#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftType {
    #[default]
    CursorOnly,
    CursorAndDisplay,
}

#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    #[default]
    Off,
    On,
}

impl From<bool> for State {
    fn from(on: bool) -> Self {
        match on {
            true => State::On,
            false => State::Off,
        }
    }
}

impl From<State> for bool {
    fn from(state: State) -> Self {
        state == State::On
    }
}

/// Width of the parallel data bus
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataWidth {
    Bit4,
    #[default]
    Bit8,
}

/// Number of display rows
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineMode {
    OneLine,
    #[default]
    TwoLine,
}

impl LineMode {
    /// Rows as a number
    pub fn rows(self) -> u8 {
        match self {
            LineMode::OneLine => 1,
            LineMode::TwoLine => 2,
        }
    }
}

/// Character font; 5x10 is only honored by the controller in one line mode
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Font {
    #[default]
    Font5x8,
    Font5x10,
}

/// Mutable display settings, all [`State::Off`] by default
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplaySettings {
    pub display: State,
    pub cursor: State,
    pub cursor_blink: State,
}

impl DisplaySettings {
    /// Build from plain flags
    pub fn new(display_on: bool, cursor_on: bool, cursor_blink: bool) -> Self {
        Self {
            display: display_on.into(),
            cursor: cursor_on.into(),
            cursor_blink: cursor_blink.into(),
        }
    }
}

/// Which controller register a transfer targets (RS line)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterSelection {
    /// Instruction register on write, status register on read (RS low)
    Command,
    /// DDRAM data (RS high)
    Data,
}

/// Payload of a write transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bits {
    /// A lone nibble, sent in a single enable cycle on DB7..DB4
    Bit4(u8),
    /// A full byte, sent as one cycle on an 8 bit bus or two on a 4 bit bus
    Bit8(u8),
}

/// One bus transfer
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Write(RegisterSelection, Bits),
    Read(RegisterSelection),
}

impl CommandSet {
    /// Execution time when the busy flag cannot be read, in microseconds
    ///
    /// Datasheet values are 1.52 ms for clear / home and 37 µs for the rest,
    /// at a 270 kHz oscillator; slow modules run well below that.
    pub fn blind_wait_us(&self) -> u32 {
        match self {
            CommandSet::ClearDisplay | CommandSet::ReturnHome => 2_000,
            _ => 50,
        }
    }
}

fn instruction(raw_bits: u8) -> Command {
    Command::Write(RegisterSelection::Command, Bits::Bit8(raw_bits))
}

impl From<CommandSet> for Command {
    fn from(command: CommandSet) -> Self {
        match command {
            CommandSet::ClearDisplay => instruction(CLEAR_DISPLAY),

            CommandSet::ReturnHome => instruction(RETURN_HOME),

            CommandSet::EntryModeSet(dir, st) => instruction(
                ENTRY_MODE_SET
                    .put_bit(ENTRY_INCREMENT_BIT, dir == MoveDirection::LeftToRight)
                    .put_bit(ENTRY_SHIFT_BIT, st == ShiftType::CursorAndDisplay),
            ),

            CommandSet::DisplayOnOff(settings) => instruction(
                DISPLAY_CONTROL
                    .put_bit(DISPLAY_ON_BIT, bool::from(settings.display))
                    .put_bit(CURSOR_ON_BIT, bool::from(settings.cursor))
                    .put_bit(CURSOR_BLINK_BIT, bool::from(settings.cursor_blink)),
            ),

            CommandSet::CursorOrDisplayShift(st, dir) => instruction(
                CURSOR_DISPLAY_SHIFT
                    .put_bit(SHIFT_DISPLAY_BIT, st == ShiftType::CursorAndDisplay)
                    .put_bit(SHIFT_RIGHT_BIT, dir == MoveDirection::LeftToRight),
            ),

            CommandSet::InitNibble(width) => Command::Write(
                RegisterSelection::Command,
                Bits::Bit4(
                    FUNCTION_SET.put_bit(DATA_LENGTH_BIT, width == DataWidth::Bit8) >> 4,
                ),
            ),

            CommandSet::FunctionSet(width, line, font) => instruction(
                FUNCTION_SET
                    .put_bit(DATA_LENGTH_BIT, width == DataWidth::Bit8)
                    .put_bit(LINES_BIT, line == LineMode::TwoLine)
                    .put_bit(FONT_BIT, font == Font::Font5x10),
            ),

            CommandSet::SetDDRAM(addr) => instruction(SET_DDRAM_ADDRESS | (addr & ADDRESS_MASK)),

            CommandSet::ReadBusyFlagAndAddress => Command::Read(RegisterSelection::Command),

            CommandSet::WriteDataToRAM(data) => {
                Command::Write(RegisterSelection::Data, Bits::Bit8(data))
            }

            CommandSet::ReadDataFromRAM => Command::Read(RegisterSelection::Data),
        }
    }
}
