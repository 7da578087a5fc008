//! Common tools
//!
//! Register images of the LCD controller and the sensor frame are plain
//! integers. These helpers read and write single bits and masked fields of
//! them, so no code depends on a struct layout.

/// The state of a bit,
/// It's either [`BitState::Clear`] to represent a 0
/// or [`BitState::Set`] to represent a 1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitState {
    /// Bit is 0
    Clear,
    /// Bit is 1
    Set,
}

impl From<bool> for BitState {
    fn from(value: bool) -> Self {
        match value {
            true => BitState::Set,
            false => BitState::Clear,
        }
    }
}

/// Simple bit ops on a `u8` register image
///
/// Positions above 7 are outside the register and leave it untouched
/// (or read as [`BitState::Clear`]).
pub trait BitOps: Copy {
    /// Return a copy with bit `pos` set to 1
    fn set_bit(self, pos: u8) -> Self;
    /// Return a copy with bit `pos` set to 0
    fn clear_bit(self, pos: u8) -> Self;
    /// Return a copy with bit `pos` set to `state`
    fn put_bit(self, pos: u8, state: impl Into<BitState>) -> Self {
        match state.into() {
            BitState::Set => self.set_bit(pos),
            BitState::Clear => self.clear_bit(pos),
        }
    }
    /// Read bit `pos`
    fn check_bit(self, pos: u8) -> BitState;
    /// Read the field selected by `mask`, shifted down to bit 0
    fn field(self, mask: Self) -> Self;
}

impl BitOps for u8 {
    fn set_bit(self, pos: u8) -> Self {
        self | 1u8.checked_shl(pos as u32).unwrap_or(0)
    }

    fn clear_bit(self, pos: u8) -> Self {
        self & !1u8.checked_shl(pos as u32).unwrap_or(0)
    }

    fn check_bit(self, pos: u8) -> BitState {
        (self.checked_shr(pos as u32).unwrap_or(0) & 1 == 1).into()
    }

    fn field(self, mask: Self) -> Self {
        if mask == 0 {
            return 0;
        }
        (self & mask) >> mask.trailing_zeros()
    }
}
