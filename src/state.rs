use crate::{
    command::{DisplaySettings, LineMode, MoveDirection, ShiftType, ADDRESS_MASK},
    lcd::LcdConfig,
};

/// What the driver last told the controller
///
/// The address is only a mirror of the controller's address counter; when the
/// bus can read, the counter itself is the authority.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LcdState {
    config: LcdConfig,
    settings: DisplaySettings,
    direction: MoveDirection,
    shift_type: ShiftType,
    address: u8,
}

impl LcdState {
    pub(crate) fn new(config: LcdConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub(crate) fn get_config(&self) -> LcdConfig {
        self.config
    }

    pub(crate) fn get_display_settings(&self) -> DisplaySettings {
        self.settings
    }

    pub(crate) fn set_display_settings(&mut self, settings: DisplaySettings) {
        self.settings = settings;
    }

    pub(crate) fn get_direction(&self) -> MoveDirection {
        self.direction
    }

    pub(crate) fn set_direction(&mut self, direction: MoveDirection) {
        self.direction = direction;
    }

    pub(crate) fn get_shift_type(&self) -> ShiftType {
        self.shift_type
    }

    pub(crate) fn set_shift_type(&mut self, shift_type: ShiftType) {
        self.shift_type = shift_type;
    }

    pub(crate) fn get_address(&self) -> u8 {
        self.address
    }

    pub(crate) fn set_address(&mut self, address: u8) {
        self.address = address & ADDRESS_MASK;
    }

    /// Move the mirrored address the way the controller moves its counter after a data transfer
    pub(crate) fn step_address(&mut self) {
        // DDRAM is looped, one 80 cell line or two 40 cell lines
        let address = self.address;
        self.address = match (self.config.get_line_mode(), self.direction) {
            (LineMode::OneLine, MoveDirection::LeftToRight) => match address {
                0x4F => 0x00,
                _ => address + 1,
            },
            (LineMode::OneLine, MoveDirection::RightToLeft) => match address {
                0x00 => 0x4F,
                _ => address - 1,
            },
            (LineMode::TwoLine, MoveDirection::LeftToRight) => match address {
                0x27 => 0x40,
                0x67 => 0x00,
                _ => address + 1,
            },
            (LineMode::TwoLine, MoveDirection::RightToLeft) => match address {
                0x00 => 0x67,
                0x40 => 0x27,
                _ => address - 1,
            },
        } & ADDRESS_MASK;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_line_address_jumps_between_rows() {
        let mut state = LcdState::new(LcdConfig::default());
        state.set_address(0x27);
        state.step_address();
        assert_eq!(state.get_address(), 0x40);

        state.set_address(0x67);
        state.step_address();
        assert_eq!(state.get_address(), 0x00);

        state.set_direction(MoveDirection::RightToLeft);
        state.step_address();
        assert_eq!(state.get_address(), 0x67);
        state.set_address(0x40);
        state.step_address();
        assert_eq!(state.get_address(), 0x27);
    }

    #[test]
    fn one_line_address_wraps_at_80() {
        let mut state = LcdState::new(LcdConfig::default().set_line_mode(LineMode::OneLine));
        state.set_address(0x4F);
        state.step_address();
        assert_eq!(state.get_address(), 0x00);
        state.step_address();
        assert_eq!(state.get_address(), 0x01);
    }
}
