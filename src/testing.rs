//! Simulated HD44780 on the far side of a parallel bus
//!
//! Pins share one [`Controller`]: it logs every pin write, latches writes on
//! the falling edge of enable and drives the data lines while enable is high
//! during reads.

extern crate std;

use core::{cell::RefCell, convert::Infallible};
use std::{rc::Rc, vec::Vec};

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::{
    command::DataWidth,
    sender::ParallelSender,
    timer::{fake::StepCounter, Timer},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PinId {
    Rs,
    Rw,
    En,
    Db(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    Set(PinId, bool),
}

/// A whole byte as the controller saw it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Transfer {
    pub(crate) rs: bool,
    pub(crate) read: bool,
    pub(crate) value: u8,
}

pub(crate) struct Controller {
    pub(crate) ddram: [u8; 128],
    pub(crate) ac: u8,
    /// status reads that still answer busy
    pub(crate) busy_reads: u8,
    /// `busy_reads` reloaded after every instruction
    pub(crate) busy_after_instruction: u8,
    pub(crate) stuck_busy: bool,
    four_bit: bool,
    rs: bool,
    rw: bool,
    en: bool,
    // high means released
    lines: [bool; 8],
    presented: Option<u8>,
    pending_write: Option<u8>,
    pending_read: Option<u8>,
    events: Vec<Event>,
    transfers: Vec<Transfer>,
}

impl Controller {
    fn new(wiring: DataWidth) -> Self {
        // DB3..DB0 are tied low on a 4-pin bus
        let low_lines = wiring == DataWidth::Bit8;
        Self {
            ddram: [b' '; 128],
            ac: 0,
            busy_reads: 0,
            busy_after_instruction: 0,
            stuck_busy: false,
            four_bit: false,
            rs: false,
            rw: false,
            en: false,
            lines: [
                low_lines, low_lines, low_lines, low_lines, true, true, true, true,
            ],
            presented: None,
            pending_write: None,
            pending_read: None,
            events: Vec::new(),
            transfers: Vec::new(),
        }
    }

    fn set(&mut self, id: PinId, level: bool) {
        self.events.push(Event::Set(id, level));
        match id {
            PinId::Rs => self.rs = level,
            PinId::Rw => self.rw = level,
            PinId::Db(line) => self.lines[line as usize] = level,
            PinId::En => {
                let rising = !self.en && level;
                let falling = self.en && !level;
                self.en = level;
                if rising && self.rw {
                    self.present();
                }
                if falling {
                    if self.rw {
                        self.presented = None;
                    } else {
                        self.latch();
                    }
                }
            }
        }
    }

    fn level(&self, id: PinId) -> bool {
        match id {
            PinId::Rs => self.rs,
            PinId::Rw => self.rw,
            PinId::En => self.en,
            PinId::Db(line) => match self.presented {
                Some(image) if self.en && self.rw => image & (1 << line) != 0,
                _ => self.lines[line as usize],
            },
        }
    }

    fn present(&mut self) {
        if self.four_bit {
            if let Some(low) = self.pending_read.take() {
                self.presented = Some(low << 4);
                return;
            }
        }

        let value = if self.rs {
            let value = self.ddram[self.ac as usize];
            self.ac = (self.ac + 1) & 0x7F;
            value
        } else {
            let busy = self.stuck_busy || self.busy_reads > 0;
            self.busy_reads = self.busy_reads.saturating_sub(1);
            ((busy as u8) << 7) | self.ac
        };
        self.transfers.push(Transfer {
            rs: self.rs,
            read: true,
            value,
        });

        if self.four_bit {
            self.presented = Some(value & 0xF0);
            self.pending_read = Some(value & 0x0F);
        } else {
            self.presented = Some(value);
        }
    }

    fn latch(&mut self) {
        let image = self
            .lines
            .iter()
            .enumerate()
            .fold(0u8, |acc, (line, &level)| acc | ((level as u8) << line));

        if !self.four_bit {
            self.execute(image);
            return;
        }
        let nibble = image >> 4;
        match self.pending_write.take() {
            Some(high) => self.execute((high << 4) | nibble),
            None => self.pending_write = Some(nibble),
        }
    }

    fn execute(&mut self, value: u8) {
        self.transfers.push(Transfer {
            rs: self.rs,
            read: false,
            value,
        });

        if self.rs {
            self.ddram[self.ac as usize] = value;
            self.ac = (self.ac + 1) & 0x7F;
        } else if value & 0x80 != 0 {
            self.ac = value & 0x7F;
        } else if value & 0x40 != 0 {
            self.ac = value & 0x3F;
        } else if value & 0x20 != 0 {
            self.four_bit = value & 0x10 == 0;
        } else if value == 0x01 {
            self.ddram = [b' '; 128];
            self.ac = 0;
        } else if value & 0xFE == 0x02 {
            self.ac = 0;
        }
        self.busy_reads = self.busy_after_instruction;
    }
}

#[derive(Clone)]
pub(crate) struct SimBus(Rc<RefCell<Controller>>);

impl SimBus {
    pub(crate) fn new(wiring: DataWidth) -> Self {
        Self(Rc::new(RefCell::new(Controller::new(wiring))))
    }

    pub(crate) fn pin(&self, id: PinId) -> SimPin {
        SimPin {
            id,
            bus: self.clone(),
        }
    }

    /// Skip the power-on dance for tests that start mid-session
    pub(crate) fn set_four_bit_interface(&self) {
        self.0.borrow_mut().four_bit = true;
    }

    pub(crate) fn is_four_bit_interface(&self) -> bool {
        self.0.borrow().four_bit
    }

    pub(crate) fn with_controller<R>(&self, f: impl FnOnce(&mut Controller) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    pub(crate) fn transfers(&self) -> Vec<Transfer> {
        self.0.borrow().transfers.clone()
    }

    pub(crate) fn clear_log(&self) {
        let mut controller = self.0.borrow_mut();
        controller.events.clear();
        controller.transfers.clear();
    }

    pub(crate) fn ddram(&self, start: u8, len: usize) -> Vec<u8> {
        let start = start as usize;
        self.0.borrow().ddram[start..start + len].to_vec()
    }

    pub(crate) fn ac(&self) -> u8 {
        self.0.borrow().ac
    }

    pub(crate) fn sender_8pin<'t>(
        &self,
        timer: &'t Timer<StepCounter>,
        with_rw: bool,
    ) -> ParallelSender<'t, SimPin, SimPin, StepCounter, 8> {
        ParallelSender::new_8pin(
            self.pin(PinId::Rs),
            with_rw.then(|| self.pin(PinId::Rw)),
            self.pin(PinId::En),
            self.pin(PinId::Db(0)),
            self.pin(PinId::Db(1)),
            self.pin(PinId::Db(2)),
            self.pin(PinId::Db(3)),
            self.pin(PinId::Db(4)),
            self.pin(PinId::Db(5)),
            self.pin(PinId::Db(6)),
            self.pin(PinId::Db(7)),
            timer,
        )
    }

    pub(crate) fn sender_4pin<'t>(
        &self,
        timer: &'t Timer<StepCounter>,
        with_rw: bool,
    ) -> ParallelSender<'t, SimPin, SimPin, StepCounter, 4> {
        ParallelSender::new_4pin(
            self.pin(PinId::Rs),
            with_rw.then(|| self.pin(PinId::Rw)),
            self.pin(PinId::En),
            self.pin(PinId::Db(4)),
            self.pin(PinId::Db(5)),
            self.pin(PinId::Db(6)),
            self.pin(PinId::Db(7)),
            timer,
        )
    }
}

pub(crate) struct SimPin {
    id: PinId,
    bus: SimBus,
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bus.0.borrow_mut().set(self.id, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bus.0.borrow_mut().set(self.id, true);
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.bus.0.borrow().level(self.id))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|level| !level)
    }
}
