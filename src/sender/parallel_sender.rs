use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::{
    command::{Bits, Command, DataWidth, RegisterSelection},
    sender::SendCommand,
    timer::{TickCounter, Timer},
    utils::{BitOps, BitState},
};

// Bus timings, datasheet minimums rounded up to whole 100 ns ticks

/// RS / RW / data setup before enable rises (tAS, tSP1)
const SETUP_NS: u32 = 100;
/// Enable high time (PWEH, 150 ns min)
const ENABLE_PULSE_NS: u32 = 200;
/// Read data valid after enable rises (tDDR, 100 ns max)
const DATA_DELAY_NS: u32 = 100;
/// Rest of one enable cycle (tcycE, 400 ns min)
const CYCLE_REST_NS: u32 = 200;

/// 4-pin / 8-pin parallel bus
///
/// Data pins must be open-drain with a pull-up, so that the controller can
/// drive them during reads: `set_high()` releases a pin.
///
/// Without a RW pin (RW tied to ground), the bus is write-only.
pub struct ParallelSender<'t, ControlPin, DBPin, C, const PIN_CNT: usize>
where
    ControlPin: OutputPin,
    DBPin: OutputPin + InputPin + ErrorType<Error = ControlPin::Error>,
    C: TickCounter,
{
    rs_pin: ControlPin,
    rw_pin: Option<ControlPin>,
    en_pin: ControlPin,
    db_pins: [DBPin; PIN_CNT],
    timer: &'t Timer<C>,
}

impl<'t, ControlPin, DBPin, C> ParallelSender<'t, ControlPin, DBPin, C, 4>
where
    ControlPin: OutputPin,
    DBPin: OutputPin + InputPin + ErrorType<Error = ControlPin::Error>,
    C: TickCounter,
{
    /// Bus on DB7..DB4
    #[allow(clippy::too_many_arguments)]
    pub fn new_4pin(
        rs: ControlPin,
        rw: Option<ControlPin>,
        en: ControlPin,
        db4: DBPin,
        db5: DBPin,
        db6: DBPin,
        db7: DBPin,
        timer: &'t Timer<C>,
    ) -> Self {
        Self {
            rs_pin: rs,
            rw_pin: rw,
            en_pin: en,
            db_pins: [db4, db5, db6, db7],
            timer,
        }
    }
}

impl<'t, ControlPin, DBPin, C> ParallelSender<'t, ControlPin, DBPin, C, 8>
where
    ControlPin: OutputPin,
    DBPin: OutputPin + InputPin + ErrorType<Error = ControlPin::Error>,
    C: TickCounter,
{
    /// Bus on DB7..DB0
    #[allow(clippy::too_many_arguments)]
    pub fn new_8pin(
        rs: ControlPin,
        rw: Option<ControlPin>,
        en: ControlPin,
        db0: DBPin,
        db1: DBPin,
        db2: DBPin,
        db3: DBPin,
        db4: DBPin,
        db5: DBPin,
        db6: DBPin,
        db7: DBPin,
        timer: &'t Timer<C>,
    ) -> Self {
        Self {
            rs_pin: rs,
            rw_pin: rw,
            en_pin: en,
            db_pins: [db0, db1, db2, db3, db4, db5, db6, db7],
            timer,
        }
    }
}

/// Enable line held high
///
/// Dropping the guard pulls enable low again, so an early return in the
/// middle of a cycle still leaves the bus idle.
struct EnableGuard<'p, P: OutputPin> {
    pin: &'p mut P,
}

impl<'p, P: OutputPin> EnableGuard<'p, P> {
    fn assert(pin: &'p mut P) -> Result<Self, P::Error> {
        pin.set_high()?;
        Ok(Self { pin })
    }

    /// End the pulse, reporting the pin error the drop path would swallow
    fn release(self) -> Result<(), P::Error> {
        let result = self.pin.set_low();
        core::mem::forget(self);
        result
    }
}

impl<P: OutputPin> Drop for EnableGuard<'_, P> {
    fn drop(&mut self) {
        let _ = self.pin.set_low();
    }
}

fn push_bits<P: OutputPin>(pins: &mut [P], raw_bits: u8) -> Result<(), P::Error> {
    for (index, pin) in pins.iter_mut().enumerate() {
        match raw_bits.check_bit(index as u8) {
            BitState::Set => pin.set_high()?,
            BitState::Clear => pin.set_low()?,
        }
    }
    Ok(())
}

fn release_bits<P: OutputPin>(pins: &mut [P]) -> Result<(), P::Error> {
    // in open drain mode, set pin high to release control
    pins.iter_mut().try_for_each(|pin| pin.set_high())
}

fn fetch_bits<P: InputPin>(pins: &mut [P]) -> Result<u8, P::Error> {
    // the real pin level, not what we last wrote to it
    pins.iter_mut()
        .enumerate()
        .try_fold(0u8, |acc, (index, pin)| {
            Ok::<_, P::Error>(acc.put_bit(index as u8, pin.is_high()?))
        })
}

impl<ControlPin, DBPin, C, const PIN_CNT: usize> ParallelSender<'_, ControlPin, DBPin, C, PIN_CNT>
where
    ControlPin: OutputPin,
    DBPin: OutputPin + InputPin + ErrorType<Error = ControlPin::Error>,
    C: TickCounter,
{
    fn select_register(&mut self, rs: RegisterSelection) -> Result<(), ControlPin::Error> {
        match rs {
            RegisterSelection::Command => self.rs_pin.set_low(),
            RegisterSelection::Data => self.rs_pin.set_high(),
        }
    }

    /// One enable pulse latching `raw_bits` (low `PIN_CNT` bits used)
    fn write_cycle(&mut self, rs: RegisterSelection, raw_bits: u8) -> Result<(), ControlPin::Error> {
        self.select_register(rs)?;
        if let Some(rw_pin) = self.rw_pin.as_mut() {
            rw_pin.set_low()?;
        }
        push_bits(&mut self.db_pins, raw_bits)?;
        self.timer.wait_ns(SETUP_NS);

        let enable = EnableGuard::assert(&mut self.en_pin)?;
        self.timer.wait_ns(ENABLE_PULSE_NS);
        enable.release()?;

        self.timer.wait_ns(CYCLE_REST_NS);
        Ok(())
    }

    /// One enable pulse sampling the data pins, caller checked there is a RW pin
    fn read_cycle(
        &mut self,
        rs: RegisterSelection,
        rw_pin: &mut ControlPin,
    ) -> Result<u8, ControlPin::Error> {
        self.select_register(rs)?;
        // let go of the bus before the controller starts driving it
        release_bits(&mut self.db_pins)?;
        rw_pin.set_high()?;
        self.timer.wait_ns(SETUP_NS);

        let enable = EnableGuard::assert(&mut self.en_pin)?;
        self.timer.wait_ns(DATA_DELAY_NS);
        let raw_bits = fetch_bits(&mut self.db_pins)?;
        self.timer.wait_ns(ENABLE_PULSE_NS - DATA_DELAY_NS);
        enable.release()?;

        self.timer.wait_ns(CYCLE_REST_NS);
        Ok(raw_bits)
    }

    fn read(&mut self, rs: RegisterSelection) -> Result<Option<u8>, ControlPin::Error> {
        // moved out for the duration of the read, so it can be borrowed next to `self`
        let Some(mut rw_pin) = self.rw_pin.take() else {
            return Ok(None);
        };

        let result = match PIN_CNT {
            4 => self.read_cycle(rs, &mut rw_pin).and_then(|high| {
                let low = self.read_cycle(rs, &mut rw_pin)?;
                Ok((high << 4) | (low & 0x0F))
            }),
            _ => self.read_cycle(rs, &mut rw_pin),
        };

        self.rw_pin = Some(rw_pin);
        result.map(Some)
    }
}

impl<ControlPin, DBPin, C, const PIN_CNT: usize> SendCommand
    for ParallelSender<'_, ControlPin, DBPin, C, PIN_CNT>
where
    ControlPin: OutputPin,
    DBPin: OutputPin + InputPin + ErrorType<Error = ControlPin::Error>,
    C: TickCounter,
{
    type Error = ControlPin::Error;

    fn send(&mut self, command: impl Into<Command>) -> Result<Option<u8>, Self::Error> {
        self.en_pin.set_low()?;

        match command.into() {
            Command::Write(rs, bits) => {
                match (self.get_data_width(), bits) {
                    (DataWidth::Bit4, Bits::Bit8(raw_bits)) => {
                        self.write_cycle(rs, raw_bits >> 4)?;
                        self.write_cycle(rs, raw_bits & 0b1111)?;
                    }
                    (DataWidth::Bit4, Bits::Bit4(raw_bits)) => {
                        self.write_cycle(rs, raw_bits & 0b1111)?;
                    }
                    (DataWidth::Bit8, Bits::Bit8(raw_bits)) => {
                        self.write_cycle(rs, raw_bits)?;
                    }
                    // a lone nibble belongs on DB7..DB4
                    (DataWidth::Bit8, Bits::Bit4(raw_bits)) => {
                        self.write_cycle(rs, raw_bits << 4)?;
                    }
                }
                Ok(None)
            }
            Command::Read(rs) => self.read(rs),
        }
    }

    fn get_data_width(&self) -> DataWidth {
        match PIN_CNT {
            4 => DataWidth::Bit4,
            _ => DataWidth::Bit8,
        }
    }

    fn can_read(&self) -> bool {
        self.rw_pin.is_some()
    }
}
