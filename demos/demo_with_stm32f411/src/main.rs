//! Show RHT03 readings on a LCD1602, with a STM32F411RET6 in 4 Pin Mode
//!
//! The sensor is read every 2 seconds, first row shows humidity, second row temperature.
//! Failed reads are printed over RTT and leave the last reading on screen.

//! Wiring diagram
//!
//! LCD1602 <-> STM32F411RET6
//!     Vss <-> GND
//!     Vdd <-> 5V (It is best to use an external source for the 5V pin, such as the 5V output from a DAPLink device or USB.)
//!      V0 <-> potentiometer <-> 5V & GND (to adjust the display contrast)
//!      RS <-> PA0
//!      RW <-> PA1
//!      EN <-> PA2 (and optionally connect to a 4.7 kOhm Pulldown resistor, to stable voltage level when STM32 reset)
//!      D4 <-> PA3
//!      D5 <-> PA4
//!      D6 <-> PA5
//!      D7 <-> PA6
//!       A <-> 5V
//!       K <-> GND
//!
//!   RHT03 <-> STM32F411RET6
//!   VDD   <-> 3.3V
//!   DATA  <-> PA7 (with a 4.7 kOhm Pullup resistor to 3.3V)
//!   GND   <-> GND

#![no_std]
#![no_main]

use core::fmt::Write;

use heapless::String;
use panic_rtt_target as _;
use rtt_target::{rprintln, rtt_init_print};
use stm32f4xx_hal::{
    hal::delay::DelayNs,
    pac::{self, DWT},
    prelude::*,
};

use lcd1602_rht03::{
    command::DisplaySettings,
    display::{CharacterDisplay, Display},
    lcd::{Lcd, LcdConfig},
    sender::ParallelSender,
    sensor::{Reading, Rht03},
    timer::{TickCounter, Timer},
};

const SYSCLK_HZ: u32 = 100_000_000;

/// Core cycle counter as the tick source
struct CycleCounter;

impl TickCounter for CycleCounter {
    const TICK_HZ: u32 = SYSCLK_HZ;

    fn ticks(&self) -> u32 {
        DWT::cycle_count()
    }

    fn reset(&self) {
        // Safety: the counter register is only ever written here
        unsafe { (*DWT::PTR).cyccnt.write(0) }
    }
}

fn show(display: &mut Display<impl CharacterDisplay>, reading: &Reading) {
    let mut row: String<16> = String::new();

    // a full row never overflows 16 characters with these formats
    let _ = write!(row, "Humi: {:>5.1} %", reading.humidity);
    display.set_cursor(0, 0);
    display.write(row.as_bytes());

    row.clear();
    let _ = write!(row, "Temp: {:>5.1} C", reading.temperature);
    display.set_cursor(1, 0);
    display.write(row.as_bytes());
}

#[cortex_m_rt::entry]
fn main() -> ! {
    rtt_init_print!();

    let dp = pac::Peripherals::take().expect("Cannot take device peripherals");
    let mut cp = pac::CorePeripherals::take().expect("Cannot take core peripherals");

    let rcc = dp.RCC.constrain();
    let clocks = rcc
        .cfgr
        .use_hse(12.MHz())
        .sysclk(SYSCLK_HZ.Hz())
        .freeze();

    // the cycle counter needs trace enabled first
    cp.DCB.enable_trace();
    cp.DWT.enable_cycle_counter();

    let timer = Timer::new(CycleCounter);
    let mut delayer = cp.SYST.delay(&clocks);

    // init needed digital pins

    let gpioa = dp.GPIOA.split();

    // Push-pull mode for a fast interaction
    let rs_pin = gpioa.pa0.into_push_pull_output().erase();
    let rw_pin = gpioa.pa1.into_push_pull_output().erase();
    let en_pin = gpioa.pa2.into_push_pull_output().erase();

    // Open drain mode, so the LCD can drive them on reads
    let db4_pin = gpioa
        .pa3
        .into_open_drain_output()
        .internal_pull_up(true)
        .erase();
    let db5_pin = gpioa
        .pa4
        .into_open_drain_output()
        .internal_pull_up(true)
        .erase();
    let db6_pin = gpioa
        .pa5
        .into_open_drain_output()
        .internal_pull_up(true)
        .erase();
    let db7_pin = gpioa
        .pa6
        .into_open_drain_output()
        .internal_pull_up(true)
        .erase();

    // single wire, the sensor pulls it low to talk
    let sensor_pin = gpioa
        .pa7
        .into_open_drain_output()
        .internal_pull_up(true)
        .erase();

    // put pins together
    let mut sender = ParallelSender::new_4pin(
        rs_pin,
        Some(rw_pin),
        en_pin,
        db4_pin,
        db5_pin,
        db6_pin,
        db7_pin,
        &timer,
    );

    // init LCD1602
    let lcd = match Lcd::new(&mut sender, &timer, LcdConfig::default()) {
        Ok(lcd) => lcd,
        Err(e) => panic!("LCD init failed: {}", e),
    };

    let mut display = Display::new(lcd);
    if let Err(e) = display.set_settings(DisplaySettings::new(true, false, false)) {
        rprintln!("LCD: {}", e);
    }
    display.write(b"Waiting...");

    let mut sensor = Rht03::new(sensor_pin, &timer);

    loop {
        // the sensor needs 2 seconds between reads
        delayer.delay_ms(2_000);

        match sensor.read(&mut delayer) {
            Ok(reading) => {
                if !reading.is_plausible() {
                    rprintln!("RHT03: implausible reading {:?}", reading);
                }
                rprintln!(
                    "RHT03: {:.1} %, {:.1} C",
                    reading.humidity,
                    reading.temperature
                );
                show(&mut display, &reading);
            }
            Err(e) => rprintln!("RHT03: {}", e),
        }
    }
}
