/*!
# LCD 1602 + RHT03 Driver

Bit-banged drivers for an LCD1602 character display (HD44780 / TC1602A family)
and an RHT03 (DHT22) humidity / temperature sensor, timed by one free-running
tick counter.

Basic Usage:

1. Wrap your hardware counter in a [`timer::Timer`] <br/>
    Implement [`timer::TickCounter`] for a free-running counter with a known frequency.
    Both drivers borrow the same [`timer::Timer`].
<br/>
<br/>
2. Read the sensor with [`sensor::Rht03::read()`] <br/>
    The sensor pin must be open-drain with a pull-up.
<br/>
<br/>
3. Initialize a "sender" <br/>
    This crate includes a 4-pin/8-pin parallel driver [`sender::ParallelSender`],
    or you can use any driver implementing [`sender::SendCommand`].
<br/>
<br/>
4. Use [`lcd::Lcd::new()`] to create a [`lcd::Lcd`], and initialize LCD1602 hardware
<br/>
<br/>
5. Use any methods provided by [`lcd::Lcd`] to control LCD1602,
   or wrap it in a [`display::Display`] for cached state and bounds checked cursor moves

Diagnostics go through the [`log`](https://docs.rs/log) facade; no logger is installed by this crate.
*/

#![no_std]
#![warn(missing_docs)]

pub mod command;
pub mod display;
pub mod error;
pub mod lcd;
pub mod sender;
pub mod sensor;
mod state;
pub mod timer;
pub mod utils;

#[cfg(test)]
mod testing;
