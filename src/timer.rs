//! Free-running tick counter, and the busy-wait delays built on top of it
//!
//! Both drivers of this crate share one [`Timer`] by reference. Waits are
//! spins on the counter, never yields: a single scheduler quantum is longer
//! than a whole sensor bit.
//!
//! Elapsed time is always computed with wrapping subtraction, so a counter
//! that overflows in the middle of a measurement still gives the right answer.

use embedded_hal::delay::DelayNs;

/// A free-running hardware counter with a fixed frequency
///
/// Reading and resetting a timer register does not need exclusive access,
/// so both methods take `&self`.
pub trait TickCounter {
    /// Counter frequency in Hz (10 MHz, i.e. 100 ns per tick, on the reference board)
    const TICK_HZ: u32;

    /// Current counter value, wraps at `u32::MAX`
    fn ticks(&self) -> u32;

    /// Put the counter back to zero
    fn reset(&self);
}

/// Delay and measurement primitive over a [`TickCounter`]
pub struct Timer<C: TickCounter> {
    counter: C,
}

impl<C: TickCounter> Timer<C> {
    /// Wrap a running counter
    pub const fn new(counter: C) -> Self {
        Self { counter }
    }

    /// Give the counter back
    pub fn free(self) -> C {
        self.counter
    }

    /// Counter value, no side effect
    pub fn elapsed_ticks(&self) -> u32 {
        self.counter.ticks()
    }

    /// Reset the counter, then spin until it reaches `ticks`
    ///
    /// Never times out on its own. Callers that need a timeout poll
    /// [`Timer::elapsed_ticks`] (or a [`Deadline`]) instead.
    pub fn reset_and_wait(&self, ticks: u32) {
        self.counter.reset();
        while self.counter.ticks() < ticks {}
    }

    /// Spin for at least `ns` nanoseconds (rounded up to whole ticks)
    pub fn wait_ns(&self, ns: u32) {
        self.reset_and_wait(Self::ticks_from_ns(ns));
    }

    /// Spin for at least `us` microseconds
    pub fn wait_us(&self, us: u32) {
        self.reset_and_wait(Self::ticks_from_us(us));
    }

    /// Number of ticks covering `ns` nanoseconds, rounded up
    pub fn ticks_from_ns(ns: u32) -> u32 {
        let ticks = (ns as u64 * C::TICK_HZ as u64).div_ceil(1_000_000_000);
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    /// Number of ticks covering `us` microseconds, rounded up
    pub fn ticks_from_us(us: u32) -> u32 {
        let ticks = (us as u64 * C::TICK_HZ as u64).div_ceil(1_000_000);
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    /// Whole microseconds in `ticks`, rounded down
    pub fn us_from_ticks(ticks: u32) -> u32 {
        (ticks as u64 * 1_000_000 / C::TICK_HZ as u64) as u32
    }

    /// Start a deadline `us` microseconds from now
    ///
    /// The deadline measures from the current counter value, so it is only
    /// meaningful as long as nobody resets the counter in the meantime.
    pub fn deadline_us(&self, us: u32) -> Deadline<'_, C> {
        Deadline {
            timer: self,
            start: self.elapsed_ticks(),
            budget: Self::ticks_from_us(us),
        }
    }
}

impl<C: TickCounter> DelayNs for Timer<C> {
    fn delay_ns(&mut self, ns: u32) {
        self.wait_ns(ns);
    }
}

/// A time budget started at a given counter value
pub struct Deadline<'t, C: TickCounter> {
    timer: &'t Timer<C>,
    start: u32,
    budget: u32,
}

impl<C: TickCounter> Deadline<'_, C> {
    /// Ticks since the deadline was started
    pub fn elapsed_ticks(&self) -> u32 {
        self.timer.elapsed_ticks().wrapping_sub(self.start)
    }

    /// Whether more than the budget has passed
    pub fn expired(&self) -> bool {
        self.elapsed_ticks() > self.budget
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use core::cell::Cell;

    use super::TickCounter;

    /// 10 MHz counter that moves `step` ticks every time it is read
    pub(crate) struct StepCounter {
        now: Cell<u32>,
        step: u32,
    }

    impl StepCounter {
        pub(crate) fn new(step: u32) -> Self {
            Self::starting_at(0, step)
        }

        pub(crate) fn starting_at(now: u32, step: u32) -> Self {
            Self {
                now: Cell::new(now),
                step,
            }
        }
    }

    impl TickCounter for StepCounter {
        const TICK_HZ: u32 = 10_000_000;

        fn ticks(&self) -> u32 {
            let now = self.now.get();
            self.now.set(now.wrapping_add(self.step));
            now
        }

        fn reset(&self) {
            self.now.set(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::StepCounter;
    use super::*;

    type T = Timer<StepCounter>;

    #[test]
    fn conversions_at_ten_megahertz() {
        assert_eq!(T::ticks_from_us(1), 10);
        assert_eq!(T::ticks_from_us(1000), 10_000);
        // 30 ns is less than one tick, still costs a whole one
        assert_eq!(T::ticks_from_ns(30), 1);
        assert_eq!(T::ticks_from_ns(150), 2);
        assert_eq!(T::ticks_from_ns(0), 0);
        assert_eq!(T::us_from_ticks(609), 60);
    }

    #[test]
    fn huge_delays_saturate() {
        assert_eq!(T::ticks_from_us(u32::MAX), u32::MAX);
    }

    #[test]
    fn reset_and_wait_spins_until_target() {
        let timer = Timer::new(StepCounter::starting_at(12_345, 1));
        timer.reset_and_wait(40);
        // reset to 0, then read 0..=40 before leaving
        assert_eq!(timer.elapsed_ticks(), 41);
    }

    #[test]
    fn deadline_tolerates_counter_wrap() {
        let timer = Timer::new(StepCounter::starting_at(u32::MAX - 15, 10));
        let deadline = timer.deadline_us(3);
        assert_eq!(deadline.elapsed_ticks(), 10);
        // this read has wrapped past zero
        assert!(!deadline.expired());
        assert!(!deadline.expired());
        assert!(deadline.expired());
    }

    #[test]
    fn timer_is_a_delay_provider() {
        fn sleep(delay: &mut impl DelayNs) {
            delay.delay_us(5);
        }

        let mut timer = Timer::new(StepCounter::new(1));
        sleep(&mut timer);
        assert_eq!(timer.elapsed_ticks(), 51);
    }
}
