//! Tick engine
//!
//! The engine is split along the two contexts that use it:
//!
//! - [`TickEngine`] belongs to the timer interrupt. It owns the counter and
//!   the output, and nothing outside the interrupt handler can change them.
//! - [`PeriodControl`] belongs to the foreground. It owns the timer's
//!   enable and reload state and is the only way to change the period.
//!
//! No memory is shared between the two. The one shared resource is the timer
//! itself, and [`PeriodControl::reprogram`] stops it before touching its
//! reload value, which keeps the interrupt out for the duration.
//!
//! ```ignore
//! static ENGINE: Mutex<RefCell<Option<TickEngine<Flag<TIM2>, LedMap<2>, Leds, 2>>>> =
//!     Mutex::new(RefCell::new(None));
//!
//! let (timer, flag) = dp.TIM2.periodic();
//! let engine = TickEngine::new(flag, LedMap::new([('A', 5), ('A', 6)]), leds);
//! cortex_m::interrupt::free(|cs| ENGINE.borrow(cs).replace(Some(engine)));
//!
//! let mut control = PeriodControl::new(timer, &clock, 2.secs());
//!
//! #[interrupt]
//! fn TIM2() {
//!     cortex_m::interrupt::free(|cs| {
//!         if let Some(engine) = ENGINE.borrow(cs).borrow_mut().as_mut() {
//!             engine.on_timer_expire();
//!         }
//!     })
//! }
//! ```

use crate::gpio::OutputPort;
use crate::render::Render;
use crate::time::{Hertz, MilliSeconds, Period, SystemClock};
use crate::timer::{PeriodicTimer, TimeoutFlag};

/// Proof that the expiry flag was cleared in the current interrupt
///
/// Only [`TickEngine::on_timer_expire`] can obtain one, and the counter
/// cannot advance without it.
#[derive(Debug)]
pub struct Acknowledged {
    _private: (),
}

impl Acknowledged {
    fn take<F: TimeoutFlag>(flag: &mut F) -> Option<Self> {
        if !flag.is_pending() {
            return None;
        }
        flag.clear();
        Some(Acknowledged { _private: () })
    }
}

/// A `BITS` wide counter that wraps to zero
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Counter<const BITS: u8> {
    value: u8,
}

impl<const BITS: u8> Counter<BITS> {
    const VALID: () =
        assert!(BITS >= 1 && BITS <= 8, "counter width must be 1 to 8 bits");

    /// Number of distinct values
    pub const RANGE: u16 = 1 << BITS;

    const MASK: u8 = (Self::RANGE - 1) as u8;

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID;
        Counter { value: 0 }
    }

    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Steps the counter, returning the new value
    pub fn advance(&mut self, _ack: &Acknowledged) -> u8 {
        self.value = self.value.wrapping_add(1) & Self::MASK;
        self.value
    }
}

impl<const BITS: u8> Default for Counter<BITS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a timer interrupt
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Expiry {
    /// The counter advanced to this value
    Advanced(u8),
    /// No expiry was pending. Nothing changed.
    Spurious,
}

/// Interrupt half of the tick engine
///
/// Advances a `BITS` wide counter on every timer expiry and shows it through
/// `R` on `O`.
pub struct TickEngine<F, R, O, const BITS: u8> {
    flag: F,
    renderer: R,
    output: O,
    counter: Counter<BITS>,
}

impl<F, R, O, const BITS: u8> TickEngine<F, R, O, BITS>
where
    F: TimeoutFlag,
    R: Render,
    O: OutputPort,
{
    /// Creates the engine and shows the initial count of zero
    pub fn new(flag: F, renderer: R, output: O) -> Self {
        let mut engine = TickEngine {
            flag,
            renderer,
            output,
            counter: Counter::new(),
        };
        engine.show(0);
        engine
    }

    /// Timer interrupt handler body
    ///
    /// Clears the expiry flag, advances the counter and shows the new value.
    /// The flag is always cleared before the counter moves, so returning from
    /// the interrupt cannot re-enter it for the same expiry. Runs in bounded
    /// time.
    pub fn on_timer_expire(&mut self) -> Expiry {
        let Some(ack) = Acknowledged::take(&mut self.flag) else {
            warn!("timer interrupt without a pending expiry");
            return Expiry::Spurious;
        };
        let value = self.counter.advance(&ack);
        self.show(value);
        Expiry::Advanced(value)
    }

    /// Current counter value
    pub fn counter(&self) -> u8 {
        self.counter.value()
    }

    fn show(&mut self, value: u8) {
        for write in self.renderer.render(value) {
            self.output.write(write);
        }
    }

    /// Releases the flag, renderer and output
    pub fn free(self) -> (F, R, O) {
        (self.flag, self.renderer, self.output)
    }
}

/// Foreground half of the tick engine
///
/// Owns the timer's enable and reload state. The period can only change
/// through [`PeriodControl::reprogram`].
pub struct PeriodControl<T> {
    timer: T,
    clock: Hertz,
    period: Period,
}

impl<T: PeriodicTimer> PeriodControl<T> {
    /// Configures `timer` as a periodic interrupt source and starts it with
    /// the `initial` period
    ///
    /// `clock` reports the frequency the timer counts at.
    pub fn new<C: SystemClock>(mut timer: T, clock: &C, initial: MilliSeconds) -> Self {
        let clock = clock.system_clock();
        let period = Period::from_duration(initial, clock);

        timer.configure_periodic();
        timer.clear_interrupt_flag();
        timer.listen();

        let mut control = PeriodControl {
            timer,
            clock,
            period,
        };
        control.apply(period);
        control
    }

    /// Changes the timer period
    ///
    /// The timer is stopped, loaded with the new reload value, its expiry
    /// flag cleared and restarted. The interrupt cannot run while the timer
    /// is stopped, and the cleared flag drops the update event raised by the
    /// reload itself, so the counter neither skips nor repeats a step. The
    /// first interval after the change is measured from the restart.
    ///
    /// Returns `false` without touching the timer if `period` is already
    /// active.
    pub fn reprogram(&mut self, period: Period) -> bool {
        if period == self.period {
            trace!("period unchanged at {} ticks", period.ticks());
            return false;
        }
        self.apply(period);
        true
    }

    /// Changes the timer period to the one closest to `duration`
    ///
    /// Durations shorter than two ticks use the minimum period.
    pub fn set_duration(&mut self, duration: MilliSeconds) -> Period {
        let period = Period::from_duration(duration, self.clock);
        self.reprogram(period);
        period
    }

    /// Currently active period
    pub fn period(&self) -> Period {
        self.period
    }

    /// Frequency the timer counts at
    pub fn clock(&self) -> Hertz {
        self.clock
    }

    /// Releases the timer. It keeps running.
    pub fn free(self) -> T {
        self.timer
    }

    fn apply(&mut self, period: Period) {
        self.timer.disable();
        self.timer.set_reload(period.reload());
        self.timer.clear_interrupt_flag();
        self.timer.enable();
        self.period = period;
        debug!("timer period set to {} ticks", period.ticks());
    }
}

#[cfg(test)]
mod tests {
    use fugit::ExtU32;

    use super::*;
    use crate::render::LedMap;
    use crate::sim::{self, run_ticks, SimFlag, SimPorts, TimerOp};
    use crate::time::FixedClock;

    const TWO_BIT: LedMap<2> = LedMap::new([('N', 0), ('N', 1)]);
    const FOUR_BIT: LedMap<4> =
        LedMap::new([('F', 0), ('F', 4), ('N', 0), ('N', 1)]);

    // A 1 kHz timer clock keeps tick counts small
    const CLOCK: FixedClock = FixedClock::new(Hertz::from_raw(1_000));

    fn expire<R: Render, O: OutputPort, const BITS: u8>(
        flag_hw: &std::rc::Rc<core::cell::RefCell<sim::TimerHw>>,
        engine: &mut TickEngine<SimFlag, R, O, BITS>,
    ) -> Expiry {
        flag_hw.borrow_mut().pending = true;
        engine.on_timer_expire()
    }

    #[test]
    fn counter_wraps_at_its_range() {
        assert_eq!(Counter::<1>::RANGE, 2);
        assert_eq!(Counter::<2>::RANGE, 4);
        assert_eq!(Counter::<4>::RANGE, 16);
        assert_eq!(Counter::<8>::RANGE, 256);

        let (_, flag, hw) = sim::timer();
        let mut engine: TickEngine<_, _, _, 2> =
            TickEngine::new(flag, TWO_BIT, SimPorts::new());
        for n in 1..=40u32 {
            assert_eq!(expire(&hw, &mut engine), Expiry::Advanced((n % 4) as u8));
        }

        let (_, flag, hw) = sim::timer();
        let mut engine: TickEngine<_, _, _, 4> =
            TickEngine::new(flag, FOUR_BIT, SimPorts::new());
        for n in 1..=40u32 {
            expire(&hw, &mut engine);
            assert_eq!(u32::from(engine.counter()), n % 16);
        }
    }

    #[test]
    fn one_bit_counter_toggles() {
        let ports = SimPorts::new();
        let (_, flag, hw) = sim::timer();
        let mut engine: TickEngine<_, _, _, 1> =
            TickEngine::new(flag, LedMap::new([('N', 1)]), ports.clone());

        assert_eq!(ports.level('N'), 0);
        expire(&hw, &mut engine);
        assert_eq!(ports.level('N'), 0b10);
        expire(&hw, &mut engine);
        assert_eq!(ports.level('N'), 0);
    }

    #[test]
    fn initial_count_is_shown() {
        let ports = SimPorts::new();
        let (_, flag, _) = sim::timer();
        let engine: TickEngine<_, _, _, 4> =
            TickEngine::new(flag, FOUR_BIT, ports.clone());

        assert_eq!(engine.counter(), 0);
        assert_eq!(ports.writes(), 2);
        assert_eq!(ports.level('F'), 0);
        assert_eq!(ports.level('N'), 0);
    }

    #[test]
    fn expiry_is_rendered() {
        let ports = SimPorts::new();
        let (_, flag, hw) = sim::timer();
        let mut engine: TickEngine<_, _, _, 4> =
            TickEngine::new(flag, FOUR_BIT, ports.clone());

        for _ in 0..0b1011 {
            expire(&hw, &mut engine);
        }
        assert_eq!(ports.level('F'), 0b1_0001);
        assert_eq!(ports.level('N'), 0b10);
    }

    #[test]
    fn flag_is_cleared_before_returning() {
        let (_, flag, hw) = sim::timer();
        let mut engine: TickEngine<_, _, _, 2> =
            TickEngine::new(flag, TWO_BIT, SimPorts::new());

        expire(&hw, &mut engine);
        assert!(!hw.borrow().pending);
        assert_eq!(hw.borrow().isr_clears, 1);
    }

    #[test]
    fn spurious_interrupt_changes_nothing() {
        let ports = SimPorts::new();
        let (_, flag, hw) = sim::timer();
        let mut engine: TickEngine<_, _, _, 2> =
            TickEngine::new(flag, TWO_BIT, ports.clone());
        let writes = ports.writes();

        assert_eq!(engine.on_timer_expire(), Expiry::Spurious);
        assert_eq!(engine.counter(), 0);
        assert_eq!(ports.writes(), writes);
        assert_eq!(hw.borrow().isr_clears, 0);

        // Re-entering for one expiry advances once
        assert_eq!(expire(&hw, &mut engine), Expiry::Advanced(1));
        assert_eq!(engine.on_timer_expire(), Expiry::Spurious);
        assert_eq!(engine.counter(), 1);
    }

    #[test]
    fn start_sequence() {
        let (timer, _, hw) = sim::timer();
        let control = PeriodControl::new(timer, &CLOCK, 2.secs());

        assert_eq!(control.period().ticks(), 2_000);
        assert_eq!(control.clock(), Hertz::from_raw(1_000));

        let hw = hw.borrow();
        assert!(hw.periodic && hw.listening && hw.enabled && !hw.pending);
        assert_eq!(
            hw.ops,
            [
                TimerOp::ConfigurePeriodic,
                TimerOp::Clear,
                TimerOp::Listen,
                TimerOp::Disable,
                TimerOp::SetReload(1_999),
                TimerOp::Clear,
                TimerOp::Enable,
            ]
        );
    }

    #[test]
    fn reprogram_stops_the_timer_around_the_reload() {
        let (timer, _, hw) = sim::timer();
        let mut control = PeriodControl::new(timer, &CLOCK, 2.secs());
        hw.borrow_mut().ops.clear();

        assert!(control.reprogram(Period::from_ticks(500)));
        assert_eq!(
            hw.borrow().ops,
            [
                TimerOp::Disable,
                TimerOp::SetReload(499),
                TimerOp::Clear,
                TimerOp::Enable,
            ]
        );
        assert!(!hw.borrow().pending);
    }

    #[test]
    fn reprogram_to_the_active_period_is_a_no_op() {
        let (timer, _, hw) = sim::timer();
        let mut control = PeriodControl::new(timer, &CLOCK, 1.secs());
        hw.borrow_mut().ops.clear();

        assert!(!control.reprogram(Period::from_ticks(1_000)));
        assert_eq!(control.set_duration(1_000.millis()).ticks(), 1_000);
        assert!(hw.borrow().ops.is_empty());
    }

    #[test]
    fn set_duration_clamps_to_the_minimum() {
        let (timer, _, hw) = sim::timer();
        let mut control = PeriodControl::new(timer, &CLOCK, 1.secs());

        assert_eq!(control.set_duration(0.millis()), Period::MIN);
        assert_eq!(hw.borrow().reloads().last(), Some(&1));
    }

    #[test]
    fn ticks_arrive_once_per_period() {
        let (timer, flag, hw) = sim::timer();
        let mut engine: TickEngine<_, _, _, 4> =
            TickEngine::new(flag, FOUR_BIT, SimPorts::new());
        let _control = PeriodControl::new(timer, &CLOCK, 10.millis());

        assert_eq!(run_ticks(&hw, &mut engine, 9), 0);
        assert_eq!(run_ticks(&hw, &mut engine, 1), 1);
        assert_eq!(run_ticks(&hw, &mut engine, 100), 10);
        assert_eq!(engine.counter(), 11);
    }

    #[test]
    fn reprogram_neither_skips_nor_repeats() {
        let (timer, flag, hw) = sim::timer();
        let mut engine: TickEngine<_, _, _, 4> =
            TickEngine::new(flag, FOUR_BIT, SimPorts::new());
        let mut control = PeriodControl::new(timer, &CLOCK, 10.millis());

        for phase in [0, 1, 5, 9, 10] {
            let before = engine.counter();
            // The expiry landing on the last tick is handled before the
            // foreground gets to reprogram
            let handled = run_ticks(&hw, &mut engine, phase);
            let after_run = engine.counter();
            assert_eq!(after_run, (before + handled as u8) % 16);

            let period = if control.period().ticks() == 10 { 7 } else { 10 };
            control.reprogram(Period::from_ticks(period));

            // The reload's own update event is dropped, not counted
            assert!(!hw.borrow().pending);
            assert_eq!(engine.on_timer_expire(), Expiry::Spurious);
            assert_eq!(engine.counter(), after_run);

            // The next tick comes one full new period after the change
            assert_eq!(run_ticks(&hw, &mut engine, period - 1), 0);
            assert_eq!(run_ticks(&hw, &mut engine, 1), 1);
            assert_eq!(engine.counter(), (after_run + 1) % 16);
        }
    }
}
