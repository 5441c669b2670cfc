//! Simulated hardware for the unit tests
//!
//! Time is a shared microsecond clock that only moves when a [`SimDelay`]
//! waits. The timer counts in its own ticks and is stepped explicitly.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::collections::BTreeMap;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin};

use crate::gpio::{OutputPort, PortWrite};
use crate::render::Render;
use crate::tick::TickEngine;
use crate::timer::{PeriodicTimer, TimeoutFlag};

/// Shared simulated time, in nanoseconds
#[derive(Clone, Default)]
pub struct SimClock {
    now_ns: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_us(&self) -> u64 {
        self.now_ns.get() / 1_000
    }

    pub fn advance_us(&self, us: u64) {
        self.now_ns.set(self.now_ns.get() + us * 1_000);
    }
}

/// Moves the simulated clock instead of waiting
pub struct SimDelay {
    clock: SimClock,
}

impl SimDelay {
    pub fn new(clock: &SimClock) -> Self {
        SimDelay {
            clock: clock.clone(),
        }
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        let now = &self.clock.now_ns;
        now.set(now.get() + u64::from(ns));
    }
}

/// A push button with a scripted raw level over time
#[derive(Clone)]
pub struct SimButton {
    clock: SimClock,
    /// Raw level while pressed
    pressed_high: bool,
    /// `(from_us, pressed)`, sorted by time
    script: Vec<(u64, bool)>,
}

impl SimButton {
    /// Button to ground with a pull-up: reads low while pressed
    pub fn active_low(clock: &SimClock) -> Self {
        SimButton {
            clock: clock.clone(),
            pressed_high: false,
            script: Vec::new(),
        }
    }

    /// Button to the supply with a pull-down: reads high while pressed
    pub fn active_high(clock: &SimClock) -> Self {
        SimButton {
            pressed_high: true,
            ..Self::active_low(clock)
        }
    }

    fn at(mut self, at_us: u64, pressed: bool) -> Self {
        self.script.push((at_us, pressed));
        self.script.sort_by_key(|&(at, _)| at);
        self
    }

    pub fn press_at(self, at_us: u64) -> Self {
        self.at(at_us, true)
    }

    pub fn release_at(self, at_us: u64) -> Self {
        self.at(at_us, false)
    }

    /// Contact chatter: the level flips every `every_us` from `from_us`,
    /// then settles on `settled` at `until_us`
    pub fn chatter(
        mut self,
        from_us: u64,
        until_us: u64,
        every_us: u64,
        settled: bool,
    ) -> Self {
        let mut pressed = !settled;
        let mut at = from_us;
        while at < until_us {
            self = self.at(at, pressed);
            pressed = !pressed;
            at += every_us;
        }
        self.at(until_us, settled)
    }

    fn pressed_now(&self) -> bool {
        let now = self.clock.now_us();
        self.script
            .iter()
            .rev()
            .find(|&&(at, _)| at <= now)
            .map_or(false, |&(_, pressed)| pressed)
    }
}

impl ErrorType for SimButton {
    type Error = Infallible;
}

impl InputPin for SimButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pressed_now() == self.pressed_high)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerOp {
    ConfigurePeriodic,
    SetReload(u32),
    Enable,
    Disable,
    Clear,
    Listen,
}

/// State of a simulated down-counting periodic timer
#[derive(Debug, Default)]
pub struct TimerHw {
    pub periodic: bool,
    pub enabled: bool,
    pub listening: bool,
    pub reload: u32,
    pub count: u32,
    pub pending: bool,
    /// Foreground operations, in order
    pub ops: Vec<TimerOp>,
    /// Flag clears done from the interrupt side
    pub isr_clears: usize,
}

impl TimerHw {
    /// One timer input tick. Returns whether an expiry latched.
    pub fn tick(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        if self.count == 0 {
            self.count = self.reload;
            self.pending = true;
            true
        } else {
            self.count -= 1;
            false
        }
    }

    /// Reload values written so far
    pub fn reloads(&self) -> Vec<u32> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                TimerOp::SetReload(reload) => Some(*reload),
                _ => None,
            })
            .collect()
    }
}

/// Foreground half of the simulated timer
pub struct SimTimer {
    hw: Rc<RefCell<TimerHw>>,
}

/// Interrupt half of the simulated timer
pub struct SimFlag {
    hw: Rc<RefCell<TimerHw>>,
}

/// A simulated timer, its two halves and a handle on its state
pub fn timer() -> (SimTimer, SimFlag, Rc<RefCell<TimerHw>>) {
    let hw = Rc::new(RefCell::new(TimerHw::default()));
    (
        SimTimer { hw: hw.clone() },
        SimFlag { hw: hw.clone() },
        hw,
    )
}

impl PeriodicTimer for SimTimer {
    fn configure_periodic(&mut self) {
        let mut hw = self.hw.borrow_mut();
        hw.enabled = false;
        hw.periodic = true;
        hw.ops.push(TimerOp::ConfigurePeriodic);
    }

    // Loading the reload value raises an update event, which latches the
    // expiry flag like timers without update request filtering do
    fn set_reload(&mut self, reload: u32) {
        let mut hw = self.hw.borrow_mut();
        assert!(!hw.enabled, "reload written while the timer runs");
        hw.reload = reload;
        hw.count = reload;
        hw.pending = true;
        hw.ops.push(TimerOp::SetReload(reload));
    }

    fn enable(&mut self) {
        let mut hw = self.hw.borrow_mut();
        hw.enabled = true;
        hw.ops.push(TimerOp::Enable);
    }

    fn disable(&mut self) {
        let mut hw = self.hw.borrow_mut();
        hw.enabled = false;
        hw.ops.push(TimerOp::Disable);
    }

    fn clear_interrupt_flag(&mut self) {
        let mut hw = self.hw.borrow_mut();
        hw.pending = false;
        hw.ops.push(TimerOp::Clear);
    }

    fn listen(&mut self) {
        let mut hw = self.hw.borrow_mut();
        hw.listening = true;
        hw.ops.push(TimerOp::Listen);
    }
}

impl TimeoutFlag for SimFlag {
    fn is_pending(&self) -> bool {
        self.hw.borrow().pending
    }

    fn clear(&mut self) {
        let mut hw = self.hw.borrow_mut();
        hw.pending = false;
        hw.isr_clears += 1;
    }
}

/// Steps the timer `ticks` times and runs the interrupt handler whenever an
/// expiry latches while interrupts are listened to. Returns the number of
/// handler invocations.
pub fn run_ticks<R, O, const BITS: u8>(
    hw: &Rc<RefCell<TimerHw>>,
    engine: &mut TickEngine<SimFlag, R, O, BITS>,
    ticks: u32,
) -> u32
where
    R: Render,
    O: OutputPort,
{
    let mut handled = 0;
    for _ in 0..ticks {
        let fire = {
            let mut hw = hw.borrow_mut();
            hw.tick() && hw.listening
        };
        if fire {
            engine.on_timer_expire();
            handled += 1;
        }
    }
    handled
}

/// GPIO ports that remember their output levels
#[derive(Clone, Default)]
pub struct SimPorts {
    levels: Rc<RefCell<BTreeMap<char, u16>>>,
    writes: Rc<Cell<usize>>,
}

impl SimPorts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, port: char) -> u16 {
        self.levels.borrow().get(&port).copied().unwrap_or(0)
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl OutputPort for SimPorts {
    fn write(&mut self, write: PortWrite) {
        let mut levels = self.levels.borrow_mut();
        let level = levels.entry(write.port).or_insert(0);
        *level = (*level & !write.mask) | write.level;
        self.writes.set(self.writes.get() + 1);
    }
}
