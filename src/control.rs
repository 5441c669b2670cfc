//! Foreground reconfiguration loop
//!
//! A [`Reconfigurator`] owns the foreground half of the tick engine. It polls
//! a debounced button, asks its [`Schedule`] for the period that goes with
//! each confirmed edge and reprograms the timer.
//!
//! ```ignore
//! let debouncer = Debouncer::new(button, Config::release_stall());
//! let control = PeriodControl::new(timer, &clock, 2.secs());
//! let mut reconfigurator = Reconfigurator::new(debouncer, Cycle::halving(), control);
//!
//! match reconfigurator.run(&mut delay) {
//!     Ok(never) => match never {},
//!     Err(e) => panic!("{:?}", e),
//! }
//! ```

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::debounce::Debouncer;
use crate::schedule::Schedule;
use crate::tick::PeriodControl;
use crate::time::Period;
use crate::timer::PeriodicTimer;

/// Drives a [`PeriodControl`] from a debounced button and a [`Schedule`]
pub struct Reconfigurator<P, S, T> {
    debouncer: Debouncer<P>,
    schedule: S,
    control: PeriodControl<T>,
}

impl<P, S, T> Reconfigurator<P, S, T>
where
    P: InputPin,
    S: Schedule,
    T: PeriodicTimer,
{
    /// Switches the timer to the schedule's initial period
    pub fn new(debouncer: Debouncer<P>, schedule: S, mut control: PeriodControl<T>) -> Self {
        control.set_duration(schedule.initial());
        Reconfigurator {
            debouncer,
            schedule,
            control,
        }
    }

    /// Polls the button once
    ///
    /// Returns the new period when a confirmed edge changed it.
    pub fn poll<D: DelayNs>(&mut self, delay: &mut D) -> Result<Option<Period>, P::Error> {
        let Some(edge) = self.debouncer.poll(delay)? else {
            return Ok(None);
        };
        let Some(duration) = self.schedule.on_edge(edge) else {
            return Ok(None);
        };
        let period = Period::from_duration(duration, self.control.clock());
        if !self.control.reprogram(period) {
            return Ok(None);
        }
        debug!("{:?} switched the period to {} ms", edge, duration.ticks());
        Ok(Some(period))
    }

    /// Polls the button forever, idling for the configured poll interval in
    /// between
    ///
    /// Only returns if reading the button fails.
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> Result<Infallible, P::Error> {
        let idle = self.debouncer.config().poll_interval.ticks();
        loop {
            self.poll(delay)?;
            delay.delay_us(idle);
        }
    }

    /// Currently active period
    pub fn period(&self) -> Period {
        self.control.period()
    }

    /// The period schedule
    pub fn schedule(&self) -> &S {
        &self.schedule
    }

    /// The debounced button
    pub fn debouncer(&self) -> &Debouncer<P> {
        &self.debouncer
    }

    /// Releases the debouncer, the schedule and the period control
    pub fn free(self) -> (Debouncer<P>, S, PeriodControl<T>) {
        (self.debouncer, self.schedule, self.control)
    }
}
