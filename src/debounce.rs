//! Button debouncing
//!
//! A [`Debouncer`] turns the raw level of a push button into confirmed
//! [`Edge`]s. A change is only confirmed once the button has been seen in the
//! new state over a whole settle window, re-sampled every sample step. Any
//! sample that reverts inside the window rejects the change.
//!
//! ```ignore
//! let button = Input::<'C', 13>::new(Pull::Down)?;
//! let mut debouncer = Debouncer::new(button, Config::hold_recheck().active_high());
//!
//! loop {
//!     if let Some(edge) = debouncer.poll(&mut delay)? {
//!         // ...
//!     }
//! }
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::config::{ActiveLevel, Config, Policy};
use crate::delay::spin_until;

/// A confirmed change of the button state
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Pressed,
    Released,
}

/// Debounced push button
pub struct Debouncer<P> {
    pin: P,
    config: Config,
    pressed: bool,
    // A reported press whose release has not been waited for yet
    release_pending: bool,
}

impl<P: InputPin> Debouncer<P> {
    /// The button is assumed released until a press is confirmed
    pub fn new(pin: P, config: Config) -> Self {
        Debouncer {
            pin,
            config,
            pressed: false,
            release_pending: false,
        }
    }

    /// Reads the button once, without debouncing
    pub fn sample(&mut self) -> Result<bool, P::Error> {
        let high = self.pin.is_high()?;
        Ok(high == (self.config.active == ActiveLevel::High))
    }

    /// Samples the button and reports a confirmed edge, if any
    ///
    /// Returns at once when the button has not changed. Otherwise busy-waits
    /// on `delay` for the settle window.
    ///
    /// With [`Policy::ReleaseStall`] a press is reported as soon as it is
    /// confirmed, and the next call busy-waits for the release that follows
    /// it. That call never reports an edge.
    pub fn poll<D: DelayNs>(&mut self, delay: &mut D) -> Result<Option<Edge>, P::Error> {
        if core::mem::take(&mut self.release_pending) {
            if let Policy::ReleaseStall { release_timeout } = self.config.policy {
                self.stall(delay, release_timeout.ticks())?;
            }
            return Ok(None);
        }

        let now = self.sample()?;
        if now == self.pressed {
            return Ok(None);
        }
        if let Some(after) = self.reversal(delay, now)? {
            trace!("bounce rejected after {} us", after);
            return Ok(None);
        }
        self.pressed = now;

        let edge = match (self.config.policy, now) {
            (Policy::Hold, true) => Edge::Pressed,
            (Policy::Hold, false) => Edge::Released,
            (Policy::ReleaseStall { .. }, true) => {
                self.release_pending = true;
                Edge::Pressed
            }
            // Release outlasted the stall
            (Policy::ReleaseStall { .. }, false) => return Ok(None),
        };
        debug!("button {:?}", edge);
        Ok(Some(edge))
    }

    /// Confirmed button state
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Debounce configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Releases the input pin
    pub fn free(self) -> P {
        self.pin
    }

    /// Holds for the settle window, sampling every step. Returns when the
    /// button left `state`, or `None` if it stayed there throughout.
    fn reversal<D: DelayNs>(
        &mut self,
        delay: &mut D,
        state: bool,
    ) -> Result<Option<u32>, P::Error> {
        let settle = self.config.settle.ticks();
        let step = self.config.sample_step.ticks();
        spin_until(delay, settle, step, || Ok(self.sample()? != state))
    }

    /// Waits for the button to be released and settled, for at most
    /// `timeout_us`
    fn stall<D: DelayNs>(&mut self, delay: &mut D, timeout_us: u32) -> Result<(), P::Error> {
        let step = self.config.sample_step.ticks().max(1);
        let mut waited: u32 = 0;

        loop {
            let remaining = timeout_us.saturating_sub(waited);
            let released =
                spin_until(delay, remaining, step, || self.sample().map(|pressed| !pressed))?;
            let Some(after) = released else {
                warn!("button still held after {} us", timeout_us);
                return Ok(());
            };
            waited = waited.saturating_add(after);

            match self.reversal(delay, false)? {
                None => {
                    self.pressed = false;
                    return Ok(());
                }
                Some(after) => waited = waited.saturating_add(after.max(step)),
            }
        }
    }
}
