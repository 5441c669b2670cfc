//! Delay providers and the foreground spin
//!
//! [`spin_until`] is the one place the foreground busy-waits: it polls a
//! condition at a fixed step until it holds or a timeout runs out. Any
//! [`DelayNs`] implementation can pace it, for example the SysTick based
//! [`Delay`].
//!
//! ```ignore
//! let mut delay = Delay::new(cp.SYST, &clock);
//!
//! // Wait up to 10 ms for the button to be released
//! let released = spin_until(&mut delay, 10_000, 500, || button.is_high())?;
//! ```

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use embedded_hal::delay::DelayNs;
use fugit::SecsDurationU64;

use crate::time::SystemClock;

const SYSTICK_HCLK_DIV: u32 = 8;

/// Polls `condition` every `step_us` microseconds until it returns `true` or
/// `timeout_us` microseconds have passed
///
/// The condition is sampled immediately and once more when the timeout runs
/// out, so a timeout of zero still samples once. Returns the microseconds
/// spent waiting when the condition was met, `None` on timeout. Errors from
/// the condition end the spin.
pub fn spin_until<D, E, F>(
    delay: &mut D,
    timeout_us: u32,
    step_us: u32,
    mut condition: F,
) -> Result<Option<u32>, E>
where
    D: DelayNs,
    F: FnMut() -> Result<bool, E>,
{
    let step_us = step_us.max(1);
    let mut elapsed = 0;
    loop {
        if condition()? {
            return Ok(Some(elapsed));
        }
        if elapsed >= timeout_us {
            return Ok(None);
        }
        let wait = step_us.min(timeout_us - elapsed);
        delay.delay_us(wait);
        elapsed += wait;
    }
}

pub trait DelayExt {
    fn delay<C: SystemClock>(self, clock: &C) -> Delay;
}

impl DelayExt for SYST {
    fn delay<C: SystemClock>(self, clock: &C) -> Delay {
        Delay::new(self, clock)
    }
}

/// System timer (SysTick) as a delay provider
pub struct Delay {
    hclk_hz: u32,
    syst: SYST,
}

fn calc_rvr(ns: u32, hclk: u32) -> u32 {
    // Default is for SYSTICK to be fed by HCLK/8
    let ticks: u64 = (SecsDurationU64::secs(1) * SYSTICK_HCLK_DIV).to_nanos();
    ((ns as u64 * hclk as u64) / ticks) as u32
}

impl Delay {
    /// Configures the system timer (SysTick) as a delay provider
    ///
    /// `clock` reports the core clock (HCLK).
    pub fn new<C: SystemClock>(mut syst: SYST, clock: &C) -> Self {
        syst.set_clock_source(SystClkSource::External);

        Delay {
            hclk_hz: clock.system_clock().raw(),
            syst,
        }
    }

    /// Releases the system timer (SysTick) resource
    pub fn free(self) -> SYST {
        self.syst
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        // The SysTick Reload Value register supports values between 1 and 0x00FFFFFF.
        const MAX_RVR: u32 = 0x00FF_FFFF;

        let mut total_rvr = calc_rvr(ns, self.hclk_hz);

        while total_rvr != 0 {
            let current_rvr = if total_rvr <= MAX_RVR {
                total_rvr
            } else {
                MAX_RVR
            };

            self.syst.set_reload(current_rvr);
            self.syst.clear_current();
            self.syst.enable_counter();

            // Update the tracking variable while we are waiting...
            total_rvr -= current_rvr;

            while !self.syst.has_wrapped() {}

            self.syst.disable_counter();
        }
    }
}
