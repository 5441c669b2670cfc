//! Debounce and polling configuration

use crate::time::MicroSeconds;

/// Raw input level that means "pressed"
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveLevel {
    /// Button to ground with a pull-up
    Low,
    /// Button to the supply with a pull-down
    High,
}

/// How confirmed button edges are reported
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Policy {
    /// Every change of the button state is confirmed by holding it for the
    /// settle window. Both press and release edges are reported.
    Hold,
    /// Press edges are confirmed like [`Policy::Hold`], then the foreground
    /// stalls until the button has been released and settled, for at most
    /// `release_timeout`. Only press edges are reported.
    ReleaseStall { release_timeout: MicroSeconds },
}

/// A structure for specifying the debounce configuration.
///
/// This structure uses builder semantics to generate the configuration.
///
/// ```
/// use tick_engine::config::{Config, Policy};
/// use tick_engine::time::MicroSeconds;
///
/// let config = Config::hold_recheck()
///     .settle(MicroSeconds::millis(20))
///     .active_high();
/// assert_eq!(config.policy(), Policy::Hold);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub(crate) settle: MicroSeconds,
    pub(crate) sample_step: MicroSeconds,
    pub(crate) poll_interval: MicroSeconds,
    pub(crate) policy: Policy,
    pub(crate) active: ActiveLevel,
}

impl Config {
    /// Create a configuration for the given policy
    ///
    /// Defaults: 10 ms settle window, the button re-sampled every 500 us while
    /// settling, 1 ms between polls, active low.
    pub const fn new(policy: Policy) -> Self {
        Config {
            settle: MicroSeconds::millis(10),
            sample_step: MicroSeconds::micros(500),
            poll_interval: MicroSeconds::millis(1),
            policy,
            active: ActiveLevel::Low,
        }
    }

    /// Report presses and releases, each confirmed over 5 ms
    pub const fn hold_recheck() -> Self {
        Self::new(Policy::Hold).settle(MicroSeconds::millis(5))
    }

    /// Report presses only and wait up to 5 s for each release, confirmed
    /// over 10 ms
    pub const fn release_stall() -> Self {
        Self::new(Policy::ReleaseStall {
            release_timeout: MicroSeconds::secs(5),
        })
    }

    /// Time the button must stay in a new state before it is confirmed
    #[must_use]
    pub const fn settle(mut self, settle: MicroSeconds) -> Self {
        self.settle = settle;
        self
    }

    /// Interval between samples while settling or stalling
    ///
    /// Note:
    /// * Zero is treated as one microsecond.
    #[must_use]
    pub const fn sample_step(mut self, step: MicroSeconds) -> Self {
        self.sample_step = step;
        self
    }

    /// Idle time between two polls of the run loop
    #[must_use]
    pub const fn poll_interval(mut self, interval: MicroSeconds) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Replace the edge reporting policy
    #[must_use]
    pub const fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// The button reads high while pressed
    #[must_use]
    pub const fn active_high(mut self) -> Self {
        self.active = ActiveLevel::High;
        self
    }

    /// The button reads low while pressed. This is the default.
    #[must_use]
    pub const fn active_low(mut self) -> Self {
        self.active = ActiveLevel::Low;
        self
    }

    pub const fn policy(&self) -> Policy {
        self.policy
    }

    pub const fn active_level(&self) -> ActiveLevel {
        self.active
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::release_stall()
    }
}

impl From<Policy> for Config {
    fn from(policy: Policy) -> Self {
        Self::new(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let hold = Config::hold_recheck();
        assert_eq!(hold.policy(), Policy::Hold);
        assert_eq!(hold.settle.to_millis(), 5);
        assert_eq!(hold.active_level(), ActiveLevel::Low);

        let stall = Config::release_stall();
        assert_eq!(stall.settle.to_millis(), 10);
        assert_eq!(
            stall.policy(),
            Policy::ReleaseStall {
                release_timeout: MicroSeconds::secs(5)
            }
        );
        assert_eq!(Config::default(), stall);
    }

    #[test]
    fn builder_overrides() {
        let config = Config::from(Policy::Hold)
            .sample_step(MicroSeconds::micros(250))
            .poll_interval(MicroSeconds::millis(2))
            .active_high();
        assert_eq!(config.sample_step.ticks(), 250);
        assert_eq!(config.poll_interval.ticks(), 2_000);
        assert_eq!(config.active_level(), ActiveLevel::High);
        assert_eq!(config.active_low().active_level(), ActiveLevel::Low);
    }
}
