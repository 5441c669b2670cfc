//! Time units and timer periods

pub use fugit::{
    HertzU32 as Hertz, MicrosDurationU32 as MicroSeconds, MillisDurationU32 as MilliSeconds,
};

/// Smallest tick count a [`Period`] can hold.
///
/// Reload registers are loaded with `ticks - 1`, so anything below two ticks
/// would leave a zero (or wrapped) reload value.
pub const MIN_PERIOD_TICKS: u32 = 2;

/// Source of the frequency the periodic timer counts at
///
/// Clock tree configuration is outside this crate. Whatever brought the
/// clocks up only has to report the resulting timer input frequency.
pub trait SystemClock {
    /// Frequency of the timer input clock
    fn system_clock(&self) -> Hertz;
}

/// A clock whose frequency is known up front
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedClock(Hertz);

impl FixedClock {
    pub const fn new(frequency: Hertz) -> Self {
        FixedClock(frequency)
    }
}

impl SystemClock for FixedClock {
    fn system_clock(&self) -> Hertz {
        self.0
    }
}

/// Number of timer ticks between two expiries
///
/// Always at least [`MIN_PERIOD_TICKS`]. Conversions from a duration round
/// down to whole ticks and saturate at `u32::MAX`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Period {
    ticks: u32,
}

impl Period {
    /// The shortest representable period
    pub const MIN: Period = Period {
        ticks: MIN_PERIOD_TICKS,
    };

    /// The longest representable period
    pub const MAX: Period = Period { ticks: u32::MAX };

    /// Period of `ticks` timer ticks, clamped to [`Period::MIN`]
    pub const fn from_ticks(ticks: u32) -> Self {
        if ticks < MIN_PERIOD_TICKS {
            Self::MIN
        } else {
            Period { ticks }
        }
    }

    /// Period closest to (and not longer than) `duration` at `clock`
    ///
    /// ```
    /// use tick_engine::time::{Hertz, MilliSeconds, Period};
    ///
    /// let period = Period::from_duration(MilliSeconds::millis(500), Hertz::MHz(120));
    /// assert_eq!(period.ticks(), 60_000_000);
    /// assert_eq!(period.reload(), 59_999_999);
    /// ```
    pub fn from_duration<const NOM: u32, const DENOM: u32>(
        duration: fugit::Duration<u32, NOM, DENOM>,
        clock: Hertz,
    ) -> Self {
        Self::from_ticks(duration_to_ticks(
            duration.ticks(),
            NOM,
            DENOM,
            clock.raw(),
        ))
    }

    /// Tick count of this period
    pub const fn ticks(self) -> u32 {
        self.ticks
    }

    /// Value for a reload register that counts `reload..=0`
    pub const fn reload(self) -> u32 {
        self.ticks - 1
    }
}

/// `ticks * NOM / DENOM` seconds at `clk` Hz, rounded down, saturating
fn duration_to_ticks(ticks: u32, nom: u32, denom: u32, clk: u32) -> u32 {
    let scaled =
        u128::from(clk) * u128::from(ticks) * u128::from(nom) / u128::from(denom);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
