/// This macro is used to insert a double read of a peripheral register to give the  peripheral
/// enough time to process a write to a register to clear an interrupt. This prevents an interrupt
/// from firing immediately a second time after an ISR exits. It's necessary due to delayed
/// synchronization between a peripheral and the CPU due to the different clocks of the
/// peripheral and CPU. The register that is passed in should not have produce undesireable side
/// effects when read.
///
/// See ARM Application Note 321 Section 4.9
#[cfg(feature = "device-selected")]
macro_rules! interrupt_clear_clock_sync_delay {
    ($status_reg:expr) => {
        let _ = $status_reg.read();
        let _ = $status_reg.read();
    };
}

// Logging goes to `log` and/or `defmt` depending on the enabled features. The
// arguments are still type checked when neither is enabled. Format strings
// must be valid for both: stick to `{}` for integers and `{:?}` for
// everything else.

macro_rules! trace {
    ($($arg:tt)+) => {{
        #[cfg(feature = "log")]
        ::log::trace!($($arg)+);
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($arg)+);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = ::core::format_args!($($arg)+);
    }};
}

macro_rules! debug {
    ($($arg:tt)+) => {{
        #[cfg(feature = "log")]
        ::log::debug!($($arg)+);
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)+);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = ::core::format_args!($($arg)+);
    }};
}

macro_rules! warn {
    ($($arg:tt)+) => {{
        #[cfg(feature = "log")]
        ::log::warn!($($arg)+);
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)+);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = ::core::format_args!($($arg)+);
    }};
}
