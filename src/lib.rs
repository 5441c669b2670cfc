//! Interrupt-driven periodic tick engine with debounced period reconfiguration
//!
//! A hardware timer advances a bounded counter from its interrupt handler and
//! renders it to LEDs. The foreground loop watches a button, debounces it and
//! reprograms the timer period while the interrupt keeps running.
//!
//! The crate is split along the two execution contexts:
//!
//! - [`tick::TickEngine`] lives in interrupt context. It owns the counter and
//!   the output, and is driven by [`tick::TickEngine::on_timer_expire`].
//! - [`tick::PeriodControl`] lives in the foreground. It is the only way to
//!   change the timer period, see [`tick::PeriodControl::reprogram`].
//! - [`control::Reconfigurator`] ties a [`debounce::Debouncer`] and a
//!   [`schedule::Schedule`] to the [`tick::PeriodControl`].
//!
//! Hardware is reached through the traits in [`gpio`], [`timer`] and
//! [`time`]. With one of the device features enabled (`stm32h503`,
//! `stm32h533`, ...) the crate also provides implementations of those traits
//! for the STM32H5 family.
#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(all(feature = "rm0492", feature = "rm0481"))]
compile_error!("Cannot not select both rm0492 and rm0481");

#[cfg(feature = "stm32h503")]
pub use stm32h5::stm32h503 as stm32;

#[cfg(feature = "stm32h523")]
pub use stm32h5::stm32h523 as stm32;

#[cfg(feature = "stm32h533")]
pub use stm32h5::stm32h533 as stm32;

#[cfg(feature = "stm32h562")]
pub use stm32h5::stm32h562 as stm32;

#[cfg(feature = "stm32h563")]
pub use stm32h5::stm32h563 as stm32;

#[cfg(feature = "stm32h573")]
pub use stm32h5::stm32h573 as stm32;

#[cfg(feature = "device-selected")]
pub use crate::stm32 as pac;
#[cfg(feature = "device-selected")]
pub use crate::stm32 as device;

// Enable use of interrupt macro
#[cfg(all(feature = "rt", feature = "device-selected"))]
#[cfg_attr(docsrs, doc(cfg(feature = "rt")))]
pub use crate::stm32::interrupt;

#[macro_use]
mod macros;

pub mod config;
pub mod control;
pub mod debounce;
pub mod delay;
pub mod gpio;
pub mod prelude;
pub mod render;
pub mod schedule;
pub mod tick;
pub mod time;
pub mod timer;

#[cfg(test)]
mod sim;
