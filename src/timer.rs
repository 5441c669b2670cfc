//! Periodic timers
//!
//! A periodic timer is used from two contexts, so its interface is split in
//! two halves:
//!
//! - [`PeriodicTimer`] is held by the foreground. It starts and stops the
//!   timer and writes its reload value.
//! - [`TimeoutFlag`] is held by the interrupt handler. It can only look at and
//!   clear the expiry flag.
//!
//! On the STM32H5 the [`TimerExt::periodic`] method takes a basic or general
//! purpose timer and returns both halves.
//!
//! ```ignore
//! let (timer, flag) = dp.TIM2.periodic();
//! ```

#[cfg(feature = "device-selected")]
use core::marker::PhantomData;

#[cfg(feature = "device-selected")]
use cortex_m::peripheral::NVIC;

#[cfg(feature = "device-selected")]
use crate::stm32::{Interrupt, RCC, TIM2, TIM3, TIM6, TIM7};
#[cfg(feature = "rm0481")]
use crate::stm32::{TIM4, TIM5};

/// Interrupt-side half of a periodic timer
pub trait TimeoutFlag {
    /// Whether an expiry has been latched and not cleared yet
    fn is_pending(&self) -> bool;

    /// Clears a latched expiry
    fn clear(&mut self);
}

/// Foreground half of a periodic timer
pub trait PeriodicTimer {
    /// Puts the timer in auto-reload mode. Leaves it disabled.
    fn configure_periodic(&mut self);

    /// Loads a new reload value and restarts the count from it
    ///
    /// The timer expires every `reload + 1` ticks. Only called while the
    /// timer is disabled.
    fn set_reload(&mut self, reload: u32);

    /// Starts counting
    fn enable(&mut self);

    /// Stops counting. No expiry can latch while disabled.
    fn disable(&mut self);

    /// Clears a latched expiry
    fn clear_interrupt_flag(&mut self);

    /// Lets expiries raise the timer interrupt
    fn listen(&mut self);
}

/// External trait for hardware timers
#[cfg(feature = "device-selected")]
pub trait TimerExt: Sized {
    /// Enables and resets the timer, and splits it into the foreground
    /// control half and the interrupt flag half
    fn periodic(self) -> (Timer<Self>, Flag<Self>);
}

/// Foreground control of a hardware timer
#[derive(Debug)]
#[cfg(feature = "device-selected")]
pub struct Timer<TIM> {
    tim: TIM,
}

/// Expiry flag of a hardware timer, for use in its interrupt handler
#[derive(Debug)]
#[cfg(feature = "device-selected")]
pub struct Flag<TIM> {
    _tim: PhantomData<TIM>,
}

#[cfg(feature = "device-selected")]
macro_rules! hal {
    ($($TIMX:ident: ($timX:ident, $cntType:ty),)+) => {
        $(
            paste::item! {
                impl TimerExt for $TIMX {
                    fn periodic(self) -> (Timer<$TIMX>, Flag<$TIMX>) {
                        let timer = Timer::$timX(self);
                        (timer, Flag { _tim: PhantomData })
                    }
                }

                impl Timer<$TIMX> {
                    /// Enables and resets the timer in the RCC. The timer is
                    /// left stopped.
                    pub fn $timX(tim: $TIMX) -> Self {
                        // unsafe: Owned exclusive access to this bitfield
                        cortex_m::interrupt::free(|_| {
                            let rcc = unsafe { &*RCC::ptr() };
                            rcc.apb1lenr()
                                .modify(|_, w| w.[< $timX en >]().set_bit());
                            rcc.apb1lrstr()
                                .modify(|_, w| w.[< $timX rst >]().set_bit());
                            rcc.apb1lrstr()
                                .modify(|_, w| w.[< $timX rst >]().clear_bit());
                        });

                        Timer { tim }
                    }

                    /// Unmasks the timer interrupt in the NVIC
                    ///
                    /// # Safety
                    ///
                    /// This can break mask-based critical sections
                    pub unsafe fn unmask(&self) {
                        NVIC::unmask(Interrupt::$TIMX);
                    }

                    /// Stops the timer and releases the TIM peripheral
                    pub fn free(mut self) -> $TIMX {
                        self.disable();
                        self.tim
                    }
                }

                impl PeriodicTimer for Timer<$TIMX> {
                    fn configure_periodic(&mut self) {
                        self.disable();

                        // UEV event occours on counter overflow only, so the
                        // update generated by set_reload does not latch UIF
                        self.tim.cr1().modify(|_, w| {
                            w.urs().counter_only();
                            w.opm().clear_bit()
                        });
                        self.tim.cnt().reset();
                    }

                    fn set_reload(&mut self, reload: u32) {
                        let wide = u32::from(<$cntType>::MAX) == u32::MAX;
                        let (psc, arr) = reload_register_values(reload, wide);

                        #[allow(unused_unsafe)] // method is safe for some timers
                        unsafe {
                            self.tim.psc().write(|w| w.psc().bits(psc));
                        }
                        #[allow(unused_unsafe)] // method is safe for some timers
                        self.tim.arr().write(|w| unsafe { w.bits(arr) });

                        // Load PSC and ARR now and restart the count
                        self.tim.egr().write(|w| w.ug().set_bit());
                    }

                    fn enable(&mut self) {
                        self.tim.cr1().modify(|_, w| w.cen().set_bit());
                    }

                    fn disable(&mut self) {
                        self.tim.cr1().modify(|_, w| w.cen().clear_bit());
                    }

                    fn clear_interrupt_flag(&mut self) {
                        self.tim.sr().modify(|_, w| w.uif().clear_bit());
                        interrupt_clear_clock_sync_delay!(self.tim.sr());
                    }

                    fn listen(&mut self) {
                        self.tim.dier().modify(|_, w| w.uie().set_bit());
                    }
                }

                impl TimeoutFlag for Flag<$TIMX> {
                    fn is_pending(&self) -> bool {
                        // NOTE(unsafe) atomic read with no side effects
                        unsafe { (*$TIMX::ptr()).sr().read().uif().bit_is_set() }
                    }

                    fn clear(&mut self) {
                        // NOTE(unsafe) UIF is rc_w0, writing back the other
                        // flags as read leaves them untouched
                        let tim = unsafe { &*$TIMX::ptr() };
                        tim.sr().modify(|_, w| w.uif().clear_bit());
                        interrupt_clear_clock_sync_delay!(tim.sr());
                    }
                }
            }
        )+
    }
}

/// Register values for a timer that should expire every `reload + 1` ticks
///
/// 32-bit timers take the reload value as is. 16-bit timers extend their range
/// with the prescaler, see [`calculate_timeout_ticks_register_values`].
#[cfg_attr(not(feature = "device-selected"), allow(dead_code))]
fn reload_register_values(reload: u32, wide: bool) -> (u16, u32) {
    if wide {
        return (0, reload);
    }
    let (psc, arr) =
        calculate_timeout_ticks_register_values(reload.saturating_add(1));
    (psc, u32::from(arr))
}

/// We want to have `ticks` amount of timer ticks before it reloads.
/// But `ticks` may have a higher value than what the timer can hold directly.
/// So we'll use the prescaler to extend the range.
///
/// To know how many times we would overflow with a prescaler of 1, we divide `ticks` by 2^16 (the max amount of ticks per overflow).
/// If the result is e.g. 3, then we need to increase our range by 4 times to fit all the ticks.
/// We can increase the range enough by setting the prescaler to 3 (which will divide the clock freq by 4).
/// Because every tick is now 4x as long, we need to divide `ticks` by 4 to keep the same timeout.
///
/// This function returns the prescaler register value and auto reload register value.
#[cfg_attr(not(feature = "device-selected"), allow(dead_code))]
fn calculate_timeout_ticks_register_values(ticks: u32) -> (u16, u16) {
    // Never saturates: a 32-bit value shifted right by 16 bits always fits
    let psc = u16::try_from(ticks / (1 << 16)).unwrap_or(u16::MAX);
    // Never saturates: the divisor is always such that the result fits in 16 bits.
    // Also note that the timer counts `0..=arr`, so subtract 1 to get the correct period.
    let arr = u16::try_from(ticks / (u32::from(psc) + 1))
        .unwrap_or(u16::MAX)
        .saturating_sub(1);
    (psc, arr)
}

#[cfg(feature = "device-selected")]
hal! {
    // General-purpose
    TIM2: (tim2, u32),
    TIM3: (tim3, u16),

    // Basic
    TIM6: (tim6, u16),
    TIM7: (tim7, u16),
}

#[cfg(feature = "rm0481")]
hal! {
    // General-purpose
    TIM4: (tim4, u16),
    TIM5: (tim5, u32),
}
