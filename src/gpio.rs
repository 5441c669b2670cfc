//! General Purpose Input / Output
//!
//! Outputs are written a port at a time: a [`PortWrite`] names a port, the
//! pins to touch and the level for each of them. Anything that can perform
//! such a write implements [`OutputPort`]. Inputs use the `embedded-hal`
//! [`InputPin`](embedded_hal::digital::InputPin) trait.
//!
//! With a device feature enabled, [`Leds`] drives LEDs through the port
//! set/reset registers and [`Input`] reads a single pin.
//!
//! ```ignore
//! let leds = Leds::new(&[('A', 5), ('A', 6)])?;
//! let button = Input::<'C', 13>::new(Pull::Down)?;
//! ```

#[cfg(feature = "device-selected")]
use core::{convert::Infallible, marker::PhantomData};

#[cfg(feature = "device-selected")]
use crate::pac::gpioa::RegisterBlock;

/// A masked write to one GPIO port
///
/// Pins outside `mask` keep their level.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortWrite {
    pub port: char,
    pub mask: u16,
    pub level: u16,
}

impl PortWrite {
    pub const fn new(port: char, mask: u16, level: u16) -> Self {
        PortWrite {
            port,
            mask,
            level: level & mask,
        }
    }

    /// Value for a set/reset register: pins to set in the low half, pins to
    /// reset in the high half
    pub const fn set_reset_bits(&self) -> u32 {
        let set = self.mask & self.level;
        let reset = self.mask & !self.level;
        (set as u32) | ((reset as u32) << 16)
    }
}

/// Something a [`PortWrite`] can be applied to
///
/// Implementations are called from interrupt context and must not block.
pub trait OutputPort {
    fn write(&mut self, write: PortWrite);
}

/// GPIO errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The selected device has no such port
    UnknownPort(char),
    /// Pin numbers go from 0 to 15
    InvalidPin(u8),
}

/// Internal pull-up and pull-down resistor
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// Floating
    None = 0,
    /// Pulled up
    Up = 1,
    /// Pulled down
    Down = 2,
}

#[cfg(feature = "device-selected")]
macro_rules! ports {
    ($($port:literal: $GPIOX:ident),+ $(,)?) => {
        paste::item! {
            fn block(port: char) -> Option<&'static RegisterBlock> {
                let ptr = match port {
                    $($port => crate::pac::$GPIOX::ptr() as *const RegisterBlock,)+
                    _ => return None,
                };
                // NOTE(unsafe) peripheral memory stays mapped for the whole program
                Some(unsafe { &*ptr })
            }

            fn enable(port: char) -> Result<&'static RegisterBlock, Error> {
                let regs = block(port).ok_or(Error::UnknownPort(port))?;
                // unsafe: Owned exclusive access to this bitfield
                cortex_m::interrupt::free(|_| {
                    let rcc = unsafe { &*crate::pac::RCC::ptr() };
                    match port {
                        $($port => {
                            rcc.ahb2enr().modify(|_, w| w.[< $GPIOX:lower en >]().set_bit());
                        })+
                        _ => {}
                    }
                });
                Ok(regs)
            }
        }
    };
}

#[cfg(feature = "gpio-h503")]
ports!('A': GPIOA, 'B': GPIOB, 'C': GPIOC, 'D': GPIOD, 'H': GPIOH);

#[cfg(feature = "gpio-h523_h533")]
ports!(
    'A': GPIOA, 'B': GPIOB, 'C': GPIOC, 'D': GPIOD,
    'E': GPIOE, 'F': GPIOF, 'G': GPIOG, 'H': GPIOH,
);

#[cfg(feature = "gpio-h56x_h573")]
ports!(
    'A': GPIOA, 'B': GPIOB, 'C': GPIOC, 'D': GPIOD,
    'E': GPIOE, 'F': GPIOF, 'G': GPIOG, 'H': GPIOH, 'I': GPIOI,
);

/// Two-bit field `value` at `pin` in a register with two bits per pin
#[cfg(feature = "device-selected")]
const fn with_field2(bits: u32, pin: u8, value: u32) -> u32 {
    let offset = 2 * pin as u32;
    (bits & !(0b11 << offset)) | ((value & 0b11) << offset)
}

/// Configures the pins in `mask` as push-pull outputs, driven low
#[cfg(feature = "device-selected")]
pub fn configure_output(port: char, mask: u16) -> Result<(), Error> {
    let regs = enable(port)?;

    // Drive low before switching the mode to avoid a short spike
    // NOTE(unsafe) atomic write to a stateless register
    regs.bsrr()
        .write(|w| unsafe { w.bits(PortWrite::new(port, mask, 0).set_reset_bits()) });

    cortex_m::interrupt::free(|_| {
        for pin in (0..16u8).filter(|pin| mask & (1 << pin) != 0) {
            regs.otyper()
                .modify(|r, w| unsafe { w.bits(r.bits() & !(1 << pin)) });
            regs.moder()
                .modify(|r, w| unsafe { w.bits(with_field2(r.bits(), pin, 0b01)) });
        }
    });
    Ok(())
}

/// Configures `pin` as an input with the given pull resistor
#[cfg(feature = "device-selected")]
pub fn configure_input(port: char, pin: u8, pull: Pull) -> Result<(), Error> {
    if pin > 15 {
        return Err(Error::InvalidPin(pin));
    }
    let regs = enable(port)?;

    cortex_m::interrupt::free(|_| {
        regs.pupdr().modify(|r, w| unsafe {
            w.bits(with_field2(r.bits(), pin, pull as u32))
        });
        regs.moder()
            .modify(|r, w| unsafe { w.bits(with_field2(r.bits(), pin, 0b00)) });
    });
    Ok(())
}

/// LEDs on push-pull outputs, written through the port set/reset registers
///
/// The set/reset registers make every write atomic, so this can be used from
/// an interrupt handler while the foreground touches other pins of the same
/// port.
#[derive(Debug)]
#[cfg(feature = "device-selected")]
pub struct Leds {
    _private: (),
}

#[cfg(feature = "device-selected")]
impl Leds {
    /// Configures every `(port, pin)` as an output, driven low
    pub fn new(pins: &[(char, u8)]) -> Result<Self, Error> {
        for &(port, pin) in pins {
            if pin > 15 {
                return Err(Error::InvalidPin(pin));
            }
            configure_output(port, 1 << pin)?;
        }
        Ok(Leds { _private: () })
    }
}

#[cfg(feature = "device-selected")]
impl OutputPort for Leds {
    fn write(&mut self, write: PortWrite) {
        if let Some(regs) = block(write.port) {
            // NOTE(unsafe) atomic write to a stateless register
            regs.bsrr()
                .write(|w| unsafe { w.bits(write.set_reset_bits()) });
        }
    }
}

/// A single input pin
#[derive(Debug)]
#[cfg(feature = "device-selected")]
pub struct Input<const P: char, const N: u8> {
    _marker: PhantomData<*const ()>,
}

#[cfg(feature = "device-selected")]
impl<const P: char, const N: u8> Input<P, N> {
    /// Configures the pin as an input
    pub fn new(pull: Pull) -> Result<Self, Error> {
        configure_input(P, N, pull)?;
        Ok(Input {
            _marker: PhantomData,
        })
    }

    #[inline(always)]
    fn _is_low(&self) -> bool {
        // NOTE(unsafe) atomic read with no side effects
        block(P).map_or(false, |regs| regs.idr().read().bits() & (1 << N) == 0)
    }
}

#[cfg(feature = "device-selected")]
impl<const P: char, const N: u8> embedded_hal::digital::ErrorType
    for Input<P, N>
{
    type Error = Infallible;
}

#[cfg(feature = "device-selected")]
impl<const P: char, const N: u8> embedded_hal::digital::InputPin
    for Input<P, N>
{
    #[inline(always)]
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self._is_low())
    }

    #[inline(always)]
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self._is_low())
    }
}
