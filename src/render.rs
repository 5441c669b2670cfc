//! Counter rendering
//!
//! Turns a counter value into the port writes that show it, one write per
//! port. Rendering is a pure function of the value so it can run from the
//! timer interrupt.

use heapless::Vec;

use crate::gpio::PortWrite;

/// Maps a counter value to port writes
pub trait Render {
    /// The writes for one value
    type Frame: IntoIterator<Item = PortWrite>;

    fn render(&self, value: u8) -> Self::Frame;
}

/// One LED per counter bit
///
/// Bit `i` of the counter drives `leds[i]`, given as `(port, pin)`. LEDs are
/// active high.
///
/// ```
/// use tick_engine::render::{LedMap, Render};
///
/// // bit 0 on PF0, bit 1 on PF4, bit 2 on PN0, bit 3 on PN1
/// let map = LedMap::new([('F', 0), ('F', 4), ('N', 0), ('N', 1)]);
/// let frame = map.render(0b1010);
/// assert_eq!(frame.len(), 2);
/// assert_eq!((frame[0].port, frame[0].level), ('F', 1 << 4));
/// assert_eq!((frame[1].port, frame[1].level), ('N', 1 << 1));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedMap<const N: usize> {
    leds: [(char, u8); N],
}

impl<const N: usize> LedMap<N> {
    /// # Panics
    ///
    /// If there are more than 8 LEDs, or a pin number is above 15.
    pub const fn new(leds: [(char, u8); N]) -> Self {
        assert!(N <= 8, "a counter has at most 8 bits");
        let mut i = 0;
        while i < N {
            assert!(leds[i].1 < 16, "pin numbers go from 0 to 15");
            i += 1;
        }
        LedMap { leds }
    }

    /// The `(port, pin)` of every LED, lowest counter bit first
    pub const fn leds(&self) -> &[(char, u8); N] {
        &self.leds
    }
}

impl<const N: usize> Render for LedMap<N> {
    type Frame = Vec<PortWrite, N>;

    fn render(&self, value: u8) -> Self::Frame {
        let mut frame: Vec<PortWrite, N> = Vec::new();
        for (bit, &(port, pin)) in self.leds.iter().enumerate() {
            let mask = 1u16 << pin;
            let level = if value & (1 << bit) != 0 { mask } else { 0 };

            match frame.iter_mut().find(|write| write.port == port) {
                Some(write) => {
                    write.mask |= mask;
                    write.level |= level;
                }
                // Never full: there are at most N distinct ports
                None => {
                    let _ = frame.push(PortWrite::new(port, mask, level));
                }
            }
        }
        frame
    }
}
