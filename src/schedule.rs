//! Period schedules
//!
//! A [`Schedule`] decides which timer period follows a confirmed button edge.

use crate::debounce::Edge;
use crate::time::MilliSeconds;

/// Maps confirmed edges to timer periods
pub trait Schedule {
    /// Period to start with
    fn initial(&self) -> MilliSeconds;

    /// Period to switch to after `edge`, or `None` to keep the current one
    fn on_edge(&mut self, edge: Edge) -> Option<MilliSeconds>;
}

/// Steps through a fixed list of periods, one step per press
///
/// Releases are ignored. After the last stage the cycle starts over.
///
/// ```
/// use tick_engine::debounce::Edge;
/// use tick_engine::schedule::{Cycle, Schedule};
/// use tick_engine::time::MilliSeconds;
///
/// let mut cycle = Cycle::halving();
/// assert_eq!(cycle.initial(), MilliSeconds::millis(2_000));
/// assert_eq!(cycle.on_edge(Edge::Pressed), Some(MilliSeconds::millis(1_000)));
/// assert_eq!(cycle.on_edge(Edge::Released), None);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cycle<const N: usize> {
    stages: [MilliSeconds; N],
    stage: usize,
}

impl<const N: usize> Cycle<N> {
    /// # Panics
    ///
    /// If `stages` is empty.
    pub const fn new(stages: [MilliSeconds; N]) -> Self {
        assert!(N > 0, "a cycle needs at least one stage");
        Cycle { stages, stage: 0 }
    }

    /// Index of the active stage
    pub const fn stage(&self) -> usize {
        self.stage
    }
}

impl Cycle<3> {
    /// 1 s, 2 s, 5 s
    pub const fn lengthening() -> Self {
        Self::new([
            MilliSeconds::secs(1),
            MilliSeconds::secs(2),
            MilliSeconds::secs(5),
        ])
    }

    /// 2.0 s, 1.0 s, 0.5 s
    pub const fn halving() -> Self {
        Self::new([
            MilliSeconds::millis(2_000),
            MilliSeconds::millis(1_000),
            MilliSeconds::millis(500),
        ])
    }
}

impl<const N: usize> Schedule for Cycle<N> {
    fn initial(&self) -> MilliSeconds {
        self.stages[0]
    }

    fn on_edge(&mut self, edge: Edge) -> Option<MilliSeconds> {
        match edge {
            Edge::Pressed => {
                self.stage = (self.stage + 1) % N;
                Some(self.stages[self.stage])
            }
            Edge::Released => None,
        }
    }
}

/// One period while the button is held, another while it is released
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Level {
    pub held: MilliSeconds,
    pub released: MilliSeconds,
}

impl Level {
    pub const fn new(held: MilliSeconds, released: MilliSeconds) -> Self {
        Level { held, released }
    }

    /// 3.0 s while held, 1.5 s while released
    pub const fn slow_while_held() -> Self {
        Self::new(MilliSeconds::millis(3_000), MilliSeconds::millis(1_500))
    }
}

impl Schedule for Level {
    fn initial(&self) -> MilliSeconds {
        self.released
    }

    fn on_edge(&mut self, edge: Edge) -> Option<MilliSeconds> {
        Some(match edge {
            Edge::Pressed => self.held,
            Edge::Released => self.released,
        })
    }
}

/// A period that never changes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fixed(pub MilliSeconds);

impl Schedule for Fixed {
    fn initial(&self) -> MilliSeconds {
        self.0
    }

    fn on_edge(&mut self, _edge: Edge) -> Option<MilliSeconds> {
        None
    }
}
