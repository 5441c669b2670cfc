//! Prelude

pub use crate::delay::DelayExt as _tick_engine_delay_DelayExt;
pub use crate::gpio::OutputPort as _tick_engine_gpio_OutputPort;
pub use crate::render::Render as _tick_engine_render_Render;
pub use crate::schedule::Schedule as _tick_engine_schedule_Schedule;
pub use crate::time::SystemClock as _tick_engine_time_SystemClock;
#[cfg(feature = "device-selected")]
pub use crate::timer::TimerExt as _tick_engine_timer_TimerExt;
pub use crate::timer::{
    PeriodicTimer as _tick_engine_timer_PeriodicTimer,
    TimeoutFlag as _tick_engine_timer_TimeoutFlag,
};

pub use fugit::{ExtU32 as _, RateExtU32 as _};
