//! Two-bit binary counter at a fixed period
//!
//! TIM2 advances the counter every 2 s and shows it on PA5 (LD2, bit 0) and
//! an external LED on PA6 (bit 1). The foreground has nothing to do.
#![deny(warnings)]
#![no_main]
#![no_std]

mod utilities;

use core::cell::RefCell;

use cortex_m::interrupt::Mutex;
use cortex_m_rt::entry;

use tick_engine::gpio::Leds;
use tick_engine::render::LedMap;
use tick_engine::tick::{PeriodControl, TickEngine};
use tick_engine::time::{FixedClock, Hertz};
use tick_engine::timer::Flag;
use tick_engine::{pac, pac::interrupt, prelude::*};
use utilities::logger::info;

const LEDS: LedMap<2> = LedMap::new([('A', 5), ('A', 6)]);

type Engine = TickEngine<Flag<pac::TIM2>, LedMap<2>, Leds, 2>;

static ENGINE: Mutex<RefCell<Option<Engine>>> = Mutex::new(RefCell::new(None));

// Clocks are left as they come out of reset: HSI at 32 MHz
const CLOCK: FixedClock = FixedClock::new(Hertz::MHz(32));

#[entry]
fn main() -> ! {
    utilities::logger::init();

    let mut cp = cortex_m::Peripherals::take().unwrap();
    let dp = pac::Peripherals::take().unwrap();

    let leds = Leds::new(LEDS.leds()).unwrap();

    let (timer, flag) = dp.TIM2.periodic();
    let engine = TickEngine::new(flag, LEDS, leds);
    cortex_m::interrupt::free(|cs| {
        ENGINE.borrow(cs).replace(Some(engine));
    });

    unsafe {
        cp.NVIC.set_priority(interrupt::TIM2, 1);
        timer.unmask();
    }

    let control = PeriodControl::new(timer, &CLOCK, 2.secs());
    info!("Counting every {} ticks", control.period().ticks());

    loop {
        cortex_m::asm::wfi();
    }
}

#[interrupt]
fn TIM2() {
    cortex_m::interrupt::free(|cs| {
        if let Some(engine) = ENGINE.borrow(cs).borrow_mut().as_mut() {
            engine.on_timer_expire();
        }
    })
}
