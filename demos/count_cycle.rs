//! Two-bit binary counter with a button-selected period
//!
//! TIM2 advances the counter and shows it on PA5 (LD2, bit 0) and an
//! external LED on PA6 (bit 1). Each press of the user button (B1, PC13)
//! steps the period through 2.0 s, 1.0 s and 0.5 s.
#![deny(warnings)]
#![no_main]
#![no_std]

mod utilities;

use core::cell::RefCell;
use core::convert::Infallible;

use cortex_m::interrupt::Mutex;
use cortex_m_rt::entry;

use tick_engine::config::Config;
use tick_engine::control::Reconfigurator;
use tick_engine::debounce::Debouncer;
use tick_engine::gpio::{Input, Leds, Pull};
use tick_engine::render::LedMap;
use tick_engine::schedule::Cycle;
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
    // B1 has an external pull-down and reads high while pressed
    let button = Input::<'C', 13>::new(Pull::None).unwrap();

    let (timer, flag) = dp.TIM2.periodic();
    let engine = TickEngine::new(flag, LEDS, leds);
    cortex_m::interrupt::free(|cs| {
        ENGINE.borrow(cs).replace(Some(engine));
    });

    unsafe {
        cp.NVIC.set_priority(interrupt::TIM2, 1);
        timer.unmask();
    }

    let schedule = Cycle::halving();
    let control = PeriodControl::new(timer, &CLOCK, 2.secs());
    let debouncer = Debouncer::new(button, Config::release_stall().active_high());
    let mut reconfigurator = Reconfigurator::new(debouncer, schedule, control);
    let mut delay = cp.SYST.delay(&CLOCK);

    info!("Counting every {} ticks", reconfigurator.period().ticks());
    let never: Infallible = match reconfigurator.run(&mut delay) {
        Ok(never) | Err(never) => never,
    };
    match never {}
}

#[interrupt]
fn TIM2() {
    cortex_m::interrupt::free(|cs| {
        if let Some(engine) = ENGINE.borrow(cs).borrow_mut().as_mut() {
            engine.on_timer_expire();
        }
    })
}
