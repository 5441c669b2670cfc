//! Four-bit binary counter, slower while the button is held
//!
//! TIM5 advances the counter and shows it on PA5 (LD2), PA6, PA7 and PB6,
//! lowest bit first. The period is 1.5 s, and 3.0 s while the user button
//! (B1, PC13) is held down.
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
use tick_engine::schedule::Level;
use tick_engine::tick::{PeriodControl, TickEngine};
use tick_engine::time::{FixedClock, Hertz};
use tick_engine::timer::Flag;
use tick_engine::{pac, pac::interrupt, prelude::*};
use utilities::logger::info;

const LEDS: LedMap<4> = LedMap::new([('A', 5), ('A', 6), ('A', 7), ('B', 6)]);

type Engine = TickEngine<Flag<pac::TIM5>, LedMap<4>, Leds, 4>;

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

    let (timer, flag) = dp.TIM5.periodic();
    let engine = TickEngine::new(flag, LEDS, leds);
    cortex_m::interrupt::free(|cs| {
        ENGINE.borrow(cs).replace(Some(engine));
    });

    unsafe {
        cp.NVIC.set_priority(interrupt::TIM5, 1);
        timer.unmask();
    }

    let schedule = Level::slow_while_held();
    let control = PeriodControl::new(timer, &CLOCK, schedule.released);
    let debouncer = Debouncer::new(button, Config::hold_recheck().active_high());
    let mut reconfigurator = Reconfigurator::new(debouncer, schedule, control);
    let mut delay = cp.SYST.delay(&CLOCK);

    info!("Counting every {} ticks", reconfigurator.period().ticks());
    let never: Infallible = match reconfigurator.run(&mut delay) {
        Ok(never) | Err(never) => never,
    };
    match never {}
}

#[interrupt]
fn TIM5() {
    cortex_m::interrupt::free(|cs| {
        if let Some(engine) = ENGINE.borrow(cs).borrow_mut().as_mut() {
            engine.on_timer_expire();
        }
    })
}
