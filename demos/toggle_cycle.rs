//! LED toggle with a button-selected period
//!
//! LD2 (PA5) toggles on every TIM2 expiry. Each press of the user button
//! (B1, PC13) steps the period through 1 s, 2 s and 5 s. The foreground
//! waits for the button to be released before looking at it again.
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

type Engine = TickEngine<Flag<pac::TIM2>, LedMap<1>, Leds, 1>;

static ENGINE: Mutex<RefCell<Option<Engine>>> = Mutex::new(RefCell::new(None));

// Clocks are left as they come out of reset: HSI at 32 MHz
const CLOCK: FixedClock = FixedClock::new(Hertz::MHz(32));

#[entry]
fn main() -> ! {
    utilities::logger::init();

    let mut cp = cortex_m::Peripherals::take().unwrap();
    let dp = pac::Peripherals::take().unwrap();

    let leds = Leds::new(&[('A', 5)]).unwrap();
    // B1 has an external pull-down and reads high while pressed
    let button = Input::<'C', 13>::new(Pull::None).unwrap();

    let (timer, flag) = dp.TIM2.periodic();
    let engine = TickEngine::new(flag, LedMap::new([('A', 5)]), leds);
    cortex_m::interrupt::free(|cs| {
        ENGINE.borrow(cs).replace(Some(engine));
    });

    unsafe {
        cp.NVIC.set_priority(interrupt::TIM2, 1);
        timer.unmask();
    }

    let control = PeriodControl::new(timer, &CLOCK, 1.secs());
    let debouncer = Debouncer::new(button, Config::release_stall().active_high());
    let mut reconfigurator =
        Reconfigurator::new(debouncer, Cycle::lengthening(), control);
    let mut delay = cp.SYST.delay(&CLOCK);

    info!("Toggling every {} ticks", reconfigurator.period().ticks());
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
