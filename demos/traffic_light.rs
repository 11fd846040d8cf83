//! A pedestrian traffic light: composite states with an interrupt.
//!
//! The light cycles Red -> Green -> Yellow -> Red. A maintenance event
//! interrupts the cycle from any color because the transition is declared
//! on the composite `Operating` state; leaving maintenance restores the
//! interrupted color through shallow history.

use statecraft::{events, History, LogLevel, LogSink, Machine, State};

struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write_log(&self, module: &str, level: LogLevel, message: &str) {
        println!("{module} - {} - {message}", level.as_str());
    }
}

events! {
    struct Tick;
    struct ServiceStart;
    struct ServiceDone;
}

#[derive(Default)]
struct Light;
impl State for Light {}

#[derive(Default)]
struct Operating;
impl State for Operating {}

#[derive(Default)]
struct Maintenance;
impl State for Maintenance {}

#[derive(Default)]
struct Red;
impl State for Red {}

#[derive(Default)]
struct Green;
impl State for Green {}

#[derive(Default)]
struct Yellow;
impl State for Yellow {}

fn main() {
    let mut light = Machine::<()>::new::<Light>();
    light.set_logger(ConsoleSink);

    light.state::<Operating>().entry().add().unwrap();
    light.state::<Maintenance>().add().unwrap();
    light.state::<Red>().parent::<Operating>().entry().add().unwrap();
    light.state::<Green>().parent::<Operating>().add().unwrap();
    light.state::<Yellow>().parent::<Operating>().add().unwrap();

    light.transition::<Red, Tick, Green>().add().unwrap();
    light.transition::<Green, Tick, Yellow>().add().unwrap();
    light.transition::<Yellow, Tick, Red>().add().unwrap();
    light.transition::<Operating, ServiceStart, Maintenance>().add().unwrap();
    light.transition::<Maintenance, ServiceDone, Operating>().add().unwrap();
    light.set_history::<Operating>(History::Shallow).unwrap();

    light.start();
    assert!(light.check_states::<(Operating, Red)>());

    light.process_event(Tick);
    assert!(light.check_states::<(Operating, Green)>());

    // Interrupt mid-cycle; the green phase is remembered.
    light.process_event(ServiceStart);
    assert!(light.check_states::<(Maintenance,)>());

    light.process_event(ServiceDone);
    assert!(light.check_states::<(Operating, Green)>());

    light.stop();
}
