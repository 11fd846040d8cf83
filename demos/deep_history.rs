//! Deep history: a media player that resumes exactly where it paused.
//!
//! Standby -> Active{Playing{TrackA|TrackB}} with deep history on the
//! machine root: switching to standby and back restores the nested track,
//! not just the `Playing` composite.

use statecraft::{events, History, Machine, State, StdLogger};

events! {
    struct PowerToggle;
    struct NextTrack;
}

#[derive(Default)]
struct Player;
impl State for Player {}

#[derive(Default)]
struct Standby;
impl State for Standby {}

#[derive(Default)]
struct Active;
impl State for Active {}

#[derive(Default)]
struct Playing;
impl State for Playing {}

#[derive(Default)]
struct TrackA;
impl State for TrackA {}

#[derive(Default)]
struct TrackB;
impl State for TrackB {}

fn main() {
    let mut player = Machine::<()>::new::<Player>();
    player.set_logger(StdLogger);

    player.state::<Standby>().entry().add().unwrap();
    player.state::<Active>().add().unwrap();
    player.state::<Playing>().parent::<Active>().entry().add().unwrap();
    player.state::<TrackA>().parent::<Playing>().entry().add().unwrap();
    player.state::<TrackB>().parent::<Playing>().add().unwrap();

    player.transition::<Standby, PowerToggle, Active>().add().unwrap();
    player.transition::<Active, PowerToggle, Standby>().add().unwrap();
    player.transition::<TrackA, NextTrack, TrackB>().add().unwrap();
    player.transition::<TrackB, NextTrack, TrackA>().add().unwrap();
    player.set_history::<Player>(History::Deep).unwrap();

    player.start();
    player.process_event(PowerToggle);
    assert!(player.check_states::<(Active, Playing, TrackA)>());

    player.process_event(NextTrack);
    assert!(player.check_states::<(Active, Playing, TrackB)>());

    player.process_event(PowerToggle);
    assert!(player.check_states::<(Standby,)>());

    // Deep history resumes on track B, not the entry track.
    player.process_event(PowerToggle);
    assert!(player.check_states::<(Active, Playing, TrackB)>());

    println!("resumed on track B");
}
