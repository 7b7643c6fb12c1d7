//! Gate semantics of the update scheduler.

use model_link::protocol::GateTime;
use model_link::scheduler::UpdateScheduler;

fn at(hour: u32, minute: u32, second: u32) -> GateTime {
    GateTime::from_ymd_hms(2024, 3, 1, hour, minute, second).unwrap()
}

#[test]
fn unset_gate_always_proceeds() {
    let scheduler = UpdateScheduler::new();
    assert_eq!(scheduler.gate_time(), None);
    assert!(scheduler.should_proceed(at(0, 0, 0)));
    assert!(scheduler.should_proceed(GateTime::now()));
}

#[test]
fn refuses_strictly_before_gate() {
    let mut scheduler = UpdateScheduler::new();
    scheduler.set_gate_time(at(12, 0, 0));

    assert!(!scheduler.should_proceed(at(11, 59, 59)));
    assert!(!scheduler.should_proceed(at(0, 0, 0)));
}

#[test]
fn proceeds_at_and_after_gate() {
    let mut scheduler = UpdateScheduler::new();
    scheduler.set_gate_time(at(12, 0, 0));

    assert!(scheduler.should_proceed(at(12, 0, 0)));
    assert!(scheduler.should_proceed(at(12, 0, 1)));
}

#[test]
fn set_gate_overwrites_unconditionally() {
    let mut scheduler = UpdateScheduler::new();
    scheduler.set_gate_time(at(12, 0, 0));
    scheduler.set_gate_time(at(9, 0, 0));

    assert_eq!(scheduler.gate_time(), Some(at(9, 0, 0)));
    assert!(scheduler.should_proceed(at(10, 0, 0)));
}

#[test]
fn gate_in_the_past_allows_next_cycle_at_once() {
    let mut scheduler = UpdateScheduler::new();
    let now = GateTime::now();
    scheduler.set_gate_time(now);
    assert!(scheduler.should_proceed(now));
}
