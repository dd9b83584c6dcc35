use super::*;

#[test]
fn timestamps_strictly_increase() {
    let clock = Clock::new();
    let mut prev = clock.now_ms();
    for _ in 0..1000 {
        let next = clock.now_ms();
        assert!(next > prev);
        prev = next;
    }
}

#[test]
fn observe_pushes_clock_forward() {
    let clock = Clock::new();
    let future = wall_ms() + 60_000;
    clock.observe(future);
    assert!(clock.now_ms() > future);
}

#[test]
fn observe_past_is_ignored() {
    let clock = Clock::new();
    let now = clock.now_ms();
    clock.observe(1);
    assert!(clock.now_ms() > now);
}
