use crate::schedule::EpsilonSchedule;

#[test]
fn test_epsilon_starts_at_start() {
    let schedule = EpsilonSchedule::new(1.0, 0.01, 500.0);
    assert!((schedule.value(0) - 1.0).abs() < 1e-12);
    assert!(schedule.value(0) <= 1.0);
}

#[test]
fn test_epsilon_decays_towards_final() {
    let schedule = EpsilonSchedule::new(1.0, 0.01, 500.0);
    let expected = 0.01 + 0.99 * (-1.0f64).exp();
    assert!((schedule.value(500) - expected).abs() < 1e-12);
    assert!((schedule.value(1_000_000) - 0.01).abs() < 1e-12);
}

#[test]
fn test_epsilon_monotone_and_bounded() {
    let schedule = EpsilonSchedule::new(0.9, 0.05, 50.0);
    let mut previous = schedule.value(0);
    for t in 1..2000 {
        let value = schedule.value(t);
        assert!(value <= previous);
        assert!(value >= 0.05 && value <= 0.9);
        previous = value;
    }
}
