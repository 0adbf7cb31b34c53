use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::DqnError;
use crate::replay_buffer::{ReplayBuffer, Transition};

fn transition(i: usize) -> Transition {
    Transition::new(array![i as f32], i, i as f32, array![(i + 1) as f32], false)
}

#[test]
fn test_replay_buffer_add_and_sample() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut replay_buffer = ReplayBuffer::new(10);
    let experience = transition(3);
    replay_buffer.add(experience.clone());
    assert_eq!(replay_buffer.len(), 1);
    let sample = replay_buffer.sample(1, &mut rng).unwrap();
    assert_eq!(sample[0], &experience);
}

#[test]
fn test_replay_buffer_ring_eviction() {
    let capacity = 3;
    let extra = 2;
    let mut buffer = ReplayBuffer::new(capacity);

    for i in 0..capacity + extra {
        buffer.add(transition(i));
    }

    assert_eq!(buffer.len(), capacity);
    assert_eq!(buffer.capacity(), capacity);
    // Oldest retained is the (extra + 1)-th inserted
    assert_eq!(buffer.oldest(), Some(&transition(extra)));
    let actions: Vec<usize> = buffer.iter().map(|t| t.action).collect();
    assert_eq!(actions, vec![2, 3, 4]);
}

#[test]
fn test_replay_buffer_is_empty() {
    let mut buffer = ReplayBuffer::new(10);
    assert!(buffer.is_empty());
    buffer.add(transition(0));
    assert!(!buffer.is_empty());
    buffer.clear();
    assert!(buffer.is_empty());
}

#[test]
fn test_sample_more_than_stored_fails() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut buffer = ReplayBuffer::new(10);
    for i in 0..4 {
        buffer.add(transition(i));
    }

    match buffer.sample(5, &mut rng) {
        Err(DqnError::InsufficientData { requested, available }) => {
            assert_eq!(requested, 5);
            assert_eq!(available, 4);
        }
        other => panic!("expected InsufficientData, got {:?}", other.map(|s| s.len())),
    }
}

#[test]
fn test_replay_buffer_sample_size() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut buffer = ReplayBuffer::new(10);
    for i in 0..5 {
        buffer.add(transition(i));
    }

    for n in 1..=5 {
        let sample = buffer.sample(n, &mut rng).unwrap();
        assert_eq!(sample.len(), n);
        assert!(sample.iter().all(|t| t.action < 5));
    }
}

#[test]
fn test_sampling_is_with_replacement() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut buffer = ReplayBuffer::new(2);
    buffer.add(transition(0));
    buffer.add(transition(1));

    let saw_duplicate = (0..100).any(|_| {
        let sample = buffer.sample(2, &mut rng).unwrap();
        sample[0] == sample[1]
    });
    assert!(saw_duplicate);
}

#[test]
fn test_extra_is_kept_but_opaque() {
    let mut extra = crate::env::Info::new();
    extra.insert("elapsed_steps".to_string(), 4.into());
    let t = transition(0).with_extra(extra.clone());
    let mut buffer = ReplayBuffer::new(1);
    buffer.add(t);
    assert_eq!(buffer.oldest().unwrap().extra, extra);
}
