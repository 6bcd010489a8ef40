use agentgrid::{AgentStore, GridConfig, Population, ThreadSafetyMechanism, UniformGrid};
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

fn store(count: usize, seed: u64) -> AgentStore {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut store = AgentStore::with_containers(2);
    for _ in 0..count {
        let p = [
            rng.gen_range(0.0..40.0),
            rng.gen_range(0.0..40.0),
            rng.gen_range(0.0..40.0),
        ];
        store.add_agent(p, 10.0);
    }
    store
}

#[test]
fn test_builder_only_for_automatic() {
    let s = store(50, 1);
    for mechanism in [ThreadSafetyMechanism::None, ThreadSafetyMechanism::UserSpecified] {
        let mut grid = UniformGrid::new(GridConfig::default().with_thread_safety(mechanism)).unwrap();
        grid.update(&s).unwrap();
        assert!(grid.neighbor_mutex_builder().is_none());
    }

    let mut grid =
        UniformGrid::new(GridConfig::default().with_thread_safety(ThreadSafetyMechanism::Automatic)).unwrap();
    grid.update(&s).unwrap();
    let builder = grid.neighbor_mutex_builder().unwrap();
    assert_eq!(builder.num_locks(), grid.num_boxes());
}

#[test]
fn test_locks_follow_grid_resize() {
    let mut s = store(50, 2);
    let mut grid =
        UniformGrid::new(GridConfig::default().with_thread_safety(ThreadSafetyMechanism::Automatic)).unwrap();
    grid.update(&s).unwrap();
    let before = grid.num_boxes();

    s.add_agent([200.0, 200.0, 200.0], 10.0);
    grid.update(&s).unwrap();
    assert!(grid.num_boxes() > before);
    assert_eq!(grid.neighbor_mutex_builder().unwrap().num_locks(), grid.num_boxes());
}

#[test]
fn test_neighborhood_updates_are_serialized() {
    let s = store(3000, 3);
    let mut grid = UniformGrid::new(
        GridConfig::default()
            .with_thread_safety(ThreadSafetyMechanism::Automatic)
            .with_parallel_chunk(50),
    )
    .unwrap();
    grid.update(&s).unwrap();
    let builder = grid.neighbor_mutex_builder().unwrap();

    // Unsynchronized read-modify-write per box: only exact under mutual exclusion.
    let counters: Vec<AtomicUsize> = (0..grid.num_boxes()).map(|_| AtomicUsize::new(0)).collect();
    let mut expected = vec![0usize; grid.num_boxes()];
    for h in s.handles() {
        for &b in builder.get_mutex(s.box_index(h)).box_indices() {
            expected[b] += 1;
        }
    }

    let handles: Vec<_> = s.handles().collect();
    handles.par_iter().for_each(|&h| {
        let lock = builder.get_mutex(s.box_index(h));
        let _guard = lock.guard();
        for &b in lock.box_indices() {
            let v = counters[b].load(Ordering::Relaxed);
            std::hint::spin_loop();
            counters[b].store(v + 1, Ordering::Relaxed);
        }
    });

    let actual: Vec<usize> = counters.iter().map(|c| c.load(Ordering::Relaxed)).collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_random_overlapping_locks_terminate() {
    let s = store(500, 4);
    let mut grid =
        UniformGrid::new(GridConfig::default().with_thread_safety(ThreadSafetyMechanism::Automatic)).unwrap();
    grid.update(&s).unwrap();
    let builder = grid.neighbor_mutex_builder().unwrap();
    let occupied: Vec<usize> = s.handles().map(|h| s.box_index(h)).collect();
    let done = AtomicUsize::new(0);

    for run in 0..3u64 {
        thread::scope(|scope| {
            for t in 0..8u64 {
                let occupied = &occupied;
                let done = &done;
                scope.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(run * 100 + t);
                    for _ in 0..1000 {
                        let b = occupied[rng.gen_range(0..occupied.len())];
                        let lock = builder.get_mutex(b);
                        lock.lock();
                        lock.unlock();
                    }
                    done.fetch_add(1, Ordering::SeqCst);
                });
            }
        });
    }
    assert_eq!(done.load(Ordering::SeqCst), 24);
}
