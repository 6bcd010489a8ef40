mod common;

use agentgrid::{AgentStore, GridConfig, UniformGrid};
use common::Axes;
use criterion::{criterion_group, BenchmarkId, Criterion};
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

const N_AGENTS: usize = 1_000_000;

fn random_store(count: usize) -> AgentStore {
    let mut rng = StdRng::seed_from_u64(123456789);
    let mut store = AgentStore::with_containers(4);
    for _ in 0..count {
        let p = [
            rng.gen_range(0.0..1000.0),
            rng.gen_range(0.0..1000.0),
            rng.gen_range(0.0..1000.0),
        ];
        store.add_agent(p, 10.0);
    }
    store
}

fn cores_list() -> Vec<usize> {
    let max_cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(8);
    let mut cores_list = Vec::new();
    let mut cores = 1;
    while cores <= max_cores {
        cores_list.push(cores);
        cores *= 2;
    }
    if cores_list.last().map_or(false, |&last| last < max_cores) {
        cores_list.push(max_cores);
    }
    cores_list
}

fn benchmark_parallelism(c: &mut Criterion) {
    let store = random_store(N_AGENTS);

    let mut group = c.benchmark_group(format!("parallelism_{}k", N_AGENTS / 1000));
    group.sample_size(10);

    for num_threads in cores_list() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .unwrap();

        group.bench_with_input(BenchmarkId::new("update", num_threads), &num_threads, |b, &_s| {
            let mut grid = UniformGrid::new(GridConfig::default()).unwrap();
            b.iter(|| {
                pool.install(|| {
                    grid.update(&store).unwrap();
                })
            })
        });

        group.bench_with_input(BenchmarkId::new("queries", num_threads), &num_threads, |b, &_s| {
            let mut grid = UniformGrid::new(GridConfig::default()).unwrap();
            pool.install(|| grid.update(&store).unwrap());
            let handles: Vec<_> = store.handles().collect();
            let r2 = grid.largest_object_size_squared();
            b.iter(|| {
                pool.install(|| {
                    handles
                        .par_iter()
                        .map(|&h| {
                            let mut n = 0usize;
                            grid.for_each_neighbor_within_radius(&store, h, r2, |_| n += 1);
                            n
                        })
                        .sum::<usize>()
                })
            })
        });

        group.bench_with_input(BenchmarkId::new("zorder", num_threads), &num_threads, |b, &_s| {
            let mut grid = UniformGrid::new(GridConfig::default()).unwrap();
            pool.install(|| grid.update(&store).unwrap());
            let visited = AtomicUsize::new(0);
            b.iter(|| {
                pool.install(|| {
                    grid.par_iterate_in_zorder(|_| {
                        visited.fetch_add(1, Ordering::Relaxed);
                    });
                })
            })
        });
    }
    group.finish();
}

fn plot_parallelism_results() -> Result<(), Box<dyn std::error::Error>> {
    let group = format!("parallelism_{}k", N_AGENTS / 1000);
    let data = common::read_timings(&group, &["update", "queries", "zorder"], &cores_list())?;
    if data.is_empty() {
        return Ok(());
    }
    let caption = format!("Parallelism Benchmark (N={})", N_AGENTS);
    let axes = Axes {
        caption: &caption,
        x_desc: "Number of Cores",
        log: false,
        linear_reference: false,
    };
    let out_file = common::results_file(&format!("bench_parallelism_{}k", N_AGENTS / 1000))?;
    common::plot_timings(&out_file, &axes, &data)
}

criterion_group!(benches, benchmark_parallelism);

fn main() {
    benches();
    if let Err(e) = plot_parallelism_results() {
        eprintln!("Error generating plot: {}", e);
    }
}
