use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::Instant;
use std::time::SystemTime;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;

use flash_limit::AdmissionConfig;
use flash_limit::AdmissionController;
use flash_limit::BlockRatio;
use flash_limit::Gate;
use flash_limit::LocalCounter;

fn bench_single_gate<G: Gate>(group_name: &str, c: &mut Criterion, gate: Arc<G>) {
    let mut group = c.benchmark_group(group_name);

    group.bench_function("single-threaded", |b| {
        b.iter(|| {
            let _ = black_box(gate.as_ref()).decide();
        })
    });

    group.finish();
}

fn bench_parallel_gate<G: Gate + Send + Sync + 'static>(
    group_name: &str,
    c: &mut Criterion,
    gate: Arc<G>,
) {
    let mut group = c.benchmark_group(group_name);

    for threads in [2, 4, 8].iter() {
        let num_threads = *threads;
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}-threads", num_threads)),
            &num_threads,
            |b, &n| {
                b.iter_custom(|iters| {
                    let barrier = Arc::new(Barrier::new(n + 1));
                    let mut handles = Vec::with_capacity(n);

                    for _ in 0..n {
                        let g = Arc::clone(&gate);
                        let bar = Arc::clone(&barrier);
                        let iters_per_thread = iters / n as u64;

                        handles.push(thread::spawn(move || {
                            bar.wait(); // Wait for the start signal
                            for _ in 0..iters_per_thread {
                                let _ = black_box(g.decide());
                            }
                        }));
                    }

                    // Synchronize the start across all threads
                    barrier.wait();
                    let start = Instant::now();

                    for handle in handles {
                        let _ = handle.join();
                    }

                    start.elapsed()
                });
            },
        );
    }
    group.finish();
}

fn bench_dynamic_gate(group_name: &str, c: &mut Criterion, gate: Arc<dyn Gate + Send + Sync>) {
    let mut group = c.benchmark_group(format!("Dynamic-{}", group_name));

    group.bench_function("single-threaded", |b| {
        b.iter(|| {
            let _ = black_box(gate.as_ref()).decide();
        })
    });

    group.finish();
}

fn controller(max_permission: u64, block_ratio: f64, start: SystemTime) -> AdmissionController {
    let ratio = BlockRatio::new(block_ratio).expect("valid block ratio");
    AdmissionController::new(AdmissionConfig::new(max_permission, ratio, start))
}

fn run_all_benches(c: &mut Criterion) {
    // Large enough that the cap is never reached while measuring the admit path
    let capacity = u64::MAX;
    let far_future = SystemTime::now() + std::time::Duration::from_secs(86_400);

    let open = Arc::new(controller(capacity, 0.0, SystemTime::UNIX_EPOCH));
    let shedding = Arc::new(controller(capacity, 0.5, SystemTime::UNIX_EPOCH));
    let exhausted = Arc::new(controller(0, 0.0, SystemTime::UNIX_EPOCH));
    let not_started = Arc::new(controller(capacity, 0.0, far_future));
    let counted = Arc::new(
        controller(capacity, 0.0, SystemTime::UNIX_EPOCH).with_counter(Arc::new(LocalCounter::new())),
    );

    bench_single_gate("Open", c, Arc::clone(&open));
    bench_parallel_gate("Open", c, open.clone());

    bench_single_gate("Shedding", c, Arc::clone(&shedding));
    bench_parallel_gate("Shedding", c, shedding.clone());

    bench_single_gate("Exhausted", c, Arc::clone(&exhausted));
    bench_parallel_gate("Exhausted", c, exhausted.clone());

    bench_single_gate("NotStarted", c, Arc::clone(&not_started));

    bench_single_gate("LocalCounter", c, Arc::clone(&counted));
    bench_parallel_gate("LocalCounter", c, counted.clone());

    let gates: Vec<(&str, Arc<dyn Gate + Send + Sync>)> = vec![
        ("Open", open),
        ("Shedding", shedding),
        ("Exhausted", exhausted),
    ];

    for (name, gate) in gates {
        bench_dynamic_gate(name, c, gate);
    }
}

criterion_group!(benches, run_all_benches);
criterion_main!(benches);
