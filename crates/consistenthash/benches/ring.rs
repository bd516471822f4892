use consistenthash::HashRing;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_get");
    group.throughput(Throughput::Elements(1));

    for replicas in [1usize, 50, 200] {
        let mut ring = HashRing::new(replicas);
        ring.add((0..16).map(|i| format!("cache-{i}")));
        let keys: Vec<String> = (0..1024).map(|i| format!("key-{i}")).collect();

        group.bench_with_input(BenchmarkId::from_parameter(replicas), &replicas, |b, _| {
            let mut counter = 0;
            b.iter(|| {
                black_box(ring.get(&keys[counter % keys.len()]));
                counter += 1;
            });
        });
    }

    group.finish();
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_add");
    group.sample_size(50);

    group.bench_function("16_nodes_50_replicas", |b| {
        let nodes: Vec<String> = (0..16).map(|i| format!("cache-{i}")).collect();
        b.iter(|| {
            let mut ring = HashRing::new(50);
            ring.add(&nodes);
            black_box(ring.position_count());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_get, bench_add);
criterion_main!(benches);
