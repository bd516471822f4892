use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lrucache::LruCache;

fn bench_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("hit_1k", |b| {
        let mut cache = LruCache::new(1000);
        for i in 0..1000u64 {
            cache.add(i, vec![b'x'; 64]);
        }

        let mut counter = 0u64;
        b.iter(|| {
            black_box(cache.get(&(counter % 1000)));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_add_evicting(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_add");
    group.throughput(Throughput::Elements(1));

    group.bench_function("evicting_cap_100", |b| {
        let mut cache = LruCache::new(100);
        let mut counter = 0u64;
        b.iter(|| {
            cache.add(counter, counter);
            counter += 1;
        });
        black_box(cache.len());
    });

    group.bench_function("mixed_50_50", |b| {
        let mut cache = LruCache::new(500);
        let mut counter = 0u64;
        b.iter(|| {
            let key = counter % 1000;
            if counter % 2 == 0 {
                black_box(cache.get(&key));
            } else {
                cache.add(key, counter);
            }
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_hit, bench_add_evicting);
criterion_main!(benches);
