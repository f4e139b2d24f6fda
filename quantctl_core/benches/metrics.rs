use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quantctl_core::metrics::{band_energy, vrms};

fn synthetic_window(n: usize, hz: f64, sample_rate_hz: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate_hz;
            (2.0 * std::f64::consts::PI * hz * t).sin()
        })
        .collect()
}

fn bench_metrics(c: &mut Criterion) {
    let samples = synthetic_window(2_000, 1.0, 10_000.0);

    c.bench_function("vrms_2000_samples", |b| {
        b.iter(|| vrms(black_box(&samples)));
    });

    c.bench_function("band_energy_2000_samples", |b| {
        b.iter(|| band_energy(black_box(&samples), black_box(10_000.0)));
    });
}

criterion_group!(benches, bench_metrics);
criterion_main!(benches);
