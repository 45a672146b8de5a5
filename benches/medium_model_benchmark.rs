use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};

use lora_medium_sim::airtime::{self, DelayInput};
use lora_medium_sim::drop_model::{self, DropContext};
use lora_medium_sim::link_budget::{self, LinkBudgetInput};

fn link_budget_benchmark(c: &mut Criterion) {
    let input = LinkBudgetInput {
        sender_id: 1,
        receiver_id: 2,
        distance_km: 3.5,
        sf: 9,
        tx_power_dbm: 23.0,
        aqi: 60,
        weather: "moderate",
        obstacle: "brick",
    };
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("link_budget::compute", |b| {
        b.iter(|| black_box(link_budget::compute(black_box(&input), &mut rng)))
    });

    c.bench_function("link_budget::path_loss_db", |b| {
        b.iter(|| black_box(link_budget::path_loss_db(black_box(&input))))
    });
}

fn airtime_benchmark(c: &mut Criterion) {
    let input = DelayInput {
        payload_len: 32,
        sf: 9,
        distance_km: 3.5,
        snr_db: 4.0,
        weather: "moderate",
        obstacle: "brick",
    };
    let mut rng = StdRng::seed_from_u64(7);

    c.bench_function("airtime::time_on_air_ms", |b| {
        b.iter(|| black_box(airtime::time_on_air_ms(black_box(32), black_box(9))))
    });

    c.bench_function("airtime::total_delay_ms", |b| {
        b.iter(|| black_box(airtime::total_delay_ms(black_box(&input), &mut rng)))
    });
}

fn drop_model_benchmark(c: &mut Criterion) {
    let ctx = DropContext {
        now: tokio::time::Instant::now(),
        receiver_busy_until: None,
        distance_km: 3.5,
        sf: 9,
        rssi_dbm: -110.0,
        snr_db: 2.0,
        inflight: 4,
        loss_streak: 1,
    };
    let mut rng = StdRng::seed_from_u64(99);

    c.bench_function("drop_model::evaluate", |b| {
        b.iter(|| black_box(drop_model::evaluate(black_box(&ctx), &mut rng)))
    });
}

criterion_group!(benches, link_budget_benchmark, airtime_benchmark, drop_model_benchmark);
criterion_main!(benches);
