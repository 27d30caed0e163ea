use criterion::{criterion_group, criterion_main, Criterion};
use sim_core::{ActionBundle, Channel, Params};
use sim_runtime::Episode;

fn spend_action() -> ActionBundle {
    let mut a = ActionBundle::default();
    a.marketing.spend = 25_000.0;
    a.marketing.channel = Channel::Brand;
    a.product.r_and_d_spend = 10_000.0;
    a
}

fn bench_step(c: &mut Criterion) {
    let action = spend_action();
    let mut episode = Episode::new(Params::default(), Some(42));
    c.bench_function("episode_step", |b| {
        b.iter(|| {
            if episode.is_over() {
                episode.reset(Some(42));
            }
            let _ = episode.step(&action);
        })
    });

    c.bench_function("episode_full_120_months", |b| {
        b.iter(|| {
            let mut ep = Episode::new(Params::default(), Some(42));
            while ep.step(&action).is_ok() {}
        })
    });
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
