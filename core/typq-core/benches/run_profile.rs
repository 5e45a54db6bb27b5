//! Criterion benchmark for profile composition and full runs (made by FontLab https://www.fontlab.com/)

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use typq_core::profile::ProfileCatalog;
use typq_core::registry::CheckRegistry;
use typq_core::runner::{Runner, Targets};
use typq_core::testing::sample_face;

fn bench_compose(c: &mut Criterion) {
    let registry = CheckRegistry::builtin().unwrap();
    let catalog = ProfileCatalog::builtin();

    c.bench_function("compose adobefonts", |b| {
        b.iter(|| catalog.compose(black_box("adobefonts"), &registry).unwrap())
    });
}

fn bench_run(c: &mut Criterion) {
    let registry = CheckRegistry::builtin().unwrap();
    let profile = ProfileCatalog::builtin()
        .compose("universal", &registry)
        .unwrap();
    let styles = ["Regular", "Italic", "Bold", "BoldItalic"];
    let targets = Targets::new().with_fonts(
        styles
            .iter()
            .map(|style| sample_face(&format!("Cabin-{style}.ttf"))),
    );

    c.bench_function("run universal over 4 fonts", |b| {
        b.iter(|| {
            Runner::new(&registry, &profile)
                .run(black_box(&targets))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_compose, bench_run);
criterion_main!(benches);
