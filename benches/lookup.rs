use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use label_index::{
    ComponentProperty, IndexRegistry, LabelIndex, LabelIndexConfig, MemoryStorageProvider,
};

const TOPICS: &[&str] = &[
    "water", "energy", "education", "health", "transport", "agriculture", "housing",
    "disaster", "trade", "finance",
];
const ASPECTS: &[&str] = &[
    "supply", "prevention", "policy", "infrastructure", "research", "services", "management",
    "development", "security", "statistics",
];

fn build_index(size: usize) -> Arc<LabelIndex> {
    let registry = IndexRegistry::with_storage_provider(
        LabelIndexConfig::default(),
        Arc::new(MemoryStorageProvider::new()),
    )
    .expect("valid config");
    let uris: Vec<String> = (0..size).map(|i| format!("urn:concept:{i}")).collect();
    registry
        .get_or_fill(
            &ComponentProperty::new("http://example.org/ontology/theme"),
            &uris,
            |uri| {
                let i: usize = uri.rsplit(':').next().and_then(|n| n.parse().ok()).unwrap_or(0);
                let topic = TOPICS[i % TOPICS.len()];
                let aspect = ASPECTS[(i / TOPICS.len()) % ASPECTS.len()];
                vec![format!("{topic} {aspect} {i}"), format!("{topic} {aspect}")]
            },
        )
        .expect("index built")
}

fn bench_lookup(c: &mut Criterion) {
    const CASES: &[(&str, &str)] = &[
        ("short", "gas"),
        ("exact", "water supply"),
        ("misspelled", "educaton polcy"),
        ("long", "disaster prevention and preparedness"),
    ];
    for size in [100usize, 1_000] {
        let index = build_index(size);
        for &(name, query) in CASES {
            c.bench_with_input(
                BenchmarkId::new(format!("lookup_{size}"), name),
                &query,
                |b, &query| {
                    b.iter(|| black_box(index.lookup(query).expect("lookup")));
                },
            );
        }
    }
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("build_1000", |b| {
        b.iter(|| black_box(build_index(1_000)));
    });
}

criterion_group!(benches, bench_lookup, bench_build);
criterion_main!(benches);
