use criterion::{black_box, criterion_group, criterion_main, Criterion};
use personalize::{compile, flatten, BlockMode, Recipient, Renderer};

fn recipient() -> Recipient {
    Recipient::new("u-1", "ana@example.com")
        .with_first_name("Ana")
        .with_last_name("Silva")
        .with_role("host")
        .with_tags(["vip", "early"])
        .with_login_count(3)
        .with_custom("plan", "pro")
}

fn make_template(repeats: usize) -> String {
    let chunk = "Hi {{user_first_name}}! {{#if role == 'host'}}You host {{plan}} cars.{{/if}} \
                 {{#unless is_subscribed}}Upgrade today.{{/unless}} \
                 {{#if tags includes 'vip'}}VIP perks for {{user_full_name}}.{{/if}}\n";
    chunk.repeat(repeats)
}

fn bench_render(c: &mut Criterion) {
    let r = recipient();
    let small = make_template(10); // ~2k
    let large = make_template(200); // ~40k

    let nested = Renderer::new(BlockMode::Nested);
    let legacy = Renderer::new(BlockMode::Legacy);

    let mut g = c.benchmark_group("render");

    g.bench_function("nested_small", |b| {
        b.iter(|| nested.render(black_box(&small), black_box(&r)))
    });
    g.bench_function("legacy_small", |b| {
        b.iter(|| legacy.render(black_box(&small), black_box(&r)))
    });
    g.bench_function("nested_large", |b| {
        b.iter(|| nested.render(black_box(&large), black_box(&r)))
    });
    g.bench_function("legacy_large", |b| {
        b.iter(|| legacy.render(black_box(&large), black_box(&r)))
    });

    let compiled = compile(&large);
    let ctx = flatten(&r);
    g.bench_function("precompiled_large", |b| {
        b.iter(|| compiled.render(black_box(&ctx)))
    });

    g.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
