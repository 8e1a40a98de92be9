use apidsl_config::Config;
use apidsl_engine::{build, compile};
use apidsl_syntax::{parse_document, scan};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
mod common;

fn bench_pipeline(c: &mut Criterion) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    for size in [10, 100] {
        let content = common::generate_api_content(size);

        group.bench_with_input(BenchmarkId::new("scan", size), &content, |b, content| {
            b.iter(|| black_box(scan("bench.api", black_box(content))));
        });

        group.bench_with_input(BenchmarkId::new("parse", size), &content, |b, content| {
            b.iter(|| black_box(parse_document("bench.api", black_box(content))));
        });

        let schema = parse_document("bench.api", &content).schema;
        group.bench_with_input(BenchmarkId::new("build", size), &schema, |b, schema| {
            b.iter(|| black_box(build(black_box(schema), Config::default())));
        });
    }

    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    group.sample_size(10);

    let content = common::generate_api_content(100);
    let graph = match compile("bench.api", &content) {
        Ok(graph) => graph,
        Err(err) => panic!("benchmark source does not compile: {err}"),
    };
    let root = graph.root();

    group.bench_function("require_writer_chain", |b| {
        b.iter(|| black_box(root.entity("Entity99").map(|e| e.require_writer())));
    });

    group.bench_function("mock_chain", |b| {
        b.iter(|| black_box(root.entity("Entity99").map(|e| e.mock())));
    });

    group.bench_function("find_endpoint_template", |b| {
        b.iter(|| black_box(root.find_endpoint("GET", black_box("/entities50/7"))));
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_queries);
criterion_main!(benches);
