use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use search_core::{DocumentStatus, ExecutionPolicy, SearchServer};

fn build_server(docs: usize) -> SearchServer {
    let vocabulary: Vec<String> = (0..2_000).map(|i| format!("w{i}")).collect();
    let mut server = SearchServer::new("w0 w1 w2").expect("valid stop words");
    let mut seed: u64 = 17;
    for id in 0..docs {
        let text: Vec<&str> = (0..64)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                vocabulary[(seed >> 33) as usize % vocabulary.len()].as_str()
            })
            .collect();
        server
            .add_document(id as i32, &text.join(" "), DocumentStatus::Actual, &[1, 2, 3])
            .expect("generated document is valid");
    }
    server
}

fn bench_find_top(c: &mut Criterion) {
    let server = build_server(10_000);
    let query = "w10 w20 w30 w40 w50 w60 w70 w80 w90 w100 -w110 -w120";
    let mut group = c.benchmark_group("find_top_documents");
    for policy in [ExecutionPolicy::Sequential, ExecutionPolicy::Parallel] {
        group.bench_with_input(BenchmarkId::from_parameter(format!("{policy:?}")), &policy, |b, &policy| {
            b.iter(|| server.find_top_documents_with(policy, query, DocumentStatus::Actual))
        });
    }
    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_document");
    group.sample_size(10);
    for policy in [ExecutionPolicy::Sequential, ExecutionPolicy::Parallel] {
        group.bench_with_input(BenchmarkId::from_parameter(format!("{policy:?}")), &policy, |b, &policy| {
            b.iter_batched(
                || build_server(2_000),
                |mut server| {
                    for id in 0..2_000 {
                        server.remove_document_with(policy, id);
                    }
                    server
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_find_top, bench_remove);
criterion_main!(benches);
