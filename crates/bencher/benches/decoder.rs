use std::hint::black_box;

use bencher::{TestCase, TestFile};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ulocal_http::buffer::BufferConfig;
use ulocal_http::codec::{Decoder, RequestDecoder};

static SMALL_HEADER: TestFile = TestFile::new("get_small.txt", include_str!("../resources/request/get_small.txt"));
static LARGE_HEADER: TestFile = TestFile::new("get_large.txt", include_str!("../resources/request/get_large.txt"));
static JSON_BODY: TestFile = TestFile::new("post_json.txt", include_str!("../resources/request/post_json.txt"));

fn create_test_cases() -> Vec<TestCase> {
    vec![
        TestCase::whole("small_header", SMALL_HEADER),
        TestCase::whole("large_header", LARGE_HEADER),
        TestCase::whole("json_body", JSON_BODY),
        TestCase::fragmented("large_header_by_64", LARGE_HEADER, 64),
        TestCase::fragmented("json_body_by_16", JSON_BODY, 16),
    ]
}

fn benchmark_request_decoder(criterion: &mut Criterion) {
    let test_cases = create_test_cases();
    let mut group = criterion.benchmark_group("request_decoder");

    for case in test_cases {
        group.throughput(Throughput::Bytes(case.file().content().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            let mut request_decoder = RequestDecoder::new();
            let pieces = case.pieces();
            b.iter_batched_ref(
                || BufferConfig::default().build(),
                |buffer| {
                    for piece in &pieces {
                        buffer.write(piece).expect("fixture should fit the buffer");
                        if let Some(request) = request_decoder.decode(buffer).expect("fixture should be a valid http request") {
                            black_box(request);
                        }
                        buffer.realign();
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(decoder, benchmark_request_decoder);
criterion_main!(decoder);
