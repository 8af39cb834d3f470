use std::hint::black_box;

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use http::header::{CONTENT_TYPE, SERVER};
use http::{HeaderValue, Method, StatusCode};
use tokio_util::codec::Encoder;
use ulocal_http::codec::{RequestEncoder, ResponseEncoder};
use ulocal_http::protocol::{HttpMessage, Request, Response};
use ulocal_http::server::finalize_response;

fn responses() -> Vec<(&'static str, Response)> {
    let mut small = Response::new(StatusCode::OK).with_body("Hello World!\r\n");
    finalize_response(&mut small);

    let mut large = Response::new(StatusCode::OK)
        .with_header(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"))
        .with_body(vec![b'x'; 64 * 1024]);
    finalize_response(&mut large);

    vec![("small_body", small), ("large_body", large)]
}

fn benchmark_response_encoder(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("response_encoder");

    for (name, response) in responses() {
        group.throughput(Throughput::Bytes(response.body().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &response, |b, response| {
            let mut encoder = ResponseEncoder::new();
            let mut dst = BytesMut::with_capacity(response.body().len() + 256);
            b.iter(|| {
                dst.clear();
                encoder.encode(response, &mut dst).expect("encoding into memory should not fail");
                black_box(&dst);
            });
        });
    }

    group.finish();
}

fn benchmark_request_encoder(criterion: &mut Criterion) {
    let mut request = Request::new(Method::POST, "/api/v1/containers/create?name=web server&label=a/b")
        .expect("resource should be valid")
        .with_header(SERVER, HeaderValue::from_static("bench"))
        .with_body(r#"{"Image":"nginx:1.27"}"#);
    request.calculate_content_length();

    criterion.bench_function("request_encoder", |b| {
        let mut encoder = RequestEncoder::new();
        let mut dst = BytesMut::new();
        b.iter(|| {
            dst.clear();
            encoder.encode(&request, &mut dst).expect("encoding into memory should not fail");
            black_box(&dst);
        });
    });
}

criterion_group!(encoder, benchmark_response_encoder, benchmark_request_encoder);
criterion_main!(encoder);
