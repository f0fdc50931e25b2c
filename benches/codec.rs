//! Codec benchmarks: request and response encapsulation across payload
//! sizes and AEADs, plus chunked streaming.
//!
//! Run with: `cargo bench --bench codec`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use oblivious_http::{Client, Gateway, KeyConfig, KeyConfigSet, KeyPair, Kem};

/// Payload sizes to benchmark.
const PAYLOAD_SIZES: &[usize] = &[64, 1024, 65_536];

fn setup(aead_id: u16) -> (Client, Gateway) {
    let config = KeyConfig::create(1, 0x0020, 0x0001, aead_id).expect("config");
    let keys = KeyPair::generate(Kem::X25519HkdfSha256);
    let gateway = Gateway::new(&keys.private_key().to_bytes(), config).expect("gateway");
    let client = Client::new(gateway.public_key(), config).expect("client");
    (client, gateway)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn bench_request(c: &mut Criterion) {
    let mut group = c.benchmark_group("request");

    for &size in PAYLOAD_SIZES {
        let payload = vec![0x42u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        for (name, aead_id) in [("aes128gcm", 0x0001), ("chacha20poly1305", 0x0003)] {
            let (client, gateway) = setup(aead_id);
            let wire = client.create_request(&payload).expect("request").serialize();

            group.bench_with_input(BenchmarkId::new(format!("encapsulate/{}", name), size), &payload, |b, p| {
                b.iter(|| client.create_request(p).expect("request"));
            });
            group.bench_with_input(BenchmarkId::new(format!("decapsulate/{}", name), size), &wire, |b, w| {
                b.iter(|| gateway.decrypt_request(w).expect("decrypt"));
            });
        }
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

fn bench_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("response");
    let (client, gateway) = setup(0x0001);

    let mut request = client.create_request(b"ping").expect("request");
    let wire = request.serialize();
    let client_context = request.release_context();
    let gateway_context = gateway.decrypt_request(&wire).expect("decrypt").release_context();

    for &size in PAYLOAD_SIZES {
        let payload = vec![0x42u8; size];
        let response = gateway.create_response(&payload, &gateway_context).expect("response");
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encapsulate", size), &payload, |b, p| {
            b.iter(|| gateway.create_response(p, &gateway_context).expect("response"));
        });
        group.bench_with_input(BenchmarkId::new("decapsulate", size), response.wire_bytes(), |b, w| {
            b.iter(|| client.decrypt_response(w, &client_context).expect("decrypt"));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Chunked
// ---------------------------------------------------------------------------

fn bench_chunked(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunked");
    let (client, gateway) = setup(0x0001);
    let chunk = vec![0x42u8; 4096];
    const CHUNKS: usize = 16;
    group.throughput(Throughput::Bytes((chunk.len() * CHUNKS) as u64));

    group.bench_function("request_stream", |b| {
        b.iter(|| {
            let mut encoder = client.chunked_request_encoder().expect("encoder");
            let mut wire = Vec::new();
            for i in 0..CHUNKS {
                wire.extend(encoder.encrypt_chunk(&chunk, i + 1 == CHUNKS).expect("chunk"));
            }
            let mut decoder = gateway.chunked_request_decoder();
            decoder.decrypt(&wire, true).expect("decrypt")
        });
    });

    group.finish();
}

fn bench_key_directory(c: &mut Criterion) {
    let (_, gateway) = setup(0x0001);
    let directory = gateway.key_directory().expect("directory");
    c.bench_function("key_directory/parse", |b| {
        b.iter(|| KeyConfigSet::parse(&directory).expect("parse"));
    });
}

criterion_group!(benches, bench_request, bench_response, bench_chunked, bench_key_directory);
criterion_main!(benches);
