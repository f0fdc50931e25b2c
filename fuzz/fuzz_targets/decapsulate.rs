#![no_main]

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use oblivious_http::{Gateway, KeyConfig, KeyPair, Kem, Response};

static GATEWAY: Lazy<Gateway> = Lazy::new(|| {
    let config = KeyConfig::create(1, 0x0020, 0x0001, 0x0001).expect("config");
    let keys = KeyPair::derive(Kem::X25519HkdfSha256, &[0x5a; 32]).expect("derive");
    Gateway::new(&keys.private_key().to_bytes(), config).expect("gateway")
});

fuzz_target!(|data: &[u8]| {
    let gateway = &*GATEWAY;
    if let Ok(mut request) = gateway.decrypt_request(data) {
        let context = request.release_context();
        let _ = Response::decapsulate(data, &context);
    }
});
