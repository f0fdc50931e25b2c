#![no_main]

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use oblivious_http::{Gateway, KeyConfig, KeyPair, Kem};

static GATEWAY: Lazy<Gateway> = Lazy::new(|| {
    let config = KeyConfig::create(1, 0x0020, 0x0001, 0x0003).expect("config");
    let keys = KeyPair::derive(Kem::X25519HkdfSha256, &[0xa5; 32]).expect("derive");
    Gateway::new(&keys.private_key().to_bytes(), config).expect("gateway")
});

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let split = (data[0] as usize) % data.len();
    let body = &data[1..];
    let split = split.min(body.len());

    let mut decoder = GATEWAY.chunked_request_decoder();
    if decoder.decrypt(&body[..split], false).is_ok() {
        let _ = decoder.decrypt(&body[split..], true);
    }
});
