use oblivious_http::{Client, Context, Gateway, KeyConfig, KeyPair, Kem, OhttpError};

fn setup() -> (Client, Gateway) {
    let config = KeyConfig::create(3, 0x0020, 0x0001, 0x0003).unwrap();
    let keys = KeyPair::generate(Kem::X25519HkdfSha256);
    let gateway = Gateway::new(&keys.private_key().to_bytes(), config).unwrap();
    let client = Client::new(gateway.public_key(), config).unwrap();
    (client, gateway)
}

/// Client stream of `chunks`, the last one final.
fn request_stream(client: &Client, chunks: &[&[u8]]) -> (Vec<u8>, Context) {
    let mut encoder = client.chunked_request_encoder().unwrap();
    let mut wire = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        wire.extend(encoder.encrypt_chunk(chunk, i + 1 == chunks.len()).unwrap());
    }
    (wire, encoder.release_context().unwrap())
}

fn gateway_context(gateway: &Gateway, wire: &[u8]) -> Context {
    let mut decoder = gateway.chunked_request_decoder();
    decoder.decrypt(wire, true).unwrap();
    decoder.release_context().unwrap()
}

#[test]
fn streamed_exchange() {
    let (client, gateway) = setup();
    let (wire, client_context) = request_stream(&client, &[b"GET ", b"/index", b".html"]);

    let mut decoder = gateway.chunked_request_decoder();
    let request = decoder.decrypt(&wire, true).unwrap();
    assert_eq!(request, b"GET /index.html");
    assert!(decoder.is_finished());
    let context = decoder.release_context().unwrap();

    let mut encoder = gateway.chunked_response_encoder(&context).unwrap();
    let mut response = Vec::new();
    response.extend(encoder.encrypt_chunk(b"HTTP/1.1 ", false).unwrap());
    response.extend(encoder.encrypt_chunk(b"200", false).unwrap());
    response.extend(encoder.encrypt_chunk(b"", true).unwrap());
    assert!(encoder.is_finished());

    let mut decoder = client.chunked_response_decoder(&client_context);
    assert_eq!(decoder.decrypt(&response, true).unwrap(), b"HTTP/1.1 200");
    assert!(decoder.is_finished());
}

#[test]
fn byte_at_a_time_decoding() {
    let (client, gateway) = setup();
    let (wire, client_context) = request_stream(&client, &[b"alpha", b"beta", b"gamma"]);

    let mut decoder = gateway.chunked_request_decoder();
    let mut plaintext = Vec::new();
    for byte in &wire {
        plaintext.extend(decoder.decrypt(core::slice::from_ref(byte), false).unwrap());
    }
    // The final chunk runs to end of stream, so it completes only then.
    assert_eq!(plaintext, b"alphabeta");
    plaintext.extend(decoder.decrypt(&[], true).unwrap());
    assert_eq!(plaintext, b"alphabetagamma");
    let context = decoder.release_context().unwrap();

    let mut encoder = gateway.chunked_response_encoder(&context).unwrap();
    let mut response = encoder.encrypt_chunk(b"one", false).unwrap();
    response.extend(encoder.encrypt_chunk(b"two", true).unwrap());

    let mut decoder = client.chunked_response_decoder(&client_context);
    let mut out = Vec::new();
    for piece in response.chunks(5) {
        out.extend(decoder.decrypt(piece, false).unwrap());
    }
    out.extend(decoder.decrypt(&[], true).unwrap());
    assert_eq!(out, b"onetwo");
}

#[test]
fn truncated_request_stream_detected() {
    let (client, gateway) = setup();
    let mut encoder = client.chunked_request_encoder().unwrap();
    let wire = encoder.encrypt_chunk(b"partial", false).unwrap();

    let mut decoder = gateway.chunked_request_decoder();
    assert_eq!(
        decoder.decrypt(&wire, true).unwrap_err(),
        OhttpError::Truncated("final chunk")
    );
}

#[test]
fn truncated_header_detected() {
    let (client, gateway) = setup();
    let (wire, _) = request_stream(&client, &[b"x"]);
    let mut decoder = gateway.chunked_request_decoder();
    assert_eq!(
        decoder.decrypt(&wire[..20], true).unwrap_err(),
        OhttpError::Truncated("chunked request header")
    );
}

#[test]
fn truncated_response_stream_detected() {
    let (client, gateway) = setup();
    let (wire, client_context) = request_stream(&client, &[b"ping"]);
    let context = gateway_context(&gateway, &wire);

    let mut encoder = gateway.chunked_response_encoder(&context).unwrap();
    let response = encoder.encrypt_chunk(b"first", false).unwrap();

    let mut decoder = client.chunked_response_decoder(&client_context);
    assert_eq!(decoder.decrypt(&response, false).unwrap(), b"first");
    assert!(decoder.decrypt(&[], true).is_err());
    assert!(!decoder.is_finished());
}

#[test]
fn non_final_chunk_cannot_pose_as_final() {
    let (client, gateway) = setup();
    let mut encoder = client.chunked_request_encoder().unwrap();
    let first = encoder.encrypt_chunk(b"only", false).unwrap();

    // Re-frame the non-final ciphertext behind a zero-length marker.
    let prefix_len = 7 + 32;
    let mut forged = first[..prefix_len].to_vec();
    forged.push(0x00);
    forged.extend_from_slice(&first[prefix_len + 1..]);

    let mut decoder = gateway.chunked_request_decoder();
    assert_eq!(
        decoder.decrypt(&forged, true).unwrap_err(),
        OhttpError::DecryptionFailed
    );
}

#[test]
fn reordered_chunks_fail() {
    let (client, gateway) = setup();
    let (wire, client_context) = request_stream(&client, &[b"ping"]);
    let context = gateway_context(&gateway, &wire);

    let mut encoder = gateway.chunked_response_encoder(&context).unwrap();
    let first = encoder.encrypt_chunk(b"aaaa", false).unwrap();
    let second = encoder.encrypt_chunk(b"bbbb", false).unwrap();
    let last = encoder.encrypt_chunk(b"", true).unwrap();

    // first = nonce(32) || chunk; swap the two intermediate chunks.
    let nonce_len = 32;
    let mut swapped = first[..nonce_len].to_vec();
    swapped.extend_from_slice(&second);
    swapped.extend_from_slice(&first[nonce_len..]);
    swapped.extend_from_slice(&last);

    let mut decoder = client.chunked_response_decoder(&client_context);
    assert_eq!(
        decoder.decrypt(&swapped, true).unwrap_err(),
        OhttpError::DecryptionFailed
    );
}

#[test]
fn writes_after_final_rejected() {
    let (client, gateway) = setup();
    let mut encoder = client.chunked_request_encoder().unwrap();
    let wire = encoder.encrypt_chunk(b"done", true).unwrap();
    assert!(encoder.is_finished());
    assert!(matches!(
        encoder.encrypt_chunk(b"more", false),
        Err(OhttpError::FailedPrecondition(_))
    ));

    let mut decoder = gateway.chunked_request_decoder();
    decoder.decrypt(&wire, true).unwrap();
    assert!(decoder.decrypt(&[], true).unwrap().is_empty());
    assert!(matches!(
        decoder.decrypt(b"trailing", true),
        Err(OhttpError::FailedPrecondition(_))
    ));
}

#[test]
fn empty_intermediate_chunk_rejected() {
    let (client, _) = setup();
    let mut encoder = client.chunked_request_encoder().unwrap();
    assert!(matches!(
        encoder.encrypt_chunk(b"", false),
        Err(OhttpError::InvalidArgument(_))
    ));
    // Empty final chunk is fine.
    encoder.encrypt_chunk(b"", true).unwrap();
}

#[test]
fn context_released_only_after_final() {
    let (client, gateway) = setup();
    let mut encoder = client.chunked_request_encoder().unwrap();
    let wire = encoder.encrypt_chunk(b"half", false).unwrap();
    assert!(matches!(
        encoder.release_context(),
        Err(OhttpError::FailedPrecondition(_))
    ));

    let mut decoder = gateway.chunked_request_decoder();
    assert_eq!(decoder.decrypt(&wire, false).unwrap(), b"half");
    assert!(matches!(
        decoder.release_context(),
        Err(OhttpError::FailedPrecondition(_))
    ));
}

#[test]
fn chunked_and_single_shot_labels_differ() {
    let (client, gateway) = setup();
    let (wire, _) = request_stream(&client, &[b"ping"]);
    // A chunked stream is not a valid single-shot request.
    assert!(gateway.decrypt_request(&wire).is_err());
}

#[test]
fn request_stream_fails_after_bad_chunk() {
    let (client, gateway) = setup();
    let mut encoder = client.chunked_request_encoder().unwrap();
    let mut first = encoder.encrypt_chunk(b"alpha", false).unwrap();
    let mut rest = encoder.encrypt_chunk(b"beta", false).unwrap();
    rest.extend(encoder.encrypt_chunk(b"", true).unwrap());

    // An injected chunk fails to open without consuming a sequence number.
    first.extend_from_slice(&[0x05, 1, 2, 3, 4, 5]);
    let mut decoder = gateway.chunked_request_decoder();
    assert_eq!(
        decoder.decrypt(&first, false).unwrap_err(),
        OhttpError::DecryptionFailed
    );

    // The genuine remainder must not resume the stream.
    assert!(matches!(
        decoder.decrypt(&rest, true),
        Err(OhttpError::FailedPrecondition(_))
    ));
    assert!(!decoder.is_finished());
    assert!(matches!(
        decoder.release_context(),
        Err(OhttpError::FailedPrecondition(_))
    ));
}

#[test]
fn response_stream_fails_after_bad_chunk() {
    let (client, gateway) = setup();
    let (wire, client_context) = request_stream(&client, &[b"ping"]);
    let context = gateway_context(&gateway, &wire);

    let mut encoder = gateway.chunked_response_encoder(&context).unwrap();
    let mut first = encoder.encrypt_chunk(b"one", false).unwrap();
    let rest = encoder.encrypt_chunk(b"two", true).unwrap();

    first.extend_from_slice(&[0x03, 9, 9, 9]);
    let mut decoder = client.chunked_response_decoder(&client_context);
    assert_eq!(
        decoder.decrypt(&first, false).unwrap_err(),
        OhttpError::DecryptionFailed
    );
    assert!(matches!(
        decoder.decrypt(&rest, true),
        Err(OhttpError::FailedPrecondition(_))
    ));
    assert!(!decoder.is_finished());
}

#[test]
fn oversized_chunk_length_rejected() {
    let (client, gateway) = setup();
    let mut encoder = client.chunked_request_encoder().unwrap();
    let mut wire = encoder.encrypt_chunk(b"head", false).unwrap();

    // Eight-byte varint declaring a 2^36 byte chunk.
    wire.extend_from_slice(&[0xc0, 0, 0, 0x10, 0, 0, 0, 0]);
    let mut decoder = gateway.chunked_request_decoder();
    assert_eq!(
        decoder.decrypt(&wire, false).unwrap_err(),
        OhttpError::InvalidArgument("chunk exceeds maximum size")
    );
    assert!(matches!(
        decoder.decrypt(&[0u8; 16], false),
        Err(OhttpError::FailedPrecondition(_))
    ));
}

#[test]
fn oversized_plaintext_rejected() {
    let (client, _) = setup();
    let mut encoder = client.chunked_request_encoder().unwrap();
    let big = vec![0u8; oblivious_http::MAX_CHUNK_BYTES];
    assert_eq!(
        encoder.encrypt_chunk(&big, true).unwrap_err(),
        OhttpError::InvalidArgument("chunk exceeds maximum size")
    );
    assert!(!encoder.is_finished());
}
