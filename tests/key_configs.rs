use oblivious_http::{
    Gateway, KeyConfig, KeyConfigSet, KeyEntry, KeyPair, Kem, OhttpError, SymmetricAlgorithm,
};

fn record(key_id: u8, public_key: &[u8], pairs: &[(u16, u16)]) -> Vec<u8> {
    let mut out = vec![key_id, 0x00, 0x20];
    out.extend_from_slice(public_key);
    out.extend_from_slice(&((pairs.len() * 4) as u16).to_be_bytes());
    for (kdf, aead) in pairs {
        out.extend_from_slice(&kdf.to_be_bytes());
        out.extend_from_slice(&aead.to_be_bytes());
    }
    out
}

fn public_key() -> Vec<u8> {
    KeyPair::generate(Kem::X25519HkdfSha256).public_key().to_bytes()
}

#[test]
fn preferred_config_uses_highest_key_id() {
    let mut directory = record(0x01, &public_key(), &[(1, 1)]);
    directory.extend(record(0x05, &public_key(), &[(1, 3), (1, 1)]));

    let set = KeyConfigSet::parse(&directory).unwrap();
    assert_eq!(set.num_keys(), 2);
    assert_eq!(set.preferred_config().key_id(), 0x05);
    assert_eq!(set.configs_for(0x05).unwrap().len(), 2);
}

#[test]
fn serialize_orders_keys_descending() {
    let low = public_key();
    let high = public_key();
    let mut directory = record(0x02, &low, &[(1, 1)]);
    directory.extend(record(0x09, &high, &[(3, 2)]));

    let set = KeyConfigSet::parse(&directory).unwrap();
    let mut expected = record(0x09, &high, &[(3, 2)]);
    expected.extend(record(0x02, &low, &[(1, 1)]));
    assert_eq!(set.serialize(), expected);

    let ids: Vec<u8> = set.iter().map(KeyConfig::key_id).collect();
    assert_eq!(ids, [0x09, 0x02]);
}

#[test]
fn duplicate_key_id_rejected() {
    let mut directory = record(0x07, &public_key(), &[(1, 1)]);
    directory.extend(record(0x07, &public_key(), &[(1, 2)]));
    assert_eq!(
        KeyConfigSet::parse(&directory).unwrap_err(),
        OhttpError::DuplicateKeyId(0x07)
    );
}

#[test]
fn unknown_kem_rejected() {
    let mut directory = record(0x01, &public_key(), &[(1, 1)]);
    directory[1..3].copy_from_slice(&0x0010u16.to_be_bytes());
    assert_eq!(
        KeyConfigSet::parse(&directory).unwrap_err(),
        OhttpError::UnknownKem(0x0010)
    );
}

#[test]
fn truncation_rejected_everywhere() {
    let directory = record(0x01, &public_key(), &[(1, 1), (1, 3)]);
    for len in 1..directory.len() {
        assert!(
            matches!(KeyConfigSet::parse(&directory[..len]), Err(OhttpError::Truncated(_))),
            "prefix of {} bytes parsed",
            len
        );
    }
}

#[test]
fn ragged_algorithm_list_rejected() {
    let mut directory = record(0x01, &public_key(), &[(1, 1)]);
    let len_at = 3 + 32;
    directory[len_at..len_at + 2].copy_from_slice(&3u16.to_be_bytes());
    directory.truncate(len_at + 2 + 3);
    assert_eq!(
        KeyConfigSet::parse(&directory).unwrap_err(),
        OhttpError::Truncated("symmetric algorithms")
    );
}

#[test]
fn empty_inputs_rejected() {
    assert!(matches!(KeyConfigSet::parse(&[]), Err(OhttpError::InvalidArgument(_))));
    let directory = record(0x01, &public_key(), &[]);
    assert!(matches!(
        KeyConfigSet::parse(&directory),
        Err(OhttpError::InvalidArgument(_))
    ));
    assert!(matches!(
        KeyConfigSet::from_entries(Vec::new()),
        Err(OhttpError::InvalidArgument(_))
    ));
}

#[test]
fn unsupported_symmetric_pair_rejected() {
    let directory = record(0x01, &public_key(), &[(1, 0x00ff)]);
    assert!(matches!(
        KeyConfigSet::parse(&directory),
        Err(OhttpError::InvalidArgument(_))
    ));
}

#[test]
fn public_key_lookup() {
    let pk = public_key();
    let set = KeyConfigSet::parse(&record(0x04, &pk, &[(1, 1)])).unwrap();
    assert_eq!(set.public_key_for(0x04).unwrap(), &pk[..]);
    assert_eq!(set.public_key_for(0x03).unwrap_err(), OhttpError::NotFound(0x03));
    assert_eq!(set.configs_for(0x03).unwrap_err(), OhttpError::NotFound(0x03));
}

#[test]
fn from_entries_matches_parse() {
    let pk = public_key();
    let entries = vec![KeyEntry {
        key_id: 0x11,
        kem_id: 0x0020,
        public_key: pk.clone(),
        symmetric_algorithms: vec![
            SymmetricAlgorithm { kdf_id: 1, aead_id: 1 },
            SymmetricAlgorithm { kdf_id: 2, aead_id: 2 },
        ],
    }];
    let built = KeyConfigSet::from_entries(entries).unwrap();
    let parsed = KeyConfigSet::parse(&record(0x11, &pk, &[(1, 1), (2, 2)])).unwrap();
    assert_eq!(built.serialize(), parsed.serialize());
}

#[test]
fn from_entries_validates_key_length() {
    let entries = vec![KeyEntry {
        key_id: 0x01,
        kem_id: 0x0020,
        public_key: vec![0u8; 31],
        symmetric_algorithms: vec![SymmetricAlgorithm { kdf_id: 1, aead_id: 1 }],
    }];
    assert!(matches!(
        KeyConfigSet::from_entries(entries),
        Err(OhttpError::InvalidArgument(_))
    ));
}

#[test]
fn gateway_directory_selects_request_config() {
    let config = KeyConfig::create(0x2a, 0x0020, 0x0002, 0x0002).unwrap();
    let keys = KeyPair::generate(Kem::X25519HkdfSha256);
    let gateway = Gateway::new(&keys.private_key().to_bytes(), config).unwrap();

    let set = KeyConfigSet::parse(&gateway.key_directory().unwrap()).unwrap();
    assert_eq!(set.preferred_config(), config);
    assert_eq!(set.public_key_for(0x2a).unwrap(), gateway.public_key());

    let client = oblivious_http::Client::new(set.public_key_for(0x2a).unwrap(), set.preferred_config()).unwrap();
    let wire = client.create_request(b"ping").unwrap().serialize();
    assert_eq!(set.config_for_request(&wire).unwrap(), config);
    assert_eq!(gateway.decrypt_request(&wire).unwrap().plaintext(), b"ping");
}

#[test]
fn shared_across_threads() {
    let set = std::sync::Arc::new(KeyConfigSet::parse(&record(0x01, &public_key(), &[(1, 1)])).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let set = set.clone();
            std::thread::spawn(move || set.preferred_config().key_id())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 0x01);
    }
}
