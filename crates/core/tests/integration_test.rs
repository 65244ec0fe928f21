//! Integration tests for the anonymous Aadhaar core library

use anon_aadhar_core::circuit::{generate_witness, CircuitConfig, RevealPolicy, RevealedData};
use anon_aadhar_core::claims::{claims_root, template_root, ClaimValues, CredentialClaims};
use anon_aadhar_core::context::ProofContext;
use anon_aadhar_core::crypto::{load_public_key, public_key_hash, verify_document};
use anon_aadhar_core::field::fr_from_decimal;
use anon_aadhar_core::inputs::{extract_photo, pack_photo, prepare_circuit_inputs, CircuitInputs};
use anon_aadhar_core::nullifier::{derive_nullifier, NullifierSeed};
use anon_aadhar_core::qr::{parse_document, split_document};
use anon_aadhar_core::AadharError;
use ark_bn254::Fr;
use ark_ff::One;
use rsa::{pkcs1::DecodeRsaPrivateKey, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Get path to test fixtures
fn get_fixture_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop(); // go to workspace root
    path.pop();
    path.push("tests");
    path.push("fixtures");
    path.push(filename);
    path
}

fn load_document() -> Vec<u8> {
    std::fs::read(get_fixture_path("test_document.bin")).unwrap()
}

fn load_issuer_key() -> RsaPublicKey {
    load_public_key(get_fixture_path("test_certificate.pem")).unwrap()
}

/// Public outputs of the fixture payload with seed 12345678
const FIXTURE_KEY_HASH: &str = "2548805819330081954746511694296850269153915953894408598475882038896023440627";
const FIXTURE_NULLIFIER: &str = "14332370342204511866679423124586507775942731477544726757895795989232971561680";
const FIXTURE_CLAIMS_ROOT: &str = "4792081868512399910947320912804808251413264938940137545114259230251647834300";
const TEMPLATE_ROOT: &str = "21162279512752848558643687689638440548975201907655694622097808177911859080522";

/// Smallest capacity that fits the fixture payload
fn create_test_config() -> CircuitConfig {
    CircuitConfig::with_capacity(384)
}

fn prepare(document: &[u8], config: &CircuitConfig, seed: u64, signal: u64) -> CircuitInputs {
    prepare_circuit_inputs(
        document,
        &load_issuer_key(),
        config,
        NullifierSeed::from(seed),
        Fr::from(signal),
        &CredentialClaims::default(),
    )
    .unwrap()
}

/// Re-sign the fixture payload with one field replaced
fn create_document_with_dob(dob: &str) -> Vec<u8> {
    let document = load_document();
    let (signed_data, _) = split_document(&document).unwrap();
    let patched: Vec<u8> = {
        let current = b"01-01-1984";
        let start = signed_data
            .windows(current.len())
            .position(|w| w == current)
            .unwrap();
        let mut data = signed_data.to_vec();
        data[start..start + current.len()].copy_from_slice(dob.as_bytes());
        data
    };

    let pem = std::fs::read_to_string(get_fixture_path("test_private_key.pem")).unwrap();
    let key = RsaPrivateKey::from_pkcs1_pem(&pem).unwrap();
    let signature = key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(&patched))
        .unwrap();

    let mut out = patched;
    out.extend_from_slice(&signature);
    out
}

#[test]
fn test_fixture_document() {
    env_logger::try_init().ok();

    let document = load_document();
    let parsed = parse_document(&document).unwrap();

    println!("✓ Parsed fixture payload");
    println!("  Reference ID: {}", parsed.reference_id);
    println!("  DOB: {}", parsed.poi.dob);
    println!("  State: {}", parsed.poa.state);

    assert_eq!(parsed.version, "V2");
    assert_eq!(parsed.poi.gender, "M");
    assert_eq!(parsed.poa.pin_code, "110051");
    assert!(verify_document(&document, &load_issuer_key()).unwrap());
}

#[test]
fn test_golden_witness() {
    env_logger::try_init().ok();

    let config = create_test_config();
    let document = load_document();
    let inputs = prepare(&document, &config, 12345678, 1001);
    let outputs = generate_witness(&config, &inputs).unwrap();

    assert_eq!(outputs.public_key_hash, public_key_hash(&load_issuer_key()).unwrap());
    assert_eq!(outputs.signal_hash, Fr::from(1001u64));

    let delimiters: [usize; 18] = inputs.delimiter_indices.clone().try_into().unwrap();
    let photo = extract_photo(&inputs.qr_data_padded, inputs.qr_data_padded_length, &delimiters).unwrap();
    let expected = derive_nullifier(NullifierSeed::from(12345678), &pack_photo(&photo).unwrap()).unwrap();
    assert_eq!(outputs.nullifier, expected.0);

    let parsed = parse_document(&document).unwrap();
    let values = ClaimValues::from_document(&parsed, &CredentialClaims::default()).unwrap();
    assert_eq!(outputs.claims_root, claims_root(&values).unwrap());

    let revealed = outputs.revealed(&config.reveal).unwrap();
    assert_eq!(revealed.age_above_18, Some(true));
    assert_eq!(revealed.gender, None);
    println!("✓ Nullifier: {}", expected);
}

#[test]
fn test_golden_literals() {
    let config = create_test_config();
    let inputs = prepare(&load_document(), &config, 12345678, 1001);
    let outputs = generate_witness(&config, &inputs).unwrap();

    assert_eq!(outputs.public_key_hash, fr_from_decimal(FIXTURE_KEY_HASH).unwrap());
    assert_eq!(outputs.nullifier, fr_from_decimal(FIXTURE_NULLIFIER).unwrap());
    assert_eq!(outputs.claims_root, fr_from_decimal(FIXTURE_CLAIMS_ROOT).unwrap());
    assert_eq!(outputs.signal_hash, Fr::from(1001u64));
    assert_eq!(template_root().unwrap(), fr_from_decimal(TEMPLATE_ROOT).unwrap());
}

#[test]
fn test_reveal_everything() {
    let mut config = create_test_config();
    config.reveal = RevealPolicy::all();
    let document = load_document();
    let inputs = prepare(&document, &config, 1, 2);
    let outputs = generate_witness(&config, &inputs).unwrap();

    let revealed = outputs.revealed(&config.reveal).unwrap();
    let parsed = parse_document(&document).unwrap();
    assert_eq!(revealed, RevealedData::from_document(&parsed, &config.reveal).unwrap());
    assert_eq!(revealed.gender.as_deref(), Some("M"));
    assert_eq!(revealed.pin_code, Some(110051));
    assert_eq!(revealed.state.as_deref(), Some("Delhi"));
}

#[test]
fn test_reveal_nothing() {
    let mut config = create_test_config();
    config.reveal = RevealPolicy::none();
    let inputs = prepare(&load_document(), &config, 1, 2);
    let outputs = generate_witness(&config, &inputs).unwrap();
    assert_eq!(outputs.revealed_data_packed, Fr::from(0u64));
}

#[test]
fn test_tampered_signature_rejected() {
    let config = create_test_config();
    let mut inputs = prepare(&load_document(), &config, 12345678, 1001);
    inputs.signature[0] += Fr::one();

    let result = generate_witness(&config, &inputs);
    assert!(matches!(result, Err(AadharError::WitnessUnsatisfied)));
}

#[test]
fn test_shifted_delimiter_rejected() {
    let config = create_test_config();
    let mut inputs = prepare(&load_document(), &config, 12345678, 1001);
    inputs.delimiter_indices[5] += 1;

    let result = generate_witness(&config, &inputs);
    assert!(matches!(result, Err(AadharError::WitnessUnsatisfied)));
}

#[test]
fn test_stale_claim_path_rejected() {
    let config = create_test_config();
    let mut inputs = prepare(&load_document(), &config, 12345678, 1001);
    inputs.claim_siblings[3][0] += Fr::one();

    let result = generate_witness(&config, &inputs);
    assert!(matches!(result, Err(AadharError::WitnessUnsatisfied)));
}

#[test]
fn test_wrong_length_inputs_rejected() {
    let config = create_test_config();
    let mut inputs = prepare(&load_document(), &config, 12345678, 1001);
    inputs.delimiter_indices.pop();

    let result = generate_witness(&config, &inputs);
    assert!(matches!(result, Err(AadharError::InvalidInput(_))));
}

#[test]
fn test_nullifier_scoped_by_context() {
    let config = create_test_config();
    let document = load_document();

    let context_a = ProofContext::new([1u8; 32], [2u8; 32], [3u8; 16]);
    let context_b = ProofContext::new([4u8; 32], [2u8; 32], [5u8; 16]);
    let context_c = ProofContext::new([1u8; 32], [9u8; 32], [3u8; 16]);

    let run = |context: &ProofContext| {
        let inputs = prepare_circuit_inputs(
            &document,
            &load_issuer_key(),
            &config,
            NullifierSeed(context.nullifier_seed()),
            context.signal_hash(),
            &CredentialClaims::default(),
        )
        .unwrap();
        generate_witness(&config, &inputs).unwrap()
    };

    let a = run(&context_a);
    let b = run(&context_b);
    let c = run(&context_c);

    assert_eq!(a.signal_hash, context_a.signal_hash());
    // same request context, new session
    assert_eq!(a.nullifier, b.nullifier);
    assert_ne!(a.signal_hash, b.signal_hash);
    // different request context
    assert_ne!(a.nullifier, c.nullifier);
    assert_eq!(a.claims_root, c.claims_root);
}

#[test]
fn test_minor_holder() {
    env_logger::try_init().ok();

    let config = create_test_config();
    let document = create_document_with_dob("09-03-2001");
    let inputs = prepare(&document, &config, 7, 8);
    let outputs = generate_witness(&config, &inputs).unwrap();

    let revealed = outputs.revealed(&config.reveal).unwrap();
    assert_eq!(revealed.age_above_18, Some(false));

    let parsed = parse_document(&document).unwrap();
    let values = ClaimValues::from_document(&parsed, &CredentialClaims::default()).unwrap();
    assert_eq!(outputs.claims_root, claims_root(&values).unwrap());
}

#[test]
fn test_trusted_key_set() {
    let mut config = create_test_config();
    let inputs = prepare(&load_document(), &config, 12345678, 1001);

    config.trusted_key_hashes = vec![Fr::from(42u64), public_key_hash(&load_issuer_key()).unwrap()];
    assert!(generate_witness(&config, &inputs).is_ok());

    config.trusted_key_hashes = vec![Fr::from(42u64)];
    let result = generate_witness(&config, &inputs);
    assert!(matches!(result, Err(AadharError::WitnessUnsatisfied)));
}

#[test]
fn test_inputs_json_round_trip() {
    let config = create_test_config();
    let inputs = prepare(&load_document(), &config, 12345678, 1001);

    let json = inputs.to_json_pretty().unwrap();
    assert!(json.contains("\"qrDataPaddedLength\""));
    assert!(json.contains("\"nullifierSeed\": \"12345678\""));

    let decoded: CircuitInputs = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, inputs);
}
