//! Example: Generate a witness for a decompressed QR payload
//!
//! Usage:
//!   cargo run --release --example qr_witness -- <payload> <issuer_cert> [seed] [signal]

use anon_aadhar_core::circuit::{create_config, generate_witness};
use anon_aadhar_core::claims::CredentialClaims;
use anon_aadhar_core::crypto::load_public_key;
use anon_aadhar_core::field::fr_to_decimal;
use anon_aadhar_core::inputs::prepare_circuit_inputs;
use anon_aadhar_core::nullifier::NullifierSeed;
use anon_aadhar_core::qr::parse_document;
use ark_bn254::Fr;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <payload> <issuer_cert> [seed] [signal]", args[0]);
        eprintln!("Example: {} tests/fixtures/test_document.bin tests/fixtures/test_certificate.pem", args[0]);
        std::process::exit(1);
    }

    let seed: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(1);
    let signal: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(1);

    let document = match std::fs::read(&args[1]) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ Cannot read {}: {}", args[1], e);
            std::process::exit(1);
        }
    };

    println!("🔍 Parsing QR payload: {}", args[1]);
    match parse_document(&document) {
        Ok(parsed) => {
            println!("  Reference ID: {}", parsed.reference_id);
            println!("  State: {}", parsed.poa.state);
        }
        Err(e) => {
            eprintln!("❌ Error parsing payload: {}", e);
            std::process::exit(1);
        }
    }
    println!();

    let result = load_public_key(&args[2]).and_then(|key| {
        let config = create_config();
        let inputs = prepare_circuit_inputs(
            &document,
            &key,
            &config,
            NullifierSeed::from(seed),
            Fr::from(signal),
            &CredentialClaims::default(),
        )?;
        generate_witness(&config, &inputs)
    });

    match result {
        Ok(outputs) => {
            println!("✅ Witness generated!");
            println!("  Public key hash: {}", fr_to_decimal(&outputs.public_key_hash));
            println!("  Nullifier:       {}", fr_to_decimal(&outputs.nullifier));
            println!("  Revealed data:   {}", fr_to_decimal(&outputs.revealed_data_packed));
            println!("  Claims root:     {}", fr_to_decimal(&outputs.claims_root));
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}
