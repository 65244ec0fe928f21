//! CLI tool for anonymous Aadhaar proofs
//!
//! Prepares circuit inputs from a decompressed secure QR payload and runs
//! witness generation for the verifier circuit.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use anon_aadhar_core::circuit::{create_config, generate_witness, CircuitConfig};
use anon_aadhar_core::claims::{template_root, CredentialClaims};
use anon_aadhar_core::context::{ProofContext, ProofContextHex};
use anon_aadhar_core::crypto::cert::certificate_is_current;
use anon_aadhar_core::crypto::{check_raw_signature, load_public_key, public_key_hash, verify_document};
use anon_aadhar_core::field::{fr_from_decimal, fr_to_decimal};
use anon_aadhar_core::inputs::{prepare_circuit_inputs, CircuitInputs};
use anon_aadhar_core::nullifier::NullifierSeed;
use anon_aadhar_core::qr::{decode_document_base64, parse_document, split_document};

#[derive(Parser)]
#[command(name = "anon-aadhar")]
#[command(about = "Anonymous Aadhaar QR witness generation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and display a decompressed QR payload
    Inspect {
        /// Path to the payload (raw bytes, or base64 with --base64)
        #[arg(short, long)]
        file: PathBuf,

        /// Payload file holds base64 text
        #[arg(long)]
        base64: bool,

        /// Issuer certificate or public key to check the signature against
        #[arg(short, long)]
        key: Option<PathBuf>,
    },

    /// Build circuit inputs from a QR payload
    Prepare {
        /// Path to the payload (raw bytes, or base64 with --base64)
        #[arg(short, long)]
        file: PathBuf,

        /// Payload file holds base64 text
        #[arg(long)]
        base64: bool,

        /// Issuer certificate or public key
        #[arg(short, long)]
        key: PathBuf,

        /// Circuit configuration (JSON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Nullifier seed (decimal)
        #[arg(long)]
        seed: String,

        /// Signal hash (decimal)
        #[arg(long)]
        signal: String,

        /// Credential metadata (JSON); all zero when omitted
        #[arg(long)]
        credential: Option<PathBuf>,

        /// Output file for the inputs
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate the witness and print the public outputs
    Witness {
        /// Circuit inputs (JSON)
        #[arg(short, long)]
        inputs: PathBuf,

        /// Circuit configuration (JSON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file for the public outputs
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Derive the nullifier seed and signal hash of a verifier request
    Context {
        /// 32-byte nonce (hex)
        #[arg(long)]
        nonce: String,

        /// 32-byte request hash (hex)
        #[arg(long)]
        context_hash: String,

        /// 16-byte session id (hex)
        #[arg(long)]
        session_id: String,
    },

    /// Print the root of the claims template tree
    TemplateRoot,

    /// Print the Poseidon hash of an issuer key
    KeyHash {
        /// Issuer certificate or public key
        #[arg(short, long)]
        key: PathBuf,
    },

    /// Show example usage
    Examples,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Inspect { file, base64, key } => cmd_inspect(file, base64, key),
        Commands::Prepare { file, base64, key, config, seed, signal, credential, output } => {
            cmd_prepare(file, base64, key, config, seed, signal, credential, output)
        }
        Commands::Witness { inputs, config, output } => cmd_witness(inputs, config, output),
        Commands::Context { nonce, context_hash, session_id } => cmd_context(nonce, context_hash, session_id),
        Commands::TemplateRoot => cmd_template_root(),
        Commands::KeyHash { key } => cmd_key_hash(key),
        Commands::Examples => cmd_examples(),
    }
}

fn read_document(file: &Path, base64: bool) -> Result<Vec<u8>> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    if base64 {
        let text = String::from_utf8(bytes).context("Base64 payload is not UTF-8")?;
        Ok(decode_document_base64(&text)?)
    } else {
        Ok(bytes)
    }
}

fn load_config(path: Option<PathBuf>) -> Result<CircuitConfig> {
    Ok(match path {
        Some(path) => CircuitConfig::from_json_file(path)?,
        None => create_config(),
    })
}

fn cmd_inspect(file: PathBuf, base64: bool, key: Option<PathBuf>) -> Result<()> {
    println!("📄 Parsing QR payload: {}", file.display());
    println!();

    let document = read_document(&file, base64)?;
    let parsed = parse_document(&document)?;

    println!("✅ Successfully parsed QR payload");
    println!();
    println!("  Version:      {}", parsed.version);
    println!("  Reference ID: {}", parsed.reference_id);
    println!();
    println!("Personal Information:");
    println!("  Name:     {}", parsed.poi.name);
    println!("  DOB:      {}", parsed.poi.dob);
    println!("  Gender:   {}", parsed.poi.gender);
    println!("  Age 18+:  {}", parsed.age_above_18()?);
    println!("  Age at signing: {} years", parsed.poi.age_on(parsed.reference_date()?)?);
    println!();
    println!("Address:");
    println!("  {}", parsed.poa.full_address());
    println!();
    println!("Photo: {} bytes", parsed.photo.len());

    if let Some(key) = key {
        let public_key = load_public_key(&key)?;
        println!();
        if let Ok(false) = certificate_is_current(&std::fs::read(&key)?) {
            println!("⚠️  Certificate is outside its validity window");
        }
        match verify_document(&document, &public_key) {
            Ok(_) => println!("✅ Signature is VALID"),
            Err(e) => println!("❌ Signature is INVALID: {}", e),
        }

        // same modular exponentiation the constraint system checks
        let (signed_data, signature) = split_document(&document)?;
        if check_raw_signature(signed_data, signature, &public_key)? {
            println!("✅ Signature matches the in-circuit RSA check");
        } else {
            println!("❌ Signature fails the in-circuit RSA check");
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_prepare(
    file: PathBuf,
    base64: bool,
    key: PathBuf,
    config: Option<PathBuf>,
    seed: String,
    signal: String,
    credential: Option<PathBuf>,
    output: PathBuf,
) -> Result<()> {
    println!("🔐 Preparing circuit inputs...");
    println!();

    let document = read_document(&file, base64)?;
    let public_key = load_public_key(&key)?;
    let config = load_config(config)?;
    let credential: CredentialClaims = match credential {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(&path)?)
            .with_context(|| format!("Failed to parse credential {}", path.display()))?,
        None => CredentialClaims::default(),
    };

    let inputs = prepare_circuit_inputs(
        &document,
        &public_key,
        &config,
        NullifierSeed(fr_from_decimal(&seed)?),
        fr_from_decimal(&signal)?,
        &credential,
    )?;
    std::fs::write(&output, inputs.to_json_pretty()?)?;

    println!("✅ Inputs prepared successfully!");
    println!("   Padded length: {} of {} bytes", inputs.qr_data_padded_length, config.max_data_bytes);
    println!("   Saved to: {}", output.display());
    println!();
    println!("To generate the witness, use:");
    println!("  anon-aadhar witness --inputs {}", output.display());

    Ok(())
}

fn cmd_witness(inputs_path: PathBuf, config: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    println!("⚙️  Generating witness...");
    println!();

    let config = load_config(config)?;
    let inputs = CircuitInputs::from_json_file(&inputs_path)?;
    let outputs = generate_witness(&config, &inputs)?;

    println!("✅ Witness generated!");
    println!();
    println!("Public outputs:");
    println!("  Public key hash: {}", fr_to_decimal(&outputs.public_key_hash));
    println!("  Nullifier:       {}", fr_to_decimal(&outputs.nullifier));
    println!("  Revealed data:   {}", fr_to_decimal(&outputs.revealed_data_packed));
    println!("  Signal hash:     {}", fr_to_decimal(&outputs.signal_hash));
    println!("  Claims root:     {}", fr_to_decimal(&outputs.claims_root));
    println!();

    let revealed = outputs.revealed(&config.reveal)?;
    println!("Revealed attributes:");
    println!("{}", serde_json::to_string_pretty(&revealed)?);

    if let Some(output) = output {
        std::fs::write(&output, serde_json::to_string_pretty(&outputs)?)?;
        println!();
        println!("   Saved to: {}", output.display());
    }

    Ok(())
}

fn cmd_context(nonce: String, context_hash: String, session_id: String) -> Result<()> {
    let context = ProofContext::from_hex_strings(&ProofContextHex {
        nonce,
        context_hash,
        session_id,
    })?;

    println!("Nullifier seed: {}", fr_to_decimal(&context.nullifier_seed()));
    println!("Signal hash:    {}", fr_to_decimal(&context.signal_hash()));
    println!("Binding hash:   0x{}", hex::encode(context.binding_hash()));

    Ok(())
}

fn cmd_template_root() -> Result<()> {
    println!("{}", fr_to_decimal(&template_root()?));
    Ok(())
}

fn cmd_key_hash(key: PathBuf) -> Result<()> {
    let public_key = load_public_key(&key)?;
    println!("{}", fr_to_decimal(&public_key_hash(&public_key)?));
    Ok(())
}

fn cmd_examples() -> Result<()> {
    println!("Anonymous Aadhaar - Example Usage");
    println!("==================================");
    println!();
    println!("1. Inspect a payload and check its signature:");
    println!("   anon-aadhar inspect --file qr.bin --key uidai.pem");
    println!();
    println!("2. Derive the public inputs of a verifier request:");
    println!("   anon-aadhar context --nonce 0x<64 hex> --context-hash 0x<64 hex> --session-id 0x<32 hex>");
    println!();
    println!("3. Prepare circuit inputs:");
    println!("   anon-aadhar prepare --file qr.bin --key uidai.pem \\");
    println!("     --seed <nullifier seed> --signal <signal hash> --output inputs.json");
    println!();
    println!("4. Generate the witness:");
    println!("   anon-aadhar witness --inputs inputs.json --output outputs.json");
    println!();
    println!("5. Restrict accepted issuers with a configuration file:");
    println!("   anon-aadhar key-hash --key uidai.pem");
    println!("   echo '{{\"trusted_key_hashes\": [\"<hash>\"]}}' > config.json");
    println!("   anon-aadhar witness --inputs inputs.json --config config.json");
    println!();
    println!("Notes:");
    println!("- The payload is the decompressed QR content: signed data then a 256-byte signature");
    println!("- A configuration must match the one the inputs were prepared with");
    println!("- Witness generation reports only whether a satisfying witness exists;");
    println!("  use `inspect --key` to diagnose a rejected payload");

    Ok(())
}
