//! The anonymous Aadhaar verifier circuit
//!
//! Public instance, in allocation order:
//!
//! | Index | Value |
//! |-------|-------|
//! | 1 | `nullifierSeed` |
//! | 2 | `signalHash` |
//! | 3 | `templateRoot` |
//! | 4..=20 | issuer modulus limbs |
//! | 21 | `publicKeyHash` (output) |
//! | 22 | `nullifier` (output) |
//! | 23 | `revealedDataPacked` (output) |
//! | 24 | `signalHash` (output) |
//! | 25 | `claimsRoot` (output) |

use crate::circuit::bigint::LimbVar;
use crate::circuit::claims_tree::{fold_updates, ClaimUpdateVar};
use crate::circuit::config::CircuitConfig;
use crate::circuit::extractor::extract_fields;
use crate::circuit::nullifier::nullifier_var;
use crate::circuit::outputs::pack_revealed_var;
use crate::circuit::rsa::{enforce_trusted_key, public_key_hash_var, verify_rsa_sha256};
use crate::circuit::sha256::{alloc_bytes, sha256_padded};
use crate::claims::ClaimKey;
use crate::inputs::CircuitInputs;
use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::{
    ns,
    r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError},
};

/// Verifier circuit bound to one configuration and one input set
#[derive(Debug, Clone)]
pub struct AadhaarVerifierCircuit {
    pub config: CircuitConfig,
    pub inputs: CircuitInputs,
}

impl AadhaarVerifierCircuit {
    pub fn new(config: CircuitConfig, inputs: CircuitInputs) -> Self {
        Self { config, inputs }
    }
}

/// Allocate `value` as a public input and bind it to the computed variable
fn expose(cs: &ConstraintSystemRef<Fr>, value: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let output = FpVar::new_input(cs.clone(), || value.value())?;
    output.enforce_equal(value)
}

impl ConstraintSynthesizer<Fr> for AadhaarVerifierCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let Self { config, inputs } = self;
        if inputs.validate(&config).is_err() {
            return Err(SynthesisError::Unsatisfiable);
        }

        // public inputs
        let nullifier_seed = FpVar::new_input(ns!(cs, "nullifier_seed"), || Ok(inputs.nullifier_seed))?;
        let signal_hash = FpVar::new_input(ns!(cs, "signal_hash"), || Ok(inputs.signal_hash))?;
        let template_root = FpVar::new_input(ns!(cs, "template_root"), || Ok(inputs.template_root))?;
        let modulus = LimbVar::new_input(cs.clone(), &inputs.pub_key)?;

        // private inputs
        let data = alloc_bytes(cs.clone(), &inputs.qr_data_padded)?;
        let padded_len = FpVar::new_witness(ns!(cs, "padded_len"), || {
            Ok(Fr::from(inputs.qr_data_padded_length as u64))
        })?;
        let delimiter_indices = inputs
            .delimiter_indices
            .iter()
            .map(|d| FpVar::new_witness(ns!(cs, "delimiter_index"), || Ok(Fr::from(*d as u64))))
            .collect::<Result<Vec<_>, _>>()?;
        let signature = LimbVar::new_witness(cs.clone(), &inputs.signature)?;

        // issuer signature over the first padded_len bytes
        let sha = sha256_padded(cs.clone(), &data, &padded_len)?;
        verify_rsa_sha256(cs.clone(), &sha.digest_bits, &signature, &modulus)?;
        let public_key_hash = public_key_hash_var(&modulus)?;
        enforce_trusted_key(&public_key_hash, &config.trusted_key_hashes)?;

        let fields = extract_fields(cs.clone(), &data, &padded_len, &delimiter_indices)?;

        // claims tree
        let credential = &inputs.credential;
        let credential_values = [
            credential.revocation_nonce,
            credential.credential_status_id,
            credential.credential_subject_id,
            credential.issuance_date,
            credential.issuer,
        ]
        .iter()
        .map(|v| FpVar::new_witness(ns!(cs, "credential"), || Ok(*v)))
        .collect::<Result<Vec<_>, _>>()?;

        let mut values = vec![
            fields.age_above_18.clone(),
            fields.dob_ymd.clone(),
            fields.gender.clone(),
            fields.pin_code.clone(),
            fields.state.clone(),
        ];
        values.extend(credential_values);

        let updates = ClaimKey::ALL
            .iter()
            .zip(values)
            .zip(&inputs.claim_siblings)
            .map(|((key, value), path)| {
                let siblings = path
                    .iter()
                    .map(|s| FpVar::new_witness(ns!(cs, "claim_sibling"), || Ok(*s)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ClaimUpdateVar {
                    key: key.key(),
                    value,
                    siblings,
                })
            })
            .collect::<Result<Vec<_>, SynthesisError>>()?;
        let claims_root = fold_updates(&template_root, &updates)?;

        let nullifier = nullifier_var(&nullifier_seed, &fields.photo_chunks)?;
        let revealed = pack_revealed_var(
            &config.reveal,
            &fields.age_above_18,
            &fields.gender,
            &fields.pin_code,
            &fields.state,
        );

        // outputs
        for output in [&public_key_hash, &nullifier, &revealed, &signal_hash, &claims_root] {
            expose(&cs, output)?;
        }

        Ok(())
    }
}
