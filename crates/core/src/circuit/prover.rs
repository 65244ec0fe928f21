//! Witness generation for the verifier circuit

use crate::circuit::aadhaar::AadhaarVerifierCircuit;
use crate::circuit::config::CircuitConfig;
use crate::circuit::outputs::PublicOutputs;
use crate::error::{AadharError, Result};
use crate::inputs::CircuitInputs;
use ark_bn254::Fr;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};

/// Build the constraint system for `inputs` and check it is satisfied
///
/// # Returns
/// The public outputs, or [`AadharError::WitnessUnsatisfied`] if no
/// satisfying witness exists. The failing constraint is logged at debug
/// level only.
///
/// # Example
/// ```no_run
/// use anon_aadhar_core::circuit::{create_config, generate_witness};
/// use anon_aadhar_core::inputs::CircuitInputs;
///
/// let inputs = CircuitInputs::from_json_file("inputs.json")?;
/// let outputs = generate_witness(&create_config(), &inputs)?;
/// println!("Nullifier: {:?}", outputs.nullifier);
/// # Ok::<(), anon_aadhar_core::error::AadharError>(())
/// ```
pub fn generate_witness(config: &CircuitConfig, inputs: &CircuitInputs) -> Result<PublicOutputs> {
    log::info!("Generating witness ({} byte capacity)", config.max_data_bytes);
    config.validate()?;
    inputs.validate(config)?;

    let start = std::time::Instant::now();
    let cs = ConstraintSystem::<Fr>::new_ref();
    AadhaarVerifierCircuit::new(config.clone(), inputs.clone())
        .generate_constraints(cs.clone())
        .map_err(|e| {
            log::debug!("Synthesis stopped: {}", e);
            AadharError::from(e)
        })?;

    log::debug!(
        "Constraints: {}, instance variables: {}, witness variables: {}",
        cs.num_constraints(),
        cs.num_instance_variables(),
        cs.num_witness_variables()
    );

    if !cs.is_satisfied()? {
        if let Some(name) = cs.which_is_unsatisfied()? {
            log::debug!("First unsatisfied constraint: {}", name);
        }
        log::warn!("✗ No satisfying witness");
        return Err(AadharError::WitnessUnsatisfied);
    }

    let instance = cs
        .borrow()
        .map(|system| system.instance_assignment.clone())
        .ok_or_else(|| AadharError::SynthesisError("constraint system is unavailable".to_string()))?;
    let outputs = PublicOutputs::from_instance(&instance)?;

    log::info!("✓ Witness generated in {:.2?}", start.elapsed());
    Ok(outputs)
}
