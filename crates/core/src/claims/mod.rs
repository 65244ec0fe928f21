//! Native claims tree: sparse Merkle tree and the credential template

pub mod smt;
pub mod template;

pub use smt::{SparseMerkleTree, UpdateProof, MAX_DEPTH};
pub use template::{
    build_claim_updates, claims_root, template_root, ClaimKey, ClaimUpdate, ClaimValues, CredentialClaims,
    CLAIM_COUNT,
};
