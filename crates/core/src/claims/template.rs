//! Claims template: attribute keys, schema leaves and the template tree
//!
//! The template tree holds six fixed schema leaves plus one leaf per
//! attribute, every attribute leaf starting at value `0`. A document's claims
//! root is reached by updating the ten attribute leaves, in [`ClaimKey::ALL`]
//! order, from `0` to the document's values.

use crate::claims::smt::{SparseMerkleTree, UpdateProof};
use crate::error::{AadharError, Result};
use crate::field::{decimal, fr_from_le_bytes};
use crate::qr::QrDocument;
use ark_bn254::Fr;
use ark_ff::{MontFp, Zero};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Number of attribute updates folded into the template
pub const CLAIM_COUNT: usize = 10;

/// Schema leaves that never change
pub const SCHEMA_LEAVES: [(Fr, Fr); 6] = [
    (
        MontFp!("4809579517396073186705705159186899409599314609122482090560534255195823961763"),
        MontFp!("2038038677412689124034084719683107814279606773706261227437666149072023632255"),
    ),
    (
        MontFp!("1876843462791870928827702802899567513539510253808198232854545117818238902280"),
        MontFp!("6863952743872184967730390635778205663409140607467436963978966043239919204962"),
    ),
    (
        MontFp!("12891444986491254085560597052395677934694594587847693550621945641098238258096"),
        MontFp!("870222225577550446142292957325790690140780476504858538425256779240825462837"),
    ),
    (
        MontFp!("14122086068848155444790679436566779517121339700977110548919573157521629996400"),
        MontFp!("8932896889521641034417268999369968324098807262074941120983759052810017489370"),
    ),
    (
        MontFp!("18943208076435454904128050626016920086499867123501959273334294100443438004188"),
        MontFp!("2038038677412689124034084719683107814279606773706261227437666149072023632255"),
    ),
    (
        MontFp!("2282658739689398501857830040602888548545380116161185117921371325237897538551"),
        MontFp!("9033719693259832177439488944502349301386207418184651337843275979338597322540"),
    ),
];

/// Attribute slots of the claims tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimKey {
    AgeAbove18,
    Birthday,
    Gender,
    PinCode,
    State,
    RevocationNonce,
    CredentialStatusId,
    CredentialSubjectId,
    IssuanceDate,
    Issuer,
}

impl ClaimKey {
    /// Update order used by the constraint system
    pub const ALL: [ClaimKey; CLAIM_COUNT] = [
        ClaimKey::AgeAbove18,
        ClaimKey::Birthday,
        ClaimKey::Gender,
        ClaimKey::PinCode,
        ClaimKey::State,
        ClaimKey::RevocationNonce,
        ClaimKey::CredentialStatusId,
        ClaimKey::CredentialSubjectId,
        ClaimKey::IssuanceDate,
        ClaimKey::Issuer,
    ];

    /// Tree key of this attribute
    pub const fn key(self) -> Fr {
        match self {
            ClaimKey::AgeAbove18 => {
                MontFp!("10647195490133279025507176104314518051617223585635435645675479671394436328629")
            }
            ClaimKey::Birthday => {
                MontFp!("5213439259676021610106577921037707268541764175155543794420152605023181390139")
            }
            ClaimKey::Gender => {
                MontFp!("1479963091211635594734723538545884456894938414357497418097512533895772796527")
            }
            ClaimKey::PinCode => {
                MontFp!("19238944412824247341353086074402759833940010832364197352719874011476854540013")
            }
            ClaimKey::State => {
                MontFp!("14522734804373614041942549305708452359006179872334741006179415532376146140639")
            }
            ClaimKey::RevocationNonce => {
                MontFp!("1763085948543522232029667616550496120517967703023484347613954302553484294902")
            }
            ClaimKey::CredentialStatusId => {
                MontFp!("11896622783611378286548274235251973588039499084629981048616800443645803129554")
            }
            ClaimKey::CredentialSubjectId => {
                MontFp!("4792130079462681165428511201253235850015648352883240577315026477780493110675")
            }
            ClaimKey::IssuanceDate => {
                MontFp!("8713837106709436881047310678745516714551061952618778897121563913918335939585")
            }
            ClaimKey::Issuer => {
                MontFp!("5940025296598751562822259677636111513267244048295724788691376971035167813215")
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ClaimKey::AgeAbove18 => "ageAbove18",
            ClaimKey::Birthday => "birthday",
            ClaimKey::Gender => "gender",
            ClaimKey::PinCode => "pinCode",
            ClaimKey::State => "state",
            ClaimKey::RevocationNonce => "revocationNonce",
            ClaimKey::CredentialStatusId => "credentialStatus.id",
            ClaimKey::CredentialSubjectId => "credentialSubject.id",
            ClaimKey::IssuanceDate => "issuanceDate",
            ClaimKey::Issuer => "issuer",
        }
    }
}

/// Credential metadata supplied by the holder rather than read from the QR
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialClaims {
    #[serde(with = "decimal")]
    pub revocation_nonce: Fr,
    #[serde(with = "decimal")]
    pub credential_status_id: Fr,
    #[serde(with = "decimal")]
    pub credential_subject_id: Fr,
    #[serde(with = "decimal")]
    pub issuance_date: Fr,
    #[serde(with = "decimal")]
    pub issuer: Fr,
}

/// Value of every attribute leaf for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimValues {
    values: [Fr; CLAIM_COUNT],
}

impl ClaimValues {
    /// Values in [`ClaimKey::ALL`] order
    pub fn new(values: [Fr; CLAIM_COUNT]) -> Self {
        Self { values }
    }

    /// Derive the document attributes and merge the credential metadata
    ///
    /// Each value is computed exactly as the field extractor computes it.
    pub fn from_document(document: &QrDocument, credential: &CredentialClaims) -> Result<Self> {
        let values = [
            Fr::from(document.age_above_18()? as u64),
            Fr::from(document.poi.dob_ymd()? as u64),
            Fr::from(document.poi.gender_code()?),
            Fr::from(document.poa.pin_code_value()? as u64),
            document.poa.state_packed()?,
            credential.revocation_nonce,
            credential.credential_status_id,
            credential.credential_subject_id,
            credential.issuance_date,
            credential.issuer,
        ];
        log::debug!(
            "Claim values: birthday={}, gender={}, pinCode={}, state={:?}",
            document.poi.dob,
            document.poi.gender,
            document.poa.pin_code,
            document.poa.state
        );
        Ok(Self { values })
    }

    pub fn get(&self, key: ClaimKey) -> Fr {
        self.values[ClaimKey::ALL.iter().position(|k| *k == key).unwrap_or(0)]
    }

    pub fn as_array(&self) -> &[Fr; CLAIM_COUNT] {
        &self.values
    }
}

/// One attribute update: the new value plus its padded sibling path
#[derive(Debug, Clone)]
pub struct ClaimUpdate {
    pub key: ClaimKey,
    pub value: Fr,
    pub siblings: Vec<Fr>,
}

static TEMPLATE: OnceCell<SparseMerkleTree> = OnceCell::new();

fn build_template_tree() -> Result<SparseMerkleTree> {
    let attribute_leaves = ClaimKey::ALL.iter().map(|k| (k.key(), Fr::zero()));
    let tree = SparseMerkleTree::from_leaves(SCHEMA_LEAVES.iter().copied().chain(attribute_leaves))?;
    log::debug!("Built claims template with {} leaves", tree.len());
    Ok(tree)
}

/// The template tree, built once per process
pub fn template_tree() -> Result<&'static SparseMerkleTree> {
    TEMPLATE.get_or_try_init(build_template_tree)
}

/// Root of the template tree
pub fn template_root() -> Result<Fr> {
    template_tree()?.root()
}

/// Fold every attribute update into the template, in the canonical order
///
/// # Returns
/// The updates with their sibling paths, and the resulting claims root
pub fn build_claim_updates(values: &ClaimValues) -> Result<(Vec<ClaimUpdate>, Fr)> {
    build_claim_updates_in_order(values, &ClaimKey::ALL)
}

/// Fold updates in a caller-chosen order
pub fn build_claim_updates_in_order(values: &ClaimValues, order: &[ClaimKey]) -> Result<(Vec<ClaimUpdate>, Fr)> {
    let mut tree = template_tree()?.clone();
    let mut root = tree.root()?;
    let mut updates = Vec::with_capacity(order.len());

    for key in order {
        let proof: UpdateProof = tree.update(&key.key(), values.get(*key))?;
        if proof.old_root != root || !proof.old_value.is_zero() {
            return Err(AadharError::ClaimsTreeError(format!(
                "attribute {} was already updated",
                key.name()
            )));
        }
        root = proof.new_root;
        updates.push(ClaimUpdate {
            key: *key,
            value: proof.new_value,
            siblings: proof.siblings,
        });
    }

    log::debug!("Folded {} claim updates", updates.len());
    Ok((updates, root))
}

/// Claims root for `values` without recording sibling paths
pub fn claims_root(values: &ClaimValues) -> Result<Fr> {
    let mut tree = template_tree()?.clone();
    for key in ClaimKey::ALL {
        tree.update(&key.key(), values.get(key))?;
    }
    tree.root()
}

/// Pack a short string little-endian, as stored in the state leaf
pub fn pack_text(text: &str) -> Fr {
    fr_from_le_bytes(text.as_bytes())
}
