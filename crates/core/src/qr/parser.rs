//! Parser for the decompressed secure QR payload
//!
//! The payload is `signedData || signature`. `signedData` is a run of
//! `0xFF`-separated text fields followed by the photo.

use crate::crypto::rsa_verifier::SIGNATURE_BYTES;
use crate::error::{AadharError, Result};
use crate::qr::types::*;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Split a payload into `(signed_data, signature)`
pub fn split_document(document: &[u8]) -> Result<(&[u8], &[u8])> {
    if document.len() <= SIGNATURE_BYTES {
        return Err(AadharError::MalformedDocument(format!(
            "payload of {} bytes is too short to carry a {}-byte signature",
            document.len(),
            SIGNATURE_BYTES
        )));
    }
    Ok(document.split_at(document.len() - SIGNATURE_BYTES))
}

/// Decode a base64 payload (whitespace is ignored)
pub fn decode_document_base64(text: &str) -> Result<Vec<u8>> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(BASE64.decode(clean)?)
}

/// Positions of the first 18 delimiters in `data`
pub fn delimiter_positions(data: &[u8]) -> Result<[usize; DELIMITER_COUNT]> {
    let mut positions = [0usize; DELIMITER_COUNT];
    let mut found = 0;
    for (i, &b) in data.iter().enumerate() {
        if b == DELIMITER {
            positions[found] = i;
            found += 1;
            if found == DELIMITER_COUNT {
                return Ok(positions);
            }
        }
    }
    Err(AadharError::MalformedDocument(format!(
        "expected {} delimiters, found {}",
        DELIMITER_COUNT, found
    )))
}

/// Raw bytes of the field at `position` inside `signed_data`
pub fn field_bytes(signed_data: &[u8], position: FieldPosition) -> Result<&[u8]> {
    let delimiters = delimiter_positions(signed_data)?;
    let index = position.index();
    let start = if index == 0 { 0 } else { delimiters[index - 1] + 1 };
    let end = if index < DELIMITER_COUNT {
        delimiters[index]
    } else {
        signed_data.len()
    };
    Ok(&signed_data[start..end])
}

/// Parse a decompressed payload
pub fn parse_document(document: &[u8]) -> Result<QrDocument> {
    log::info!("Parsing QR payload, size: {} bytes", document.len());

    let (signed_data, signature) = split_document(document)?;
    let delimiters = delimiter_positions(signed_data)?;

    let text = |position: FieldPosition| -> Result<String> {
        let index = position.index();
        let start = if index == 0 { 0 } else { delimiters[index - 1] + 1 };
        let bytes = &signed_data[start..delimiters[index]];
        String::from_utf8(bytes.to_vec()).map_err(|e| AadharError::InvalidField {
            field: format!("{:?}", position),
            reason: e.to_string(),
        })
    };

    let document = QrDocument {
        version: text(FieldPosition::Version)?,
        email_mobile_flag: text(FieldPosition::EmailMobileFlag)?,
        reference_id: text(FieldPosition::ReferenceId)?,
        poi: PersonalInfo {
            name: text(FieldPosition::Name)?,
            dob: text(FieldPosition::DateOfBirth)?,
            gender: text(FieldPosition::Gender)?,
        },
        poa: AddressInfo {
            care_of: text(FieldPosition::CareOf)?,
            district: text(FieldPosition::District)?,
            landmark: text(FieldPosition::Landmark)?,
            house: text(FieldPosition::House)?,
            location: text(FieldPosition::Location)?,
            pin_code: text(FieldPosition::PinCode)?,
            post_office: text(FieldPosition::PostOffice)?,
            state: text(FieldPosition::State)?,
            street: text(FieldPosition::Street)?,
            sub_district: text(FieldPosition::SubDistrict)?,
            vtc: text(FieldPosition::Vtc)?,
        },
        mobile_last4: text(FieldPosition::MobileLast4)?,
        photo: signed_data[delimiters[DELIMITER_COUNT - 1] + 1..].to_vec(),
        signed_data: signed_data.to_vec(),
        signature: signature.to_vec(),
    };

    let required = [
        ("version", &document.version),
        ("reference id", &document.reference_id),
        ("dob", &document.poi.dob),
    ];
    if let Some((name, _)) = required.iter().find(|(_, value)| value.is_empty()) {
        return Err(AadharError::MissingField(name.to_string()));
    }

    if document.version != "V2" {
        log::warn!("Unexpected QR format version: {}", document.version);
    }

    log::debug!("Reference ID: {}", document.reference_id);
    log::debug!("Photo size: {} bytes", document.photo.len());
    log::info!("✓ Parsed QR payload");

    Ok(document)
}
