//! Data structures for the decompressed Aadhaar secure QR payload

use crate::error::{AadharError, Result};
use crate::field::fr_from_le_bytes;
use ark_bn254::Fr;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Field separator byte
pub const DELIMITER: u8 = 0xff;

/// Number of delimiters located before the photo
pub const DELIMITER_COUNT: usize = 18;

/// Digits in a reference id: last 4 of the Aadhaar number + `YYYYMMDDHHMMSSmmm`
pub const REFERENCE_ID_DIGITS: usize = 21;

/// Digits in a pin code
pub const PIN_CODE_DIGITS: usize = 6;

/// Longest gender value that can be packed
pub const GENDER_MAX_BYTES: usize = 1;

/// Longest state name that can be packed
///
/// Every state fits except "Dadra and Nagar Haveli and Daman and Diu" (40
/// bytes); documents naming it are rejected.
pub const STATE_MAX_BYTES: usize = 28;

/// Field numbers of the V2 layout
///
/// Field `f` sits between delimiter `f - 1` and delimiter `f`; the photo
/// follows the 18th delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldPosition {
    Version = 0,
    EmailMobileFlag = 1,
    ReferenceId = 2,
    Name = 3,
    DateOfBirth = 4,
    Gender = 5,
    CareOf = 6,
    District = 7,
    Landmark = 8,
    House = 9,
    Location = 10,
    PinCode = 11,
    PostOffice = 12,
    State = 13,
    Street = 14,
    SubDistrict = 15,
    Vtc = 16,
    MobileLast4 = 17,
    Photo = 18,
}

impl FieldPosition {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Decoded secure QR payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrDocument {
    /// Format version, e.g. `V2`
    pub version: String,

    /// Email/mobile presence indicator
    pub email_mobile_flag: String,

    /// Reference ID (last 4 digits of Aadhaar + timestamp)
    pub reference_id: String,

    /// Demographic information
    pub poi: PersonalInfo,

    /// Address information
    pub poa: AddressInfo,

    /// Last 4 digits of the registered mobile number
    pub mobile_last4: String,

    /// Photo bytes (JPEG 2000), unpadded
    #[serde(with = "hex_bytes")]
    pub photo: Vec<u8>,

    /// Everything covered by the signature
    #[serde(skip)]
    pub signed_data: Vec<u8>,

    /// Raw big-endian signature
    #[serde(skip)]
    pub signature: Vec<u8>,
}

/// Personal information (Proof of Identity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalInfo {
    /// Full name
    pub name: String,

    /// Date of birth in DD-MM-YYYY format
    pub dob: String,

    /// Gender: M/F/T
    pub gender: String,
}

/// Address information (Proof of Address)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressInfo {
    pub care_of: String,
    pub district: String,
    pub landmark: String,
    pub house: String,
    pub location: String,
    pub pin_code: String,
    pub post_office: String,
    pub state: String,
    pub street: String,
    pub sub_district: String,
    pub vtc: String,
}

impl AddressInfo {
    /// Get the full address as a formatted string
    pub fn full_address(&self) -> String {
        [
            &self.house,
            &self.street,
            &self.landmark,
            &self.location,
            &self.vtc,
            &self.sub_district,
            &self.district,
            &self.state,
            &self.pin_code,
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.as_str())
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// Pin code as an integer; exactly six ASCII digits
    pub fn pin_code_value(&self) -> Result<u32> {
        parse_digits(&self.pin_code, "pin code", PIN_CODE_DIGITS).map(|v| v as u32)
    }

    /// State name packed little-endian into one field element
    pub fn state_packed(&self) -> Result<Fr> {
        let bytes = self.state.as_bytes();
        if bytes.len() > STATE_MAX_BYTES {
            return Err(AadharError::InvalidField {
                field: "state".to_string(),
                reason: format!("{} bytes exceeds {}", bytes.len(), STATE_MAX_BYTES),
            });
        }
        Ok(fr_from_le_bytes(bytes))
    }
}

impl PersonalInfo {
    /// Parse the date of birth string into a NaiveDate
    pub fn parse_dob(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.dob, "%d-%m-%Y").map_err(|e| AadharError::InvalidField {
            field: "dob".to_string(),
            reason: e.to_string(),
        })
    }

    /// Date of birth as the integer `YYYYMMDD`
    pub fn dob_ymd(&self) -> Result<u32> {
        let bytes = self.dob.as_bytes();
        let well_formed = bytes.len() == 10
            && bytes[2] == b'-'
            && bytes[5] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());
        if !well_formed {
            return Err(AadharError::InvalidField {
                field: "dob".to_string(),
                reason: format!("expected DD-MM-YYYY, got {:?}", self.dob),
            });
        }
        let dd = parse_digits(&self.dob[0..2], "dob day", 2)?;
        let mm = parse_digits(&self.dob[3..5], "dob month", 2)?;
        let yyyy = parse_digits(&self.dob[6..10], "dob year", 4)?;
        Ok((yyyy * 10_000 + mm * 100 + dd) as u32)
    }

    /// Age in whole years on `date`
    pub fn age_on(&self, date: NaiveDate) -> Result<u32> {
        let dob = self.parse_dob()?;
        let mut age = date.year() - dob.year();
        if (date.month(), date.day()) < (dob.month(), dob.day()) {
            age -= 1;
        }
        Ok(age.max(0) as u32)
    }

    /// Gender byte as an integer (0 when empty)
    pub fn gender_code(&self) -> Result<u64> {
        match self.gender.as_bytes() {
            [] => Ok(0),
            [b] => Ok(*b as u64),
            _ => Err(AadharError::InvalidField {
                field: "gender".to_string(),
                reason: format!("more than {} byte", GENDER_MAX_BYTES),
            }),
        }
    }
}

impl QrDocument {
    /// Signing timestamp date encoded in the reference id, as `YYYYMMDD`
    pub fn reference_ymd(&self) -> Result<u32> {
        check_digits(&self.reference_id, "reference id", REFERENCE_ID_DIGITS)?;
        Ok(parse_digits(&self.reference_id[4..12], "reference date", 8)? as u32)
    }

    /// Signing date as a calendar date
    pub fn reference_date(&self) -> Result<NaiveDate> {
        let ymd = self.reference_ymd()?;
        NaiveDate::from_ymd_opt((ymd / 10_000) as i32, (ymd / 100) % 100, ymd % 100).ok_or_else(|| {
            AadharError::InvalidField {
                field: "reference id".to_string(),
                reason: format!("{} is not a calendar date", ymd),
            }
        })
    }

    /// Whether the holder was at least 18 on the signing date
    ///
    /// Compares `YYYYMMDD` integers, exactly as the constraint system does.
    pub fn age_above_18(&self) -> Result<bool> {
        let reference = self.reference_ymd()? as i64;
        let dob = self.poi.dob_ymd()? as i64;
        Ok(reference - dob >= 180_000)
    }
}

/// Length and charset check only; 21-digit ids do not fit a `u64`
fn check_digits(s: &str, field: &str, expected: usize) -> Result<()> {
    if s.len() != expected || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AadharError::InvalidField {
            field: field.to_string(),
            reason: format!("expected {} digits, got {:?}", expected, s),
        });
    }
    Ok(())
}

fn parse_digits(s: &str, field: &str, expected: usize) -> Result<u64> {
    check_digits(s, field, expected)?;
    s.bytes()
        .try_fold(0u64, |acc, b| acc.checked_mul(10)?.checked_add((b - b'0') as u64))
        .ok_or_else(|| AadharError::InvalidField {
            field: field.to_string(),
            reason: "value overflows".to_string(),
        })
}

mod hex_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(D::Error::custom)
    }
}
