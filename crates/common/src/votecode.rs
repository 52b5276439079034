//! Vote-code parsing and check-digit validation.
//!
//! A vote code is four groups of five decimal digits joined by `-`. The
//! fifth digit of each group is a check digit over the first four, used to
//! catch transcription errors before any network call is made.

use serde::Serialize;

use crate::error::VoteAnchorError;

/// Number of digit groups in a vote code.
pub const NUM_GROUPS: usize = 4;

/// Number of value digits per group (the check digit is one more).
pub const GROUP_SIZE: usize = 4;

/// Separator between groups.
pub const GROUP_SEPARATOR: char = '-';

/// Compute the check digit for one group of value digits.
///
/// The invariant is `check == (10 * NUM_GROUPS - sum(digits)) mod 10`,
/// normalized into `0..10`.
pub fn check_digit(digits: &[u8; GROUP_SIZE]) -> u8 {
    let sum: i32 = digits.iter().map(|&d| i32::from(d)).sum();
    (10 * NUM_GROUPS as i32 - sum).rem_euclid(10) as u8
}

/// Validate a vote code string.
///
/// Pure and total: any string is either accepted or rejected, never an
/// error. Malformed input (wrong separator, wrong group count, non-digits,
/// bad check digit) is a rejection.
pub fn validate(code: &str) -> bool {
    VoteCode::parse(code).is_ok()
}

/// A syntactically valid vote code.
///
/// Can only be obtained through [`VoteCode::parse`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteCode {
    code: String,
}

impl VoteCode {
    /// Parse and validate a vote code.
    ///
    /// Returns [`VoteAnchorError::InvalidFormat`] on any malformed input.
    pub fn parse(code: &str) -> Result<Self, VoteAnchorError> {
        let groups: Vec<&str> = code.split(GROUP_SEPARATOR).collect();
        if groups.len() != NUM_GROUPS {
            return Err(VoteAnchorError::InvalidFormat);
        }
        for group in groups {
            if !group_checks(group) {
                return Err(VoteAnchorError::InvalidFormat);
            }
        }
        Ok(Self {
            code: code.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// Canonical payload encoding of this code.
    pub fn payload(&self) -> VotePayload {
        VotePayload::new(self)
    }
}

impl std::fmt::Display for VoteCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}

/// Check one group: five ASCII digits, trailing digit matching the check
/// digit of the first four. Leading zeros are valid digits.
fn group_checks(group: &str) -> bool {
    let bytes = group.as_bytes();
    if bytes.len() != GROUP_SIZE + 1 || !bytes.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let mut digits = [0u8; GROUP_SIZE];
    for (i, b) in bytes[..GROUP_SIZE].iter().enumerate() {
        digits[i] = b - b'0';
    }
    bytes[GROUP_SIZE] - b'0' == check_digit(&digits)
}

/// Canonical byte encoding of a vote code.
///
/// Used both as the transaction data field and as the dedup search key, so
/// it must be deterministic and injective: identical codes always produce
/// identical bytes. The encoding is the fixed JSON text
/// `{"votecode":"<code>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotePayload {
    bytes: Vec<u8>,
}

#[derive(Serialize)]
struct PayloadRepr<'a> {
    votecode: &'a str,
}

impl VotePayload {
    fn new(code: &VoteCode) -> Self {
        // A single-field struct serializes to the same bytes every time.
        let repr = PayloadRepr {
            votecode: code.as_str(),
        };
        let bytes = serde_json::to_vec(&repr).expect("payload serialization cannot fail");
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex form with `0x` prefix, as carried in a transaction data field and
    /// reported back by the indexing service.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.bytes))
    }
}
