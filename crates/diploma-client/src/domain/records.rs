//! # Records
//!
//! Wire types exchanged with the diploma backend. Field names are camelCase
//! on the wire.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::Role;
use super::errors::{FieldError, ValidationErrors};

/// Minimum length of the student name on the creation form.
pub const MIN_STUDENT_NAME_LEN: usize = 2;

// =============================================================================
// Diplomas
// =============================================================================

/// Issuance status assigned by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiplomaStatus {
    /// Awaiting ledger confirmation.
    #[default]
    Pending,
    /// Anchored on the ledger.
    Confirmed,
    /// Rejected by the ledger or the issuer.
    Rejected,
}

/// The seven-field diploma creation form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiplomaDraft {
    pub student_name: String,
    pub student_id: String,
    pub degree: String,
    pub field: String,
    pub graduation_date: String,
    pub issuer_name: String,
    pub issuer_id: String,
}

impl DiplomaDraft {
    /// Check every field, collecting one error per offending field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if self.student_name.trim().chars().count() < MIN_STUDENT_NAME_LEN {
            errors.push(FieldError::new(
                "studentName",
                format!("Name must be at least {} characters", MIN_STUDENT_NAME_LEN),
            ));
        }

        let required = [
            ("studentId", &self.student_id, "Student ID is required"),
            ("degree", &self.degree, "Degree is required"),
            ("field", &self.field, "Field of study is required"),
            (
                "graduationDate",
                &self.graduation_date,
                "Graduation date is required",
            ),
            ("issuerName", &self.issuer_name, "Issuer name is required"),
            ("issuerId", &self.issuer_id, "Issuer ID is required"),
        ];
        for (field, value, message) in required {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, message));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors::new(errors))
        }
    }
}

/// Backend reply to a diploma creation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDiploma {
    pub id: String,
    pub hash: String,
    pub status: DiplomaStatus,
}

/// A diploma as listed by the issuer endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiplomaRecord {
    pub id: String,
    pub student_name: String,
    pub student_id: String,
    pub degree: String,
    pub field: String,
    pub graduation_date: String,
    pub issuer_name: String,
    pub issuer_id: String,
    pub hash: String,
    pub status: DiplomaStatus,
    pub created_at: Option<String>,
}

impl DiplomaRecord {
    /// Combine a submitted draft with the identifiers the backend assigned.
    pub fn from_created(draft: DiplomaDraft, created: CreatedDiploma) -> Self {
        Self {
            id: created.id,
            student_name: draft.student_name,
            student_id: draft.student_id,
            degree: draft.degree,
            field: draft.field,
            graduation_date: draft.graduation_date,
            issuer_name: draft.issuer_name,
            issuer_id: draft.issuer_id,
            hash: created.hash,
            status: created.status,
            created_at: None,
        }
    }
}

/// Status of an issued diploma as reported by the status endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiplomaStatusReport {
    pub status: DiplomaStatus,
}

// =============================================================================
// Verification
// =============================================================================

/// Outcome recorded in the verification history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Valid,
    Invalid,
    Pending,
}

impl VerificationStatus {
    /// Lowercase wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Valid => "valid",
            VerificationStatus::Invalid => "invalid",
            VerificationStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diploma details returned by a verification call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifiedDiploma {
    pub student_name: String,
    pub degree: String,
    pub field: String,
    pub graduation_date: String,
    pub issuer_name: String,
}

/// Reply of `GET /verifier/verify/{hash}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(default)]
    pub diploma: VerifiedDiploma,
}

/// One entry of the verifier's history.
///
/// The history endpoint has shipped both `hash`/`verificationDate` and
/// `diplomaHash`/`verifiedAt` spellings; both are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub student_name: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub graduation_date: String,
    #[serde(default)]
    pub issuer_name: String,
    #[serde(alias = "diplomaHash")]
    pub hash: String,
    pub status: VerificationStatus,
    #[serde(alias = "verifiedAt")]
    pub verification_date: String,
}

impl VerificationRecord {
    /// Calendar day of the verification.
    ///
    /// Accepts plain dates (`2023-01-03`) and RFC 3339 timestamps.
    pub fn verification_day(&self) -> Option<NaiveDate> {
        parse_day(&self.verification_date)
    }
}

/// Parse a calendar day from a date or timestamp string.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(day);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.date_naive());
    }
    value
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

// =============================================================================
// Ledger
// =============================================================================

/// Ledger inclusion proof for a verified diploma.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainProof {
    pub proof: String,
    pub transaction_hash: String,
}

/// Ledger transaction lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    Pending,
    Confirmed,
    Failed,
}

/// Reply of `GET /blockchain/transaction/{txHash}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
    pub status: TransactionState,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

// =============================================================================
// Auth & Admin
// =============================================================================

/// Reply of `POST /auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Reply of `GET /auth/verify`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenValidity {
    pub valid: bool,
}

/// Reply of `GET /admin/stats`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_diplomas: u64,
    pub total_issuers: u64,
    pub total_verifiers: u64,
    pub recent_verifications: u64,
}

/// Account activation state managed by administrators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// A platform account as listed by `GET /admin/users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    pub address: String,
    pub role: Role,
    #[serde(default)]
    pub created_at: String,
    pub status: UserStatus,
}
