//! # Verification Flow
//!
//! Scan a credential, ask the backend whether it is valid, then fetch the
//! ledger proof for valid diplomas.

use diploma_telemetry::{metric_inc, VERIFICATIONS};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::require_connected;
use crate::domain::{BlockchainProof, FlowError, Session, TransactionStatus, VerifiedDiploma};
use crate::ports::outbound::DiplomaApi;

/// Ledger proof state of a verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofStatus {
    /// The diploma was not valid, no proof was asked for.
    NotRequested,
    Available(BlockchainProof),
    /// The proof lookup failed. Does not affect validity.
    Unavailable(String),
}

/// Result of one verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    /// The scanned hash.
    pub hash: String,
    pub valid: bool,
    pub diploma: VerifiedDiploma,
    pub proof: ProofStatus,
}

/// Verification view-model.
pub struct VerificationFlow {
    api: Arc<dyn DiplomaApi>,
    session: watch::Receiver<Session>,
    last_result: Option<VerificationOutcome>,
    last_error: Option<FlowError>,
}

impl VerificationFlow {
    pub fn new(api: Arc<dyn DiplomaApi>, session: watch::Receiver<Session>) -> Self {
        Self {
            api,
            session,
            last_result: None,
            last_error: None,
        }
    }

    /// Verify a scanned string.
    ///
    /// Absent or blank scans are ignored and return `Ok(None)`. API failures
    /// also set the error banner.
    pub async fn submit_scan(
        &mut self,
        scan: Option<&str>,
    ) -> Result<Option<VerificationOutcome>, FlowError> {
        let Some(hash) = scan.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        require_connected(&self.session)?;
        self.last_error = None;

        let response = match self.api.verify_diploma(hash).await {
            Ok(response) => response,
            Err(e) => {
                warn!("[diploma] Verification of {} failed: {}", hash, e);
                let err = FlowError::Api(e);
                self.last_error = Some(err.clone());
                return Err(err);
            }
        };

        let proof = if response.valid {
            match self.api.blockchain_proof(hash).await {
                Ok(proof) => ProofStatus::Available(proof),
                Err(e) => {
                    warn!("[diploma] Proof lookup for {} failed: {}", hash, e);
                    ProofStatus::Unavailable(e.to_string())
                }
            }
        } else {
            ProofStatus::NotRequested
        };

        let result = if response.valid { "valid" } else { "invalid" };
        metric_inc!(VERIFICATIONS, &[result]);
        info!(hash, result, "[diploma] Diploma verified");

        let outcome = VerificationOutcome {
            hash: hash.to_string(),
            valid: response.valid,
            diploma: response.diploma,
            proof,
        };
        self.last_result = Some(outcome.clone());
        Ok(Some(outcome))
    }

    /// Look up a ledger transaction.
    pub async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, FlowError> {
        require_connected(&self.session)?;
        Ok(self.api.transaction_status(tx_hash).await?)
    }

    /// Status of the transaction behind the last proof, if one was fetched.
    pub async fn proof_transaction_status(
        &self,
    ) -> Option<Result<TransactionStatus, FlowError>> {
        let tx_hash = match self.last_result.as_ref().map(|r| &r.proof) {
            Some(ProofStatus::Available(proof)) => proof.transaction_hash.clone(),
            _ => return None,
        };
        Some(self.transaction_status(&tx_hash).await)
    }

    pub fn last_result(&self) -> Option<&VerificationOutcome> {
        self.last_result.as_ref()
    }

    /// Error banner of the last attempt.
    pub fn last_error(&self) -> Option<&FlowError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Forget the last result and error.
    pub fn reset(&mut self) {
        self.last_result = None;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, Role, TransactionState, VerifyResponse};
    use crate::ports::outbound::MockDiplomaApi;

    fn connected() -> watch::Receiver<Session> {
        let id = Identity::new("0x9876543210987654321098765432109876543210").unwrap();
        watch::channel(Session::connected(id, Role::Verifier)).1
    }

    fn valid_api() -> MockDiplomaApi {
        MockDiplomaApi {
            verify_response: Some(VerifyResponse {
                valid: true,
                diploma: VerifiedDiploma {
                    student_name: "Alice Martin".into(),
                    degree: "Master".into(),
                    ..Default::default()
                },
            }),
            proof: Some(BlockchainProof {
                proof: "0xproof".into(),
                transaction_hash: "0xtx".into(),
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_blank_scan_is_ignored() {
        let api = Arc::new(valid_api());
        let mut flow = VerificationFlow::new(api.clone(), connected());

        assert_eq!(flow.submit_scan(None).await.unwrap(), None);
        assert_eq!(flow.submit_scan(Some("   ")).await.unwrap(), None);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_requires_connection() {
        let api = Arc::new(valid_api());
        let (_tx, rx) = watch::channel(Session::disconnected());
        let mut flow = VerificationFlow::new(api.clone(), rx);

        let err = flow.submit_scan(Some("abc123")).await.unwrap_err();
        assert!(matches!(err, FlowError::NotConnected));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_valid_diploma_fetches_proof_by_hash() {
        let api = Arc::new(valid_api());
        let mut flow = VerificationFlow::new(api.clone(), connected());

        let outcome = flow.submit_scan(Some("abc123")).await.unwrap().unwrap();
        assert!(outcome.valid);
        assert_eq!(outcome.diploma.student_name, "Alice Martin");
        assert!(matches!(outcome.proof, ProofStatus::Available(_)));
        assert_eq!(api.calls(), vec!["verify_diploma", "blockchain_proof"]);
    }

    #[tokio::test]
    async fn test_invalid_diploma_skips_proof() {
        let api = Arc::new(MockDiplomaApi {
            verify_response: Some(VerifyResponse {
                valid: false,
                diploma: VerifiedDiploma::default(),
            }),
            ..valid_api()
        });
        let mut flow = VerificationFlow::new(api.clone(), connected());

        let outcome = flow.submit_scan(Some("abc123")).await.unwrap().unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.proof, ProofStatus::NotRequested);
        assert_eq!(api.call_count("blockchain_proof"), 0);
    }

    #[tokio::test]
    async fn test_proof_failure_is_not_fatal() {
        let api = Arc::new(MockDiplomaApi {
            proof: None,
            ..valid_api()
        });
        let mut flow = VerificationFlow::new(api, connected());

        let outcome = flow.submit_scan(Some("abc123")).await.unwrap().unwrap();
        assert!(outcome.valid);
        assert!(matches!(outcome.proof, ProofStatus::Unavailable(_)));
        assert!(flow.last_error().is_none());
    }

    #[tokio::test]
    async fn test_api_failure_sets_dismissible_banner() {
        let api = Arc::new(MockDiplomaApi {
            should_fail: true,
            ..Default::default()
        });
        let mut flow = VerificationFlow::new(api.clone(), connected());

        assert!(flow.submit_scan(Some("abc123")).await.is_err());
        assert!(matches!(flow.last_error(), Some(FlowError::Api(_))));
        assert_eq!(api.call_count("verify_diploma"), 1);

        flow.dismiss_error();
        assert!(flow.last_error().is_none());
    }

    #[tokio::test]
    async fn test_proof_transaction_status() {
        let api = Arc::new(valid_api());
        let mut flow = VerificationFlow::new(api, connected());
        assert!(flow.proof_transaction_status().await.is_none());

        flow.submit_scan(Some("abc123")).await.unwrap();
        let status = flow.proof_transaction_status().await.unwrap().unwrap();
        assert_eq!(status.status, TransactionState::Confirmed);
    }
}
