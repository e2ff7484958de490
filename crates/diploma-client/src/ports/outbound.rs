//! # Outbound Ports
//!
//! Traits for external dependencies: the wallet signer, durable session
//! storage, the role directory and the diploma backend.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::domain::{
    AdminStats, ApiError, BlockchainProof, CreatedDiploma, DiplomaDraft, DiplomaRecord,
    DiplomaStatus, DiplomaStatusReport, ErrorBody, Identity, LoginResponse, Role, SignerError,
    StorageError, TokenValidity, TransactionState, TransactionStatus, UserAccount, UserStatus,
    VerificationRecord, VerifyResponse,
};

/// Storage key of the persisted identity.
pub const WALLET_ADDRESS_KEY: &str = "walletAddress";

/// Storage key of the persisted role.
pub const USER_ROLE_KEY: &str = "userRole";

/// External signer capability (wallet extension) - outbound port.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Request the accounts the user is willing to expose.
    async fn request_accounts(&self) -> Result<Vec<String>, SignerError>;
}

/// Durable key-value storage for the session snapshot - outbound port.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Drop every key, including unreadable contents.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Identity to role directory - outbound port.
///
/// Total and side-effect free: unknown identities map to `Role::None`.
pub trait RoleResolver: Send + Sync {
    fn resolve(&self, identity: &Identity) -> Role;
}

/// Diploma backend - outbound port.
///
/// One method per endpoint of the wire contract.
#[async_trait]
pub trait DiplomaApi: Send + Sync {
    async fn login(&self, wallet_address: &str) -> Result<LoginResponse, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;

    async fn verify_token(&self) -> Result<TokenValidity, ApiError>;

    async fn admin_stats(&self) -> Result<AdminStats, ApiError>;

    async fn admin_users(&self) -> Result<Vec<UserAccount>, ApiError>;

    async fn update_user_status(&self, user_id: &str, status: UserStatus)
        -> Result<(), ApiError>;

    async fn issuer_diplomas(&self) -> Result<Vec<DiplomaRecord>, ApiError>;

    async fn create_diploma(&self, draft: &DiplomaDraft) -> Result<CreatedDiploma, ApiError>;

    async fn diploma_status(&self, diploma_id: &str) -> Result<DiplomaStatusReport, ApiError>;

    async fn verify_diploma(&self, hash: &str) -> Result<VerifyResponse, ApiError>;

    async fn verification_history(&self) -> Result<Vec<VerificationRecord>, ApiError>;

    async fn blockchain_proof(&self, hash: &str) -> Result<BlockchainProof, ApiError>;

    async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, ApiError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock wallet signer for testing.
#[derive(Default)]
pub struct MockSigner {
    /// Accounts handed out on request.
    pub accounts: Vec<String>,
    /// Simulate the user declining.
    pub reject: bool,
    /// Simulate a signer failure with this reason.
    pub failure: Option<String>,
    /// Simulated time the user takes to approve.
    pub delay: Option<Duration>,
    /// Account requests received.
    pub requests: AtomicUsize,
}

impl MockSigner {
    /// Signer exposing a single account.
    pub fn with_account(account: impl Into<String>) -> Self {
        Self {
            accounts: vec![account.into()],
            ..Default::default()
        }
    }

    /// Number of account requests received.
    pub fn calls(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Signer for MockSigner {
    async fn request_accounts(&self) -> Result<Vec<String>, SignerError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject {
            return Err(SignerError::Rejected);
        }
        if let Some(reason) = &self.failure {
            return Err(SignerError::Failed(reason.clone()));
        }

        Ok(self.accounts.clone())
    }
}

/// Mock diploma backend for testing.
///
/// Serves canned data and records the name of every endpoint called.
#[derive(Default)]
pub struct MockDiplomaApi {
    /// Reply of the verify endpoint (`None` = 404).
    pub verify_response: Option<VerifyResponse>,
    /// Reply of the proof endpoint (`None` = 404).
    pub proof: Option<BlockchainProof>,
    /// Verification history.
    pub history: Vec<VerificationRecord>,
    /// Issued diplomas.
    pub diplomas: Vec<DiplomaRecord>,
    /// Admin statistics.
    pub stats: AdminStats,
    /// Platform accounts.
    pub users: Vec<UserAccount>,
    /// Should every call fail with a 500?
    pub should_fail: bool,
    /// Endpoints called so far.
    pub log: Mutex<Vec<&'static str>>,
}

impl MockDiplomaApi {
    /// Names of the endpoints called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.log.lock().clone()
    }

    /// How many times an endpoint was called.
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.log.lock().iter().filter(|c| **c == endpoint).count()
    }

    fn record(&self, endpoint: &'static str) -> Result<(), ApiError> {
        self.log.lock().push(endpoint);
        if self.should_fail {
            return Err(mock_error(500, "Mock failure"));
        }
        Ok(())
    }
}

fn mock_error(status: u16, message: &str) -> ApiError {
    ApiError::Api {
        status,
        body: ErrorBody::Json(serde_json::json!({ "message": message })),
    }
}

#[async_trait]
impl DiplomaApi for MockDiplomaApi {
    async fn login(&self, wallet_address: &str) -> Result<LoginResponse, ApiError> {
        self.record("login")?;
        Ok(LoginResponse {
            token: format!("mock-token-{}", wallet_address),
        })
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record("logout")
    }

    async fn verify_token(&self) -> Result<TokenValidity, ApiError> {
        self.record("verify_token")?;
        Ok(TokenValidity { valid: true })
    }

    async fn admin_stats(&self) -> Result<AdminStats, ApiError> {
        self.record("admin_stats")?;
        Ok(self.stats)
    }

    async fn admin_users(&self) -> Result<Vec<UserAccount>, ApiError> {
        self.record("admin_users")?;
        Ok(self.users.clone())
    }

    async fn update_user_status(
        &self,
        user_id: &str,
        _status: UserStatus,
    ) -> Result<(), ApiError> {
        self.record("update_user_status")?;
        if self.users.iter().any(|u| u.id == user_id) {
            Ok(())
        } else {
            Err(mock_error(404, "User not found"))
        }
    }

    async fn issuer_diplomas(&self) -> Result<Vec<DiplomaRecord>, ApiError> {
        self.record("issuer_diplomas")?;
        Ok(self.diplomas.clone())
    }

    async fn create_diploma(&self, _draft: &DiplomaDraft) -> Result<CreatedDiploma, ApiError> {
        self.record("create_diploma")?;
        let n = self.call_count("create_diploma");
        Ok(CreatedDiploma {
            id: format!("mock-diploma-{}", n),
            hash: format!("0xmock{:04}", n),
            status: DiplomaStatus::Pending,
        })
    }

    async fn diploma_status(&self, diploma_id: &str) -> Result<DiplomaStatusReport, ApiError> {
        self.record("diploma_status")?;
        self.diplomas
            .iter()
            .find(|d| d.id == diploma_id)
            .map(|d| DiplomaStatusReport { status: d.status })
            .ok_or_else(|| mock_error(404, "Diploma not found"))
    }

    async fn verify_diploma(&self, _hash: &str) -> Result<VerifyResponse, ApiError> {
        self.record("verify_diploma")?;
        self.verify_response
            .clone()
            .ok_or_else(|| mock_error(404, "Diploma not found"))
    }

    async fn verification_history(&self) -> Result<Vec<VerificationRecord>, ApiError> {
        self.record("verification_history")?;
        Ok(self.history.clone())
    }

    async fn blockchain_proof(&self, _hash: &str) -> Result<BlockchainProof, ApiError> {
        self.record("blockchain_proof")?;
        self.proof
            .clone()
            .ok_or_else(|| mock_error(404, "Proof not found"))
    }

    async fn transaction_status(&self, _tx_hash: &str) -> Result<TransactionStatus, ApiError> {
        self.record("transaction_status")?;
        Ok(TransactionStatus {
            status: TransactionState::Confirmed,
            block_number: Some(1),
            timestamp: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_signer_accounts() {
        let signer = MockSigner::with_account("0xabc");
        let accounts = tokio_test::assert_ok!(tokio_test::block_on(signer.request_accounts()));
        assert_eq!(accounts, vec!["0xabc"]);
        assert_eq!(signer.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_signer_rejects() {
        let signer = MockSigner {
            reject: true,
            ..Default::default()
        };
        assert_eq!(
            signer.request_accounts().await.unwrap_err(),
            SignerError::Rejected
        );
    }

    #[tokio::test]
    async fn test_mock_api_records_calls() {
        let api = MockDiplomaApi::default();
        assert!(api.verify_diploma("abc").await.is_err());
        assert!(api.verification_history().await.unwrap().is_empty());
        assert_eq!(api.calls(), vec!["verify_diploma", "verification_history"]);
        assert_eq!(api.call_count("blockchain_proof"), 0);
    }

    #[tokio::test]
    async fn test_mock_api_failure() {
        let api = MockDiplomaApi {
            should_fail: true,
            ..Default::default()
        };
        let err = api.admin_stats().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }
}
