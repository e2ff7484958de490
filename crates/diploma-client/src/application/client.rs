//! # Diploma Client
//!
//! Wires the adapters to the session store and hands out view-models that
//! share one session.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::{
    AdminOverview, DashboardSelector, Debouncer, DiplomaCreationFlow, HistoryView, SessionStore,
    VerificationFlow,
};
use crate::adapters::{ApiClient, FileStorage, MemoryStorage, StaticRoleDirectory};
use crate::config::{ClientConfig, ConfigError, SearchConfig};
use crate::domain::ApiError;
use crate::ports::outbound::{DiplomaApi, SessionStorage, Signer};

/// Client construction errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API client error: {0}")]
    Api(#[from] ApiError),
}

/// Entry point of the library.
pub struct DiplomaClient {
    session: Arc<SessionStore>,
    api: Arc<dyn DiplomaApi>,
    search: SearchConfig,
}

impl DiplomaClient {
    /// Build a client from configuration.
    ///
    /// Sessions are persisted to `session.storage_path` when set, in memory
    /// otherwise.
    pub fn from_config(
        config: &ClientConfig,
        signer: Option<Arc<dyn Signer>>,
    ) -> Result<Self, ClientError> {
        config.validate()?;

        let storage: Arc<dyn SessionStorage> = match &config.session.storage_path {
            Some(path) => Arc::new(FileStorage::new(path)),
            None => Arc::new(MemoryStorage::new()),
        };
        let resolver = Arc::new(StaticRoleDirectory::from_config(&config.roles));
        let session = Arc::new(
            SessionStore::new(signer, resolver, storage).configured(&config.session),
        );
        let api = ApiClient::from_config(&config.api)?.with_session(session.subscribe());

        info!(
            api = %config.api.base_url,
            roles = config.roles.entries.len(),
            "[diploma] Client initialized"
        );

        Ok(Self {
            session,
            api: Arc::new(api),
            search: config.search.clone(),
        })
    }

    /// Assemble a client from already built parts.
    pub fn from_parts(
        session: Arc<SessionStore>,
        api: Arc<dyn DiplomaApi>,
        search: SearchConfig,
    ) -> Self {
        Self {
            session,
            api,
            search,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn api(&self) -> &Arc<dyn DiplomaApi> {
        &self.api
    }

    pub fn selector(&self) -> DashboardSelector {
        DashboardSelector::new(self.session.subscribe())
    }

    pub fn verification_flow(&self) -> VerificationFlow {
        VerificationFlow::new(self.api.clone(), self.session.subscribe())
    }

    pub fn creation_flow(&self) -> DiplomaCreationFlow {
        DiplomaCreationFlow::new(self.api.clone(), self.session.subscribe())
    }

    pub fn history_view(&self) -> HistoryView {
        HistoryView::new(self.api.clone())
    }

    pub fn admin_overview(&self) -> AdminOverview {
        AdminOverview::new(self.api.clone(), self.session.subscribe())
    }

    /// Debouncer for the search input.
    pub fn debouncer(&self) -> Debouncer {
        Debouncer::from_config(&self.search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::DashboardView;
    use crate::domain::Role;
    use crate::ports::outbound::MockSigner;
    use std::time::Duration;

    fn signer(address: &str) -> Option<Arc<dyn Signer>> {
        Some(Arc::new(MockSigner::with_account(address)) as Arc<dyn Signer>)
    }

    #[tokio::test]
    async fn test_connect_routes_to_role_dashboard() {
        let client = DiplomaClient::from_config(
            &ClientConfig::for_testing(),
            signer("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd"),
        )
        .unwrap();
        let selector = client.selector();
        assert_eq!(selector.current(), DashboardView::ConnectPrompt);

        let session = client.session().connect().await.unwrap();
        assert_eq!(session.role(), Role::Issuer);
        assert_eq!(selector.current(), DashboardView::IssuerView);

        client.session().disconnect();
        assert_eq!(selector.current(), DashboardView::ConnectPrompt);
    }

    #[tokio::test]
    async fn test_view_models_share_the_session() {
        let client = DiplomaClient::from_config(&ClientConfig::default(), None).unwrap();
        let mut flow = client.creation_flow();
        assert!(flow.refresh().await.is_err());
        assert_eq!(client.debouncer().delay(), Duration::from_millis(300));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ClientConfig::default();
        config.api.base_url = "ftp://example.com".into();

        let err = DiplomaClient::from_config(&config, None).err().unwrap();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_file_backed_session_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::for_testing();
        config.session.storage_path = Some(dir.path().join("session.json"));

        let first = DiplomaClient::from_config(
            &config,
            signer("0x9876543210987654321098765432109876543210"),
        )
        .unwrap();
        first.session().connect().await.unwrap();

        let second = DiplomaClient::from_config(&config, None).unwrap();
        let restored = second.session().restore();
        assert_eq!(restored.role(), Role::Verifier);
        assert_eq!(second.selector().current(), DashboardView::VerifierView);
    }
}
