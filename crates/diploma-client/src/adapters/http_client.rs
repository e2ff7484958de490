//! HTTP API Client Adapter
//!
//! Implements the `DiplomaApi` port over `reqwest`. This is the only place
//! the client touches the network.

use async_trait::async_trait;
use diploma_telemetry::{HistogramTimer, API_REQUESTS, API_REQUEST_DURATION};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::config::ApiConfig;
use crate::domain::{
    AdminStats, ApiError, BlockchainProof, CreatedDiploma, DiplomaDraft, DiplomaRecord,
    DiplomaStatusReport, Endpoint, ErrorBody, HttpMethod, Identity, LoginResponse, Session,
    TokenValidity, TransactionStatus, UserAccount, UserStatus, VerificationRecord,
    VerifyResponse,
};
use crate::ports::outbound::DiplomaApi;

/// Header carrying the acting identity.
pub const WALLET_HEADER: &str = "X-Wallet-Address";

/// Metrics label for requests sent through `send` with an arbitrary path.
const ADHOC_LABEL: &str = "adhoc";

/// Decoded success body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Body of a response declaring a JSON content type.
    Json(Value),
    /// Body of any other response (possibly empty).
    Text(String),
}

impl ApiResponse {
    /// Decode a JSON body into a wire type.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::Json(value) => Ok(serde_json::from_value(value)?),
            ApiResponse::Text(text) => Err(ApiError::Decode(format!(
                "expected a JSON body, got {} bytes of text",
                text.len()
            ))),
        }
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Patch => Method::PATCH,
        }
    }
}

/// HTTP gateway to the diploma backend.
///
/// Reads the acting identity from the session channel on every request.
/// Requests are sent at most once: no retry, no timeout.
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: Option<watch::Receiver<Session>>,
}

impl ApiClient {
    /// Create a client for a base URL such as `http://localhost:3001/api`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            session: None,
        })
    }

    /// Create a client from configuration.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url)
    }

    /// Attach the session whose identity is sent with every request.
    pub fn with_session(mut self, session: watch::Receiver<Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn identity(&self) -> Option<Identity> {
        self.session
            .as_ref()
            .and_then(|rx| rx.borrow().identity().cloned())
    }

    /// Base URL with unencoded segments appended (percent-encoded here).
    fn url_for(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request to an unencoded path relative to the base URL.
    ///
    /// Non-success statuses become `ApiError::Api`; unreachable servers
    /// become `ApiError::Transport`.
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ApiError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.dispatch(method, &segments, body, ADHOC_LABEL).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        self.call_raw(endpoint, body).await?.into_json()
    }

    async fn call_raw(
        &self,
        endpoint: Endpoint,
        body: Option<Value>,
    ) -> Result<ApiResponse, ApiError> {
        let info = endpoint.info();
        self.dispatch(
            info.method,
            &endpoint.segments(),
            body.as_ref(),
            &info.label(),
        )
        .await
    }

    async fn dispatch(
        &self,
        method: HttpMethod,
        segments: &[&str],
        body: Option<&Value>,
        label: &str,
    ) -> Result<ApiResponse, ApiError> {
        let _timer = HistogramTimer::labelled(&API_REQUEST_DURATION, &[label]);

        let result = self.execute(method, segments, body).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        API_REQUESTS.with_label_values(&[label, outcome]).inc();
        debug!(
            endpoint = label,
            outcome,
            "[diploma] {} /{}",
            method,
            segments.join("/")
        );

        result
    }

    async fn execute(
        &self,
        method: HttpMethod,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(segments)?;

        let mut request = self
            .client
            .request(method.into(), url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(identity) = self.identity() {
            request = request.header(WALLET_HEADER, identity.as_str());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(is_json_content_type)
            .unwrap_or(false);
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            let body = if is_json {
                match serde_json::from_str(&text) {
                    Ok(value) => ErrorBody::Json(value),
                    Err(_) => ErrorBody::Text(text),
                }
            } else {
                ErrorBody::Text(text)
            };
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        if is_json && !text.trim().is_empty() {
            Ok(ApiResponse::Json(serde_json::from_str(&text)?))
        } else {
            Ok(ApiResponse::Text(text))
        }
    }
}

fn is_json_content_type(value: &str) -> bool {
    let mime = value.split(';').next().unwrap_or("").trim();
    mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
}

#[async_trait]
impl DiplomaApi for ApiClient {
    async fn login(&self, wallet_address: &str) -> Result<LoginResponse, ApiError> {
        let body = serde_json::json!({ "walletAddress": wallet_address });
        self.call(Endpoint::Login, Some(body)).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.call_raw(Endpoint::Logout, None).await.map(|_| ())
    }

    async fn verify_token(&self) -> Result<TokenValidity, ApiError> {
        self.call(Endpoint::VerifyToken, None).await
    }

    async fn admin_stats(&self) -> Result<AdminStats, ApiError> {
        self.call(Endpoint::AdminStats, None).await
    }

    async fn admin_users(&self) -> Result<Vec<UserAccount>, ApiError> {
        self.call(Endpoint::AdminUsers, None).await
    }

    async fn update_user_status(
        &self,
        user_id: &str,
        status: UserStatus,
    ) -> Result<(), ApiError> {
        let endpoint = Endpoint::UpdateUserStatus {
            user_id: user_id.to_string(),
        };
        let body = serde_json::json!({ "status": status });
        self.call_raw(endpoint, Some(body)).await.map(|_| ())
    }

    async fn issuer_diplomas(&self) -> Result<Vec<DiplomaRecord>, ApiError> {
        self.call(Endpoint::IssuerDiplomas, None).await
    }

    async fn create_diploma(&self, draft: &DiplomaDraft) -> Result<CreatedDiploma, ApiError> {
        let body = serde_json::to_value(draft)?;
        self.call(Endpoint::CreateDiploma, Some(body)).await
    }

    async fn diploma_status(&self, diploma_id: &str) -> Result<DiplomaStatusReport, ApiError> {
        let endpoint = Endpoint::DiplomaStatus {
            diploma_id: diploma_id.to_string(),
        };
        self.call(endpoint, None).await
    }

    async fn verify_diploma(&self, hash: &str) -> Result<VerifyResponse, ApiError> {
        let endpoint = Endpoint::VerifyDiploma {
            hash: hash.to_string(),
        };
        self.call(endpoint, None).await
    }

    async fn verification_history(&self) -> Result<Vec<VerificationRecord>, ApiError> {
        self.call(Endpoint::VerificationHistory, None).await
    }

    async fn blockchain_proof(&self, hash: &str) -> Result<BlockchainProof, ApiError> {
        let endpoint = Endpoint::BlockchainProof {
            hash: hash.to_string(),
        };
        self.call(endpoint, None).await
    }

    async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, ApiError> {
        let endpoint = Endpoint::TransactionStatus {
            tx_hash: tx_hash.to_string(),
        };
        self.call(endpoint, None).await
    }
}
