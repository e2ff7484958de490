//! # Diploma Creation Flow
//!
//! Issuer view-model: the creation form, the issued list and its search box.

use diploma_telemetry::{metric_inc, DIPLOMAS_CREATED};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::require_connected;
use crate::domain::{DiplomaDraft, DiplomaRecord, DiplomaStatus, FlowError, Session};
use crate::ports::outbound::DiplomaApi;

/// Issuer view-model.
pub struct DiplomaCreationFlow {
    api: Arc<dyn DiplomaApi>,
    session: watch::Receiver<Session>,
    diplomas: Vec<DiplomaRecord>,
    form_open: bool,
    last_error: Option<FlowError>,
}

impl DiplomaCreationFlow {
    pub fn new(api: Arc<dyn DiplomaApi>, session: watch::Receiver<Session>) -> Self {
        Self {
            api,
            session,
            diplomas: Vec::new(),
            form_open: false,
            last_error: None,
        }
    }

    pub fn open_form(&mut self) {
        self.form_open = true;
    }

    pub fn close_form(&mut self) {
        self.form_open = false;
    }

    pub fn is_form_open(&self) -> bool {
        self.form_open
    }

    /// Validate and submit a draft.
    ///
    /// Field errors are returned without touching the banner. A backend
    /// rejection sets the generic creation failure banner.
    pub async fn submit(&mut self, draft: DiplomaDraft) -> Result<DiplomaRecord, FlowError> {
        draft.validate()?;
        require_connected(&self.session)?;
        self.last_error = None;

        let created = match self.api.create_diploma(&draft).await {
            Ok(created) => created,
            Err(e) => {
                warn!("[diploma] Diploma creation failed: {}", e);
                let err = FlowError::CreationFailed(e);
                self.last_error = Some(err.clone());
                return Err(err);
            }
        };

        let record = DiplomaRecord::from_created(draft, created);
        metric_inc!(DIPLOMAS_CREATED);
        info!(id = %record.id, hash = %record.hash, "[diploma] Diploma created");

        self.diplomas.push(record.clone());
        self.form_open = false;
        Ok(record)
    }

    /// Replace the cached list with the backend's.
    pub async fn refresh(&mut self) -> Result<(), FlowError> {
        require_connected(&self.session)?;
        match self.api.issuer_diplomas().await {
            Ok(diplomas) => {
                self.diplomas = diplomas;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                let err = FlowError::Api(e);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Re-read one diploma's status and update the cached record.
    pub async fn refresh_status(&mut self, diploma_id: &str) -> Result<DiplomaStatus, FlowError> {
        require_connected(&self.session)?;
        let report = self.api.diploma_status(diploma_id).await?;
        if let Some(record) = self.diplomas.iter_mut().find(|d| d.id == diploma_id) {
            record.status = report.status;
        }
        Ok(report.status)
    }

    /// Cached diplomas whose student name, degree or field contains `query`
    /// (case-insensitive). A blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<&DiplomaRecord> {
        let needle = query.trim().to_lowercase();
        self.diplomas
            .iter()
            .filter(|d| {
                needle.is_empty()
                    || [&d.student_name, &d.degree, &d.field]
                        .iter()
                        .any(|v| v.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn diplomas(&self) -> &[DiplomaRecord] {
        &self.diplomas
    }

    /// Error banner of the last attempt.
    pub fn last_error(&self) -> Option<&FlowError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, Role};
    use crate::ports::outbound::MockDiplomaApi;

    fn issuer() -> watch::Receiver<Session> {
        let id = Identity::new("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd").unwrap();
        watch::channel(Session::connected(id, Role::Issuer)).1
    }

    fn draft(name: &str) -> DiplomaDraft {
        DiplomaDraft {
            student_name: name.into(),
            student_id: "S-001".into(),
            degree: "Master".into(),
            field: "Physics".into(),
            graduation_date: "2023-06-30".into(),
            issuer_name: "University of Lyon".into(),
            issuer_id: "UL-1".into(),
        }
    }

    fn record(id: &str, name: &str, degree: &str, field: &str) -> DiplomaRecord {
        DiplomaRecord {
            id: id.into(),
            student_name: name.into(),
            degree: degree.into(),
            field: field.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_appends_and_closes_form() {
        let api = Arc::new(MockDiplomaApi::default());
        let mut flow = DiplomaCreationFlow::new(api.clone(), issuer());
        flow.open_form();

        let record = flow.submit(draft("Al")).await.unwrap();
        assert_eq!(record.student_name, "Al");
        assert_eq!(record.status, DiplomaStatus::Pending);
        assert!(!record.hash.is_empty());
        assert_eq!(flow.diplomas().len(), 1);
        assert!(!flow.is_form_open());
        assert_eq!(api.call_count("create_diploma"), 1);
    }

    #[tokio::test]
    async fn test_validation_runs_before_anything_else() {
        let api = Arc::new(MockDiplomaApi::default());
        let (_tx, rx) = watch::channel(Session::disconnected());
        let mut flow = DiplomaCreationFlow::new(api.clone(), rx);

        let errors = match flow.submit(draft("A")).await {
            Err(FlowError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        };
        assert!(errors.for_field("studentName").is_some());
        assert!(api.calls().is_empty());
        assert!(flow.last_error().is_none());
    }

    #[tokio::test]
    async fn test_submit_requires_connection() {
        let api = Arc::new(MockDiplomaApi::default());
        let (_tx, rx) = watch::channel(Session::disconnected());
        let mut flow = DiplomaCreationFlow::new(api.clone(), rx);

        let err = flow.submit(draft("Alice")).await.unwrap_err();
        assert!(matches!(err, FlowError::NotConnected));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_backend_rejection_is_generic_failure() {
        let api = Arc::new(MockDiplomaApi {
            should_fail: true,
            ..Default::default()
        });
        let mut flow = DiplomaCreationFlow::new(api, issuer());
        flow.open_form();

        let err = flow.submit(draft("Alice")).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to create diploma");
        assert!(matches!(flow.last_error(), Some(FlowError::CreationFailed(_))));
        assert!(flow.is_form_open());
        assert!(flow.diplomas().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_and_search() {
        let api = Arc::new(MockDiplomaApi {
            diplomas: vec![
                record("d1", "Alice Martin", "Master", "Physics"),
                record("d2", "Bob Stone", "Bachelor", "History"),
                record("d3", "Carla Diaz", "PhD", "Astrophysics"),
            ],
            ..Default::default()
        });
        let mut flow = DiplomaCreationFlow::new(api, issuer());
        flow.refresh().await.unwrap();

        assert_eq!(flow.search("").len(), 3);
        let physics: Vec<_> = flow.search("PHYSICS").iter().map(|d| d.id.as_str()).collect();
        assert_eq!(physics, vec!["d1", "d3"]);
        assert_eq!(flow.search("bob")[0].id, "d2");
        assert!(flow.search("chemistry").is_empty());
    }

    #[tokio::test]
    async fn test_refresh_status_updates_cache() {
        let mut confirmed = record("d1", "Alice Martin", "Master", "Physics");
        confirmed.status = DiplomaStatus::Confirmed;
        let api = Arc::new(MockDiplomaApi {
            diplomas: vec![confirmed],
            ..Default::default()
        });
        let mut flow = DiplomaCreationFlow::new(api, issuer());
        flow.diplomas.push(record("d1", "Alice Martin", "Master", "Physics"));

        assert_eq!(flow.refresh_status("d1").await.unwrap(), DiplomaStatus::Confirmed);
        assert_eq!(flow.diplomas()[0].status, DiplomaStatus::Confirmed);
    }
}
