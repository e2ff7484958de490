//! # Verification History
//!
//! The verifier's history list and its client-side filters.
//!
//! Three criteria (free text, status, date range) are AND-combined. Each one
//! is a plain predicate over a single record, so applying them one after the
//! other in any order gives the same result as applying them together.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::warn;

use crate::domain::{FlowError, VerificationRecord, VerificationStatus};
use crate::ports::outbound::DiplomaApi;

/// Status criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(VerificationStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: VerificationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

/// Inclusive calendar date range; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether a day falls inside the range.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start.map_or(true, |start| day >= start) && self.end.map_or(true, |end| day <= end)
    }

    /// Whether a record's verification date falls inside the range.
    ///
    /// With any bound set, records whose date cannot be read are excluded.
    pub fn matches(&self, record: &VerificationRecord) -> bool {
        if self.is_open() {
            return true;
        }
        record.verification_day().is_some_and(|day| self.contains(day))
    }
}

/// One filter criterion, usable on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// Case-insensitive substring over student name, degree and hash.
    Text(String),
    Status(StatusFilter),
    Dates(DateRange),
}

impl Criterion {
    pub fn matches(&self, record: &VerificationRecord) -> bool {
        match self {
            Criterion::Text(text) => {
                let needle = text.trim().to_lowercase();
                needle.is_empty()
                    || [&record.student_name, &record.degree, &record.hash]
                        .iter()
                        .any(|v| v.to_lowercase().contains(&needle))
            }
            Criterion::Status(status) => status.matches(record.status),
            Criterion::Dates(range) => range.matches(record),
        }
    }

    /// Keep only the matching records.
    pub fn retain(&self, records: &mut Vec<VerificationRecord>) {
        records.retain(|r| self.matches(r));
    }
}

/// The combined history filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub text: String,
    pub status: StatusFilter,
    pub date_range: DateRange,
}

impl HistoryFilter {
    /// The filter split into its independent criteria.
    pub fn criteria(&self) -> [Criterion; 3] {
        [
            Criterion::Text(self.text.clone()),
            Criterion::Status(self.status),
            Criterion::Dates(self.date_range),
        ]
    }

    pub fn matches(&self, record: &VerificationRecord) -> bool {
        self.criteria().iter().all(|c| c.matches(record))
    }

    /// Matching records, in their original order.
    pub fn apply<'a>(&self, records: &'a [VerificationRecord]) -> Vec<&'a VerificationRecord> {
        let criteria = self.criteria();
        records
            .iter()
            .filter(|r| criteria.iter().all(|c| c.matches(r)))
            .collect()
    }

    /// Whether the filter lets everything through.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.status == StatusFilter::All && self.date_range.is_open()
    }
}

/// Verifier history view-model.
pub struct HistoryView {
    api: Arc<dyn DiplomaApi>,
    records: Vec<VerificationRecord>,
    loaded: bool,
    filter: HistoryFilter,
    last_error: Option<FlowError>,
}

impl HistoryView {
    pub fn new(api: Arc<dyn DiplomaApi>) -> Self {
        Self {
            api,
            records: Vec::new(),
            loaded: false,
            filter: HistoryFilter::default(),
            last_error: None,
        }
    }

    /// Fetch the history unless it was already loaded.
    pub async fn load(&mut self) -> Result<(), FlowError> {
        if self.loaded {
            return Ok(());
        }
        self.reload().await
    }

    /// Fetch the history again.
    pub async fn reload(&mut self) -> Result<(), FlowError> {
        match self.api.verification_history().await {
            Ok(records) => {
                self.records = records;
                self.loaded = true;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!("[diploma] Failed to load verification history: {}", e);
                let err = FlowError::Api(e);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn filter(&self) -> &HistoryFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: HistoryFilter) {
        self.filter = filter;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.filter.text = text.into();
    }

    pub fn set_status(&mut self, status: StatusFilter) {
        self.filter.status = status;
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.filter.date_range = range;
    }

    /// Records passing the current filter.
    pub fn filtered(&self) -> Vec<&VerificationRecord> {
        self.filter.apply(&self.records)
    }

    pub fn records(&self) -> &[VerificationRecord] {
        &self.records
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Error banner of the last load.
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
    use crate::ports::outbound::MockDiplomaApi;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn entry(
        name: &str,
        hash: &str,
        status: VerificationStatus,
        date: &str,
    ) -> VerificationRecord {
        VerificationRecord {
            id: None,
            student_name: name.into(),
            degree: "Bachelor".into(),
            field: "Maths".into(),
            graduation_date: "2022-06-30".into(),
            issuer_name: "University of Lyon".into(),
            hash: hash.into(),
            status,
            verification_date: date.into(),
        }
    }

    fn ten_days() -> Vec<VerificationRecord> {
        (1..=10)
            .map(|d| {
                entry(
                    &format!("Student {}", d),
                    &format!("0xhash{:02}", d),
                    VerificationStatus::Valid,
                    &format!("2023-01-{:02}", d),
                )
            })
            .collect()
    }

    #[test]
    fn test_inclusive_date_range() {
        let records = ten_days();
        let filter = HistoryFilter {
            date_range: DateRange::new(Some(day(3)), Some(day(7))),
            ..Default::default()
        };
        let days: Vec<_> = filter
            .apply(&records)
            .iter()
            .map(|r| r.verification_day().unwrap())
            .collect();
        assert_eq!(days, (3..=7).map(day).collect::<Vec<_>>());
    }

    #[test]
    fn test_open_ended_range() {
        let records = ten_days();
        let from = HistoryFilter {
            date_range: DateRange::new(Some(day(9)), None),
            ..Default::default()
        };
        assert_eq!(from.apply(&records).len(), 2);

        let until = HistoryFilter {
            date_range: DateRange::new(None, Some(day(2))),
            ..Default::default()
        };
        assert_eq!(until.apply(&records).len(), 2);
    }

    #[test]
    fn test_timestamps_compare_as_days() {
        let late = entry("Late", "0x1", VerificationStatus::Valid, "2023-01-07T23:59:00Z");
        let records = vec![late];
        let filter = HistoryFilter {
            date_range: DateRange::new(Some(day(3)), Some(day(7))),
            ..Default::default()
        };
        assert_eq!(filter.apply(&records).len(), 1);
    }

    #[test]
    fn test_text_matches_name_degree_and_hash() {
        let records = vec![
            entry("Alice Martin", "0xaaa", VerificationStatus::Valid, "2023-01-01"),
            entry("Bob Stone", "0xbbb", VerificationStatus::Invalid, "2023-01-02"),
        ];
        let by = |text: &str| HistoryFilter {
            text: text.into(),
            ..Default::default()
        };
        assert_eq!(by("alice").apply(&records).len(), 1);
        assert_eq!(by("0XBBB").apply(&records)[0].student_name, "Bob Stone");
        assert_eq!(by("bachelor").apply(&records).len(), 2);
        assert_eq!(by("maths").apply(&records).len(), 0);
        assert_eq!(by("  ").apply(&records).len(), 2);
    }

    #[test]
    fn test_status_and_empty_filter() {
        let records = vec![
            entry("Alice", "0x1", VerificationStatus::Valid, "2023-01-01"),
            entry("Bob", "0x2", VerificationStatus::Pending, "2023-01-02"),
        ];
        let pending = HistoryFilter {
            status: StatusFilter::Only(VerificationStatus::Pending),
            ..Default::default()
        };
        assert_eq!(pending.apply(&records)[0].student_name, "Bob");

        let empty = HistoryFilter::default();
        assert!(empty.is_empty());
        assert_eq!(empty.apply(&records).len(), 2);
    }

    #[test]
    fn test_unreadable_dates_only_excluded_by_ranges() {
        let records = vec![entry("Alice", "0x1", VerificationStatus::Valid, "unknown")];
        assert_eq!(HistoryFilter::default().apply(&records).len(), 1);

        let ranged = HistoryFilter {
            date_range: DateRange::new(Some(day(1)), None),
            ..Default::default()
        };
        assert!(ranged.apply(&records).is_empty());
    }

    #[tokio::test]
    async fn test_load_once_then_filter() {
        let api = Arc::new(MockDiplomaApi {
            history: ten_days(),
            ..Default::default()
        });
        let mut view = HistoryView::new(api.clone());
        view.load().await.unwrap();
        view.load().await.unwrap();
        assert_eq!(api.call_count("verification_history"), 1);

        view.set_text("student 1");
        assert_eq!(view.filtered().len(), 2);
        view.set_date_range(DateRange::new(Some(day(5)), None));
        assert_eq!(view.filtered()[0].student_name, "Student 10");
    }

    #[tokio::test]
    async fn test_load_failure_sets_banner() {
        let api = Arc::new(MockDiplomaApi {
            should_fail: true,
            ..Default::default()
        });
        let mut view = HistoryView::new(api);
        assert!(view.load().await.is_err());
        assert!(!view.is_loaded());
        assert!(view.last_error().is_some());
        view.dismiss_error();
        assert!(view.last_error().is_none());
    }

    fn status_strategy() -> impl Strategy<Value = VerificationStatus> {
        prop_oneof![
            Just(VerificationStatus::Valid),
            Just(VerificationStatus::Invalid),
            Just(VerificationStatus::Pending),
        ]
    }

    fn record_strategy() -> impl Strategy<Value = VerificationRecord> {
        ("[a-c]{1,4}", "[a-c0-9]{1,6}", status_strategy(), 1u32..=10).prop_map(
            |(name, hash, status, d)| entry(&name, &hash, status, &format!("2023-01-{:02}", d)),
        )
    }

    fn filter_strategy() -> impl Strategy<Value = HistoryFilter> {
        (
            "[a-c]{0,2}",
            prop::option::of(status_strategy()),
            prop::option::of(1u32..=10),
            prop::option::of(1u32..=10),
        )
            .prop_map(|(text, status, start, end)| HistoryFilter {
                text,
                status: status.map_or(StatusFilter::All, StatusFilter::Only),
                date_range: DateRange::new(start.map(day), end.map(day)),
            })
    }

    proptest! {
        #[test]
        fn prop_filter_order_is_irrelevant(
            records in prop::collection::vec(record_strategy(), 0..30),
            filter in filter_strategy(),
            order in Just(vec![0usize, 1, 2]).prop_shuffle(),
        ) {
            let combined: Vec<VerificationRecord> =
                filter.apply(&records).into_iter().cloned().collect();

            let criteria = filter.criteria();
            let mut sequential = records.clone();
            for i in order {
                criteria[i].retain(&mut sequential);
            }

            prop_assert_eq!(combined, sequential);
        }
    }
}
