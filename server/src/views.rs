//! Per-page payloads, assembled from a read of the record store.

use std::future::Future;

use jiff::{Timestamp, ToSpan, Zoned, civil::Date, tz::TimeZone};
use types::{Report, ReportFilter, Result, SummaryView, UserRecord, csv};

use crate::{insights::InsightSource, storage::Database};

/// Read-only access to the records the dashboard aggregates.
pub trait RecordStore {
    fn users(&self) -> impl Future<Output = Result<Vec<UserRecord>>> + Send;

    fn logins_since(&self, since: Timestamp) -> impl Future<Output = Result<Vec<Timestamp>>> + Send;
}

impl RecordStore for Database {
    async fn users(&self) -> Result<Vec<UserRecord>> {
        self.list_users().await
    }

    async fn logins_since(&self, since: Timestamp) -> Result<Vec<Timestamp>> {
        Database::logins_since(self, since).await
    }
}

pub struct ViewAssembler<S> {
    store: S,
    row_limit: usize,
    activity_months: usize,
}

impl<S: RecordStore + Sync> ViewAssembler<S> {
    pub fn new(store: S, row_limit: usize, activity_months: usize) -> Self {
        Self {
            store,
            row_limit,
            activity_months,
        }
    }

    pub async fn summary(&self, today: Date) -> Result<SummaryView> {
        let users = self.store.users().await?;
        let logins = self
            .store
            .logins_since(self.series_start(today)?)
            .await?;

        Ok(SummaryView::assemble(
            &users,
            &logins,
            today,
            self.activity_months,
        ))
    }

    /// Rejects an inverted date range before reading anything.
    pub async fn report(&self, filter: &ReportFilter) -> Result<Report> {
        filter.validate()?;

        let users = self.store.users().await?;
        let report = Report::build(&users, filter, self.row_limit)?;

        tracing::debug!(?filter, total = report.total, rows = report.rows.len(), "built report");
        Ok(report)
    }

    pub async fn export(&self, filter: &ReportFilter) -> Result<String> {
        let report = self.report(filter).await?;
        if report.truncated {
            tracing::info!(total = report.total, limit = self.row_limit, "export truncated");
        }
        Ok(csv::export(&report.rows))
    }

    pub async fn insights(&self, source: &impl InsightSource, today: Date) -> Result<Vec<String>> {
        let summary = self.summary(today).await?;
        source.produce_insights(&summary).await
    }

    /// Midnight UTC on the first day of the oldest month in the series.
    fn series_start(&self, today: Date) -> Result<Timestamp> {
        let back = self.activity_months.saturating_sub(1) as i64;
        let first = today.first_of_month().checked_sub(back.months())?;
        let start: Zoned = first.to_zoned(TimeZone::UTC)?;
        Ok(start.timestamp())
    }
}

pub fn today() -> Date {
    Timestamp::now().to_zoned(TimeZone::UTC).date()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use jiff::civil::date;
    use types::{Role, ValidationError};

    use super::*;
    use crate::insights::StaticInsights;

    #[derive(Default)]
    struct MemoryStore {
        users: Vec<UserRecord>,
        logins: Vec<Timestamp>,
        reads: AtomicUsize,
    }

    impl RecordStore for MemoryStore {
        async fn users(&self) -> Result<Vec<UserRecord>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.users.clone())
        }

        async fn logins_since(&self, since: Timestamp) -> Result<Vec<Timestamp>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.logins.iter().copied().filter(|ts| *ts >= since).collect())
        }
    }

    fn user(id: i64, roles: &[Role], created: &str) -> UserRecord {
        UserRecord {
            id,
            name: format!("User {id}"),
            email: format!("user{id}@example.com"),
            roles: roles.to_vec(),
            created_at: created.parse().unwrap(),
        }
    }

    fn store() -> MemoryStore {
        MemoryStore {
            users: vec![
                user(1, &[Role::SuperAdmin], "2024-01-02T00:00:00Z"),
                user(2, &[Role::Admin, Role::Manager], "2024-01-15T00:00:00Z"),
                user(3, &[Role::Employee], "2024-02-03T00:00:00Z"),
                user(4, &[Role::Employee], "2024-02-20T00:00:00Z"),
            ],
            logins: vec![
                "2023-01-01T00:00:00Z".parse().unwrap(),
                "2024-02-01T09:00:00Z".parse().unwrap(),
            ],
            reads: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn summary_counts_overlapping_roles() {
        let assembler = ViewAssembler::new(store(), 100, 3);
        let summary = assembler.summary(date(2024, 2, 25)).await.unwrap();
        let role_sum: u64 = summary.distribution.iter().map(|c| c.count).sum();

        assert_eq!(summary.kpis.total_users, 4);
        assert_eq!(role_sum, 5);
        assert_eq!(summary.monthly.len(), 3);
        assert_eq!(summary.monthly[2].label, "Feb 2024");
        assert_eq!(summary.monthly[2].users, 2);
        assert_eq!(summary.monthly[2].logins, 1);
    }

    #[tokio::test]
    async fn report_filters_by_month_and_role() {
        let assembler = ViewAssembler::new(store(), 100, 3);
        let filter = ReportFilter {
            start: Some(date(2024, 2, 1)),
            end: Some(date(2024, 2, 29)),
            role: Some(Role::Employee),
        };

        let report = assembler.report(&filter).await.unwrap();
        let ids: Vec<i64> = report.rows.iter().map(|r| r.id).collect();
        assert_eq!(report.total, 2);
        assert_eq!(ids, [4, 3]);
    }

    #[tokio::test]
    async fn invalid_range_never_reaches_the_store() {
        let assembler = ViewAssembler::new(store(), 100, 3);
        let filter = ReportFilter {
            start: Some(date(2024, 3, 1)),
            end: Some(date(2024, 2, 1)),
            role: None,
        };

        let error = assembler.report(&filter).await.unwrap_err();
        assert_eq!(error.code(), 422);
        assert!(matches!(
            error.validation(),
            Some(ValidationError::InvalidDateRange { .. })
        ));
        assert_eq!(assembler.store.reads.load(Ordering::SeqCst), 0);

        assert!(assembler.export(&filter).await.is_err());
        assert_eq!(assembler.store.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn export_writes_header_and_rows() {
        let assembler = ViewAssembler::new(store(), 100, 3);
        let filter = ReportFilter {
            role: Some(Role::SuperAdmin),
            ..Default::default()
        };

        let text = assembler.export(&filter).await.unwrap();
        assert_eq!(
            text,
            "Name,Email,Role,Created At\nUser 1,user1@example.com,Super Admin,2024-01-02\n"
        );
    }

    #[tokio::test]
    async fn insights_come_from_the_source() {
        let assembler = ViewAssembler::new(MemoryStore::default(), 100, 3);
        let insights = assembler
            .insights(&StaticInsights, date(2024, 2, 1))
            .await
            .unwrap();
        assert_eq!(insights, StaticInsights::INSIGHTS);
    }

    #[test]
    fn series_starts_on_the_first_of_the_oldest_month() {
        let assembler = ViewAssembler::new(MemoryStore::default(), 100, 3);
        let start = assembler.series_start(date(2024, 2, 25)).unwrap();
        assert_eq!(start, "2023-12-01T00:00:00Z".parse::<Timestamp>().unwrap());
    }
}
