use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

use crate::{Role, UserRecord, ValidationError, summary::RoleCount};

/// Filters of the report generator. Date bounds are inclusive; a missing
/// bound leaves that side open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub start: Option<Date>,
    pub end: Option<Date>,
    pub role: Option<Role>,
}

impl ReportFilter {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => {
                Err(ValidationError::InvalidDateRange { start, end })
            }
            _ => Ok(()),
        }
    }

    pub fn matches(&self, user: &UserRecord) -> bool {
        let created = user.created_on();

        self.start.is_none_or(|start| created >= start)
            && self.end.is_none_or(|end| created <= end)
            && self.role.is_none_or(|role| user.primary_role() == Some(role))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
    pub created_at: Timestamp,
}

impl From<&UserRecord> for ReportRow {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.primary_role(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub total: u64,
    /// Matches per primary role, omitting roles with no matches.
    pub by_role: Vec<RoleCount>,
    /// Newest first, at most the row limit.
    pub rows: Vec<ReportRow>,
    /// Set when `rows` was cut short of `total`.
    pub truncated: bool,
}

impl Report {
    pub fn build(
        users: &[UserRecord],
        filter: &ReportFilter,
        row_limit: usize,
    ) -> Result<Self, ValidationError> {
        filter.validate()?;

        let mut matching: Vec<&UserRecord> = users.iter().filter(|u| filter.matches(u)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let by_role = Role::ALL
            .into_iter()
            .map(|role| RoleCount {
                role,
                count: matching
                    .iter()
                    .filter(|u| u.primary_role() == Some(role))
                    .count() as u64,
            })
            .filter(|c| c.count > 0)
            .collect();

        Ok(Self {
            total: matching.len() as u64,
            by_role,
            truncated: matching.len() > row_limit,
            rows: matching
                .into_iter()
                .take(row_limit)
                .map(ReportRow::from)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn user(id: i64, roles: &[Role], created: &str) -> UserRecord {
        UserRecord {
            id,
            name: format!("User {id}"),
            email: format!("user{id}@example.com"),
            roles: roles.to_vec(),
            created_at: created.parse().unwrap(),
        }
    }

    fn people() -> Vec<UserRecord> {
        vec![
            user(1, &[Role::Employee], "2024-01-31T23:59:59Z"),
            user(2, &[Role::Employee], "2024-02-01T00:00:00Z"),
            user(3, &[Role::Manager, Role::Employee], "2024-02-10T09:00:00Z"),
            user(4, &[Role::Employee], "2024-02-29T23:59:59Z"),
            user(5, &[Role::Employee], "2024-03-01T00:00:00Z"),
            user(6, &[], "2024-02-15T00:00:00Z"),
        ]
    }

    #[test]
    fn february_employees() {
        let filter = ReportFilter {
            start: Some(date(2024, 2, 1)),
            end: Some(date(2024, 2, 29)),
            role: Some(Role::Employee),
        };

        let report = Report::build(&people(), &filter, 100).unwrap();
        let ids: Vec<i64> = report.rows.iter().map(|r| r.id).collect();

        assert_eq!(report.total, 2);
        assert_eq!(ids, [4, 2]);
        assert_eq!(
            report.by_role,
            [RoleCount {
                role: Role::Employee,
                count: 2
            }]
        );
        assert!(!report.truncated);
    }

    #[test]
    fn no_match_is_empty_not_an_error() {
        let filter = ReportFilter {
            start: Some(date(2024, 2, 1)),
            end: Some(date(2024, 2, 29)),
            role: Some(Role::SuperAdmin),
        };

        let report = Report::build(&people(), &filter, 100).unwrap();
        assert_eq!(report, Report::default());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let filter = ReportFilter {
            start: Some(date(2024, 3, 1)),
            end: Some(date(2024, 2, 1)),
            role: None,
        };

        assert_eq!(
            Report::build(&people(), &filter, 100),
            Err(ValidationError::InvalidDateRange {
                start: date(2024, 3, 1),
                end: date(2024, 2, 1),
            })
        );
    }

    #[test]
    fn single_day_range_is_valid() {
        let filter = ReportFilter {
            start: Some(date(2024, 2, 1)),
            end: Some(date(2024, 2, 1)),
            role: None,
        };
        let report = Report::build(&people(), &filter, 100).unwrap();
        assert_eq!(report.total, 1);
    }

    #[test]
    fn open_bounds() {
        let from_march = ReportFilter {
            start: Some(date(2024, 3, 1)),
            ..Default::default()
        };
        let until_january = ReportFilter {
            end: Some(date(2024, 1, 31)),
            ..Default::default()
        };

        assert_eq!(Report::build(&people(), &from_march, 100).unwrap().total, 1);
        assert_eq!(Report::build(&people(), &until_january, 100).unwrap().total, 1);
    }

    #[test]
    fn roleless_users_count_toward_total_only() {
        let report = Report::build(&people(), &ReportFilter::default(), 100).unwrap();
        let breakdown: u64 = report.by_role.iter().map(|c| c.count).sum();

        assert_eq!(report.total, 6);
        assert_eq!(breakdown, 5);
        assert_eq!(report.rows.iter().find(|r| r.id == 6).unwrap().role, None);
    }

    #[test]
    fn rows_are_capped_but_total_is_not() {
        let report = Report::build(&people(), &ReportFilter::default(), 2).unwrap();
        assert_eq!(report.total, 6);
        assert_eq!(report.rows.len(), 2);
        assert!(report.truncated);
        assert_eq!(report.rows[0].id, 5);
    }
}
