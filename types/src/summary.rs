//! Dashboard payload: KPI cards, role distribution, monthly activity.

use jiff::{Timestamp, ToSpan, civil::Date, tz::TimeZone};
use serde::{Deserialize, Serialize};

use crate::{Role, UserRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_users: u64,
    /// Holders of Admin plus holders of Super Admin.
    pub total_admins: u64,
    pub total_managers: u64,
    pub total_employees: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCount {
    pub role: Role,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodPoint {
    pub label: String,
    pub users: u64,
    pub logins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryView {
    pub kpis: Kpis,
    pub distribution: Vec<RoleCount>,
    pub monthly: Vec<PeriodPoint>,
}

impl SummaryView {
    pub fn assemble(users: &[UserRecord], logins: &[Timestamp], today: Date, months: usize) -> Self {
        let distribution = role_distribution(users);
        let count = |role: Role| {
            distribution
                .iter()
                .find(|c| c.role == role)
                .map_or(0, |c| c.count)
        };

        let kpis = Kpis {
            total_users: users.len() as u64,
            total_admins: count(Role::Admin) + count(Role::SuperAdmin),
            total_managers: count(Role::Manager),
            total_employees: count(Role::Employee),
        };

        Self {
            kpis,
            monthly: monthly_activity(users, logins, today, months),
            distribution,
        }
    }
}

/// One entry per role, in [`Role::ALL`] order. A user is counted under every
/// role they hold, so the counts can add up to more than the user total.
pub fn role_distribution(users: &[UserRecord]) -> Vec<RoleCount> {
    Role::ALL
        .into_iter()
        .map(|role| RoleCount {
            role,
            count: users.iter().filter(|u| u.has_role(role)).count() as u64,
        })
        .collect()
}

/// The `months` calendar months ending with the one containing `today`,
/// oldest first. Users are bucketed by creation month, logins by login
/// month, both in UTC.
pub fn monthly_activity(
    users: &[UserRecord],
    logins: &[Timestamp],
    today: Date,
    months: usize,
) -> Vec<PeriodPoint> {
    let current = today.first_of_month();
    let login_months: Vec<Date> = logins.iter().map(|ts| month_of(*ts)).collect();
    let user_months: Vec<Date> = users.iter().map(|u| month_of(u.created_at)).collect();

    (0..months)
        .rev()
        .filter_map(|back| current.checked_sub((back as i64).months()).ok())
        .map(|month| PeriodPoint {
            label: month.strftime("%b %Y").to_string(),
            users: user_months.iter().filter(|m| **m == month).count() as u64,
            logins: login_months.iter().filter(|m| **m == month).count() as u64,
        })
        .collect()
}

fn month_of(ts: Timestamp) -> Date {
    ts.to_zoned(TimeZone::UTC).date().first_of_month()
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

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn overlapping_roles_are_counted_per_role() {
        let users = [
            user(1, &[Role::SuperAdmin], "2024-01-05T00:00:00Z"),
            user(2, &[Role::Admin, Role::Manager], "2024-01-06T00:00:00Z"),
            user(3, &[Role::Manager], "2024-02-01T00:00:00Z"),
            user(4, &[Role::Employee], "2024-02-02T00:00:00Z"),
        ];

        let summary = SummaryView::assemble(&users, &[], date(2024, 2, 15), 2);
        let role_sum: u64 = summary.distribution.iter().map(|c| c.count).sum();

        assert_eq!(summary.kpis.total_users, 4);
        assert_eq!(role_sum, 5);
        assert_eq!(summary.kpis.total_admins, 2);
        assert_eq!(summary.kpis.total_managers, 2);
        assert_eq!(summary.kpis.total_employees, 1);
    }

    #[test]
    fn distribution_lists_every_role() {
        let summary = SummaryView::assemble(&[], &[], date(2024, 2, 15), 1);
        let roles: Vec<Role> = summary.distribution.iter().map(|c| c.role).collect();
        assert_eq!(roles, Role::ALL);
        assert!(summary.distribution.iter().all(|c| c.count == 0));
    }

    #[test]
    fn monthly_series_is_zero_filled_and_ordered() {
        let users = [
            user(1, &[Role::Employee], "2023-12-31T23:59:59Z"),
            user(2, &[Role::Employee], "2024-02-01T00:00:00Z"),
            user(3, &[Role::Employee], "2024-02-28T10:00:00Z"),
        ];
        let logins = [
            ts("2024-02-03T08:00:00Z"),
            ts("2024-02-04T08:00:00Z"),
            ts("2024-01-20T08:00:00Z"),
            ts("2023-06-01T08:00:00Z"),
        ];

        let monthly = monthly_activity(&users, &logins, date(2024, 2, 15), 4);
        let labels: Vec<&str> = monthly.iter().map(|p| p.label.as_str()).collect();

        assert_eq!(labels, ["Nov 2023", "Dec 2023", "Jan 2024", "Feb 2024"]);
        assert_eq!(monthly[0], PeriodPoint { label: "Nov 2023".into(), users: 0, logins: 0 });
        assert_eq!(monthly[1].users, 1);
        assert_eq!(monthly[2].logins, 1);
        assert_eq!(monthly[3].users, 2);
        assert_eq!(monthly[3].logins, 2);
    }

    #[test]
    fn zero_months_is_empty() {
        assert!(monthly_activity(&[], &[], date(2024, 2, 15), 0).is_empty());
    }
}
