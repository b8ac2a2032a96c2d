use dioxus::prelude::*;
use types::{Role, SummaryView};

use super::components::{ActivityChart, BarChart, KpiCard, use_viewer};

/// Greeting under the page title, by primary role.
fn subtitle(primary_role: Option<Role>) -> &'static str {
    match primary_role {
        Some(Role::SuperAdmin) => "Full control over users, roles, and reports.",
        Some(Role::Admin) => "Manage users and keep an eye on activity.",
        Some(Role::Manager) => "Track your team and generate reports.",
        Some(Role::Employee) | None => "An overview of the organization.",
    }
}

#[component]
pub fn Dashboard() -> Element {
    let viewer = use_viewer();
    let primary_role: Option<Role> = viewer
        .as_ref()
        .and_then(|v| v.primary_role())
        .and_then(|r| r.parse().ok());
    let summary = use_server_future(api::dashboard_summary)?;

    rsx! {
        div {
            div { class: "page-header",
                h1 { class: "page-title", "Dashboard" }
                p { class: "page-subtitle", "{subtitle(primary_role)}" }
            }
            {
                match &*summary.read() {
                    Some(Ok(summary)) => rsx! { SummaryPanels { summary: summary.clone() } },
                    Some(Err(e)) => rsx! {
                        div { class: "card",
                            div { class: "card-body text-muted", "Could not load the dashboard: {e}" }
                        }
                    },
                    None => rsx! { div { class: "loading", "Loading dashboard..." } },
                }
            }
        }
    }
}

#[component]
fn SummaryPanels(summary: SummaryView) -> Element {
    let kpis = summary.kpis;
    let distribution: Vec<(String, u64)> = summary
        .distribution
        .iter()
        .map(|c| (c.role.label().to_string(), c.count))
        .collect();

    rsx! {
        div { class: "kpi-grid",
            KpiCard { label: "Total Users", value: kpis.total_users }
            KpiCard { label: "Admins", value: kpis.total_admins }
            KpiCard { label: "Managers", value: kpis.total_managers }
            KpiCard { label: "Employees", value: kpis.total_employees }
        }
        div { class: "grid grid-cols-2",
            div { class: "card",
                div { class: "card-header",
                    h2 { class: "card-title", "Role Distribution" }
                }
                div { class: "card-body",
                    BarChart { items: distribution }
                }
            }
            div { class: "card",
                div { class: "card-header",
                    h2 { class: "card-title", "Monthly Activity" }
                }
                div { class: "card-body",
                    ActivityChart { points: summary.monthly.clone() }
                }
            }
        }
    }
}
