use dioxus::prelude::*;
use jiff::{Timestamp, tz::TimeZone};
use types::{AccessRequirement, Role, Viewer, access, gates, summary::PeriodPoint};

/// The viewer provided by the authenticated layout, if any.
pub fn use_viewer() -> Option<Viewer> {
    try_use_context::<Viewer>()
}

/// Renders its children only when the viewer meets `requirement`. Without
/// a viewer in context only an open requirement passes.
#[component]
pub fn Gate(
    requirement: AccessRequirement,
    fallback: Option<Element>,
    children: Element,
) -> Element {
    let viewer = use_viewer();

    if access::evaluate(viewer.as_ref(), &requirement) {
        children
    } else {
        fallback.unwrap_or_else(|| rsx! {})
    }
}

#[component]
pub fn AccessDenied() -> Element {
    rsx! {
        div { class: "card access-denied",
            div { class: "card-body",
                h2 { class: "card-title", "Access denied" }
                p { class: "text-muted", "You don't have permission to view this page." }
            }
        }
    }
}

#[component]
pub fn KpiCard(label: String, value: u64) -> Element {
    rsx! {
        div { class: "kpi-card",
            div { class: "kpi-label", "{label}" }
            div { class: "kpi-value", "{value}" }
        }
    }
}

/// Horizontal bars scaled against the largest value.
#[component]
pub fn BarChart(items: Vec<(String, u64)>) -> Element {
    let max = items.iter().map(|(_, v)| *v).max().unwrap_or(0).max(1);

    rsx! {
        ul { class: "bar-chart",
            for (label, value) in items {
                {
                    let width = format!("width: {}%", value * 100 / max);
                    rsx! {
                        li { key: "{label}", class: "bar-chart-row",
                            span { class: "bar-chart-label", "{label}" }
                            div { class: "bar-chart-track",
                                div { class: "bar-chart-bar", style: width }
                            }
                            span { class: "bar-chart-value", "{value}" }
                        }
                    }
                }
            }
        }
    }
}

/// New users and logins per month, side by side.
#[component]
pub fn ActivityChart(points: Vec<PeriodPoint>) -> Element {
    let max = points
        .iter()
        .map(|p| p.users.max(p.logins))
        .max()
        .unwrap_or(0)
        .max(1);

    rsx! {
        div { class: "activity-chart",
            div { class: "activity-legend",
                span { class: "legend-users", "New users" }
                span { class: "legend-logins", "Logins" }
            }
            div { class: "activity-columns",
                for point in points {
                    {
                        let users_height = format!("height: {}%", point.users * 100 / max);
                        let logins_height = format!("height: {}%", point.logins * 100 / max);
                        rsx! {
                            div { key: "{point.label}", class: "activity-column",
                                div { class: "activity-bars",
                                    div {
                                        class: "activity-bar activity-bar-users",
                                        title: "{point.users} new users",
                                        style: users_height,
                                    }
                                    div {
                                        class: "activity-bar activity-bar-logins",
                                        title: "{point.logins} logins",
                                        style: logins_height,
                                    }
                                }
                                span { class: "activity-label", "{point.label}" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn RoleBadge(role: Option<Role>) -> Element {
    match role {
        Some(role) => {
            let class = format!("badge badge-{}", role.name().to_lowercase().replace(' ', "-"));
            rsx! { span { class, "{role.label()}" } }
        }
        None => rsx! { span { class: "badge", "No role" } },
    }
}

pub fn format_date(ts: Timestamp) -> String {
    ts.to_zoned(TimeZone::UTC).strftime("%b %d, %Y").to_string()
}

/// Roles the viewer may hand out. Super Admin only to Super Admins.
pub fn assignable_roles(viewer: Option<&Viewer>) -> Vec<Role> {
    let may_grant_super_admin = access::evaluate(viewer, &gates::manage_super_admins());

    Role::ALL
        .into_iter()
        .filter(|role| *role != Role::SuperAdmin || may_grant_super_admin)
        .collect()
}

#[component]
pub fn UserForm(
    name: Signal<String>,
    email: Signal<String>,
    role: Signal<Role>,
    roles: Vec<Role>,
) -> Element {
    rsx! {
        div { class: "form-group",
            label { class: "form-label", r#for: "name", "Name *" }
            input {
                id: "name",
                class: "form-input",
                r#type: "text",
                placeholder: "e.g. Jane Smith",
                value: "{name}",
                oninput: move |e| name.set(e.value()),
            }
        }
        div { class: "form-group",
            label { class: "form-label", r#for: "email", "Email *" }
            input {
                id: "email",
                class: "form-input",
                r#type: "email",
                placeholder: "e.g. jsmith@example.com",
                value: "{email}",
                oninput: move |e| email.set(e.value()),
            }
        }
        div { class: "form-group",
            label { class: "form-label", r#for: "role", "Role" }
            select {
                id: "role",
                class: "form-input",
                value: "{role}",
                onchange: move |e| {
                    if let Ok(r) = e.value().parse() {
                        role.set(r);
                    }
                },
                for r in roles {
                    option { value: "{r}", selected: r == role(), "{r.label()}" }
                }
            }
        }
    }
}
