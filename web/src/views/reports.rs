use crate::use_error;
use dioxus::document::eval;
use dioxus::prelude::*;
use jiff::civil::Date;
use types::{Report, ReportFilter, Role, gates};

use super::components::{AccessDenied, Gate, KpiCard, RoleBadge, format_date};

const EXPORT_FILE_NAME: &str = "report.csv";

#[component]
pub fn Reports() -> Element {
    rsx! {
        Gate {
            requirement: gates::view_reports(),
            fallback: rsx! { AccessDenied {} },
            ReportGenerator {}
        }
    }
}

/// Script that hands `csv` to the browser as a file download.
fn download_script(csv: &str) -> String {
    let body = serde_json::to_string(csv).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"
        const blob = new Blob([{body}], {{ type: "text/csv;charset=utf-8" }});
        const url = URL.createObjectURL(blob);
        const a = document.createElement("a");
        a.href = url;
        a.download = "{EXPORT_FILE_NAME}";
        document.body.appendChild(a);
        a.click();
        a.remove();
        URL.revokeObjectURL(url);
        "#
    )
}

#[component]
fn ReportGenerator() -> Element {
    let mut error_state = use_error();
    let mut start = use_signal(|| None::<Date>);
    let mut end = use_signal(|| None::<Date>);
    let mut role = use_signal(|| None::<Role>);
    let mut report = use_signal(|| None::<Report>);
    let mut generating = use_signal(|| false);
    let mut exporting = use_signal(|| false);

    let filter = move || ReportFilter {
        start: start(),
        end: end(),
        role: role(),
    };

    let generate = move |_: MouseEvent| {
        let filter = filter();
        // Same check the server runs; saves a round trip.
        if let Err(e) = filter.validate() {
            error_state.set(e.to_string());
            return;
        }
        spawn(async move {
            generating.set(true);
            match api::generate_report(filter).await {
                Ok(r) => {
                    error_state.clear();
                    report.set(Some(r));
                }
                Err(e) => error_state.set_server_error(&e),
            }
            generating.set(false);
        });
    };

    let export = move |_: MouseEvent| {
        let filter = filter();
        if let Err(e) = filter.validate() {
            error_state.set(e.to_string());
            return;
        }
        spawn(async move {
            exporting.set(true);
            match api::export_report(filter).await {
                Ok(csv) => {
                    if let Err(e) = eval(&download_script(&csv)).await {
                        tracing::warn!(?e, "csv download failed");
                        error_state.set("Could not start the download.");
                    }
                }
                Err(e) => error_state.set_server_error(&e),
            }
            exporting.set(false);
        });
    };

    rsx! {
        div {
            div { class: "page-header",
                h1 { class: "page-title", "Reports" }
                p { class: "page-subtitle", "Filter users by creation date and role." }
            }

            div { class: "card",
                div { class: "card-body report-filters",
                    div { class: "form-group",
                        label { class: "form-label", r#for: "start", "From" }
                        input {
                            id: "start",
                            class: "form-input",
                            r#type: "date",
                            oninput: move |e| start.set(e.value().parse().ok()),
                        }
                    }
                    div { class: "form-group",
                        label { class: "form-label", r#for: "end", "To" }
                        input {
                            id: "end",
                            class: "form-input",
                            r#type: "date",
                            oninput: move |e| end.set(e.value().parse().ok()),
                        }
                    }
                    div { class: "form-group",
                        label { class: "form-label", r#for: "report-role", "Role" }
                        select {
                            id: "report-role",
                            class: "form-input",
                            onchange: move |e| role.set(e.value().parse().ok()),
                            option { value: "", "All roles" }
                            for r in Role::ALL {
                                option { value: "{r}", "{r.label()}" }
                            }
                        }
                    }
                    div { class: "report-actions",
                        button {
                            class: "btn btn-primary",
                            disabled: generating(),
                            onclick: generate,
                            if generating() { "Generating..." } else { "Generate Report" }
                        }
                        Gate { requirement: gates::export_reports(),
                            button {
                                class: "btn btn-secondary",
                                disabled: exporting(),
                                onclick: export,
                                if exporting() { "Exporting..." } else { "Export CSV" }
                            }
                        }
                    }
                }
            }

            if let Some(report) = report() {
                ReportResults { report }
            }
        }
    }
}

#[component]
fn ReportResults(report: Report) -> Element {
    rsx! {
        div { class: "kpi-grid",
            KpiCard { label: "Matching Users", value: report.total }
            for count in report.by_role.iter() {
                KpiCard { key: "{count.role}", label: count.role.label(), value: count.count }
            }
        }
        div { class: "card",
            div { class: "table-container",
                table {
                    thead {
                        tr {
                            th { "Name" }
                            th { "Email" }
                            th { "Role" }
                            th { "Created" }
                        }
                    }
                    tbody {
                        for row in report.rows.iter() {
                            tr { key: "{row.id}",
                                td { "{row.name}" }
                                td { "{row.email}" }
                                td { RoleBadge { role: row.role } }
                                td { "{format_date(row.created_at)}" }
                            }
                        }
                    }
                }
                if report.rows.is_empty() {
                    p { class: "table-empty text-muted", "No users match these filters." }
                }
                if report.truncated {
                    p { class: "text-muted text-sm",
                        "Showing the newest {report.rows.len()} of {report.total} users."
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_script_escapes_the_payload() {
        let script = download_script("Name\n\"Bob\", Jr.\n");
        assert!(script.contains(r#"["Name\n\"Bob\", Jr.\n"]"#));
    }

    #[test]
    fn export_downloads_as_report_csv() {
        let script = download_script("");
        assert!(script.contains(r#"a.download = "report.csv";"#));
    }
}
