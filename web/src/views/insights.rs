use crate::use_error;
use dioxus::prelude::*;
use types::gates;

use super::components::{AccessDenied, Gate};

#[component]
pub fn Insights() -> Element {
    rsx! {
        Gate {
            requirement: gates::view_insights(),
            fallback: rsx! { AccessDenied {} },
            InsightList {}
        }
    }
}

#[component]
fn InsightList() -> Element {
    let mut error_state = use_error();
    // None until the first generation finishes.
    let mut insights = use_signal(|| None::<Vec<String>>);
    let mut loading = use_signal(|| false);

    let generate = move |_: MouseEvent| {
        spawn(async move {
            loading.set(true);
            match api::generate_insights().await {
                Ok(list) => insights.set(Some(list)),
                Err(e) => error_state.set_server_error(&e),
            }
            loading.set(false);
        });
    };

    rsx! {
        div {
            div { class: "page-header",
                div { class: "page-header-content",
                    h1 { class: "page-title", "Insights" }
                    p { class: "page-subtitle", "Recommendations drawn from current user activity." }
                }
                div { class: "page-header-actions",
                    button {
                        class: "btn btn-primary",
                        disabled: loading(),
                        onclick: generate,
                        if loading() { "Generating..." } else { "Generate Insights" }
                    }
                }
            }

            div { class: "card",
                div { class: "card-body",
                    if loading() {
                        div { class: "loading", "Analyzing activity..." }
                    } else {
                        {
                            match insights() {
                                None => rsx! {
                                    p { class: "text-muted", "Generate insights to see recommendations." }
                                },
                                Some(list) if list.is_empty() => rsx! {
                                    p { class: "text-muted", "No recommendations right now." }
                                },
                                Some(list) => rsx! {
                                    ul { class: "insight-list",
                                        for (i, insight) in list.iter().enumerate() {
                                            li { key: "{i}", class: "insight-item", "{insight}" }
                                        }
                                    }
                                },
                            }
                        }
                    }
                }
            }
        }
    }
}
