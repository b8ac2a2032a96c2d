use dioxus::prelude::*;

mod views;

use types::{Viewer, gates};
use views::{Dashboard, Gate, Insights, Login, Reports, Users};

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[route("/login?:error")]
    Login { error: Option<String> },
    #[layout(AuthenticatedLayout)]
        #[route("/")]
        Dashboard {},
        #[route("/users")]
        Users {},
        #[route("/reports")]
        Reports {},
        #[route("/insights")]
        Insights {},
}

fn main() {
    #[cfg(feature = "server")]
    {
        server::init_tracing();
        dioxus::serve(|| async move {
            let routes = server::init().await?;

            Ok(dioxus::server::router(App).merge(routes))
        });
    }

    #[cfg(all(feature = "web", not(feature = "server")))]
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Title { "Roster" }
        document::Link { rel: "icon", href: asset!("/assets/favicon.svg") }
        document::Link { rel: "stylesheet", href: asset!("/assets/main.css") }

        Router::<Route> {}
    }
}

#[component]
fn NavLink(to: Route, children: Element) -> Element {
    let current_route: Route = use_route();
    let is_active = current_route == to;

    rsx! {
        Link {
            to,
            class: if is_active { "active" },
            {children}
        }
    }
}

/// Structured error information for display
#[derive(Clone, Debug, Default)]
pub struct ErrorInfo {
    pub message: String,
    pub chain: Vec<String>,
    pub backtrace: Option<String>,
}

impl ErrorInfo {
    /// Parse a ServerFnError to extract structured error info
    pub fn from_server_error(err: &ServerFnError) -> Self {
        match err {
            ServerFnError::ServerError {
                message, details, ..
            } => {
                let chain = details
                    .as_ref()
                    .and_then(|d| d.get("chain"))
                    .and_then(|c| c.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.as_str().map(String::from))
                            .collect()
                    })
                    .unwrap_or_else(|| vec![message.clone()]);
                let backtrace = details
                    .as_ref()
                    .and_then(|d| d.get("backtrace"))
                    .and_then(|b| b.as_str())
                    .map(String::from);

                Self {
                    message: message.clone(),
                    chain,
                    backtrace,
                }
            }
            other => Self {
                message: other.to_string(),
                chain: vec![other.to_string()],
                backtrace: None,
            },
        }
    }
}

/// Global error state - use `use_error()` to access
#[derive(Clone, Copy)]
pub struct ErrorState(Signal<Option<ErrorInfo>>);

impl ErrorState {
    pub fn set(&mut self, error: impl Into<String>) {
        let msg = error.into();
        self.0.set(Some(ErrorInfo {
            message: msg.clone(),
            chain: vec![msg],
            backtrace: None,
        }));
    }

    pub fn set_server_error(&mut self, err: &ServerFnError) {
        // Session gone: back to the login page.
        if let ServerFnError::ServerError { code: 401, message, .. } = err {
            navigator().push(Route::Login {
                error: Some(message.clone()),
            });
            return;
        }
        self.0.set(Some(ErrorInfo::from_server_error(err)));
    }

    pub fn clear(&mut self) {
        self.0.set(None);
    }
}

pub fn use_error() -> ErrorState {
    use_context::<ErrorState>()
}

/// Only frames from this codebase.
fn filter_backtrace(backtrace: &str) -> String {
    backtrace
        .lines()
        .filter(|line| line.contains("/roster/") || line.contains("server::"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[component]
fn ErrorBanner() -> Element {
    let mut error_state = use_context::<ErrorState>();
    let error = error_state.0.read();

    let Some(err) = error.as_ref() else {
        return rsx! {};
    };

    let has_chain = err.chain.len() > 1;
    let filtered_backtrace = err
        .backtrace
        .as_deref()
        .map(filter_backtrace)
        .filter(|bt| !bt.is_empty());

    rsx! {
        div { class: "error-banner",
            div { class: "error-banner-content",
                div { class: "error-banner-header",
                    span { class: "error-banner-message", "{err.message}" }
                    button {
                        class: "error-banner-close",
                        onclick: move |_| error_state.clear(),
                        "×"
                    }
                }
                if has_chain || filtered_backtrace.is_some() {
                    div { class: "error-details",
                        if has_chain {
                            div { class: "error-chain",
                                h4 { class: "error-section-title", "Error Chain" }
                                ol { class: "error-chain-list",
                                    for (i, msg) in err.chain.iter().enumerate() {
                                        li { key: "{i}", class: "error-chain-item", "{msg}" }
                                    }
                                }
                            }
                        }
                        if let Some(backtrace) = &filtered_backtrace {
                            div { class: "error-backtrace",
                                h4 { class: "error-section-title", "Backtrace" }
                                pre { class: "error-backtrace-content", "{backtrace}" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn AuthenticatedLayout() -> Element {
    let viewer = use_server_future(api::get_current_user)?;

    match &*viewer.read() {
        Some(Ok(Some(viewer))) => rsx! {
            ViewerLayout { viewer: viewer.clone() }
        },
        Some(Ok(None)) | Some(Err(_)) => {
            navigator().push(Route::Login { error: None });
            rsx! {
                div { class: "loading", "Redirecting to login..." }
            }
        }
        None => rsx! {
            div { class: "loading", "Loading..." }
        },
    }
}

/// Everything under the layout reads the viewer from context.
#[component]
fn ViewerLayout(viewer: Viewer) -> Element {
    use_context_provider(|| ErrorState(Signal::new(None)));
    use_context_provider(|| viewer.clone());

    let role_label = viewer
        .primary_role()
        .and_then(|r| r.parse::<types::Role>().ok())
        .map_or("No role", types::Role::label);

    rsx! {
        div { class: "app-layout",
            aside { class: "sidebar",
                div { class: "sidebar-header",
                    span { class: "sidebar-logo", "Roster" }
                }
                nav { class: "sidebar-nav",
                    NavLink { to: Route::Dashboard {}, "Dashboard" }
                    Gate { requirement: gates::view_users(),
                        NavLink { to: Route::Users {}, "Users" }
                    }
                    Gate { requirement: gates::view_reports(),
                        NavLink { to: Route::Reports {}, "Reports" }
                    }
                    Gate { requirement: gates::view_insights(),
                        NavLink { to: Route::Insights {}, "Insights" }
                    }
                }
                div { class: "sidebar-footer",
                    div { class: "sidebar-user",
                        div { class: "sidebar-avatar", "{viewer.initial()}" }
                        div { class: "sidebar-user-info",
                            div { class: "sidebar-user-name", "{viewer.name}" }
                            div { class: "sidebar-user-role", "{role_label}" }
                        }
                    }
                    a { href: "/auth/logout", rel: "external", class: "sidebar-logout", "Sign out" }
                }
            }
            main { class: "main-content",
                ErrorBanner {}
                Outlet::<Route> {}
            }
        }
    }
}
