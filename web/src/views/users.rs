use crate::use_error;
use dioxus::prelude::*;
use types::{Role, UserForm, UserQuery, UserRecord, gates};

use super::components::{
    AccessDenied, Gate, RoleBadge, UserForm as UserFormFields, assignable_roles, format_date,
    use_viewer,
};

#[component]
pub fn Users() -> Element {
    rsx! {
        Gate {
            requirement: gates::view_users(),
            fallback: rsx! { AccessDenied {} },
            UserManagement {}
        }
    }
}

/// Which modal, if any, is open over the table.
#[derive(Clone, PartialEq)]
enum Modal {
    Create,
    Edit(UserRecord),
    Delete(UserRecord),
}

#[component]
fn UserManagement() -> Element {
    let viewer = use_viewer();
    let mut users = use_signal(Vec::<UserRecord>::new);
    let mut loading = use_signal(|| true);
    let mut error_state = use_error();
    let mut search = use_signal(String::new);
    let mut role_filter = use_signal(|| None::<Role>);
    let mut modal = use_signal(|| None::<Modal>);

    use_effect(move || {
        spawn(async move {
            loading.set(true);
            match api::list_users().await {
                Ok(u) => users.set(u),
                Err(e) => error_state.set_server_error(&e),
            }
            loading.set(false);
        });
    });

    let refresh_users = move || {
        spawn(async move {
            match api::list_users().await {
                Ok(u) => users.set(u),
                Err(e) => error_state.set_server_error(&e),
            }
        });
    };

    let visible = use_memo(move || {
        let query = UserQuery {
            search: search(),
            role: role_filter(),
        };
        users
            .read()
            .iter()
            .filter(|u| query.matches(u))
            .cloned()
            .collect::<Vec<_>>()
    });

    let own_id = viewer.as_ref().map(|v| v.id.clone()).unwrap_or_default();
    let roles = assignable_roles(viewer.as_ref());

    rsx! {
        div {
            div { class: "page-header",
                div { class: "page-header-content",
                    h1 { class: "page-title", "User Management" }
                    p { class: "page-subtitle", "Add, edit, and remove users and their roles." }
                }
                div { class: "page-header-actions",
                    Gate { requirement: gates::create_users(),
                        button {
                            class: "btn btn-primary",
                            onclick: move |_| modal.set(Some(Modal::Create)),
                            "Add User"
                        }
                    }
                }
            }

            div { class: "filter-bar",
                input {
                    class: "form-input",
                    r#type: "search",
                    placeholder: "Search by name or email",
                    value: "{search}",
                    oninput: move |e| search.set(e.value()),
                }
                select {
                    class: "form-input",
                    onchange: move |e| role_filter.set(e.value().parse().ok()),
                    option { value: "", "All roles" }
                    for role in Role::ALL {
                        option { value: "{role}", "{role.label()}" }
                    }
                }
            }

            if *loading.read() {
                div { class: "loading", "Loading users..." }
            } else {
                div { class: "card",
                    div { class: "table-container",
                        table {
                            thead {
                                tr {
                                    th { "Name" }
                                    th { "Email" }
                                    th { "Role" }
                                    th { "Created" }
                                    th { "" }
                                }
                            }
                            tbody {
                                for user in visible.read().iter() {
                                    {
                                        let is_self = user.id.to_string() == own_id;
                                        let edit_target = user.clone();
                                        let delete_target = user.clone();
                                        rsx! {
                                            tr { key: "{user.id}",
                                                td { "{user.name}" }
                                                td { "{user.email}" }
                                                td { RoleBadge { role: user.primary_role() } }
                                                td { "{format_date(user.created_at)}" }
                                                td { class: "table-actions",
                                                    Gate { requirement: gates::edit_users(),
                                                        button {
                                                            class: "btn btn-link",
                                                            onclick: move |_| modal.set(Some(Modal::Edit(edit_target.clone()))),
                                                            "Edit"
                                                        }
                                                    }
                                                    if !is_self {
                                                        Gate { requirement: gates::delete_users(),
                                                            button {
                                                                class: "btn btn-link btn-link-danger",
                                                                onclick: move |_| modal.set(Some(Modal::Delete(delete_target.clone()))),
                                                                "Delete"
                                                            }
                                                        }
                                                    }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                        if visible.read().is_empty() {
                            p { class: "table-empty text-muted", "No users match." }
                        }
                    }
                }
            }

            {
                match modal() {
                    Some(Modal::Create) => rsx! {
                        UserModal {
                            roles: roles.clone(),
                            on_close: move |_| modal.set(None),
                            on_saved: move |_| {
                                modal.set(None);
                                refresh_users();
                            },
                        }
                    },
                    Some(Modal::Edit(user)) => rsx! {
                        UserModal {
                            user,
                            roles: roles.clone(),
                            on_close: move |_| modal.set(None),
                            on_saved: move |_| {
                                modal.set(None);
                                refresh_users();
                            },
                        }
                    },
                    Some(Modal::Delete(user)) => rsx! {
                        DeleteConfirmModal {
                            user,
                            on_close: move |_| modal.set(None),
                            on_deleted: move |_| {
                                modal.set(None);
                                refresh_users();
                            },
                        }
                    },
                    None => rsx! {},
                }
            }
        }
    }
}

/// Create when `user` is `None`, edit otherwise.
#[component]
fn UserModal(
    user: Option<UserRecord>,
    roles: Vec<Role>,
    on_close: EventHandler<()>,
    on_saved: EventHandler<()>,
) -> Element {
    let mut error_state = use_error();
    let editing = user.as_ref().map(|u| u.id);
    let initial = user.clone();
    let name = use_signal(|| initial.as_ref().map(|u| u.name.clone()).unwrap_or_default());
    let email = use_signal(|| initial.as_ref().map(|u| u.email.clone()).unwrap_or_default());
    let role = use_signal(|| {
        initial
            .as_ref()
            .and_then(UserRecord::primary_role)
            .unwrap_or_default()
    });
    let mut saving = use_signal(|| false);

    let can_submit = !name.read().trim().is_empty() && !email.read().trim().is_empty();
    let title = if editing.is_some() { "Edit User" } else { "Add User" };

    rsx! {
        div { class: "modal-overlay",
            onclick: move |_| on_close.call(()),
            div { class: "modal",
                onclick: move |e| e.stop_propagation(),
                div { class: "modal-header",
                    h2 { class: "modal-title", "{title}" }
                    button {
                        class: "modal-close",
                        onclick: move |_| on_close.call(()),
                        "×"
                    }
                }
                div { class: "modal-body",
                    UserFormFields { name, email, role, roles }
                }
                div { class: "modal-footer",
                    button {
                        class: "btn btn-secondary",
                        onclick: move |_| on_close.call(()),
                        "Cancel"
                    }
                    button {
                        class: "btn btn-primary",
                        disabled: !can_submit || *saving.read(),
                        onclick: move |_| {
                            let form = UserForm {
                                name: name.read().clone(),
                                email: email.read().clone(),
                                role: role(),
                            };
                            spawn(async move {
                                saving.set(true);
                                let result = match editing {
                                    Some(user_id) => api::update_user(user_id, form).await,
                                    None => api::create_user(form).await.map(|_| ()),
                                };
                                match result {
                                    Ok(()) => on_saved.call(()),
                                    Err(e) => error_state.set_server_error(&e),
                                }
                                saving.set(false);
                            });
                        },
                        if *saving.read() { "Saving..." } else { "Save" }
                    }
                }
            }
        }
    }
}

#[component]
fn DeleteConfirmModal(
    user: UserRecord,
    on_close: EventHandler<()>,
    on_deleted: EventHandler<()>,
) -> Element {
    let mut error_state = use_error();
    let mut deleting = use_signal(|| false);
    let user_id = user.id;

    rsx! {
        div { class: "modal-overlay",
            onclick: move |_| if !deleting() { on_close.call(()) },
            div { class: "modal modal-sm",
                onclick: move |e| e.stop_propagation(),
                div { class: "modal-header",
                    h2 { class: "modal-title", "Delete User" }
                    if !deleting() {
                        button {
                            class: "modal-close",
                            onclick: move |_| on_close.call(()),
                            "×"
                        }
                    }
                }
                div { class: "modal-body",
                    p { "Are you sure you want to delete " strong { "{user.name}" } "?" }
                    p { class: "text-muted", "This action cannot be undone." }
                }
                div { class: "modal-footer",
                    button {
                        class: "btn btn-secondary",
                        disabled: deleting(),
                        onclick: move |_| on_close.call(()),
                        "Cancel"
                    }
                    button {
                        class: "btn btn-danger",
                        disabled: deleting(),
                        onclick: move |_| {
                            spawn(async move {
                                deleting.set(true);
                                match api::delete_user(user_id).await {
                                    Ok(()) => on_deleted.call(()),
                                    Err(e) => error_state.set_server_error(&e),
                                }
                                deleting.set(false);
                            });
                        },
                        if deleting() { "Deleting..." } else { "Delete" }
                    }
                }
            }
        }
    }
}
