mod auth_routes;
mod config;
mod http;
mod identity;
pub mod insights;
pub mod storage;
mod uuid_v7;
pub mod views;

use axum::Router;
use axum::http::HeaderMap;
use dioxus::fullstack::FullstackContext;
use jiff::{SignedDuration, Timestamp};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use types::{
    AccessRequirement, Error, Report, ReportFilter, Result, Role, SummaryView, UserForm,
    UserRecord, Viewer, gates,
};

use crate::auth_routes::{AuthState, auth_router, session_token};
pub use crate::config::CONFIG;
use crate::insights::ConfiguredInsights;
use crate::storage::{Database, Session};
use crate::uuid_v7::UuidV7Ext;
use crate::views::ViewAssembler;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The dioxus runtime may already have installed a subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Migrate and seed the store, then hand back the auth routes to merge into
/// the app router.
pub async fn init() -> anyhow::Result<Router> {
    let db = Database::shared();
    db.migrate().await.map_err(Error::into_inner)?;

    if CONFIG.seed_demo_users {
        storage::seed::demo_users(&db)
            .await
            .map_err(Error::into_inner)?;
    }

    let auth_state = AuthState::new().map_err(Error::into_inner)?;
    Ok(auth_router(auth_state))
}

/// The viewer behind the current request, with roles and permissions
/// resolved against the record store.
pub async fn current_viewer() -> Result<Viewer> {
    let headers: HeaderMap = FullstackContext::extract().await?;

    let token = session_token(&headers).ok_or_else(|| Error::unauthorized("not signed in"))?;
    let id = Uuid::from_token(&token).map_err(|_| Error::unauthorized("invalid session token"))?;
    let session = Session::find(id)
        .await?
        .ok_or_else(|| Error::unauthorized("session not found"))?;

    let ttl = SignedDuration::from_hours(CONFIG.session_ttl_hours.into());
    if session.is_expired(ttl)? {
        session.delete().await?;
        return Err(Error::unauthorized("session expired"));
    }

    session.identity().resolve(&Database::shared()).await
}

/// Resolve the viewer and run the gate. A denial is a 403.
pub async fn require(requirement: &AccessRequirement) -> Result<Viewer> {
    let viewer = current_viewer().await?;

    if !requirement.evaluate(&viewer) {
        tracing::warn!(viewer = %viewer.id, ?requirement, "access denied");
        return Err(Error::forbidden(format!(
            "access denied: '{}' lacks the required role or permission",
            viewer.name
        )));
    }

    Ok(viewer)
}

fn assembler() -> ViewAssembler<Database> {
    ViewAssembler::new(
        Database::shared(),
        CONFIG.report_row_limit,
        CONFIG.activity_months,
    )
}

/// Dashboard data. Any signed-in viewer may see it.
pub async fn summary() -> Result<SummaryView> {
    require(&AccessRequirement::open()).await?;
    assembler().summary(views::today()).await
}

pub async fn report(filter: ReportFilter) -> Result<Report> {
    require(&gates::view_reports()).await?;
    assembler().report(&filter).await
}

pub async fn export_report(filter: ReportFilter) -> Result<String> {
    let viewer = require(&gates::view_reports()).await?;
    if !gates::export_reports().evaluate(&viewer) {
        return Err(Error::forbidden("exporting reports is not permitted"));
    }
    assembler().export(&filter).await
}

pub async fn insights() -> Result<Vec<String>> {
    require(&gates::view_insights()).await?;
    let source = ConfiguredInsights::from_url(CONFIG.insights_url.as_ref())?;
    assembler()
        .insights(&source, views::today())
        .await
        .inspect_err(|error| tracing::warn!(?error, "insight source failed"))
}

pub async fn list_users() -> Result<Vec<UserRecord>> {
    require(&gates::view_users()).await?;
    Database::shared().list_users().await
}

/// Granting Super Admin, or touching someone who holds it, takes a Super
/// Admin.
fn check_super_admin_guard(
    viewer: &Viewer,
    target: Option<&UserRecord>,
    role: Option<Role>,
) -> Result<()> {
    let involves_super_admin = role == Some(Role::SuperAdmin)
        || target.is_some_and(|user| user.has_role(Role::SuperAdmin));

    if involves_super_admin && !gates::manage_super_admins().evaluate(viewer) {
        return Err(Error::forbidden("only a Super Admin can manage Super Admins"));
    }

    Ok(())
}

pub async fn create_user(form: UserForm) -> Result<UserRecord> {
    let viewer = require(&gates::create_users()).await?;
    let form = form.validated()?;
    check_super_admin_guard(&viewer, None, Some(form.role))?;

    let user = Database::shared().create_user(&form, Timestamp::now()).await?;
    tracing::info!(by = %viewer.id, user_id = user.id, role = %form.role, "created user");
    Ok(user)
}

pub async fn update_user(user_id: i64, form: UserForm) -> Result<()> {
    let viewer = require(&gates::edit_users()).await?;
    let form = form.validated()?;

    let db = Database::shared();
    let target = db
        .find_user(user_id)
        .await?
        .ok_or_else(|| types::err!("user {} not found", user_id))?;
    check_super_admin_guard(&viewer, Some(&target), Some(form.role))?;

    db.update_user(user_id, &form).await?;
    tracing::info!(by = %viewer.id, user_id, role = %form.role, "updated user");
    Ok(())
}

pub async fn delete_user(user_id: i64) -> Result<()> {
    let viewer = require(&gates::delete_users()).await?;

    if viewer.id == user_id.to_string() {
        return Err(Error::forbidden("you cannot delete your own account"));
    }

    let db = Database::shared();
    let target = db
        .find_user(user_id)
        .await?
        .ok_or_else(|| types::err!("user {} not found", user_id))?;
    check_super_admin_guard(&viewer, Some(&target), None)?;

    db.delete_user(user_id).await?;
    tracing::info!(by = %viewer.id, user_id, "deleted user");
    Ok(())
}
