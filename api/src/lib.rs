use dioxus::prelude::*;
use types::{Report, ReportFilter, SummaryView, UserForm, UserRecord, Viewer};

/// The signed-in viewer, or `None` when there is no usable session.
#[post("/api/current-user")]
pub async fn get_current_user() -> ServerFnResult<Option<Viewer>> {
    match server::current_viewer().await {
        Ok(viewer) => Ok(Some(viewer)),
        Err(_) => Ok(None),
    }
}

#[post("/api/dashboard")]
pub async fn dashboard_summary() -> ServerFnResult<SummaryView> {
    Ok(server::summary().await?)
}

#[post("/api/reports")]
pub async fn generate_report(filter: ReportFilter) -> ServerFnResult<Report> {
    Ok(server::report(filter).await?)
}

#[post("/api/reports/export")]
pub async fn export_report(filter: ReportFilter) -> ServerFnResult<String> {
    Ok(server::export_report(filter).await?)
}

#[post("/api/insights")]
pub async fn generate_insights() -> ServerFnResult<Vec<String>> {
    Ok(server::insights().await?)
}

#[post("/api/users")]
pub async fn list_users() -> ServerFnResult<Vec<UserRecord>> {
    Ok(server::list_users().await?)
}

#[post("/api/users/create")]
pub async fn create_user(form: UserForm) -> ServerFnResult<UserRecord> {
    Ok(server::create_user(form).await?)
}

#[post("/api/users/update")]
pub async fn update_user(user_id: i64, form: UserForm) -> ServerFnResult<()> {
    server::update_user(user_id, form).await?;
    Ok(())
}

#[post("/api/users/delete")]
pub async fn delete_user(user_id: i64) -> ServerFnResult<()> {
    server::delete_user(user_id).await?;
    Ok(())
}
