mod components;
pub use components::Gate;

mod login;
pub use login::Login;

mod dashboard;
pub use dashboard::Dashboard;

mod users;
pub use users::Users;

mod reports;
pub use reports::Reports;

mod insights;
pub use insights::Insights;
