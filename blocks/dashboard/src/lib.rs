//! Features that join several atoms: populated task views, role-scoped
//! listing, dashboards, user management and spreadsheet exports.

pub mod cascade;
pub mod dashboard;
pub mod join;
pub mod listing;
pub mod overview;
pub mod reports;
pub mod tasks;
pub mod types;
pub mod users;
