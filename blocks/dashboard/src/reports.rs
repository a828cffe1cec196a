//! Spreadsheet exports.
//!
//! Rows are assembled by pure functions; [`render_workbook`] turns them into
//! an `.xlsx` buffer. Per-user counts classify the status string as stored,
//! so a value outside the synonym table adds to the total only.

use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, Utc};
use lambda_http::{http::StatusCode, Body, Response};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use taskboard_atoms::http::HandlerResult;
use taskboard_atoms::tasks::{self, Task, TaskStatus};
use taskboard_atoms::users::{self, User};
use taskboard_atoms::{ApiError, Caller};

use crate::join::UserDirectory;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const TASK_HEADERS: [&str; 10] = [
    "Task ID",
    "Title",
    "Description",
    "Priority",
    "Project Name",
    "Status",
    "Due Date",
    "Assigned To",
    "Created At",
    "Updated At",
];

pub const USER_HEADERS: [&str; 7] = [
    "User ID",
    "User Name",
    "Email",
    "Total Assigned Tasks",
    "Pending Tasks",
    "In Progress Tasks",
    "Completed Tasks",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Number(n as f64)
    }
}

pub struct Sheet {
    pub name: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
    pub widths: &'static [f64],
}

/// `Name (email)` for each assignee, or `Unassigned`.
pub fn assignee_display(task: &Task, directory: &UserDirectory) -> String {
    let names: Vec<String> = task
        .assigned_to
        .iter()
        .filter_map(|id| directory.get(id))
        .map(|u| format!("{} ({})", u.name, u.email))
        .collect();
    if names.is_empty() {
        "Unassigned".to_string()
    } else {
        names.join(", ")
    }
}

fn timestamp(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn task_rows(tasks: &[Task], directory: &UserDirectory) -> Vec<Vec<Cell>> {
    tasks
        .iter()
        .map(|task| {
            vec![
                task.task_id.as_str().into(),
                task.title.as_str().into(),
                task.description.clone().unwrap_or_default().into(),
                task.priority.as_str().into(),
                task.project_name.as_str().into(),
                task.status.as_str().into(),
                task.due_date.format("%Y-%m-%d").to_string().into(),
                assignee_display(task, directory).into(),
                timestamp(&task.created_at).into(),
                timestamp(&task.updated_at).into(),
            ]
        })
        .collect()
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct UserTaskCounts {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl UserTaskCounts {
    pub fn record(&mut self, status: &str) {
        self.total += 1;
        match TaskStatus::from_loose(status) {
            Some(TaskStatus::Pending) => self.pending += 1,
            Some(TaskStatus::InProgress) => self.in_progress += 1,
            Some(TaskStatus::Completed) => self.completed += 1,
            None => {}
        }
    }
}

pub fn counts_for(user_id: &str, tasks: &[Task]) -> UserTaskCounts {
    let mut counts = UserTaskCounts::default();
    for task in tasks.iter().filter(|t| t.is_assigned(user_id)) {
        counts.record(task.status_label());
    }
    counts
}

pub fn user_rows(users: &[User], tasks: &[Task]) -> Vec<Vec<Cell>> {
    users
        .iter()
        .map(|user| {
            let counts = counts_for(&user.user_id, tasks);
            vec![
                user.user_id.as_str().into(),
                user.name.as_str().into(),
                user.email.as_str().into(),
                counts.total.into(),
                counts.pending.into(),
                counts.in_progress.into(),
                counts.completed.into(),
            ]
        })
        .collect()
}

pub fn render_workbook(sheet: &Sheet) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet.name)?;

    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (col, width) in sheet.widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }
    for (i, row) in sheet.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(s) => worksheet.write_string(r, col as u16, s)?,
                Cell::Number(n) => worksheet.write_number(r, col as u16, *n)?,
            };
        }
    }

    workbook.save_to_buffer()
}

fn download(sheet: &Sheet, file_name: &str) -> HandlerResult {
    let bytes = render_workbook(sheet).map_err(|e| ApiError::internal("Error exporting report", e))?;
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", XLSX_CONTENT_TYPE)
        .header("Content-Disposition", format!("attachment; filename=\"{}\"", file_name))
        .body(Body::Binary(bytes))?)
}

/// GET /api/reports/export/tasks
pub async fn export_tasks_report(client: &DynamoClient, table_name: &str, caller: &Caller) -> HandlerResult {
    caller.require_admin()?;
    let tasks = tasks::load_tasks(client, table_name).await?;
    let directory = UserDirectory::new(users::load_users(client, table_name).await?);

    tracing::info!("Exporting tasks report with {} rows", tasks.len());
    let sheet = Sheet {
        name: "Tasks Report",
        headers: &TASK_HEADERS,
        rows: task_rows(&tasks, &directory),
        widths: &[38.0, 30.0, 50.0, 12.0, 24.0, 14.0, 14.0, 40.0, 20.0, 20.0],
    };
    download(&sheet, "tasks_report.xlsx")
}

/// GET /api/reports/export/users
pub async fn export_users_report(client: &DynamoClient, table_name: &str, caller: &Caller) -> HandlerResult {
    caller.require_admin()?;
    let users = users::load_users(client, table_name).await?;
    let tasks = tasks::load_tasks(client, table_name).await?;

    tracing::info!("Exporting users report with {} rows", users.len());
    let sheet = Sheet {
        name: "User Task Report",
        headers: &USER_HEADERS,
        rows: user_rows(&users, &tasks),
        widths: &[38.0, 30.0, 40.0, 20.0, 20.0, 20.0, 20.0],
    };
    download(&sheet, "users_report.xlsx")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::fixtures::{task, user};
    use taskboard_atoms::users::Role;

    #[test]
    fn assignees_flatten_into_one_string() {
        let dir = UserDirectory::new(vec![user("u1", "Ada", Role::Member), user("u2", "Grace", Role::Member)]);
        let t = task("t", TaskStatus::Pending, &["u1", "u2"], Utc::now());
        assert_eq!(assignee_display(&t, &dir), "Ada (ada@example.com), Grace (grace@example.com)");

        let lonely = task("t", TaskStatus::Pending, &[], Utc::now());
        assert_eq!(assignee_display(&lonely, &dir), "Unassigned");
    }

    #[test]
    fn task_row_follows_header_order() {
        let dir = UserDirectory::new(vec![user("u1", "Ada", Role::Member)]);
        let mut t = task("t1", TaskStatus::InProgress, &["u1"], Utc::now());
        t.due_date = chrono::DateTime::parse_from_rfc3339("2030-05-06T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let rows = task_rows(&[t], &dir);
        assert_eq!(rows[0].len(), TASK_HEADERS.len());
        assert_eq!(rows[0][0], Cell::from("t1"));
        assert_eq!(rows[0][5], Cell::from("In Progress"));
        assert_eq!(rows[0][6], Cell::from("2030-05-06"));
        assert_eq!(rows[0][7], Cell::from("Ada (ada@example.com)"));
    }

    #[test]
    fn counts_use_status_synonyms() {
        let mut counts = UserTaskCounts::default();
        for status in ["todo", "Pending", "ongoing", "in_progress", "DONE", "finished", "archived"] {
            counts.record(status);
        }
        assert_eq!(counts, UserTaskCounts { total: 7, pending: 2, in_progress: 2, completed: 2 });
    }

    #[test]
    fn unknown_stored_status_counts_toward_total_only() {
        let mut stored = task("t1", TaskStatus::Pending, &["u1"], Utc::now());
        let mut item = tasks::task_to_item(&stored);
        item.insert(
            "status".to_string(),
            aws_sdk_dynamodb::types::AttributeValue::S("archived".into()),
        );
        stored = tasks::task_from_item(&item).unwrap();

        let counts = counts_for("u1", &[stored]);
        assert_eq!(counts, UserTaskCounts { total: 1, pending: 0, in_progress: 0, completed: 0 });
    }

    #[test]
    fn user_rows_count_assignments() {
        let now = Utc::now();
        let users = vec![user("u1", "Ada", Role::Admin), user("u2", "Grace", Role::Member)];
        let tasks = vec![
            task("a", TaskStatus::Pending, &["u1"], now),
            task("b", TaskStatus::Completed, &["u1", "u2"], now),
        ];
        let rows = user_rows(&users, &tasks);
        assert_eq!(rows[0][3], Cell::Number(2.0));
        assert_eq!(rows[0][4], Cell::Number(1.0));
        assert_eq!(rows[0][6], Cell::Number(1.0));
        assert_eq!(rows[1][3], Cell::Number(1.0));
        assert_eq!(rows[1][4], Cell::Number(0.0));
    }

    #[test]
    fn workbook_renders_to_a_zip_buffer() {
        let sheet = Sheet {
            name: "Tasks Report",
            headers: &TASK_HEADERS,
            rows: vec![vec!["x".into(), 3usize.into()]],
            widths: &[10.0],
        };
        let bytes = render_workbook(&sheet).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
