//! Dashboard aggregation. Pure over `(tasks, now)`.

use chrono::{DateTime, Utc};
use taskboard_atoms::tasks::{Priority, Task, TaskStatus};

use crate::types::{Charts, DashboardData, PriorityDistribution, RecentTask, Statistics, StatusDistribution};

const RECENT_TASKS: usize = 10;

pub fn build_dashboard(tasks: &[Task], now: DateTime<Utc>) -> DashboardData {
    let mut distribution = StatusDistribution {
        all: tasks.len(),
        ..Default::default()
    };
    let mut priorities = PriorityDistribution::default();
    let mut overdue = 0;
    let mut in_progress_on_time = 0;

    for task in tasks {
        match task.status {
            TaskStatus::Pending => distribution.pending += 1,
            TaskStatus::InProgress => distribution.in_progress += 1,
            TaskStatus::Completed => distribution.completed += 1,
        }
        match task.priority {
            Priority::Low => priorities.low += 1,
            Priority::Medium => priorities.medium += 1,
            Priority::High => priorities.high += 1,
            Priority::Critical => priorities.critical += 1,
        }
        if task.is_overdue(now) {
            overdue += 1;
        }
        if task.status == TaskStatus::InProgress && task.due_date > now {
            in_progress_on_time += 1;
        }
    }

    let mut recent: Vec<&Task> = tasks.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    DashboardData {
        statistics: Statistics {
            total_tasks: tasks.len(),
            pending_tasks: distribution.pending,
            completed_tasks: distribution.completed,
            overdue_tasks: overdue,
            in_progress_tasks: in_progress_on_time,
        },
        charts: Charts {
            task_distribution: distribution,
            task_priority_levels: priorities,
        },
        recent_tasks: recent.into_iter().take(RECENT_TASKS).map(RecentTask::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::fixtures::task;
    use chrono::Duration;

    #[test]
    fn distribution_matches_status_counts() {
        let now = Utc::now();
        let mut tasks = Vec::new();
        for i in 0..3 {
            tasks.push(task(&format!("p{}", i), TaskStatus::Pending, &[], now));
        }
        for i in 0..2 {
            tasks.push(task(&format!("i{}", i), TaskStatus::InProgress, &[], now));
        }
        for i in 0..5 {
            tasks.push(task(&format!("c{}", i), TaskStatus::Completed, &[], now));
        }

        let data = build_dashboard(&tasks, now);
        assert_eq!(
            data.charts.task_distribution,
            StatusDistribution { pending: 3, in_progress: 2, completed: 5, all: 10 }
        );
        let json = serde_json::to_value(&data.charts).unwrap();
        assert_eq!(json["taskDistribution"]["InProgress"], 2);
        assert_eq!(json["taskDistribution"]["All"], 10);
        assert_eq!(json["taskPriorityLevels"]["Medium"], 10);
        assert_eq!(json["taskPriorityLevels"]["Critical"], 0);
    }

    #[test]
    fn empty_buckets_are_zero_not_missing() {
        let data = build_dashboard(&[], Utc::now());
        let json = serde_json::to_value(&data).unwrap();
        for key in ["Pending", "InProgress", "Completed", "All"] {
            assert_eq!(json["charts"]["taskDistribution"][key], 0);
        }
        for key in ["Low", "Medium", "High", "Critical"] {
            assert_eq!(json["charts"]["taskPriorityLevels"][key], 0);
        }
        assert_eq!(json["recentTasks"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn overdue_and_on_time_counts() {
        let now = Utc::now();
        let mut late = task("late", TaskStatus::InProgress, &[], now);
        late.due_date = now - Duration::days(1);
        let mut on_time = task("on-time", TaskStatus::InProgress, &[], now);
        on_time.due_date = now + Duration::days(1);
        let mut done_late = task("done", TaskStatus::Completed, &[], now);
        done_late.due_date = now - Duration::days(3);
        let mut pending_late = task("pending", TaskStatus::Pending, &[], now);
        pending_late.due_date = now - Duration::hours(1);

        let stats = build_dashboard(&[late, on_time, done_late, pending_late], now).statistics;
        assert_eq!(stats.overdue_tasks, 2);
        assert_eq!(stats.in_progress_tasks, 1);
        assert_eq!(stats.total_tasks, 4);
    }

    #[test]
    fn recent_tasks_are_newest_ten() {
        let now = Utc::now();
        let tasks: Vec<Task> = (0..12)
            .map(|i| task(&format!("t{}", i), TaskStatus::Pending, &[], now - Duration::minutes(i)))
            .collect();
        let recent = build_dashboard(&tasks, now).recent_tasks;
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].task_id, "t0");
        assert_eq!(recent[9].task_id, "t9");
    }
}
