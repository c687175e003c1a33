use crate::domain_model::TaskId;

pub const REGISTER: &str = "/api/auth/register/";
pub const LOGIN: &str = "/api/auth/login/";
pub const REFRESH: &str = "/api/auth/refresh/";
pub const FORGOT_PASSWORD: &str = "/api/auth/forgot-password/";
pub const RESET_PASSWORD: &str = "/api/auth/reset-password/";

pub const TASKS: &str = "/api/tasks/";
pub const TASKS_ALL: &str = "/api/tasks/all/";
pub const TASKS_ANALYTICS: &str = "/api/tasks/analytics/";
pub const TASKS_INSIGHTS: &str = "/api/tasks/insights/";
pub const TASKS_REMINDERS: &str = "/api/tasks/reminders/";

pub fn task(id: TaskId) -> String {
    format!("{TASKS}{id}/")
}
