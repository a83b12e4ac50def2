//! Command lines for the Windows task scheduler and `shutdown.exe`.

use crate::command::Invocation;
use crate::timing::TriggerPlan;

const SCHTASKS: &str = "schtasks";
const SHUTDOWN: &str = "shutdown";
const WMIC: &str = "wmic";

/// Every task in the scheduler as headerless CSV.
pub fn list_tasks() -> Invocation {
    Invocation::new(SCHTASKS, ["/query", "/fo", "csv", "/nh"])
}

/// Verbose `Label: Value` listing for one task.
pub fn task_detail(task_name: &str) -> Invocation {
    Invocation::new(SCHTASKS, ["/query", "/tn", task_name, "/v", "/fo", "list"])
}

/// Exits zero only when the task exists.
pub fn verify_task(task_name: &str) -> Invocation {
    Invocation::new(SCHTASKS, ["/query", "/tn", task_name])
}

pub fn create_weekly_task(task_name: &str, run_command: &str, plan: &TriggerPlan) -> Invocation {
    let days = plan.weekdays.day_tokens();
    let start = plan.time.to_string();
    Invocation::new(
        SCHTASKS,
        [
            "/create",
            "/tn",
            task_name,
            "/tr",
            run_command,
            "/sc",
            "WEEKLY",
            "/d",
            days.as_str(),
            "/st",
            start.as_str(),
            "/ru",
            "SYSTEM",
            "/f",
            "/rl",
            "HIGHEST",
        ],
    )
}

pub fn delete_task(task_name: &str) -> Invocation {
    Invocation::new(SCHTASKS, ["/delete", "/tn", task_name, "/f"])
}

/// Cancels a shutdown countdown that is already running.
pub fn abort_shutdown() -> Invocation {
    Invocation::new(SHUTDOWN, ["/a"])
}

pub fn shutdown_after(seconds: u64, message: &str) -> Invocation {
    let seconds = seconds.to_string();
    Invocation::new(SHUTDOWN, ["/s", "/t", seconds.as_str(), "/c", message])
}

/// Command line the scheduled task runs, quoted for `/tr`.
pub fn shutdown_command_line(seconds: u64, message: &str) -> String {
    format!("shutdown /s /t {} /c \"{}\"", seconds, message.replace('"', "'"))
}

/// Legacy job inventory, only good for a substring existence check.
pub fn job_inventory() -> Invocation {
    Invocation::new(WMIC, ["job", "list", "full"])
}
