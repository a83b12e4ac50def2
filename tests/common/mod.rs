#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::time::Duration;

use auto_shutdown::{
    CommandError, CommandOutput, CommandRunner, Invocation, ScheduleManager, Settings,
};
use chrono::NaiveDateTime;

/// Replays canned replies in order and records every call.
///
/// Once the script runs out every call fails to spawn, which is how the
/// optional job-inventory fallback behaves on machines without `wmic`.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: RefCell<VecDeque<Result<CommandOutput, CommandError>>>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, output: CommandOutput) -> Self {
        self.replies.borrow_mut().push_back(Ok(output));
        self
    }

    pub fn reply_ok(self, stdout: &str) -> Self {
        self.reply(CommandOutput::ok(stdout))
    }

    pub fn reply_failed(self, code: i32, stderr: &str) -> Self {
        self.reply(CommandOutput::failed(code, stderr))
    }

    pub fn reply_spawn_error(self, program: &str) -> Self {
        self.replies.borrow_mut().push_back(Err(CommandError::Spawn {
            program: program.to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        }));
        self
    }

    pub fn reply_timeout(self, program: &str) -> Self {
        self.replies.borrow_mut().push_back(Err(CommandError::Timeout {
            program: program.to_string(),
            timeout_secs: 30,
        }));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// First recorded call whose arguments include `flag`.
    pub fn call_with(&self, program: &str, flag: &str) -> Option<Invocation> {
        self.calls
            .borrow()
            .iter()
            .find(|call| call.program == program && call.has_arg(flag))
            .cloned()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        self.calls.borrow_mut().push(invocation.clone());
        self.replies.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(CommandError::Spawn {
                program: invocation.program.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no scripted reply"),
            })
        })
    }
}

pub fn settings_in(dir: &Path) -> Settings {
    Settings {
        config_path: dir.join(".auto_shutdown_config.json"),
        warning_lead: Duration::from_secs(900),
        ..Settings::default()
    }
}

pub fn manager(dir: &Path, runner: ScriptedRunner) -> ScheduleManager<ScriptedRunner> {
    ScheduleManager::new(runner, settings_in(dir))
}

/// Monday 2026-01-12 at the given `HH:MM`.
pub fn monday_at(hhmm: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&format!("2026-01-12 {hhmm}:00"), "%Y-%m-%d %H:%M:%S").unwrap()
}

pub const LISTING_WITH_TASK: &str =
    "\"\\Microsoft\\Windows\\Defrag\\ScheduledDefrag\",\"N/A\",\"Ready\"\n\"TaskFolder\\AutomaticShutdownScheduler\",\"Running\"\n";

pub const LISTING_WITHOUT_TASK: &str = "\"Task Name\",\"Status\"\n\"OtherTask\",\"Running\"\n";

pub const DETAIL_BLOCK: &str = "\
HostName:      DESKTOP-01
TaskName:      \\TaskFolder\\AutomaticShutdownScheduler
Next Run Time: 2026-01-13 09:00:00
Status:        Running
Last Run Time: N/A
Last Result:   267011
Run As User:   SYSTEM
Schedule Type: Weekly
";
