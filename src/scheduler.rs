use chrono::{Local, NaiveDateTime};

use crate::command::CommandRunner;
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{ScheduleConfig, ShutdownTime, Weekdays};
use crate::schtasks;
use crate::settings::Settings;
use crate::store::ConfigStore;
use crate::task_info::{listed_task_names, TaskInfoRecord};
use crate::timing::{immediate_countdown, plan_trigger, TriggerPlan};

pub const NO_TASK_MESSAGE: &str = "No scheduled shutdown task found";
pub const CHECK_FAILED_MESSAGE: &str =
    "Error while checking scheduled tasks; try running as administrator";
pub const NO_DETAILS_MESSAGE: &str = "Found the scheduled shutdown task, but its details are \
     unavailable; try running as administrator";

/// What a scheduler query found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleLookup {
    Found {
        task_name: String,
        record: TaskInfoRecord,
    },
    /// Only the job inventory mentioned the task.
    FoundWithoutDetails,
    NotFound,
    /// The task list could not be read; the task may still exist.
    CheckFailed { reason: String },
}

impl ScheduleLookup {
    pub fn render(&self) -> String {
        match self {
            ScheduleLookup::Found { record, .. } => record.render(),
            ScheduleLookup::FoundWithoutDetails => NO_DETAILS_MESSAGE.to_string(),
            ScheduleLookup::NotFound => NO_TASK_MESSAGE.to_string(),
            ScheduleLookup::CheckFailed { .. } => CHECK_FAILED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub trigger: TriggerPlan,
    /// Countdown handed to `shutdown /s` when the requested time was already
    /// inside the warning window.
    pub immediate_shutdown_secs: Option<u64>,
    pub task_installed: bool,
}

/// Installs, inspects and removes the shutdown task and keeps the local
/// config file in step with it.
///
/// The OS task list is the authority on whether a schedule is active; the
/// config file only remembers what the user last asked for.
pub struct ScheduleManager<R: CommandRunner> {
    runner: R,
    settings: Settings,
    store: ConfigStore,
}

impl<R: CommandRunner> ScheduleManager<R> {
    pub fn new(runner: R, settings: Settings) -> Self {
        let store = ConfigStore::new(settings.config_path.clone());
        ScheduleManager {
            runner,
            settings,
            store,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn create_schedule<I>(
        &self,
        weekdays: I,
        time: &str,
        is_repeat: bool,
    ) -> ScheduleResult<CreateOutcome>
    where
        I: IntoIterator,
        I::Item: Into<i64>,
    {
        self.create_schedule_at(Local::now().naive_local(), weekdays, time, is_repeat)
    }

    /// `create_schedule` against an explicit local clock reading.
    pub fn create_schedule_at<I>(
        &self,
        now: NaiveDateTime,
        weekdays: I,
        time: &str,
        is_repeat: bool,
    ) -> ScheduleResult<CreateOutcome>
    where
        I: IntoIterator,
        I::Item: Into<i64>,
    {
        let weekdays = Weekdays::new(weekdays)?;
        let time: ShutdownTime = time.parse()?;
        let lead = chrono::Duration::from_std(self.settings.warning_lead).map_err(|e| {
            ScheduleError::Validation(format!("warning lead out of range: {e}"))
        })?;

        let trigger = plan_trigger(&weekdays, time, lead);
        let immediate_shutdown_secs = immediate_countdown(now, &weekdays, time, lead);

        // A one-off request inside the warning window is fully served by the
        // countdown below.
        let task_installed = is_repeat || immediate_shutdown_secs.is_none();
        if task_installed {
            self.install_task(&trigger)?;
        }

        // Only once the task is in place, so a failed install never leaves a
        // countdown running.
        if let Some(secs) = immediate_shutdown_secs {
            log::info!("{time} is {secs}s away, starting shutdown countdown now");
            self.shutdown_now(secs)?;
        }

        self.store.save(&ScheduleConfig {
            weekdays: weekdays.clone(),
            time,
            is_repeat,
            created_at: now,
        })?;

        log::info!(
            "created schedule for {} on {} (task fires {} on {})",
            time,
            weekdays.day_tokens(),
            trigger.time,
            trigger.weekdays.day_tokens()
        );

        Ok(CreateOutcome {
            trigger,
            immediate_shutdown_secs,
            task_installed,
        })
    }

    pub fn remove_schedule(&self) -> ScheduleResult<()> {
        match self.runner.run(&schtasks::abort_shutdown()) {
            Ok(out) if out.success() => log::info!("aborted pending shutdown"),
            Ok(out) => log::info!("no pending shutdown to abort: {}", out.stderr.trim()),
            Err(err) => log::warn!("could not run shutdown abort: {err}"),
        }

        let task_name = self.settings.task.canonical();
        let deleted = self.runner.run(&schtasks::delete_task(task_name))?;
        if !deleted.success() {
            // schtasks also fails when there was nothing to delete
            match self.find_listed_task() {
                Ok(None) => log::info!("no task named {task_name} was registered"),
                Ok(Some(_)) | Err(_) => {
                    return Err(ScheduleError::Removal {
                        task_name: task_name.to_string(),
                        stderr: deleted.stderr.trim().to_string(),
                    });
                }
            }
        }

        if let Err(err) = self.store.remove() {
            log::warn!(
                "schedule removed but config {} could not be deleted: {err}",
                self.store.path().display()
            );
        }

        log::info!("removed shutdown schedule");
        Ok(())
    }

    /// Display text for the current task, or one of the status sentinels.
    pub fn get_schedule_info(&self) -> String {
        self.lookup_schedule().render()
    }

    pub fn lookup_schedule(&self) -> ScheduleLookup {
        let mut failure = None;

        match self.find_task_details() {
            Ok(Some((task_name, record))) => {
                log::info!("found task info for {task_name}");
                return ScheduleLookup::Found { task_name, record };
            }
            Ok(None) => {}
            Err(err) => {
                log::error!("error while checking tasks: {err}");
                failure = Some(err.to_string());
            }
        }

        if self.inventory_mentions_task() {
            return ScheduleLookup::FoundWithoutDetails;
        }

        match failure {
            Some(reason) => ScheduleLookup::CheckFailed { reason },
            None => {
                log::warn!("no shutdown task found");
                ScheduleLookup::NotFound
            }
        }
    }

    /// Whether the OS lists a matching task. Any failure reads as `false`.
    pub fn has_active_schedule(&self) -> bool {
        match self.find_listed_task() {
            Ok(found) => found.is_some(),
            Err(err) => {
                log::warn!("could not check for an active schedule: {err}");
                false
            }
        }
    }

    pub fn load_config(&self) -> Option<ScheduleConfig> {
        self.store.load()
    }

    fn shutdown_now(&self, secs: u64) -> ScheduleResult<()> {
        let message = self.settings.shutdown_message(secs);
        let out = self.runner.run(&schtasks::shutdown_after(secs, &message))?;
        if out.success() {
            Ok(())
        } else {
            Err(ScheduleError::Shutdown {
                stderr: out.stderr.trim().to_string(),
            })
        }
    }

    fn install_task(&self, trigger: &TriggerPlan) -> ScheduleResult<()> {
        let task_name = self.settings.task.canonical();

        match self.runner.run(&schtasks::delete_task(task_name)) {
            Ok(out) if out.success() => log::debug!("deleted previous task {task_name}"),
            Ok(out) => log::debug!("no previous task deleted: {}", out.stderr.trim()),
            Err(err) => log::warn!("could not delete previous task: {err}"),
        }

        let lead_secs = self.settings.warning_lead.as_secs();
        let run_command =
            schtasks::shutdown_command_line(lead_secs, &self.settings.shutdown_message(lead_secs));
        let created = self
            .runner
            .run(&schtasks::create_weekly_task(task_name, &run_command, trigger))?;
        if !created.success() {
            return Err(ScheduleError::Creation {
                stderr: created.stderr,
            });
        }
        log::info!("task {task_name} created");

        match self.runner.run(&schtasks::verify_task(task_name)) {
            Ok(out) if out.success() => {
                log::info!("task {task_name} verified");
                Ok(())
            }
            Ok(out) => {
                log::error!("task {task_name} missing after creation: {}", out.stderr.trim());
                Err(ScheduleError::Verification {
                    task_name: task_name.to_string(),
                })
            }
            Err(err) => {
                log::error!("could not verify task {task_name}: {err}");
                Err(ScheduleError::Verification {
                    task_name: task_name.to_string(),
                })
            }
        }
    }

    fn list_tasks(&self) -> ScheduleResult<String> {
        let out = self.runner.run(&schtasks::list_tasks())?;
        if out.success() {
            Ok(out.stdout)
        } else {
            Err(ScheduleError::Query(format!(
                "task listing exited with {:?}: {}",
                out.code,
                out.stderr.trim()
            )))
        }
    }

    fn find_listed_task(&self) -> ScheduleResult<Option<String>> {
        let listing = self.list_tasks()?;
        Ok(listed_task_names(&listing)
            .into_iter()
            .find(|name| self.settings.task.matches(name))
            .map(str::to_string))
    }

    fn find_task_details(&self) -> ScheduleResult<Option<(String, TaskInfoRecord)>> {
        let listing = self.list_tasks()?;

        for name in listed_task_names(&listing) {
            if !self.settings.task.matches(name) {
                continue;
            }
            log::info!("found task: {name}");

            let detail = self.runner.run(&schtasks::task_detail(name))?;
            if !detail.success() {
                log::warn!("detail query for {name} failed: {}", detail.stderr.trim());
                continue;
            }

            let record = TaskInfoRecord::parse(&detail.stdout);
            if !record.is_empty() {
                return Ok(Some((name.to_string(), record)));
            }
        }

        Ok(None)
    }

    fn inventory_mentions_task(&self) -> bool {
        match self.runner.run(&schtasks::job_inventory()) {
            Ok(out) => out.success() && out.stdout.contains(self.settings.task.canonical()),
            Err(err) => {
                log::debug!("job inventory unavailable: {err}");
                false
            }
        }
    }
}
