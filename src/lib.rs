//! Weekly system shutdown scheduling on top of the Windows task scheduler.

pub mod command;
pub mod error;
pub mod matching;
pub mod models;
pub mod scheduler;
pub mod schtasks;
pub mod settings;
pub mod store;
pub mod task_info;
pub mod timing;

pub use command::{CommandOutput, CommandRunner, DryRunRunner, Invocation, SystemCommandRunner};
pub use error::{CommandError, ScheduleError, ScheduleResult};
pub use matching::{matches_task_name, TaskIdentity};
pub use models::{ScheduleConfig, ShutdownTime, Weekdays};
pub use scheduler::{CreateOutcome, ScheduleLookup, ScheduleManager};
pub use settings::Settings;
