/// Name the task is registered under today.
pub const CANONICAL_TASK_NAME: &str = "AutomaticShutdownScheduler";

/// Names earlier releases registered the task under.
pub const LEGACY_TASK_NAMES: [&str; 2] = ["AutomaticS", "AutoShutdown"];

const PATH_SEPARATOR: char = '\\';

/// The names that identify this application's scheduled task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskIdentity {
    canonical: String,
    alternates: Vec<String>,
}

impl TaskIdentity {
    pub fn new(canonical: impl Into<String>, alternates: Vec<String>) -> Self {
        TaskIdentity {
            canonical: canonical.into(),
            alternates,
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn matches(&self, raw_name: &str) -> bool {
        matches_task_name(raw_name, &self.canonical, &self.alternates)
    }
}

impl Default for TaskIdentity {
    fn default() -> Self {
        TaskIdentity::new(
            CANONICAL_TASK_NAME,
            LEGACY_TASK_NAMES.iter().map(|name| name.to_string()).collect(),
        )
    }
}

/// Text after the final `\`, or the whole name when there is none.
pub fn last_segment(raw_name: &str) -> &str {
    raw_name
        .rsplit_once(PATH_SEPARATOR)
        .map_or(raw_name, |(_, tail)| tail)
}

/// Whether a task name reported by the scheduler belongs to this application.
///
/// The scheduler prefixes names with their folder (`\Folder\Name`), so both the
/// raw name and its last path segment are compared against the known names.
/// Comparison is exact: case and surrounding whitespace both count.
pub fn matches_task_name<S: AsRef<str>>(raw_name: &str, canonical: &str, alternates: &[S]) -> bool {
    let is_known = |candidate: &str| {
        candidate == canonical || alternates.iter().any(|alt| alt.as_ref() == candidate)
    };

    is_known(last_segment(raw_name)) || is_known(raw_name)
}
