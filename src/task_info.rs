use std::collections::BTreeMap;

pub const UNKNOWN_VALUE: &str = "unknown";

// Label spellings schtasks uses, English first, then the Traditional Chinese
// variants seen on localized Windows installs.
const NAME_LABELS: &[&str] = &["TaskName", "工作名稱", "名稱"];
const NEXT_RUN_LABELS: &[&str] = &["Next Run Time", "下次執行時間", "下次運行時間"];
const SCHEDULE_TYPE_LABELS: &[&str] = &["Schedule Type", "排程類型", "類型"];
const LAST_RUN_LABELS: &[&str] = &["Last Run Time", "上次執行時間", "上次運行時間"];
const LAST_RESULT_LABELS: &[&str] = &["Last Result", "上次執行的結果", "最後結果"];
const RUN_AS_LABELS: &[&str] = &["Run As User", "執行身分", "運行身分"];

/// Field label to value, as printed by `schtasks /query /v /fo list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInfoRecord {
    fields: BTreeMap<String, String>,
}

impl TaskInfoRecord {
    pub fn parse(detail: &str) -> Self {
        let fields = detail
            .lines()
            .filter_map(|line| line.split_once(": "))
            .map(|(label, value)| (label.trim().to_string(), value.trim().to_string()))
            .collect();
        TaskInfoRecord { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields.get(label).map(String::as_str)
    }

    /// Value of the first label present, in the order given.
    pub fn first_of(&self, labels: &[&str]) -> Option<&str> {
        labels.iter().find_map(|label| self.get(label))
    }

    /// Six fixed lines under a header; missing fields read `unknown`.
    pub fn render(&self) -> String {
        let rows: [(&str, &[&str]); 6] = [
            ("Task name", NAME_LABELS),
            ("Next run time", NEXT_RUN_LABELS),
            ("Schedule type", SCHEDULE_TYPE_LABELS),
            ("Last run time", LAST_RUN_LABELS),
            ("Last result", LAST_RESULT_LABELS),
            ("Run as user", RUN_AS_LABELS),
        ];

        let mut out = String::from("Schedule status:\n");
        for (title, labels) in rows {
            let value = self.first_of(labels).unwrap_or(UNKNOWN_VALUE);
            out.push_str(&format!("{title}: {value}\n"));
        }
        out
    }
}

/// Task names from `schtasks /query /fo csv /nh` output, in listing order.
///
/// Only the first CSV field is read and only its surrounding quotes are
/// removed, so names keep any whitespace the scheduler reports.
pub fn listed_task_names(csv: &str) -> Vec<&str> {
    csv.lines()
        .filter(|line| line.contains(','))
        .filter_map(|line| line.split(',').next())
        .map(|field| field.trim_matches('"'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGLISH_DETAIL: &str = "\
Folder: \\
HostName:                             DESKTOP-01
TaskName:                             \\AutomaticShutdownScheduler
Next Run Time:                        2026-01-13 09:00:00
Status:                               Ready
Last Run Time:                        2026-01-06 09:00:00
Last Result:                          0
Run As User:                          SYSTEM
Schedule Type:                        Weekly
";

    #[test]
    fn parse_splits_on_first_separator_and_trims() {
        let record = TaskInfoRecord::parse(ENGLISH_DETAIL);
        assert_eq!(record.get("TaskName"), Some("\\AutomaticShutdownScheduler"));
        assert_eq!(record.get("Next Run Time"), Some("2026-01-13 09:00:00"));
        assert_eq!(record.get("Folder"), Some("\\"));
        assert_eq!(record.get("HostName"), Some("DESKTOP-01"));
    }

    #[test]
    fn lines_without_separator_are_ignored() {
        let record = TaskInfoRecord::parse("\nINFO no separator here\nStatus:Ready\n");
        assert!(record.is_empty());
    }

    #[test]
    fn render_emits_six_lines_in_fixed_order() {
        let rendered = TaskInfoRecord::parse(ENGLISH_DETAIL).render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Schedule status:",
                "Task name: \\AutomaticShutdownScheduler",
                "Next run time: 2026-01-13 09:00:00",
                "Schedule type: Weekly",
                "Last run time: 2026-01-06 09:00:00",
                "Last result: 0",
                "Run as user: SYSTEM",
            ]
        );
    }

    #[test]
    fn render_uses_localized_labels_and_unknown_placeholder() {
        let detail = "工作名稱: AutomaticShutdownScheduler\n\
                      下次運行時間: 2026-01-13 09:00:00\n";
        let rendered = TaskInfoRecord::parse(detail).render();
        assert!(rendered.contains("Task name: AutomaticShutdownScheduler"));
        assert!(rendered.contains("Next run time: 2026-01-13 09:00:00"));
        assert!(rendered.contains("Schedule type: unknown"));
        assert!(rendered.contains("Run as user: unknown"));
    }

    #[test]
    fn first_label_in_priority_order_wins() {
        let record = TaskInfoRecord::parse("名稱: short\nTaskName: full\n");
        assert_eq!(record.first_of(NAME_LABELS), Some("full"));
    }

    #[test]
    fn listed_names_strip_quotes_only() {
        let csv = "\"TaskName\",\"Next Run Time\",\"Status\"\n\
                   \"\\TaskFolder\\AutomaticShutdownScheduler\",\"N/A\",\"Ready\"\n\
                   \" Spaced \",\"N/A\",\"Ready\"\n\
                   INFO: There are no more tasks\n";
        assert_eq!(
            listed_task_names(csv),
            vec!["TaskName", "\\TaskFolder\\AutomaticShutdownScheduler", " Spaced "]
        );
    }
}
