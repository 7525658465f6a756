//! Output formatting utilities

use crate::application::ExportReport;
use crate::domain::text::strip_html;
use crate::domain::{Draft, Entry, RetentionWindow};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::BTreeMap;

const PREVIEW_CHARS: usize = 40;

/// Format a list of entries for display
pub fn format_entry_list(entries: &[Entry]) -> String {
    if entries.is_empty() {
        return "No entries found".to_string();
    }

    let mut output = String::new();
    for entry in entries {
        output.push_str(&format!(
            "{}  {:<20} {:<5}{}\n",
            entry.id,
            entry.display_title(),
            entry.rating.stars(),
            attachment_suffix(entry.files.len())
        ));
    }
    output
}

/// Format active drafts with the time left before they expire
pub fn format_draft_list(drafts: &[Draft], retention: RetentionWindow, now: DateTime<Utc>) -> String {
    if drafts.is_empty() {
        return "No drafts found".to_string();
    }

    let mut output = String::new();
    for draft in drafts {
        let left = retention
            .remaining(draft.created_at, now)
            .map(|d| format!("{}h{:02}m left", d.num_hours(), d.num_minutes() % 60))
            .unwrap_or_else(|| "expired".to_string());
        output.push_str(&format!(
            "{}  {}  {}  {}\n",
            draft.id,
            draft
                .created_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M"),
            left,
            preview(&draft.content)
        ));
    }
    output
}

/// One line per day of `month` that has a rating
pub fn format_calendar(month: NaiveDate, totals: &BTreeMap<NaiveDate, u32>) -> String {
    let mut output = format!("{}\n", month.format("%B %Y"));
    let days: Vec<_> = totals
        .iter()
        .filter(|(day, _)| day.year() == month.year() && day.month() == month.month())
        .collect();

    if days.is_empty() {
        output.push_str("No ratings this month\n");
        return output;
    }

    for (day, total) in days {
        output.push_str(&format!(
            "{}  {:>2}  {}\n",
            day.format("%a %d"),
            total,
            "*".repeat(*total as usize)
        ));
    }
    output
}

pub fn format_export_report(report: &ExportReport) -> String {
    let mut output = format!("Exported {}\n", report.text_file.display());
    for path in &report.attachments {
        output.push_str(&format!("Exported {}\n", path.display()));
    }
    output
}

fn attachment_suffix(count: usize) -> String {
    match count {
        0 => String::new(),
        1 => "  (1 file)".to_string(),
        n => format!("  ({} files)", n),
    }
}

fn preview(content: &str) -> String {
    let text = strip_html(content).replace('\n', " ");
    if text.chars().count() <= PREVIEW_CHARS {
        return text;
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DocumentId, Rating};
    use chrono::{Duration, TimeZone};

    fn entry(id: &str, rating: u8, files: usize) -> Entry {
        Entry {
            id: DocumentId::new(id),
            user_id: "u".to_string(),
            content: "<p>Hello</p>".to_string(),
            rating: Rating::new(rating).unwrap(),
            files: (0..files).map(|i| format!("memory://attachments/{}", i)).collect(),
            is_draft: false,
            created_at: Utc.with_ymd_and_hms(2026, 10, 12, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_format_empty_list() {
        assert_eq!(format_entry_list(&[]), "No entries found");
    }

    #[test]
    fn test_format_entry_list() {
        let output = format_entry_list(&[entry("e1", 3, 0), entry("e2", 5, 2)]);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("e1  October 12, 2026"));
        assert!(lines[0].contains("⭐⭐⭐"));
        assert!(!lines[0].contains("file"));
        assert!(lines[1].ends_with("(2 files)"));
    }

    #[test]
    fn test_format_draft_list() {
        let mut draft = entry("d1", 0, 0);
        draft.is_draft = true;
        let now = draft.created_at + Duration::minutes(90);

        let output = format_draft_list(&[draft], RetentionWindow::default(), now);
        assert!(output.starts_with("d1  "));
        assert!(output.contains("22h30m left"));
        assert!(output.trim_end().ends_with("Hello"));
    }

    #[test]
    fn test_preview_truncates() {
        let long = format!("<p>{}</p>", "word ".repeat(20));
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert!(shown.chars().count() <= PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_format_calendar() {
        let month = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let mut totals = BTreeMap::new();
        totals.insert(NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(), 4);
        totals.insert(NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(), 2);

        let output = format_calendar(month, &totals);
        assert!(output.starts_with("October 2026\n"));
        assert!(output.contains("Mon 12   4  ****"));
        assert!(!output.contains("30"));
    }

    #[test]
    fn test_format_calendar_empty_month() {
        let month = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let output = format_calendar(month, &BTreeMap::new());
        assert!(output.contains("No ratings this month"));
    }
}
