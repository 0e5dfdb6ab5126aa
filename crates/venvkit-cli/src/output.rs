use atty::Stream;
use color_eyre::Result;
use serde_json::Value;
use venvkit_core::{
    format_status_message, to_json_response, CommandInfo, CommandStatus, ExecutionOutcome,
    NoticeLevel,
};

use crate::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct OutputOptions {
    pub quiet: bool,
    pub json: bool,
    pub no_color: bool,
}

impl OutputOptions {
    pub fn style(&self) -> Style {
        Style::new(self.no_color, atty::is(Stream::Stdout))
    }
}

pub fn emit_output(
    opts: &OutputOptions,
    info: CommandInfo,
    outcome: &ExecutionOutcome,
) -> Result<i32> {
    let code = outcome.exit_code();
    let style = opts.style();

    if opts.json {
        let payload = to_json_response(info, outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }

    let err_style = Style::new(opts.no_color, atty::is(Stream::Stderr));
    for line in notice_lines(&err_style, &outcome.details) {
        eprintln!("{line}");
    }
    if opts.quiet {
        return Ok(code);
    }

    if outcome.status == CommandStatus::Ok {
        if is_passthrough(&outcome.details) {
            println!("{}", outcome.message);
        } else {
            let message = format_status_message(info, &outcome.message);
            println!("{}", style.status(outcome.status, &message));
            if let Some(hint) = hint_from_details(&outcome.details) {
                println!("{}", style.info(&format!("Tip: {hint}")));
            }
        }
    } else {
        let header = format_status_message(info, &outcome.message);
        println!("{}", style.status(outcome.status, &header));
        let reasons = collect_why_bullets(&outcome.details);
        if !reasons.is_empty() {
            println!();
            println!("Why:");
            for reason in reasons {
                println!("  • {reason}");
            }
        }
        if let Some(hint) = hint_from_details(&outcome.details) {
            println!();
            println!("Fix:");
            println!("{}", style.fix_bullet(&format!("  • {hint}")));
        }
    }

    Ok(code)
}

fn notice_lines(style: &Style, details: &Value) -> Vec<String> {
    let Some(notices) = details.get("notices").and_then(Value::as_array) else {
        return Vec::new();
    };
    notices
        .iter()
        .filter_map(|notice| {
            let level = match notice.get("level").and_then(Value::as_str)? {
                "info" => NoticeLevel::Info,
                "warning" => NoticeLevel::Warning,
                _ => NoticeLevel::Error,
            };
            let title = notice.get("title").and_then(Value::as_str).unwrap_or("Notice");
            let message = notice.get("message").and_then(Value::as_str)?;
            Some(style.notice(level, title, message))
        })
        .collect()
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}

fn is_passthrough(details: &Value) -> bool {
    details
        .as_object()
        .and_then(|map| map.get("passthrough"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn collect_why_bullets(details: &Value) -> Vec<String> {
    let mut bullets = Vec::new();
    if let Some(reason) = details.get("reason").and_then(Value::as_str) {
        if let Some(text) = reason_display(reason) {
            push_unique(&mut bullets, text);
        }
    }
    if let Some(issues) = details.get("issues").and_then(Value::as_array) {
        for issue in issues.iter().filter_map(Value::as_str) {
            push_unique(&mut bullets, issue);
        }
    }
    bullets
}

fn push_unique(vec: &mut Vec<String>, text: impl Into<String>) {
    let entry = text.into();
    if entry.trim().is_empty() {
        return;
    }
    if !vec.iter().any(|existing| existing == &entry) {
        vec.push(entry);
    }
}

fn reason_display(code: &str) -> Option<&'static str> {
    match code {
        "unknown_environment" => Some("No environment with that name is in the registry."),
        "already_exists" => Some("Something already occupies the target directory."),
        "empty_name" | "invalid_name" => {
            Some("Environment names must be a single non-empty directory name.")
        }
        "build_failed" => Some("`python -m venv` did not complete."),
        "indexer_missing" => Some("System search needs the `locate` command."),
        "indexer_failed" => Some("`locate` reported an error."),
        "missing_directory" => Some("The registered path no longer exists; the entry is stale."),
        "spawn_failed" | "no_terminal" => Some("No terminal emulator could be started."),
        "not_interactive" => Some("The browser needs an interactive terminal."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn why_bullets_map_reason_and_dedupe_issues() {
        let details = json!({
            "reason": "internal_error",
            "issues": ["disk full", "disk full", "writing log"],
        });
        assert_eq!(collect_why_bullets(&details), vec!["disk full", "writing log"]);

        let details = json!({ "reason": "unknown_environment" });
        assert_eq!(
            collect_why_bullets(&details),
            vec!["No environment with that name is in the registry."]
        );
    }

    #[test]
    fn notices_render_with_titles() {
        let style = Style::new(true, false);
        let details = json!({
            "notices": [
                { "level": "warning", "title": "Warning", "message": "Error reading log file: bad" },
                { "level": "error", "title": "Error", "message": "Failed to launch terminal: x" },
            ],
        });
        assert_eq!(
            notice_lines(&style, &details),
            vec![
                "Warning: Error reading log file: bad",
                "Error: Failed to launch terminal: x",
            ]
        );
    }

    #[test]
    fn passthrough_flag_is_detected() {
        assert!(is_passthrough(&json!({ "passthrough": true })));
        assert!(!is_passthrough(&json!({})));
        assert!(!is_passthrough(&Value::Null));
    }
}
