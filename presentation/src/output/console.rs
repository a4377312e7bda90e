//! Console output formatter for deliberation results

use colored::Colorize;
use panel_application::{AbortedSession, DeliberationOutcome};
use panel_domain::{
    ConfigIssue, ContextStatus, ContextUsage, DecisionClassification, ParticipantCatalog, RiskLevel, Selection,
    Severity, TodoStatus,
};
use serde::Serialize;

/// Formats deliberation results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete outcome
    pub fn format_outcome(outcome: &DeliberationOutcome) -> String {
        let report = &outcome.report;
        let mut output = String::new();

        output.push_str(&Self::header("Panel Outcome"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Topic:".cyan().bold(),
            outcome.session.topic()
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Participants:".cyan().bold(),
            outcome
                .session
                .participants()
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        output.push_str(&format!(
            "{} {} after {} rounds ({} messages)\n",
            "Concluded:".cyan().bold(),
            report.conclusion_reason.as_str(),
            report.rounds_completed,
            outcome.session.messages().len()
        ));

        output.push_str(&Self::section_header("Summary"));
        output.push_str(&format!("{}\n", report.summary));

        if !report.conclusions.is_empty() {
            output.push_str(&Self::section_header("Conclusions"));
            for (i, conclusion) in report.conclusions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, conclusion));
            }
        }

        if !report.action_items.is_empty() {
            output.push_str(&Self::section_header("Action Items"));
            for item in &report.action_items {
                let mark = if item.done { "v".green() } else { "-".normal() };
                output.push_str(&format!(
                    "  {} {} {}\n",
                    mark,
                    item.description,
                    format!("({})", item.assignee).dimmed()
                ));
            }
        }

        if !report.open_obligations.is_empty() {
            output.push_str(&Self::section_header("Open Obligations"));
            for todo in &report.open_obligations {
                output.push_str(&format!("  {} {}\n", "!".yellow().bold(), todo.description));
            }
        }

        let dropped: Vec<_> = outcome
            .todos
            .iter()
            .filter(|t| t.status == TodoStatus::Dropped)
            .collect();
        if !dropped.is_empty() {
            output.push_str(&format!("\n{}\n", "Dropped:".dimmed()));
            for todo in dropped {
                output.push_str(&format!("  x {}\n", todo.description));
            }
        }

        output.push_str(&Self::section_header("Decision Gate"));
        output.push_str(&Self::format_classification(&outcome.classification));

        output.push_str(&Self::footer());
        output
    }

    /// Format an aborted session
    pub fn format_aborted(aborted: &AbortedSession) -> String {
        let mut output = format!(
            "{} {}\n",
            "Deliberation aborted:".red().bold(),
            aborted.failure.user_message
        );
        if let Some(category) = aborted.failure.category() {
            output.push_str(&format!("  {} {}\n", "Category:".dimmed(), category.as_str()));
        }
        if let Some(recovery) = &aborted.failure.recovery {
            output.push_str(&format!(
                "  {} {} retries ({})\n",
                "Recovery:".dimmed(),
                recovery.attempts,
                recovery.strategy.as_str()
            ));
        }
        output.push_str(&format!(
            "  {} {} messages kept, {} rounds completed\n",
            "Session:".dimmed(),
            aborted.session.messages().len(),
            aborted.session.rounds_completed()
        ));
        output
    }

    pub fn format_classification(classification: &DecisionClassification) -> String {
        let mut output = String::new();
        for factor in &classification.factors {
            let justification = if factor.justification.is_empty() {
                String::new()
            } else {
                format!(" - {}", factor.justification)
            };
            output.push_str(&format!(
                "  {:<24} {:>2}/20{}\n",
                factor.name, factor.score, justification
            ));
        }
        output.push_str(&format!(
            "  {} {}/100 -> {}\n",
            "Score:".bold(),
            classification.score,
            Self::level(classification.level)
        ));
        if classification.level.requires_approval() {
            output.push_str(&format!(
                "  {}\n",
                "Owner approval is required before acting on this decision.".yellow()
            ));
        }
        output
    }

    pub fn format_selection(selection: &Selection, catalog: &ParticipantCatalog) -> String {
        let mut output = format!("{}\n", "Selected participants:".cyan().bold());
        for id in &selection.participants {
            let role = catalog
                .get(id)
                .map(|p| p.display_role.as_str())
                .unwrap_or("?");
            output.push_str(&format!("  {:<20} {}\n", id.as_str(), role.dimmed()));
        }
        if !selection.ignored.is_empty() {
            output.push_str(&format!(
                "{} {}\n",
                "Ignored unknown ids:".yellow(),
                selection.ignored.join(", ")
            ));
        }
        output
    }

    pub fn format_usage(usage: &ContextUsage) -> String {
        let label = usage.status.as_str();
        let status = match usage.status {
            ContextStatus::Ok => label.green(),
            ContextStatus::Warn => label.yellow(),
            ContextStatus::Compact | ContextStatus::EmergencyCompact => label.red().bold(),
        };
        format!(
            "{} / {} units ({}%) {}\n{}\n",
            usage.used_units,
            usage.budget_units,
            usage.percent(),
            status,
            usage.message()
        )
    }

    pub fn format_config_issues(issues: &[ConfigIssue]) -> String {
        if issues.is_empty() {
            return format!("{}\n", "Configuration is valid.".green());
        }
        let mut output = String::new();
        for issue in issues {
            let label = match issue.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow(),
            };
            output.push_str(&format!("  {}: {}\n", label, issue.message));
        }
        output
    }

    /// Format as JSON
    pub fn format_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn level(level: RiskLevel) -> colored::ColoredString {
        match level {
            RiskLevel::Auto => level.as_str().green().bold(),
            RiskLevel::Notify => level.as_str().cyan().bold(),
            RiskLevel::Confirm => level.as_str().yellow().bold(),
            RiskLevel::Critical => level.as_str().red().bold(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_domain::{
        ContextBudget, DiscussionSession, ErrorCategory, ParticipantId, RiskFactor,
        SessionFailure, classify_risk,
    };

    #[test]
    fn test_classification_lists_factors_and_gate() {
        let classification = classify_risk(&[
            RiskFactor::new("security", 20, "touches auth"),
            RiskFactor::new("data_loss", 20, ""),
            RiskFactor::new("reversibility", 15, ""),
        ])
        .unwrap();
        let text = ConsoleFormatter::format_classification(&classification);
        assert!(text.contains("security"));
        assert!(text.contains("touches auth"));
        assert!(text.contains("55/100"));
        assert!(text.contains("confirm"));
        assert!(text.contains("approval is required"));
    }

    #[test]
    fn test_usage_line() {
        let usage = ContextBudget::new(1000).check(900);
        let text = ConsoleFormatter::format_usage(&usage);
        assert!(text.contains("900 / 1000 units (90%)"));
        assert!(text.contains("compact"));
    }

    #[test]
    fn test_selection_shows_roles() {
        let catalog = ParticipantCatalog::builtin();
        let selection = Selection {
            participants: vec![ParticipantId::new("architect")],
            ignored: vec!["wizard".to_string()],
        };
        let text = ConsoleFormatter::format_selection(&selection, &catalog);
        assert!(text.contains("architect"));
        assert!(text.contains("wizard"));
    }

    #[test]
    fn test_aborted_shows_user_message() {
        let mut session = DiscussionSession::new("s", "topic", "", vec![], 3);
        session.abort().unwrap();
        let aborted = AbortedSession {
            session,
            failure: SessionFailure::generation(ErrorCategory::AuthError, "401", None),
            todos: vec![],
        };
        let text = ConsoleFormatter::format_aborted(&aborted);
        assert!(text.contains(ErrorCategory::AuthError.user_message()));
        assert!(text.contains("auth_error"));
    }

    #[test]
    fn test_empty_issues() {
        assert!(ConsoleFormatter::format_config_issues(&[]).contains("valid"));
    }
}
