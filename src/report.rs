use crate::app::{AggregateResult, ShutdownOutcome};
use crate::error::Result;
use crossterm::style::{StyledContent, Stylize};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// How the final result is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Renders an `AggregateResult` for the operator
pub struct Reporter {
    format: OutputFormat,
    color: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    pub fn render(&self, result: &AggregateResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Text => Ok(self.render_text(result)),
        }
    }

    /// Print the rendered result to stdout
    pub fn print(&self, result: &AggregateResult) -> Result<()> {
        println!("{}", self.render(result)?);
        Ok(())
    }

    fn render_text(&self, result: &AggregateResult) -> String {
        let mut out = String::new();

        let mut outcomes: Vec<&ShutdownOutcome> = result.outcomes.iter().collect();
        outcomes.sort_by_key(|o| o.service().to_lowercase());

        let width = outcomes
            .iter()
            .map(|o| o.service().len())
            .max()
            .unwrap_or(0);

        for outcome in outcomes {
            let marker = if outcome.succeeded() {
                self.paint("+", |s| s.green())
            } else {
                self.paint("x", |s| s.red())
            };
            let summary = if outcome.succeeded() {
                self.paint(outcome.summary(), |s| s.green())
            } else if outcome.stopped() {
                self.paint(outcome.summary(), |s| s.yellow())
            } else {
                self.paint(outcome.summary(), |s| s.red())
            };

            let _ = write!(
                out,
                "  {} {:<width$}  {}",
                marker,
                outcome.service(),
                summary,
                width = width
            );
            if let Some(error) = outcome.error() {
                let _ = write!(out, "  {}", self.paint(error, |s| s.dark_grey()));
            }
            out.push('\n');
        }

        let summary = format!(
            "{}/{} service(s) stopped and disabled in {:.1}s",
            result.total_succeeded,
            result.total_attempted,
            result.elapsed().as_secs_f64()
        );
        let summary = if result.all_succeeded() {
            self.paint(&summary, |s| s.green().bold())
        } else {
            self.paint(&summary, |s| s.red().bold())
        };

        if !result.outcomes.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "{}", summary);
        out
    }

    fn paint<'a>(
        &self,
        text: &'a str,
        style: impl Fn(&'a str) -> StyledContent<&'a str>,
    ) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;
    use uuid::Uuid;

    fn create_test_result() -> AggregateResult {
        let now = Utc::now();
        AggregateResult {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            total_attempted: 3,
            total_succeeded: 1,
            outcomes: vec![
                ShutdownOutcome::new("wuauserv", true, true, None, Duration::from_millis(40)),
                ShutdownOutcome::new(
                    "SysMain",
                    true,
                    false,
                    Some("Failed to disable service 'SysMain': access denied".to_string()),
                    Duration::from_millis(15),
                ),
                ShutdownOutcome::failed("DiagTrack", "Service 'DiagTrack' does not exist"),
            ],
        }
    }

    #[test]
    fn test_plain_text_report() {
        let reporter = Reporter::new(OutputFormat::Text, false);
        let text = reporter.render(&create_test_result()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].contains("DiagTrack"));
        assert!(lines[0].contains("stop failed"));
        assert!(lines[1].contains("SysMain"));
        assert!(lines[1].contains("stopped, disable failed"));
        assert!(lines[1].contains("access denied"));
        assert!(lines[2].starts_with("  + wuauserv"));
        assert!(text.ends_with("1/3 service(s) stopped and disabled in 0.0s"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_colored_text_report() {
        let reporter = Reporter::new(OutputFormat::Text, true);
        let text = reporter.render(&create_test_result()).unwrap();
        assert!(text.contains('\u{1b}'));
    }

    #[test]
    fn test_json_report() {
        let reporter = Reporter::new(OutputFormat::Json, true);
        let text = reporter.render(&create_test_result()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["total_attempted"], 3);
        assert_eq!(json["total_succeeded"], 1);
        assert_eq!(json["outcomes"].as_array().unwrap().len(), 3);
        assert_eq!(json["outcomes"][1]["disabled"], false);
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
