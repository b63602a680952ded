//! Console output formatter for prompt outcomes and pool reports

use abra_application::{BatchSummary, PoolStats, PromptResponse};
use abra_domain::PromptOutcome;
use abra_domain::util::preview;
use colored::Colorize;
use serde::Serialize;
use std::time::Duration;

/// Formats command results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format as pretty JSON
    pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format one prompt and its outcome
    pub fn format_outcome(prompt: &str, outcome: &PromptOutcome) -> String {
        let mut output = String::new();

        output.push_str(&format!("{} {}\n\n", "Q:".bold(), prompt));

        match outcome {
            PromptOutcome::Success(result) => {
                output.push_str(result.text());
                output.push('\n');

                if !result.sources().is_empty() {
                    output.push_str(&format!("\n{}\n", "Sources:".cyan().bold()));
                    for source in result.sources() {
                        let label = if source.label.is_empty() {
                            source.url.as_str()
                        } else {
                            source.label.as_str()
                        };
                        output.push_str(&format!(
                            "  [{}] {} {}\n",
                            source.position + 1,
                            label,
                            source.url.dimmed()
                        ));
                    }
                }

                output.push_str(&format!(
                    "\n{} {}\n",
                    "Model:".dimmed(),
                    result.result.model.dimmed()
                ));
            }
            PromptOutcome::Failure(failure) => {
                output.push_str(&format!("{} {}\n", "Error:".red().bold(), failure.error));
            }
        }

        output
    }

    /// Format the responses of a pool run, one section per prompt
    pub fn format_responses(results: &[(String, PromptResponse)]) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Pool Results"));
        output.push('\n');

        for (index, (prompt, response)) in results.iter().enumerate() {
            let title = format!("#{} ({})", index + 1, response.status_code);
            let title = if response.body.is_success() {
                title.green().bold()
            } else {
                title.red().bold()
            };
            output.push_str(&format!("\n{} {}\n", title, preview(prompt, 60).dimmed()));
            output.push_str(&Self::indent(&Self::format_outcome(prompt, &response.body), "  "));
            output.push('\n');
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format the pool counters
    pub fn format_pool_stats(stats: &PoolStats) -> String {
        format!(
            "{} {} ready, {} busy, {} initializing of {} | {} served",
            "Pool:".cyan().bold(),
            stats.ready.to_string().green(),
            stats.busy,
            stats.initializing,
            stats.size,
            stats.served
        )
    }

    /// Format the final tally of a batch run
    pub fn format_batch_summary(summary: &BatchSummary, elapsed: Duration) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Batch Complete"));
        output.push('\n');

        let rate = format!("{:.1}%", summary.success_rate());
        let rate = if summary.failed == 0 {
            rate.green().bold()
        } else if summary.ok == 0 {
            rate.red().bold()
        } else {
            rate.yellow().bold()
        };

        output.push_str(&format!("{} {}\n", "Total:".cyan().bold(), summary.total()));
        output.push_str(&format!("{} {}\n", "Success:".cyan().bold(), summary.ok));
        output.push_str(&format!("{} {}\n", "Failed:".cyan().bold(), summary.failed));
        output.push_str(&format!("{} {}\n", "Rate:".cyan().bold(), rate));
        output.push_str(&format!(
            "{} {:.1}s\n",
            "Elapsed:".cyan().bold(),
            elapsed.as_secs_f64()
        ));

        output.push_str(&Self::footer());
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abra_domain::{SourceReference, StructuredResult};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_success_with_sources() {
        plain();
        let outcome: PromptOutcome = StructuredResult::build(
            "Rust 1.80 shipped.",
            &[
                SourceReference::new("https://blog.rust-lang.org", "Rust Blog", ""),
                SourceReference::new("https://example.com/x", "", ""),
            ],
        )
        .into();

        let text = ConsoleFormatter::format_outcome("What's new?", &outcome);
        assert!(text.starts_with("Q: What's new?"));
        assert!(text.contains("Rust 1.80 shipped."));
        assert!(text.contains("[1] Rust Blog https://blog.rust-lang.org"));
        assert!(text.contains("[2] https://example.com/x https://example.com/x"));
        assert!(text.contains("Model:"));
    }

    #[test]
    fn test_format_failure() {
        plain();
        let text = ConsoleFormatter::format_outcome("hi", &PromptOutcome::failure("boom"));
        assert!(text.contains("Error: boom"));
        assert!(!text.contains("Sources:"));
    }

    #[test]
    fn test_format_json_matches_wire_shape() {
        let json = ConsoleFormatter::format_json(&PromptOutcome::failure("boom"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn test_format_responses_numbers_each_prompt() {
        plain();
        let results = vec![
            (
                "first".to_string(),
                PromptResponse {
                    status_code: 200,
                    body: StructuredResult::build("one", &[]).into(),
                },
            ),
            (
                "second".to_string(),
                PromptResponse {
                    status_code: 502,
                    body: PromptOutcome::failure("No healthy clients available"),
                },
            ),
        ];

        let text = ConsoleFormatter::format_responses(&results);
        assert!(text.contains("#1 (200)"));
        assert!(text.contains("#2 (502)"));
        assert!(text.contains("  Error: No healthy clients available"));
    }

    #[test]
    fn test_format_batch_summary() {
        plain();
        let text = ConsoleFormatter::format_batch_summary(
            &BatchSummary { ok: 3, failed: 1 },
            Duration::from_millis(2500),
        );
        assert!(text.contains("Total: 4"));
        assert!(text.contains("Rate: 75.0%"));
        assert!(text.contains("Elapsed: 2.5s"));
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "> "), "> a\n> b");
    }
}
