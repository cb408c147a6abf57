use std::path::Path;

use colored::{Color, Colorize};
use url::Url;

use crate::report::{Status, TestResult};

use super::{Suite, SuiteSummary};

fn status_color(status: Status) -> Color {
    match status {
        Status::Passed => Color::Green,
        Status::Failed => Color::Red,
        Status::Broken => Color::Yellow,
    }
}

pub fn print_listing(suite: &Suite) {
    for scenario in suite.scenarios() {
        println!(
            "{} {} {}",
            scenario.name.bold(),
            scenario.feature.cyan(),
            format!("[{}]", scenario.tags.join(", ")).dimmed()
        );
    }
    println!("{}", format!("{} scenario(s)", suite.len()).dimmed());
}

pub fn print_result(result: &TestResult) {
    println!(
        "{} {} {}",
        result.status.as_str().to_uppercase().color(status_color(result.status)).bold(),
        result.name.bold(),
        format!("({} ms)", result.duration_ms()).dimmed()
    );

    if let Some(message) = &result.message {
        for line in message.lines() {
            println!("  {}", line.dimmed());
        }
    }
}

pub fn print_summary(summary: &SuiteSummary, report_dir: Option<&Path>) {
    let headline = if summary.is_success() {
        "All scenarios passed".green().bold()
    } else {
        "Some scenarios did not pass".red().bold()
    };
    println!("{}", headline);
    println!(
        "{} {} {} {} {}",
        "Totals:".bold(),
        format!("{} passed", summary.passed()).green(),
        format!("{} failed", summary.failed()).red(),
        format!("{} broken", summary.broken()).yellow(),
        format!("({:.1} s)", summary.elapsed.as_secs_f64()).dimmed()
    );

    if let Some(dir) = report_dir {
        println!("{} {}", "Results:".bold(), format_dir_link(dir));
    }
    if summary.publish_failures > 0 {
        println!(
            "{}",
            format!("{} result(s) could not be written", summary.publish_failures).yellow()
        );
    }
}

fn format_dir_link(path: &Path) -> String {
    let display = path.to_string_lossy();
    match Url::from_directory_path(path) {
        Ok(url) => format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, display.cyan()),
        Err(_) => display.cyan().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Report;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn format_dir_link_wraps_absolute_paths() {
        let temp = tempdir().unwrap();
        let link = format_dir_link(temp.path());
        assert!(link.contains("\u{1b}]8;;file://"));
    }

    #[test]
    fn format_dir_link_handles_relative_paths() {
        let link = format_dir_link(Path::new("allure-results"));
        assert!(link.contains("allure-results"));
        assert!(!link.contains("\u{1b}]8;;"));
    }

    #[test]
    fn printing_handles_every_status() {
        let passed = Report::new("brands_list").finish(Status::Passed, None);
        let failed = Report::new("categories").finish(
            Status::Failed,
            Some("Expected status 200, but got 500.\nBody: oops".to_string()),
        );
        let broken = Report::new("products_list").finish(Status::Broken, Some("timeout".into()));
        for result in [&passed, &failed, &broken] {
            print_result(result);
        }

        let summary = SuiteSummary {
            results: vec![passed, failed, broken],
            elapsed: Duration::from_millis(1500),
            publish_failures: 1,
        };
        print_summary(&summary, Some(Path::new("allure-results")));
        print_listing(&Suite::with_search_cases(Vec::new()));
    }
}
