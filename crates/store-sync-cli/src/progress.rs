//! Progress indicators for long-running waits
//!
//! A spinner while a bulk operation is polled, a bar over the records of an
//! import or files pass. Both draw to stderr and stay hidden when it is not
//! a terminal.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {prefix} {msg}";
const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

fn visible() -> bool {
    std::io::stderr().is_terminal()
}

/// Spinner for an indeterminate wait such as bulk polling
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = if visible() {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Bar over a known number of records; the length is set per file
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
    if !visible() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message.to_string());
    pb
}

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_progress_bar_length_is_set_later() {
        let pb = create_progress_bar("products");
        pb.set_length(12);
        pb.inc(3);
        assert_eq!(pb.length(), Some(12));
        assert_eq!(pb.position(), 3);
    }

    #[test]
    fn test_spinner_finishes() {
        let pb = create_spinner("Waiting for bulk operation");
        assert!(!pb.is_finished());
        pb.finish_and_clear();
        assert!(pb.is_finished());
    }
}
