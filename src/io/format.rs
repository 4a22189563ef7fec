//! Nicely formatted spinspg output.

use std::fmt;

use log;

#[cfg(test)]
#[path = "format_tests.rs"]
mod format_tests;

const TITLE_WIDTH: usize = 80;

/// Logs a main output line to the `spinspg-output` logger.
macro_rules! spinspg_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "spinspg-output", $fmt, $($($arg)*)?); }
}

pub(crate) use spinspg_output;

/// Logs a section title framed by rules to the `spinspg-output` logger.
pub(crate) fn log_title(title: &str) {
    let width = title.chars().count().max(TITLE_WIDTH);
    let rule = "=".repeat(width);
    spinspg_output!("{rule}");
    spinspg_output!("{title:^width$}");
    spinspg_output!("{rule}");
}

/// Underlines a subtitle.
fn underline(subtitle: &str) -> String {
    format!("{subtitle}\n{}", "-".repeat(subtitle.chars().count()))
}

pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    writeln!(f, "{}", underline(subtitle))
}

/// Logs an underlined subtitle to the `spinspg-output` logger.
pub(crate) fn log_subtitle(subtitle: &str) {
    underline(subtitle)
        .lines()
        .for_each(|line| { spinspg_output!("{line}"); });
}

/// Logs the [`fmt::Display`] output of a value line by line to the `spinspg-output` logger.
pub(crate) trait SpinSpgOutput: fmt::Display {
    fn log_output_display(&self) {
        self.to_string()
            .lines()
            .for_each(|line| { spinspg_output!("{line}"); });
    }
}

impl<T: fmt::Display> SpinSpgOutput for T {}
