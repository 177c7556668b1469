//! Command-line front ends for the `flatten` and `convert-font` binaries.

pub mod completions;
pub mod flatten;
pub mod font;

pub use flatten::FlattenArgs;
pub use font::ConvertFontArgs;

use crate::output::Printer;

/// Print the one-line usage summary through the status printer.
fn print_usage(command: &mut clap::Command, printer: &Printer) {
    let usage = command.render_usage().to_string();
    printer.info("Usage", usage.trim().trim_start_matches("Usage: "));
}
