//! Font conversion command implementation.

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::error::Result;
use crate::font::convert_font;
use crate::output::{display_path, Printer};

/// Convert a BMFont XML description (.fnt) into a .font document
#[derive(Parser, Debug, Default)]
#[command(name = "convert-font")]
#[command(version, about, long_about = None)]
pub struct ConvertFontArgs {
    /// BMFont XML file to convert
    pub fnt: Option<PathBuf>,

    /// Material the font bitmap is bound to
    pub material: Option<String>,

    /// Font name; output is written to <NAME>.font
    pub name: Option<String>,

    /// Directory the .font file is written to
    #[arg(long, short, default_value = ".")]
    pub output_dir: PathBuf,

    /// Print shell completions and exit
    #[arg(long, value_enum)]
    pub completions: Option<Shell>,
}

/// Run the converter. Returns the written path, or `None` if only the
/// usage line was printed.
pub fn run(args: ConvertFontArgs, printer: &Printer) -> Result<Option<PathBuf>> {
    if let Some(shell) = args.completions {
        super::completions::generate::<ConvertFontArgs>(shell);
        return Ok(None);
    }

    let (Some(fnt), Some(material), Some(name)) = (&args.fnt, &args.material, &args.name) else {
        super::print_usage(&mut ConvertFontArgs::command(), printer);
        return Ok(None);
    };

    printer.info("Converting", &display_path(fnt));
    let out = convert_font(fnt, material, name, &args.output_dir)?;
    printer.success("Created", &display_path(&out));

    Ok(Some(out))
}
