use clap::Parser;
use miette::Result;
use resflat::cli::{font, ConvertFontArgs};
use resflat::output::Printer;

fn main() -> Result<()> {
    let args = ConvertFontArgs::parse();
    let printer = Printer::new();

    font::run(args, &printer)?;

    Ok(())
}
