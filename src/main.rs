use clap::Parser;
use miette::Result;
use resflat::cli::{flatten, FlattenArgs};
use resflat::output::Printer;

fn main() -> Result<()> {
    let args = FlattenArgs::parse();
    let printer = Printer::new();

    flatten::run(args, &printer)?;

    Ok(())
}
