//! Shell completions generation.

use clap::CommandFactory;
use clap_complete::Shell;

/// Write completions for the binary described by `C` to stdout.
pub fn generate<C: CommandFactory>(shell: Shell) {
    let mut cmd = C::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
