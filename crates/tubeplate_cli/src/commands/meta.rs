//! Shell completions and man pages.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;

use crate::Cli;
use crate::commands::shared::CommandResult;

const BIN_NAME: &str = "tubeplate";

fn completion_script(shell: clap_complete::Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let mut out = Vec::new();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, &mut out);
    out
}

fn render_man(cmd: clap::Command) -> CommandResult<Vec<u8>> {
    let mut out = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut out)?;
    Ok(out)
}

/// Write `tubeplate.1` plus one page per subcommand into `dir`.
fn write_man_pages(dir: &Path) -> CommandResult<usize> {
    std::fs::create_dir_all(dir)?;
    let cmd = Cli::command();
    let mut written = 0;

    std::fs::write(dir.join(format!("{BIN_NAME}.1")), render_man(cmd.clone())?)?;
    written += 1;

    for sub in cmd.get_subcommands() {
        let name = format!("{BIN_NAME}-{}", sub.get_name());
        let page = render_man(sub.clone().name(name.clone()))?;
        std::fs::write(dir.join(format!("{name}.1")), page)?;
        written += 1;
    }
    Ok(written)
}

pub(crate) fn handle_completions(shell: clap_complete::Shell) -> CommandResult {
    std::io::stdout().write_all(&completion_script(shell))?;
    Ok(())
}

pub(crate) fn handle_man(output: Option<PathBuf>) -> CommandResult {
    match output {
        Some(dir) => {
            let count = write_man_pages(&dir)?;
            println!("Generated {count} man pages in: {}", dir.display());
        }
        None => {
            std::io::stdout().write_all(&render_man(Cli::command())?)?;
        }
    }
    Ok(())
}
