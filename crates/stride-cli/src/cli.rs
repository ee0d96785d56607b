//! Argument parsing: a single flagless positional-args command, no
//! subcommands — `stride <file>...`. Color detection is an auto/always/
//! never choice, with auto checked against whether stderr is a terminal.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn should_colorize(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

#[derive(Parser)]
#[command(name = "stride", bin_name = "stride")]
#[command(about = "Compiler driver for the stride language")]
pub struct Cli {
    /// Source files to compile. Defaults to the project config's `main`
    /// entry when omitted and a `stride.json` is found.
    pub files: Vec<PathBuf>,

    /// Colorize diagnostic output (auto-detected by default).
    #[arg(long, default_value = "auto", value_name = "WHEN")]
    pub color: ColorChoice,
}
