mod cli;
mod config;
mod diagnostics;
mod driver;
mod error;

use clap::Parser;

use cli::Cli;

fn main() {
    let args = Cli::parse();
    let colored = args.color.should_colorize();
    let project_dir = std::env::current_dir().unwrap_or_else(|_| ".".into());

    match driver::compile_and_run(&args.files, &project_dir) {
        // JIT mode runs `main` to completion; its return value becomes this
        // process's exit code, truncated the way a shell truncates any
        // process exit status. Native mode only builds, so it always exits
        // 0 on success — there is no running program to take a code from.
        Ok(outcome) => std::process::exit(outcome.interpreted_result.unwrap_or(0) as i32 & 0xFF),
        Err(err) => {
            eprintln!("{}", diagnostics::render(&err, colored));
            std::process::exit(1);
        }
    }
}
