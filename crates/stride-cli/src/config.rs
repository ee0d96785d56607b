//! The project config file (`stride.json`), consumed but not produced by
//! this crate. Deserialized with `serde`/`serde_json`; every field that the
//! core documents a default for is `#[serde(default)]` so a config that
//! only sets `name`/`version` still round-trips the rest.

use std::path::Path;

use serde::Deserialize;

fn default_main() -> String {
    "./src/main.sr".to_string()
}

fn default_build_path() -> String {
    "./build/".to_string()
}

fn default_mode() -> BuildMode {
    BuildMode::CompileJit
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildMode {
    CompileNative,
    CompileJit,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub path: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "default_main")]
    pub main: String,
    #[serde(default = "default_build_path")]
    pub build_path: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default = "default_mode")]
    pub mode: BuildMode,
}

impl Config {
    /// Looks for `stride.json` in `dir`. A missing file is not an error —
    /// the caller falls back to its positional arguments.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>, crate::error::Error> {
        let path = dir.join("stride.json");
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|e| crate::error::Error::Io(path.clone(), e))?;
        let config: Config =
            serde_json::from_str(&text).map_err(|e| crate::error::Error::Config(path, e))?;
        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaulting_omits_main_and_build_path() {
        let config: Config = serde_json::from_str(r#"{"name": "demo", "version": "0.1.0"}"#).unwrap();
        assert_eq!(config.main, "./src/main.sr");
        assert_eq!(config.build_path, "./build/");
        assert_eq!(config.mode, BuildMode::CompileJit);
    }

    #[test]
    fn config_honors_explicit_mode() {
        let config: Config = serde_json::from_str(r#"{"mode": "COMPILE_NATIVE"}"#).unwrap();
        assert_eq!(config.mode, BuildMode::CompileNative);
    }

    #[test]
    fn config_reads_build_path_in_camel_case() {
        let config: Config = serde_json::from_str(r#"{"buildPath": "./out/"}"#).unwrap();
        assert_eq!(config.build_path, "./out/");
    }

    #[test]
    fn config_reads_dependencies() {
        let config: Config = serde_json::from_str(
            r#"{"dependencies": [{"name": "collections", "version": "1.0.0", "path": "../collections"}]}"#,
        )
        .unwrap();
        assert_eq!(config.dependencies.len(), 1);
        assert_eq!(config.dependencies[0].name, "collections");
    }
}
