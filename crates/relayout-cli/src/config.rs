//! Configuration file support for relayout
//!
//! Loads `.relayout.toml` from current directory or parent directories.

use anyhow::{anyhow, Context, Result};
use relayout_core::{IndentStyle, LineEnding};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub paths: PathsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Indentation for newly printed code: a width or "tab"
    pub indent: Option<IndentSetting>,
    /// "lf" or "crlf". Detected per file when unset.
    pub line_ending: Option<String>,
}

/// `indent = 4` or `indent = "tab"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IndentSetting {
    Width(usize),
    Named(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Glob patterns to exclude from processing
    pub exclude: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text", "json" or "diff"
    pub format: Option<String>,
}

impl Config {
    /// Load config from `.relayout.toml` searching from current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(".relayout.toml");
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Indentation from the command line, else the config file, else the default
    pub fn indent_style(&self, cli_indent: Option<&str>) -> Result<IndentStyle> {
        let setting = match (cli_indent, &self.layout.indent) {
            (Some(cli), _) => cli.to_string(),
            (None, Some(IndentSetting::Width(width))) => return Ok(IndentStyle::Spaces(*width)),
            (None, Some(IndentSetting::Named(name))) => name.clone(),
            (None, None) => return Ok(IndentStyle::default()),
        };
        IndentStyle::parse(&setting).ok_or_else(|| {
            anyhow!(
                "Invalid indent '{}'. Use a number of spaces or \"tab\"",
                setting
            )
        })
    }

    /// Line ending from the command line or the config file, `None` to detect
    pub fn line_ending(&self, cli_line_ending: Option<&str>) -> Result<Option<LineEnding>> {
        let Some(setting) = cli_line_ending.or(self.layout.line_ending.as_deref()) else {
            return Ok(None);
        };
        LineEnding::parse(setting)
            .map(Some)
            .ok_or_else(|| anyhow!("Invalid line ending '{}'. Valid options: lf, crlf", setting))
    }

    /// Check if a path should be excluded based on config patterns
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.paths.exclude {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
                if let Some(file_name) = path.file_name() {
                    if glob_pattern.matches(&file_name.to_string_lossy()) {
                        return true;
                    }
                }
            }

            if pattern.ends_with('/') {
                let dir_pattern = pattern.trim_end_matches('/');
                if path_str.contains(&format!("/{}/", dir_pattern))
                    || path_str.starts_with(&format!("{}/", dir_pattern))
                {
                    return true;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_config(dir: &Path, content: &str) {
        fs::write(dir.join(".relayout.toml"), content).unwrap();
    }

    #[test]
    fn test_load_basic_config() {
        let temp = TempDir::new().unwrap();
        create_config(
            temp.path(),
            r#"
[layout]
indent = 4
line_ending = "crlf"

[paths]
exclude = ["generated/", "*.gen.scala"]

[output]
format = "diff"
"#,
        );

        let (config, path) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert_eq!(path, temp.path().join(".relayout.toml"));
        assert_eq!(config.layout.indent, Some(IndentSetting::Width(4)));
        assert_eq!(config.indent_style(None).unwrap(), IndentStyle::Spaces(4));
        assert_eq!(config.line_ending(None).unwrap(), Some(LineEnding::CrLf));
        assert_eq!(
            config.paths.exclude,
            vec!["generated/".to_string(), "*.gen.scala".to_string()]
        );
        assert_eq!(config.output.format, Some("diff".to_string()));
    }

    #[test]
    fn test_load_empty_config() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "");

        let (config, _) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert!(config.layout.indent.is_none());
        assert_eq!(config.indent_style(None).unwrap(), IndentStyle::Spaces(2));
        assert_eq!(config.line_ending(None).unwrap(), None);
        assert!(config.paths.exclude.is_empty());
        assert!(config.output.format.is_none());
    }

    #[test]
    fn test_load_from_parent_directory() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[layout]\nindent = \"tab\"\n");
        let nested = temp.path().join("src").join("main");
        fs::create_dir_all(&nested).unwrap();

        let (config, path) = Config::load_from(nested).unwrap().unwrap();
        assert_eq!(path, temp.path().join(".relayout.toml"));
        assert_eq!(config.indent_style(None).unwrap(), IndentStyle::Tabs);
    }

    #[test]
    fn test_no_config_found() {
        let temp = TempDir::new().unwrap();
        // The search walks up past the temp dir, so only check it does not fail
        assert!(Config::load_from(temp.path().to_path_buf()).is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[layout\nindent = 4");
        assert!(Config::load_from(temp.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[layout]\nindent = 4\nline_ending = \"lf\"\n");
        let (config, _) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert_eq!(config.indent_style(Some("tab")).unwrap(), IndentStyle::Tabs);
        assert_eq!(
            config.line_ending(Some("crlf")).unwrap(),
            Some(LineEnding::CrLf)
        );
        assert!(config.indent_style(Some("wide")).is_err());
        assert!(config.line_ending(Some("cr")).is_err());
    }

    #[test]
    fn test_should_exclude() {
        let config = Config {
            paths: PathsConfig {
                exclude: vec!["generated/".to_string(), "*.gen.scala".to_string()],
            },
            ..Default::default()
        };

        assert!(config.should_exclude(Path::new("generated/A.scala")));
        assert!(config.should_exclude(Path::new("src/generated/A.scala")));
        assert!(config.should_exclude(Path::new("src/Model.gen.scala")));
        assert!(!config.should_exclude(Path::new("src/Main.scala")));
    }
}
