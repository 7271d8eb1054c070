//! File processing logic for relayout
//!
//! A source file `Foo.scala` is paired with the tree a parser produced for it,
//! `Foo.scala.orig.json`, and the tree a transformation produced from that,
//! `Foo.scala.edit.json`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use relayout_core::position::offset_to_line_column;
use relayout_core::{
    apply_edits, load_edited, load_original, regenerate, IndentStyle, LineEnding, PrettyPrinter,
    RegenConfig, SourceFile, UnitSet,
};

use crate::output::EditInfo;

const ORIGINAL_SUFFIX: &str = ".orig.json";
const EDITED_SUFFIX: &str = ".edit.json";

/// The three files one regeneration reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub source: PathBuf,
    pub original: PathBuf,
    pub edited: PathBuf,
}

impl Inputs {
    /// Inputs for a source file, with its trees next to it
    pub fn for_source(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            original: with_suffix(source, ORIGINAL_SUFFIX),
            edited: with_suffix(source, EDITED_SUFFIX),
        }
    }

    /// Inputs for an edited tree file, `None` when it is not named `*.edit.json`
    pub fn for_edited_tree(edited: &Path) -> Option<Self> {
        let name = edited.file_name()?.to_str()?;
        let source_name = name.strip_suffix(EDITED_SUFFIX)?;
        if source_name.is_empty() {
            return None;
        }
        Some(Self::for_source(&edited.with_file_name(source_name)))
    }

    /// Inputs for any path given on the command line
    pub fn for_path(path: &Path) -> Self {
        Self::for_edited_tree(path).unwrap_or_else(|| Self::for_source(path))
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Layout settings for printed code
#[derive(Debug, Clone, Copy, Default)]
pub struct Settings {
    pub indent: IndentStyle,
    /// Detected from the source when `None`
    pub line_ending: Option<LineEnding>,
}

/// Result of processing a single file
#[derive(Debug)]
pub struct ProcessResult {
    /// Edits that were found/applied
    pub edits: Vec<EditInfo>,
    /// Nodes that could not be printed
    pub warnings: Vec<String>,
    /// Original source code
    pub old_source: String,
    /// New source code after edits (only if edits were found)
    pub new_source: Option<String>,
}

/// Regenerate one source file from its original and edited trees
pub fn process_file(inputs: &Inputs, settings: Settings) -> Result<ProcessResult> {
    let source_code = read(&inputs.source)?;
    let original_json = read(&inputs.original)?;
    let edited_json = read(&inputs.edited)?;

    let source = SourceFile::new(inputs.source.to_string_lossy(), source_code.as_str());
    let original = load_original(&source, &original_json)
        .with_context(|| format!("Failed to load tree {}", inputs.original.display()))?;
    let edited = load_edited(&source, &edited_json, &original)
        .with_context(|| format!("Failed to load tree {}", inputs.edited.display()))?;

    let config = RegenConfig::new(
        settings.indent,
        settings
            .line_ending
            .unwrap_or_else(|| LineEnding::detect(&source_code)),
    );
    let edited_root = edited.into_root();
    let units = UnitSet::new().with_unit(source, original.into_root());
    let result = regenerate(&units, &PrettyPrinter::new(config.clone()), &config, &edited_root)
        .with_context(|| format!("Failed to regenerate {}", inputs.source.display()))?;

    let warnings = result
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.message.clone())
        .collect();

    if result.is_empty() {
        return Ok(ProcessResult {
            edits: vec![],
            warnings,
            old_source: source_code,
            new_source: None,
        });
    }

    let edit_infos: Vec<EditInfo> = result
        .edits
        .iter()
        .map(|edit| {
            let (line, column) = offset_to_line_column(&source_code, edit.start_offset());
            EditInfo {
                kind: region_kind(&edit.message),
                line,
                column,
                message: edit.message.clone(),
            }
        })
        .collect();

    let new_source = apply_edits(&source_code, &result.edits)
        .with_context(|| format!("Failed to apply edits to {}", inputs.source.display()))?;

    Ok(ProcessResult {
        edits: edit_infos,
        warnings,
        old_source: source_code,
        new_source: Some(new_source),
    })
}

/// Write the processed result to the file
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Node kind named by a "Regenerate <kind>" edit message
fn region_kind(message: &str) -> String {
    message
        .strip_prefix("Regenerate ")
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SOURCE: &str = "{\n  f(a, b) // call\n  g\n}";

    const ORIGINAL: &str = r#"{"file": "Main.scala", "root": {
        "kind": "block", "pos": [0, 25],
        "stats": [
            {"kind": "apply", "id": "call", "pos": [4, 11],
             "fun": {"kind": "ident", "name": "f", "pos": [4, 5]},
             "args": [
                {"kind": "ident", "name": "a", "pos": [6, 7]},
                {"kind": "ident", "name": "b", "pos": [9, 10]}
             ]},
            {"kind": "ident", "id": "g", "name": "g", "pos": [22, 23]}
        ]
    }}"#;

    fn write_inputs(dir: &Path, edited: &str) -> Inputs {
        let inputs = Inputs::for_source(&dir.join("Main.scala"));
        fs::write(&inputs.source, SOURCE).unwrap();
        fs::write(&inputs.original, ORIGINAL).unwrap();
        fs::write(&inputs.edited, edited).unwrap();
        inputs
    }

    #[test]
    fn test_input_paths() {
        let inputs = Inputs::for_source(Path::new("src/Main.scala"));
        assert_eq!(inputs.original, PathBuf::from("src/Main.scala.orig.json"));
        assert_eq!(inputs.edited, PathBuf::from("src/Main.scala.edit.json"));

        let from_tree = Inputs::for_edited_tree(Path::new("src/Main.scala.edit.json")).unwrap();
        assert_eq!(from_tree, inputs);
        assert_eq!(Inputs::for_path(Path::new("src/Main.scala")), inputs);

        assert!(Inputs::for_edited_tree(Path::new("src/Main.scala")).is_none());
        assert!(Inputs::for_edited_tree(Path::new("src/.edit.json")).is_none());
    }

    #[test]
    fn test_process_file_with_changes() {
        let temp = TempDir::new().unwrap();
        let inputs = write_inputs(
            temp.path(),
            r#"{"file": "Main.scala", "root": {
                "kind": "block", "pos": [0, 25],
                "stats": [{"ref": "call"}, {"kind": "ident", "name": "h", "pos": [22, 23]}]
            }}"#,
        );

        let result = process_file(&inputs, Settings::default()).unwrap();
        assert_eq!(result.edits.len(), 1);
        assert_eq!(result.edits[0].kind, "ident");
        assert_eq!((result.edits[0].line, result.edits[0].column), (3, 3));
        assert!(result.warnings.is_empty());
        assert_eq!(
            result.new_source.as_deref(),
            Some("{\n  f(a, b) // call\n  h\n}")
        );
    }

    #[test]
    fn test_process_file_without_changes() {
        let temp = TempDir::new().unwrap();
        let inputs = write_inputs(temp.path(), r#"{"file": "Main.scala", "root": {
            "kind": "block", "pos": [0, 25], "stats": [{"ref": "call"}, {"ref": "g"}]
        }}"#);

        let result = process_file(&inputs, Settings::default()).unwrap();
        assert!(result.edits.is_empty());
        assert!(result.new_source.is_none());
        assert_eq!(result.old_source, SOURCE);
    }

    #[test]
    fn test_missing_tree_is_an_error() {
        let temp = TempDir::new().unwrap();
        let inputs = Inputs::for_source(&temp.path().join("Main.scala"));
        fs::write(&inputs.source, SOURCE).unwrap();

        let err = process_file(&inputs, Settings::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("Main.scala.orig.json"));
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let temp = TempDir::new().unwrap();
        let inputs = write_inputs(
            temp.path(),
            r#"{"file": "Main.scala", "root": {"kind": "lambda"}}"#,
        );

        let err = process_file(&inputs, Settings::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown node kind 'lambda'"));
    }

    #[test]
    fn test_region_kind() {
        assert_eq!(region_kind("Regenerate apply"), "apply");
        assert_eq!(region_kind("something else"), "unknown");
    }
}
