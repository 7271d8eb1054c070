//! Regeneration settings: indentation and line endings for printed code

use serde::{Deserialize, Serialize};

/// Indentation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndentStyle {
    /// Use spaces for indentation
    Spaces(usize),
    /// Use tabs for indentation
    Tabs,
}

impl Default for IndentStyle {
    fn default() -> Self {
        IndentStyle::Spaces(2)
    }
}

impl IndentStyle {
    /// Indentation string for one level
    pub fn unit(&self) -> String {
        match self {
            IndentStyle::Spaces(n) => " ".repeat(*n),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }

    /// Indentation string for `depth` levels
    pub fn at_depth(&self, depth: usize) -> String {
        self.unit().repeat(depth)
    }

    /// Parse a setting such as `"4"`, `"tab"` or a literal run of spaces
    pub fn parse(setting: &str) -> Option<Self> {
        match setting {
            "tab" | "tabs" | "\t" | "\\t" => Some(IndentStyle::Tabs),
            s if !s.is_empty() && s.chars().all(|c| c == ' ') => {
                Some(IndentStyle::Spaces(s.len()))
            }
            s => s.trim().parse().ok().map(IndentStyle::Spaces),
        }
    }
}

/// Line ending style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Unix-style line endings (LF)
    #[default]
    Lf,
    /// Windows-style line endings (CRLF)
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Parse `"lf"`/`"crlf"` or the escaped sequences
    pub fn parse(setting: &str) -> Option<Self> {
        match setting.to_ascii_lowercase().as_str() {
            "lf" | "\n" | "\\n" => Some(LineEnding::Lf),
            "crlf" | "\r\n" | "\\r\\n" => Some(LineEnding::CrLf),
            _ => None,
        }
    }

    /// The line ending used by existing text, LF when it has none
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }
}

/// Settings for code the engine has to print from scratch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegenConfig {
    #[serde(default)]
    pub indent: IndentStyle,
    #[serde(default)]
    pub line_ending: LineEnding,
}

impl RegenConfig {
    pub fn new(indent: IndentStyle, line_ending: LineEnding) -> Self {
        Self {
            indent,
            line_ending,
        }
    }
}
