//! Lexical rules for splitting the gap between two siblings
//!
//! Rules run against the gap with comments masked out, so punctuation inside
//! a comment never decides a split. The first matching rule wins. Each
//! pattern captures the left part in a group named `left`, and the split
//! falls at the end of that group.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

/// Priority tier of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Keywords and unambiguous punctuation
    Primary,
    /// Delimiters and line structure
    Secondary,
    /// Member selection
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Masked,
    Raw,
}

struct SplitRule {
    name: &'static str,
    tier: Tier,
    input: Input,
    regex: Regex,
    accept: fn(&Gap<'_>, usize) -> bool,
}

/// A sibling gap with its comments located and masked
#[derive(Debug, Clone)]
pub struct Gap<'a> {
    raw: &'a str,
    masked: String,
    comments: Vec<Range<usize>>,
}

impl<'a> Gap<'a> {
    pub fn new(raw: &'a str) -> Self {
        let comments = comment_spans(raw);
        let masked = mask(raw, &comments);
        Self {
            raw,
            masked,
            comments,
        }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// The raw text with comment bytes replaced by spaces, newlines kept
    pub fn masked(&self) -> &str {
        &self.masked
    }

    pub fn comments(&self) -> &[Range<usize>] {
        &self.comments
    }

    pub fn has_comment(&self) -> bool {
        !self.comments.is_empty()
    }

    /// Move an index that falls inside a comment to the comment's edge
    ///
    /// A comment on its own line stays with what follows it, any other
    /// comment stays with what precedes it.
    pub fn snap(&self, index: usize) -> usize {
        for comment in &self.comments {
            if comment.start < index && index < comment.end {
                let own_line = self.raw[..comment.start]
                    .rfind('\n')
                    .is_some_and(|nl| self.raw[nl + 1..comment.start].trim().is_empty());
                return if own_line { comment.start } else { comment.end };
            }
        }
        index
    }

    /// Offset of the first character that is neither layout nor comment
    pub fn first_syntactic(&self) -> Option<usize> {
        self.masked.find(|c: char| !c.is_whitespace())
    }

    /// Offset just past the last character that is neither layout nor comment
    pub fn after_last_syntactic(&self) -> Option<usize> {
        self.masked
            .char_indices()
            .rev()
            .find(|(_, c)| !c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
    }
}

/// Byte ranges of `//` and (nested) `/* */` comments
pub fn comment_spans(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match (bytes[i], bytes.get(i + 1)) {
            (b'/', Some(b'/')) => {
                let end = text[i..].find('\n').map_or(text.len(), |nl| i + nl);
                spans.push(i..end);
                i = end;
            }
            (b'/', Some(b'*')) => {
                let start = i;
                let mut depth = 0usize;
                while i < bytes.len() {
                    if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
                        depth += 1;
                        i += 2;
                    } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        depth -= 1;
                        i += 2;
                        if depth == 0 {
                            break;
                        }
                    } else {
                        i += 1;
                    }
                }
                // an unterminated comment runs to the end of the text
                spans.push(start..i.min(bytes.len()));
            }
            _ => i += 1,
        }
    }

    spans
}

fn mask(raw: &str, comments: &[Range<usize>]) -> String {
    let mut masked = String::with_capacity(raw.len());
    for (i, ch) in raw.char_indices() {
        let in_comment = comments.iter().any(|c| c.contains(&i));
        if in_comment && ch != '\n' {
            for _ in 0..ch.len_utf8() {
                masked.push(' ');
            }
        } else {
            masked.push(ch);
        }
    }
    masked
}

fn any(_: &Gap<'_>, _: usize) -> bool {
    true
}

fn only_comments(gap: &Gap<'_>, _: usize) -> bool {
    gap.masked.trim().is_empty()
}

fn no_annotation(gap: &Gap<'_>, index: usize) -> bool {
    !gap.masked[..index].contains('@')
}

fn rule_table() -> &'static [SplitRule] {
    static RULES: OnceLock<Vec<SplitRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let rule = |name: &'static str,
                    tier: Tier,
                    input: Input,
                    pattern: &str,
                    accept: fn(&Gap<'_>, usize) -> bool| SplitRule {
            name,
            tier,
            input,
            regex: Regex::new(pattern).unwrap(),
            accept,
        };
        vec![
            rule("else", Tier::Primary, Input::Masked, r"(?s)^(?P<left>.*?)\belse\b", any),
            rule("match", Tier::Primary, Input::Masked, r"(?s)^(?P<left>.*?\s)match\b", any),
            rule("comment_start", Tier::Primary, Input::Raw, r"(?s)^(?P<left>.*?)/\*", only_comments),
            rule("class", Tier::Primary, Input::Masked, r"(?s)^(?P<left>.*?)\bclass\b", any),
            rule("colon", Tier::Primary, Input::Masked, r"(?s)^(?P<left>.*?:\s*)", no_annotation),
            rule("empty_parens", Tier::Primary, Input::Masked, r"(?s)^(?P<left>.*?\(\s*\)\s*)", any),
            rule("opening_paren", Tier::Primary, Input::Masked, r"(?s)^(?P<left>.*?\()", any),
            rule("arrow", Tier::Primary, Input::Masked, r"(?s)^(?P<left>.*?=>\s*)", any),
            rule("closing_paren", Tier::Secondary, Input::Masked, r"(?s)^(?P<left>.*?\))", any),
            rule("equals", Tier::Secondary, Input::Masked, r"(?s)^(?P<left>.*?)=", any),
            rule("import", Tier::Secondary, Input::Masked, r"(?s)^(?P<left>.*?)\r?\n[ \t]*import\b", any),
            rule("newline", Tier::Secondary, Input::Masked, r"(?s)^(?P<left>.*?)\r?\n", any),
            rule("comma", Tier::Secondary, Input::Masked, r"(?s)^(?P<left>.*?),", any),
            rule("dot", Tier::Last, Input::Masked, r"(?s)^(?P<left>.*?)\.", any),
        ]
    })
}

/// A split chosen by the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    pub rule: &'static str,
    pub tier: Tier,
    pub index: usize,
}

/// First rule that matches the gap, by tier then table order
pub fn split_index(gap: &Gap<'_>) -> Option<RuleMatch> {
    rule_table().iter().find_map(|rule| {
        let text = match rule.input {
            Input::Masked => gap.masked(),
            Input::Raw => gap.raw(),
        };
        let index = rule.regex.captures(text)?.name("left")?.end();
        (rule.accept)(gap, index).then_some(RuleMatch {
            rule: rule.name,
            tier: rule.tier,
            index,
        })
    })
}
