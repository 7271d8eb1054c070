//! Indentation correction for text moved to a new enclosing context

/// Rewrite the indentation of every line after the first
///
/// Lines starting with `from` get that prefix replaced by `to`. Blank lines
/// and lines indented less than `from` are kept as they are.
pub fn reindent(text: &str, from: &str, to: &str) -> String {
    if from == to || !text.contains('\n') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.trim().is_empty() {
                if let Some(rest) = line.strip_prefix(from) {
                    out.push_str(to);
                    out.push_str(rest);
                    continue;
                }
            }
        }
        out.push_str(line);
    }
    out
}

/// Indent every line after the first by `indent`
pub fn indent_lines(text: &str, indent: &str) -> String {
    reindent(text, "", indent)
}
