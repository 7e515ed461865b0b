/// Formatter gate
///
/// Every generated file passes through a formatter chosen by its extension
/// before it leaves the compiler. Formatting only touches presentation; a
/// file that cannot be formatted fails the whole compilation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::driver::OutputFile;
use crate::error::{CompileError, Result};

/// Why a source text could not be formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    /// 1-based line the problem was detected on.
    pub line: usize,
    pub message: String,
}

impl FormatError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for FormatError {}

/// A canonical formatter for one kind of source file.
pub trait SourceFormatter: Send + Sync {
    fn format(&self, source: &str) -> std::result::Result<String, FormatError>;
}

/// Selects a formatter per file extension and applies it.
#[derive(Clone)]
pub struct FormatterGate {
    formatters: BTreeMap<String, Arc<dyn SourceFormatter>>,
}

impl FormatterGate {
    /// A gate with no formatters; every file is rejected.
    pub fn empty() -> Self {
        Self {
            formatters: BTreeMap::new(),
        }
    }

    /// Install `formatter` for files ending in `.{extension}`.
    pub fn with_formatter(mut self, extension: impl Into<String>, formatter: Arc<dyn SourceFormatter>) -> Self {
        self.formatters.insert(extension.into(), formatter);
        self
    }

    /// Format one file's contents, naming the file in any error.
    pub fn format_file(&self, file: OutputFile) -> Result<OutputFile> {
        let extension = file.path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
        let formatter = self.formatters.get(extension).ok_or_else(|| {
            CompileError::formatting(&file.path, format!("no formatter for extension '{}'", extension))
        })?;
        let contents = formatter
            .format(&file.contents)
            .map_err(|e| CompileError::formatting(&file.path, e.to_string()))?;
        tracing::debug!(path = %file.path, bytes = contents.len(), "formatted");
        Ok(OutputFile { contents, ..file })
    }
}

impl Default for FormatterGate {
    /// The script formatter for every JavaScript and TypeScript extension.
    fn default() -> Self {
        let script: Arc<dyn SourceFormatter> = Arc::new(ScriptFormatter::default());
        ["js", "mjs", "cjs", "ts", "mts", "cts", "tsx", "jsx"]
            .into_iter()
            .fold(Self::empty(), |gate, ext| gate.with_formatter(ext, script.clone()))
    }
}

impl fmt::Debug for FormatterGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterGate")
            .field("extensions", &self.formatters.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Formatter for JavaScript and TypeScript sources.
///
/// - Re-indents by bracket nesting; brackets opened on the same line count
///   as one level
/// - Trims trailing whitespace and collapses blank-line runs
/// - Drops blank lines at the start of a block and the end of the file
/// - Rewrites single-quoted strings to double quotes when no escaping is
///   needed
/// - Rejects unbalanced brackets and unterminated strings or comments
#[derive(Debug, Clone)]
pub struct ScriptFormatter {
    /// Spaces per indentation level
    pub indent_width: usize,
}

impl Default for ScriptFormatter {
    fn default() -> Self {
        Self { indent_width: 2 }
    }
}

/// Lexical state carried from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lex {
    Code,
    BlockComment,
    Template,
}

impl SourceFormatter for ScriptFormatter {
    fn format(&self, source: &str) -> std::result::Result<String, FormatError> {
        let mut output = String::with_capacity(source.len());
        // Open brackets with the line they were opened on
        let mut stack: Vec<(char, usize)> = Vec::new();
        let mut state = Lex::Code;
        let mut pending_blank = false;
        let mut line_no = 0;

        for raw in source.lines() {
            line_no += 1;

            if state == Lex::Template {
                // Template literal bodies are kept verbatim.
                let scanned = scan_line(raw, line_no, state, &mut stack)?;
                state = scanned.state;
                output.push_str(raw.trim_end());
                output.push('\n');
                continue;
            }

            let trimmed = raw.trim();
            if trimmed.is_empty() {
                pending_blank = !output.is_empty();
                continue;
            }

            let starts_in_comment = state == Lex::BlockComment;
            let scanned = scan_line(trimmed, line_no, state, &mut stack)?;
            state = scanned.state;

            let starts_with_closer = trimmed.starts_with(['}', ')', ']']);
            let after_opener = output.trim_end().ends_with(['{', '(', '[']);
            if pending_blank && !starts_with_closer && !after_opener {
                output.push('\n');
            }
            pending_blank = false;

            let indent = " ".repeat(scanned.indent * self.indent_width);
            output.push_str(&indent);
            if starts_in_comment && scanned.body.starts_with('*') {
                output.push(' ');
            }
            output.push_str(&scanned.body);
            output.push('\n');
        }

        match state {
            Lex::Code => {}
            Lex::BlockComment => return Err(FormatError::new(line_no, "unterminated block comment")),
            Lex::Template => return Err(FormatError::new(line_no, "unterminated template literal")),
        }
        if let Some((open, line)) = stack.last() {
            return Err(FormatError::new(line_no, format!("unclosed '{}' opened on line {}", open, line)));
        }

        Ok(output)
    }
}

struct ScannedLine {
    /// Line contents with string quotes normalized
    body: String,
    /// Indentation level for this line
    indent: usize,
    /// Lexical state at the end of the line
    state: Lex,
}

/// Number of indentation levels the open brackets account for.
fn depth(stack: &[(char, usize)]) -> usize {
    let mut levels = 0;
    let mut last_line = None;
    for (_, line) in stack {
        if last_line != Some(*line) {
            levels += 1;
            last_line = Some(*line);
        }
    }
    levels
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn scan_line(
    line: &str,
    line_no: usize,
    mut state: Lex,
    stack: &mut Vec<(char, usize)>,
) -> std::result::Result<ScannedLine, FormatError> {
    let chars: Vec<char> = line.chars().collect();
    let mut body = String::with_capacity(line.len());
    let mut indent = None;
    let mut i = 0;

    if state != Lex::Code {
        indent = Some(depth(stack));
    }

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match state {
            Lex::BlockComment => {
                if c == '*' && next == Some('/') {
                    body.push_str("*/");
                    i += 2;
                    state = Lex::Code;
                } else {
                    body.push(c);
                    i += 1;
                }
                continue;
            }
            Lex::Template => {
                body.push(c);
                if c == '\\' {
                    if let Some(n) = next {
                        body.push(n);
                    }
                    i += 2;
                    continue;
                }
                if c == '`' {
                    state = Lex::Code;
                }
                i += 1;
                continue;
            }
            Lex::Code => {}
        }

        let is_closer = matches!(c, ')' | ']' | '}');
        if indent.is_none() && !is_closer && !c.is_whitespace() {
            indent = Some(depth(stack));
        }

        match c {
            '/' if next == Some('/') => {
                body.extend(&chars[i..]);
                break;
            }
            '/' if next == Some('*') => {
                body.push_str("/*");
                state = Lex::BlockComment;
                i += 2;
            }
            '"' | '\'' => {
                let (literal, end) = read_string(&chars, i, line_no)?;
                body.push_str(&normalize_quotes(&literal));
                i = end;
            }
            '`' => {
                body.push(c);
                state = Lex::Template;
                i += 1;
            }
            '(' | '[' | '{' => {
                stack.push((c, line_no));
                body.push(c);
                i += 1;
            }
            ')' | ']' | '}' => {
                match stack.pop() {
                    Some((open, _)) if closing_for(open) == c => {}
                    Some((open, line)) => {
                        return Err(FormatError::new(
                            line_no,
                            format!("found '{}' but '{}' from line {} is still open", c, open, line),
                        ));
                    }
                    None => return Err(FormatError::new(line_no, format!("unmatched '{}'", c))),
                }
                body.push(c);
                i += 1;
            }
            _ => {
                body.push(c);
                i += 1;
            }
        }
    }

    Ok(ScannedLine {
        body,
        indent: indent.unwrap_or_else(|| depth(stack)),
        state,
    })
}

/// Read a quoted string starting at `start`; returns the literal including
/// quotes and the index just past it.
fn read_string(chars: &[char], start: usize, line_no: usize) -> std::result::Result<(String, usize), FormatError> {
    let quote = chars[start];
    let mut literal = String::new();
    literal.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        literal.push(c);
        if c == '\\' {
            if let Some(&escaped) = chars.get(i + 1) {
                literal.push(escaped);
            }
            i += 2;
            continue;
        }
        if c == quote {
            return Ok((literal, i + 1));
        }
        i += 1;
    }
    Err(FormatError::new(line_no, "unterminated string literal"))
}

/// Prefer double quotes unless the content already contains one.
fn normalize_quotes(literal: &str) -> String {
    if !literal.starts_with('\'') {
        return literal.to_string();
    }
    let inner = &literal[1..literal.len() - 1];
    if inner.contains('"') {
        return literal.to_string();
    }
    format!("\"{}\"", inner.replace("\\'", "'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(source: &str) -> String {
        ScriptFormatter::default().format(source).unwrap()
    }

    fn fmt_err(source: &str) -> FormatError {
        ScriptFormatter::default().format(source).unwrap_err()
    }

    #[test]
    fn test_reindents_by_nesting() {
        let source = "export const a = z.object({\n\"x\": z.object({\n\"y\": z.string()\n})\n});\n";
        assert_eq!(
            fmt(source),
            "export const a = z.object({\n  \"x\": z.object({\n    \"y\": z.string()\n  })\n});\n"
        );
    }

    #[test]
    fn test_trims_and_collapses_blank_lines() {
        let source = "\n\n   import { z } from 'zod';   \n\n\n\nconst a = 1;\n\n";
        assert_eq!(fmt(source), "import { z } from \"zod\";\n\nconst a = 1;\n");
    }

    #[test]
    fn test_drops_blank_lines_at_block_edges() {
        let source = "const a = {\n\n  b: 1,\n\n};\n";
        assert_eq!(fmt(source), "const a = {\n  b: 1,\n};\n");
    }

    #[test]
    fn test_quote_normalization() {
        assert_eq!(fmt("a('it\\'s');\n"), "a(\"it's\");\n");
        assert_eq!(fmt("a('say \"hi\"');\n"), "a('say \"hi\"');\n");
        assert_eq!(fmt("a(\"{ not a brace\");\n"), "a(\"{ not a brace\");\n");
    }

    #[test]
    fn test_comments_are_not_scanned_for_brackets() {
        let source = "// a { comment\n/* another (\n * line\n */\nconst a = 1;\n";
        assert_eq!(fmt(source), "// a { comment\n/* another (\n * line\n */\nconst a = 1;\n");
    }

    #[test]
    fn test_idempotent() {
        let source = "export const p = {\nname: 'x',\ntools: [\n{\nname: \"a\"\n}\n],\n};\n";
        let once = fmt(source);
        assert_eq!(fmt(&once), once);
    }

    #[test]
    fn test_rejects_unbalanced_input() {
        assert_eq!(fmt_err("const a = {\n").message, "unclosed '{' opened on line 1");
        assert!(fmt_err("foo(]\n").message.contains("still open"));
        assert_eq!(fmt_err("}\n").message, "unmatched '}'");
        assert_eq!(fmt_err("const s = \"abc;\n").message, "unterminated string literal");
        assert_eq!(fmt_err("/* open\n").message, "unterminated block comment");
    }

    #[test]
    fn test_gate_rejects_unknown_extension() {
        let gate = FormatterGate::default();
        let file = OutputFile::new("typescript", "notes.md", "# hi");
        match gate.format_file(file) {
            Err(CompileError::Formatting { path, message }) => {
                assert_eq!(path, "notes.md");
                assert!(message.contains("'md'"));
            }
            other => panic!("expected formatting error, got {:?}", other),
        }
    }

    #[test]
    fn test_gate_names_failing_file() {
        let gate = FormatterGate::default();
        let file = OutputFile::new("node", "broken.js", "const a = (;\n");
        match gate.format_file(file) {
            Err(CompileError::Formatting { path, .. }) => assert_eq!(path, "broken.js"),
            other => panic!("expected formatting error, got {:?}", other),
        }
    }
}
