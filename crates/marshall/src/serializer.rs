//! Rendering mappings to text.
//!
//! Backends differ in how faithfully they serialize: quote style, declaration,
//! self-closing tags, indentation. [`correct`] normalizes any backend's output
//! to one canonical layout, so the rendered text does not depend on which
//! backend produced it.

use crate::error::{Error, Result};
use crate::mapping::Mapping;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The declaration every rendered document starts with.
pub const CANONICAL_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const INDENT: &str = "  ";

impl Mapping {
    /// Render the tree through the backend and correct the result.
    pub fn to_xml_string(&self) -> Result<String> {
        let raw = self
            .backend
            .serialize(&self.document)
            .map_err(Error::Serialize)?;
        Ok(correct(&raw))
    }

    /// Write the rendered document to `path`, replacing any existing file.
    ///
    /// The text is written to a temporary file next to `path` and renamed into
    /// place, so `path` never holds a partial document.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_xml_string()?;
        write_atomic(path, &content)?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "Exported document");
        Ok(())
    }

    /// Like [`export`](Self::export), but fails with
    /// [`Error::AlreadyExists`] instead of replacing an existing file.
    ///
    /// The temporary file is hard-linked into place, so a file that appears at
    /// `path` while exporting is never replaced.
    pub fn export_new(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_xml_string()?;
        write_new(path, &content)?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "Exported new document");
        Ok(())
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_xml_string().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = write_temp(path, content)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io(path, err));
    }
    Ok(())
}

fn write_new(path: &Path, content: &str) -> Result<()> {
    let tmp = write_temp(path, content)?;
    let linked = fs::hard_link(&tmp, path);
    let _ = fs::remove_file(&tmp);
    match linked {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Err(Error::AlreadyExists {
            path: path.to_path_buf(),
        }),
        Err(err) => Err(Error::io(path, err)),
    }
}

fn write_temp(path: &Path, content: &str) -> Result<PathBuf> {
    let tmp = temp_path_next_to(path);
    if let Err(err) = fs::write(&tmp, content) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io(tmp, err));
    }
    Ok(tmp)
}

fn temp_path_next_to(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document.xml");
    path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()))
}

/// Normalize serialized XML to the canonical layout.
///
/// - the declaration is replaced by (or prefixed with) [`CANONICAL_DECLARATION`]
/// - attribute values are double-quoted and separated by single spaces
/// - `<a />` and `<a></a>` become `<a/>`
/// - one element per line, indented by two spaces per level; a leaf element's
///   content (text, CDATA, comments) stays inline and untouched, mixed-content
///   text is trimmed and kept after the start tag
/// - comments, processing instructions, and doctypes between elements get
///   their own lines
///
/// The result ends with a newline and parses to the same tree as the input.
/// Applying the pass again changes nothing. Input that quick-xml rejects is
/// returned unchanged.
pub fn correct(input: &str) -> String {
    let Some(tokens) = tokenize(input) else {
        tracing::debug!("Serialized output could not be tokenized, leaving it unchanged");
        return input.to_string();
    };
    let output = render(&tokens);
    if output != input {
        tracing::debug!(before = input.len(), after = output.len(), "Corrected serialized output");
    }
    output
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Start tag with its attributes already normalized (` a="1" b="2"`).
    Start { name: String, attributes: String },
    Empty { name: String, attributes: String },
    End(String),
    /// Character data as it appears in the source, still escaped.
    Text(String),
    CData(String),
    /// Comment or processing instruction, as markup.
    Markup(String),
    Doctype(String),
}

impl Token {
    /// Markup of a token that can sit inside a leaf element.
    fn leaf_markup(&self) -> Option<String> {
        match self {
            Token::Text(text) => Some(text.clone()),
            Token::CData(content) => Some(format!("<![CDATA[{}]]>", content)),
            Token::Markup(markup) => Some(markup.clone()),
            _ => None,
        }
    }
}

fn tokenize(input: &str) -> Option<Vec<Token>> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;

    let mut tokens = Vec::new();
    let mut depth = 0usize;
    loop {
        let token = match reader.read_event().ok()? {
            Event::Decl(_) => continue,
            Event::Start(e) => {
                depth += 1;
                Token::Start {
                    name: tag_name(e.name().as_ref())?,
                    attributes: normalize_attributes(&e)?,
                }
            }
            Event::Empty(e) => Token::Empty {
                name: tag_name(e.name().as_ref())?,
                attributes: normalize_attributes(&e)?,
            },
            Event::End(e) => {
                depth = depth.checked_sub(1)?;
                Token::End(tag_name(e.name().as_ref())?)
            }
            Event::Text(e) => Token::Text(utf8(&e)?),
            Event::CData(e) => Token::CData(utf8(&e)?),
            Event::Comment(e) => Token::Markup(format!("<!--{}-->", utf8(&e)?)),
            Event::PI(e) => Token::Markup(format!("<?{}?>", utf8(&e)?)),
            Event::DocType(e) => Token::Doctype(format!("<!DOCTYPE {}>", utf8(&e)?.trim_start())),
            Event::Eof => break,
        };
        tokens.push(token);
    }
    (depth == 0).then_some(tokens)
}

fn utf8(bytes: &[u8]) -> Option<String> {
    std::str::from_utf8(bytes).ok().map(str::to_string)
}

fn tag_name(name: &[u8]) -> Option<String> {
    std::str::from_utf8(name)
        .ok()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Rewrite the attribute list as ` a="1" b="2"`, keeping each value's
/// escaping and escaping any literal `"` picked up from single quotes.
fn normalize_attributes(start: &BytesStart<'_>) -> Option<String> {
    let mut out = String::new();
    for attribute in start.attributes() {
        let attribute = attribute.ok()?;
        let name = std::str::from_utf8(attribute.key.as_ref()).ok()?;
        let value = std::str::from_utf8(&attribute.value).ok()?;

        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
    Some(out)
}

/// Inline content of a leaf element.
///
/// When the character data is blank the element has no text, so blank text
/// runs are dropped. Otherwise everything is kept byte for byte.
fn leaf_content(run: &[Token]) -> String {
    let blank = run.iter().all(|token| match token {
        Token::Text(text) | Token::CData(text) => text.trim().is_empty(),
        _ => true,
    });
    run.iter()
        .filter(|token| !(blank && matches!(token, Token::Text(_))))
        .filter_map(Token::leaf_markup)
        .collect()
}

fn render(tokens: &[Token]) -> String {
    let mut lines = vec![CANONICAL_DECLARATION.to_string()];
    let mut depth = 0usize;
    let mut push = |depth: usize, line: &str| lines.push(INDENT.repeat(depth) + line);

    let mut index = 0;
    while index < tokens.len() {
        match &tokens[index] {
            Token::Start { name, attributes } => {
                let run = tokens[index + 1..]
                    .iter()
                    .take_while(|token| token.leaf_markup().is_some())
                    .count();
                let after_run = index + 1 + run;

                if let Some(Token::End(end)) = tokens.get(after_run) {
                    let content = leaf_content(&tokens[index + 1..after_run]);
                    if content.is_empty() {
                        push(depth, &format!("<{}{}/>", name, attributes));
                    } else {
                        push(depth, &format!("<{}{}>{}</{}>", name, attributes, content, end));
                    }
                    index = after_run + 1;
                    continue;
                }

                match tokens.get(index + 1) {
                    Some(Token::Text(text)) => {
                        push(depth, &format!("<{}{}>{}", name, attributes, text.trim()));
                        index += 1;
                    }
                    _ => push(depth, &format!("<{}{}>", name, attributes)),
                }
                depth += 1;
            }
            Token::Empty { name, attributes } => {
                push(depth, &format!("<{}{}/>", name, attributes));
            }
            Token::End(name) => {
                depth = depth.saturating_sub(1);
                push(depth, &format!("</{}>", name));
            }
            Token::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    push(depth, text);
                }
            }
            Token::CData(content) => push(depth, &format!("<![CDATA[{}]]>", content)),
            Token::Markup(markup) | Token::Doctype(markup) => push(depth, markup),
        }
        index += 1;
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}
