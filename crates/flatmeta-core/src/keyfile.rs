//! Reader for Flatpak `metadata` files.
//!
//! The format is the GLib key file: `[Group]` headers, `key=value` entries and `#`
//! comments. Values stay raw until read through one of the typed accessors, which
//! apply the GLib unescaping and list-splitting rules.

use std::str::FromStr;

use miette::Diagnostic;
use thiserror::Error;

const LIST_SEPARATOR: char = ';';

#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum KeyfileError {
    #[error("Key file is not valid UTF-8")]
    #[diagnostic(code(flatmeta::keyfile::encoding))]
    NotUtf8,

    #[error("Key file does not start with a group (line {line})")]
    #[diagnostic(code(flatmeta::keyfile::no_group))]
    NoGroup { line: usize },

    #[error("Key file contains line {line} '{content}' which is not a key-value pair, group, or comment")]
    #[diagnostic(code(flatmeta::keyfile::syntax))]
    InvalidLine { line: usize, content: String },

    #[error("Key file does not have group '{0}'")]
    #[diagnostic(code(flatmeta::keyfile::group_not_found))]
    GroupNotFound(String),

    #[error("Key file does not have key '{key}' in group '{group}'")]
    #[diagnostic(code(flatmeta::keyfile::key_not_found))]
    KeyNotFound { group: String, key: String },

    #[error("Value '{value}' of key '{key}' in group '{group}' cannot be read as {expected}")]
    #[diagnostic(code(flatmeta::keyfile::invalid_value))]
    InvalidValue {
        group: String,
        key: String,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Group {
    name: String,
    entries: Vec<(String, String)>,
}

impl Group {
    fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }
}

/// A parsed key file. Group and key order follow the first appearance in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFile {
    groups: Vec<Group>,
}

impl KeyFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, KeyfileError> {
        std::str::from_utf8(bytes)
            .map_err(|_| KeyfileError::NotUtf8)?
            .parse()
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.name.as_str())
    }

    pub fn keys(&self, group: &str) -> Result<impl Iterator<Item = &str>, KeyfileError> {
        Ok(self.group(group)?.entries.iter().map(|(key, _)| key.as_str()))
    }

    /// The value exactly as written, without unescaping.
    pub fn raw_value(&self, group: &str, key: &str) -> Result<&str, KeyfileError> {
        self.group(group)?
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| {
                KeyfileError::KeyNotFound {
                    group: group.to_string(),
                    key: key.to_string(),
                }
            })
    }

    pub fn string(&self, group: &str, key: &str) -> Result<String, KeyfileError> {
        let raw = self.raw_value(group, key)?;
        unescape(raw, false)
            .map(|mut pieces| pieces.pop().unwrap_or_default())
            .ok_or_else(|| invalid(group, key, raw, "a string"))
    }

    pub fn boolean(&self, group: &str, key: &str) -> Result<bool, KeyfileError> {
        let raw = self.raw_value(group, key)?;
        match raw.trim_end() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(invalid(group, key, raw, "a boolean")),
        }
    }

    pub fn integer(&self, group: &str, key: &str) -> Result<i32, KeyfileError> {
        let raw = self.raw_value(group, key)?;
        raw.trim_end()
            .parse::<i32>()
            .map_err(|_| invalid(group, key, raw, "an integer"))
    }

    pub fn string_list(&self, group: &str, key: &str) -> Result<Vec<String>, KeyfileError> {
        let raw = self.raw_value(group, key)?;
        unescape(raw, true).ok_or_else(|| invalid(group, key, raw, "a string list"))
    }

    fn group(&self, name: &str) -> Result<&Group, KeyfileError> {
        self.groups
            .iter()
            .find(|group| group.name == name)
            .ok_or_else(|| KeyfileError::GroupNotFound(name.to_string()))
    }
}

impl FromStr for KeyFile {
    type Err = KeyfileError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let mut keyfile = KeyFile::default();
        let mut current: Option<usize> = None;

        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim_start();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line
                .trim_end()
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                if name.is_empty() || name.contains(['[', ']']) {
                    return Err(KeyfileError::InvalidLine {
                        line: line_no,
                        content: line.to_string(),
                    });
                }
                current = Some(match keyfile.groups.iter().position(|g| g.name == name) {
                    Some(position) => position,
                    None => {
                        keyfile.groups.push(Group {
                            name: name.to_string(),
                            entries: Vec::new(),
                        });
                        keyfile.groups.len() - 1
                    }
                });
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(KeyfileError::InvalidLine {
                    line: line_no,
                    content: line.to_string(),
                });
            };
            let key = key.trim_end();
            if key.is_empty() {
                return Err(KeyfileError::InvalidLine {
                    line: line_no,
                    content: line.to_string(),
                });
            }

            let Some(group) = current else {
                return Err(KeyfileError::NoGroup {
                    line: line_no,
                });
            };
            keyfile.groups[group].set(key, value.trim_start());
        }

        Ok(keyfile)
    }
}

fn invalid(group: &str, key: &str, value: &str, expected: &'static str) -> KeyfileError {
    KeyfileError::InvalidValue {
        group: group.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

/// Applies GLib escapes. With `split`, unescaped `;` separate items and a trailing
/// empty item is dropped; without it the whole value is returned as one piece.
fn unescape(raw: &str, split: bool) -> Option<Vec<String>> {
    let mut pieces = Vec::new();
    let mut current = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = match chars.next()? {
                    's' => ' ',
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '\\' => '\\',
                    LIST_SEPARATOR if split => LIST_SEPARATOR,
                    _ => return None,
                };
                current.push(escaped);
            }
            LIST_SEPARATOR if split => pieces.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if !split || !current.is_empty() {
        pieces.push(current);
    }
    Some(pieces)
}
