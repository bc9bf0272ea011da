//! Comment-preserving codec for the group/key text format.
//!
//! ```text
//! # file header
//! [Icons]
//!
//! #i[16;256] Icon size:
//! size=48
//! name=Dock
//! name[fr]=Dock principal
//! #C Colour of the outline
//! outline=0.1;0.2;0.3;1;
//! ```
//!
//! Values are stored raw, exactly as read, so an untouched document prints
//! back to its original text (up to whitespace around `=`). Comment and blank
//! lines attach to the group or entry that follows them; lines after the last
//! entry are kept as a trailer. Typed access decodes on read and encodes on
//! write, based on the [`ValueKind`] asked for.

use std::path::Path;

use crate::error::{DockconfError, Result};
use crate::value::{Value, ValueKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyFile {
    groups: Vec<Group>,
    trailer: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct Group {
    name: String,
    comment: Vec<String>,
    entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    comment: Vec<String>,
    key: String,
    locale: Option<String>,
    value: String,
}

impl KeyFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DockconfError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&text, path)
    }

    /// Parse a document. `path` is only used to label errors.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let fail = |line: usize, reason: &str| DockconfError::LoadFailed {
            path: path.to_path_buf(),
            line: line + 1,
            reason: reason.to_string(),
        };

        let mut doc = KeyFile::new();
        let mut pending: Vec<String> = Vec::new();
        let mut current: Option<usize> = None;

        for (no, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                pending.push(line.to_string());
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .filter(|n| !n.is_empty() && !n.contains(['[', ']']))
                    .ok_or_else(|| fail(no, "malformed group header"))?;
                // A repeated header reopens its group; comments above it
                // move to the next entry.
                current = Some(match doc.groups.iter().position(|g| g.name == name) {
                    Some(idx) => idx,
                    None => {
                        doc.groups.push(Group {
                            name: name.to_string(),
                            comment: std::mem::take(&mut pending),
                            entries: Vec::new(),
                        });
                        doc.groups.len() - 1
                    }
                });
                continue;
            }

            let (raw_key, value) = line
                .split_once('=')
                .ok_or_else(|| fail(no, "expected a comment, a group or key=value"))?;
            let raw_key = raw_key.trim();
            if raw_key.is_empty() {
                return Err(fail(no, "empty key name"));
            }
            let (key, locale) = split_locale(raw_key);
            let group = current
                .and_then(|idx| doc.groups.get_mut(idx))
                .ok_or_else(|| fail(no, "key outside of a group"))?;
            group.entries.push(Entry {
                comment: std::mem::take(&mut pending),
                key: key.to_string(),
                locale: locale.map(str::to_string),
                value: value.trim_start().to_string(),
            });
        }

        doc.trailer = pending;
        Ok(doc)
    }

    /// Print the document back to text.
    pub fn to_data(&self) -> String {
        let mut out = String::new();
        for group in &self.groups {
            push_lines(&mut out, &group.comment);
            out.push('[');
            out.push_str(&group.name);
            out.push_str("]\n");
            for entry in &group.entries {
                push_lines(&mut out, &entry.comment);
                out.push_str(&entry.key);
                if let Some(locale) = &entry.locale {
                    out.push('[');
                    out.push_str(locale);
                    out.push(']');
                }
                out.push('=');
                out.push_str(&entry.value);
                out.push('\n');
            }
        }
        push_lines(&mut out, &self.trailer);
        out
    }

    /// Group names in file order.
    pub fn groups(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.group(group).is_some()
    }

    /// Key names of a group in file order, translations excluded.
    pub fn keys(&self, group: &str) -> Vec<&str> {
        self.group(group)
            .map(|g| {
                g.entries
                    .iter()
                    .filter(|e| e.locale.is_none())
                    .map(|e| e.key.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_key(&self, group: &str, key: &str) -> bool {
        self.entry(group, key).is_some()
    }

    /// The non-blank comment lines above a key, each without its leading
    /// `#`, joined with newlines.
    pub fn comment(&self, group: &str, key: &str) -> Option<String> {
        let entry = self.entry(group, key)?;
        let lines: Vec<&str> = entry
            .comment
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(|l| l.strip_prefix('#').unwrap_or(l))
            .collect();
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    /// The undecoded text of a value.
    pub fn raw(&self, group: &str, key: &str) -> Option<&str> {
        self.entry(group, key).map(|e| e.value.as_str())
    }

    /// Decode a value as `kind`.
    pub fn get(&self, group: &str, key: &str, kind: ValueKind) -> Result<Value> {
        let raw = self.raw(group, key).ok_or_else(|| DockconfError::KeyMissing {
            group: group.into(),
            name: key.into(),
        })?;
        decode(raw, kind).ok_or_else(|| DockconfError::TypeMismatch {
            key: format!("{group}/{key}"),
            expected: kind,
        })
    }

    /// Encode and store a value, creating the group and key when missing.
    pub fn set(&mut self, group: &str, key: &str, value: &Value) {
        let raw = encode(value);
        let idx = match self.groups.iter().position(|g| g.name == group) {
            Some(idx) => idx,
            None => {
                self.groups.push(Group {
                    name: group.to_string(),
                    comment: Vec::new(),
                    entries: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        let entries = &mut self.groups[idx].entries;
        match entries
            .iter_mut()
            .find(|e| e.key == key && e.locale.is_none())
        {
            Some(entry) => entry.value = raw,
            None => entries.push(Entry {
                comment: Vec::new(),
                key: key.to_string(),
                locale: None,
                value: raw,
            }),
        }
    }

    fn group(&self, group: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == group)
    }

    fn entry(&self, group: &str, key: &str) -> Option<&Entry> {
        self.group(group)?
            .entries
            .iter()
            .find(|e| e.key == key && e.locale.is_none())
    }
}

fn push_lines(out: &mut String, lines: &[String]) {
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
}

/// `name[fr]` → (`name`, `Some("fr")`).
fn split_locale(raw: &str) -> (&str, Option<&str>) {
    if let Some(stripped) = raw.strip_suffix(']')
        && let Some((key, locale)) = stripped.split_once('[')
    {
        return (key.trim_end(), Some(locale));
    }
    (raw, None)
}

/// Decode raw text as `kind`. A scalar written as a one-item list is accepted.
pub fn decode(raw: &str, kind: ValueKind) -> Option<Value> {
    if kind.is_list() {
        let items = split_list(raw);
        return Some(match kind {
            ValueKind::ListBool => Value::ListBool(parse_all(&items, parse_bool)?),
            ValueKind::ListInt => Value::ListInt(parse_all(&items, |s| s.trim().parse().ok())?),
            ValueKind::ListFloat => {
                Value::ListFloat(parse_all(&items, |s| s.trim().parse().ok())?)
            }
            _ => Value::ListString(items),
        });
    }

    let scalar = match kind {
        ValueKind::Bool => parse_bool(raw).map(Value::Bool),
        ValueKind::Int => raw.trim().parse().ok().map(Value::Int),
        ValueKind::Float => raw.trim().parse().ok().map(Value::Float),
        _ => Some(Value::String(unescape(raw))),
    };
    scalar.or_else(|| decode(raw, kind.as_list())?.coerce(kind))
}

fn parse_all<T>(items: &[String], parse: impl Fn(&str) -> Option<T>) -> Option<Vec<T>> {
    items.iter().map(|s| parse(s)).collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Encode a value to its raw text. Lists end with a separator.
pub fn encode(value: &Value) -> String {
    fn list<T: ToString>(items: &[T]) -> String {
        items
            .iter()
            .map(|i| format!("{};", escape(&i.to_string(), true)))
            .collect()
    }
    match value {
        Value::String(s) => escape(s, false),
        Value::ListBool(l) => list(l),
        Value::ListInt(l) => list(l),
        Value::ListFloat(l) => list(l),
        Value::ListString(l) => list(l),
        scalar => scalar.sprint(),
    }
}

fn escape(s: &str, in_list: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        match c {
            ' ' if i == 0 => out.push_str("\\s"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            ';' if in_list => out.push_str("\\;"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(';') => out.push(';'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split on unescaped `;`, unescaping each item. A trailing separator does
/// not produce an empty last item.
fn split_list(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in raw.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ';' {
            items.push(unescape(&current));
            current.clear();
        } else {
            current.push(c);
        }
    }
    if escaped {
        current.push('\\');
    }
    if !current.is_empty() {
        items.push(unescape(&current));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
# Dock configuration
[Position]

#F[Position;gtk-fullscreen]
frame_pos=
#l[bottom;top;right;left] Screen border:
screen border=0
#e[0;1] Alignment {Relative position on the screen}
alignment = 0.5

[Icons]
#s Name of the dock
name=Main dock
name[fr]=Dock principal
#T Icon order
order=launchers;applets;separators;
# end of file
";

    fn doc() -> KeyFile {
        KeyFile::parse(DOC, Path::new("dock.conf")).unwrap()
    }

    #[test]
    fn groups_and_keys_in_file_order() {
        let kf = doc();
        assert_eq!(kf.groups(), vec!["Position", "Icons"]);
        assert_eq!(
            kf.keys("Position"),
            vec!["frame_pos", "screen border", "alignment"]
        );
        assert_eq!(kf.keys("Icons"), vec!["name", "order"]);
    }

    #[test]
    fn round_trip_normalises_only_whitespace() {
        let out = doc().to_data();
        assert_eq!(out, DOC.replace("alignment = 0.5", "alignment=0.5"));
    }

    #[test]
    fn comments_attach_to_following_key() {
        let kf = doc();
        assert_eq!(
            kf.comment("Position", "alignment").as_deref(),
            Some("e[0;1] Alignment {Relative position on the screen}")
        );
        assert_eq!(
            kf.comment("Position", "frame_pos").as_deref(),
            Some("F[Position;gtk-fullscreen]")
        );
    }

    #[test]
    fn multi_line_comment_drops_every_marker() {
        let kf = KeyFile::parse(
            "[G]\n#i[-2000;2000] Offset from the edge\n#{Gap from the edge, in pixels.}\nx=3\n",
            Path::new("dock.conf"),
        )
        .unwrap();
        assert_eq!(
            kf.comment("G", "x").as_deref(),
            Some("i[-2000;2000] Offset from the edge\n{Gap from the edge, in pixels.}")
        );
    }

    #[test]
    fn repeated_header_merges_into_first_group() {
        let kf = KeyFile::parse(
            "[A]\none=1\n[B]\ntwo=2\n# about three\n[A]\nthree=3\n",
            Path::new("dock.conf"),
        )
        .unwrap();
        assert_eq!(kf.groups(), vec!["A", "B"]);
        assert_eq!(kf.keys("A"), vec!["one", "three"]);
        assert_eq!(kf.get("A", "three", ValueKind::Int).unwrap(), Value::Int(3));
        assert_eq!(kf.comment("A", "three").as_deref(), Some(" about three"));
    }

    #[test]
    fn typed_reads() {
        let kf = doc();
        assert_eq!(
            kf.get("Position", "screen border", ValueKind::Int).unwrap(),
            Value::Int(0)
        );
        assert_eq!(
            kf.get("Position", "alignment", ValueKind::Float).unwrap(),
            Value::Float(0.5)
        );
        assert_eq!(
            kf.get("Icons", "order", ValueKind::ListString).unwrap(),
            Value::from(vec!["launchers", "applets", "separators"])
        );
        assert_eq!(
            kf.get("Icons", "name", ValueKind::String).unwrap(),
            Value::from("Main dock")
        );
    }

    #[test]
    fn read_errors() {
        let kf = doc();
        assert!(matches!(
            kf.get("Icons", "missing", ValueKind::String),
            Err(DockconfError::KeyMissing { .. })
        ));
        assert!(matches!(
            kf.get("Icons", "name", ValueKind::Int),
            Err(DockconfError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn scalar_and_singleton_list_interchange() {
        assert_eq!(decode("5", ValueKind::ListInt), Some(Value::ListInt(vec![5])));
        assert_eq!(decode("5;", ValueKind::Int), Some(Value::Int(5)));
        assert_eq!(decode("1;2;", ValueKind::Int), None);
    }

    #[test]
    fn bools_accept_numeric_forms() {
        assert_eq!(decode("1", ValueKind::Bool), Some(Value::Bool(true)));
        assert_eq!(decode("false", ValueKind::Bool), Some(Value::Bool(false)));
        assert_eq!(decode("yes", ValueKind::Bool), None);
    }

    #[test]
    fn set_updates_in_place_and_appends() {
        let mut kf = doc();
        kf.set("Position", "alignment", &Value::Float(1.0));
        kf.set("Icons", "size", &Value::ListInt(vec![48, 48]));
        kf.set("New", "flag", &Value::Bool(true));
        let out = kf.to_data();
        assert!(out.contains("alignment=1\n"));
        assert!(out.contains("order=launchers;applets;separators;\nsize=48;48;\n"));
        assert!(out.ends_with("[New]\nflag=true\n# end of file\n"));
        // Translations are untouched.
        assert!(out.contains("name[fr]=Dock principal"));
    }

    #[test]
    fn escapes_survive_a_round_trip() {
        let value = Value::from(vec![" lead", "semi;colon", "back\\slash", "two\nlines"]);
        let raw = encode(&value);
        assert_eq!(decode(&raw, ValueKind::ListString), Some(value));

        let text = Value::from(" padded\ttext");
        assert_eq!(decode(&encode(&text), ValueKind::String), Some(text));
    }

    #[test]
    fn empty_list() {
        assert_eq!(
            decode("", ValueKind::ListString),
            Some(Value::ListString(vec![]))
        );
    }

    #[test]
    fn parse_errors_report_line() {
        let err = KeyFile::parse("#not a comment\ngarbage", Path::new("bad.conf")).unwrap_err();
        match err {
            DockconfError::LoadFailed { path, line, .. } => {
                assert_eq!(path, Path::new("bad.conf"));
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(KeyFile::parse("key=value\n", Path::new("x")).is_err());
        assert!(KeyFile::parse("[Open\n", Path::new("x")).is_err());
        assert!(KeyFile::parse("[G]\n=value\n", Path::new("x")).is_err());
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dock.conf");
        std::fs::write(&path, DOC).unwrap();
        assert_eq!(KeyFile::load(&path).unwrap(), doc());

        let missing = KeyFile::load(&dir.path().join("nope.conf")).unwrap_err();
        assert!(matches!(missing, DockconfError::Io { .. }));
    }
}
