//! Change reports: tables comparing key values with defaults or storage.
//!
//! Both reports are pure functions of a builder snapshot. A [`Report`] holds
//! plain cells tagged with a [`Tone`]; colours are applied only by
//! [`Report::render`].

use std::fmt;

use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use crate::builder::Builder;
use crate::error::{DockconfError, Result};
use crate::key::{KeyRef, ValueState, ValueStateList};
use crate::types::KeyType;

const EMPTY: &str = "**EMPTY**";
const UNAVAILABLE: &str = "**UNAVAILABLE**";
const SAME: &str = "  ==  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Plain,
    Green,
    Yellow,
    Magenta,
    /// Highlighted background, used for unchanged markers.
    Marker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub text: String,
    pub tone: Tone,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self::toned(Tone::Plain, text)
    }

    fn toned(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    fn empty() -> Self {
        Self::plain("")
    }

    fn render(&self, width: usize, color: bool) -> String {
        let padded = format!("{:<width$}", self.text);
        if !color {
            return padded;
        }
        match self.tone {
            Tone::Plain => padded,
            Tone::Green => padded.green().to_string(),
            Tone::Yellow => padded.yellow().to_string(),
            Tone::Magenta => padded.magenta().to_string(),
            Tone::Marker => padded.on_red().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Row {
    Group { name: String },
    Line { cells: Vec<Cell>, coarse: bool },
}

/// A change table and its summary counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Keys with at least one changed value.
    pub changed: usize,
    /// Keys holding a value.
    pub total: usize,
}

impl Report {
    fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            changed: 0,
            total: 0,
        }
    }

    pub fn summary(&self) -> String {
        if self.changed > 0 {
            format!("changed {} / {}", self.changed, self.total)
        } else {
            "nothing changed".to_string()
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DockconfError::InvalidValue {
            key: "report".into(),
            reason: e.to_string(),
        })
    }

    /// Render the table with aligned columns, coloured when `color` is set.
    pub fn render(&self, color: bool) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            if let Row::Line { cells, .. } = row {
                for (w, cell) in widths.iter_mut().zip(cells) {
                    *w = (*w).max(cell.text.chars().count());
                }
            }
        }

        let mut out = String::new();
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect();
        out.push_str(header.join(" | ").trim_end());
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("-+-"));
        out.push('\n');

        for row in &self.rows {
            match row {
                Row::Group { name } => {
                    let title = format!("[{name}]");
                    out.push_str(&if color { title.bold().to_string() } else { title });
                }
                Row::Line { cells, coarse } => {
                    let line: Vec<String> = cells
                        .iter()
                        .zip(&widths)
                        .map(|(cell, w)| cell.render(*w, color))
                        .collect();
                    out.push_str(line.join(" | ").trim_end());
                    if *coarse {
                        out.push_str(" (whole value)");
                    }
                }
            }
            out.push('\n');
        }
        out.push_str(&self.summary());
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(false))
    }
}

/// Walks keys in order and lays out rows. Columns 0 and 1 are type and name,
/// the rest hold values.
struct Feed {
    report: Report,
    last_group: Option<String>,
    /// Group of the last frame seen; keys after it are indented.
    frame_group: Option<String>,
}

impl Feed {
    fn new(columns: &[&str]) -> Self {
        Self {
            report: Report::new(columns),
            last_group: None,
            frame_group: None,
        }
    }

    fn value_columns(&self) -> usize {
        self.report.columns.len() - 2
    }

    fn indent(&self, group: &str) -> &'static str {
        if self.frame_group.as_deref() == Some(group) {
            "  "
        } else {
            ""
        }
    }

    fn enter_group(&mut self, group: &str) {
        if self.last_group.as_deref() != Some(group) {
            self.report.rows.push(Row::Group {
                name: group.to_string(),
            });
            self.last_group = Some(group.to_string());
        }
    }

    fn header_row(&mut self, key: &KeyRef<'_>) -> Vec<Cell> {
        let indent = self.indent(&key.group);
        let title = match key.key_type {
            KeyType::Frame | KeyType::Expander => {
                self.frame_group = Some(key.group.clone());
                key.authorised_values
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "[*FRAME NO TITLE*]".to_string())
            }
            KeyType::Separator => format!("{indent}---------"),
            _ => format!("{indent}{}", key.name),
        };
        let mut cells = vec![Cell::plain(key.key_type.to_string()), Cell::plain(title)];
        cells.resize(self.report.columns.len(), Cell::empty());
        cells
    }

    /// Track the frame indentation of a header key, and print it when asked.
    fn header(&mut self, key: &KeyRef<'_>, print: bool) {
        let cells = self.header_row(key);
        if print {
            self.enter_group(&key.group);
            self.report.rows.push(Row::Line {
                cells,
                coarse: false,
            });
        }
    }

    /// Lines of a value key: `values[i]` holds the value cells of element `i`.
    fn value_lines(&mut self, key: &KeyRef<'_>, values: Vec<Vec<Cell>>, coarse: bool) {
        self.enter_group(&key.group);
        let indent = self.indent(&key.group);
        for (i, mut cells) in values.into_iter().enumerate() {
            let (kind, name) = if i == 0 {
                (
                    Cell::toned(Tone::Green, key.key_type.to_string()),
                    Cell::plain(format!("{indent}{}", key.name)),
                )
            } else {
                (
                    Cell::plain(format!("    +value {}", i + 1)),
                    Cell::plain(format!("{indent}   -----")),
                )
            };
            cells.resize(self.value_columns(), Cell::empty());
            let mut line = vec![kind, name];
            line.extend(cells);
            self.report.rows.push(Row::Line { cells: line, coarse });
        }
    }

    fn finish(self, mode: &str) -> Report {
        info!(mode, changed = self.report.changed, total = self.report.total, "{}", self.report.summary());
        self.report
    }
}

fn is_header(key: &KeyRef<'_>) -> bool {
    key.key_type.is_report_header()
}

/// Compare every key with its default value.
///
/// With `show_all` unset, only changed keys are listed and keys without a
/// default are skipped. Otherwise every key is listed, with
/// `**UNAVAILABLE**` when its default can't be read.
pub fn default_report(builder: &Builder, show_all: bool) -> Report {
    let columns: &[&str] = if show_all {
        &["Type", "Name", "Default", "Current"]
    } else {
        &["Type", "Name", "Current"]
    };
    let mut feed = Feed::new(columns);

    builder.key_walk(|key| {
        if is_header(&key) {
            feed.header(&key, show_all);
            return;
        }

        let diff = match key.default_value() {
            Ok(default) => key.value_state(&default),
            Err(e) => {
                debug!(key = %key.path(), error = %e, "no default value");
                if show_all {
                    feed.report.total += 1;
                    let current = key.value().sprint();
                    let values = vec![vec![
                        Cell::toned(Tone::Magenta, UNAVAILABLE),
                        Cell::plain(current),
                    ]];
                    feed.value_lines(&key, values, false);
                }
                return;
            }
        };

        feed.report.total += 1;
        if diff.is_changed() {
            feed.report.changed += 1;
        } else if !show_all {
            return;
        }
        let values = if show_all {
            default_cells(&diff)
        } else {
            changed_cells(&diff)
        };
        feed.value_lines(&key, values, diff.coarse);
    });

    feed.finish("default")
}

fn default_cells(diff: &ValueStateList) -> Vec<Vec<Cell>> {
    diff.fields
        .iter()
        .map(|st| match st.state {
            ValueState::BothEmpty => vec![Cell::plain(EMPTY), Cell::empty()],
            ValueState::Unchanged => vec![Cell::plain(&st.old), Cell::empty()],
            ValueState::Edited if st.new.is_empty() => {
                vec![Cell::plain(&st.old), Cell::toned(Tone::Magenta, EMPTY)]
            }
            ValueState::Edited => vec![Cell::plain(&st.old), Cell::toned(Tone::Green, &st.new)],
            ValueState::Added => vec![Cell::plain(EMPTY), Cell::toned(Tone::Yellow, &st.new)],
            ValueState::Removed => vec![Cell::plain(&st.old), Cell::toned(Tone::Magenta, EMPTY)],
        })
        .collect()
}

fn changed_cells(diff: &ValueStateList) -> Vec<Vec<Cell>> {
    diff.fields
        .iter()
        .map(|st| match st.state {
            ValueState::Edited if !st.new.is_empty() => vec![Cell::plain(&st.new)],
            ValueState::Added => vec![Cell::toned(Tone::Yellow, &st.new)],
            ValueState::Edited | ValueState::Removed => vec![Cell::toned(Tone::Magenta, EMPTY)],
            ValueState::BothEmpty | ValueState::Unchanged => vec![Cell::empty()],
        })
        .collect()
}

/// Compare every key's current value with the value held by storage.
pub fn updated_report(builder: &Builder) -> Report {
    let mut feed = Feed::new(&["Type", "Name", "Old value", "New value"]);

    builder.key_walk(|key| {
        if is_header(&key) {
            feed.header(&key, true);
            return;
        }

        let diff = key.value_state(&key.storage_value());
        feed.report.total += 1;
        if diff.is_changed() {
            feed.report.changed += 1;
        }
        let values = diff
            .fields
            .iter()
            .map(|st| match st.state {
                ValueState::BothEmpty => {
                    vec![Cell::toned(Tone::Magenta, EMPTY), Cell::toned(Tone::Marker, SAME)]
                }
                ValueState::Unchanged => {
                    vec![Cell::plain(&st.old), Cell::toned(Tone::Marker, SAME)]
                }
                ValueState::Edited => {
                    let new = if st.new.is_empty() { EMPTY } else { st.new.as_str() };
                    vec![Cell::plain(&st.old), Cell::toned(Tone::Green, new)]
                }
                ValueState::Added => vec![Cell::plain(EMPTY), Cell::toned(Tone::Green, &st.new)],
                ValueState::Removed => {
                    vec![Cell::plain(&st.old), Cell::toned(Tone::Green, EMPTY)]
                }
            })
            .collect();
        feed.value_lines(&key, values, diff.coarse);
    });

    feed.finish("updated")
}
