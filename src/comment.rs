//! Key comment parser.
//!
//! A key's preceding comment carries its metadata:
//!
//! ```text
//! #l-[small;medium;large] Icon size:/ {Size of the icons in the dock}
//!  ^^ ^                   ^          ^ ^
//!  || authorised values   label      | tooltip
//!  |modifiers                        vertical alignment
//!  type glyph
//! ```
//!
//! Grammar: `type modifier* cardinality? authorised? text tooltip?`.

use tracing::{debug, warn};

use crate::types::{DisplayMode, KeyType};

/// Metadata decoded from a key comment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyBase {
    pub key_type: Option<KeyType>,
    pub nb_elements: usize,
    pub authorised_values: Vec<String>,
    /// Sign modifiers (`-`, `+`) in their original order.
    pub modifiers: String,
    pub display_mode: DisplayMode,
    pub aligned_vertical: bool,
    pub text: String,
    pub tooltip: String,
}

/// Parse a raw key comment. Returns `None` for comments that do not describe
/// a key (too short, group icon comments, unknown glyphs).
pub fn parse_key_comment(comment: &str) -> Option<KeyBase> {
    // Continuation lines may still carry their own `#`.
    let joined = comment
        .lines()
        .map(|l| l.strip_prefix('#').unwrap_or(l))
        .collect::<Vec<_>>()
        .join("\n");
    let useful = joined
        .trim_start_matches(['#', ' ', '\n'])
        .trim_end_matches('\n');

    if useful.chars().count() < 2 {
        debug!(comment, "dropped short comment");
        return None;
    }
    if useful.starts_with('[') {
        // Group icon comment leaking onto the first key.
        debug!(comment, "dropped group comment");
        return None;
    }

    let mut chars = useful.chars();
    let glyph = chars.next()?;
    let Some(key_type) = KeyType::from_glyph(glyph) else {
        warn!(%glyph, comment, "unknown key type");
        return None;
    };
    let mut rest = chars.as_str();

    let mut modifiers = String::new();
    let mut display_mode = DisplayMode::All;
    let args_start = rest
        .char_indices()
        .find_map(|(i, c)| {
            match c {
                '-' | '+' => modifiers.push(c),
                '*' => display_mode = DisplayMode::Cairo,
                '&' => display_mode = DisplayMode::OpenGl,
                ' ' => {}
                _ => return Some(i),
            }
            None
        })
        .unwrap_or(rest.len());
    rest = &rest[args_start..];

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let explicit: Option<usize> = rest[..digits].parse().ok().filter(|n| *n > 0);
    rest = &rest[digits..];

    let mut authorised_values = Vec::new();
    if let Some(inner) = rest.strip_prefix('[')
        && let Some(end) = inner.find(']')
    {
        let values = &inner[..end];
        if !values.is_empty() {
            authorised_values = values.split(';').map(str::to_string).collect();
        }
        rest = &inner[end + 1..];
    }
    let mut text = rest
        .trim_start_matches(|c: char| c == ']' || c.is_ascii_digit())
        .trim_start();

    let mut aligned_vertical = false;
    if let Some(stripped) = text.strip_suffix('/') {
        text = stripped;
        aligned_vertical = true;
    }

    let mut tooltip = String::new();
    if let (Some(start), Some(end)) = (text.find('{'), text.find('}'))
        && start > 0
        && start < end
    {
        tooltip = text[start + 1..end].to_string();
        text = text[..start].trim_end();
    }

    // The slash may also sit between the label and its tooltip.
    if let Some(stripped) = text.strip_suffix('/') {
        text = stripped;
        aligned_vertical = true;
    }

    let nb_elements = match key_type {
        KeyType::IntSize => explicit.unwrap_or(1).checked_mul(2),
        KeyType::ColorRGB => Some(explicit.unwrap_or(3)),
        KeyType::ColorRGBA => Some(explicit.unwrap_or(4)),
        _ => Some(explicit.unwrap_or(1)),
    };
    let Some(nb_elements) = nb_elements else {
        warn!(comment, "cardinality out of range");
        return None;
    };

    Some(KeyBase {
        key_type: Some(key_type),
        nb_elements,
        authorised_values,
        modifiers,
        display_mode,
        aligned_vertical,
        text: text.to_string(),
        tooltip,
    })
}
