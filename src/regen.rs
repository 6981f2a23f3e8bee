//! Marker-based regeneration merge.
//!
//! Generated C++ artifacts contain *slots*: regions between a
//! `// <NAME>_START` and a `// <NAME>_END` line. Before an artifact is
//! rewritten, the text inside each slot of the old file is extracted; the
//! new artifact re-emits the marker pair with that text spliced in verbatim.
//! Everything outside a slot is regenerated from the schema.
//!
//! The merge never fails. A missing file, a missing start marker or an
//! unmatched end marker all degrade to an empty slot. Slots present in the
//! old file but absent from the new template are dropped.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

/// A named pair of single-line marker comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(&'static str);

impl Slot {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(self) -> &'static str {
        self.0
    }

    pub fn start_marker(self) -> String {
        format!("// {}_START", self.0)
    }

    pub fn end_marker(self) -> String {
        format!("// {}_END", self.0)
    }
}

/// Every slot any artifact kind uses.
pub mod slots {
    use super::Slot;

    pub const USER_INCLUDES: Slot = Slot::new("USER_INCLUDES");
    pub const USER_DEFINITIONS: Slot = Slot::new("USER_DEFINITIONS");
    pub const USER_PROPERTIES: Slot = Slot::new("USER_PROPERTIES");
    pub const USER_METHODS: Slot = Slot::new("USER_METHODS");
    pub const USER_PROTECTED: Slot = Slot::new("USER_PROTECTED");
    pub const USER_PRIVATE: Slot = Slot::new("USER_PRIVATE");
    pub const USER_IMPL_INCLUDES: Slot = Slot::new("USER_IMPL_INCLUDES");
    pub const USER_CONSTRUCTOR: Slot = Slot::new("USER_CONSTRUCTOR");
    pub const USER_TO_CAPNP: Slot = Slot::new("USER_TO_CAPNP");
    pub const USER_FROM_CAPNP: Slot = Slot::new("USER_FROM_CAPNP");
    pub const USER_COPY_FROM: Slot = Slot::new("USER_COPY_FROM");
    pub const USER_IMPL: Slot = Slot::new("USER_IMPL");
}

/// The full marker catalog.
pub const CATALOG: [Slot; 12] = [
    slots::USER_INCLUDES,
    slots::USER_DEFINITIONS,
    slots::USER_PROPERTIES,
    slots::USER_METHODS,
    slots::USER_PROTECTED,
    slots::USER_PRIVATE,
    slots::USER_IMPL_INCLUDES,
    slots::USER_CONSTRUCTOR,
    slots::USER_TO_CAPNP,
    slots::USER_FROM_CAPNP,
    slots::USER_COPY_FROM,
    slots::USER_IMPL,
];

/// Text of `slot` in `content`, or empty when the marker pair is incomplete.
///
/// The slot starts on the line after the first start marker. It ends where
/// the end marker's line begins, provided only whitespace precedes the marker
/// on that line; otherwise it ends right before the marker.
pub fn extract_slot(content: &str, slot: Slot) -> String {
    let start_marker = slot.start_marker();
    let end_marker = slot.end_marker();

    let Some(found) = content.find(&start_marker) else {
        return String::new();
    };
    let after_marker = found + start_marker.len();
    let start = match content[after_marker..].find('\n') {
        Some(offset) => after_marker + offset + 1,
        None => after_marker,
    };

    let Some(offset) = content[start..].find(&end_marker) else {
        return String::new();
    };
    let marker_pos = start + offset;

    let line_start = content[start..marker_pos]
        .rfind('\n')
        .map_or(start, |i| start + i + 1);
    let end = if content[line_start..marker_pos].trim().is_empty() {
        line_start
    } else {
        marker_pos
    };

    content[start..end].to_string()
}

/// Slot contents recovered from a previous version of one artifact.
#[derive(Debug, Default, Clone)]
pub struct PreservedSlots {
    contents: BTreeMap<Slot, String>,
}

impl PreservedSlots {
    /// Extract `slots` from `previous`; `None` means no prior artifact.
    pub fn from_text(previous: Option<&str>, slots: &[Slot]) -> Self {
        let contents = match previous {
            Some(text) => slots
                .iter()
                .map(|&slot| (slot, extract_slot(text, slot)))
                .collect(),
            None => BTreeMap::new(),
        };
        Self { contents }
    }

    /// Read the artifact at `path`. A missing or unreadable file yields
    /// empty slots.
    pub fn read(path: &Path, slots: &[Slot]) -> Self {
        let previous = std::fs::read_to_string(path).ok();
        Self::from_text(previous.as_deref(), slots)
    }

    pub fn get(&self, slot: Slot) -> &str {
        self.contents.get(&slot).map_or("", String::as_str)
    }

    /// Number of slots that carried user content.
    pub fn non_empty(&self) -> usize {
        self.contents.values().filter(|c| !c.is_empty()).count()
    }
}

/// Emit `slot` at `indent` with `content` spliced verbatim between the markers.
///
/// Content that does not end in a newline is terminated with one so the end
/// marker always starts its own line.
pub fn write_slot(out: &mut String, indent: &str, slot: Slot, content: &str) {
    writeln!(out, "{indent}{}", slot.start_marker()).unwrap();
    out.push_str(content);
    if !content.is_empty() && !content.ends_with('\n') {
        out.push('\n');
    }
    writeln!(out, "{indent}{}", slot.end_marker()).unwrap();
}
