//! Selectors - the small query language used by teleport targets.
//!
//! Supported forms:
//! - `#id`    node with that registry ID
//! - `.class` node carrying that class
//! - `tag`    node of that kind (`body`, `box`, `popup`, `overlay`, `icon`)
//!
//! Compound selectors, combinators and attribute selectors are rejected.

use super::arrays::core;
use super::registry::get_id;
use crate::error::{PopupError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(String),
    Class(String),
    Tag(String),
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl Selector {
    pub fn parse(input: &str) -> Result<Selector> {
        let trimmed = input.trim();
        let invalid = || PopupError::InvalidSelector(input.to_string());

        let (ctor, name): (fn(String) -> Selector, &str) =
            if let Some(rest) = trimmed.strip_prefix('#') {
                (Selector::Id, rest)
            } else if let Some(rest) = trimmed.strip_prefix('.') {
                (Selector::Class, rest)
            } else {
                (Selector::Tag, trimmed)
            };

        if !is_ident(name) {
            return Err(invalid());
        }
        Ok(ctor(name.to_string()))
    }

    /// Does the node at `index` match?
    pub fn matches(&self, index: usize) -> bool {
        match self {
            Selector::Id(id) => get_id(index).as_deref() == Some(id.as_str()),
            Selector::Class(class) => core::has_class(index, class),
            Selector::Tag(tag) => core::get_kind(index).tag_name() == tag,
        }
    }
}
