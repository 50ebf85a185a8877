//! Page specification grammar.
//!
//! A page specification lists which sides of which scans become pages, and in
//! which order. It is a comma-separated list of tokens:
//!
//! ```text
//! FROM[-TO][l][r]
//!
//! 0l          left side of scan 0
//! 4r          right side of scan 4
//! 1-3lr       both sides of scans 1, 2 and 3
//! 0l,1-3lr,56l
//! ```
//!
//! Pages are numbered from 1 in the order they are generated: token order,
//! then scan ascending, then left before right. The counter runs across all
//! tokens, so `0l,1-3lr,56l` produces pages 1 through 8.
//!
//! ## Edge cases
//!
//! - `l` must precede `r`; `rl` is malformed.
//! - A token without side letters (`5-9`) is accepted but produces no pages.
//! - A descending range (`9-5l`) is accepted but produces no pages.

use crate::types::{PageEntry, Side};
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::LazyLock;
use thiserror::Error;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(-(\d+))?(l?)(r?)$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageSpecError {
    #[error("Malformed page spec: '{token}' (expected FROM[-TO][l][r], e.g. 0l,1-3lr,56l)")]
    Malformed { token: String },
}

/// One parsed `FROM[-TO][l][r]` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpecToken {
    pub from: u32,
    pub to: u32,
    /// Requested sides, always in `[Left, Right]` order.
    pub sides: Vec<Side>,
}

impl PageSpecToken {
    /// Scans covered by this token. Empty when `to < from`.
    pub fn scans(&self) -> RangeInclusive<u32> {
        self.from..=self.to
    }

    /// Whether the token contributes any page at all.
    pub fn is_empty(&self) -> bool {
        self.sides.is_empty() || self.to < self.from
    }
}

/// Parse a single token of the page specification.
pub fn parse_token(token: &str) -> Result<PageSpecToken, PageSpecError> {
    let malformed = || PageSpecError::Malformed {
        token: token.to_string(),
    };
    let caps = TOKEN_PATTERN.captures(token).ok_or_else(malformed)?;

    let from: u32 = caps[1].parse().map_err(|_| malformed())?;
    let to: u32 = match caps.get(3) {
        Some(m) => m.as_str().parse().map_err(|_| malformed())?,
        None => from,
    };

    let mut sides = Vec::with_capacity(2);
    if !caps[4].is_empty() {
        sides.push(Side::Left);
    }
    if !caps[5].is_empty() {
        sides.push(Side::Right);
    }

    Ok(PageSpecToken { from, to, sides })
}

/// Expand a full page specification into the ordered list of pages.
pub fn parse_page_spec(spec: &str) -> Result<Vec<PageEntry>, PageSpecError> {
    let tokens = spec
        .split(',')
        .map(parse_token)
        .collect::<Result<Vec<_>, _>>()?;

    let mut entries = Vec::new();
    let mut page = 1;
    for (raw, token) in spec.split(',').zip(&tokens) {
        if token.is_empty() {
            let reason = if token.sides.is_empty() {
                "no side letters"
            } else {
                "a descending range"
            };
            tracing::warn!(token = raw, reason, "page spec token generates no pages");
            continue;
        }

        for scan in token.scans() {
            for &side in &token.sides {
                entries.push(PageEntry { scan, side, page });
                page += 1;
            }
        }
    }

    tracing::debug!(spec, pages = entries.len(), "expanded page spec");
    Ok(entries)
}
