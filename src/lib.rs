//! # Bookblock
//!
//! Cuts individual pages out of book scans. Each scan holds up to two
//! facing pages; a single bounding-box geometry says where a page sits
//! inside its half of the scan, and a compact page specification says which
//! scans and sides become which pages:
//!
//! ```text
//! pages "0l,1-120lr,121l"     geometry "600x800+10+20"
//!
//! scan000.png  → page001.png                      (cover, left half)
//! scan001.png  → page002.png, page003.png         (left, right)
//! ...
//! scan121.png  → page242.png                      (back cover)
//! ```
//!
//! # Pipeline
//!
//! ```text
//! page spec ──parse──→ PageSequence ──all_entries──→ PageExtractor ──→ page files
//!                        │ cursor                       ▲
//!                        └──────── BookBlock ───────────┘  (interactive preview)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | `WIDTHxHEIGHT+LEFT+TOP` parsing and per-side crop rectangles |
//! | [`page_spec`] | `FROM[-TO][l][r]` token parsing into numbered page entries |
//! | [`naming`] | printf-style file name templates and directory handling |
//! | [`sequence`] | Ordered page entries with a navigation cursor |
//! | [`imaging`] | Image codec seam: decode scans, encode pages |
//! | [`extract`] | Raw, annotated and cut-out page extraction; storing pages |
//! | [`bookblock`] | Preview session: navigation plus view mode |
//! | [`config`] | `bookblock.toml` loading, merging and typed settings |
//! | [`types`] | Shared page types (`Side`, `PageEntry`, `LocatedPage`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Geometry For Both Sides
//!
//! Book scans are made with the book in a fixed cradle, so left and right
//! pages sit at the same place within their half of the scan. The right
//! page's box is the left page's box shifted by half the scan width, which
//! is computed from each decoded scan rather than configured.
//!
//! ## Codec Behind A Trait
//!
//! All file decoding and encoding goes through [`imaging::ImageCodec`].
//! Extraction logic is tested against an in-memory mock codec with
//! synthetic scans; only the codec's own tests touch real image files.
//!
//! ## Explicit Settings
//!
//! Nothing is global. The binary resolves defaults, `bookblock.toml` and
//! command-line flags into a [`config::Settings`] and hands its parts to the
//! constructors that need them.

pub mod bookblock;
pub mod config;
pub mod extract;
pub mod geometry;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod page_spec;
pub mod sequence;
pub mod types;
