//! Filename templates and directory handling for scans and pages.
//!
//! Scan and page files are named with printf-style templates holding a
//! single integer conversion, the same way `scanimage --batch` and most
//! scanner software name their output:
//!
//! - `scan%03d.png` with scan `7` → `scan007.png`
//! - `the-secret-garden.%02d.png` with scan `12` → `the-secret-garden.12.png`
//! - `page%d.tif` with page `130` → `page130.tif`
//!
//! Supported conversions are `%d`, `%i` and `%u` with an optional `0` or `-`
//! flag and a width. `%%` is a literal percent sign.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("Invalid file name template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Padding {
    /// `%5d`: right-aligned, space padded.
    None,
    Zeros,
    RightSpaces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Conversion {
    padding: Padding,
    width: usize,
}

/// A parsed printf-style template with exactly one integer conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTemplate {
    source: String,
    prefix: String,
    conversion: Conversion,
    suffix: String,
}

impl NamingTemplate {
    pub fn parse(template: &str) -> Result<Self, NamingError> {
        let invalid = |reason: &str| NamingError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut conversion = None;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if conversion.is_some() {
                &mut suffix
            } else {
                &mut prefix
            };
            if c != '%' {
                out.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                out.push('%');
                continue;
            }
            if conversion.is_some() {
                return Err(invalid("more than one conversion"));
            }

            let padding = match chars.peek() {
                Some('0') => {
                    chars.next();
                    Padding::Zeros
                }
                Some('-') => {
                    chars.next();
                    Padding::RightSpaces
                }
                _ => Padding::None,
            };
            let mut digits = String::new();
            while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(*d);
                chars.next();
            }
            let width = if digits.is_empty() {
                0
            } else {
                digits
                    .parse()
                    .map_err(|_| invalid("conversion width is too large"))?
            };
            match chars.next() {
                Some('d' | 'i' | 'u') => {}
                Some(other) => {
                    return Err(invalid(&format!(
                        "unsupported conversion '%{other}', expected an integer (%d)"
                    )));
                }
                None => return Err(invalid("template ends inside a conversion")),
            }
            conversion = Some(Conversion { padding, width });
        }

        let conversion = conversion.ok_or_else(|| invalid("no integer conversion (e.g. %03d)"))?;
        Ok(Self {
            source: template.to_string(),
            prefix,
            conversion,
            suffix,
        })
    }

    /// Render the template for `number`.
    pub fn format(&self, number: u32) -> String {
        let Conversion { padding, width } = self.conversion;
        let n = match padding {
            Padding::Zeros => format!("{number:0>width$}"),
            Padding::RightSpaces => format!("{number:<width$}"),
            Padding::None => format!("{number:>width$}"),
        };
        format!("{}{}{}", self.prefix, n, self.suffix)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for NamingTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Expand a leading `~` to the current user's home directory.
///
/// Only `~` and `~/...` are expanded; `~user` forms and paths without a
/// tilde are returned unchanged, as is everything when no home directory
/// can be determined.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) if rest.as_os_str().is_empty() => home,
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Where scans are read from and pages are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    pub source_dir: PathBuf,
    pub source_template: NamingTemplate,
    pub target_dir: PathBuf,
    pub target_template: NamingTemplate,
}

impl Naming {
    pub fn scan_file(&self, scan: u32) -> String {
        self.source_template.format(scan)
    }

    pub fn scan_path(&self, scan: u32) -> PathBuf {
        expand_home(&self.source_dir.join(self.scan_file(scan)))
    }

    pub fn page_file(&self, page: u32) -> String {
        self.target_template.format(page)
    }

    pub fn page_path(&self, page: u32) -> PathBuf {
        expand_home(&self.target_dir.join(self.page_file(page)))
    }
}
