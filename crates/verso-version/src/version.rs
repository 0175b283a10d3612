//! Calendar-style version tags.

use std::cmp::Ordering;
use std::fmt;

/// Earliest year accepted by the tag grammar.
const MIN_YEAR: u16 = 2000;

/// Error returned when a string does not match the version tag grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// The candidate string is not a valid `YYYY.MM.DD` tag.
    #[error("invalid version format: {0:?} (expected YYYY.MM.DD)")]
    InvalidFormat(String),
}

/// A validated calendar-style version tag.
///
/// Parsed from `YYYY.MM.DD` with year ≥ 2000, month 01–12 and day 01–31.
/// The original string is preserved as the canonical label: it names the
/// archive directory and appears in URLs, so it must match the operator's
/// tag byte-for-byte.
///
/// Range checks are syntactic only. `2024.02.30` parses fine; real calendar
/// validity is the operator's responsibility, not corrected here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    label: String,
    year: u16,
    month: u8,
    day: u8,
}

impl Version {
    /// Parse a candidate tag string.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::InvalidFormat`] carrying the rejected string.
    /// Callers scanning a directory should treat this as "not a version"
    /// and skip the entry; the archive root may legitimately contain
    /// housekeeping directories.
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidFormat(raw.to_owned());

        let mut parts = raw.split('.');
        let (year_s, month_s, day_s) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(y), Some(m), Some(d), None) => (y, m, d),
            _ => return Err(invalid()),
        };

        let year = parse_field(year_s, 4).ok_or_else(invalid)?;
        let month = parse_field(month_s, 2).ok_or_else(invalid)?;
        let day = parse_field(day_s, 2).ok_or_else(invalid)?;

        if year < u32::from(MIN_YEAR) || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(invalid());
        }

        Ok(Self {
            label: raw.to_owned(),
            year: u16::try_from(year).map_err(|_| invalid())?,
            month: u8::try_from(month).map_err(|_| invalid())?,
            day: u8::try_from(day).map_err(|_| invalid())?,
        })
    }

    /// The canonical label, exactly as the tag was written.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn year(&self) -> u16 {
        self.year
    }

    #[must_use]
    pub fn month(&self) -> u8 {
        self.month
    }

    #[must_use]
    pub fn day(&self) -> u8 {
        self.day
    }

    /// Date triple used for ordering.
    #[must_use]
    pub fn date(&self) -> (u16, u8, u8) {
        (self.year, self.month, self.day)
    }
}

/// Parse a fixed-width all-digit field.
fn parse_field(s: &str, width: usize) -> Option<u32> {
    if s.len() != width || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl Ord for Version {
    /// Calendar order, oldest first. Equal dates (distinct labels should
    /// not share a date, but determinism matters) compare by label.
    fn cmp(&self, other: &Self) -> Ordering {
        self.date()
            .cmp(&other.date())
            .then_with(|| self.label.cmp(&other.label))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
