use crate::model::BuildNumber;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A set of build numbers kept as sorted, disjoint, closed intervals.
///
/// Prints and parses the compact form `1-8,12`. Iteration walks the intervals
/// lazily, so a wide range never expands into a vector of numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberRange {
    spans: Vec<(BuildNumber, BuildNumber)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeParseError {
    #[error("invalid build number {0:?}")]
    InvalidNumber(String),
    #[error("build numbers start at 1")]
    Zero,
    #[error("interval {0} is reversed")]
    Reversed(String),
}

impl NumberRange {
    pub fn new() -> Self {
        Self::default()
    }

    /// `[lo, hi]` with `lo` clipped to 1; empty when `hi < max(lo, 1)`.
    pub fn closed(lo: BuildNumber, hi: BuildNumber) -> Self {
        let mut range = Self::new();
        range.add(lo, hi);
        range
    }

    pub fn add(&mut self, lo: BuildNumber, hi: BuildNumber) {
        let lo = lo.max(1);
        if hi < lo {
            return;
        }

        self.spans.push((lo, hi));
        self.spans.sort_unstable_by_key(|span| span.0);

        let mut merged: Vec<(BuildNumber, BuildNumber)> = Vec::with_capacity(self.spans.len());
        for &(lo, hi) in &self.spans {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }
        self.spans = merged;
    }

    pub fn insert(&mut self, number: BuildNumber) {
        self.add(number, number);
    }

    pub fn spans(&self) -> &[(BuildNumber, BuildNumber)] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> u64 {
        self.spans.iter().map(|&(lo, hi)| hi - lo + 1).sum()
    }

    pub fn lowest(&self) -> Option<BuildNumber> {
        self.spans.first().map(|span| span.0)
    }

    pub fn highest(&self) -> Option<BuildNumber> {
        self.spans.last().map(|span| span.1)
    }

    pub fn contains(&self, number: BuildNumber) -> bool {
        self.spans
            .iter()
            .any(|&(lo, hi)| (lo..=hi).contains(&number))
    }

    pub fn iter_asc(&self) -> impl Iterator<Item = BuildNumber> + '_ {
        self.spans.iter().flat_map(|&(lo, hi)| lo..=hi)
    }

    pub fn iter_desc(&self) -> impl Iterator<Item = BuildNumber> + '_ {
        self.spans.iter().rev().flat_map(|&(lo, hi)| (lo..=hi).rev())
    }
}

impl FromIterator<BuildNumber> for NumberRange {
    fn from_iter<I: IntoIterator<Item = BuildNumber>>(iter: I) -> Self {
        let mut range = Self::new();
        for number in iter {
            range.insert(number);
        }
        range
    }
}

impl fmt::Display for NumberRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, &(lo, hi)) in self.spans.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            if lo == hi {
                write!(f, "{lo}")?;
            } else {
                write!(f, "{lo}-{hi}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for NumberRange {
    type Err = RangeParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut range = Self::new();

        for part in text.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (lo, hi) = match part.split_once('-') {
                Some((lo, hi)) => (parse_number(lo)?, parse_number(hi)?),
                None => {
                    let n = parse_number(part)?;
                    (n, n)
                }
            };

            if hi < lo {
                return Err(RangeParseError::Reversed(part.to_string()));
            }
            range.add(lo, hi);
        }

        Ok(range)
    }
}

fn parse_number(text: &str) -> Result<BuildNumber, RangeParseError> {
    let text = text.trim();
    let n = text
        .parse::<BuildNumber>()
        .map_err(|_| RangeParseError::InvalidNumber(text.to_string()))?;
    if n == 0 {
        return Err(RangeParseError::Zero);
    }
    Ok(n)
}
