//! Bounded pages over a sparse build history.
//!
//! A request addresses *logical* positions: `start = 1` is the first build
//! that still exists in the requested order, whatever its number. The
//! paginator guesses the number window that would hold those positions if
//! nothing had been deleted, counts how many survivors sit ahead of that
//! window, resolves it, and lets the [`Expander`] reach further out when gaps
//! leave the page short.

pub mod expand;
pub mod resolve;

pub use expand::{DEFAULT_MAX_WINDOW, Expander, Growth};

use crate::build_log::BuildLog;
use crate::error::PageError;
use crate::model::{BuildRecord, JobId, now_millis};
use crate::range::NumberRange;
use crate::summary::BuildSummary;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::NewestFirst => "newest_first",
            Order::OldestFirst => "oldest_first",
        }
    }
}

/// 1-based `start` position and page `size`, both as received from a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub start: i64,
    pub size: i64,
}

impl PageRequest {
    pub fn new(start: i64, size: i64) -> Self {
        Self { start, size }
    }

    /// Absent values fall back to the first position and `default_size`.
    pub fn from_query(start: Option<i64>, size: Option<i64>, default_size: usize) -> Self {
        Self {
            start: start.unwrap_or(1),
            size: size.unwrap_or(default_size as i64),
        }
    }

    fn validate(&self) -> Result<(usize, usize), PageError> {
        if self.start < 1 {
            return Err(PageError::InvalidParameter {
                name: "start",
                value: self.start,
            });
        }
        if self.size < 1 {
            return Err(PageError::InvalidParameter {
                name: "size",
                value: self.size,
            });
        }
        Ok((self.start as usize, self.size as usize))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::from_query(None, None, DEFAULT_PAGE_SIZE)
    }
}

/// One page of build summaries. `count` always equals `builds.len()`; an
/// empty page marks the end of the history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Page {
    pub count: usize,
    pub builds: Vec<BuildSummary>,
}

impl Page {
    pub fn new(builds: Vec<BuildSummary>) -> Self {
        Self {
            count: builds.len(),
            builds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Paginator {
    order: Order,
    max_size: Option<usize>,
    expander: Expander,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            order: Order::default(),
            max_size: None,
            expander: Expander::default(),
        }
    }
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Caps every page at `max_size` builds. Without a cap a request is
    /// served in full, so an oversized `size` returns the whole history.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size.max(1));
        self
    }

    pub fn with_expander(mut self, expander: Expander) -> Self {
        self.expander = expander;
        self
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    pub fn page<L: BuildLog + ?Sized>(
        &self,
        log: &L,
        job: &JobId,
        request: &PageRequest,
    ) -> Result<Page, PageError> {
        self.page_at(log, job, request, now_millis())
    }

    /// Same as [`Paginator::page`] with an explicit clock for running builds.
    pub fn page_at<L: BuildLog + ?Sized>(
        &self,
        log: &L,
        job: &JobId,
        request: &PageRequest,
        now_millis: i64,
    ) -> Result<Page, PageError> {
        let records = self.records(log, job, request)?;
        let builds = records
            .iter()
            .map(|record| BuildSummary::project(job, record, now_millis))
            .collect();
        Ok(Page::new(builds))
    }

    /// The raw records at logical positions `start..start + size`.
    pub fn records<L: BuildLog + ?Sized>(
        &self,
        log: &L,
        job: &JobId,
        request: &PageRequest,
    ) -> Result<Vec<BuildRecord>, PageError> {
        let (start, size) = request.validate()?;
        let size = self.max_size.map_or(size, |max| size.min(max));

        let Some(highest) = log.highest_number(job)? else {
            debug!("page {job}: no builds");
            return Ok(Vec::new());
        };

        // Numbers run 1..=highest, so at most `highest` builds exist.
        let skip = (start - 1) as u64;
        if skip >= highest {
            return Ok(Vec::new());
        }

        let width = size as u64;
        let (passed, candidate) = match self.order {
            Order::NewestFirst => {
                let upper = highest - skip;
                (
                    NumberRange::closed(upper + 1, highest),
                    NumberRange::closed(upper.saturating_sub(width - 1), upper),
                )
            }
            Order::OldestFirst => {
                let lower = skip + 1;
                (
                    NumberRange::closed(1, skip),
                    NumberRange::closed(lower, lower.saturating_add(width - 1).min(highest)),
                )
            }
        };

        // Survivors ahead of the candidate window occupy some of the skipped
        // positions; whatever is left must be skipped inside the window.
        let passed_count = resolve::count(log, job, &passed)?;
        let offset = (start - 1).saturating_sub(passed_count);
        let wanted = offset + size;

        let mut found = resolve::resolve(log, job, &candidate, self.order)?;
        if found.len() < wanted {
            let deficit = wanted - found.len();
            let more = match (self.order, candidate.lowest(), candidate.highest()) {
                (Order::NewestFirst, Some(lowest), _) if lowest > 1 => {
                    self.expander.expand(log, job, lowest, deficit)?
                }
                (Order::OldestFirst, _, Some(top)) if top < highest => {
                    self.expander
                        .expand_newer(log, job, top, highest, deficit)?
                }
                _ => Vec::new(),
            };
            found.extend(more);
        }

        let page: Vec<BuildRecord> = found.into_iter().skip(offset).take(size).collect();
        debug!(
            "page {job} start={start} size={size} {}: candidate [{candidate}], served [{}]",
            self.order.as_str(),
            page.iter().map(|record| record.number).collect::<NumberRange>()
        );
        Ok(page)
    }
}
