use crate::build_log::BuildLog;
use crate::error::LogError;
use crate::model::{BuildNumber, BuildRecord, JobId};
use crate::paging::{Order, resolve};
use crate::range::NumberRange;
use log::debug;

pub const DEFAULT_MAX_WINDOW: u64 = 1024;

/// How far each successive search window reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    /// The first window covers the deficit, each further window is twice as
    /// wide as the previous one, up to `max_window` numbers.
    Doubling { max_window: u64 },
    /// Every window covers the same number of build numbers. `0` means the
    /// deficit at the time of the first window.
    Fixed(u64),
}

impl Default for Growth {
    fn default() -> Self {
        Growth::Doubling {
            max_window: DEFAULT_MAX_WINDOW,
        }
    }
}

impl Growth {
    fn first_window(self, deficit: usize) -> u64 {
        let deficit = (deficit as u64).max(1);
        match self {
            Growth::Doubling { max_window } => deficit.min(max_window.max(1)),
            Growth::Fixed(0) => deficit,
            Growth::Fixed(width) => width,
        }
    }

    fn next_window(self, current: u64) -> u64 {
        match self {
            Growth::Doubling { max_window } => current.saturating_mul(2).min(max_window.max(1)),
            Growth::Fixed(_) => current,
        }
    }
}

/// Widens a search window past its current edge until enough builds are
/// found or the edge of the history is reached.
///
/// Every pass moves the edge by at least one number, so the loop ends after
/// at most `lower_bound - 1` (or `ceiling - upper_bound`) passes even when
/// every number in between was deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expander {
    growth: Growth,
}

impl Expander {
    pub fn new(growth: Growth) -> Self {
        Self { growth }
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    /// Up to `still_needed` records numbered below `lower_bound`, newest first.
    pub fn expand<L: BuildLog + ?Sized>(
        &self,
        log: &L,
        job: &JobId,
        lower_bound: BuildNumber,
        still_needed: usize,
    ) -> Result<Vec<BuildRecord>, LogError> {
        let mut found = Vec::new();
        let mut upper = lower_bound.saturating_sub(1);
        let mut window = self.growth.first_window(still_needed);
        let mut passes = 0_usize;

        while found.len() < still_needed && upper >= 1 {
            let lower = upper.saturating_sub(window - 1).max(1);
            let range = NumberRange::closed(lower, upper);
            let batch = resolve::resolve_first(
                log,
                job,
                &range,
                Order::NewestFirst,
                still_needed - found.len(),
            )?;
            found.extend(batch);

            upper = lower - 1;
            window = self.growth.next_window(window);
            passes += 1;
        }

        debug!(
            "expand {job} below #{lower_bound}: {} of {still_needed} found in {passes} windows",
            found.len()
        );
        Ok(found)
    }

    /// Up to `still_needed` records numbered above `upper_bound` and at most
    /// `ceiling`, oldest first.
    pub fn expand_newer<L: BuildLog + ?Sized>(
        &self,
        log: &L,
        job: &JobId,
        upper_bound: BuildNumber,
        ceiling: BuildNumber,
        still_needed: usize,
    ) -> Result<Vec<BuildRecord>, LogError> {
        let mut found = Vec::new();
        let mut lower = upper_bound.saturating_add(1).max(1);
        let mut window = self.growth.first_window(still_needed);
        let mut passes = 0_usize;

        while found.len() < still_needed && lower <= ceiling {
            let upper = lower.saturating_add(window - 1).min(ceiling);
            let range = NumberRange::closed(lower, upper);
            let batch = resolve::resolve_first(
                log,
                job,
                &range,
                Order::OldestFirst,
                still_needed - found.len(),
            )?;
            found.extend(batch);

            passes += 1;
            if upper == BuildNumber::MAX {
                break;
            }
            lower = upper + 1;
            window = self.growth.next_window(window);
        }

        debug!(
            "expand {job} above #{upper_bound}: {} of {still_needed} found in {passes} windows",
            found.len()
        );
        Ok(found)
    }

    /// Grows an already-resolved set of records to `target` entries by
    /// searching older builds first and then newer ones, up to the highest
    /// build present. Returns the whole set newest first. When the log holds
    /// fewer than `target` builds, the result is every build in it.
    pub fn top_up<L: BuildLog + ?Sized>(
        &self,
        log: &L,
        job: &JobId,
        resolved: Vec<BuildRecord>,
        target: usize,
    ) -> Result<Vec<BuildRecord>, LogError> {
        let mut records = resolved;
        records.sort_unstable_by(|a, b| b.number.cmp(&a.number));
        records.dedup_by_key(|record| record.number);

        if records.len() >= target {
            return Ok(records);
        }

        let Some(highest) = log.highest_number(job)? else {
            return Ok(records);
        };

        let (oldest, newest) = match (records.last(), records.first()) {
            (Some(oldest), Some(newest)) => (oldest.number, newest.number),
            _ => (highest.saturating_add(1), highest),
        };

        let older = self.expand(log, job, oldest, target - records.len())?;
        records.extend(older);

        if records.len() < target && newest < highest {
            let newer = self.expand_newer(log, job, newest, highest, target - records.len())?;
            let mut merged: Vec<BuildRecord> = newer.into_iter().rev().collect();
            merged.append(&mut records);
            records = merged;
        }

        Ok(records)
    }
}
