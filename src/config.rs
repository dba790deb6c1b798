use crate::build_log::DEFAULT_ROOT;
use crate::paging::{
    DEFAULT_MAX_WINDOW, DEFAULT_PAGE_SIZE, Expander, Growth, Order, PageRequest, Paginator,
};
use crate::retention::Policy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CURRENT_VERSION: i32 = 1;
pub const DEFAULT_PATH: &str = "./buildpager.yml";

const VALID_ORDERS: &[&str] = &["newest_first", "oldest_first"];
const VALID_GROWTH: &[&str] = &["doubling", "fixed"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub version: i32,
    pub store: Store,
    pub paging: Paging,
    pub retention: Retention,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            store: Store::default(),
            paging: Paging::default(),
            retention: Retention::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Store {
    pub root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Paging {
    pub default_size: Option<i64>,
    pub max_size: Option<i64>,
    pub order: String,
    pub growth: String,
    pub batch: Option<i64>,
    pub max_window: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Retention {
    pub keep: Option<i64>,
    pub max_age: String,
}

/// Paging knobs with every default filled in. `max_size` is a limit for
/// callers serving pages to clients; the paginator itself is uncapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingSettings {
    pub default_size: usize,
    pub max_size: Option<usize>,
    pub order: Order,
    pub growth: Growth,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: None,
            order: Order::default(),
            growth: Growth::default(),
        }
    }
}

impl PagingSettings {
    pub fn paginator(&self) -> Paginator {
        Paginator::new()
            .with_order(self.order)
            .with_expander(Expander::new(self.growth))
    }

    pub fn request(&self, start: Option<i64>, size: Option<i64>) -> PageRequest {
        PageRequest::from_query(start, size, self.default_size)
    }

    /// Same as [`PagingSettings::request`], with `size` cut down to
    /// `max_size` when one is configured.
    pub fn capped_request(&self, start: Option<i64>, size: Option<i64>) -> PageRequest {
        let mut request = self.request(start, size);
        if let Some(max) = self.max_size {
            request.size = request.size.min(max as i64);
        }
        request
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationErrors {
    pub issues: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        self.issues.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.issues.first() {
            write!(
                f,
                "configuration validation failed: {}: {}",
                first.field, first.message
            )
        } else {
            write!(f, "configuration validation failed")
        }
    }
}

impl std::error::Error for ValidationErrors {}

pub fn load(path: &Path) -> Result<Config, String> {
    let cfg = parse(path)?;
    validate(&cfg).map_err(|e| e.to_string())?;
    Ok(cfg)
}

pub fn parse(path: &Path) -> Result<Config, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read config: {e}"))?;
    let cfg: Config = serde_yaml::from_str(&text).map_err(|e| format!("parse config yaml: {e}"))?;
    Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<(), ValidationErrors> {
    let mut issues = ValidationErrors::new();

    if cfg.version != CURRENT_VERSION {
        issues.add("version", format!("must be {CURRENT_VERSION}"));
    }

    if !cfg.store.root.is_empty() && cfg.store.root.trim().is_empty() {
        issues.add("store.root", "must not be blank");
    }

    validate_paging(&mut issues, &cfg.paging);
    validate_retention(&mut issues, &cfg.retention);

    if issues.has_issues() {
        Err(issues)
    } else {
        Ok(())
    }
}

impl Config {
    pub fn store_root(&self) -> PathBuf {
        if self.store.root.trim().is_empty() {
            PathBuf::from(DEFAULT_ROOT)
        } else {
            PathBuf::from(&self.store.root)
        }
    }

    pub fn resolve_paging(&self) -> Result<PagingSettings, String> {
        let p = &self.paging;

        let max_size = p
            .max_size
            .map(|v| resolve_positive(Some(v), 1))
            .transpose()
            .map_err(|e| format!("paging.max_size: {e}"))?;
        let fallback_size = max_size.map_or(DEFAULT_PAGE_SIZE, |max| DEFAULT_PAGE_SIZE.min(max));
        let default_size = resolve_positive(p.default_size, fallback_size)
            .map_err(|e| format!("paging.default_size: {e}"))?;

        let order = match p.order.as_str() {
            "" | "newest_first" => Order::NewestFirst,
            "oldest_first" => Order::OldestFirst,
            other => return Err(format!("paging.order: unknown order {other:?}")),
        };

        let growth = match p.growth.as_str() {
            "" | "doubling" => Growth::Doubling {
                max_window: resolve_positive(p.max_window, DEFAULT_MAX_WINDOW as usize)
                    .map_err(|e| format!("paging.max_window: {e}"))?
                    as u64,
            },
            "fixed" => Growth::Fixed(p.batch.unwrap_or(0).max(0) as u64),
            other => return Err(format!("paging.growth: unknown growth {other:?}")),
        };

        Ok(PagingSettings {
            default_size,
            max_size,
            order,
            growth,
        })
    }

    pub fn resolve_retention(&self) -> Result<Policy, String> {
        let keep = match self.retention.keep {
            None | Some(0) => None,
            Some(n) if n > 0 => Some(n as usize),
            Some(_) => return Err("retention.keep: must be >= 0".to_string()),
        };

        let max_age = if self.retention.max_age.is_empty() {
            None
        } else {
            Some(
                parse_duration(&self.retention.max_age)
                    .map_err(|_| "retention.max_age: must be a valid duration".to_string())?,
            )
        };

        Ok(Policy { keep, max_age })
    }
}

fn validate_paging(issues: &mut ValidationErrors, p: &Paging) {
    if let Some(size) = p.default_size
        && size < 1
    {
        issues.add("paging.default_size", "must be >= 1");
    }

    if let Some(size) = p.max_size
        && size < 1
    {
        issues.add("paging.max_size", "must be >= 1");
    }

    if let (Some(size), Some(max_size)) = (p.default_size, p.max_size)
        && size > max_size
    {
        issues.add(
            "paging.default_size",
            format!("must not exceed max_size ({max_size})"),
        );
    }

    if !p.order.is_empty() && !VALID_ORDERS.contains(&p.order.as_str()) {
        issues.add("paging.order", "must be one of newest_first, oldest_first");
    }

    if !p.growth.is_empty() && !VALID_GROWTH.contains(&p.growth.as_str()) {
        issues.add("paging.growth", "must be one of doubling, fixed");
    }

    let fixed = p.growth == "fixed";

    if let Some(batch) = p.batch {
        if batch < 0 {
            issues.add("paging.batch", "must be >= 0");
        }
        if !fixed {
            issues.add("paging.batch", "only applies when growth is fixed");
        }
    }

    if let Some(window) = p.max_window {
        if window < 1 {
            issues.add("paging.max_window", "must be >= 1");
        }
        if fixed {
            issues.add("paging.max_window", "only applies when growth is doubling");
        }
    }
}

fn validate_retention(issues: &mut ValidationErrors, r: &Retention) {
    if let Some(keep) = r.keep
        && keep < 0
    {
        issues.add("retention.keep", "must be >= 0");
    }

    if !r.max_age.is_empty() && parse_duration(&r.max_age).is_err() {
        issues.add("retention.max_age", "must be a valid duration");
    }
}

pub fn parse_duration(text: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(text)
}

fn resolve_positive(value: Option<i64>, default_value: usize) -> Result<usize, String> {
    match value {
        None => Ok(default_value),
        Some(v) if v >= 1 => Ok(v as usize),
        Some(_) => Err("must be >= 1".to_string()),
    }
}
