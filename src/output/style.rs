use crate::model::BuildResult;
use std::sync::atomic::{AtomicBool, Ordering};

static COLORS_ENABLED: AtomicBool = AtomicBool::new(true);

pub fn configure(no_color: bool) {
    let mut enabled = !no_color;

    if std::env::var_os("NO_COLOR").is_some() {
        enabled = false;
    }

    if let Ok(term) = std::env::var("TERM")
        && term.eq_ignore_ascii_case("dumb")
    {
        enabled = false;
    }

    if std::env::var("CLICOLOR_FORCE").ok().as_deref() == Some("1") {
        enabled = true;
    }

    COLORS_ENABLED.store(enabled, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Bold,
    Muted,
    Accent,
    Success,
    Failure,
    Warning,
    Highlight,
}

impl Tone {
    fn sgr(self) -> &'static str {
        match self {
            Tone::Bold => "1",
            Tone::Muted => "2",
            Tone::Accent => "36",
            Tone::Success => "32",
            Tone::Failure => "31",
            Tone::Warning => "33",
            Tone::Highlight => "96",
        }
    }
}

fn paint(tone: Tone, text: &str) -> String {
    if text.is_empty() || !COLORS_ENABLED.load(Ordering::Relaxed) {
        return text.to_string();
    }

    format!("\x1b[{}m{text}\x1b[0m", tone.sgr())
}

pub fn bold(text: &str) -> String {
    paint(Tone::Bold, text)
}

pub fn muted(text: &str) -> String {
    paint(Tone::Muted, text)
}

pub fn accent(text: &str) -> String {
    paint(Tone::Accent, text)
}

pub fn success(text: &str) -> String {
    paint(Tone::Success, text)
}

pub fn info(text: &str) -> String {
    paint(Tone::Highlight, text)
}

pub fn command(text: &str) -> String {
    paint(Tone::Highlight, text)
}

pub fn number(text: &str) -> String {
    paint(Tone::Highlight, text)
}

/// Colored label for a build result; running builds have no result yet.
pub fn result_label(result: Option<BuildResult>) -> String {
    match result {
        Some(BuildResult::Success) => paint(Tone::Success, "ok SUCCESS"),
        Some(BuildResult::Failure) => paint(Tone::Failure, "x FAILURE"),
        Some(BuildResult::Unstable) => paint(Tone::Warning, "! UNSTABLE"),
        Some(BuildResult::Aborted) => paint(Tone::Muted, "- ABORTED"),
        Some(BuildResult::NotBuilt) => paint(Tone::Muted, "- NOT_BUILT"),
        None => paint(Tone::Highlight, "~ running"),
    }
}
