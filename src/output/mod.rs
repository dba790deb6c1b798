mod builds;
mod jobs;
mod style;

pub use builds::print_page;
pub use jobs::{JobRow, print_jobs};
pub use style::{accent, bold, command, configure, info, muted, number, result_label, success};

pub fn format_duration_ms(ms: i64) -> String {
    if ms < 1000 {
        return format!("{ms}ms");
    }

    if ms.rem_euclid(1000) == 0 {
        return format!("{}s", ms / 1000);
    }

    format!("{:.3}s", ms as f64 / 1000.0)
}
