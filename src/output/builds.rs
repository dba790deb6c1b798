use crate::output::{accent, format_duration_ms, info, muted, number, result_label};
use crate::paging::Page;
use std::io::Write;
use time::OffsetDateTime;

pub fn print_page(mut w: impl Write, page: &Page) -> std::io::Result<()> {
    if page.is_empty() {
        writeln!(w, "{} No builds at this position.", info("i"))?;
        return Ok(());
    }

    for (idx, build) in page.builds.iter().enumerate() {
        writeln!(w, "{} {}", accent(&build.full_name), result_label(build.result))?;
        writeln!(w, "  id: {}", number(&build.id))?;
        writeln!(w, "  started (UTC): {}", format_millis(build.start_time_millis))?;
        writeln!(
            w,
            "  queued: {}",
            number(&format_duration_ms(
                build.start_time_millis.saturating_sub(build.queue_time_millis).max(0)
            ))
        )?;
        writeln!(w, "  duration: {}", number(&format_duration_ms(build.duration)))?;

        let built_on = if build.built_on.is_empty() {
            muted("controller")
        } else {
            build.built_on.clone()
        };
        writeln!(w, "  built on: {built_on}")?;

        if idx + 1 < page.builds.len() {
            writeln!(w)?;
        }
    }

    Ok(())
}

fn format_millis(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|at| {
            at.format(&time::macros::format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .ok()
        })
        .unwrap_or_else(|| "-".to_string())
}
