use crate::output::{bold, info, muted, number};
use std::io::Write;

#[derive(Debug, Clone)]
pub struct JobRow {
    pub name: String,
    pub builds: usize,
    pub latest: Option<u64>,
}

pub fn print_jobs(mut w: impl Write, rows: &[JobRow]) -> std::io::Result<()> {
    if rows.is_empty() {
        writeln!(w, "{} {}", info("i"), muted("No jobs recorded yet."))?;
        return Ok(());
    }

    for (idx, row) in rows.iter().enumerate() {
        writeln!(w, "{}", bold(&row.name))?;
        writeln!(w, "  builds: {}", number(&row.builds.to_string()))?;

        let latest = match row.latest {
            Some(n) => number(&format!("#{n}")),
            None => muted("-"),
        };
        writeln!(w, "  latest: {latest}")?;

        if idx + 1 < rows.len() {
            writeln!(w)?;
        }
    }

    Ok(())
}
