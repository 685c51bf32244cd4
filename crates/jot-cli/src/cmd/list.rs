//! `jot list` — print the current snapshot.

use crate::output::{OutputMode, pretty_section, render_list_to};
use jot_core::context::AppContext;
use jot_core::model::Snapshot;
use std::io::{self, Write};

pub async fn run_list(ctx: &AppContext, output: OutputMode) -> anyhow::Result<()> {
    let snapshot = ctx.store().snapshot().await?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_snapshot(&mut out, &snapshot, output)?;
    Ok(())
}

/// Render every task in `snapshot`.
///
/// JSON output is the bare array of records; `jot watch` wraps it with the
/// revision instead.
pub fn write_snapshot(out: &mut dyn Write, snapshot: &Snapshot, output: OutputMode) -> io::Result<()> {
    if output == OutputMode::Pretty {
        pretty_section(
            out,
            &format!("Tasks ({}, {} done)", snapshot.len(), snapshot.completed()),
        )?;
        if snapshot.is_empty() {
            return writeln!(out, "No tasks yet. Add one with `jot add <TEXT>`.");
        }
    }
    render_list_to(out, snapshot.tasks(), output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jot_core::model::TaskRecord;

    fn snapshot() -> Snapshot {
        Snapshot::new(
            4,
            vec![
                TaskRecord {
                    id: 1,
                    text: "buy milk".into(),
                    is_completed: true,
                },
                TaskRecord {
                    id: 2,
                    text: "call mom".into(),
                    is_completed: false,
                },
            ],
        )
    }

    fn render(snapshot: &Snapshot, output: OutputMode) -> String {
        let mut buf = Vec::new();
        write_snapshot(&mut buf, snapshot, output).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn pretty_has_summary_heading() {
        let out = render(&snapshot(), OutputMode::Pretty);
        assert!(out.starts_with("Tasks (2, 1 done)\n"));
        assert!(out.contains("[x] #1"));
        assert!(out.contains("[ ] #2"));
    }

    #[test]
    fn pretty_empty_points_at_add() {
        let out = render(&Snapshot::default(), OutputMode::Pretty);
        assert!(out.contains("No tasks yet"));
    }

    #[test]
    fn text_is_plain_rows() {
        let out = render(&snapshot(), OutputMode::Text);
        assert_eq!(out, "ID  STATE  TEXT\n1  done  buy milk\n2  open  call mom\n");
    }
}
