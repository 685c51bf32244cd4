//! `jot watch` — follow the task table as it changes.
//!
//! Prints the current snapshot, then one snapshot per change. Other `jot`
//! processes write through their own connections, so the store is polled for
//! foreign commits every [`EXTERNAL_POLL`].

use super::list::write_snapshot;
use crate::output::{OutputMode, Renderable};
use clap::Args;
use jot_core::context::AppContext;
use jot_core::model::{Snapshot, TaskRecord};
use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// How often to check the database for commits made by other processes.
pub const EXTERNAL_POLL: Duration = Duration::from_millis(250);

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Stop after this many snapshots (the initial one included).
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}

/// One line of `jot watch --json` output.
#[derive(Debug, Serialize)]
struct SnapshotLine<'a> {
    revision: u64,
    tasks: &'a [TaskRecord],
}

impl Renderable for Snapshot {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "revision {}", self.revision())?;
        write_snapshot(w, self, OutputMode::Pretty)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        let line = SnapshotLine {
            revision: self.revision(),
            tasks: self.tasks(),
        };
        serde_json::to_writer(w, &line).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "revision {}", self.revision())?;
        write_snapshot(w, self, OutputMode::Text)
    }
}

pub async fn run_watch(ctx: &AppContext, args: &WatchArgs, output: OutputMode) -> anyhow::Result<()> {
    let mut subscription = ctx.store().subscribe().await?;
    let mut seen = 0_usize;
    let mut poll = tokio::time::interval(EXTERNAL_POLL);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    info!(limit = ?args.count, "watching tasks");

    loop {
        if args.count.is_some_and(|limit| seen >= limit) {
            break;
        }
        let next = tokio::select! {
            next = subscription.next() => next,
            _ = poll.tick() => {
                ctx.store().refresh().await?;
                continue;
            }
            _ = &mut interrupted => {
                debug!("interrupted");
                None
            }
        };
        let Some(snapshot) = next else {
            break;
        };
        seen += 1;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        crate::output::render_item_to(&mut out, &snapshot, output)?;
        out.flush()?;
    }

    Ok(())
}
