//! `jot add` — create a task.

use crate::output::{OutputMode, Renderable, render_mode};
use clap::Args;
use jot_core::context::AppContext;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task text. Stored exactly as given.
    pub text: String,
}

pub async fn run_add(ctx: &AppContext, args: &AddArgs, output: OutputMode) -> anyhow::Result<()> {
    let record = ctx.task_service().add_task(args.text.clone()).await?;
    render_mode(
        output,
        &record,
        |record, w| record.render_table(w),
        |record, w| writeln!(w, "✓ Added task #{}: {}", record.id, record.text),
    )
}
