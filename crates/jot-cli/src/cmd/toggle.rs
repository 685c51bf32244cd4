//! `jot toggle` — flip the completion flag of one task.

use crate::output::{CodedError, OutputMode, Renderable, render_mode};
use clap::Args;
use jot_core::context::AppContext;
use jot_core::error::ErrorCode;

#[derive(Args, Debug)]
pub struct ToggleArgs {
    /// Task id, as shown by `jot list`.
    pub id: i64,
}

fn not_found(id: i64) -> CodedError {
    CodedError::new(ErrorCode::ItemNotFound, format!("no task with id {id}"))
}

pub async fn run_toggle(
    ctx: &AppContext,
    args: &ToggleArgs,
    output: OutputMode,
) -> anyhow::Result<()> {
    let service = ctx.task_service();
    let current = service
        .store()
        .get(args.id)
        .await?
        .ok_or_else(|| not_found(args.id))?;
    // The task can disappear between the read and the write only if another
    // process deletes rows behind our back.
    let toggled = service
        .toggle_task(&current)
        .await?
        .ok_or_else(|| not_found(args.id))?;

    render_mode(
        output,
        &toggled,
        |record, w| record.render_table(w),
        |record, w| {
            let state = if record.is_completed { "done" } else { "not done" };
            writeln!(w, "✓ Task #{} marked {state}: {}", record.id, record.text)
        },
    )
}
