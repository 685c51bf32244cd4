//! `jot profile` — fetch a public profile once and print the outcome.
//!
//! A failed fetch is an outcome, not a crash: it is printed like any other
//! state and the command exits 0 unless `--strict` is given.

use crate::output::{CodedError, OutputMode, pretty_kv, pretty_section, render_mode};
use clap::Args;
use jot_core::context::AppContext;
use jot_core::error::ErrorCode;
use jot_core::model::ProfileView;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Handle to look up. Defaults to `profile.handle` from the config.
    pub handle: Option<String>,

    /// Exit non-zero when the profile could not be loaded.
    #[arg(long)]
    pub strict: bool,
}

pub async fn run_profile(
    ctx: &AppContext,
    args: &ProfileArgs,
    output: OutputMode,
) -> anyhow::Result<()> {
    let handle = args.handle.as_deref().unwrap_or_else(|| ctx.default_handle());
    let outcome = ctx.profile_fetcher().fetch(handle).await;

    render_mode(output, &outcome, write_text, write_pretty)?;

    match outcome.error() {
        Some(message) if args.strict => Err(CodedError::new(
            ErrorCode::ProfileFetchFailed,
            format!("profile {handle}: {message}"),
        )
        .into()),
        _ => Ok(()),
    }
}

fn write_text(view: &ProfileView, w: &mut dyn Write) -> io::Result<()> {
    match view {
        ProfileView::Loading => writeln!(w, "state  loading"),
        ProfileView::Loaded(profile) => {
            writeln!(w, "state  loaded")?;
            writeln!(w, "handle  {}", profile.handle)?;
            writeln!(w, "avatar  {}", profile.avatar_url)?;
            writeln!(w, "name  {}", profile.display_name_or_default())?;
            writeln!(w, "bio  {}", profile.bio_or_default())
        }
        ProfileView::Failed(message) => {
            writeln!(w, "state  failed")?;
            writeln!(w, "error  {message}")
        }
    }
}

fn write_pretty(view: &ProfileView, w: &mut dyn Write) -> io::Result<()> {
    match view {
        ProfileView::Loading => writeln!(w, "Loading..."),
        ProfileView::Loaded(profile) => {
            pretty_section(w, &format!("@{}", profile.handle))?;
            pretty_kv(w, "Avatar", &profile.avatar_url)?;
            pretty_kv(w, "Name", profile.display_name_or_default())?;
            pretty_kv(w, "Bio", profile.bio_or_default())
        }
        ProfileView::Failed(message) => writeln!(w, "✗ {message}"),
    }
}
