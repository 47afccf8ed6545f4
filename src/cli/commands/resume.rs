use crate::cli::commands::context::{Context, resolve_user};
use crate::cli::parser::Cli;
use crate::config::Config;
use crate::errors::AppResult;

/// Handle the `resume` command: closes the running break, or reopens a
/// day ended earlier today.
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let user = resolve_user(cli)?;
    let ctx = Context::open(cli, cfg)?;

    let outcome = ctx.service.resume(&user)?;
    ctx.report("resume", &user, &outcome);
    Ok(())
}
