use crate::cli::commands::context::{Context, resolve_user};
use crate::cli::parser::Cli;
use crate::config::Config;
use crate::errors::AppResult;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let user = resolve_user(cli)?;
    let ctx = Context::open(cli, cfg)?;

    let outcome = ctx.service.start_temporary_stop(&user)?;
    ctx.report("pause", &user, &outcome);
    Ok(())
}
