use crate::cli::commands::context::{Context, resolve_user};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::errors::AppResult;
use crate::utils::time::parse_optional_datetime_on;

/// Handle the `auto-end` command (scheduler hook).
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::AutoEnd { end } = &cli.command {
        let user = resolve_user(cli)?;
        let ctx = Context::open(cli, cfg)?;

        let scheduled_end = parse_optional_datetime_on(end.as_ref(), ctx.today())?
            .unwrap_or_else(|| ctx.clock.now());
        let outcome = ctx.service.auto_end_session(&user, scheduled_end)?;
        ctx.report("auto_end", &user, &outcome);
    }
    Ok(())
}
