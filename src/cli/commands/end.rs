use crate::cli::commands::context::{Context, resolve_user};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::errors::AppResult;
use crate::utils::time::parse_optional_datetime_on;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::End { end, minutes } = &cli.command {
        let user = resolve_user(cli)?;
        let ctx = Context::open(cli, cfg)?;

        let end_time = parse_optional_datetime_on(end.as_ref(), ctx.today())?;
        let outcome = ctx.service.end_day(&user, end_time, *minutes)?;
        ctx.report("end", &user, &outcome);
    }
    Ok(())
}
