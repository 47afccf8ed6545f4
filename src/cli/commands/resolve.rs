use crate::cli::commands::context::{Context, resolve_user};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::errors::AppResult;
use crate::utils::date::parse_date;
use crate::utils::time::parse_optional_datetime_on;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::Resolve { date, end } = &cli.command {
        let user = resolve_user(cli)?;
        let ctx = Context::open(cli, cfg)?;

        let date = parse_date(date)?;
        // A bare HH:MM refers to the day being resolved.
        let end_time = parse_optional_datetime_on(end.as_ref(), date)?;
        let outcome = ctx.service.resolve_work_time_entry(&user, date, end_time)?;
        ctx.report("resolve", &user, &outcome);
    }
    Ok(())
}
