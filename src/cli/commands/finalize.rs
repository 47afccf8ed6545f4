use crate::cli::commands::context::{Context, resolve_user};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::success;
use crate::utils::date::parse_date;
use crate::utils::formatting::mins2readable;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::Finalize {
        date,
        worked,
        overtime,
    } = &cli.command
    {
        let user = resolve_user(cli)?;
        let ctx = Context::open(cli, cfg)?;

        let date = parse_date(date)?;
        let entry = ctx.service.finalize_entry(&user, date, *worked, *overtime)?;

        let message = format!(
            "{} finalized: regular {}, overtime {}",
            entry.work_date,
            mins2readable(entry.regular_minutes, false, true),
            mins2readable(entry.total_overtime_minutes, false, true)
        );
        ctx.audit("finalize", user.as_str(), &message);
        success(message);
    }
    Ok(())
}
