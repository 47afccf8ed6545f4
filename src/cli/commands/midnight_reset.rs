use crate::cli::commands::context::Context;
use crate::cli::parser::Cli;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{info, warning};

/// Handle the `midnight-reset` command: sessions still running from an
/// earlier day go offline and their entries wait for `resolve`.
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let ctx = Context::open(cli, cfg)?;
    let reset = ctx.service.reset_stale_sessions()?;

    if reset.is_empty() {
        info("No stale sessions.");
        return Ok(());
    }

    for user in &reset {
        ctx.audit(
            "midnight_reset",
            user.as_str(),
            "stale session reset to offline, entry awaits resolution",
        );
        warning(format!(
            "Session of {} reset; run `rworktime resolve <DATE> --user {}` to close its day",
            user, user
        ));
    }
    Ok(())
}
