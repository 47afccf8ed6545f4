use crate::cli::commands::context::{Context, describe, resolve_user};
use crate::cli::parser::Cli;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{header, info, warning};
use crate::utils::formatting::{mins2readable, yes_no};
use crate::utils::time::format_clock;

/// Handle the `status` command: session snapshot with live totals, plus
/// the ledger row of the session's day.
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let user = resolve_user(cli)?;
    let ctx = Context::open(cli, cfg)?;

    let Some(view) = ctx.service.status(&user)? else {
        info(format!("No session for {}.", user));
        return Ok(());
    };
    let session = &view.session;

    header(format!("Session of {}", user));
    println!("{}", describe(session));
    println!(
        "Worked now      : {}",
        mins2readable(view.live_worked_minutes, false, false)
    );
    println!(
        "Breaks          : {} ({})",
        session.temporary_stops.len(),
        mins2readable(view.live_stop_minutes, false, false)
    );
    if let Some(stop) = session.open_stop() {
        println!("On break since  : {}", format_clock(Some(stop.start_time)));
    }
    println!(
        "Payroll so far  : regular {}, overtime {}, lunch deducted {}",
        mins2readable(view.work_time.processed_minutes, false, true),
        mins2readable(view.work_time.overtime_minutes, false, true),
        yes_no(view.work_time.lunch_deducted)
    );
    if session.awaiting_resolution {
        warning(format!(
            "Day {} was reset while running; close it with `rworktime resolve {}`",
            session.work_date(),
            session.work_date()
        ));
    }

    if let Some(entry) = ctx.service.entry(&user, session.work_date())? {
        println!(
            "Ledger          : {} final {}",
            entry.sync_state.to_db_str(),
            mins2readable(entry.final_minutes(), false, true)
        );
    }
    Ok(())
}
