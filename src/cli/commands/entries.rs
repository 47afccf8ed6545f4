use crate::cli::commands::context::{Context, resolve_user};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::errors::AppResult;
use crate::models::worktime_entry::WorktimeEntry;
use crate::ui::messages::info;
use crate::utils::colors::{color_for_overtime, color_for_sync_state, paint};
use crate::utils::date::parse_period;
use crate::utils::formatting::{describe_time_off, mins2readable, yes_no};
use crate::utils::table::{Column, Table};
use crate::utils::time::format_clock;

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::Entries { period, json } = &cli.command {
        let user = resolve_user(cli)?;
        let ctx = Context::open(cli, cfg)?;

        let (from, to) = parse_period(period.as_deref(), ctx.today())?;
        let entries = ctx.service.entries(&user, from, to)?;

        if *json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        if entries.is_empty() {
            info(format!("No worktime entries for {} between {} and {}.", user, from, to));
            return Ok(());
        }

        print!("{}", render(&entries));
        let total: i64 = entries.iter().map(|e| e.final_minutes()).sum();
        let overtime: i64 = entries.iter().map(|e| e.total_overtime_minutes).sum();
        println!(
            "\nTotal: {} (overtime {})",
            mins2readable(total, false, false),
            mins2readable(overtime, false, false)
        );
    }
    Ok(())
}

fn render(entries: &[WorktimeEntry]) -> String {
    let mut table = Table::new(vec![
        Column::left("Date"),
        Column::left("Start"),
        Column::left("End"),
        Column::right("Breaks"),
        Column::right("Worked"),
        Column::right("Regular"),
        Column::right("Overtime"),
        Column::left("Lunch"),
        Column::left("Time off"),
        Column::left("State"),
    ]);

    for e in entries {
        table.add_row(vec![
            e.work_date.to_string(),
            format_clock(e.day_start_time),
            format_clock(e.day_end_time),
            format!(
                "{} ({})",
                e.temporary_stop_count,
                mins2readable(e.total_temporary_stop_minutes, false, true)
            ),
            mins2readable(e.total_worked_minutes, false, true),
            mins2readable(e.regular_minutes, false, true),
            paint(
                color_for_overtime(e.total_overtime_minutes),
                &mins2readable(e.total_overtime_minutes, true, true),
            ),
            yes_no(e.lunch_break_deducted).to_string(),
            describe_time_off(e).to_string(),
            paint(color_for_sync_state(e.sync_state), e.sync_state.to_db_str()),
        ]);
    }

    table.render()
}
