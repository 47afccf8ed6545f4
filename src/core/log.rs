use crate::db::log::{AuditRow, load_audit};
use crate::errors::AppResult;
use crate::utils::table::visible_len;
use ansi_term::Colour;
use rusqlite::Connection;

const OP_WIDTH_MAX: usize = 48;

/// Color of an audit operation.
fn color_for_operation(op: &str) -> Colour {
    match op {
        "start" => Colour::Green,
        "pause" | "resume" => Colour::Yellow,
        "end" => Colour::Blue,
        "auto_end" => Colour::Cyan,
        "resolve" | "midnight_reset" => Colour::Red,
        "finalize" => Colour::Purple,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

/// Operation painted, target appended and cut to fit the column.
fn op_target(row: &AuditRow) -> String {
    let color = color_for_operation(&row.operation);
    let op = color.paint(row.operation.as_str()).to_string();
    if row.target.is_empty() {
        return op;
    }

    let room = OP_WIDTH_MAX.saturating_sub(row.operation.chars().count() + 3);
    let target = if row.target.chars().count() > room {
        let mut t: String = row.target.chars().take(room.saturating_sub(3)).collect();
        t.push_str("...");
        t
    } else {
        row.target.clone()
    };
    format!("{} ({})", op, target)
}

pub struct LogLogic;

impl LogLogic {
    /// Print the audit trail, optionally narrowed to one operation.
    pub fn print_log(conn: &Connection, operation: Option<&str>) -> AppResult<()> {
        let rows = load_audit(conn, operation)?;

        if rows.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let labels: Vec<String> = rows
            .iter()
            .map(op_target)
            .collect();

        let op_w = labels.iter().map(|l| visible_len(l)).max().unwrap_or(10);
        let id_w = rows.iter().map(|r| r.id.to_string().len()).max().unwrap_or(1);
        let date_w = rows.iter().map(|r| r.date.len()).max().unwrap_or(10);

        println!("📜 Internal log:\n");

        for (row, label) in rows.iter().zip(labels) {
            let date = chrono::DateTime::parse_from_rfc3339(&row.date)
                .map(|dt| dt.format("%F %T").to_string())
                .unwrap_or_else(|_| row.date.clone());
            let padding = " ".repeat(op_w.saturating_sub(visible_len(&label)));

            println!(
                "{:>id_w$}: {:<date_w$} | {}{} => {}",
                row.id,
                date,
                label,
                padding,
                row.message,
                id_w = id_w,
                date_w = date_w
            );
        }

        Ok(())
    }
}
