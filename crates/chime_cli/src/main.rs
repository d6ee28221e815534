//! Command-line front end for Chime.
//!
//! # Responsibility
//! - Wire config, logging, the SQLite store and the SQLite sink into one
//!   explicitly constructed `ReminderService`.
//! - Map each subcommand onto a single service use case.

use chime_core::db::open_db;
use chime_core::schedule::split_offset;
use chime_core::{
    core_version, decompose, init_from_config, ChimeConfig, RecurrenceScheduler, Reminder,
    ReminderId, ReminderService, ScheduleReport, SinkFailure, SqliteNotificationSink,
    SqliteReminderStore,
};
use log::warn;
use std::error::Error;
use std::path::PathBuf;

const USAGE: &str = "usage: chime [--config PATH] <command>

commands:
  add <title> <body> [TIME...]          create a reminder (TIME is HH:MM or fractional hours)
  update <id> <title> <body> [TIME...]  replace a reminder and reschedule it
  remove <id>                           cancel and delete a reminder
  list                                  show stored reminders
  pending                               show scheduled notifications
  resync                                reschedule every stored reminder
  version                               print the core version";

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run(args) {
        eprintln!("chime: {err}");
        std::process::exit(1);
    }
}

fn run(args: Vec<String>) -> CliResult<()> {
    let (config_path, args) = split_config_flag(args)?;
    let Some((command, rest)) = args.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    if command == "version" {
        println!("chime_core version={}", core_version());
        return Ok(());
    }

    let config = ChimeConfig::load(config_path.as_deref())?;
    if let Err(err) = init_from_config(&config) {
        eprintln!("chime: logging disabled: {err}");
    }

    let conn = open_db(&config.db_path)?;
    let sink = SqliteNotificationSink::new(&conn);
    let service = ReminderService::new(
        SqliteReminderStore::new(&conn),
        RecurrenceScheduler::new(&sink, config.timezone()?),
    );

    match (command.as_str(), rest) {
        ("add", [title, body, times @ ..]) => {
            let reminder = Reminder::new(title.as_str(), body.as_str(), parse_times(times)?);
            let created = service.create(reminder)?;
            let id = created.reminder.id.unwrap_or_default();
            println!("created reminder {id}");
            print_schedule(&created.schedule);
        }
        ("update", [id, title, body, times @ ..]) => {
            let reminder = Reminder::new(title.as_str(), body.as_str(), parse_times(times)?)
                .with_id(parse_id(id)?);
            let report = service.update(&reminder)?;
            print_failures("cancel", &report.cancel.failures);
            print_schedule(&report.schedule);
        }
        ("remove", [id]) => {
            let report = service.delete(parse_id(id)?)?;
            print_failures("cancel", &report.failures);
            println!("removed reminder {id}");
        }
        ("list", []) => {
            for reminder in service.list()? {
                println!(
                    "{}\t{}\t{}",
                    reminder.id.unwrap_or_default(),
                    reminder.title,
                    format_times(&reminder.times)
                );
            }
        }
        ("pending", []) => {
            for notification in sink.pending()? {
                let (reminder_id, slot) = decompose(notification.id);
                println!(
                    "{}\treminder={} slot={}\tnext={}\tdaily_at={}\t{}",
                    notification.id,
                    reminder_id,
                    slot,
                    notification.first_fire.to_rfc3339(),
                    notification.daily_at,
                    notification.title
                );
            }
        }
        ("resync", []) => {
            let report = service.resync_all()?;
            for (id, err) in &report.rejected {
                eprintln!("reminder {id} skipped: {err}");
            }
            println!(
                "rescheduled {} reminders in {}",
                report.rescheduled.len(),
                service.scheduler().timezone()
            );
        }
        _ => return Err(USAGE.into()),
    }

    Ok(())
}

fn split_config_flag(args: Vec<String>) -> CliResult<(Option<PathBuf>, Vec<String>)> {
    let mut config_path = std::env::var_os("CHIME_CONFIG").map(PathBuf::from);
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter.next().ok_or("--config requires a path")?;
            config_path = Some(PathBuf::from(path));
        } else {
            rest.push(arg);
        }
    }

    Ok((config_path, rest))
}

fn parse_id(value: &str) -> CliResult<ReminderId> {
    value
        .parse::<ReminderId>()
        .map_err(|err| format!("invalid reminder id `{value}`: {err}").into())
}

fn parse_times(values: &[String]) -> CliResult<Vec<f64>> {
    values.iter().map(|value| parse_time(value)).collect()
}

/// Accepts `HH:MM` or fractional hours such as `22.5`.
fn parse_time(value: &str) -> CliResult<f64> {
    let invalid = || format!("invalid time `{value}`; expected HH:MM or hours like 22.5");

    let hours = match value.split_once(':') {
        Some((hours, minutes)) => {
            let hours: u32 = hours.parse().map_err(|_| invalid())?;
            let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
            if minutes >= 60 {
                return Err(invalid().into());
            }
            f64::from(hours) + f64::from(minutes) / 60.0
        }
        None => value.parse::<f64>().map_err(|_| invalid())?,
    };

    // [0, 24) is checked by the core.
    Ok(hours)
}

fn format_times(times: &[f64]) -> String {
    times
        .iter()
        .map(|&offset| match split_offset(offset) {
            Ok((fire_time, _)) => fire_time.to_string(),
            Err(_) => format!("?{offset}"),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn print_schedule(report: &ScheduleReport) {
    for notification in &report.scheduled {
        println!(
            "  occurrence {} first fires {} then daily at {}",
            notification.id,
            notification.first_fire.to_rfc3339(),
            notification.daily_at
        );
    }
    print_failures("schedule", &report.failures);
}

fn print_failures(action: &str, failures: &[SinkFailure]) {
    for failure in failures {
        warn!(
            "event=cli_sink_failure module=cli status=error action={} occurrence_id={}",
            action, failure.occurrence
        );
        eprintln!(
            "  {action} failed for occurrence {}: {}",
            failure.occurrence, failure.error
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{format_times, parse_time, split_config_flag};
    use std::path::PathBuf;

    #[test]
    fn parse_time_accepts_clock_and_fractional_forms() {
        assert_eq!(parse_time("22:30").expect("clock form"), 22.5);
        assert_eq!(parse_time("7.25").expect("fractional form"), 7.25);
        assert!(parse_time("7:75").is_err());
        assert!(parse_time("noon").is_err());
    }

    #[test]
    fn format_times_renders_wall_clock() {
        assert_eq!(format_times(&[22.5, 8.0]), "22:30,08:00");
    }

    #[test]
    fn config_flag_is_extracted_anywhere() {
        let args = vec![
            "list".to_string(),
            "--config".to_string(),
            "/etc/chime.toml".to_string(),
        ];
        let (path, rest) = split_config_flag(args).expect("flag parses");
        assert_eq!(path, Some(PathBuf::from("/etc/chime.toml")));
        assert_eq!(rest, vec!["list".to_string()]);
    }
}
