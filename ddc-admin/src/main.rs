use clap::{Parser, Subcommand};
use ddc_common::{
    calendar::popup::CalendarLinks, config::Config, picker::GroupPicker, signal::SignalAdminClient,
};
use itertools::Itertools;
use log::{LevelFilter, error, info};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config as LogConfig, Logger, Root},
    encode::pattern::PatternEncoder,
};
use prettytable::{Cell, Row, Table};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

mod matchday;
use matchday::parse_matchday_csv;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(long, short)]
    /// Path to the config file
    config: Option<PathBuf>,

    #[clap(long, short, action(clap::ArgAction::Count))]
    /// Increase the log verbosity
    verbose: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh the Signal recipient groups from the admin backend
    RefreshGroups {
        #[clap(long, short)]
        /// File in which the group selection is kept between runs
        state: Option<PathBuf>,
    },
    /// Write calendar files and links for a matchday schedule
    ExportCalendar {
        /// CSV schedule with Date, Time, and Summary columns
        schedule: PathBuf,

        #[clap(long, short, default_value = "Tournament")]
        /// Tournament name used in the event titles
        tournament: String,

        #[clap(long, short, default_value = ".")]
        /// Directory to write the calendar files into
        out: PathBuf,

        #[clap(long, short)]
        /// Also print the Google and Outlook links for each match
        links: bool,
    },
}

const APP_NAME: &str = "ddc_admin";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let log_level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    #[cfg(not(target_os = "windows"))]
    let console_target = Target::Stderr;
    #[cfg(target_os = "windows")]
    let console_target = Target::Stdout; // Windows apps don't get a stderr handle
    let console = ConsoleAppender::builder()
        .target(console_target)
        .encoder(Box::new(PatternEncoder::new("[{d} {h({l:5})} {M}] {m}{n}")))
        .build();

    // Setup the logging from all locations to use `LevelFilter::Error`
    let root = Root::builder().appender("console");
    let root = root.build(LevelFilter::Error);

    // Setup the top level logging config
    let log_config =
        LogConfig::builder().appender(Appender::builder().build("console", Box::new(console)));

    let log_config = log_config
        .logger(Logger::builder().build(APP_NAME, log_level)) // Setup the logging from this app to use `log_level`
        .logger(Logger::builder().build("ddc_common", log_level))
        .build(root)
        .unwrap();

    log4rs::init_config(log_config).unwrap();
    if args.verbose > 0 {
        log_panics::init();
    }

    let config = match args.config {
        Some(path) => {
            info!("Reading config file from {}", path.display());
            Config::new_from_file(path)?
        }
        None => Config::default(),
    };

    match args.command {
        Command::RefreshGroups { state } => refresh_groups(&config, state).await,
        Command::ExportCalendar {
            schedule,
            tournament,
            out,
            links,
        } => export_calendar(&schedule, &tournament, &out, links),
    }
}

async fn refresh_groups(
    config: &Config,
    state: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = SignalAdminClient::new(
        &config.admin_api.url,
        config.admin_api.require_https,
        config.admin_api.timeout(),
    )?;

    let mut picker = match &state {
        Some(path) if path.exists() => {
            info!("Loading group selection from {}", path.display());
            serde_json::from_str(&std::fs::read_to_string(path)?)?
        }
        _ => GroupPicker::new(),
    };

    info!("Refreshing Signal groups from {}", config.admin_api.url);
    let notice = picker.refresh(&client).await?;

    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(vec![
        Cell::new("Id"),
        Cell::new("Label"),
        Cell::new("Selected"),
    ]));
    for option in picker.options() {
        table.add_row(Row::new(vec![
            Cell::new(&option.id),
            Cell::new(&option.label),
            Cell::new(if option.selected { "yes" } else { "no" }),
        ]));
    }
    println!("{table}");

    if notice.is_success() {
        info!("{notice}");
        if let Some(path) = state {
            info!("Saving group selection to {}", path.display());
            std::fs::write(path, serde_json::to_string_pretty(&picker)?)?;
        }
        Ok(())
    } else {
        // A failed refresh must not overwrite the saved selection
        error!("{notice}");
        Err(notice.to_string().into())
    }
}

fn export_calendar(
    schedule: &Path,
    tournament: &str,
    out: &Path,
    links: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Reading matchday csv: {}", schedule.display());
    let csv = std::fs::read_to_string(schedule)?;
    let events = parse_matchday_csv(&csv)?;
    info!(
        "Parsed {} match(es) across {} day(s)",
        events.len(),
        events.iter().map(|e| e.date).unique().count()
    );

    std::fs::create_dir_all(out)?;
    let now = OffsetDateTime::now_utc();
    for event in &events {
        let file_path = out.join(event.ics_file_name());
        info!("Writing {}", file_path.display());
        std::fs::write(&file_path, event.ics(tournament, now))?;
    }

    if links {
        let mut table = Table::new();
        table.set_format(*prettytable::format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.set_titles(Row::new(vec![
            Cell::new("Match"),
            Cell::new("Google"),
            Cell::new("Outlook"),
        ]));
        for event in &events {
            let links = CalendarLinks::build(event, tournament);
            table.add_row(Row::new(vec![
                Cell::new(&event.to_string()),
                Cell::new(&links.google),
                Cell::new(&links.outlook),
            ]));
        }
        println!("{table}");
    }

    Ok(())
}
