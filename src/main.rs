//! classroom-analytics: Campus classroom utilization engine
//!
//! Usage:
//!   classroom-analytics import-schedule <file.csv>     Load a schedule export
//!   classroom-analytics import-classrooms <file.csv>   Load a room inventory
//!   classroom-analytics occupancy [--buildings A,B]    Rooms in use per block
//!   classroom-analytics used <day> <start> <end>       Rooms in use for a window
//!   classroom-analytics room <name>                    A room's weekly schedule

use std::env;

use anyhow::Result;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

use classroom_analytics::cli::{
    blocks_command, buildings_command, import_classrooms_command, import_schedule_command,
    next_command, occupancy_command, parse_buildings_arg, prev_command, room_command,
    status_command, used_command,
};
use classroom_analytics::config;

fn main() -> Result<()> {
    let raw: Vec<String> = env::args().collect();

    let verbose = raw.iter().any(|a| a == "--verbose" || a == "-v");
    let buildings_arg = raw
        .iter()
        .position(|a| a == "--buildings")
        .map(|i| raw.get(i + 1).map(|s| s.as_str()).unwrap_or(""));
    let buildings = parse_buildings_arg(buildings_arg);

    // Positional arguments, with flags and their values removed
    let mut args: Vec<&str> = Vec::new();
    let mut iter = raw.iter().map(|s| s.as_str());
    while let Some(arg) = iter.next() {
        match arg {
            "--verbose" | "-v" => {}
            "--buildings" => {
                iter.next();
            }
            _ => args.push(arg),
        }
    }

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    setup_logging(if verbose { Level::DEBUG } else { Level::INFO });
    let config = config::load_from_env()?;
    config.log_config();
    debug!("Building filter: {}", buildings);

    match args[1] {
        "import-schedule" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: classroom-analytics import-schedule <file.csv>");
                return Ok(());
            };
            import_schedule_command(&config, path)?;
        }
        "import-classrooms" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: classroom-analytics import-classrooms <file.csv>");
                return Ok(());
            };
            import_classrooms_command(&config, path)?;
        }
        "buildings" => {
            buildings_command()?;
        }
        "blocks" => {
            blocks_command(&config, &buildings)?;
        }
        "occupancy" => {
            occupancy_command(&config, &buildings)?;
        }
        "used" => {
            if args.len() < 5 {
                eprintln!(
                    "Usage: classroom-analytics used <day> <HH:MM> <HH:MM> [--buildings A,B]"
                );
                return Ok(());
            }
            used_command(&config, args[2], args[3], args[4], &buildings)?;
        }
        "room" => {
            let Some(name) = args.get(2) else {
                eprintln!("Usage: classroom-analytics room <BUILDING-ROOM>");
                return Ok(());
            };
            room_command(&config, name)?;
        }
        "prev" | "next" => {
            if args.len() < 4 {
                eprintln!("Usage: classroom-analytics {} <day> <HH:MM> [--buildings A,B]", args[1]);
                return Ok(());
            }
            if args[1] == "prev" {
                prev_command(&config, args[2], args[3], &buildings)?;
            } else {
                next_command(&config, args[2], args[3], &buildings)?;
            }
        }
        "status" => {
            status_command(&config)?;
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "--version" | "-V" | "version" => {
            print_version();
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
        }
    }

    Ok(())
}

fn print_usage() {
    println!(
        r#"classroom-analytics: Campus classroom utilization engine

USAGE:
    classroom-analytics <COMMAND> [OPTIONS]

COMMANDS:
    import-schedule <file.csv>      Load a registrar schedule export
    import-classrooms <file.csv>    Load a classroom inventory export
    buildings                       List building codes and names
    blocks                          Weekly time blocks
    occupancy                       Distinct rooms in use per block
    used <day> <start> <end>        Rooms in use for a whole window
    room <BUILDING-ROOM>            A room's weekly schedule
    prev <day> <HH:MM>              Start of the block ending at a time
    next <day> <HH:MM>              End of the block starting at a time
    status                          Show store statistics
    help                            Show this help message

OPTIONS:
    --buildings <A,B,...>   Restrict to these building codes ("" for none)
    --verbose, -v           Debug logging

ENVIRONMENT:
    CLASSROOM_DB              Store path (default: .classroom-analytics/analytics.db)
    CLASSROOM_IN_MEMORY       1 to use a throwaway in-memory store
    CLASSROOM_REPLACE_SCOPE   term (default) or all

EXAMPLES:
    classroom-analytics import-schedule Spring2024.csv
    classroom-analytics occupancy --buildings SIMP,STCH
    classroom-analytics used M 08:00 08:50
    classroom-analytics room SIMP-120
    classroom-analytics next th 09:30
"#
    );
}

fn print_version() {
    println!("classroom-analytics {}", env!("CARGO_PKG_VERSION"));
}

fn setup_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}
