pub mod range;
pub mod render;

use std::{env, path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use chrono::{DateTime, Local, NaiveTime};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::io;
use tracing::level_filters::LevelFilter;

use crate::{
    gateway::{
        reconcile::{reconcile, EditedField},
        CheckinForm, Gateway, TIME_FORMAT,
    },
    notify::{self, Notification},
    store::{
        checkin::CheckinId,
        collection::CheckinCollection,
        error::StoreError,
        persist::JsonFileStorage,
    },
    utils::{
        clock::{Clock, DefaultClock},
        logging::{enable_logging, CLI_PREFIX},
        time::{format_date, format_time_of_day},
    },
    views::{listing, stats, tag_cache, text_log},
};

use self::range::RangeArgs;

#[derive(Parser, Debug)]
#[command(name = "Checkin", version, long_about = None)]
#[command(about = "Local-first check-in tracker with live queries", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Log a new check-in")]
    Add {
        #[arg(long, help = "Day the entry is logged against, YYYY-MM-DD. Defaults to today")]
        date: Option<String>,
        #[arg(long, help = "Start time of day, HH:MM. Defaults to now")]
        time: Option<String>,
        #[arg(long, help = "Duration in hours")]
        duration: Option<String>,
        #[arg(long, help = "End time of day, HH:MM. Alternative to --duration")]
        end: Option<String>,
        #[arg(long, help = "Tag. Whitespace collapses to hyphens")]
        tag: String,
        #[arg(help = "Comma-separated description of activities")]
        activities: String,
    },
    #[command(about = "Edit fields of an existing check-in")]
    Edit {
        id: String,
        #[arg(long, help = "Day the entry is logged against, YYYY-MM-DD")]
        date: Option<String>,
        #[arg(long, help = "Start time of day, HH:MM")]
        time: Option<String>,
        #[arg(long, help = "Duration in hours")]
        duration: Option<String>,
        #[arg(long, help = "Tag. Whitespace collapses to hyphens")]
        tag: Option<String>,
        #[arg(long, help = "Comma-separated description of activities")]
        activities: Option<String>,
    },
    #[command(about = "Delete a check-in")]
    Delete { id: String },
    #[command(about = "List check-ins for a period, paginated")]
    List {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long, default_value_t = 1, help = "Page number, 10 check-ins per page")]
        page: usize,
        #[arg(long, help = "Only check-ins with this tag")]
        tag: Option<String>,
    },
    #[command(about = "Print the grouped daily text log")]
    Log {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long, help = "Keep running and reprint whenever the data changes")]
        watch: bool,
    },
    #[command(about = "Per-tag duration statistics for a period")]
    Stats {
        #[command(flatten)]
        range: RangeArgs,
    },
    #[command(about = "Every tag ever used, for autocompletion")]
    Tags {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => dir,
        None => create_application_default_path()?,
    };
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    let collection = Arc::new(
        CheckinCollection::open(
            Box::new(JsonFileStorage::new(&dir)?),
            Box::new(DefaultClock),
        )
        .await?,
    );

    let result = dispatch(args.commands, collection).await;
    if let Err(e) = &result {
        notify::update(Notification::error(e.to_string()));
        eprintln!("{}", render::notification(&notify::read()));
    }
    result
}

async fn dispatch(command: Commands, collection: Arc<CheckinCollection>) -> Result<()> {
    match command {
        Commands::Add {
            date,
            time,
            duration,
            end,
            tag,
            activities,
        } => {
            let now = local_now();
            let time = time.unwrap_or_else(|| format_time_of_day(now));
            let form = CheckinForm {
                record_date: date.unwrap_or_else(|| format_date(now.date_naive())),
                duration: resolve_duration(&time, duration, end)?,
                start_time: time,
                tag,
                activities,
            };
            let gateway = Gateway::new(collection, Box::new(DefaultClock));
            let id = gateway.create(&form).await?;
            println!("Checked in {id}");
            Ok(())
        }
        Commands::Edit {
            id,
            date,
            time,
            duration,
            tag,
            activities,
        } => {
            let id: CheckinId = id.as_str().into();
            let Some(current) = collection.get(&id).await else {
                bail!(StoreError::NotFound(id));
            };
            // untouched fields keep their present value
            let form = CheckinForm {
                record_date: date.unwrap_or_else(|| format_date(current.record_date)),
                start_time: time.unwrap_or_else(|| format_time_of_day(current.start_time)),
                duration: duration.unwrap_or_else(|| current.duration.to_string()),
                tag: tag.unwrap_or_else(|| current.tag.clone()),
                activities: activities.unwrap_or_else(|| current.activities.clone()),
            };
            let gateway = Gateway::new(collection, Box::new(DefaultClock));
            gateway.edit(&id, &form).await?;
            println!("Updated {id}");
            Ok(())
        }
        Commands::Delete { id } => {
            let id: CheckinId = id.as_str().into();
            match collection.delete(&id).await {
                Ok(()) => println!("Deleted {id}"),
                Err(StoreError::NotFound(_)) => println!("Check-in {id} is already gone"),
                Err(e) => return Err(e.into()),
            }
            Ok(())
        }
        Commands::List { range, page, tag } => {
            let range = range::resolve_range(&range)?;
            let handle =
                listing::subscribe_listing(collection, range, tag.as_deref(), page).await;
            println!("{}", render::listing(&handle.current(), page));
            Ok(())
        }
        Commands::Log { range, watch } => {
            let range = range::resolve_range(&range)?;
            let handle = text_log::subscribe_log(collection, range).await;
            if watch {
                let mut updates = handle.into_stream();
                while let Some(log) = updates.next().await {
                    println!("{}", render::text_log(&log));
                }
            } else {
                println!("{}", render::text_log(&handle.current()));
            }
            Ok(())
        }
        Commands::Stats { range } => {
            let range = range::resolve_range(&range)?;
            let handle = stats::subscribe_stats(collection, range).await;
            println!("{}", render::stats(&handle.current()));
            Ok(())
        }
        Commands::Tags {} => {
            let handle = tag_cache::subscribe_tags(collection).await;
            println!("{}", render::tags(&handle.current()));
            Ok(())
        }
    }
}

/// The wall-clock moment `add` defaults its date and time from. Shares its
/// calendar-day basis with [range::resolve_range], so a default-dated
/// check-in always falls inside the default listing range.
fn local_now() -> DateTime<Local> {
    DefaultClock.time().with_timezone(&Local)
}

/// Either an explicit duration, or one recomputed from start and end times
/// through the same reconciliation the form binding uses.
fn resolve_duration(
    start: &str,
    duration: Option<String>,
    end: Option<String>,
) -> Result<String> {
    if let Some(duration) = duration {
        return Ok(duration);
    }
    let Some(end) = end else {
        bail!("either --duration or --end is required");
    };
    let start = NaiveTime::parse_from_str(start.trim(), TIME_FORMAT)
        .map_err(|e| anyhow::anyhow!("couldn't parse start time {start:?}: {e}"))?;
    let end = NaiveTime::parse_from_str(end.trim(), TIME_FORMAT)
        .map_err(|e| anyhow::anyhow!("couldn't parse end time {end:?}: {e}"))?;
    let (_, _, duration) = reconcile(start, end, 0.0, EditedField::EndTime);
    Ok(duration.to_string())
}

pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path =
                PathBuf::from(env::var("APPDATA").expect("APPDATA should be present on Windows"));
            path.push("checkin");
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .expect("Couldn't find neither XDG_STATE_HOME nor HOME");
            path.push("checkin");
            path
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
