use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use tj_core::{Configuration, Destination, Snapshot};
use tj_timeline::CancellationToken;
use tj_widget::{minutes, WidgetProvider};

#[derive(Parser)]
#[command(name = "tj", version)]
struct Cli {
    /// Journal root (holds .tj/)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create .tj/, default config and the journal database
    Init,

    /// Add a destination entry
    Add {
        #[arg(long)]
        caption: String,
        #[arg(long, default_value = "")]
        details: String,
        /// Image file stored as opaque bytes
        #[arg(long)]
        image: Option<PathBuf>,
        /// Creation time in unix seconds (default: now)
        #[arg(long)]
        created_at: Option<i64>,
    },

    /// List destinations, oldest first
    List,

    /// Render a single snapshot
    Snapshot {
        /// Widget parameter, key=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        #[arg(long)]
        json: bool,
    },

    /// Render a full timeline
    Timeline {
        #[arg(long)]
        window_minutes: Option<u64>,
        #[arg(long)]
        tick_minutes: Option<u64>,
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        #[arg(long)]
        json: bool,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (k, v) = s.split_once('=').ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    if k.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((k.to_string(), v.to_string()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let root = match cli.root {
        Some(r) => r,
        None => std::env::current_dir()?,
    };

    match cli.cmd {
        Command::Init => {
            WidgetProvider::init(&root)?;
            println!("Initialized journal in {}", root.display());
        }
        Command::Add { caption, details, image, created_at } => {
            let p = WidgetProvider::open(root)?;
            let bytes = match image {
                Some(path) => Some(std::fs::read(&path).with_context(|| format!("read image {}", path.display()))?),
                None => None,
            };
            let d = p.add_destination(&caption, &details, bytes, created_at)?;
            println!("Added destination {}", d.id);
        }
        Command::List => {
            let p = WidgetProvider::open(root)?;
            let all = p.list_destinations()?;
            println!("Destinations: {}", all.len());
            for d in &all {
                println!("- {} [{}] {}", d.id, d.created_at_unix, d.caption);
            }
        }
        Command::Snapshot { params, json } => {
            let p = WidgetProvider::open(root)?;
            let cfg = configuration(&p, params);
            let snap = p.snapshot(&cfg);
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot_json(&snap, None))?);
            } else {
                print_snapshot(&snap, None);
            }
        }
        Command::Timeline { window_minutes, tick_minutes, params, json } => {
            let p = WidgetProvider::open(root)?;
            let cfg = configuration(&p, params);
            let window = match window_minutes {
                Some(m) => minutes(m).context("--window-minutes")?,
                None => p.cfg.window()?,
            };
            let tick = match tick_minutes {
                Some(m) => minutes(m).context("--tick-minutes")?,
                None => p.cfg.tick()?,
            };
            let timeline = p.timeline_for(&cfg, window, tick, &CancellationToken::new())?;
            if json {
                let entries: Vec<_> = timeline.scheduled().map(|(at, s)| snapshot_json(s, Some(at))).collect();
                let out = json!({
                    "policy": format!("{:?}", timeline.policy),
                    "tick_secs": timeline.tick_secs,
                    "entries": entries,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Timeline: {} entries every {}s (reload {:?})", timeline.len(), timeline.tick_secs, timeline.policy);
                for (at, s) in timeline.scheduled() {
                    print_snapshot(s, Some(at));
                }
            }
        }
    }

    Ok(())
}

/// Command-line params win; with none given, the configured widget params apply.
fn configuration(p: &WidgetProvider, params: Vec<(String, String)>) -> Configuration {
    if params.is_empty() {
        p.default_configuration().clone()
    } else {
        params.into_iter().collect()
    }
}

fn destination_json(d: &Destination) -> serde_json::Value {
    json!({
        "id": d.id.as_str(),
        "caption": d.caption,
        "details": d.details,
        "created_at": d.created_at_unix,
        "image_bytes": d.image.as_ref().map(Vec::len),
    })
}

fn snapshot_json(s: &Snapshot, scheduled_at: Option<i64>) -> serde_json::Value {
    json!({
        "scheduled_at": scheduled_at,
        "generated_at": s.generated_at_unix,
        "configuration": s.configuration,
        "destination": s.destination.as_ref().map(destination_json),
    })
}

fn print_snapshot(s: &Snapshot, scheduled_at: Option<i64>) {
    let at = scheduled_at.unwrap_or(s.generated_at_unix);
    match &s.destination {
        Some(d) => {
            let image = d.image.as_ref().map(|b| format!(" (image {} bytes)", b.len())).unwrap_or_default();
            println!("{at}: {} | {} | created {}{image}", d.caption, d.details, d.created_at_unix);
        }
        None => println!("{at}: no destination"),
    }
}
