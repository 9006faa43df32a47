use std::path::PathBuf;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use portal::{
    domain::{Announcement, Severity},
    visibility::{
        active_announcements, dismiss_window_from_days,
        presentation::{DEFAULT_INLINE_LIMIT, DEFAULT_PREVIEW_LENGTH},
        truncate_markdown, AnnouncementFilters, FileDismissalStore, InlineBanner,
        VisibilityEngine, DEFAULT_DISMISS_WINDOW_DAYS,
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Terminal client for portal announcements. Dismissals are kept in a local
/// file and never sent to the server.
#[derive(Parser, Debug)]
#[command(about = "Show and dismiss portal announcements")]
struct Args {
    /// Portal server base URL
    #[arg(long, env = "PORTAL_URL", default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Where this client keeps its dismissal log
    #[arg(long, env = "PORTAL_DISMISSALS", default_value = "dismissed-announcements.json")]
    state_file: PathBuf,

    /// Days a dismissal hides an announcement
    #[arg(long, default_value_t = DEFAULT_DISMISS_WINDOW_DAYS)]
    dismiss_days: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List announcements that are currently visible
    List {
        /// Show every visible announcement with full bodies
        #[arg(long)]
        all: bool,

        /// Only announcements whose title or body contains this text
        #[arg(long)]
        search: Option<String>,

        /// Only announcements of this severity (info, warning, critical)
        #[arg(long)]
        severity: Option<Severity>,
    },
    /// Hide an announcement on this machine
    Dismiss {
        id: Uuid,
    },
}

async fn fetch_announcements(server: &str) -> anyhow::Result<Vec<Announcement>> {
    let url = format!("{}/api/announcements", server.trim_end_matches('/'));
    let announcements = reqwest::get(&url)
        .await?
        .error_for_status()?
        .json::<Vec<Announcement>>()
        .await?;
    Ok(announcements)
}

fn print_announcement(announcement: &Announcement, preview_length: Option<usize>, dismissed: bool) {
    let pin = if announcement.pinned { " [pinned]" } else { "" };
    let mark = if dismissed { " [dismissed]" } else { "" };
    println!("[{}]{}{} {}", announcement.severity, pin, mark, announcement.title);

    let body = match preview_length {
        Some(max) => truncate_markdown(&announcement.body, max),
        None => announcement.body.clone(),
    };
    for line in body.lines() {
        println!("    {}", line);
    }

    if let Some(cta) = &announcement.cta {
        println!("    -> {} ({})", cta.label, cta.href);
    }
    println!("    id: {}", announcement.id);
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal=warn,notices=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let window = dismiss_window_from_days(args.dismiss_days).unwrap_or_else(|| {
        tracing::warn!(
            "Invalid --dismiss-days {}; using {}",
            args.dismiss_days,
            DEFAULT_DISMISS_WINDOW_DAYS
        );
        Duration::days(DEFAULT_DISMISS_WINDOW_DAYS)
    });
    let engine = VisibilityEngine::with_window(FileDismissalStore::new(&args.state_file), window);

    match args.command {
        Command::List { all, search, severity } => {
            let now = Utc::now();
            let announcements = fetch_announcements(&args.server).await?;
            let active = active_announcements(announcements, now);
            let visible = engine.visible_announcements(active.clone(), now);
            let filters = AnnouncementFilters { search, severity };

            if all || !filters.is_empty() {
                // The full list includes dismissed announcements, like the portal overlay
                let matching = filters.apply(&active);
                if matching.is_empty() {
                    println!("No announcements match.");
                }
                for announcement in matching {
                    let dismissed = !visible.iter().any(|v| v.id == announcement.id);
                    print_announcement(announcement, None, dismissed);
                }
            } else {
                let banner = InlineBanner::new(&visible, active.len(), DEFAULT_INLINE_LIMIT);
                if banner.is_empty() {
                    println!("No announcements to show.");
                }
                for announcement in &banner.shown {
                    print_announcement(announcement, Some(DEFAULT_PREVIEW_LENGTH), false);
                }
                if banner.has_more() {
                    println!("{} active announcements; run `notices list --all` to see them all.", banner.total);
                }
            }
        }
        Command::Dismiss { id } => {
            let now = Utc::now();
            engine.dismiss(id, now);

            // The engine swallows write failures; check the log actually took it
            if !engine.is_dismissed(id, now) {
                anyhow::bail!(
                    "Could not record dismissal of {} in {}",
                    id,
                    engine.store().path().display()
                );
            }
            println!(
                "Dismissed {} for {} days (log: {})",
                id,
                engine.window().num_days(),
                engine.store().path().display()
            );
        }
    }

    Ok(())
}
