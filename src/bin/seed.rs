use std::str::FromStr;

use chrono::{Duration, Utc};
use clap::Parser;
use portal::{
    domain::{AnnouncementInput, Severity},
    repository::{AnnouncementRepository, SqliteAnnouncementRepository},
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

#[derive(Parser, Debug)]
#[command(about = "Seed the portal database with sample announcements")]
struct Args {
    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://portal.db")]
    database_url: String,

    /// Delete existing announcements before seeding
    #[arg(long)]
    reset: bool,
}

fn sample_announcements() -> Vec<AnnouncementInput> {
    let now = Utc::now();

    vec![
        AnnouncementInput {
            title: "System Maintenance Window".to_string(),
            body: "We will be performing scheduled maintenance on our servers this weekend from **Saturday 2 AM to 6 AM GMT**. During this time, some services may be temporarily unavailable.".to_string(),
            severity: Severity::Warning,
            pinned: true,
            start_at: now - Duration::days(3),
            end_at: Some(now + Duration::days(4)),
            cta_label: Some("View maintenance details".to_string()),
            cta_href: Some("#maintenance".to_string()),
        },
        AnnouncementInput {
            title: "New Microsoft 365 Features Available".to_string(),
            body: "New collaboration tools in Teams, improved writing assistance in Word and new data visualization options in Excel are now available across all subscriptions.".to_string(),
            severity: Severity::Info,
            pinned: false,
            start_at: now - Duration::days(1),
            end_at: Some(now + Duration::days(30)),
            cta_label: Some("Learn more".to_string()),
            cta_href: Some("https://office.com".to_string()),
        },
        AnnouncementInput {
            title: "Security Update Required".to_string(),
            body: "Action required: please update your passwords for all services by **the end of the month**. Use the password manager in your browser or contact IT support for assistance.".to_string(),
            severity: Severity::Critical,
            pinned: false,
            start_at: now - Duration::hours(6),
            end_at: Some(now + Duration::days(14)),
            cta_label: Some("Update passwords".to_string()),
            cta_href: Some("#security".to_string()),
        },
        AnnouncementInput {
            title: "Holiday Schedule Reminder".to_string(),
            body: "Offices will be closed during the upcoming holiday period. Emergency support remains available through the Service Desk portal.".to_string(),
            severity: Severity::Info,
            pinned: false,
            start_at: now - Duration::days(5),
            end_at: None,
            cta_label: None,
            cta_href: None,
        },
        AnnouncementInput {
            title: "Quarterly Town Hall".to_string(),
            body: "Join the leadership team for the quarterly town hall. Questions can be submitted in advance.".to_string(),
            severity: Severity::Info,
            pinned: false,
            start_at: now + Duration::days(2),
            end_at: Some(now + Duration::days(9)),
            cta_label: None,
            cta_href: None,
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Seeding announcements into {}", args.database_url);

    let connect_options = SqliteConnectOptions::from_str(&args.database_url)?
        .create_if_missing(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;

    // Run migrations first
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let repo = SqliteAnnouncementRepository::new(db_pool.clone());

    if args.reset {
        let existing = repo.list().await?;
        for announcement in &existing {
            repo.delete(announcement.id).await?;
        }
        println!("  Removed {} existing announcements", existing.len());
    }

    for input in sample_announcements() {
        let created = repo.create(input).await?;
        println!("  Created [{}] {}", created.severity, created.title);
    }

    println!("Done.");

    Ok(())
}
