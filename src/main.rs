use chrono::{Datelike, Duration, Local, NaiveDate, Utc};
use clap::Parser;
use daybook::application::export::render_text;
use daybook::application::{browse, init, ConfigService, Daybook};
use daybook::cli::{
    format_calendar, format_draft_list, format_entry_list, format_export_report, Cli, Commands,
    DraftCommands,
};
use daybook::domain::attachment::file_name_from_url;
use daybook::domain::{Attachment, DocumentId, EntryBuffer, Rating, SaveTarget, SortOption};
use daybook::error::DaybookError;
use daybook::infrastructure::{Config, JournalRepository, LocalBackend};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e.display_with_suggestions());
            std::process::exit(e.exit_code());
        }
    }
}

/// Discover the daybook root and wire every service to it
fn open() -> Result<(Daybook, Config), DaybookError> {
    let backend = Arc::new(LocalBackend::discover()?);
    let config = backend.load_config()?;
    Ok((Daybook::new(backend, &config), config))
}

fn parse_rating(value: u8) -> Result<Rating, DaybookError> {
    Rating::new(value).map_err(DaybookError::Validation)
}

fn password_or_env(password: Option<String>) -> String {
    password
        .or_else(|| std::env::var("DAYBOOK_PASSWORD").ok())
        .unwrap_or_default()
}

async fn read_attachment(path: &Path) -> Result<Attachment, DaybookError> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    Ok(Attachment::pending(name, bytes))
}

fn parse_month(month: Option<&str>) -> Result<NaiveDate, DaybookError> {
    match month {
        Some(m) => NaiveDate::parse_from_str(&format!("{}-01", m), "%Y-%m-%d").map_err(|_| {
            DaybookError::Validation(format!("Invalid month '{}'. Expected YYYY-MM", m))
        }),
        None => {
            let today = Local::now().date_naive();
            Ok(today - Duration::days(today.day0() as i64))
        }
    }
}

async fn run(cli: Cli) -> Result<(), DaybookError> {
    match cli.command {
        Commands::Init { path } => {
            init::init(&path)?;
            println!("Initialized daybook at {}", path.display());
            Ok(())
        }
        Commands::Register { email, password } => {
            let (daybook, _) = open()?;
            let session = daybook
                .auth
                .register(&email, &password_or_env(password))
                .await?;
            println!("Registered and signed in as {}", session.email);
            Ok(())
        }
        Commands::Login { email, password } => {
            let (daybook, _) = open()?;
            let session = daybook
                .auth
                .sign_in(&email, &password_or_env(password))
                .await?;
            println!("Signed in as {}", session.email);
            Ok(())
        }
        Commands::Logout => {
            let (daybook, _) = open()?;
            daybook.auth.sign_out().await?;
            println!("Signed out");
            Ok(())
        }
        Commands::ResetPassword { email } => {
            let (daybook, _) = open()?;
            daybook.auth.send_password_reset(&email).await?;
            println!("Password reset requested for {}", email.trim());
            Ok(())
        }
        Commands::Whoami => {
            let (daybook, _) = open()?;
            let session = daybook.auth.require_session().await?;
            println!("{} ({})", session.email, session.user_id);
            Ok(())
        }
        Commands::Write {
            content,
            files,
            rating,
            draft,
            draft_id,
        } => {
            let (daybook, _) = open()?;
            let session = daybook.auth.require_session().await?;

            let mut buffer = match draft_id {
                Some(id) => daybook.drafts.open_draft(&session, &DocumentId::new(id)).await?,
                None => EntryBuffer::new(),
            };
            if let Some(content) = content {
                buffer.set_content(content);
            }
            if let Some(rating) = rating {
                buffer.set_rating(parse_rating(rating)?);
            }
            for path in &files {
                buffer.add_attachment(read_attachment(path).await?);
            }

            let target = if draft {
                SaveTarget::Draft
            } else {
                SaveTarget::Final
            };
            let id = daybook
                .entries
                .save_buffer(&session, &mut buffer, target)
                .await?;

            match target {
                SaveTarget::Draft => println!("Saved draft {}", id),
                SaveTarget::Final => println!("Saved entry {}", id),
            }
            Ok(())
        }
        Commands::List { sort, search } => {
            let sort = SortOption::from_str(&sort).map_err(DaybookError::Config)?;
            let (daybook, _) = open()?;
            let session = daybook.auth.require_session().await?;

            let entries = daybook
                .browse
                .list_matching(&session, sort, search.as_deref().unwrap_or(""))
                .await?;
            println!("{}", format_entry_list(&entries).trim_end());
            Ok(())
        }
        Commands::View { id } => {
            let (daybook, _) = open()?;
            let session = daybook.auth.require_session().await?;

            let entry = daybook
                .browse
                .get_entry(&session, &DocumentId::new(id))
                .await?;
            print!("{}", render_text(&entry));
            if !entry.files.is_empty() {
                println!("\nAttachments:");
                for url in &entry.files {
                    println!("  {}", file_name_from_url(url));
                }
            }
            Ok(())
        }
        Commands::Delete { id } => {
            let (daybook, _) = open()?;
            let session = daybook.auth.require_session().await?;
            daybook
                .browse
                .delete_entry(&session, &DocumentId::new(id.as_str()))
                .await?;
            println!("Deleted entry {}", id);
            Ok(())
        }
        Commands::Export { id, dest } => {
            let (daybook, config) = open()?;
            let session = daybook.auth.require_session().await?;

            let entry = daybook
                .browse
                .get_entry(&session, &DocumentId::new(id))
                .await?;
            let dest = dest.unwrap_or_else(|| config.get_export_dir());
            let report = daybook.export.download(&entry, &dest).await?;

            print!("{}", format_export_report(&report));
            for failure in &report.failures {
                eprintln!(
                    "Warning: could not export {}: {}",
                    file_name_from_url(&failure.url),
                    failure.reason
                );
            }
            Ok(())
        }
        Commands::Calendar { month } => {
            let month = parse_month(month.as_deref())?;
            let (daybook, _) = open()?;
            let session = daybook.auth.require_session().await?;

            let entries = daybook.browse.list(&session, SortOption::Oldest).await?;
            print!(
                "{}",
                format_calendar(month, &browse::ratings_by_day(&entries))
            );
            Ok(())
        }
        Commands::Drafts { command } => {
            let (daybook, _) = open()?;
            let session = daybook.auth.require_session().await?;

            match command {
                DraftCommands::List => {
                    let now = Utc::now();
                    let drafts = daybook.drafts.list_active_drafts_at(&session, now).await?;
                    println!(
                        "{}",
                        format_draft_list(&drafts, daybook.drafts.retention(), now).trim_end()
                    );
                }
                DraftCommands::Delete { id } => {
                    daybook
                        .drafts
                        .delete_draft(&session, &DocumentId::new(id.as_str()))
                        .await?;
                    println!("Deleted draft {}", id);
                }
                DraftCommands::Clear => {
                    let deleted = daybook.drafts.clear_all_drafts(&session).await?;
                    println!("Deleted {} draft(s)", deleted);
                }
                DraftCommands::Promote { id, rating } => {
                    let mut buffer = daybook
                        .drafts
                        .open_draft(&session, &DocumentId::new(id.as_str()))
                        .await?;
                    if let Some(rating) = rating {
                        buffer.set_rating(parse_rating(rating)?);
                    }
                    let entry_id = daybook
                        .entries
                        .save_buffer(&session, &mut buffer, SaveTarget::Final)
                        .await?;
                    println!("Saved entry {} from draft {}", entry_id, id);
                }
            }
            Ok(())
        }
        Commands::Config { key, value, list } => {
            let service = ConfigService::new(LocalBackend::discover()?);

            if list {
                let config = service.list()?;
                println!("retention_hours = {}", config.retention_hours);
                println!("on_promote = {}", config.on_promote);
                if let Some(dir) = &config.export_dir {
                    println!("export_dir = {}", dir.display());
                }
                println!("created = {}", config.created.to_rfc3339());
                Ok(())
            } else if let Some(k) = key {
                if let Some(v) = value {
                    service.set(&k, &v)?;
                    println!("Set {} = {}", k, v);
                } else {
                    println!("{}", service.get(&k)?);
                }
                Ok(())
            } else {
                println!("Usage: daybook config [--list | <key> [<value>]]");
                println!("Valid keys: retention_hours, on_promote, export_dir, created");
                Ok(())
            }
        }
    }
}
