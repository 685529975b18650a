use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use entity_sync::{
    EntityId, EntityState, HttpOrchestrator, MoodEntry, MoodType, MutationOutcome,
    PaginationDescriptor, QuerySync, SyncConfig,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "entity-sync")]
#[command(about = "Browse and edit mood entries on a REST backend")]
struct Cli {
    /// Server root; overrides ENTITY_SYNC_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Resource path; overrides ENTITY_SYNC_RESOURCE
    #[arg(long, global = true)]
    resource: Option<String>,
    /// Page size; overrides ENTITY_SYNC_PAGE_SIZE
    #[arg(long, global = true)]
    page_size: Option<u32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show one page, addressed like the web view: `?page=2&sort=date,DESC`
    List {
        #[arg(long, default_value = "")]
        query: String,
        /// Toggle sorting on this field after reading the query
        #[arg(long)]
        sort: Option<String>,
    },
    Get {
        id: EntityId,
    },
    Create {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        mood: MoodType,
        #[arg(long)]
        user: Option<EntityId>,
    },
    Update {
        id: EntityId,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        mood: MoodType,
        #[arg(long)]
        user: Option<EntityId>,
    },
    Patch {
        id: EntityId,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        mood: Option<MoodType>,
    },
    Delete {
        id: EntityId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let entries = HttpOrchestrator::<MoodEntry>::connect(&config)
        .context("failed to set up mood entry gateway")?;

    match cli.command {
        Command::List { query, sort } => {
            let mut view = QuerySync::new(config.default_descriptor(), &query);
            if let Some(field) = sort {
                let action = view.sort(&field);
                if let Some(target) = action.navigate {
                    info!(location = %target, "sorted view");
                }
            }
            entries
                .fetch_list(view.descriptor().clone())
                .await
                .context("failed to list mood entries")?;
            print_page(&entries.store().snapshot()?, view.descriptor());
        }
        Command::Get { id } => {
            entries
                .fetch_one(id)
                .await
                .with_context(|| format!("failed to load mood entry {id}"))?;
            let state = entries.store().snapshot()?;
            let entry = state
                .entity
                .ok_or_else(|| anyhow!("mood entry {id} was not stored"))?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        Command::Create { date, mood, user } => {
            entries.reset()?;
            let mut entry = MoodEntry::new(date, mood);
            if let Some(user) = user {
                entry = entry.with_user(user);
            }
            let outcome = entries.create(entry).await.context("create failed")?;
            finish_mutation(&entries, outcome).await?;
        }
        Command::Update {
            id,
            date,
            mood,
            user,
        } => {
            let mut entry = MoodEntry::new(date, mood).with_id(id);
            if let Some(user) = user {
                entry = entry.with_user(user);
            }
            let outcome = entries.update(entry).await.context("update failed")?;
            finish_mutation(&entries, outcome).await?;
        }
        Command::Patch { id, date, mood } => {
            let entry = MoodEntry {
                id: Some(id),
                date,
                mood,
                user: None,
            };
            let outcome = entries
                .partial_update(entry)
                .await
                .context("partial update failed")?;
            finish_mutation(&entries, outcome).await?;
        }
        Command::Delete { id } => {
            let outcome = entries.delete(id).await.context("delete failed")?;
            finish_mutation(&entries, outcome).await?;
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("entity_sync=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config = SyncConfig::from_env().context("failed to load configuration")?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(resource) = &cli.resource {
        config.resource_path = resource.clone();
    }
    if let Some(page_size) = cli.page_size {
        config.items_per_page = page_size;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn finish_mutation(
    entries: &HttpOrchestrator<MoodEntry>,
    outcome: MutationOutcome<MoodEntry>,
) -> Result<()> {
    match &outcome.record {
        Some(entry) => println!("saved: {}", serde_json::to_string(entry)?),
        None => println!("deleted"),
    }

    if let Some(refresh) = outcome.refresh {
        refresh.settled().await.context("list refresh failed")?;
    }
    print_page(&entries.store().snapshot()?, &entries.last_descriptor()?);
    Ok(())
}

fn print_page(state: &EntityState<MoodEntry>, descriptor: &PaginationDescriptor) {
    match descriptor.item_range(state.total_items) {
        Some((first, last)) => println!(
            "Showing {first} - {last} of {} items (page {}/{}, sort {})",
            state.total_items,
            descriptor.active_page,
            descriptor.total_pages(state.total_items),
            descriptor.sort_param()
        ),
        None => println!(
            "No items on page {} ({} total)",
            descriptor.active_page, state.total_items
        ),
    }

    for entry in &state.entities {
        println!(
            "{:>6}  {:<10}  {:<8}  {}",
            entry.id.map(|id| id.to_string()).unwrap_or_default(),
            entry.date.map(|date| date.to_string()).unwrap_or_default(),
            entry.mood.map(|mood| mood.to_string()).unwrap_or_default(),
            entry
                .user
                .as_ref()
                .and_then(|user| user.login.clone())
                .unwrap_or_default()
        );
    }
}
