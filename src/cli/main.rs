use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use movie_catalog::{
    bootstrap::open_catalog,
    config::Config,
    planner::{draft_from_input, MovieInput},
    state::MovieFilter,
    telemetry::init_tracing,
};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "movie-catalog-cli")]
#[command(about = "Movie catalog maintenance", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file, overriding CONFIG_PATH
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the search index from the record store
    Backfill {
        /// Records per batch; defaults to sync.backfill_batch_size
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Insert movies from a JSON array of movie payloads
    Seed {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Delete every existing movie first
        #[arg(long)]
        clear: bool,
    },

    /// Show record and index counts
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        std::env::set_var("CONFIG_PATH", path);
    }
    let config = Config::load().context("Failed to load configuration")?;
    init_tracing(&config.observability);

    let catalog = open_catalog(&config)
        .await
        .context("Failed to open the movie catalog")?;

    match cli.command {
        Commands::Backfill { batch_size } => {
            let batch_size = batch_size.unwrap_or(config.sync.backfill_batch_size);
            let report = catalog.backfill(batch_size).await?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_complete() {
                bail!("{} movies could not be indexed", report.failed);
            }
        }

        Commands::Seed { file, clear } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let inputs: Vec<MovieInput> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of movies", file.display()))?;

            println!("Found {} movies to insert", inputs.len());

            let mut existing_titles = HashSet::new();
            let mut cursor = None;
            loop {
                let batch = catalog.store().list_after(cursor, 500).await?;
                let Some(last) = batch.last() else {
                    break;
                };
                cursor = Some(last.id);

                for movie in batch {
                    if clear {
                        catalog.remove(movie.id).await?;
                    } else {
                        existing_titles.insert(movie.title);
                    }
                }
            }

            let (mut inserted, mut skipped, mut unindexed) = (0usize, 0usize, 0usize);
            for (position, input) in inputs.into_iter().enumerate() {
                let draft = match draft_from_input(input) {
                    Ok(draft) => draft,
                    Err(e) => {
                        tracing::warn!(position, error = %e, "Skipping invalid movie");
                        skipped += 1;
                        continue;
                    }
                };

                // Without --clear, titles already in the catalog are not inserted again
                if !clear && !existing_titles.insert(draft.title.clone()) {
                    skipped += 1;
                    continue;
                }

                let created = catalog.create(draft).await?;
                if !created.propagation.is_applied() {
                    unindexed += 1;
                }
                inserted += 1;
            }

            println!("Inserted {}, skipped {}", inserted, skipped);
            if unindexed > 0 {
                println!(
                    "{} movies are missing from the search index; run `movie-catalog-cli backfill`",
                    unindexed
                );
            }
        }

        Commands::Stats => {
            let store = catalog.store();
            let total = store.count_movies(&MovieFilter::default()).await?;
            let hits = store.count_movies(&MovieFilter::default().with_hit(true)).await?;
            let index = catalog.index().stats().await?;

            println!("Movies:          {}", total);
            println!("Hit movies:      {}", hits);
            println!("Indexed:         {}", index.total_documents);
            println!("Index segments:  {}", index.num_segments);
        }
    }

    Ok(())
}
