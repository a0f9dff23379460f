//! ragconsole: Command-line interface for testing RAG backends

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, Subcommand};
use ragconsole::api::{ComponentType, HybridConfig, PaginationConfig, RagApiClient, SearchFilters};
use ragconsole::config::{path_resolver, AppConfig, SearchMode, WeightVector};
use ragconsole::console::Console;
use ragconsole::generate::{self, ContextSelection};
use ragconsole::render::{self, ComparisonColumns};
use ragconsole::rerank::RerankComparison;
use ragconsole::search::Dispatcher;
use ragconsole::state::{AppStore, PresetStore, SearchStatePatch, SortOption, StoreEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ============================================================================
// CLI Definition
// ============================================================================

/// ragconsole: testing console for RAG search, re-ranking and generation
#[derive(Parser)]
#[command(name = "ragconsole")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (default: $XDG_CONFIG_HOME/ragconsole/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Backend base URL, overrides config and environment
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Search parameters shared by every command that issues a search
#[derive(clap::Args, Debug, Clone)]
struct SearchArgs {
    /// Number of results to return
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Try the agentic endpoint first, falling back to plain search
    #[arg(short, long)]
    agentic: bool,

    /// Enable cross-encoder re-ranking
    #[arg(long)]
    rerank: bool,

    /// Blend lexical matching into the vector search
    #[arg(long)]
    hybrid: bool,

    /// Lexical/vector blend factor (0..1)
    #[arg(long)]
    alpha: Option<f64>,

    /// Filter by tag (repeatable)
    #[arg(long, action = ArgAction::Append)]
    tag: Vec<String>,

    /// Filter by component type (repeatable)
    #[arg(long = "type", action = ArgAction::Append)]
    component_type: Vec<String>,

    /// Result page (1-based)
    #[arg(long)]
    page: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize ragconsole configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
    /// Run one search and print the results
    Search {
        /// Search query
        query: String,

        #[command(flatten)]
        args: SearchArgs,

        /// Client-side sort of the printed results
        #[arg(short, long, default_value = "final_score_desc")]
        sort: String,

        /// Print raw results as JSON
        #[arg(long)]
        json: bool,

        /// Show the score-breakdown panel
        #[arg(long)]
        breakdown: bool,
    },
    /// Search with re-ranking and compare vector-only against final order
    Compare {
        /// Search query
        query: String,

        #[command(flatten)]
        args: SearchArgs,

        /// Export the movement table as CSV
        #[arg(long)]
        csv: Option<String>,
    },
    /// Search, then generate code from the results
    Generate {
        /// What to generate
        prompt: String,

        /// Query used to fetch context documents
        #[arg(short, long)]
        query: String,

        #[command(flatten)]
        args: SearchArgs,

        /// Only use these result ids as context (repeatable)
        #[arg(long, action = ArgAction::Append)]
        select: Vec<String>,

        /// Generation model key
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Start the interactive console
    Console,
    /// Show backend collection statistics
    Stats,
    /// Show available filter values
    Facets,
    /// Check backend health
    Health,
    /// Manage experiment presets
    Presets {
        #[command(subcommand)]
        command: PresetsCommand,
    },
    /// Show or persist default score weights
    Weights {
        /// Dense (vector) weight
        #[arg(long)]
        dense: Option<f64>,

        /// Cross-encoder weight
        #[arg(long)]
        cross: Option<f64>,

        /// Metadata boost weight
        #[arg(long)]
        meta: Option<f64>,

        /// Restore the default weights
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List saved presets
    List,
    /// Save a preset built from the given parameters
    Save {
        /// Preset name
        name: String,

        /// Query stored in the preset
        #[arg(short, long)]
        query: String,

        #[command(flatten)]
        args: SearchArgs,

        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a preset by id, id prefix or name
    Delete { id: String },
    /// Load a preset and run its search
    Run { id: String },
}

// ============================================================================
// Session Helpers
// ============================================================================

fn config_path(explicit: Option<&str>) -> Result<PathBuf> {
    match explicit {
        Some(path) => path_resolver::resolve_path(path),
        None => Ok(path_resolver::get_default_config_path()),
    }
}

/// File config, overridden by environment, overridden by CLI flags
fn load_config(explicit: Option<&str>, api_url: Option<&str>) -> Result<AppConfig> {
    let path = config_path(explicit)?;
    let mut config = AppConfig::load_or_default(&path)?.merge_with(&AppConfig::from_env());
    if let Some(url) = api_url {
        config = config.with_api_base_url(url);
    }
    config.validate()?;
    tracing::debug!("Using backend {}", config.api_base_url());
    Ok(config)
}

/// Store seeded from config with persisted presets loaded
fn open_session(config: &AppConfig) -> Result<Dispatcher> {
    let store = AppStore::from_config(config);
    store.set_presets(PresetStore::load(&config.presets_path())?);
    let client = Arc::new(RagApiClient::from_config(config));
    Ok(Dispatcher::new(client, store))
}

fn search_patch(query: &str, args: &SearchArgs, store: &AppStore) -> Result<SearchStatePatch> {
    let current = store.search_state();
    let mut patch = SearchStatePatch::new().query(query);

    if let Some(top_k) = args.top_k {
        if top_k == 0 {
            return Err(anyhow!("--top-k must be at least 1"));
        }
        patch = patch.top_k(top_k);
    }
    if args.rerank {
        let mut rerank = current.rerank.clone();
        rerank.enabled = true;
        patch = patch.rerank(rerank);
    }
    if args.hybrid || args.alpha.is_some() {
        patch = patch.hybrid(HybridConfig {
            lexical: args.hybrid || current.hybrid.lexical,
            alpha: args.alpha.or(current.hybrid.alpha),
        });
    }
    if !args.tag.is_empty() || !args.component_type.is_empty() {
        patch = patch.filters(SearchFilters {
            tags: args.tag.clone(),
            component_types: args
                .component_type
                .iter()
                .map(|t| ComponentType::parse_lenient(t))
                .collect(),
            ..SearchFilters::default()
        });
    }
    if let Some(page) = args.page {
        patch = patch.pagination(PaginationConfig {
            page: page.max(1),
            ..current.pagination
        });
    }
    Ok(patch)
}

fn search_mode(args: &SearchArgs, config: &AppConfig) -> SearchMode {
    if args.agentic {
        SearchMode::Agentic
    } else {
        config.default_search_mode()
    }
}

/// Apply the search arguments and dispatch once
async fn run_search(
    dispatcher: &Dispatcher,
    config: &AppConfig,
    query: &str,
    args: &SearchArgs,
) -> Result<()> {
    let store = dispatcher.store();
    store.update_search_state(search_patch(query, args, store)?);

    let outcome = dispatcher
        .dispatch(search_mode(args, config))
        .await?
        .ok_or_else(|| anyhow!("Query must not be empty"))?;
    if outcome.fell_back {
        eprintln!("Agentic search failed, showing plain search results");
    }
    Ok(())
}

fn print_results(store: &AppStore) {
    let state = store.search_state();
    let results = render::sort_results(&store.results(), state.sort_by);
    print!("{}", render::render_results(&state.query, &results, store.stats()));
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so results on stdout stay pipeable
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config_arg = cli.config.as_deref();
    let api_url = cli.api_url.as_deref();

    match cli.command {
        Commands::Init { force } => {
            let config_path = config_path(config_arg)?;

            eprintln!("Initializing ragconsole configuration...");
            if config_path.exists() && !force {
                eprintln!("Configuration file already exists: {}", config_path.display());
                eprintln!("Use --force to overwrite");
                return Ok(());
            }

            AppConfig::default().save(&config_path)?;

            eprintln!("Created configuration file: {}", config_path.display());
            eprintln!("Edit it to point api_base_url at your backend.");
            Ok(())
        }
        Commands::Search {
            query,
            args,
            sort,
            json,
            breakdown,
        } => {
            let sort_by: SortOption = sort.parse().map_err(|e: String| anyhow!(e))?;
            let config = load_config(config_arg, api_url)?;
            let dispatcher = open_session(&config)?;
            let store = dispatcher.store();
            store.update_search_state(SearchStatePatch::new().sort_by(sort_by));

            run_search(&dispatcher, &config, &query, &args).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&store.results())?);
            } else {
                print_results(store);
                if breakdown {
                    println!();
                    print!(
                        "{}",
                        render::render_score_breakdown(
                            &store.search_state().weights(),
                            &store.results()
                        )
                    );
                }
            }
            Ok(())
        }
        Commands::Compare { query, args, csv } => {
            let config = load_config(config_arg, api_url)?;
            let dispatcher = open_session(&config)?;
            let args = SearchArgs {
                rerank: true,
                ..args
            };
            run_search(&dispatcher, &config, &query, &args).await?;

            let results = dispatcher.store().results();
            let comparison = RerankComparison::from_results(&results);
            let columns = ComparisonColumns {
                cross_encoder: results.iter().any(|r| r.scores.cross_encoder.is_some()),
                metadata_boost: results.iter().any(|r| r.scores.metadata_boost.is_some()),
            };
            print!("{}", render::render_comparison(&comparison, columns));

            if let Some(csv) = csv {
                let path = path_resolver::resolve_path(&csv)?;
                comparison.write_csv(&path)?;
                eprintln!("Exported comparison to {}", path.display());
            }
            Ok(())
        }
        Commands::Generate {
            prompt,
            query,
            args,
            select,
            model,
        } => {
            let config = load_config(config_arg, api_url)?;
            let dispatcher = open_session(&config)?;
            run_search(&dispatcher, &config, &query, &args).await?;

            let results = dispatcher.store().results();
            let mut selection = ContextSelection::new();
            for id in &select {
                if !results.iter().any(|r| &r.id == id) {
                    eprintln!("Ignoring unknown result id '{}'", id);
                    continue;
                }
                selection.toggle(id);
            }
            let documents = selection.documents_to_use(&results);
            eprintln!("Generating from {} context documents...", documents.len());

            let model_key = model.as_deref().unwrap_or(config.default_model_key());
            let code =
                generate::generate_code(dispatcher.client(), &prompt, &documents, model_key)
                    .await?;
            println!("{}", code);
            Ok(())
        }
        Commands::Console => {
            let config = load_config(config_arg, api_url)?;
            let dispatcher = open_session(&config)?;
            let store = dispatcher.store().clone();

            let live_store = store.clone();
            store.subscribe(move |event| {
                if !live_store.search_state().live_search {
                    return;
                }
                match event {
                    StoreEvent::ResultsReplaced { count, .. } => {
                        eprintln!("[live] {} results ready, :results to view", count)
                    }
                    StoreEvent::SearchFailed { message, .. } => {
                        eprintln!("[live] search failed: {}", message)
                    }
                    _ => {}
                }
            });

            eprintln!(
                "ragconsole {} connected to {} ({} mode). Type :help for commands.",
                ragconsole::VERSION,
                config.api_base_url(),
                config.default_search_mode()
            );
            let mut console = Console::new(dispatcher, &config).with_presets_path(config.presets_path());
            console
                .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await
        }
        Commands::Stats => {
            let config = load_config(config_arg, api_url)?;
            let stats = RagApiClient::from_config(&config).stats().await?;
            print!("{}", render::render_stats(&stats));
            Ok(())
        }
        Commands::Facets => {
            let config = load_config(config_arg, api_url)?;
            let facets = RagApiClient::from_config(&config).facets().await?;
            print!("{}", render::render_facets(&facets));
            Ok(())
        }
        Commands::Health => {
            let config = load_config(config_arg, api_url)?;
            let health = RagApiClient::from_config(&config).health().await?;
            println!("{}: {}", config.api_base_url(), health.status);
            if !health.is_ok() {
                return Err(anyhow!("Backend reported status '{}'", health.status));
            }
            Ok(())
        }
        Commands::Presets { command } => {
            let config = load_config(config_arg, api_url)?;
            let presets_path = config.presets_path();
            let dispatcher = open_session(&config)?;
            let store = dispatcher.store();

            match command {
                PresetsCommand::List => {
                    print!("{}", render::render_presets(&store.presets()));
                }
                PresetsCommand::Save {
                    name,
                    query,
                    args,
                    description,
                } => {
                    store.update_search_state(search_patch(&query, &args, store)?);
                    let preset = store.save_preset(&name, description.as_deref())?;
                    store.save_presets(&presets_path)?;
                    eprintln!("Saved preset '{}' ({})", preset.name, preset.id);
                }
                PresetsCommand::Delete { id } => {
                    if !store.remove_preset(&id) {
                        return Err(anyhow!("No preset matches '{}'", id));
                    }
                    store.save_presets(&presets_path)?;
                    eprintln!("Deleted preset '{}'", id);
                }
                PresetsCommand::Run { id } => {
                    store.load_preset(&id)?;
                    store.save_presets(&presets_path)?;
                    dispatcher
                        .dispatch(config.default_search_mode())
                        .await?
                        .ok_or_else(|| anyhow!("Preset '{}' has an empty query", id))?;
                    print_results(store);
                }
            }
            Ok(())
        }
        Commands::Weights {
            dense,
            cross,
            meta,
            reset,
        } => {
            let path = config_path(config_arg)?;
            let file_config = AppConfig::load_or_default(&path)?;
            let current = file_config.default_weights();

            let weights = if reset {
                WeightVector::default()
            } else if dense.is_none() && cross.is_none() && meta.is_none() {
                println!(
                    "dense {:.1} • cross {:.1} • meta {:.1}",
                    current.dense, current.cross, current.meta
                );
                return Ok(());
            } else {
                WeightVector::new(
                    dense.unwrap_or(current.dense),
                    cross.unwrap_or(current.cross),
                    meta.unwrap_or(current.meta),
                )
            };

            let updated = file_config.with_default_weights(weights);
            updated.validate()?;
            updated.save(&path)?;
            println!(
                "dense {:.1} • cross {:.1} • meta {:.1}",
                weights.dense, weights.cross, weights.meta
            );
            eprintln!("Saved default weights to {}", path.display());
            Ok(())
        }
    }
}
