//! Interactive console
//!
//! A line-oriented session over the store. Every edit goes through the
//! store's transition functions and is fed to the live-search trigger, so a
//! console session behaves like the browser page it replaces: typing a query
//! with live search on fires a debounced search, `:search` fires one now.

mod command;

pub use command::{CommandError, ConsoleCommand, HELP};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::api::{HybridConfig, PaginationConfig, SearchFilters};
use crate::config::{AppConfig, SearchMode};
use crate::generate::{self, ContextSelection};
use crate::render::{self, ComparisonColumns};
use crate::rerank::RerankComparison;
use crate::search::{Dispatcher, LiveDispatch, LiveSearch};
use crate::state::{AppStore, SearchStatePatch, StateChange};

/// Result of executing one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }
}

/// One interactive session
pub struct Console {
    dispatcher: Dispatcher,
    live: LiveSearch<LiveDispatch>,
    model_key: String,
    presets_path: Option<PathBuf>,
    selection: ContextSelection,
}

impl Console {
    /// Create a session; must be called from within a Tokio runtime
    pub fn new(dispatcher: Dispatcher, config: &AppConfig) -> Self {
        let target = LiveDispatch::new(dispatcher.clone(), config.default_search_mode());
        Self {
            live: LiveSearch::with_delay(Arc::new(target), config.live_search_delay()),
            dispatcher,
            model_key: config.default_model_key().to_string(),
            presets_path: None,
            selection: ContextSelection::new(),
        }
    }

    /// Persist presets to `path` after every change
    pub fn with_presets_path(mut self, path: PathBuf) -> Self {
        self.presets_path = Some(path);
        self
    }

    pub fn store(&self) -> &AppStore {
        self.dispatcher.store()
    }

    pub fn mode(&self) -> SearchMode {
        self.live.target().mode()
    }

    pub fn is_live_pending(&self) -> bool {
        self.live.is_pending()
    }

    /// Read commands from `input` until EOF or `:quit`
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match self.handle_line(&line).await {
                Reply::Quit => break,
                Reply::Text(text) if text.is_empty() => {}
                Reply::Text(text) => {
                    output.write_all(text.as_bytes()).await?;
                    if !text.ends_with('\n') {
                        output.write_all(b"\n").await?;
                    }
                }
            }
            output.flush().await?;
        }
        self.live.cancel();
        Ok(())
    }

    /// Parse and execute one line; errors become printable text
    pub async fn handle_line(&mut self, line: &str) -> Reply {
        if line.trim().is_empty() {
            return Reply::text("");
        }
        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(e) => return Reply::Text(format!("Error: {}", e)),
        };
        match self.execute(command).await {
            Ok(reply) => reply,
            Err(e) => Reply::Text(format!("Error: {}", e)),
        }
    }

    pub async fn execute(&mut self, command: ConsoleCommand) -> Result<Reply> {
        let reply = match command {
            ConsoleCommand::Query(query) => {
                self.update(SearchStatePatch::new().query(query.clone()));
                if self.live.is_pending() {
                    Reply::text("")
                } else {
                    Reply::Text(format!("Query: '{}'", query))
                }
            }
            ConsoleCommand::Search => self.search_now().await,
            ConsoleCommand::Results => Reply::Text(self.render_results()),
            ConsoleCommand::Live(on) => {
                self.update(SearchStatePatch::new().live_search(on));
                Reply::Text(format!("Live search {}", on_off(on)))
            }
            ConsoleCommand::Agentic(on) => {
                // a pending live fire picks up the new mode
                self.live.target().set_mode(if on {
                    SearchMode::Agentic
                } else {
                    SearchMode::Plain
                });
                Reply::Text(format!("Agentic search {}", on_off(on)))
            }
            ConsoleCommand::TopK(top_k) => {
                self.update(SearchStatePatch::new().top_k(top_k));
                Reply::Text(format!("top_k = {}", top_k))
            }
            ConsoleCommand::Rerank(on) => {
                let mut rerank = self.store().search_state().rerank;
                rerank.enabled = on;
                self.update(SearchStatePatch::new().rerank(rerank));
                Reply::Text(format!("Re-ranking {}", on_off(on)))
            }
            ConsoleCommand::Weights(weights) => {
                let mut rerank = self.store().search_state().rerank;
                rerank.weight_vector = Some(weights);
                self.update(SearchStatePatch::new().rerank(rerank));
                let w = self.store().search_state().weights();
                Reply::Text(format!(
                    "Weights: dense {:.1} • cross {:.1} • meta {:.1}",
                    w.dense, w.cross, w.meta
                ))
            }
            ConsoleCommand::Breakdown => {
                let state = self.store().search_state();
                Reply::Text(render::render_score_breakdown(
                    &state.weights(),
                    &self.store().results(),
                ))
            }
            ConsoleCommand::Hybrid { enabled, alpha } => {
                let current = self.store().search_state().hybrid;
                self.update(SearchStatePatch::new().hybrid(HybridConfig {
                    lexical: enabled,
                    alpha: alpha.or(current.alpha),
                }));
                let hybrid = self.store().search_state().hybrid;
                Reply::Text(format!(
                    "Hybrid {} (alpha {})",
                    on_off(hybrid.lexical),
                    hybrid.alpha.map_or_else(|| "-".to_string(), |a| format!("{:.2}", a))
                ))
            }
            ConsoleCommand::Tag(tag) => {
                let mut filters = self.store().search_state().filters;
                let now_set = toggle(&mut filters.tags, tag.clone());
                self.update(SearchStatePatch::new().filters(filters));
                Reply::Text(format!("Tag '{}' {}", tag, if now_set { "added" } else { "removed" }))
            }
            ConsoleCommand::Type(kind) => {
                let mut filters = self.store().search_state().filters;
                let now_set = toggle(&mut filters.component_types, kind);
                self.update(SearchStatePatch::new().filters(filters));
                Reply::Text(format!(
                    "Type {} {}",
                    kind,
                    if now_set { "added" } else { "removed" }
                ))
            }
            ConsoleCommand::ClearFilters => {
                self.update(SearchStatePatch::new().filters(SearchFilters::default()));
                Reply::text("Filters cleared")
            }
            ConsoleCommand::Page(page) => {
                let pagination = PaginationConfig {
                    page,
                    ..self.store().search_state().pagination
                };
                self.update(SearchStatePatch::new().pagination(pagination));
                Reply::Text(format!("Page {}", page))
            }
            ConsoleCommand::Sort(sort_by) => {
                self.update(SearchStatePatch::new().sort_by(sort_by));
                Reply::Text(self.render_results())
            }
            ConsoleCommand::Compare(path) => self.compare(path)?,
            ConsoleCommand::Dashboard => Reply::Text(self.store().dashboard_report()),
            ConsoleCommand::Save { name, description } => {
                let preset = self.store().save_preset(&name, description.as_deref())?;
                self.persist_presets()?;
                Reply::Text(format!("Saved preset '{}' ({})", preset.name, preset.id))
            }
            ConsoleCommand::SaveLast { name, description } => {
                let preset = self
                    .store()
                    .save_preset_from_last_query(&name, description.as_deref())?;
                self.persist_presets()?;
                Reply::Text(format!(
                    "Saved preset '{}' from query '{}'",
                    preset.name, preset.parameters.query
                ))
            }
            ConsoleCommand::Load(key) => {
                let change = self.store().load_preset(&key)?;
                self.observe(&change);
                self.persist_presets()?;
                Reply::Text(format!("Loaded preset '{}'", key))
            }
            ConsoleCommand::Presets => Reply::Text(render::render_presets(&self.store().presets())),
            ConsoleCommand::Delete(key) => {
                if self.store().remove_preset(&key) {
                    self.persist_presets()?;
                    Reply::Text(format!("Deleted preset '{}'", key))
                } else {
                    Reply::Text(format!("No preset matches '{}'", key))
                }
            }
            ConsoleCommand::Select(id) => {
                if !self.store().results().iter().any(|r| r.id == id) {
                    Reply::Text(format!("No result with id '{}'", id))
                } else if self.selection.toggle(&id) {
                    Reply::Text(format!("Selected '{}' ({} in context)", id, self.selection.len()))
                } else {
                    Reply::Text(format!("Deselected '{}'", id))
                }
            }
            ConsoleCommand::Generate(prompt) => {
                let results = self.store().results();
                let documents = self.selection.documents_to_use(&results);
                let code = generate::generate_code(
                    self.dispatcher.client(),
                    &prompt,
                    &documents,
                    &self.model_key,
                )
                .await?;
                Reply::Text(code)
            }
            ConsoleCommand::Stats => {
                Reply::Text(render::render_stats(&self.dispatcher.client().stats().await?))
            }
            ConsoleCommand::Facets => {
                Reply::Text(render::render_facets(&self.dispatcher.client().facets().await?))
            }
            ConsoleCommand::Help => Reply::text(HELP),
            ConsoleCommand::Quit => Reply::Quit,
        };
        Ok(reply)
    }

    fn update(&mut self, patch: SearchStatePatch) -> StateChange {
        let change = self.store().update_search_state(patch);
        self.observe(&change);
        change
    }

    fn observe(&mut self, change: &StateChange) {
        let state = self.dispatcher.store().search_state();
        self.live.observe(change, &state);
    }

    async fn search_now(&mut self) -> Reply {
        if self.store().is_loading() {
            return Reply::text("A search is already in progress");
        }
        self.live.cancel();

        match self.dispatcher.dispatch(self.mode()).await {
            Ok(None) => Reply::text("Enter a query first"),
            Ok(Some(outcome)) => {
                let mut text = String::new();
                if outcome.fell_back {
                    text.push_str("Agentic search failed, showing plain results\n");
                }
                if !outcome.applied {
                    text.push_str("A newer response is already displayed\n");
                }
                text.push_str(&self.render_results());
                Reply::Text(text)
            }
            Err(e) => Reply::Text(format!("Search failed: {}", e.message())),
        }
    }

    fn render_results(&self) -> String {
        let state = self.store().search_state();
        let results = render::sort_results(&self.store().results(), state.sort_by);
        let mut text = render::render_results(&state.query, &results, self.store().stats());
        if let Some(info) = self.store().agentic_info() {
            text.push_str(&format!(
                "Agentic: {} KG and {} web enhancements from {} sources\n",
                info.kg_enhancements_count, info.web_enhancements_count, info.total_sources_used
            ));
        }
        if let Some(error) = self.store().error() {
            text.push_str(&format!("Last error: {}\n", error));
        }
        text
    }

    fn compare(&self, path: Option<PathBuf>) -> Result<Reply> {
        let results = self.store().results();
        let comparison = RerankComparison::from_results(&results);
        let columns = ComparisonColumns {
            cross_encoder: results.iter().any(|r| r.scores.cross_encoder.is_some()),
            metadata_boost: results.iter().any(|r| r.scores.metadata_boost.is_some()),
        };
        let mut text = render::render_comparison(&comparison, columns);
        if let Some(path) = path {
            comparison.write_csv(&path)?;
            text.push_str(&format!("Exported to {}\n", path.display()));
        }
        Ok(Reply::Text(text))
    }

    fn persist_presets(&self) -> Result<()> {
        if let Some(path) = &self.presets_path {
            self.store().save_presets(path)?;
        }
        Ok(())
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

/// Insert `value` if absent, remove it if present; returns whether it is now present
fn toggle<T: PartialEq>(values: &mut Vec<T>, value: T) -> bool {
    match values.iter().position(|v| *v == value) {
        Some(index) => {
            values.remove(index);
            false
        }
        None => {
            values.push(value);
            true
        }
    }
}
