//! Console command parser

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::api::ComponentType;
use crate::config::WeightVector;
use crate::state::SortOption;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Unknown command ':{0}', type :help for a list")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("{0}")]
    Invalid(String),
}

/// One parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Plain text (or `:query TEXT`): replace the query
    Query(String),
    Search,
    Results,
    Live(bool),
    Agentic(bool),
    TopK(usize),
    Rerank(bool),
    Weights(WeightVector),
    Breakdown,
    Hybrid { enabled: bool, alpha: Option<f64> },
    Tag(String),
    Type(ComponentType),
    ClearFilters,
    Page(usize),
    Sort(SortOption),
    Compare(Option<PathBuf>),
    Dashboard,
    Save {
        name: String,
        description: Option<String>,
    },
    SaveLast {
        name: String,
        description: Option<String>,
    },
    Load(String),
    Presets,
    Delete(String),
    Select(String),
    Generate(String),
    Stats,
    Facets,
    Help,
    Quit,
}

pub const HELP: &str = "\
Type text to set the query. Commands:
  :search                  run the current query now
  :results                 show the current results
  :query [TEXT]            set (or clear) the query
  :live on|off             debounced search on every edit
  :agentic on|off          try the agentic endpoint first
  :top_k N                 number of results
  :rerank on|off           enable the cross-encoder re-ranker
  :weights D C M           dense/cross/meta weights, 0..1 in 0.1 steps
  :breakdown               per-result score breakdown
  :hybrid on|off [ALPHA]   lexical blending and its alpha
  :tag T / :type T         toggle a tag / component type filter
  :clear-filters           drop all filters
  :page N                  result page (1-based)
  :sort KEY                client-side sort of the result view
  :compare [FILE.csv]      before/after re-rank table, optional CSV export
  :dashboard               query log and session metrics
  :save NAME [DESC]        save the current parameters as a preset
  :save-last NAME [DESC]   save the last logged query as a preset
  :load ID                 load a preset (id, id prefix or name)
  :presets                 list presets
  :delete ID               delete a preset
  :select ID               toggle a result as generation context
  :generate PROMPT         generate code from the selected context
  :stats / :facets         backend collection info
  :help / :quit
";

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let Some(body) = line.strip_prefix(':') else {
            return Ok(ConsoleCommand::Query(line.to_string()));
        };

        let (name, rest) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match name {
            "search" | "s" => ConsoleCommand::Search,
            "results" | "r" => ConsoleCommand::Results,
            "query" | "q" => ConsoleCommand::Query(rest.to_string()),
            "live" => ConsoleCommand::Live(parse_switch(&args, ":live on|off")?),
            "agentic" => ConsoleCommand::Agentic(parse_switch(&args, ":agentic on|off")?),
            "top_k" | "topk" | "k" => {
                let k: usize = parse_single(&args, ":top_k N")?;
                if k == 0 {
                    return Err(CommandError::Invalid("top_k must be at least 1".to_string()));
                }
                ConsoleCommand::TopK(k)
            }
            "rerank" => ConsoleCommand::Rerank(parse_switch(&args, ":rerank on|off")?),
            "weights" | "w" => {
                const USAGE: &str = ":weights DENSE CROSS META";
                if args.len() != 3 {
                    return Err(CommandError::Usage(USAGE));
                }
                let values = args
                    .iter()
                    .map(|a| a.parse::<f64>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| CommandError::Usage(USAGE))?;
                ConsoleCommand::Weights(WeightVector::new(values[0], values[1], values[2]))
            }
            "breakdown" => ConsoleCommand::Breakdown,
            "hybrid" => {
                const USAGE: &str = ":hybrid on|off [ALPHA]";
                let enabled = parse_switch(args.get(..1).unwrap_or(&[]), USAGE)?;
                let alpha = match args.get(1) {
                    Some(a) => Some(a.parse::<f64>().map_err(|_| CommandError::Usage(USAGE))?),
                    None => None,
                };
                if args.len() > 2 {
                    return Err(CommandError::Usage(USAGE));
                }
                ConsoleCommand::Hybrid { enabled, alpha }
            }
            "tag" => ConsoleCommand::Tag(required(rest, ":tag TAG")?),
            "type" => {
                let name = required(rest, ":type TYPE")?;
                ConsoleCommand::Type(ComponentType::parse_lenient(&name))
            }
            "clear-filters" | "clear" => ConsoleCommand::ClearFilters,
            "page" => {
                let page: usize = parse_single(&args, ":page N")?;
                if page == 0 {
                    return Err(CommandError::Invalid("Pages start at 1".to_string()));
                }
                ConsoleCommand::Page(page)
            }
            "sort" => {
                let key = required(rest, ":sort KEY")?;
                ConsoleCommand::Sort(key.parse().map_err(CommandError::Invalid)?)
            }
            "compare" => ConsoleCommand::Compare(if rest.is_empty() {
                None
            } else {
                Some(PathBuf::from(rest))
            }),
            "dashboard" | "log" => ConsoleCommand::Dashboard,
            "save" => {
                let (name, description) = name_and_description(rest, ":save NAME [DESCRIPTION]")?;
                ConsoleCommand::Save { name, description }
            }
            "save-last" => {
                let (name, description) =
                    name_and_description(rest, ":save-last NAME [DESCRIPTION]")?;
                ConsoleCommand::SaveLast { name, description }
            }
            "load" => ConsoleCommand::Load(required(rest, ":load ID")?),
            "presets" => ConsoleCommand::Presets,
            "delete" => ConsoleCommand::Delete(required(rest, ":delete ID")?),
            "select" => ConsoleCommand::Select(required(rest, ":select ID")?),
            "generate" | "gen" => ConsoleCommand::Generate(required(rest, ":generate PROMPT")?),
            "stats" => ConsoleCommand::Stats,
            "facets" => ConsoleCommand::Facets,
            "help" | "h" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn parse_switch(args: &[&str], usage: &'static str) -> Result<bool, CommandError> {
    match args {
        [value] => match value.to_ascii_lowercase().as_str() {
            "on" | "true" | "yes" | "1" => Ok(true),
            "off" | "false" | "no" | "0" => Ok(false),
            _ => Err(CommandError::Usage(usage)),
        },
        _ => Err(CommandError::Usage(usage)),
    }
}

fn parse_single<T: FromStr>(args: &[&str], usage: &'static str) -> Result<T, CommandError> {
    match args {
        [value] => value.parse().map_err(|_| CommandError::Usage(usage)),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn required(rest: &str, usage: &'static str) -> Result<String, CommandError> {
    if rest.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(rest.to_string())
    }
}

fn name_and_description(
    rest: &str,
    usage: &'static str,
) -> Result<(String, Option<String>), CommandError> {
    let (name, description) = match rest.split_once(char::is_whitespace) {
        Some((name, description)) => (name, Some(description.trim().to_string())),
        None => (rest, None),
    };
    if name.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok((name.to_string(), description.filter(|d| !d.is_empty())))
}
