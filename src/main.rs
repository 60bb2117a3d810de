use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pubmed_search::analysis::{annotate, ExtractiveAnalyzer, LiteratureReview};
use pubmed_search::config::{
    find_config_file, get_config, read_config_file, write_config_file, Config, CONFIG_FILE_NAME,
};
use pubmed_search::models::{
    Article, Language, PublicationType, SearchCriteria, SearchField, SortBy, DEFAULT_MAX_RESULTS,
};
use pubmed_search::pubmed::{compile, CancellationFlag, PubMedSearcher};
use pubmed_search::ui::{self, SearchProgress, Status};
use pubmed_search::utils::save_results;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// PubMed Search - Structured literature search against NCBI PubMed
#[derive(Parser, Debug)]
#[command(name = "pubmed-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Structured literature search against NCBI PubMed", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
    /// One block per article with the start of its abstract
    Detail,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search PubMed and print the matching articles
    #[command(alias = "s")]
    Search {
        #[command(flatten)]
        criteria: CriteriaArgs,

        /// Save the results as JSON to this path
        #[arg(long)]
        save: Option<PathBuf>,

        /// Print a literature review instead of the article list
        #[arg(long)]
        review: bool,
    },

    /// Print the compiled PubMed query without contacting the service
    #[command(alias = "q")]
    Query {
        #[command(flatten)]
        criteria: CriteriaArgs,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Show this file as written, without environment overrides
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show which config file would be used
    Path,
    /// Write a default configuration file
    Init {
        /// Destination (defaults to ./pubmed-search.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Search criteria flags shared by `search` and `query`
#[derive(Args, Debug)]
struct CriteriaArgs {
    /// Search keywords
    keywords: String,

    /// Publication type filter (e.g. meta_analysis, randomized_controlled_trial)
    #[arg(long = "publication-type", short = 't', value_parser = parse_variant::<PublicationType>)]
    publication_types: Vec<PublicationType>,

    /// MeSH term
    #[arg(long = "mesh", short = 'm')]
    mesh_terms: Vec<String>,

    /// Language filter (e.g. english, japanese)
    #[arg(long = "language", short = 'l', value_parser = parse_variant::<Language>)]
    languages: Vec<Language>,

    /// Author name
    #[arg(long = "author", short = 'a')]
    authors: Vec<String>,

    /// Journal name
    #[arg(long = "journal", short = 'j')]
    journals: Vec<String>,

    /// Author affiliation
    #[arg(long = "affiliation")]
    affiliations: Vec<String>,

    /// Field to search the keywords in (e.g. title, title_abstract)
    #[arg(long = "field", short = 'f', value_parser = parse_variant::<SearchField>)]
    fields: Vec<SearchField>,

    /// Keyword to exclude
    #[arg(long = "exclude", short = 'x')]
    exclude: Vec<String>,

    /// First publication year
    #[arg(long)]
    start_year: Option<i32>,

    /// Last publication year
    #[arg(long)]
    end_year: Option<i32>,

    /// Keep only articles cited at least this many times
    #[arg(long)]
    min_citations: Option<u32>,

    /// Only articles with free full text
    #[arg(long)]
    free_full_text: bool,

    /// Only studies on humans
    #[arg(long)]
    humans_only: bool,

    /// Maximum number of results
    #[arg(long, short = 'n', default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Sort order (relevance, date, journal, author, title)
    #[arg(long, default_value = "relevance", value_parser = parse_variant::<SortBy>)]
    sort: SortBy,

    /// Tag MeSH terms as [MeSH Terms:noexp]
    #[arg(long)]
    mesh_noexp: bool,
}

impl CriteriaArgs {
    fn to_criteria(&self) -> Result<SearchCriteria> {
        let mut builder = SearchCriteria::builder(self.keywords.as_str())
            .free_full_text(self.free_full_text)
            .humans_only(self.humans_only)
            .max_results(self.max_results)
            .sort_by(self.sort)
            .include_mesh_subheadings(self.mesh_noexp);

        for publication_type in &self.publication_types {
            builder = builder.publication_type(*publication_type);
        }
        for term in &self.mesh_terms {
            builder = builder.mesh_term(term);
        }
        for language in &self.languages {
            builder = builder.language(*language);
        }
        for author in &self.authors {
            builder = builder.author(author);
        }
        for journal in &self.journals {
            builder = builder.journal(journal);
        }
        for affiliation in &self.affiliations {
            builder = builder.affiliation(affiliation);
        }
        for field in &self.fields {
            builder = builder.search_field(*field);
        }
        for keyword in &self.exclude {
            builder = builder.exclude_keyword(keyword);
        }
        if let Some(year) = self.start_year {
            builder = builder.start_year(year);
        }
        if let Some(year) = self.end_year {
            builder = builder.end_year(year);
        }
        if let Some(count) = self.min_citations {
            builder = builder.min_citations(count);
        }

        builder.build().context("Invalid search criteria")
    }
}

/// Parse a flag value with the type's serde names, accepting dashes for underscores
fn parse_variant<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    let name = value.trim().to_lowercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(name))
        .map_err(|_| format!("unknown value '{}'", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = get_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(timeout) = cli.timeout {
        config.eutils.timeout_secs = timeout;
    }

    init_tracing(&cli, &config);

    match cli.command {
        Commands::Search {
            ref criteria,
            ref save,
            review,
        } => {
            let criteria = criteria.to_criteria()?;
            run_search(&cli, &config, &criteria, save.as_ref(), review).await?;
        }

        Commands::Query { ref criteria } => {
            println!("{}", compile(&criteria.to_criteria()?));
        }

        Commands::Config { ref action } => match action {
            ConfigAction::Show { file } => {
                let mut shown = match file {
                    Some(path) => read_config_file(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                    None => config.clone(),
                };
                if shown.eutils.api_key().is_some() {
                    shown.eutils.api_key = Some("********".to_string());
                }
                print!("{}", shown.to_toml()?);
            }
            ConfigAction::Path => match find_config_file() {
                Some(path) => println!("{}", path.display()),
                None => println!("No config file found; using defaults and environment"),
            },
            ConfigAction::Init { path, force } => {
                let path = path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
                let mut template = Config::default();
                template.eutils.api_key = None;
                write_config_file(&template, &path, *force)?;
                if !cli.quiet {
                    ui::print_status(
                        Status::Success,
                        &format!("Wrote {}", path.display()),
                    );
                }
            }
        },
    }

    Ok(())
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("pubmed_search={}", level)));

    let json = config.logging.is_json();
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

async fn run_search(
    cli: &Cli,
    config: &Config,
    criteria: &SearchCriteria,
    save: Option<&PathBuf>,
    review: bool,
) -> Result<()> {
    let format = cli.output.resolve();
    let searcher = PubMedSearcher::from_config(config)?;

    let cancel = CancellationFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current batch");
            on_interrupt.cancel();
        }
    });

    let show_progress = !cli.quiet && ui::is_terminal() && format != OutputFormat::Json;
    let progress = SearchProgress::new(show_progress);
    let started = Instant::now();
    let articles = match searcher
        .search_cancellable(criteria, |current, total| progress.update(current, total), &cancel)
        .await
    {
        Ok(articles) => {
            progress.finish_with_success(&format!("{} articles", articles.len()));
            articles
        }
        Err(e) => {
            progress.finish_with_error(&e.to_string());
            return Err(e.into());
        }
    };

    if let Some(path) = save {
        if save_results(&articles, path)? {
            if !cli.quiet {
                ui::print_status(
                    Status::Success,
                    &format!("Saved {} articles to {}", articles.len(), path.display()),
                );
            }
        } else if !cli.quiet {
            ui::print_status(Status::Warning, "No articles to save");
        }
    }

    if review {
        let annotated = annotate(articles, &ExtractiveAnalyzer).await;
        let review = LiteratureReview::compose(&annotated)?;
        if format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&review)?);
        } else {
            println!("{}", review.content);
        }
        return Ok(());
    }

    if matches!(format, OutputFormat::Table | OutputFormat::Detail) && !cli.quiet {
        ui::print_search_header(criteria.keywords(), articles.len(), started.elapsed());
    }
    output_articles(&articles, format)
}

fn output_articles(articles: &[Article], format: OutputFormat) -> Result<()> {
    match format.resolve() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(articles)?);
        }
        OutputFormat::Plain => {
            for article in articles {
                println!("{}", ui::plain_line(article));
            }
        }
        OutputFormat::Detail => {
            for (i, article) in articles.iter().enumerate() {
                ui::print_article_box(i + 1, article);
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            if articles.is_empty() {
                ui::print_status(Status::Info, "No articles found");
            } else {
                println!("{}", ui::render_table(articles));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["pubmed-search", "search", "sepsis"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert!(cli.timeout.is_none());

        let Commands::Search {
            criteria,
            save,
            review,
        } = cli.command
        else {
            panic!("expected search");
        };
        assert_eq!(criteria.keywords, "sepsis");
        assert_eq!(criteria.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(criteria.sort, SortBy::Relevance);
        assert!(save.is_none());
        assert!(!review);
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["pubmed-search", "-vv", "query", "x"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["pubmed-search", "query", "x", "--output", "json"]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(OutputFormat::Plain.resolve(), OutputFormat::Plain);
    }

    #[test]
    fn test_search_alias_and_filters() {
        let cli = Cli::parse_from([
            "pubmed-search",
            "s",
            "septic shock",
            "-t",
            "randomized-controlled-trial",
            "--publication-type",
            "meta_analysis",
            "-l",
            "English",
            "--field",
            "title_abstract",
            "--mesh",
            "Shock, Septic",
            "--start-year",
            "2015",
            "--end-year",
            "2020",
            "--min-citations",
            "10",
            "--sort",
            "date",
            "--mesh-noexp",
            "--humans-only",
            "-n",
            "50",
            "--save",
            "out.json",
        ]);
        let Commands::Search { criteria, save, .. } = cli.command else {
            panic!("expected search");
        };
        assert_eq!(save, Some(PathBuf::from("out.json")));

        let built = criteria.to_criteria().unwrap();
        assert_eq!(
            built.publication_types(),
            &[
                PublicationType::RandomizedControlledTrial,
                PublicationType::MetaAnalysis
            ]
        );
        assert_eq!(built.languages(), &[Language::English]);
        assert_eq!(built.search_fields(), &[SearchField::TitleAbstract]);
        assert_eq!(built.start_year(), Some(2015));
        assert_eq!(built.end_year(), Some(2020));
        assert_eq!(built.min_citations(), Some(10));
        assert_eq!(built.sort_by(), SortBy::Date);
        assert_eq!(built.max_results(), 50);
        assert!(built.humans_only());
        assert!(built.include_mesh_subheadings());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let sort = ["pubmed-search", "search", "x", "--sort", "citations"];
        assert!(Cli::try_parse_from(sort).is_err());
        assert!(Cli::try_parse_from(["pubmed-search", "search", "x", "-l", "klingon"]).is_err());

        let cli = Cli::parse_from(["pubmed-search", "query", "x", "--start-year", "1700"]);
        let Commands::Query { criteria } = cli.command else {
            panic!("expected query");
        };
        assert!(criteria.to_criteria().is_err());
    }

    #[test]
    fn test_config_show_file() {
        let cli = Cli::parse_from(["pubmed-search", "config", "show", "--file", "a.toml"]);
        match cli.command {
            Commands::Config {
                action: ConfigAction::Show { file },
            } => assert_eq!(file, Some(PathBuf::from("a.toml"))),
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::parse_from(["pubmed-search", "config", "show"]);
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show { file: None }
            }
        ));
    }

    #[test]
    fn test_config_init_command() {
        let cli = Cli::parse_from([
            "pubmed-search",
            "config",
            "init",
            "--path",
            "c.toml",
            "--force",
        ]);
        match cli.command {
            Commands::Config {
                action: ConfigAction::Init { path, force },
            } => {
                assert_eq!(path, Some(PathBuf::from("c.toml")));
                assert!(force);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
