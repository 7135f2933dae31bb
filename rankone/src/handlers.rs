use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rankone_core::data::Database;
use rankone_core::model::{ContentNode, PageScore, ScoreNode};
use rankone_core::report::{
    ReportFormat, generate_analysis_text_report, generate_json_report, generate_tree_text_report,
    save_report,
};
use rankone_core::{
    AnalysisService, AnalyzeService, CompositeAnalyzer, JsonReportSerializer, ScoreTree, scoring,
};
use rankone_scanner::{HttpEncodingProbe, PageFetcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

pub const DB_FILE_NAME: &str = "rankone.db";
pub const DEFAULT_DB_DIR: &str = "~/.config/rankone/";

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Expands `~` and appends the database file name to a directory argument.
pub fn resolve_db_path(dir: &str) -> PathBuf {
    let expanded = shellexpand::tilde(dir);
    Path::new(expanded.as_ref()).join(DB_FILE_NAME)
}

/// Reads a content forest from JSON. A single root object is accepted as a
/// one-tree forest.
pub fn load_tree(path: &Path) -> Result<Vec<ContentNode>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tree file {}", path.display()))?;

    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let nodes = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|node| vec![node])
    }
    .with_context(|| format!("{} is not a content tree", path.display()))?;

    Ok(nodes)
}

fn open_database(dir: &str) -> Result<Database> {
    let db_path = resolve_db_path(dir);
    if !Database::exists(&db_path) {
        return Err(anyhow!(
            "No database at {}. Run `rankone init` first.",
            db_path.display()
        ));
    }
    Database::new(&db_path).with_context(|| format!("Failed to open {}", db_path.display()))
}

fn report_format(args: &ArgMatches) -> ReportFormat {
    args.get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text)
}

fn emit(content: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            save_report(content, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("{} Report saved to {}", "✓".green(), path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn render_tree(kind: &str, nodes: &[ScoreNode], format: ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Text => generate_tree_text_report(nodes),
        ReportFormat::Json => generate_json_report(kind, &nodes)?,
    })
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    let dir = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(DEFAULT_DB_DIR);
    let force = args.get_flag("force");
    let db_path = resolve_db_path(dir);

    if Database::exists(&db_path) {
        if !force {
            println!(
                "{} Database already exists at {} (use --force to recreate it)",
                "⚠".yellow(),
                db_path.display()
            );
            return Ok(());
        }
        Database::drop(&db_path)
            .with_context(|| format!("Failed to remove {}", db_path.display()))?;
    }

    Database::new(&db_path)
        .with_context(|| format!("Failed to create {}", db_path.display()))?;
    println!("{} Database created at {}", "✓".green(), db_path.display());
    Ok(())
}

pub async fn handle_analyze(args: &ArgMatches) -> Result<()> {
    let url = args
        .get_one::<Url>("url")
        .ok_or_else(|| anyhow!("--url is required"))?;
    let timeout = *args.get_one::<u64>("timeout").unwrap_or(&10);

    let progress = spinner(&format!("Analyzing {}", url));
    let score = match args.get_one::<i64>("node") {
        Some(&node_id) => store_analysis(args, url, node_id, timeout).await,
        None => analyze_page(url, timeout).await,
    };
    progress.finish_and_clear();
    let score = score?;

    let content = match report_format(args) {
        ReportFormat::Text => generate_analysis_text_report(url.as_str(), &score),
        ReportFormat::Json => generate_json_report("analysis", &score)?,
    };
    emit(&content, args.get_one::<PathBuf>("output"))
}

async fn analyze_page(url: &Url, timeout: u64) -> Result<PageScore> {
    let fetcher = PageFetcher::with_timeout(timeout)?;
    let page = fetcher
        .fetch(url.as_str())
        .await
        .with_context(|| format!("Failed to retrieve {}", url))?;
    Ok(scoring::score(standard_analyzer(timeout)?.analyze(&page).await))
}

async fn store_analysis(args: &ArgMatches, url: &Url, node_id: i64, timeout: u64) -> Result<PageScore> {
    let service = analyze_service(Arc::new(open_database(db_dir(args))?), timeout)?;
    let node = ContentNode::new(node_id, url.as_str()).with_url(url.as_str());
    let keyword = args.get_one::<String>("keyword").map(String::as_str);

    let page_analysis = service
        .create_analysis(&node, keyword)
        .await
        .with_context(|| format!("Failed to analyze {} for node {}", url, node_id))?;
    info!("Stored report for node {}", node_id);
    Ok(page_analysis.score)
}

fn standard_analyzer(timeout: u64) -> Result<CompositeAnalyzer> {
    let probe = HttpEncodingProbe::with_timeout(Duration::from_secs(timeout))?;
    Ok(CompositeAnalyzer::standard_with_timeout(
        Arc::new(probe),
        Duration::from_secs(timeout),
    ))
}

fn analyze_service(store: Arc<Database>, timeout: u64) -> Result<AnalyzeService> {
    Ok(AnalyzeService::new(
        PageFetcher::with_timeout(timeout)?,
        standard_analyzer(timeout)?,
        store,
        Arc::new(JsonReportSerializer),
    ))
}

fn db_dir(args: &ArgMatches) -> &str {
    args.get_one::<String>("db")
        .map(String::as_str)
        .unwrap_or(DEFAULT_DB_DIR)
}

fn build_score_tree(args: &ArgMatches, timeout: u64) -> Result<ScoreTree> {
    let store = Arc::new(open_database(db_dir(args))?);
    let service = analyze_service(store.clone(), timeout)?;
    Ok(ScoreTree::new(
        store,
        Arc::new(JsonReportSerializer),
        Arc::new(service),
    ))
}

fn tree_nodes(args: &ArgMatches) -> Result<Vec<ContentNode>> {
    let tree_path = args
        .get_one::<PathBuf>("tree")
        .ok_or_else(|| anyhow!("--tree is required"))?;
    load_tree(tree_path)
}

pub fn handle_scores(args: &ArgMatches) -> Result<()> {
    let nodes = tree_nodes(args)?;
    let tree = build_score_tree(args, 10)?;

    let scores = tree.get_cached_scores(Some(nodes.as_slice()))?;
    let content = render_tree("cached_scores", &scores, report_format(args))?;
    emit(&content, args.get_one::<PathBuf>("output"))
}

pub async fn handle_update(args: &ArgMatches) -> Result<()> {
    let nodes = tree_nodes(args)?;
    let timeout = *args.get_one::<u64>("timeout").unwrap_or(&10);
    let concurrency = *args.get_one::<usize>("concurrency").unwrap_or(&4);

    let progress = Arc::new(spinner("Updating scores..."));
    let processed = Arc::new(AtomicUsize::new(0));
    let progress_clone = progress.clone();
    let tree = build_score_tree(args, timeout)?
        .with_concurrency(concurrency)
        .with_node_callback(Arc::new(move |_id: i64, name: &str| {
            let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
            progress_clone.set_message(format!("Updating scores... {} nodes ({})", count, name));
        }));

    let result = tree.update_scores(Some(nodes.as_slice())).await;
    progress.finish_and_clear();
    let scores = result?;

    let total: usize = scores.iter().map(ScoreNode::count).sum();
    info!("Updated score tree with {} nodes", total);

    let content = render_tree("updated_scores", &scores, report_format(args))?;
    emit(&content, args.get_one::<PathBuf>("output"))
}
