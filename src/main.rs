use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser};

use markup_reconciler::config::{init_default_config, resolve_config, AppConfig, CONFIG_ENV, CONFIG_FILENAME};
use markup_reconciler::content::ContentStore;
use markup_reconciler::progress::ConsoleProgress;
use markup_reconciler::refresh::{normalize_slugs, refresh_translations, RefreshOptions};
use markup_reconciler::{AddressLookup, Reconciler};

#[derive(Parser, Debug)]
#[command(name = "markup-reconciler")]
#[command(about = "Clean machine-translated HTML against its source markup and localize internal links", long_about = None)]
struct Args {
    /// Generate the default config file, then exit
    #[arg(long)]
    init_config: bool,

    /// Directory to write the config file (default: current directory)
    #[arg(long, value_name = "DIR")]
    init_config_dir: Option<PathBuf>,

    /// Overwrite an existing config file when used with --init-config
    #[arg(long)]
    force: bool,

    /// Content store JSON (items with source bodies and per-language translations)
    #[arg(value_name = "CONTENT_JSON")]
    input: Option<PathBuf>,

    /// Where to write the updated content store (default: in place)
    #[arg(short, long, value_name = "JSON")]
    output: Option<PathBuf>,

    /// Config file path (default: search for markup-reconciler.toml upwards)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only refresh this language code
    #[arg(long)]
    language: Option<String>,

    /// Only refresh these item ids
    #[arg(long, num_args = 1..)]
    item_ids: Vec<u64>,

    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Rewrite translated addresses into slug form before refreshing
    #[arg(long)]
    normalize_slugs: bool,

    /// Source-language HTML fragment (single-shot mode, prints to stdout)
    #[arg(long, value_name = "HTML", requires = "candidate")]
    reference: Option<PathBuf>,

    /// Translated HTML fragment (single-shot mode)
    #[arg(long, value_name = "HTML", requires = "reference")]
    candidate: Option<PathBuf>,

    /// JSON object of canonical -> localized addresses (single-shot mode)
    #[arg(long, value_name = "JSON")]
    lookup: Option<PathBuf>,

    /// No progress lines on stderr
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.init_config {
        let dir = args
            .init_config_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let cfg_path = init_default_config(&dir, args.force).context("init default config")?;
        eprintln!("Wrote config: {}", cfg_path.display());
        return Ok(());
    }

    let workdir = args
        .input
        .as_deref()
        .or(args.candidate.as_deref())
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let (cfg, cfg_path) = resolve_config(args.config.as_deref(), &workdir)?;
    init_logging(&cfg);
    match cfg_path.as_ref() {
        Some(p) => log::debug!("config: {}", p.display()),
        None => log::debug!("config: built-in defaults"),
    }

    if let (Some(reference), Some(candidate)) = (args.reference.as_ref(), args.candidate.as_ref()) {
        return reconcile_files(&cfg, reference, candidate, args.lookup.as_deref());
    }

    let input = match args.input {
        Some(p) => p,
        None => {
            let mut cmd = Args::command();
            cmd.print_help().context("print help")?;
            eprintln!(
                "\n\nUSAGE:\n  markup-reconciler <content.json> [--language fr] [--dry-run]\n  markup-reconciler --reference source.html --candidate translated.html [--lookup addresses.json]\n\nTIPS:\n  - Default config search: {CONFIG_FILENAME} (upwards), or set {CONFIG_ENV}.\n"
            );
            return Ok(());
        }
    };
    let output = args.output.clone().unwrap_or_else(|| input.clone());
    let progress = ConsoleProgress::new(!args.quiet);

    let mut store = ContentStore::read(&input)?;
    progress.info(format!("Loaded {} item(s) from {}", store.items.len(), input.display()));

    if args.normalize_slugs {
        let changes = normalize_slugs(&mut store, args.language.as_deref(), args.dry_run);
        for c in &changes {
            progress.info(format!("slug {} [{}]: {:?} -> {:?}", c.item_id, c.language, c.old, c.new));
        }
        progress.info(format!("{} address(es) normalized", changes.len()));
    }

    let default_language = store
        .default_language
        .clone()
        .unwrap_or_else(|| cfg.default_language().to_string());
    let opts = RefreshOptions {
        language: args.language.clone(),
        item_ids: args.item_ids.clone(),
        dry_run: args.dry_run,
        default_language,
        languages: cfg.site.languages.clone(),
        reconcile: cfg.reconcile_options(),
    };
    let summary = refresh_translations(&mut store, &opts, &progress)?;

    if summary.dry_run {
        progress.info(format!("Dry run: {} translation(s) would change", summary.total_updates));
        return Ok(());
    }
    store.write(&output)?;
    progress.info(format!(
        "Wrote {} ({} translation(s) updated)",
        output.display(),
        summary.total_updates
    ));
    Ok(())
}

fn init_logging(cfg: &AppConfig) {
    let env = env_logger::Env::default().default_filter_or(cfg.log_level());
    let _ = env_logger::Builder::from_env(env).format_timestamp(None).try_init();
}

fn reconcile_files(
    cfg: &AppConfig,
    reference: &Path,
    candidate: &Path,
    lookup: Option<&Path>,
) -> anyhow::Result<()> {
    let reference_html = std::fs::read_to_string(reference)
        .with_context(|| format!("read reference: {}", reference.display()))?;
    let candidate_html = std::fs::read_to_string(candidate)
        .with_context(|| format!("read candidate: {}", candidate.display()))?;
    let lookup: AddressLookup = match lookup {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("read lookup: {}", p.display()))?;
            serde_json::from_str::<HashMap<String, String>>(&text)
                .with_context(|| format!("parse lookup json: {}", p.display()))?
        }
        None => AddressLookup::new(),
    };

    let reconciled = Reconciler::new(cfg.reconcile_options()).run(
        Some(reference_html.as_str()),
        Some(candidate_html.as_str()),
        &lookup,
    );
    log::info!(
        "unwrapped {} tag(s), removed {} break(s), rewrote {} link(s){}",
        reconciled.unwrapped_tags,
        reconciled.removed_breaks,
        reconciled.rewritten_links,
        if reconciled.restored { ", restored from source skeleton" } else { "" }
    );
    println!("{}", reconciled.markup);
    Ok(())
}
