use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::ProgressBar;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use wikifeed::config::{self, ExtractionBudget};
use wikifeed::fields::ExtractMode;
use wikifeed::generate::{CompletionClient, CompletionConfig};
use wikifeed::models::CandidateArticle;
use wikifeed::scanner::open_dump;
use wikifeed::session::ExtractionSession;
use wikifeed::store::Store;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wikifeed")]
#[command(about = "Mine Wikipedia dumps for articles and generate short-form posts")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract candidate articles from a Wikipedia dump into JSONL
    Extract(ExtractArgs),
    /// Import extracted candidates into the article database
    Import(ImportArgs),
    /// Generate posts from imported articles via the completion API
    Generate(GenerateArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Strict structural parse of each page fragment
    Structured,
    /// Lightweight marker scan for the title/text delimiters
    MarkerScan,
}

impl From<ModeArg> for ExtractMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Structured => ExtractMode::Structured,
            ModeArg::MarkerScan => ExtractMode::MarkerScan,
        }
    }
}

#[derive(Args)]
struct ExtractArgs {
    /// Path to the Wikipedia dump file (.xml or .xml.bz2)
    #[arg(short, long)]
    input: String,

    /// Output JSONL file, one candidate article per line
    #[arg(short, long)]
    output: String,

    /// Field extraction strategy
    #[arg(long, value_enum, default_value_t = ModeArg::MarkerScan)]
    mode: ModeArg,

    /// Stop after emitting this many candidates
    #[arg(long, default_value_t = config::DEFAULT_MAX_CANDIDATES)]
    max_candidates: u64,

    /// Minimum article body length in bytes
    #[arg(long, default_value_t = config::DEFAULT_MIN_BODY_LENGTH)]
    min_body_length: usize,

    /// Intro excerpt cap in characters
    #[arg(long, default_value_t = config::DEFAULT_INTRO_CAP)]
    intro_cap: usize,

    /// Maximum image references kept per candidate
    #[arg(long, default_value_t = config::DEFAULT_IMAGE_CAP)]
    image_cap: usize,

    /// Title exclusion pattern (repeatable; replaces the default set)
    #[arg(long = "exclude")]
    exclude: Vec<String>,
}

#[derive(Args)]
struct ImportArgs {
    /// Candidates JSONL file produced by `extract`
    #[arg(short, long)]
    input: String,

    /// SQLite database path
    #[arg(long, default_value = "wikifeed.db")]
    db: String,
}

#[derive(Args)]
struct GenerateArgs {
    /// SQLite database path
    #[arg(long, default_value = "wikifeed.db")]
    db: String,

    /// Number of posts to generate in this batch
    #[arg(long, default_value_t = 5)]
    count: u32,

    /// Completion API base URL
    #[arg(long, default_value = wikifeed::generate::DEFAULT_BASE_URL)]
    base_url: String,

    /// Completion model name
    #[arg(long, default_value = wikifeed::generate::DEFAULT_MODEL)]
    model: String,
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    let budget = ExtractionBudget {
        max_candidates: args.max_candidates,
        min_body_length: args.min_body_length,
        intro_excerpt_cap: args.intro_cap,
        image_cap: args.image_cap,
        title_exclusion_patterns: if args.exclude.is_empty() {
            ExtractionBudget::default().title_exclusion_patterns
        } else {
            args.exclude
        },
        ..ExtractionBudget::default()
    };

    info!(input = %args.input, mode = ?args.mode, "Starting extraction pass");
    let start = Instant::now();

    let reader = open_dump(&args.input)?;
    let mut session = ExtractionSession::new(reader, budget, args.mode.into());

    let out = File::create(&args.output)
        .with_context(|| format!("Failed to create output file: {}", args.output))?;
    let mut writer = BufWriter::new(out);

    let pb = ProgressBar::new_spinner();
    let mut written = 0u64;
    for result in session.by_ref() {
        let candidate = result.context("Extraction failed")?;
        serde_json::to_writer(&mut writer, &candidate)?;
        writer.write_all(b"\n")?;
        written += 1;
        if written % config::PROGRESS_INTERVAL == 0 {
            pb.tick();
        }
    }
    writer.flush().context("Failed to flush output file")?;
    pb.finish_and_clear();

    let duration = start.elapsed();
    info!(
        emitted = session.emitted(),
        skipped = session.skipped(),
        duration_secs = duration.as_secs_f64(),
        "Extraction complete"
    );

    println!();
    println!("=== Summary ===");
    println!("Extraction time:    {:.2}s", duration.as_secs_f64());
    println!("Candidates emitted: {}", session.emitted());
    println!("Fragments skipped:  {}", session.skipped());
    println!("Output:             {}", args.output);

    Ok(())
}

async fn run_import(args: ImportArgs) -> Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open candidates file: {}", args.input))?;
    let store = Store::open(&args.db)
        .await
        .with_context(|| format!("Failed to open database: {}", args.db))?;

    let mut inserted = 0u64;
    let mut duplicates = 0u64;
    let mut invalid = 0u64;

    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("Failed to read candidates file")?;
        if line.trim().is_empty() {
            continue;
        }
        let candidate: CandidateArticle = match serde_json::from_str(&line) {
            Ok(c) => c,
            Err(e) => {
                warn!(line = lineno + 1, error = %e, "Skipping unparseable candidate");
                invalid += 1;
                continue;
            }
        };
        if store.insert_article(&candidate).await? {
            inserted += 1;
        } else {
            duplicates += 1;
        }
    }

    info!(inserted, duplicates, invalid, "Import complete");

    println!();
    println!("=== Summary ===");
    println!("Articles imported:  {}", inserted);
    println!("Duplicate titles:   {}", duplicates);
    println!("Invalid lines:      {}", invalid);
    println!("Articles in store:  {}", store.article_count().await?);

    Ok(())
}

async fn run_generate(args: GenerateArgs) -> Result<()> {
    let api_key = match std::env::var("DEEPSEEK_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => bail!("DEEPSEEK_API_KEY is not set"),
    };

    let store = Store::open(&args.db)
        .await
        .with_context(|| format!("Failed to open database: {}", args.db))?;
    let client = CompletionClient::new(CompletionConfig {
        base_url: args.base_url,
        api_key,
        model: args.model,
    });

    let articles = store.fetch_unprocessed(args.count).await?;
    if articles.is_empty() {
        bail!("No unprocessed articles in the database. Run 'wikifeed import' first.");
    }

    let mut created = 0u64;
    let mut failed = 0u64;

    for article in &articles {
        info!(title = %article.title, "Generating post");
        match client.generate_post(&article.title, &article.intro).await {
            Ok(post) => {
                let post_id = store.insert_post(article.id, &post).await?;
                store.mark_processed(article.id).await?;
                info!(post_id, title = %post.title, "Post saved");
                created += 1;
            }
            Err(e) => {
                // One bad completion never aborts the batch.
                warn!(title = %article.title, error = %e, "Generation failed");
                failed += 1;
            }
        }
    }

    println!();
    println!("=== Summary ===");
    println!("Posts created:      {}", created);
    println!("Failures:           {}", failed);
    println!("Posts in store:     {}", store.post_count().await?);

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Import(args) => block_on(run_import(args)),
        Commands::Generate(args) => block_on(run_generate(args)),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(fut: F) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("wikifeed-worker")
        .enable_io()
        .enable_time()
        .build()?;
    rt.block_on(fut)
}
