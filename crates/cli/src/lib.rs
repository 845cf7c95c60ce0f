use anyhow::{bail, Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use codebook_batch::{
    batch_process_chunks, estimate_model_calls, BatchConfig, CancelToken, CommandGenerator,
    PromptPreparer, PromptTemplate, DEFAULT_PROMPT_OVERHEAD,
};
use codebook_chunker::{Budget, CodebaseChunker};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

mod config;
mod flags;
mod input;
mod report;

use config::FileConfig;
use flags::OutputFormat;
use input::Input;

#[derive(Parser)]
#[command(name = "codebook")]
#[command(about = "Chunk source trees into token-bounded prompts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML file with optional [chunker] and [batch] tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model context length (overrides the config file and CURRENT_MODEL_CONTEXT_LENGTH)
    #[arg(long, global = true)]
    context_length: Option<usize>,

    /// Output format (json reserves stdout for JSON and implies --quiet)
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack files into token-bounded chunks
    Chunk(ChunkArgs),

    /// Estimate model calls from content size, without chunking
    Estimate(EstimateArgs),

    /// Render one prompt per chunk
    Prompts(PromptArgs),

    /// Render prompts and submit them to a generator command
    Run(RunArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Directory that listing paths are made relative to
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Files to process
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Args)]
struct ChunkArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Override the overlap ratio
    #[arg(long)]
    overlap_ratio: Option<f64>,

    /// Extract files on the current thread
    #[arg(long)]
    sequential: bool,
}

#[derive(Args)]
struct EstimateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Prompt tokens added per call
    #[arg(long, default_value_t = DEFAULT_PROMPT_OVERHEAD)]
    overhead: usize,
}

#[derive(Args)]
struct TemplateArgs {
    /// File holding the prompt template
    #[arg(long, conflicts_with = "template_text")]
    template: Option<PathBuf>,

    /// Inline prompt template
    #[arg(long)]
    template_text: Option<String>,

    /// Prompt tokens reserved per chunk
    #[arg(long, default_value_t = DEFAULT_PROMPT_OVERHEAD)]
    overhead: usize,
}

#[derive(Args)]
struct PromptArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    template: TemplateArgs,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    template: TemplateArgs,

    /// Shell command that reads a prompt on stdin and writes the response to stdout
    #[arg(long)]
    generator: String,

    /// Override the retry limit for transient errors
    #[arg(long)]
    max_retries: Option<u32>,

    /// Let the generator serve cached answers on first attempts
    #[arg(long)]
    use_cache: bool,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();
    if cli.format.is_json() {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let file_config = FileConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Chunk(args) => run_chunk(cli.format, cli.context_length, file_config, args),
        Commands::Estimate(args) => {
            run_estimate(cli.format, cli.context_length, &file_config, args)
        }
        Commands::Prompts(args) => {
            run_prompts(cli.format, cli.context_length, file_config, args)
        }
        Commands::Run(args) => run_batch(cli.format, cli.context_length, file_config, args).await,
    }
}

fn run_chunk(
    format: OutputFormat,
    context_length: Option<usize>,
    file_config: FileConfig,
    args: ChunkArgs,
) -> Result<()> {
    let window = file_config.context_window(context_length);
    let mut chunker_config = file_config.chunker;
    if let Some(ratio) = args.overlap_ratio {
        chunker_config.overlap_ratio = ratio;
    }
    if args.sequential {
        chunker_config.parallel = false;
    }

    let input = Input::read(args.input.base_dir, &args.input.files)?;
    let budget = Budget::current(window.as_ref());
    let chunker = CodebaseChunker::new(chunker_config)?;
    let arena = chunker.extract(&input.base_dir, &input.paths, &input.contents)?;
    let chunks = chunker.pack(&arena, budget)?;

    if format.is_json() {
        let summaries: Vec<_> = chunks.iter().map(|c| c.summary()).collect();
        print_json(&summaries)
    } else {
        let oversized = chunker.oversized_paths(&arena, budget);
        print!(
            "{}",
            report::render_chunks(&chunks, budget.max_input_tokens, &oversized)
        );
        Ok(())
    }
}

fn run_estimate(
    format: OutputFormat,
    context_length: Option<usize>,
    file_config: &FileConfig,
    args: EstimateArgs,
) -> Result<()> {
    let window = file_config.context_window(context_length);
    let input = Input::read(args.input.base_dir, &args.input.files)?;
    let estimate = estimate_model_calls(&input.paths, &input.contents, args.overhead, window.as_ref());

    if format.is_json() {
        print_json(&estimate)
    } else {
        print!("{}", report::render_estimate(&estimate));
        Ok(())
    }
}

fn load_template(args: &TemplateArgs) -> Result<PromptTemplate> {
    let text = match (&args.template, &args.template_text) {
        (Some(path), _) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))?,
        (None, Some(text)) => text.clone(),
        (None, None) => bail!("Either --template or --template-text is required"),
    };
    Ok(PromptTemplate::new(text)?)
}

fn prepare(
    context_length: Option<usize>,
    file_config: &FileConfig,
    input_args: InputArgs,
    template_args: &TemplateArgs,
) -> Result<Vec<codebook_batch::PreparedPrompt>> {
    let template = load_template(template_args)?;
    let window = file_config.context_window(context_length);
    let input = Input::read(input_args.base_dir, &input_args.files)?;
    let preparer = PromptPreparer::new(template, template_args.overhead)
        .with_chunker_config(file_config.chunker.clone());
    Ok(preparer.run(
        &input.base_dir,
        &input.paths,
        &input.contents,
        window.as_ref(),
    )?)
}

fn run_prompts(
    format: OutputFormat,
    context_length: Option<usize>,
    file_config: FileConfig,
    args: PromptArgs,
) -> Result<()> {
    let prompts = prepare(context_length, &file_config, args.input, &args.template)?;
    if format.is_json() {
        print_json(&prompts)
    } else {
        print!("{}", report::render_prompts(&prompts));
        Ok(())
    }
}

async fn run_batch(
    format: OutputFormat,
    context_length: Option<usize>,
    file_config: FileConfig,
    args: RunArgs,
) -> Result<()> {
    let prompts = prepare(context_length, &file_config, args.input, &args.template)?;

    let batch_config = BatchConfig {
        max_retries: args.max_retries.unwrap_or(file_config.batch.max_retries),
        use_cache: args.use_cache || file_config.batch.use_cache,
        ..file_config.batch
    };

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received; stopping after the current chunk");
            on_interrupt.cancel();
        }
    });

    let generator = CommandGenerator::new(args.generator);
    let results = batch_process_chunks(&prompts, &generator, &batch_config, &cancel).await?;

    let failed = results.iter().filter(|r| !r.is_ok()).count();
    log::info!(
        "Processed {} of {} chunks ({failed} failed)",
        results.len(),
        prompts.len()
    );

    if format.is_json() {
        print_json(&results)
    } else {
        print!("{}", report::render_results(&results));
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
