use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "snapsuite", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the qualifying test sequence without rendering.
    List(ListArgs),
    /// Render every qualifying test and write `actual.<ext>` files.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct SuiteArgs {
    /// Suite config JSON. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Corpus root (`<root>/<category>/<test>/style.json`).
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Ignore document (JSON object keyed by `<category>/<test>`).
    #[arg(long)]
    ignore: Option<PathBuf>,

    /// Extra exclusion as `name,category`. Repeatable.
    #[arg(long = "exclude", value_name = "NAME,CATEGORY")]
    exclude: Vec<String>,

    /// Do not apply the built-in exclusion list.
    #[arg(long, default_value_t = false)]
    no_builtin_exclusions: bool,
}

#[derive(Parser, Debug)]
struct ListArgs {
    #[command(flatten)]
    suite: SuiteArgs,

    /// Also print skipped entries and why.
    #[arg(long, default_value_t = false)]
    skipped: bool,
}

#[derive(Parser, Debug)]
struct RunArgs {
    #[command(flatten)]
    suite: SuiteArgs,

    /// Output root. Deleted and recreated when results are written.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Image format for results.
    #[arg(long, value_enum)]
    format: Option<FormatChoice>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Bmp,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::List(args) => cmd_list(args),
        Command::Run(args) => cmd_run(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "snapsuite=info",
        1 => "snapsuite=debug",
        _ => "snapsuite=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &SuiteArgs) -> anyhow::Result<snapsuite::SuiteConfig> {
    let mut cfg = match &args.config {
        Some(path) => snapsuite::SuiteConfig::from_path(path)
            .with_context(|| format!("load suite config '{}'", path.display()))?,
        None => snapsuite::SuiteConfig::default(),
    };

    if let Some(corpus) = &args.corpus {
        cfg.corpus_root = corpus.clone();
    }
    if let Some(ignore) = &args.ignore {
        cfg.ignore_file = Some(ignore.clone());
    }
    if args.no_builtin_exclusions {
        cfg.use_builtin_exclusions = false;
    }
    for pair in &args.exclude {
        let (name, category) = pair
            .split_once(',')
            .with_context(|| format!("--exclude '{pair}' must be NAME,CATEGORY"))?;
        cfg.excluded.push(snapsuite::ExcludedTest {
            name: name.to_owned(),
            category: category.to_owned(),
        });
    }
    Ok(cfg)
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.suite)?;
    let loader = cfg.build_loader()?;
    let scan = loader.scan();

    for def in &scan.definitions {
        println!("{}", def.id());
    }
    if args.skipped {
        for skipped in &scan.skipped {
            eprintln!("skipped {}: {:?}", skipped.id, skipped.reason);
        }
    }
    eprintln!(
        "{} qualifying, {} skipped",
        scan.definitions.len(),
        scan.skipped.len()
    );
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.suite)?;
    if let Some(out) = args.out {
        cfg.output_root = out;
    }
    if let Some(format) = args.format {
        cfg.image_format = match format {
            FormatChoice::Png => snapsuite::OutputFormat::Png,
            FormatChoice::Bmp => snapsuite::OutputFormat::Bmp,
        };
    }

    let loader = cfg.build_loader()?;
    let persister = cfg.build_persister();
    let run = snapsuite::RenderTestRun::new(
        loader,
        snapsuite::BackgroundRenderer::engine(),
        persister,
    )
    .on_complete(|outcome| tracing::info!(%outcome, "render tests done"));

    let report = run.start()?.join()?;

    for failed in &report.failed {
        eprintln!("failed {}: {}", failed.id, failed.message);
    }
    eprintln!(
        "{}: {} rendered, {} failed, {} written to {}",
        report.outcome,
        report.rendered.len(),
        report.failed.len(),
        report.written.len(),
        cfg.output_root.display()
    );

    if let snapsuite::RunOutcome::PersistFailed(msg) = &report.outcome {
        anyhow::bail!("writing results failed: {msg}");
    }
    if !report.failed.is_empty() {
        anyhow::bail!(
            "{} of {} tests failed to render",
            report.failed.len(),
            report.qualifying.len()
        );
    }
    Ok(())
}
