use crate::app_error::AppError;
use crate::build_log::{BuildLog, DirStore};
use crate::config::{self, Config, PagingSettings};
use crate::model::{BuildNumber, BuildResult, JobId, NewBuild, now_millis};
use crate::output::{self, JobRow};
use crate::paging::{Order, Page, resolve};
use crate::range::NumberRange;
use crate::retention;
use crate::summary::BuildSummary;
use crate::version;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Generator, generate};
use log::debug;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_TEMPLATE: &str = r#"version: 1

store:
  root: ".buildpager"   # one directory per job, one JSON file per build

paging:
  default_size: 10      # builds per page when --size is absent
  # max_size: 100       # cap on --size for served pages, unset = no cap
  order: newest_first   # newest_first | oldest_first
  growth: doubling      # doubling | fixed (how far gaps are searched per step)
  # max_window: 1024    # widest search window for doubling
  # batch: 0            # window width for fixed growth, 0 = the page deficit

retention:
  keep: 0               # newest builds kept by 'prune', 0 = unlimited
  # max_age: "30d"
"#;

#[derive(Debug, Parser)]
#[command(
    name = "buildpager",
    version = version::VALUE,
    about = "Paginated, gap-tolerant views over a job's build history",
    styles = clap_styles()
)]
struct Cli {
    #[arg(long = "no-color", global = true)]
    no_color: bool,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Init(InitArgs),
    Page(PageArgs),
    Resolve(ResolveArgs),
    Record(RecordArgs),
    Finish(FinishArgs),
    Delete(DeleteArgs),
    Prune(PruneArgs),
    Jobs(JsonArgs),
    Validate(JsonArgs),
    Version,
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
struct InitArgs {
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Args)]
struct PageArgs {
    job: String,
    #[arg(long, allow_negative_numbers = true)]
    start: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    size: Option<i64>,
    #[arg(long, value_enum)]
    order: Option<OrderArg>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ResolveArgs {
    job: String,
    range: String,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct RecordArgs {
    job: String,
    #[arg(long)]
    result: Option<String>,
    #[arg(long, conflicts_with = "result")]
    running: bool,
    #[arg(long, allow_negative_numbers = true)]
    duration: Option<i64>,
    #[arg(long = "start-time")]
    start_time: Option<i64>,
    #[arg(long = "queue-time")]
    queue_time: Option<i64>,
    #[arg(long, default_value = "")]
    node: String,
    #[arg(long = "display-name")]
    display_name: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct FinishArgs {
    job: String,
    number: BuildNumber,
    #[arg(long)]
    result: String,
    #[arg(long, allow_negative_numbers = true)]
    duration: Option<i64>,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    job: String,
    number: BuildNumber,
}

#[derive(Debug, Args)]
struct PruneArgs {
    job: String,
    #[arg(long)]
    keep: Option<usize>,
    #[arg(long = "max-age")]
    max_age: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct JsonArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct CompletionArgs {
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    NewestFirst,
    OldestFirst,
}

impl From<OrderArg> for Order {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::NewestFirst => Order::NewestFirst,
            OrderArg::OldestFirst => Order::OldestFirst,
        }
    }
}

fn clap_styles() -> Styles {
    Styles::plain()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Cyan.on_default())
        .context(AnsiColor::White.on_default())
        .context_value(AnsiColor::Cyan.on_default())
}

/// Configuration and store shared by every command that touches builds.
struct Context {
    config: Config,
    store: DirStore,
}

impl Context {
    fn load(config_flag: Option<&Path>, store_flag: Option<&Path>) -> Result<Self, AppError> {
        let config = match config_flag {
            Some(path) => load_config_classified(path)?,
            None => {
                let path = Path::new(config::DEFAULT_PATH);
                if path.exists() {
                    load_config_classified(path)?
                } else {
                    Config::default()
                }
            }
        };

        let root = store_flag
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.store_root());
        debug!("using build store at {}", root.display());

        Ok(Self {
            config,
            store: DirStore::new(root),
        })
    }

    fn paging(&self) -> Result<PagingSettings, AppError> {
        self.config.resolve_paging().map_err(AppError::usage)
    }
}

pub fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    output::configure(cli.no_color);

    let config_flag = cli.config.as_deref();
    let store_flag = cli.store.as_deref();

    match cli.command {
        Commands::Init(args) => run_init(args, config_flag),
        Commands::Page(args) => run_page(args, Context::load(config_flag, store_flag)?),
        Commands::Resolve(args) => run_resolve(args, Context::load(config_flag, store_flag)?),
        Commands::Record(args) => run_record(args, Context::load(config_flag, store_flag)?),
        Commands::Finish(args) => run_finish(args, Context::load(config_flag, store_flag)?),
        Commands::Delete(args) => run_delete(args, Context::load(config_flag, store_flag)?),
        Commands::Prune(args) => run_prune(args, Context::load(config_flag, store_flag)?),
        Commands::Jobs(args) => run_jobs(args, Context::load(config_flag, store_flag)?),
        Commands::Validate(args) => run_validate(args, config_flag),
        Commands::Version => {
            println!("{}", version::VALUE);
            Ok(())
        }
        Commands::Completion(args) => run_completion(args),
    }
}

fn run_init(args: InitArgs, config_flag: Option<&Path>) -> Result<(), AppError> {
    let config_path = config_flag
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_PATH));

    if config_path.exists() && !args.force {
        return Err(AppError::usage(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )));
    }

    fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)
        .map_err(|e| AppError::internal(format!("write {}: {e}", config_path.display())))?;

    println!(
        "created {}",
        output::command(&config_path.display().to_string())
    );
    Ok(())
}

fn run_page(args: PageArgs, ctx: Context) -> Result<(), AppError> {
    let job = JobId::new(args.job)?;
    let mut paging = ctx.paging()?;
    if let Some(order) = args.order {
        paging.order = order.into();
    }

    let request = paging.capped_request(args.start, args.size);
    let page = paging.paginator().page(&ctx.store, &job, &request)?;

    if args.json {
        return write_json(&page, "page");
    }

    output::print_page(io::stdout().lock(), &page)
        .map_err(|e| AppError::internal(format!("print page: {e}")))
}

fn run_resolve(args: ResolveArgs, ctx: Context) -> Result<(), AppError> {
    #[derive(Serialize)]
    struct ResolveOutput {
        requested: String,
        resolved: String,
        #[serde(flatten)]
        page: Page,
    }

    let job = JobId::new(args.job)?;
    let range: NumberRange = args
        .range
        .parse()
        .map_err(|e| AppError::usage(format!("range {:?}: {e}", args.range)))?;

    let records = resolve::resolve(&ctx.store, &job, &range, Order::NewestFirst)?;
    let resolved: NumberRange = records.iter().map(|record| record.number).collect();

    let now = now_millis();
    let page = Page::new(
        records
            .iter()
            .map(|record| BuildSummary::project(&job, record, now))
            .collect(),
    );

    if args.json {
        return write_json(
            &ResolveOutput {
                requested: range.to_string(),
                resolved: resolved.to_string(),
                page,
            },
            "resolve",
        );
    }

    println!(
        "resolved {} of {} requested builds: {}",
        output::number(&resolved.len().to_string()),
        output::number(&range.len().to_string()),
        output::command(&resolved.to_string())
    );
    output::print_page(io::stdout().lock(), &page)
        .map_err(|e| AppError::internal(format!("print page: {e}")))
}

fn run_record(args: RecordArgs, ctx: Context) -> Result<(), AppError> {
    let job = JobId::new(args.job)?;

    let result = if args.running {
        None
    } else {
        Some(parse_result(args.result.as_deref().unwrap_or("success"))?)
    };

    let duration = args.duration.unwrap_or(0);
    if duration < 0 {
        return Err(AppError::usage("--duration must be >= 0"));
    }

    let start_time = args.start_time.unwrap_or_else(now_millis);
    let queue_time = args.queue_time.unwrap_or(start_time);
    if queue_time > start_time {
        return Err(AppError::usage("--queue-time must not be after --start-time"));
    }

    let record = ctx.store.append(
        &job,
        NewBuild {
            display_name: args.display_name.unwrap_or_default(),
            result,
            start_time_millis: start_time,
            queue_time_millis: queue_time,
            duration_millis: if result.is_some() { duration } else { 0 },
            executor_label: args.node,
        },
    )?;

    if args.json {
        return write_json(&record, "record");
    }

    println!(
        "{} recorded {}",
        output::success("ok"),
        output::accent(&format!("{job} {}", record.display_name()))
    );
    Ok(())
}

fn run_finish(args: FinishArgs, ctx: Context) -> Result<(), AppError> {
    let job = JobId::new(args.job)?;
    let result = parse_result(&args.result)?;

    let Some(mut record) = ctx.store.get_by_number(&job, args.number)? else {
        return Err(AppError::usage(format!("{job} #{} not found", args.number)));
    };

    if !record.is_running() {
        return Err(AppError::usage(format!(
            "{job} #{} already finished",
            args.number
        )));
    }

    let duration = args
        .duration
        .unwrap_or_else(|| now_millis().saturating_sub(record.start_time_millis));
    if duration < 0 {
        return Err(AppError::usage("--duration must be >= 0"));
    }

    record.result = Some(result);
    record.duration_millis = duration;
    ctx.store.update(&job, &record)?;

    println!(
        "{} {} finished: {}",
        output::success("ok"),
        output::accent(&format!("{job} {}", record.display_name())),
        output::result_label(record.result)
    );
    Ok(())
}

fn run_delete(args: DeleteArgs, ctx: Context) -> Result<(), AppError> {
    let job = JobId::new(args.job)?;

    if !ctx.store.delete(&job, args.number)? {
        return Err(AppError::usage(format!("{job} #{} not found", args.number)));
    }

    println!("{} deleted {job} #{}", output::success("ok"), args.number);
    Ok(())
}

fn run_prune(args: PruneArgs, ctx: Context) -> Result<(), AppError> {
    let job = JobId::new(args.job)?;
    let mut policy = ctx
        .config
        .resolve_retention()
        .map_err(AppError::usage)?;

    if let Some(keep) = args.keep {
        policy.keep = (keep > 0).then_some(keep);
    }
    if let Some(max_age) = &args.max_age {
        let age = config::parse_duration(max_age)
            .map_err(|_| AppError::usage("--max-age must be a valid duration"))?;
        policy.max_age = Some(age);
    }

    if policy.is_unlimited() {
        return Err(AppError::usage(
            "no retention limits set (use --keep, --max-age, or retention in config)",
        ));
    }

    let removed = retention::prune(&ctx.store, &job, &policy, now_millis())?;

    if args.json {
        return write_json(&removed, "prune");
    }

    if removed.is_empty() {
        println!("{} nothing to prune for {job}", output::info("i"));
    } else {
        let range: NumberRange = removed.iter().copied().collect();
        println!(
            "{} pruned {} builds from {job}: {}",
            output::success("ok"),
            output::number(&removed.len().to_string()),
            output::command(&range.to_string())
        );
    }
    Ok(())
}

fn run_jobs(args: JsonArgs, ctx: Context) -> Result<(), AppError> {
    #[derive(Serialize)]
    struct JobJson {
        name: String,
        builds: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        latest: Option<BuildNumber>,
    }

    let mut items = Vec::new();
    for job in ctx.store.jobs()? {
        let numbers = ctx.store.numbers(&job)?;
        items.push(JobJson {
            name: job.to_string(),
            builds: numbers.len(),
            latest: numbers.last().copied(),
        });
    }

    if args.json {
        return write_json(&items, "jobs");
    }

    let rows: Vec<JobRow> = items
        .into_iter()
        .map(|item| JobRow {
            name: item.name,
            builds: item.builds,
            latest: item.latest,
        })
        .collect();

    output::print_jobs(io::stdout().lock(), &rows)
        .map_err(|e| AppError::internal(format!("print jobs: {e}")))
}

fn run_validate(args: JsonArgs, config_flag: Option<&Path>) -> Result<(), AppError> {
    #[derive(Serialize)]
    struct Issue<'a> {
        field: &'a str,
        message: &'a str,
    }

    #[derive(Serialize)]
    struct ValidateOutput<'a> {
        valid: bool,
        config: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        issues: Option<Vec<Issue<'a>>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<&'a str>,
    }

    let config_path = config_flag
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_PATH));
    let config_path_text = config_path.display().to_string();

    let cfg = match config::parse(&config_path) {
        Ok(cfg) => cfg,
        Err(err) => {
            if args.json {
                write_json(
                    &ValidateOutput {
                        valid: false,
                        config: &config_path_text,
                        issues: None,
                        error: Some(&err),
                    },
                    "validate",
                )?;
            }
            return Err(AppError::usage(err));
        }
    };

    match config::validate(&cfg) {
        Ok(()) => {
            if args.json {
                write_json(
                    &ValidateOutput {
                        valid: true,
                        config: &config_path_text,
                        issues: None,
                        error: None,
                    },
                    "validate",
                )?;
            } else {
                println!("valid {}", output::command(&config_path_text));
            }
            Ok(())
        }
        Err(err) => {
            if args.json {
                let issues: Vec<Issue<'_>> = err
                    .issues
                    .iter()
                    .map(|issue| Issue {
                        field: &issue.field,
                        message: &issue.message,
                    })
                    .collect();
                write_json(
                    &ValidateOutput {
                        valid: false,
                        config: &config_path_text,
                        issues: Some(issues),
                        error: Some(&err.to_string()),
                    },
                    "validate",
                )?;
            }
            Err(AppError::usage(err.to_string()))
        }
    }
}

fn load_config_classified(path: &Path) -> Result<Config, AppError> {
    if !path.exists() {
        return Err(AppError::usage(format!(
            "config file {} not found",
            output::command(&path.display().to_string())
        )));
    }

    config::load(path).map_err(|err| {
        if err.starts_with("read config:") {
            AppError::internal(err)
        } else {
            AppError::usage(err)
        }
    })
}

fn parse_result(text: &str) -> Result<BuildResult, AppError> {
    BuildResult::parse(text).ok_or_else(|| {
        AppError::usage(format!(
            "unknown result {text:?} (expected success, failure, unstable, aborted, or not_built)"
        ))
    })
}

fn write_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(|e| AppError::internal(format!("encode {what} json: {e}")))?;
    writeln!(stdout).map_err(|e| AppError::internal(format!("write output: {e}")))
}

fn run_completion(args: CompletionArgs) -> Result<(), AppError> {
    let mut cmd = Cli::command();
    let mut stdout = io::stdout().lock();

    match args.shell {
        Shell::Bash => generate_completion(clap_complete::shells::Bash, &mut cmd, &mut stdout),
        Shell::Zsh => generate_completion(clap_complete::shells::Zsh, &mut cmd, &mut stdout),
        Shell::Fish => generate_completion(clap_complete::shells::Fish, &mut cmd, &mut stdout),
        Shell::Powershell => {
            generate_completion(clap_complete::shells::PowerShell, &mut cmd, &mut stdout)
        }
    }
    .map_err(|e| AppError::internal(format!("generate completion: {e}")))
}

fn generate_completion<G: Generator>(
    generator: G,
    cmd: &mut clap::Command,
    writer: &mut impl Write,
) -> Result<(), io::Error> {
    generate(generator, cmd, "buildpager", writer);
    writer.flush()
}
