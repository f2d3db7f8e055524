mod api_types;
mod budget;
mod export;
mod fetch;
mod llm;
mod models;
mod orchestrator;
mod prompts;
mod render;
mod repl;
mod session;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use awful_aj::{config, template};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use budget::{SizeBasis, MAX_CONTEXT_LENGTH};
use fetch::{ApifyClient, DEFAULT_BASE_URL, DEFAULT_RESULTS_LIMIT};
use llm::AwfulJadeLlm;
use models::SessionState;
use repl::{run_session, DEFAULT_PROFILE_URL};
use session::{Action, Controller, Reply, Settings};

/// Solar Writer - new Facebook posts in your own voice
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Output directory for downloaded posts (default: "out")
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// Path to config file (overrides AJ_CONFIG environment variable)
    #[arg(short, long)]
    config: Option<String>,

    /// Apify API token
    #[arg(long, env = "APIFY_TOKEN", hide_env_values = true)]
    apify_token: String,

    /// Apify API base URL
    #[arg(long, env = "APIFY_BASE_URL", default_value = DEFAULT_BASE_URL)]
    apify_base_url: String,

    /// Maximum number of posts to scrape
    #[arg(long, default_value_t = DEFAULT_RESULTS_LIMIT)]
    results_limit: usize,

    /// Context budget, in characters
    #[arg(long, default_value_t = MAX_CONTEXT_LENGTH)]
    max_context: usize,

    /// Measure the context budget against the appended text instead of each
    /// post's JSON form
    #[arg(long)]
    strict_budget: bool,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Interactive session (default)
    Session,
    /// Fetch, generate and save a post in one go
    Write {
        /// Facebook profile to learn from
        #[arg(long, default_value = DEFAULT_PROFILE_URL)]
        url: String,
        /// Use this subject instead of asking the model for one
        #[arg(long)]
        subject: Option<String>,
    },
}

/// Where the awful_aj config file and chat templates live.
#[derive(Debug, PartialEq)]
struct AjPaths {
    config: PathBuf,
    templates: PathBuf,
}

impl AjPaths {
    /// `AJ_CONFIG` and `AJ_TEMPLATE_DIR` win outright. Whatever they leave
    /// open is taken from `AJ_CONFIG_DIR`, or from `default_base` when that is
    /// unset too.
    fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        default_base: impl FnOnce() -> Result<PathBuf>,
    ) -> Result<Self> {
        let config = lookup("AJ_CONFIG").map(PathBuf::from);
        let templates = lookup("AJ_TEMPLATE_DIR").map(PathBuf::from);
        if let (Some(config), Some(templates)) = (&config, &templates) {
            return Ok(AjPaths {
                config: config.clone(),
                templates: templates.clone(),
            });
        }

        let base = match lookup("AJ_CONFIG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_base()?,
        };
        Ok(AjPaths {
            config: config.unwrap_or_else(|| base.join("config.yaml")),
            templates: templates.unwrap_or_else(|| base.join("templates")),
        })
    }
}

async fn load_llm(config_arg: Option<&str>) -> Result<AwfulJadeLlm> {
    let paths = AjPaths::resolve(
        |key| std::env::var(key).ok(),
        || awful_aj::config_dir().map_err(|e| anyhow::anyhow!(e.to_string())),
    )?;
    // awful_aj's template loader only looks at the environment
    if std::env::var_os("AJ_TEMPLATE_DIR").is_none() {
        std::env::set_var("AJ_TEMPLATE_DIR", &paths.templates);
    }

    let cfg_path = match config_arg {
        Some(p) => {
            debug!("Using config file from --config argument: {}", p);
            PathBuf::from(p)
        }
        None => {
            debug!("Using config file from environment/default: {}", paths.config.display());
            paths.config
        }
    };

    // Friendlier error if missing
    if !cfg_path.exists() {
        return Err(anyhow::anyhow!(
            "awful_aj config not found at {}\n\
             Use --config to specify a config file, or set AJ_CONFIG environment variable.\n\
             Example config.yaml:\n\
             api_key: \"YOUR_UPSTAGE_KEY\"\napi_base: \"https://api.upstage.ai/v1\"\nmodel: \"solar-pro\"\n",
            cfg_path.display()
        ));
    }

    let cfg = config::load_config(
        cfg_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("invalid config path"))?,
    )
    .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let tpl_name = std::env::var("AJ_TEMPLATE_WRITER").unwrap_or_else(|_| "solar_writer".to_string());
    debug!("Loading template {} from {}", tpl_name, paths.templates.display());
    let tpl = template::load_template(&tpl_name)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .with_context(|| format!("loading template {}", tpl_name))?;

    Ok(AwfulJadeLlm::new(cfg, tpl))
}

async fn write_once(ctl: &Controller<'_>, url: String, subject: Option<String>, output_dir: &Path) -> Result<()> {
    let mut state = SessionState::default();
    ctl.dispatch(&mut state, Action::Fetch { url }).await?;

    match subject {
        Some(s) => ctl.dispatch(&mut state, Action::EditSubject(s)).await?,
        None => ctl.dispatch(&mut state, Action::GenerateSubject).await?,
    };
    info!("Subject - {}", state.suggested_subject);

    ctl.dispatch(&mut state, Action::GeneratePost).await?;
    if let Reply::Download(export) = ctl.dispatch(&mut state, Action::Download).await? {
        let path = export.write_to(output_dir)?;
        info!("Post saved - path={}, bytes={}", path.display(), export.data.len());
    }
    println!("{}", state.new_post);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    info!("Starting solar_writer");

    let llm = load_llm(args.config.as_deref()).await?;
    let apify = ApifyClient::new(&args.apify_base_url, &args.apify_token)?;
    let settings = Settings {
        results_limit: args.results_limit,
        max_context: args.max_context,
        basis: if args.strict_budget {
            SizeBasis::Appended
        } else {
            SizeBasis::Serialized
        },
    };
    debug!("Settings - {:?}", settings);
    let ctl = Controller::new(&apify, &llm, settings);

    match args.command.unwrap_or(Mode::Session) {
        Mode::Session => run_session(&ctl, &args.output_dir).await,
        Mode::Write { url, subject } => write_once(&ctl, url, subject, &args.output_dir).await,
    }
}
