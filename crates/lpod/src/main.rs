//! lpod — the livepatch operator adapter binary.
//!
//! # Usage
//!
//! ```text
//! lpod --data-dir /var/lib/lpo --config options.toml --leader event config-changed
//! lpod event relation-changed --channel standard --data username=u --data password=p \
//!     --data endpoints=db:5432
//! lpod action get-resource-token --param contract-token=<token>
//! lpod status
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use lpo_actions::schema::DEFAULT_SCHEMA_TOOL;
use lpo_actions::{Action, SchemaTool};
use lpo_core::ConfigOptions;
use lpo_relations::Channel;
use lpo_state::{Leadership, StateStore};
use lpod::admin::LocalAdmin;
use lpod::{ContractsFactory, Event, LocalWorkload, Operator};

const DEFAULT_LOG_FILTER: &str = "info,lpod=debug,lpo=debug";

#[derive(Parser)]
#[command(name = "lpod", about = "Livepatch operator")]
struct Cli {
    /// Directory holding the state store.
    #[arg(long, default_value = "/var/lib/lpo")]
    data_dir: PathBuf,

    /// Root directory standing in for the workload container.
    #[arg(long, default_value = "/")]
    workload_root: PathBuf,

    /// Schema tool binary inside the admin container.
    #[arg(long, default_value = DEFAULT_SCHEMA_TOOL)]
    schema_tool: PathBuf,

    /// Whether this replica holds leadership.
    #[arg(long)]
    leader: bool,

    /// TOML option document. Absent options take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelArg {
    Legacy,
    Standard,
}

impl From<ChannelArg> for Channel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Legacy => Channel::Legacy,
            ChannelArg::Standard => Channel::Standard,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Handle a lifecycle event.
    Event {
        name: String,

        /// Relation channel, for relation events.
        #[arg(long, value_enum)]
        channel: Option<ChannelArg>,

        /// Relation data as key=value, repeatable.
        #[arg(long = "data", value_parser = parse_key_value)]
        data: Vec<(String, String)>,
    },
    /// Run an action.
    Action {
        name: String,

        /// Action parameter as key=value, repeatable.
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Print the last recorded unit status.
    Status,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    std::fs::create_dir_all(&cli.data_dir)
        .with_context(|| format!("creating data dir {}", cli.data_dir.display()))?;
    let db_path = cli.data_dir.join("lpo.redb");
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    let options = match &cli.config {
        Some(path) => ConfigOptions::from_file(path)?,
        None => ConfigOptions::default(),
    };

    let operator = Operator::new(
        store,
        options,
        Leadership::from_flag(cli.leader),
        LocalWorkload::new(&cli.workload_root),
        LocalAdmin::new(&cli.schema_tool),
        ContractsFactory::default(),
    )
    .with_schema_tool(SchemaTool::new(cli.schema_tool.to_string_lossy()));

    match cli.command {
        Command::Event { name, channel, data } => {
            let data = data.into_iter().collect();
            let event = Event::parse(&name, channel.map(Channel::from), data)?;
            let status = operator.handle(&event).await?;
            println!("{}", serde_json::to_string(&status)?);
        }
        Command::Action { name, params } => {
            let params: BTreeMap<String, String> = params.into_iter().collect();
            let action = Action::parse(&name, &params)?;
            let outcome = operator.run_action(&action).await;
            println!("{}", serde_json::to_string(&outcome.to_json())?);
            if let Some(failure) = outcome.failure {
                anyhow::bail!("action {name} failed: {failure}");
            }
        }
        Command::Status => match operator.status()? {
            Some(status) => println!("{}", serde_json::to_string(&status)?),
            None => println!("null"),
        },
    }
    Ok(())
}
