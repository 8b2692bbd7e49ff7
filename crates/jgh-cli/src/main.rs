mod cmd;
mod output;
mod prompt;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use cmd::Ctx;

#[derive(Parser)]
#[command(
    name = "jgh",
    about = "Create, update, list and time-track issues across Jira and GitHub",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ~/.config/jgh/config.yaml)
    #[arg(long, global = true, env = "JGH_CONFIG")]
    config: Option<PathBuf>,

    /// GitHub repository as OWNER/NAME (default: the current directory's repo)
    #[arg(long, global = true, env = "JGH_REPO")]
    repo: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListScope {
    /// Only issues assigned to you
    Mine,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Jira credentials, project and Tempo token
    Setup,

    /// Fix missing or invalid settings and refresh the Jira account id
    Reconfigure,

    /// Create a Jira issue and a linked GitHub issue
    Create {
        /// Title, with optional tokens: @me +label (Status) !priority
        #[arg(allow_hyphen_values = true)]
        title: String,

        /// Issue description
        #[arg(short, long)]
        description: Option<String>,

        /// Jira issue type (default: the configured one)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        issue_type: Option<String>,

        /// Assign both issues to yourself
        #[arg(short, long)]
        assign_me: bool,

        /// Comma-separated labels; replaces any +label in the title
        #[arg(short, long)]
        labels: Option<String>,

        /// Transition the Jira issue after creating it
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Update a Jira issue and its linked GitHub issue
    Update {
        /// Jira key, e.g. PROJ-42
        key: String,

        /// Tokens: (Status) !priority +label -label @me @unassign
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true, trailing_var_arg = true)]
        update: Vec<String>,
    },

    /// List open issues and where they live
    List {
        #[arg(value_enum)]
        scope: Option<ListScope>,
    },

    /// Show one issue with its GitHub twin and time tracking
    Details { key: String },

    /// Log work to Tempo
    Time {
        key: String,

        /// e.g. 30min, 2h, 1.5h, 1h 30min
        duration: String,

        /// Worklog description (default: "Work on KEY")
        #[arg(short, long)]
        description: Option<String>,

        /// Day the work happened, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Set the original estimate on a Jira issue
    Estimate { key: String, duration: String },

    /// Show the current configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Ctx {
        config: cli.config,
        repo: cli.repo,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Setup => cmd::setup::run(&ctx),
        Commands::Reconfigure => cmd::reconfigure::run(&ctx),
        Commands::Create {
            title,
            description,
            issue_type,
            assign_me,
            labels,
            status,
        } => cmd::create::run(
            &ctx,
            jgh_core::create::CreateRequest {
                title,
                description,
                issue_type,
                assign_me,
                labels,
                status,
            },
        ),
        Commands::Update { key, update } => cmd::update::run(&ctx, &key, &update.join(" ")),
        Commands::List { scope } => cmd::list::run(&ctx, matches!(scope, Some(ListScope::Mine))),
        Commands::Details { key } => cmd::details::run(&ctx, &key),
        Commands::Time {
            key,
            duration,
            description,
            date,
        } => cmd::time::run(
            &ctx,
            jgh_core::timelog::TimeRequest {
                key,
                duration,
                description,
                date,
            },
        ),
        Commands::Estimate { key, duration } => cmd::estimate::run(&ctx, &key, &duration),
        Commands::Config => cmd::config::run(&ctx),
    };

    if let Err(e) = result {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}
