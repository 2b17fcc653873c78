use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use vcsclient::{
    ClientBuilder, Config, VcsClient,
    config::ConnectionArgs,
    logging::{init_logging, resolve_log_config},
};

#[derive(Parser, Debug)]
#[command(
    author,
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    about = "Uniform command-line client for VCS hosting providers",
    long_about = "Run repository, branch and pull request operations against a VCS hosting provider.\n\n\
        Configuration can be provided via CLI arguments, environment variables (VCSCLIENT_*),\n\
        or the config file (~/.config/vcsclient/config.toml). Results are printed as JSON.",
    after_help = "EXAMPLES:\n    \
        # Verify credentials\n    \
        vcsclient --api-endpoint https://dev.azure.com/myorg/ --project proj test-connection\n\n    \
        # List open pull requests\n    \
        vcsclient list-prs my-repo\n\n    \
        # Download the main branch into ./checkout\n    \
        vcsclient download my-repo main ./checkout\n\n    \
        # Create sample config file\n    \
        vcsclient --create-config"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Owner of the repository, for providers that scope repositories by owner
    #[arg(long, global = true, default_value = "", help_heading = "Connection")]
    owner: String,

    /// Create a sample configuration file at ~/.config/vcsclient/config.toml
    #[arg(long)]
    create_config: bool,

    /// Log level (trace, debug, info, warn, error); logging is off when unset
    #[arg(long, global = true, help_heading = "Logging")]
    log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, help_heading = "Logging")]
    log_file: Option<PathBuf>,

    /// Log format (text or json)
    #[arg(long, global = true, help_heading = "Logging")]
    log_format: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify credentials and connectivity
    TestConnection,
    /// List repositories of the configured project
    ListRepos,
    /// List branches of a repository
    ListBranches { repository: String },
    /// Download a branch snapshot into an existing directory
    Download {
        repository: String,
        branch: String,
        destination: PathBuf,
    },
    /// Open a pull request
    CreatePr {
        repository: String,
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Add a comment to a pull request
    Comment {
        repository: String,
        pull_request_id: i64,
        content: String,
    },
    /// List comments of a pull request, oldest first
    ListComments {
        repository: String,
        pull_request_id: i64,
    },
    /// List open pull requests of a repository
    ListPrs { repository: String },
    /// Show the latest commit of a branch
    LatestCommit { repository: String, branch: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(
    client: &dyn VcsClient,
    cancel: &CancellationToken,
    owner: &str,
    command: Command,
) -> Result<()> {
    match command {
        Command::TestConnection => {
            client.test_connection(cancel).await?;
            print_json(&serde_json::json!({ "connected": true }))
        }
        Command::ListRepos => print_json(&client.list_repositories(cancel).await?),
        Command::ListBranches { repository } => {
            print_json(&client.list_branches(cancel, owner, &repository).await?)
        }
        Command::Download {
            repository,
            branch,
            destination,
        } => {
            client
                .download_repository(cancel, owner, &repository, &branch, &destination)
                .await?;
            print_json(&serde_json::json!({ "destination": destination }))
        }
        Command::CreatePr {
            repository,
            source,
            target,
            title,
            description,
        } => {
            client
                .create_pull_request(
                    cancel,
                    owner,
                    &repository,
                    &source,
                    &target,
                    &title,
                    &description,
                )
                .await?;
            print_json(&serde_json::json!({ "created": true }))
        }
        Command::Comment {
            repository,
            pull_request_id,
            content,
        } => {
            client
                .add_pull_request_comment(cancel, owner, &repository, &content, pull_request_id)
                .await?;
            print_json(&serde_json::json!({ "commented": true }))
        }
        Command::ListComments {
            repository,
            pull_request_id,
        } => print_json(
            &client
                .list_pull_request_comments(cancel, owner, &repository, pull_request_id)
                .await?,
        ),
        Command::ListPrs { repository } => {
            print_json(&client.list_open_pull_requests(cancel, owner, &repository).await?)
        }
        Command::LatestCommit { repository, branch } => {
            print_json(&client.get_latest_commit(cancel, owner, &repository, &branch).await?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(resolve_log_config(
        args.log_level.as_deref(),
        args.log_file.clone(),
        args.log_format.as_deref(),
    ));

    if args.create_config {
        let path = Config::create_sample_config()?;
        println!("Sample config available at: {}", path.display());
        return Ok(());
    }

    let Some(command) = args.command else {
        anyhow::bail!("no command given, see --help");
    };

    let (provider, info) = Config::load(&args.connection)?.resolve()?;
    let mut builder = ClientBuilder::new(provider)
        .api_endpoint(info.api_endpoint)
        .secret_token(info.token)
        .project(info.project);
    if let Some(username) = info.username {
        builder = builder.username(username);
    }
    let client = builder
        .build()
        .with_context(|| format!("failed to create {provider} client"))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    run(client.as_ref(), &cancel, &args.owner, command).await
}
