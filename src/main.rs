use anyhow::Result;
use clap::Parser;
use secrat::commands::{self, ConnectionArgs, ResourceKind};

/// secrat - SecurityRAT API client
///
/// Logs in to a SecurityRAT instance and reads or deletes its entries.
/// Results are printed as JSON.
///
/// Credentials can be given as flags or via SECRAT_API_URL, SECRAT_USER and
/// SECRAT_PASSWORD. Other defaults can be stored with `secrat configure`.
///
/// Examples:
///   secrat list tag-instances --active-only
///   secrat get requirement-skeletons 4 5 6
#[derive(Parser, Debug)]
#[command(author, version = env!("SECRAT_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Check that the credentials are accepted
    Login,

    /// Save the given connection flags to the settings file
    Configure,

    /// List all entries of a collection
    List(ListArgs),

    /// Fetch entries by id
    Get(GetArgs),

    /// Delete an entry
    Delete(DeleteArgs),

    /// Find requirement skeletons assigned to any of the given project types
    FindSkeletons(FindSkeletonsArgs),

    /// Find optional column contents
    FindContents(FindContentsArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[arg(value_enum)]
    pub resource: ResourceKind,

    /// Drop entries that are, or reference, deactivated objects
    #[arg(long = "active-only")]
    pub active_only: bool,

    /// Print an object keyed by id instead of a list
    #[arg(long = "by-id")]
    pub by_id: bool,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    #[arg(value_enum)]
    pub resource: ResourceKind,

    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<u64>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    #[arg(value_enum)]
    pub resource: ResourceKind,

    #[arg(value_name = "ID")]
    pub id: u64,
}

#[derive(clap::Args, Debug)]
pub struct FindSkeletonsArgs {
    #[arg(long = "project-type", value_name = "ID", required = true)]
    pub project_types: Vec<u64>,
}

#[derive(clap::Args, Debug)]
pub struct FindContentsArgs {
    /// Only contents of this requirement skeleton
    #[arg(long, value_name = "ID")]
    pub skeleton: Option<u64>,

    /// Only contents of this optional column
    #[arg(long, value_name = "ID")]
    pub column: Option<u64>,

    /// Only contents containing this text
    #[arg(long, value_name = "TEXT", conflicts_with = "regex")]
    pub contains: Option<String>,

    /// Only contents matching this regular expression
    #[arg(long, value_name = "PATTERN")]
    pub regex: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let connection = &cli.connection;

    match cli.command {
        Commands::Login => commands::login(connection).await?,
        Commands::Configure => commands::configure(connection)?,
        Commands::List(args) => {
            commands::list(connection, args.resource, args.active_only, args.by_id).await?
        }
        Commands::Get(args) => commands::get(connection, args.resource, &args.ids).await?,
        Commands::Delete(args) => commands::delete(connection, args.resource, args.id).await?,
        Commands::FindSkeletons(args) => {
            commands::find_skeletons(connection, &args.project_types).await?
        }
        Commands::FindContents(args) => {
            commands::find_contents(connection, args.skeleton, args.column, args.contains, args.regex)
                .await?
        }
    }
    Ok(())
}
