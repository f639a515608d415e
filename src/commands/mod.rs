use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use futures_util::future::try_join_all;
use log::{debug, info};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use crate::{
    client::{ContentFilter, SecurityRatClient},
    config::{ConnectorConfig, Credentials},
    entries::EntryList,
    http::RetryPolicy,
    model::*,
    settings::Settings,
};

/// Connection options shared by every subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// SecurityRAT API base URL, e.g. https://rat.example.com/api
    #[arg(long = "api-url", env = "SECRAT_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Account name used to log in
    #[arg(long, short = 'u', env = "SECRAT_USER", global = true)]
    pub user: Option<String>,

    /// Account password
    #[arg(long, env = "SECRAT_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Do not verify TLS certificates
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Do not cache list responses
    #[arg(long = "no-cache", global = true)]
    pub no_cache: bool,

    /// Retries after a failed attempt for transient errors
    #[arg(long = "max-retries", value_name = "N", global = true)]
    pub max_retries: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Settings file (defaults to <config dir>/secrat/config.json)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

/// API collections reachable from the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    CollectionCategories,
    CollectionInstances,
    TagCategories,
    TagInstances,
    RequirementCategories,
    RequirementSkeletons,
    OptColumnTypes,
    OptColumns,
    OptColumnContents,
    ProjectTypes,
    StatusColumns,
    StatusColumnValues,
    AlternativeSets,
    AlternativeInstances,
}

impl ResourceKind {
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::CollectionCategories => CollectionCategory::PATH,
            ResourceKind::CollectionInstances => CollectionInstance::PATH,
            ResourceKind::TagCategories => TagCategory::PATH,
            ResourceKind::TagInstances => TagInstance::PATH,
            ResourceKind::RequirementCategories => RequirementCategory::PATH,
            ResourceKind::RequirementSkeletons => RequirementSkeleton::PATH,
            ResourceKind::OptColumnTypes => OptColumnType::PATH,
            ResourceKind::OptColumns => OptColumn::PATH,
            ResourceKind::OptColumnContents => OptColumnContent::PATH,
            ResourceKind::ProjectTypes => ProjectType::PATH,
            ResourceKind::StatusColumns => StatusColumn::PATH,
            ResourceKind::StatusColumnValues => StatusColumnValue::PATH,
            ResourceKind::AlternativeSets => AlternativeSet::PATH,
            ResourceKind::AlternativeInstances => AlternativeInstance::PATH,
        }
    }
}

/// Merges flags, environment and settings file into a client configuration.
pub fn resolve(args: &ConnectionArgs, settings: &Settings) -> Result<(ConnectorConfig, Credentials)> {
    let Some(api_url) = args.api_url.as_deref().or(settings.api_url.as_deref()) else {
        bail!("No API URL given. Use --api-url, SECRAT_API_URL or the settings file.");
    };
    let Some(user) = args.user.as_deref().or(settings.user.as_deref()) else {
        bail!("No user given. Use --user, SECRAT_USER or the settings file.");
    };
    let Some(password) = args.password.as_deref() else {
        bail!("No password given. Use --password or SECRAT_PASSWORD.");
    };

    let max_retries = args
        .max_retries
        .or(settings.max_retries)
        .unwrap_or(crate::http::DEFAULT_MAX_RETRIES);

    let mut config = ConnectorConfig::new(api_url)?
        .with_verify_certificates(!args.insecure && settings.verify_certificates.unwrap_or(true))
        .with_cache(!args.no_cache && settings.cache.unwrap_or(true))
        .with_retry(RetryPolicy::default().with_max_retries(max_retries));

    if let Some(secs) = args.timeout.or(settings.timeout_secs) {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = settings.cache_ttl_secs {
        config = config.with_cache_ttl(Duration::from_secs(secs));
    }

    Ok((config, Credentials::new(user, password)))
}

/// Builds a client and logs in.
pub async fn connect(args: &ConnectionArgs) -> Result<SecurityRatClient> {
    let settings = Settings::load(args.config.as_deref())?;
    let (config, credentials) = resolve(args, &settings)?;

    debug!("Connecting to {}", config.api_url);
    let client = SecurityRatClient::new(config)?;
    client
        .authenticate(&credentials)
        .await
        .with_context(|| format!("Failed to log in as {}", credentials.username()))?;

    Ok(client)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tracing::instrument(skip(args))]
pub async fn login(args: &ConnectionArgs) -> Result<()> {
    let client = connect(args).await?;
    println!("Logged in to {}", client.config().api_url);
    Ok(())
}

/// Writes the connection flags given on the command line to the settings file.
#[tracing::instrument(skip(args))]
pub fn configure(args: &ConnectionArgs) -> Result<()> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Settings::default_path().context("Cannot determine the config directory")?,
    };

    let mut settings = if path.exists() {
        Settings::load(Some(&path))?
    } else {
        Settings::default()
    };

    if let Some(api_url) = &args.api_url {
        ConnectorConfig::new(api_url)?;
        settings.api_url = Some(api_url.clone());
    }
    if let Some(user) = &args.user {
        settings.user = Some(user.clone());
    }
    if args.insecure {
        settings.verify_certificates = Some(false);
    }
    if args.no_cache {
        settings.cache = Some(false);
    }
    if let Some(n) = args.max_retries {
        settings.max_retries = Some(n);
    }
    if let Some(secs) = args.timeout {
        settings.timeout_secs = Some(secs);
    }

    settings.save(&path)?;
    info!("Saved settings to {:?}", path);
    println!("Settings written to {}", path.display());
    Ok(())
}

#[tracing::instrument(skip(args))]
pub async fn list(
    args: &ConnectionArgs,
    resource: ResourceKind,
    active_only: bool,
    by_id: bool,
) -> Result<()> {
    let client = connect(args).await?;
    let output = list_entries(&client, resource, active_only, by_id).await?;
    print_json(&output)
}

async fn list_entries(
    client: &SecurityRatClient,
    resource: ResourceKind,
    active_only: bool,
    by_id: bool,
) -> Result<Value> {
    let value = client
        .get_cached_value(resource.path())
        .await
        .with_context(|| format!("Failed to list {}", resource.path()))?;

    let mut entries = EntryList::from_value(value)?;
    if active_only {
        entries = entries.remove_deactivated();
    }

    if by_id {
        Ok(Value::Object(entries.into_id_map()?))
    } else {
        Ok(Value::Array(entries.into_inner()))
    }
}

#[tracing::instrument(skip(args))]
pub async fn get(args: &ConnectionArgs, resource: ResourceKind, ids: &[u64]) -> Result<()> {
    let client = connect(args).await?;
    let output = get_entries(&client, resource, ids).await?;
    print_json(&output)
}

async fn get_entries(client: &SecurityRatClient, resource: ResourceKind, ids: &[u64]) -> Result<Value> {
    let endpoints: Vec<String> = ids
        .iter()
        .map(|id| format!("{}/{}", resource.path(), id))
        .collect();

    let mut values = try_join_all(endpoints.iter().map(|endpoint| async move {
        client
            .get_value(endpoint)
            .await
            .with_context(|| format!("Failed to fetch {}", endpoint))
    }))
    .await?;

    if values.len() == 1 {
        Ok(values.remove(0))
    } else {
        Ok(Value::Array(values))
    }
}

#[tracing::instrument(skip(args))]
pub async fn delete(args: &ConnectionArgs, resource: ResourceKind, id: u64) -> Result<()> {
    let client = connect(args).await?;
    let endpoint = format!("{}/{}", resource.path(), id);
    client
        .delete(&endpoint)
        .await
        .with_context(|| format!("Failed to delete {}", endpoint))?;
    println!("Deleted {}", endpoint);
    Ok(())
}

#[tracing::instrument(skip(args))]
pub async fn find_skeletons(args: &ConnectionArgs, project_types: &[u64]) -> Result<()> {
    let client = connect(args).await?;
    let found = client
        .find_requirement_skeletons_with_project_types(project_types)
        .await
        .context("Failed to search requirement skeletons")?;
    print_json(&serde_json::to_value(found)?)
}

#[tracing::instrument(skip(args))]
pub async fn find_contents(
    args: &ConnectionArgs,
    skeleton: Option<u64>,
    column: Option<u64>,
    contains: Option<String>,
    regex: Option<String>,
) -> Result<()> {
    let filter = content_filter(skeleton, column, contains, regex)?;
    let client = connect(args).await?;
    let found = client
        .find_opt_column_contents(&filter)
        .await
        .context("Failed to search optional column contents")?;
    print_json(&serde_json::to_value(found)?)
}

fn content_filter(
    skeleton: Option<u64>,
    column: Option<u64>,
    contains: Option<String>,
    regex: Option<String>,
) -> Result<ContentFilter> {
    let mut filter = ContentFilter::new();
    if let Some(id) = skeleton {
        filter = filter.with_requirement_skeleton(id);
    }
    if let Some(id) = column {
        filter = filter.with_opt_column(id);
    }
    match (contains, regex) {
        (Some(_), Some(_)) => bail!("--contains and --regex cannot be combined"),
        (Some(needle), None) => filter = filter.containing(needle),
        (None, Some(pattern)) => filter = filter.matching(&pattern)?,
        (None, None) => {}
    }
    Ok(filter)
}
