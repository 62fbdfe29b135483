use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use image_release_manager::config::{
    DEFAULT_EAP_FEED_URL, DEFAULT_MARKETPLACE_URL, DEFAULT_MAVEN_URL, DEFAULT_REGISTRY_URL,
    Endpoints, RegistryCredentials, ReleaseConfig, split_list,
};
use image_release_manager::docker::DockerEngine;
use image_release_manager::registry::DockerRegistry;
use image_release_manager::release::ReleaseManager;
use image_release_manager::retry::RetryPolicy;
use image_release_manager::version::Version;
use image_release_manager::version::sources::ProductSource;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "image-release-manager")]
#[command(version, about = "Build, test and publish container images for product releases")]
struct Cli {
    /// Build release versions that are not published yet
    #[arg(long)]
    create: bool,

    /// Rebuild and republish every release version in range
    #[arg(long)]
    update: bool,

    /// Build EAP versions that are not published yet
    #[arg(long)]
    create_eap: bool,

    /// Lowest release version to build (inclusive)
    #[arg(long, env = "START_VERSION")]
    start_version: String,

    /// Release versions from this one on are skipped
    #[arg(long, env = "END_VERSION")]
    end_version: Option<String>,

    /// Comma-separated repositories to push to
    #[arg(long, env = "DOCKER_REPOS")]
    docker_repos: String,

    /// Build argument that receives the product version
    #[arg(long, env = "DOCKERFILE_VERSION_ARG")]
    dockerfile_version_arg: String,

    /// Upstream product key
    #[arg(long, visible_alias = "mac-product-key", env = "PRODUCT_KEY")]
    product_key: String,

    #[arg(long, env = "CONCURRENT_BUILDS", default_value_t = 1)]
    concurrent_builds: usize,

    /// Publish untagged tags (`6.7.8`, `6.7`, `6`, `latest`)
    #[arg(long, env = "DEFAULT_RELEASE")]
    default_release: bool,

    /// Tag the newest EAP build as `eap`
    #[arg(long, env = "DEFAULT_EAP")]
    default_eap: bool,

    #[arg(long, env = "DOCKERFILE", default_value = "Dockerfile")]
    dockerfile: PathBuf,

    /// Build context directory
    #[arg(long, env = "BUILD_CONTEXT", default_value = ".")]
    context: PathBuf,

    /// Static build arguments, `KEY=value,KEY=value`
    #[arg(long, env = "DOCKERFILE_BUILDARGS")]
    dockerfile_buildargs: Option<String>,

    /// Script run against every built image
    #[arg(long, env = "POST_BUILD_HOOK")]
    post_build_hook: Option<PathBuf>,

    /// Push images; without it every push is skipped
    #[arg(long = "push", env = "PUSH_DOCKER")]
    push_docker: bool,

    /// Script run after every successful push
    #[arg(long, env = "POST_PUSH_HOOK")]
    post_push_hook: Option<PathBuf>,

    #[arg(long, env = "JOB_OFFSET")]
    job_offset: Option<usize>,

    #[arg(long, env = "JOBS_TOTAL")]
    jobs_total: Option<usize>,

    /// Comma-separated variant suffixes, e.g. `jdk11,ubuntu`
    #[arg(long, env = "TAG_SUFFIXES")]
    tag_suffixes: Option<String>,

    #[arg(long, env = "DOCKER_USERNAME")]
    docker_username: Option<String>,

    #[arg(long, env = "DOCKER_PASSWORD", hide_env_values = true)]
    docker_password: Option<String>,

    #[arg(long, env = "MARKETPLACE_URL", default_value = DEFAULT_MARKETPLACE_URL)]
    marketplace_url: String,

    #[arg(long, env = "EAP_FEED_URL", default_value = DEFAULT_EAP_FEED_URL)]
    eap_feed_url: String,

    #[arg(long, env = "MAVEN_URL", default_value = DEFAULT_MAVEN_URL)]
    maven_url: String,

    #[arg(long, env = "REGISTRY_URL", default_value = DEFAULT_REGISTRY_URL)]
    registry_url: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl Cli {
    fn release_config(&self) -> ReleaseConfig {
        let mut config = ReleaseConfig::new(
            &self.start_version,
            split_list(&self.docker_repos),
            &self.dockerfile_version_arg,
            &self.product_key,
        );
        config.end_version = self.end_version.as_deref().map(Version::parse);
        config.concurrent_builds = self.concurrent_builds;
        config.default_release = self.default_release;
        config.default_eap = self.default_eap;
        config.context_path = self.context.clone();
        config.dockerfile = self.dockerfile.clone();
        config.dockerfile_buildargs = self.dockerfile_buildargs.clone();
        config.tag_suffixes = self.tag_suffixes.as_deref().map(split_list).unwrap_or_default();
        config.push_docker = self.push_docker;
        config.post_build_hook = self.post_build_hook.clone();
        config.post_push_hook = self.post_push_hook.clone();
        config.job_offset = self.job_offset;
        config.jobs_total = self.jobs_total;
        config
    }

    fn endpoints(&self) -> Endpoints {
        Endpoints {
            marketplace_url: self.marketplace_url.clone(),
            eap_feed_url: self.eap_feed_url.clone(),
            maven_url: self.maven_url.clone(),
            registry_url: self.registry_url.clone(),
        }
    }

    fn credentials(&self) -> Option<RegistryCredentials> {
        match (&self.docker_username, &self.docker_password) {
            (Some(username), Some(password)) => Some(RegistryCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if !(cli.create || cli.update || cli.create_eap) {
        warn!("No mode selected; pass --create, --update and/or --create-eap");
    }

    let config = cli.release_config();
    let endpoints = cli.endpoints();
    let credentials = cli.credentials();

    let source = ProductSource::for_product(&config.product_key).build(
        &config.product_key,
        &endpoints,
        RetryPolicy::network(),
    );
    let lister = DockerRegistry::new(&endpoints.registry_url, credentials.clone());
    let builder = Arc::new(DockerEngine::connect(credentials.as_ref())?);

    let manager = ReleaseManager::new(config, source.as_ref(), &lister, builder).await?;

    if cli.create {
        manager.create_releases().await?;
    }
    if cli.update {
        manager.update_releases().await?;
    }
    if cli.create_eap {
        manager.create_eap_releases().await?;
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli));

    if let Err(e) = &result {
        error!("Release run failed: {:#}", e);
    }
    result
}
