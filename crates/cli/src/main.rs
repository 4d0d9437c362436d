use std::io::Read;
use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gitdeck_api::{DeckApi, InProcApi, Settings};
use gitdeck_core::{AppSummary, Environment, Service, StatusRow};
use serde::Serialize;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "gitdeckctl", version, about = "Gitdeck CLI: deployment state of GitOps-managed applications")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Namespace holding Argo CD applications (overrides GITDECK_ARGOCD_NAMESPACE)
    #[arg(long = "argocd-namespace", global = true)]
    argocd_namespace: Option<String>,

    /// Argo CD server for revision metadata (overrides GITDECK_ARGOCD_URL)
    #[arg(long = "argocd-url", global = true)]
    argocd_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Live applications deployed from a repository, merged per app
    Apps {
        #[arg(long = "repo", env = "GITDECK_REPO")]
        repo: String,
    },
    /// Applications declared in the repository's pipelines.yaml
    Declared {
        #[arg(long = "repo", env = "GITDECK_REPO")]
        repo: String,
    },
    /// Rendered services of an app in an environment
    Services {
        #[arg(long = "repo", env = "GITDECK_REPO")]
        repo: String,
        #[arg(long = "env")]
        env: String,
        #[arg(long = "app")]
        app: String,
    },
    /// Deployment history of an app in an environment, newest first
    History {
        #[arg(long = "env")]
        env: String,
        #[arg(long = "app")]
        app: String,
    },
    /// Sync state and managed resources of an app in an environment
    Status {
        #[arg(long = "env")]
        env: String,
        #[arg(long = "app")]
        app: String,
    },
    /// Group already-rendered manifests into services (offline; "-" reads stdin)
    Render {
        file: String,
    },
}

fn init_tracing() {
    let env = std::env::var("GITDECK_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn emit<T: Serialize>(output: Output, value: &T, human: impl FnOnce(&T)) -> Result<()> {
    match output {
        Output::Human => human(value),
        Output::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn print_summaries(apps: &[AppSummary]) {
    for a in apps {
        println!("{}", a.name);
        for (i, env) in a.environments.iter().enumerate() {
            let sync = a.sync_status.get(i).map(String::as_str).unwrap_or("");
            let last = a.last_deployed.get(i).map(String::as_str).filter(|s| !s.is_empty()).unwrap_or("-");
            println!("  {:<16} {:<10} {}", env, sync, last);
        }
    }
}

fn print_services(services: &[Service]) {
    for s in services {
        let name = if s.name.is_empty() { "<unlabeled>" } else { s.name.as_str() };
        match &s.source {
            Some(src) => println!("{} ({}: {})", name, src.kind, src.url),
            None => println!("{}", name),
        }
        for img in &s.images {
            println!("  image {}", img);
        }
        for r in &s.resources {
            println!("  {} {}", r.gvk_key(), r.name);
        }
    }
}

fn print_rows(title: &str, rows: &[StatusRow]) {
    if rows.is_empty() {
        return;
    }
    println!("{}:", title);
    for r in rows {
        println!("  {:<32} {:<12} {}", r.name, r.health, r.status);
    }
}

fn read_rendered(file: &str) -> Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(file).with_context(|| format!("reading {}", file))
}

/// Offline path: no declared config, so services carry no source.
fn render(file: &str) -> Result<Vec<Service>> {
    let t0 = Instant::now();
    let objects = gitdeck_parser::split_rendered(&read_rendered(file)?)?;
    let resources = gitdeck_parser::extract(&objects);
    let services = gitdeck_aggregate::aggregate(&Environment::default(), resources)?;
    info!(objects = objects.len(), services = services.len(), took_ms = %t0.elapsed().as_millis(), "render ok");
    Ok(services)
}

fn settings(cli: &Cli) -> Settings {
    let mut s = Settings::from_env();
    if let Some(ns) = &cli.argocd_namespace {
        s.argocd_namespace = ns.clone();
    }
    if let Some(url) = &cli.argocd_url {
        s.argocd_url = Some(url.clone());
    }
    s
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Render { file } = &cli.command {
        let services = render(file)?;
        return emit(cli.output, &services, |s| print_services(s));
    }
    let api = InProcApi::from_settings(&settings(&cli))?;
    match &cli.command {
        Commands::Apps { repo } => {
            info!(repo = %repo, "apps invoked");
            let res = api.applications(repo).await?;
            emit(cli.output, &res, |r| print_summaries(&r.applications))
        }
        Commands::Declared { repo } => {
            info!(repo = %repo, "declared invoked");
            let res = api.declared_applications(repo).await?;
            emit(cli.output, &res, |r| print_summaries(&r.applications))
        }
        Commands::Services { repo, env, app } => {
            info!(repo = %repo, env = %env, app = %app, "services invoked");
            let res = api.environment_application(repo, env, app).await?;
            emit(cli.output, &res, |r| {
                println!("# {} @ {}", r.environment, r.cluster);
                print_services(&r.services);
            })
        }
        Commands::History { env, app } => {
            info!(env = %env, app = %app, "history invoked");
            let res = api.application_history(env, app).await?;
            emit(cli.output, &res, |entries| {
                for h in entries {
                    let short = h.revision.get(..7).unwrap_or(&h.revision);
                    println!("{}  {}  {:<24} {}", h.deployed_at, short, h.author, h.message.lines().next().unwrap_or(""));
                }
            })
        }
        Commands::Status { env, app } => {
            info!(env = %env, app = %app, "status invoked");
            let res = api.environment_status(env, app).await?;
            emit(cli.output, &res, |r| {
                println!("# {} @ {} ({})", r.environment, r.cluster, r.sync_status);
                let b = &r.resources;
                print_rows("services", &b.services);
                print_rows("deployments", &b.deployments);
                print_rows("secrets", &b.secrets);
                print_rows("routes", &b.routes);
                print_rows("role bindings", &b.role_bindings);
                print_rows("cluster roles", &b.cluster_roles);
                print_rows("cluster role bindings", &b.cluster_role_bindings);
            })
        }
        Commands::Render { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!(error = ?e, "command failed");
        return Err(e);
    }
    Ok(())
}
