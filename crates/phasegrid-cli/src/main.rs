use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use phasegrid_model::{CompilerConfig, DeploymentType, OrchestrationStrategy};

mod commands;

#[derive(Parser)]
#[command(
    name = "phasegrid",
    about = "PhaseGrid: deployment phase graph compiler",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to phasegrid.toml (account, feature toggles, log filter)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the forward and rollback step groups of one phase
    Generate {
        /// Deployment type, e.g. KUBERNETES, SSH, ECS
        #[arg(short, long, value_parser = parse_deployment_type)]
        deployment_type: DeploymentType,
        /// Orchestration strategy, e.g. CANARY, BASIC, BLUE_GREEN
        #[arg(short, long, value_parser = parse_strategy)]
        strategy: OrchestrationStrategy,
        /// Skip the service/container setup group
        #[arg(long)]
        no_setup: bool,
        /// Infrastructure is provisioned at deploy time
        #[arg(long)]
        dynamic_infra: bool,
        #[arg(long)]
        daemon_set: bool,
        #[arg(long)]
        stateful_set: bool,
        /// ECS blue/green through Route 53 weights
        #[arg(long)]
        ecs_dns: bool,
        /// AMI/Spotinst blue/green through ALB traffic shifting
        #[arg(long)]
        alb_shift: bool,
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
    /// List the services that need an artifact or manifest picked
    Resolve {
        /// Workflow document (JSON)
        #[arg(short, long)]
        workflow: PathBuf,
        /// Catalog of services and infrastructure definitions (TOML)
        #[arg(long)]
        catalog: PathBuf,
        /// Workflow variable binding, NAME=VALUE. Repeatable.
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Run the policy validator on a workflow document.
    ///
    /// Without --catalog only the rules that need no lookups run:
    /// names, failure strategies and wait intervals.
    Validate {
        #[arg(short, long)]
        workflow: PathBuf,
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn parse_deployment_type(s: &str) -> Result<DeploymentType, String> {
    DeploymentType::parse(s).ok_or_else(|| format!("unknown deployment type: {s}"))
}

fn parse_strategy(s: &str) -> Result<OrchestrationStrategy, String> {
    OrchestrationStrategy::parse(s).ok_or_else(|| format!("unknown orchestration strategy: {s}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CompilerConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => CompilerConfig::default(),
    };

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in config.logging.filter.split(',').filter(|d| !d.trim().is_empty()) {
        filter = filter.add_directive(directive.trim().parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            deployment_type,
            strategy,
            no_setup,
            dynamic_infra,
            daemon_set,
            stateful_set,
            ecs_dns,
            alb_shift,
            format,
        } => {
            let opts = commands::generate::GenerateOptions {
                deployment_type,
                strategy,
                service_setup: !no_setup,
                dynamic_infra,
                daemon_set,
                stateful_set,
                ecs_dns,
                alb_shift,
            };
            commands::generate::generate(&config, &opts, matches!(format, Format::Json))
        }
        Commands::Resolve {
            workflow,
            catalog,
            vars,
            format,
        } => commands::resolve::resolve(
            &config,
            &workflow,
            &catalog,
            &vars,
            matches!(format, Format::Json),
        ),
        Commands::Validate { workflow, catalog } => {
            commands::validate::validate(&config, &workflow, catalog.as_deref())
        }
    }
}
