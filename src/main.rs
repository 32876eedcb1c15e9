// ABOUTME: Entry point for the funcdock CLI application.
// ABOUTME: Wires the platform from detected collaborators and dispatches commands.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use funcdock::builder::PrebuiltImageBuilder;
use funcdock::config::FunctionConfig;
use funcdock::error::{Error, Result};
use funcdock::lifecycle::{CreateFunctionOptions, GetFunctionsFilter};
use funcdock::output::{Output, OutputMode};
use funcdock::platform::LocalPlatform;
use funcdock::runtime::{BollardRuntime, detect_local};
use funcdock::store::FileStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    // Determine output mode
    let output_mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(output_mode);

    if let Err(e) = run(cli, &output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

type CliPlatform = LocalPlatform<BollardRuntime, FileStore, PrebuiltImageBuilder<BollardRuntime>>;

fn build_platform(cli: &Cli) -> Result<CliPlatform> {
    let info = detect_local()?;
    let runtime = Arc::new(
        BollardRuntime::connect(&info)
            .map_err(|e| Error::Platform(funcdock::lifecycle::PlatformError::runtime_error(
                e.to_string(),
            )))?,
    );
    let store = Arc::new(FileStore::open(&cli.state_dir)?);
    let builder = Arc::new(PrebuiltImageBuilder::new(runtime.clone()));
    Ok(LocalPlatform::new(runtime, store, builder))
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let platform = build_platform(&cli)?;

    match cli.command {
        Commands::Deploy { ref file } => {
            if !file.exists() {
                return Err(Error::ConfigNotFound(file.clone()));
            }
            let mut config: FunctionConfig = serde_yaml::from_str(&std::fs::read_to_string(file)?)?;
            if config.meta.namespace.is_empty() {
                config.meta.namespace = cli.namespace.clone();
            }

            output.progress(&format!("Deploying function {}...", config.meta.name));
            let result = platform
                .create_function(CreateFunctionOptions::new(config))
                .await?;
            output.result(
                &format!(
                    "Function deployed: port {} (container {})",
                    result.http_port, result.container_id
                ),
                &serde_json::json!({
                    "httpPort": result.http_port,
                    "containerId": result.container_id,
                }),
            );
        }
        Commands::Get { ref name, ref project } => {
            let filter = GetFunctionsFilter {
                namespace: cli.namespace.clone(),
                name: name.clone(),
                project: project.clone(),
            };
            let records = platform.get_functions(&filter).await?;
            if output.is_json() {
                output.result("", &records);
            } else if records.is_empty() {
                output.progress("No functions found");
            } else {
                for record in &records {
                    let port = record
                        .status
                        .http_port
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{}/{}  {:?}  port {}",
                        record.namespace(),
                        record.name(),
                        record.status.state,
                        port
                    );
                }
            }
        }
        Commands::Delete { ref name } => {
            output.progress(&format!("Deleting function {}...", name));
            platform.delete_function(&cli.namespace, name).await?;
            output.result(
                &format!("Function {} deleted", name),
                &serde_json::json!({ "deleted": name }),
            );
        }
    }

    platform.close();
    Ok(())
}
