//! Tasar CLI - medical cost inference server
//!
//! # Commands
//!
//! - `serve` - Load a model artifact and start the prediction server
//! - `inspect` - Show metadata for a model artifact
//! - `info` - Show version info

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tasar::{
    api::{create_router, AppState},
    artifact::Artifact,
    error::{Result, TasarError},
    model::LinearCostModel,
};

/// Tasar - medical cost inference server
///
/// Loads a pre-trained `.tsr` regression artifact and serves predictions
/// over HTTP.
#[derive(Parser)]
#[command(name = "tasar")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the prediction server
    ///
    /// Examples:
    ///   tasar serve
    ///   tasar serve --model final_medcost_model.tsr --port 8000
    ///   tasar serve --demo
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Path to the model artifact
        #[arg(short, long, default_value = "final_medcost_model.tsr")]
        model: String,

        /// Use the built-in demo model instead of an artifact file
        #[arg(long)]
        demo: bool,
    },
    /// Show metadata for a model artifact
    Inspect {
        /// Path to the model artifact
        #[arg(value_name = "MODEL")]
        model: String,
    },
    /// Show version info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            model,
            demo,
        } => {
            let (state, source) = if demo {
                (AppState::demo(), "demo model".to_string())
            } else {
                (load_state(&model)?, model)
            };
            serve(&host, port, state, &source).await?;
        }
        Commands::Inspect { model } => {
            inspect_model(&model)?;
        }
        Commands::Info => {
            println!("Tasar v{}", tasar::VERSION);
            println!("Medical cost inference server");
            println!();
            println!("Features:");
            println!("  - .tsr regression artifact format");
            println!("  - Linear models with in-artifact categorical encoding");
            println!("  - REST API for inference");
        }
    }

    Ok(())
}

/// Load the artifact and build application state.
///
/// A missing or corrupt artifact is fatal here, before any socket is
/// bound; the process exits nonzero and never serves.
fn load_state(model_path: &str) -> Result<AppState> {
    let artifact = Artifact::load(model_path)?;
    let name = artifact
        .metadata()
        .name
        .clone()
        .unwrap_or_else(|| model_path.to_string());
    let model = LinearCostModel::from_artifact(&artifact)?;
    Ok(AppState::new(Arc::new(model), name))
}

async fn serve(host: &str, port: u16, state: AppState, source: &str) -> Result<()> {
    println!("Starting Tasar inference server...");
    println!("Model: {source}");

    let app = create_router(state);

    let addr: SocketAddr =
        format!("{host}:{port}")
            .parse()
            .map_err(|e| TasarError::InvalidConfiguration {
                message: format!("Invalid address: {e}"),
            })?;

    println!("Server listening on http://{addr}");
    println!();
    println!("Endpoints:");
    println!("  GET  /health  - Health check");
    println!("  GET  /metrics - Prometheus metrics");
    println!("  POST /predict - Predict charges for one patient record");
    println!();
    println!("Example:");
    println!("  curl http://{addr}/health");
    println!();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| TasarError::IoError {
            message: format!("Failed to bind {addr}: {e}"),
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| TasarError::IoError {
            message: format!("Server error: {e}"),
        })?;

    Ok(())
}

fn inspect_model(path: &str) -> Result<()> {
    let artifact = Artifact::load(path)?;
    let metadata = artifact.metadata();

    println!("Artifact: {path}");
    println!(
        "Format: TSR v{}.{}",
        artifact.header().version.0,
        artifact.header().version.1
    );
    println!("Model type: {}", metadata.model_type);
    if let Some(name) = &metadata.name {
        println!("Name: {name}");
    }
    println!("Coefficients: {}", artifact.coefficients().len());
    println!("Columns:");
    for column in &metadata.columns {
        match column {
            tasar::artifact::ColumnSpec::Numeric { name } => {
                println!("  {name} (numeric)");
            }
            tasar::artifact::ColumnSpec::Categorical { name, vocab } => {
                println!("  {name} (categorical: {})", vocab.join(", "));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_serve_defaults() {
        let cli = Cli::try_parse_from(["tasar", "serve"]).expect("parse");
        match cli.command {
            Commands::Serve {
                host,
                port,
                model,
                demo,
            } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8080);
                assert_eq!(model, "final_medcost_model.tsr");
                assert!(!demo);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parses_serve_overrides() {
        let cli = Cli::try_parse_from([
            "tasar", "serve", "--host", "0.0.0.0", "--port", "9000", "--model", "m.tsr",
        ])
        .expect("parse");
        match cli.command {
            Commands::Serve {
                host, port, model, ..
            } => {
                assert_eq!(host, "0.0.0.0");
                assert_eq!(port, 9000);
                assert_eq!(model, "m.tsr");
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parses_demo_flag() {
        let cli = Cli::try_parse_from(["tasar", "serve", "--demo"]).expect("parse");
        match cli.command {
            Commands::Serve { demo, .. } => assert!(demo),
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parses_inspect() {
        let cli = Cli::try_parse_from(["tasar", "inspect", "model.tsr"]).expect("parse");
        match cli.command {
            Commands::Inspect { model } => assert_eq!(model, "model.tsr"),
            _ => panic!("Expected Inspect command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["tasar", "train"]).is_err());
    }

    #[test]
    fn test_load_state_missing_artifact_fails() {
        let result = load_state("/nonexistent/final_medcost_model.tsr");
        assert!(result.is_err());
    }
}
