// src/main.rs

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use nwis_mcp::chat::Agent;
use nwis_mcp::config::CONFIG;
use nwis_mcp::llm::AnthropicClient;
use nwis_mcp::nwis::NwisClient;
use nwis_mcp::server::WaterDataServer;
use nwis_mcp::tools::{ToolExecutor, context_document};

#[derive(Parser)]
#[command(name = "nwis-mcp", about = "USGS water data bridge over the NWIS web services")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the function catalog as MCP tools over stdio.
    Serve,
    /// Interactive chat that answers questions with live water data.
    Chat,
    /// Invoke a single catalog function and print its envelope.
    Call {
        /// Function name (e.g., get_site_data)
        name: String,
        /// Parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Print the function catalog as JSON.
    Functions,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Stdout carries the MCP protocol in serve mode; logs go to stderr.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let executor = Arc::new(ToolExecutor::new(Arc::new(NwisClient::new()?)));

    match cli.command {
        Command::Serve => {
            info!("Starting NWIS MCP server on stdio");
            let service = WaterDataServer::new(executor).serve(stdio()).await?;
            service.waiting().await?;
        }
        Command::Chat => {
            let client = AnthropicClient::new()?;
            let mut agent = Agent::new(Arc::new(client), executor);
            info!("Chat ready (model: {})", CONFIG.anthropic_model);

            let mut stdout = tokio::io::stdout();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            while let Some(line) = lines.next_line().await? {
                let query = line.trim();
                if query.is_empty() || query == "quit" || query == "exit" {
                    break;
                }
                match agent.process_query(query).await {
                    Ok(answer) => {
                        stdout.write_all(answer.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                    }
                    Err(e) => {
                        stdout
                            .write_all(format!("error: {e}\n").as_bytes())
                            .await?;
                    }
                }
                stdout.write_all(b"> ").await?;
                stdout.flush().await?;
            }
        }
        Command::Call { name, params } => {
            let params: serde_json::Value = serde_json::from_str(&params)?;
            let envelope = executor.call(&name, &params).await;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Command::Functions => {
            println!("{}", serde_json::to_string_pretty(&context_document(None))?);
        }
    }

    Ok(())
}
