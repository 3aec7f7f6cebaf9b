//! Command-line client for the Multimodal RAG API
//!
//! Run with: cargo run -p multimodal-rag --bin multimodal-rag-cli -- --help

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use multimodal_rag::types::FileType;

#[derive(Parser)]
#[command(name = "multimodal-rag-cli")]
#[command(about = "Upload documents and ask questions about them")]
#[command(version)]
struct Cli {
    /// Base URL of the API server
    #[arg(long, env = "MMRAG_URL", default_value = "http://127.0.0.1:8000", global = true)]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload and index .txt, .pdf, .png, .jpg or .jpeg files
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Ask a question about the uploaded documents
    Query {
        /// Question text
        text: Vec<String>,
    },

    /// Show the most relevant chunks without generating an answer
    Search {
        /// Search text
        text: Vec<String>,

        /// Number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// List indexed documents
    Documents,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let url = cli.url.trim_end_matches('/').to_string();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .context("Failed to create HTTP client")?;

    match cli.command {
        Commands::Upload { files } => upload(&client, &url, &files).await,
        Commands::Query { text } => query(&client, &url, &text.join(" ")).await,
        Commands::Search { text, top_k } => search(&client, &url, &text.join(" "), top_k).await,
        Commands::Documents => documents(&client, &url).await,
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Send a request and decode the JSON body; error envelopes become `Err`
async fn send_json(request: reqwest::RequestBuilder) -> anyhow::Result<std::result::Result<Value, String>> {
    let response = request.send().await.context("Could not reach the API server")?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .with_context(|| format!("Unexpected response (HTTP {})", status))?;

    if status.is_success() {
        Ok(Ok(body))
    } else {
        let message = body["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));
        Ok(Err(message))
    }
}

fn print_error(message: &str) {
    eprintln!("{} {}", style("error:").red().bold(), message);
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

async fn upload(client: &reqwest::Client, url: &str, files: &[PathBuf]) -> anyhow::Result<ExitCode> {
    let mut failures = 0;

    for path in files {
        let name = file_name(path);

        if !FileType::from_filename(&name).is_supported() {
            print_error(&format!("{}: only txt, pdf, png, jpg and jpeg files are accepted", name));
            failures += 1;
            continue;
        }

        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let part = Part::bytes(data)
            .file_name(name.clone())
            .mime_str(mime.as_ref())?;

        let pb = spinner(format!("Processing {}...", name));
        let result = send_json(
            client
                .post(format!("{}/upload/file", url))
                .multipart(Form::new().part("file", part)),
        )
        .await;
        pb.finish_and_clear();

        match result? {
            Ok(body) => {
                println!("{} {}", style("✓").green().bold(), style(&name).bold());
                println!("{}", serde_json::to_string_pretty(&body["metadata"])?);
                if let Some(chunks) = body["chunks_indexed"].as_u64() {
                    println!("Chunks indexed: {}", chunks);
                }
                if let Some(sample) = body["content_sample"].as_str() {
                    println!("\n{}\n{}\n", style("Content sample:").dim(), sample);
                }
            }
            Err(message) => {
                print_error(&format!("{}: {}", name, message));
                failures += 1;
            }
        }
    }

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn query(client: &reqwest::Client, url: &str, text: &str) -> anyhow::Result<ExitCode> {
    if text.trim().is_empty() {
        eprintln!("{} Please enter a question.", style("warning:").yellow().bold());
        return Ok(ExitCode::FAILURE);
    }

    let pb = spinner("Thinking...".to_string());
    let result = send_json(client.post(format!("{}/query", url)).form(&[("query", text)])).await;
    pb.finish_and_clear();

    let body = match result? {
        Ok(body) => body,
        Err(message) => {
            print_error(&message);
            return Ok(ExitCode::FAILURE);
        }
    };

    if body["status"] != "success" {
        print_error(body["answer"].as_str().unwrap_or("Query failed"));
        return Ok(ExitCode::FAILURE);
    }

    println!("{}", style("Answer").green().bold());
    println!("{}\n", body["generated_answer"].as_str().unwrap_or_default());

    if let Some(results) = body["top_results"].as_array() {
        println!("{}", style("Top results").bold());
        for (i, result) in results.iter().enumerate() {
            println!(
                "{}. {} (relevance {:.3})",
                i + 1,
                style(result["source"].as_str().unwrap_or("Unknown")).cyan(),
                result["relevance"].as_f64().unwrap_or_default()
            );
            println!("   {}", result["snippet"].as_str().unwrap_or_default());
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn search(
    client: &reqwest::Client,
    url: &str,
    text: &str,
    top_k: Option<usize>,
) -> anyhow::Result<ExitCode> {
    if text.trim().is_empty() {
        eprintln!("{} Please enter search text.", style("warning:").yellow().bold());
        return Ok(ExitCode::FAILURE);
    }

    let mut form = vec![("query", text.to_string())];
    if let Some(k) = top_k {
        form.push(("top_k", k.to_string()));
    }

    let body = match send_json(client.post(format!("{}/search", url)).form(&form)).await? {
        Ok(body) => body,
        Err(message) => {
            print_error(&message);
            return Ok(ExitCode::FAILURE);
        }
    };

    let results = body["results"].as_array().cloned().unwrap_or_default();
    if results.is_empty() {
        println!("No results.");
        return Ok(ExitCode::SUCCESS);
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. {} (relevance {})",
            i + 1,
            style(result["source"].as_str().unwrap_or("Unknown")).cyan(),
            result["relevance_score"]
        );
        println!("{}\n", result["content"].as_str().unwrap_or_default());
    }

    Ok(ExitCode::SUCCESS)
}

async fn documents(client: &reqwest::Client, url: &str) -> anyhow::Result<ExitCode> {
    let body = match send_json(client.get(format!("{}/documents", url))).await? {
        Ok(body) => body,
        Err(message) => {
            print_error(&message);
            return Ok(ExitCode::FAILURE);
        }
    };

    let docs = body["documents"].as_array().cloned().unwrap_or_default();
    println!("{} document(s)", docs.len());

    for doc in &docs {
        println!(
            "  {}  {}  {} chunks  {}",
            doc["id"].as_str().unwrap_or_default(),
            style(doc["filename"].as_str().unwrap_or_default()).bold(),
            doc["total_chunks"],
            doc["uploaded_at"].as_str().unwrap_or_default()
        );
    }

    Ok(ExitCode::SUCCESS)
}
