// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! swgate CLI
//!
//! Runs single requests through the interception pipeline for debugging
//! route rules and token handling.

use std::env;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::Context;
use reqwest::Method;

use swgate::{filter, Dispatch, FetchEvent, Request, ServiceWorker, WorkerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("swgate=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "check" => {
            if args.len() < 4 {
                eprintln!("Usage: swgate check <method> <url>");
                return ExitCode::from(1);
            }
            check(&args[2], &args[3]).await
        }
        "fetch" => {
            if args.len() < 3 {
                eprintln!("Usage: swgate fetch <url> [token]");
                return ExitCode::from(1);
            }
            fetch(&args[2], args.get(3).map(String::as_str)).await
        }
        "--help" | "-h" | "help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "--version" | "-v" | "version" => {
            println!("swgate {}", swgate::VERSION);
            return ExitCode::SUCCESS;
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"swgate - Service worker request interception

USAGE:
    swgate <COMMAND> [OPTIONS]

COMMANDS:
    check <method> <url>    Show which filters and interceptors apply
    fetch <url> [token]     Run a GET through the pipeline, optionally with a held token
    help                    Show this help message
    version                 Show version information

ENVIRONMENT:
    SWGATE_CONFIG           Path to a JSON worker config
    RUST_LOG                Log filter (default: swgate=info)
"#
    );
}

fn load_config() -> anyhow::Result<WorkerConfig> {
    match env::var("SWGATE_CONFIG") {
        Ok(path) => WorkerConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path)),
        Err(_) => Ok(WorkerConfig::default()),
    }
}

async fn check(method: &str, url: &str) -> anyhow::Result<()> {
    let worker = ServiceWorker::new(load_config()?)?;
    let method = Method::from_str(&method.to_uppercase()).context("invalid method")?;
    let request = Request::new(method, url)?;

    match filter::first_match(worker.filters(), &request).await {
        Some(name) => println!("ignored by {}", name),
        None => {
            let names = worker.chain().matching(&request);
            if names.is_empty() {
                println!("no interceptor applies; platform default");
            } else {
                println!("intercepted by: {}", names.join(", "));
            }
        }
    }
    Ok(())
}

async fn fetch(url: &str, token: Option<&str>) -> anyhow::Result<()> {
    let worker = ServiceWorker::new(load_config()?)?;
    worker.install();
    worker.activate();
    if let Some(token) = token {
        worker.session().set_token(token);
    }

    let (event, pending) = FetchEvent::new(Request::get(url)?);
    let dispatch = worker.handle_fetch(&event).await;
    println!("dispatch: {:?}", dispatch);

    let response = match dispatch {
        Dispatch::Ignored { .. } | Dispatch::Unhandled => {
            drop(event);
            worker.fetch(Request::get(url)?).await?
        }
        _ => {
            drop(event);
            pending.wait().await.context("event was not fulfilled")??
        }
    };

    println!("\n=== Response ===");
    println!("Status: {}", response.status);
    println!("Content-Type: {:?}", response.content_type());
    println!("Size: {} bytes", response.body_len());
    println!("Session token held: {}", worker.session().has_token());
    Ok(())
}
