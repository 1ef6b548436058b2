use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use client_core::{config::load_settings, HttpQuoteGateway, QuoteOrchestrator};
use shared::domain::ModalState;

#[derive(Parser, Debug)]
struct Args {
    /// GraphQL endpoint of the quote API.
    #[arg(long)]
    api_url: Option<String>,
    /// API key for the machine identity.
    #[arg(long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    if let Some(api_key) = args.api_key {
        settings.api_key = api_key;
    }

    let gateway = Arc::new(HttpQuoteGateway::new(&settings)?);
    let orchestrator = QuoteOrchestrator::new_with_gateways(gateway.clone(), gateway);

    orchestrator.refresh_counter().await;
    print_counter(orchestrator.snapshot().await.counter);

    println!("Generating a quote card...");
    orchestrator.open().await;

    let state = orchestrator.snapshot().await;
    match (state.modal, state.decoded_result.as_deref()) {
        (ModalState::Result, Some(quote)) => println!("\"{quote}\""),
        (ModalState::Failed, _) => println!("Quote generation failed; see log output for details."),
        _ => {}
    }
    print_counter(state.counter);

    orchestrator.close().await;
    Ok(())
}

fn print_counter(counter: Option<u64>) {
    match counter {
        Some(count) => println!("Quotes generated: {count}"),
        None => println!("Quotes generated: -"),
    }
}
