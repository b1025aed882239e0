//! CartMapper server binary
//!
//! Run with: cargo run -p cartmapper-rag --bin cartmapper-server

use cartmapper_rag::{config::RagConfig, server::CartMapperServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cartmapper_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                    CartMapper Backend                     ║
║         Shopping-list Q&A over PDFs, CSVs and QRs         ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - LLM: {:?} / {}", config.llm.provider, config.llm.model);
    tracing::info!("  - Chunk size: {} (overlap {})", config.chunking.chunk_size, config.chunking.chunk_overlap);
    tracing::info!("  - Index: {}", config.vector_db.storage_path.display());

    let server = CartMapperServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}/api", server.address());
    println!("  Health: http://{}/api/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/upload          - Upload a PDF or CSV");
    println!("  POST /api/process-qr      - Ingest the PDF behind a QR code");
    println!("  POST /api/process-pdf-url - Ingest a linked PDF");
    println!("  GET  /api/upload/list     - Show the active document");
    println!("  POST /api/query           - Ask a question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
