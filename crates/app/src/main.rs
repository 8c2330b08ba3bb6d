use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use blog_rag_core::{
    BlogWebLoader, HttpFetcher, ModelSettings, RagPipeline, SetupOptions, DEFAULT_CHUNK_SIZE,
    DEFAULT_EMBED_MODEL, DEFAULT_LLM_MODEL, DEFAULT_OPENAI_BASE_URL, DEFAULT_SIMILARITY_TOP_K,
};
use chrono::Utc;
use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "blog-rag-server", version)]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Blog listing page the crawl starts from
    #[arg(long, default_value = "https://fimio.xyz/blog/")]
    base_url: String,

    /// Cap on the number of posts loaded
    #[arg(long)]
    document_limit: Option<usize>,

    /// Chunk size in characters
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Chat model used for answer synthesis
    #[arg(long, default_value = DEFAULT_LLM_MODEL)]
    llm_model: String,

    /// OpenAI-compatible API base URL
    #[arg(long, default_value = DEFAULT_OPENAI_BASE_URL, env = "OPENAI_BASE_URL")]
    llm_base_url: String,

    /// Embedding model spec
    #[arg(long, default_value = DEFAULT_EMBED_MODEL)]
    embed_model: String,

    /// Number of passages the retriever returns
    #[arg(long, default_value_t = DEFAULT_SIMILARITY_TOP_K)]
    similarity_top_k: usize,

    /// Browser origin allowed by CORS
    #[arg(long, default_value = "http://localhost:3000")]
    allow_origin: String,
}

/// Read-only application state. The pipeline is built once at startup;
/// request handlers only read it.
struct AppState {
    pipeline: RagPipeline,
}

#[derive(Deserialize)]
struct QueryParams {
    query: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut options = SetupOptions::new(cli.base_url.clone());
    options.loader.limit = cli.document_limit;
    options.chunk_size = cli.chunk_size;
    options.models = ModelSettings {
        llm_model: cli.llm_model.clone(),
        embed_model: cli.embed_model.clone(),
        llm_base_url: cli.llm_base_url.clone(),
    };
    options.similarity_top_k = cli.similarity_top_k;

    let loader = BlogWebLoader::new(HttpFetcher::new());
    let mut pipeline = RagPipeline::new();

    // A failed setup still serves: the status endpoint reports whatever was
    // recorded and queries answer with state errors.
    match pipeline.setup(&loader, &options).await {
        Ok(()) => info!(base_url = %cli.base_url, "rag pipeline ready"),
        Err(error) => warn!(%error, "rag pipeline setup failed; serving degraded"),
    }

    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(
            cli.allow_origin
                .parse::<HeaderValue>()
                .context("invalid allow-origin value")?,
        )
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = Router::new()
        .route("/", get(status))
        .route("/query", get(query))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!(
        bind = %cli.bind,
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        "blog-rag-server boot"
    );

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// `GET /` — pipeline configuration dump or the failure banner. Always 200.
async fn status(State(state): State<Arc<AppState>>) -> Response {
    if state.pipeline.config().is_empty() {
        info!("rag failed to load");
    } else {
        info!("rag successfully loaded");
    }

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.pipeline.status_report(),
    )
        .into_response()
}

/// `GET /query?query=<text>` — the engine's answer on success, or an error
/// payload with a status matching the error kind.
async fn query(State(state): State<Arc<AppState>>, Query(params): Query<QueryParams>) -> Response {
    match state.pipeline.query(&params.query).await {
        Ok(answer) => (StatusCode::OK, Json(answer)).into_response(),
        Err(error) => {
            let status = StatusCode::from_u16(error.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let payload = serde_json::json!({
                "message": format!("An error occurred: {error}")
            });
            (status, Json(payload)).into_response()
        }
    }
}
