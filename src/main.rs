use std::sync::Arc;

use yenta::config::GateConfig;
use yenta::intake::extractor::KeywordExtractor;
use yenta::intake::routes::{IntakeRouteState, intake_routes};
use yenta::intake::service::IntakeService;
use yenta::scoring::{AnthropicScorer, ScoreProvider, ScorerConfig};
use yenta::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let port: u16 = std::env::var("YENTA_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let db_path =
        std::env::var("YENTA_DB_PATH").unwrap_or_else(|_| "./data/yenta.db".to_string());

    // ── Database ─────────────────────────────────────────────────────────
    let db_path_ref = std::path::Path::new(&db_path);
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(db_path_ref)
            .await
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to open database at {}: {}", db_path, e);
                std::process::exit(1);
            }),
    );

    eprintln!("🤝 Yenta v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", db_path);
    eprintln!("   API: http://0.0.0.0:{}/api/qualification/start", port);

    // ── Scoring ──────────────────────────────────────────────────────────
    // Without an API key the service runs with scoring disabled: rounds
    // complete unscored and round 2+ stays gated until a score is recorded.
    let scorer: Option<Arc<dyn ScoreProvider>> = match std::env::var("ANTHROPIC_API_KEY") {
        Ok(api_key) => {
            let model = std::env::var("YENTA_SCORING_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());
            eprintln!("   Scoring: enabled (model: {model})");
            Some(Arc::new(AnthropicScorer::new(ScorerConfig {
                api_key: secrecy::SecretString::from(api_key),
                model,
            })))
        }
        Err(_) => {
            eprintln!("   Scoring: disabled (ANTHROPIC_API_KEY not set)");
            None
        }
    };

    // ── Service ──────────────────────────────────────────────────────────
    let extractor = Arc::new(KeywordExtractor::with_default_rules());
    let service = Arc::new(IntakeService::new(
        db,
        extractor,
        scorer,
        GateConfig::from_env(),
    ));

    let app = intake_routes(IntakeRouteState { service });
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Qualification server started");
    axum::serve(listener, app).await?;

    Ok(())
}
