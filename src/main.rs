use anyhow::Context;
use std::sync::Arc;

use leaf_predictor::{
    config::Settings,
    model::{TorchDiseaseClassifier, TorchGeneralClassifier},
    server, LeafGate, Pipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env().context("invalid configuration")?;

    // Both models load before the listener binds; any failure aborts startup.
    let general =
        TorchGeneralClassifier::load(&settings.general_model_path, &settings.general_labels_path)
            .context("failed to load general classifier")?;
    let disease = TorchDiseaseClassifier::load(&settings.disease_model_path)
        .context("failed to load disease classifier")?;
    let gate = LeafGate::new(settings.vocabulary.clone())?;

    tracing::info!(
        "pipeline ready: threshold={:.2} top_k={} vocab={}",
        settings.pipeline.confidence_threshold,
        settings.pipeline.top_k,
        gate.version()
    );

    let pipeline = Arc::new(Pipeline::new(
        Box::new(general),
        Box::new(disease),
        gate,
        settings.remedies.clone(),
        settings.pipeline,
    ));
    let app = server::router(pipeline);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
