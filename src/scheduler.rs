use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};

use crate::pipeline::IngestionPipeline;

/// Triggers one cycle per interval tick, handing the trigger timestamp to
/// the pipeline. The first cycle runs immediately; a failed cycle is
/// logged and the loop keeps ticking.
pub async fn run_interval(pipeline: &IngestionPipeline, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        let day = Utc::now();
        info!(day = %day.date_naive(), "interval trigger");
        if let Err(e) = pipeline.process_day(day).await {
            error!(error = %e, "cycle failed");
        }
    }
}
