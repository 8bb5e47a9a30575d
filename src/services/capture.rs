use tracing::info;

/// Camera/detection collaborator started and stopped by the game session.
///
/// Hits and availability changes flow back through the session handle; this
/// trait only carries the commands the session issues.
pub trait CaptureService {
    /// Begin capturing frames and emitting hits.
    fn start_session(&mut self);
    /// Stop capturing.
    fn stop_session(&mut self);
}

/// Capture collaborator that only records its lifecycle in the logs.
#[derive(Debug, Default)]
pub struct TracingCapture;

impl CaptureService for TracingCapture {
    fn start_session(&mut self) {
        info!("capture session started");
    }

    fn stop_session(&mut self) {
        info!("capture session stopped");
    }
}
