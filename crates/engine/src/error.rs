use thiserror::Error;

/// Errors returned by the engine control surface. Per-task conditions
/// (unmatched subtitles, encoding repair failures, ffmpeg exit codes) are not
/// errors at this level; they are recorded in the run's job state instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a batch run is already in progress")]
    AlreadyRunning,

    #[error("no batch run is in progress")]
    NotRunning,

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("nothing to process: {0}")]
    DiscoveryEmpty(String),
}
