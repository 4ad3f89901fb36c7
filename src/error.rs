use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No track with id {0} in registry")]
    TrackNotFound(u64),

    #[error("Track {id} history mismatch: frames={frames}, trajectory={trajectory}, centroids={centroids}, labels={labels}, confidences={confidences}")]
    HistoryMismatch {
        id: u64,
        frames: usize,
        trajectory: usize,
        centroids: usize,
        labels: usize,
        confidences: usize,
    },

    #[error("Track {id} observed at frame {frame} after frame {previous}")]
    FramesOutOfOrder { id: u64, previous: u64, frame: u64 },

    #[error("Message is not a JSON object")]
    NotAnObject,

    #[error("Config Error: {0}")]
    Config(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}
