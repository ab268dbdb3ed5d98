/// Errors returned when building or running a [`Pipeline`].
///
/// [`Pipeline`]: crate::Pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The pipeline parameters don't form a runnable layout.
    #[error("invalid pipeline: {0}")]
    InvalidConfig(String),

    /// A worker thread couldn't be spawned.
    #[error(transparent)]
    ThreadSpawn(#[from] std::io::Error),

    /// A worker thread panicked before reaching its normal termination.
    #[error("the {0} thread panicked")]
    WorkerPanicked(&'static str),
}

impl Error {
    #[inline]
    pub(crate) fn config<T: ToString>(msg: T) -> Self {
        Self::InvalidConfig(msg.to_string())
    }
}
