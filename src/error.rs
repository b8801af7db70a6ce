use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("resource pool is empty: {runways} runway(s), {stands} parking stand(s)")]
    EmptyPool { runways: usize, stands: usize },

    #[error("background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;
