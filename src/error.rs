use thiserror::Error;

use crate::anilist::MetadataError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("feed request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("feed response is not a release list: {0}")]
    Parse(#[source] serde_json::Error),
}
