mod archive;
mod model;
mod query;
mod response;
mod service;

pub use archive::make_zip;
pub use model::{sanitize_file_name, Cover, CoverSize, DownloadProgress, Manga};
pub use query::{parse_manga_id, CoverQuery, Endpoints, EndpointsBuilder, MangaListQuery};
pub use response::{
    CoverAttributes, CoverEntity, CoverListResponse, MangaAttributes, MangaEntity,
    MangaListResponse, MangaResponse, Relationship, RelationshipAttributes,
};
pub use service::{CoverDownloadRequest, CoverDownloader};

#[derive(Debug, thiserror::Error)]
pub enum CoverError {
    #[error(transparent)]
    RequestError(#[from] reqwest::Error),
    #[error(transparent)]
    DeserializeError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ZipError(#[from] zip::result::ZipError),
    #[error("invalid url '{0}'")]
    UrlParseError(String),
    #[error("manga '{0}' has no title")]
    MissingTitle(String),
    #[error("manga '{0}' has no cover art")]
    MissingCover(String),
    #[error("progress {current} exceeds total {total}")]
    InvalidProgress { current: u64, total: u64 },
}
