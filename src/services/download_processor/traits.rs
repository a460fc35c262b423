use crate::services::download_processor::types::{
    AlbumInfo, ArtistHit, DownloadVariant, PlaylistInfo, TrackTags,
};
use crate::types::{AlbumId, ArtistId, TrackId};
use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub(crate) enum CatalogServiceError {
    #[error("Object has not been found in the catalog")]
    NotFound,
    #[error(transparent)]
    Unexpected(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The remote catalog behind a stable interface: search, metadata lookup,
/// direct-link resolution, and payload retrieval.
#[async_trait]
pub(crate) trait CatalogService: Send + Sync {
    async fn search_artists(&self, query: &str) -> Result<Vec<ArtistHit>, CatalogServiceError>;
    async fn get_artist_direct_albums(
        &self,
        artist_id: &ArtistId,
        page_size: u32,
    ) -> Result<Vec<AlbumId>, CatalogServiceError>;
    async fn get_artist_cover_url(
        &self,
        artist_id: &ArtistId,
    ) -> Result<Option<String>, CatalogServiceError>;
    async fn get_album_with_tracks(
        &self,
        album_id: &AlbumId,
    ) -> Result<AlbumInfo, CatalogServiceError>;
    async fn get_download_variants(
        &self,
        track_id: &TrackId,
    ) -> Result<Vec<DownloadVariant>, CatalogServiceError>;
    /// `Ok(None)` means the catalog has no lyrics for the track, which is an
    /// expected condition rather than an error.
    async fn get_lyrics(&self, track_id: &TrackId) -> Result<Option<String>, CatalogServiceError>;
    async fn get_user_playlist(
        &self,
        owner: &str,
        kind: u64,
    ) -> Result<PlaylistInfo, CatalogServiceError>;
    async fn download_to_file(&self, url: &str, dest: &Path) -> Result<(), CatalogServiceError>;
    async fn download_bytes(&self, url: &str) -> Result<Vec<u8>, CatalogServiceError>;
}

#[derive(Debug, thiserror::Error)]
#[error("Unable to write tags: {0}")]
pub(crate) struct TagWriterError(pub(crate) Box<dyn std::error::Error + Send + Sync>);

/// Writes a full tag container into a downloaded audio file and persists it.
#[async_trait]
pub(crate) trait TagWriter: Send + Sync {
    async fn write_tags(&self, file_path: &Path, tags: &TrackTags) -> Result<(), TagWriterError>;
}
