//! Outbound HTTP client for the remote audio catalog service: search,
//! album/artist/playlist metadata, download-link resolution, lyrics and
//! binary payload retrieval.

mod types;

pub use types::{
    Album, Artist, ArtistBriefInfo, Cover, DownloadVariant, Playlist, PlaylistTrack, SearchPage,
    SearchResponse, Track, TrackAlbum, TrackPosition,
};

use futures_lite::StreamExt;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use types::{DirectAlbumsPage, Lyrics, ResultEnvelope};

const DEFAULT_API_ENDPOINT: &str = "https://api.music.yandex.net";
const COVER_SIZE: &str = "1000x1000";

#[derive(Debug, thiserror::Error)]
pub enum CatalogClientError {
    #[error("Object has not been found in the catalog")]
    NotFound,
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CatalogClientResult<T> = Result<T, CatalogClientError>;

pub struct CatalogClient {
    endpoint: String,
    token: String,
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn create(endpoint: Option<String>, token: String) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to create HTTP Client");

        Self {
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
            token,
            client,
        }
    }

    async fn get_result<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> CatalogClientResult<T> {
        debug!(path, "Performing catalog API request");

        let response = self
            .client
            .get(format!("{}{}", self.endpoint, path))
            .header("Authorization", format!("OAuth {}", self.token))
            .query(query)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogClientError::NotFound);
        }

        let envelope = response
            .error_for_status()?
            .json::<ResultEnvelope<T>>()
            .await?;

        Ok(envelope.result)
    }

    pub async fn search_artists(&self, query: &str) -> CatalogClientResult<SearchResponse> {
        self.get_result(
            "/search",
            &[
                ("text", query.to_string()),
                ("type", "artist".to_string()),
                ("page", "0".to_string()),
                ("nocorrect", "false".to_string()),
            ],
        )
        .await
    }

    pub async fn album_with_tracks(&self, album_id: u64) -> CatalogClientResult<Album> {
        self.get_result(&format!("/albums/{}/with-tracks", album_id), &[])
            .await
    }

    pub async fn artist_brief_info(&self, artist_id: u64) -> CatalogClientResult<ArtistBriefInfo> {
        self.get_result(&format!("/artists/{}/brief-info", artist_id), &[])
            .await
    }

    pub async fn artist_direct_albums(
        &self,
        artist_id: u64,
        page_size: u32,
    ) -> CatalogClientResult<Vec<Album>> {
        let page = self
            .get_result::<DirectAlbumsPage>(
                &format!("/artists/{}/direct-albums", artist_id),
                &[("page-size", page_size.to_string())],
            )
            .await?;

        Ok(page.albums)
    }

    pub async fn track_download_variants(
        &self,
        track_id: u64,
    ) -> CatalogClientResult<Vec<DownloadVariant>> {
        self.get_result(&format!("/tracks/{}/download-info", track_id), &[])
            .await
    }

    /// Returns `Ok(None)` when the catalog has no lyrics for the track. Lyric
    /// absence is an expected condition, not an error.
    pub async fn track_lyrics(&self, track_id: u64) -> CatalogClientResult<Option<String>> {
        let lyrics = self
            .get_result::<Lyrics>(
                &format!("/tracks/{}/lyrics", track_id),
                &[("format", "TEXT".to_string())],
            )
            .await;

        match lyrics {
            Ok(lyrics) => Ok(Some(lyrics.full_lyrics)),
            Err(CatalogClientError::NotFound) => Ok(None),
            Err(error) => Err(error),
        }
    }

    pub async fn user_playlist(&self, owner: &str, kind: u64) -> CatalogClientResult<Playlist> {
        self.get_result(&format!("/users/{}/playlists/{}", owner, kind), &[])
            .await
    }

    pub async fn download_bytes(&self, url: &str) -> CatalogClientResult<Vec<u8>> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(bytes.to_vec())
    }

    /// Streams a binary payload into `dest`, truncating any previous content.
    /// Each call restarts the file from scratch; partial downloads are not
    /// resumed.
    pub async fn download_to_file(&self, url: &str, dest: &Path) -> CatalogClientResult<()> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }

        file.flush().await?;

        Ok(())
    }
}

/// Expands the size placeholder in a catalog cover URI and prefixes the
/// scheme the API omits.
pub fn cover_link(uri: &str) -> String {
    let sized = uri.replace("%%", COVER_SIZE);

    if sized.starts_with("http://") || sized.starts_with("https://") {
        sized
    } else {
        format!("https://{}", sized)
    }
}
