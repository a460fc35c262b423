use crate::services::download_processor::{
    AlbumArtist, AlbumInfo, ArtistHit, CatalogService, CatalogServiceError, DownloadVariant,
    PlaylistInfo, PlaylistTrackRef, TrackInfo,
};
use crate::types::{AlbumId, ArtistId, TrackId};
use async_trait::async_trait;
use catalog_client::{cover_link, CatalogClient, CatalogClientError};
use std::path::Path;

impl From<CatalogClientError> for CatalogServiceError {
    fn from(error: CatalogClientError) -> Self {
        match error {
            CatalogClientError::NotFound => Self::NotFound,
            error => Self::Unexpected(Box::new(error)),
        }
    }
}

fn convert_track(track: &catalog_client::Track, album_id: u64) -> TrackInfo {
    let position = track
        .albums
        .iter()
        .find(|album| album.id == album_id)
        .and_then(|album| album.track_position.as_ref());

    TrackInfo {
        id: TrackId(track.id),
        title: track.title.clone(),
        version: track.version.clone(),
        duration_secs: track.duration_ms.map(|ms| ms as f64 / 1000.0),
        volume: position.map(|position| position.volume).unwrap_or(1),
        index: position.map(|position| position.index).unwrap_or(1),
        artists: track.artists.iter().map(|artist| artist.name.clone()).collect(),
        short_description: track.short_description.clone(),
    }
}

fn convert_album(album: catalog_client::Album) -> AlbumInfo {
    let volumes = album
        .volumes
        .iter()
        .map(|volume| {
            volume
                .iter()
                .map(|track| convert_track(track, album.id))
                .collect()
        })
        .collect();

    AlbumInfo {
        id: AlbumId(album.id),
        title: album.title,
        version: album.version,
        year: album.year,
        release_date: album.release_date,
        genre: album.genre,
        cover_url: album.cover_uri.as_deref().map(cover_link),
        artists: album
            .artists
            .into_iter()
            .map(|artist| AlbumArtist {
                id: ArtistId(artist.id),
                name: artist.name,
                various: artist.various,
            })
            .collect(),
        track_count: album.track_count,
        volumes,
        description: album.description,
    }
}

#[async_trait]
impl CatalogService for CatalogClient {
    async fn search_artists(&self, query: &str) -> Result<Vec<ArtistHit>, CatalogServiceError> {
        let response = CatalogClient::search_artists(self, query).await?;

        Ok(response
            .artists
            .map(|page| page.results)
            .unwrap_or_default()
            .into_iter()
            .map(|artist| ArtistHit {
                id: ArtistId(artist.id),
                name: artist.name,
            })
            .collect())
    }

    async fn get_artist_direct_albums(
        &self,
        artist_id: &ArtistId,
        page_size: u32,
    ) -> Result<Vec<AlbumId>, CatalogServiceError> {
        let albums = self.artist_direct_albums(**artist_id, page_size).await?;

        Ok(albums.into_iter().map(|album| AlbumId(album.id)).collect())
    }

    async fn get_artist_cover_url(
        &self,
        artist_id: &ArtistId,
    ) -> Result<Option<String>, CatalogServiceError> {
        let info = self.artist_brief_info(**artist_id).await?;

        Ok(info
            .artist
            .cover
            .and_then(|cover| cover.uri)
            .map(|uri| cover_link(&uri)))
    }

    async fn get_album_with_tracks(
        &self,
        album_id: &AlbumId,
    ) -> Result<AlbumInfo, CatalogServiceError> {
        let album = self.album_with_tracks(**album_id).await?;

        Ok(convert_album(album))
    }

    async fn get_download_variants(
        &self,
        track_id: &TrackId,
    ) -> Result<Vec<DownloadVariant>, CatalogServiceError> {
        let variants = self.track_download_variants(**track_id).await?;

        Ok(variants
            .into_iter()
            .map(|variant| DownloadVariant {
                bitrate_kbps: variant.bitrate_in_kbps,
                url: variant.direct_link,
            })
            .collect())
    }

    async fn get_lyrics(&self, track_id: &TrackId) -> Result<Option<String>, CatalogServiceError> {
        Ok(self.track_lyrics(**track_id).await?)
    }

    async fn get_user_playlist(
        &self,
        owner: &str,
        kind: u64,
    ) -> Result<PlaylistInfo, CatalogServiceError> {
        let playlist = self.user_playlist(owner, kind).await?;

        let tracks = playlist
            .tracks
            .into_iter()
            .map(|entry| PlaylistTrackRef {
                track_id: TrackId(entry.track.id),
                album_id: entry.track.albums.first().map(|album| AlbumId(album.id)),
                title: entry.track.title.clone(),
                artist: entry
                    .track
                    .artists
                    .first()
                    .map(|artist| artist.name.clone())
                    .unwrap_or_default(),
                duration_secs: entry.track.duration_ms.map(|ms| ms as f64 / 1000.0),
            })
            .collect();

        Ok(PlaylistInfo {
            title: playlist.title,
            track_count: playlist.track_count,
            tracks,
        })
    }

    async fn download_to_file(&self, url: &str, dest: &Path) -> Result<(), CatalogServiceError> {
        Ok(CatalogClient::download_to_file(self, url, dest).await?)
    }

    async fn download_bytes(&self, url: &str) -> Result<Vec<u8>, CatalogServiceError> {
        Ok(CatalogClient::download_bytes(self, url).await?)
    }
}
