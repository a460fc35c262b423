use crate::services::download_processor::traits::{
    CatalogService, CatalogServiceError, TagWriter, TagWriterError,
};
use crate::services::download_processor::types::{
    AlbumInfo, DownloadVariant, TrackInfo, TrackOutcome, TrackTags,
};
use crate::services::layout::{parse_book_title, LibraryLayout};
use crate::services::playlist_writer::{PlaylistEntry, PlaylistWriter};
use crate::services::retry::{RetryOutcome, RetryPolicy};
use crate::services::worker::{ContentKind, DownloadTask};
use crate::types::{AlbumId, TrackId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{create_dir_all, try_exists};
use tracing::{debug, error, info, warn};

const DIRECT_ALBUMS_PAGE_SIZE: u32 = 1000;
const COVER_FILE_NAME: &str = "cover.jpg";

#[derive(Debug, thiserror::Error)]
pub(crate) enum ProcessTaskError {
    #[error("Invalid request argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    CatalogError(#[from] CatalogServiceError),
    #[error(transparent)]
    TagWriterError(#[from] TagWriterError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

/// Executes one download task end to end: enumerates the content hierarchy,
/// drives the per-item fetch-and-tag sequence, and produces the summary
/// string delivered back to the requester.
pub(crate) struct DownloadProcessor {
    catalog: Arc<dyn CatalogService>,
    tag_writer: Arc<dyn TagWriter>,
    layout: LibraryLayout,
    retry: RetryPolicy,
    playlist_mount_root: Option<String>,
}

impl DownloadProcessor {
    pub(crate) fn new(
        catalog: Arc<dyn CatalogService>,
        tag_writer: Arc<dyn TagWriter>,
        layout: LibraryLayout,
        retry: RetryPolicy,
        playlist_mount_root: Option<String>,
    ) -> Self {
        Self {
            catalog,
            tag_writer,
            layout,
            retry,
            playlist_mount_root,
        }
    }

    pub(crate) async fn process_task(&self, task: &DownloadTask) -> Result<String, ProcessTaskError> {
        match task.kind {
            ContentKind::Artist => self.download_artist(&task.argument).await,
            ContentKind::Album => {
                let album_id = AlbumId(parse_numeric_argument(&task.argument)?);
                self.download_album(&album_id).await
            }
            ContentKind::Book => {
                let album_id = AlbumId(parse_numeric_argument(&task.argument)?);
                self.download_book(&album_id).await
            }
            ContentKind::Podcast => {
                let album_id = AlbumId(parse_numeric_argument(&task.argument)?);
                self.download_podcast(&album_id).await
            }
            ContentKind::Playlist => {
                let (owner, kind) = parse_playlist_argument(&task.argument)?;
                self.download_playlist(&owner, kind).await
            }
        }
    }

    /// Searches for an artist by free text and downloads every direct album.
    /// The first search result is authoritative; an empty result set is a
    /// normal completion carrying a "not found" message.
    async fn download_artist(&self, query: &str) -> Result<String, ProcessTaskError> {
        let hits = self.catalog.search_artists(query).await?;

        let artist = match hits.into_iter().next() {
            Some(artist) => artist,
            None => {
                info!(query, "Artist search produced no results");
                return Ok(format!("Your request \"{}\" was not found.", query));
            }
        };

        info!(artist_id = %artist.id, artist_name = %artist.name, "Starting artist download");

        let album_ids = self
            .catalog
            .get_artist_direct_albums(&artist.id, DIRECT_ALBUMS_PAGE_SIZE)
            .await?;
        let album_count = album_ids.len();

        for album_id in &album_ids {
            self.download_album(album_id).await?;
        }

        Ok(format!(
            "Downloaded artist {} with {} albums.",
            artist.name, album_count
        ))
    }

    /// Downloads an album disc by disc, track by track, in declared order.
    async fn download_album(&self, album_id: &AlbumId) -> Result<String, ProcessTaskError> {
        let album = self.catalog.get_album_with_tracks(album_id).await?;

        info!(album_id = %album.id, album_title = %album.title, "Starting album download");

        let (album_dir, cover, artist_name) = self.prepare_album(&album).await?;
        let disc_count = album.volumes.len() as u32;

        for (volume_number, volume) in album.volumes.iter().enumerate() {
            debug!(
                volume = volume_number + 1,
                volumes = album.volumes.len(),
                "Starting album volume"
            );

            for track in volume {
                let dest = self.layout.music_track_file(&album_dir, track.index, &track.title);
                let tags = build_music_tags(&album, track, artist_name.as_deref(), disc_count);

                self.fetch_track(&track.id, &dest, tags, cover.as_deref(), true)
                    .await?;
            }
        }

        Ok(format!(
            "Downloaded album {} with {} tracks.",
            album.title, album.track_count
        ))
    }

    /// Downloads an audiobook. The author is recovered from the catalog
    /// title; every part carries book-level genre/year tags.
    async fn download_book(&self, album_id: &AlbumId) -> Result<String, ProcessTaskError> {
        let book = self.catalog.get_album_with_tracks(album_id).await?;
        let book_title = parse_book_title(&book.title, book.version.as_deref());

        info!(
            book_id = %book.id,
            author = %book_title.author,
            title = %book_title.title,
            "Starting audiobook download"
        );

        let book_dir = self.layout.book_dir(&book_title);
        create_dir_all(&book_dir).await?;

        let cover = self
            .fetch_cover_once(&book_dir.join(COVER_FILE_NAME), book.cover_url.as_deref())
            .await?;

        let narrators = book
            .artists
            .iter()
            .map(|artist| artist.name.clone())
            .collect::<Vec<_>>()
            .join(", ");

        for volume in &book.volumes {
            for part in volume {
                let dest = self.layout.book_part_file(&book_dir, part.index, &part.title);
                let tags = TrackTags {
                    title: part.title.clone(),
                    album: Some(book_title.title.clone()),
                    disc_number: Some(part.volume),
                    disc_count: None,
                    track_number: Some(part.index),
                    track_count: Some(book.track_count),
                    genre: book.genre.clone(),
                    year: book.year.map(|year| year.to_string()),
                    comment: book.description.clone(),
                    artist: narrators.clone(),
                    album_artists: vec![narrators.clone()],
                    lyrics: None,
                    artwork: None,
                };

                self.fetch_track(&part.id, &dest, tags, cover.as_deref(), false)
                    .await?;
            }
        }

        Ok(format!(
            "Downloaded audiobook {} with {} parts.",
            book_title.title, book.track_count
        ))
    }

    /// Downloads a podcast: cover image and description file once, then
    /// every episode with an ordering-preserving filename prefix.
    async fn download_podcast(&self, podcast_id: &AlbumId) -> Result<String, ProcessTaskError> {
        let podcast = self.catalog.get_album_with_tracks(podcast_id).await?;

        info!(podcast_id = %podcast.id, title = %podcast.title, "Starting podcast download");

        let podcast_dir = self.layout.podcast_dir(&podcast.title);
        create_dir_all(&podcast_dir).await?;

        let cover = self
            .fetch_cover_once(&podcast_dir.join(COVER_FILE_NAME), podcast.cover_url.as_deref())
            .await?;

        if let Some(description) = &podcast.description {
            tokio::fs::write(podcast_dir.join("info.txt"), description).await?;
        }

        for volume in &podcast.volumes {
            for episode in volume {
                let dest = self.layout.podcast_episode_file(
                    &podcast_dir,
                    episode.volume,
                    episode.index,
                    &episode.title,
                );
                let tags = TrackTags {
                    title: episode.title.clone(),
                    album: None,
                    disc_number: Some(episode.volume),
                    disc_count: None,
                    track_number: Some(episode.index),
                    track_count: Some(podcast.track_count),
                    genre: None,
                    year: None,
                    comment: episode.short_description.clone(),
                    artist: podcast.title.clone(),
                    album_artists: vec![podcast.title.clone()],
                    lyrics: None,
                    artwork: None,
                };

                self.fetch_track(&episode.id, &dest, tags, cover.as_deref(), false)
                    .await?;
            }
        }

        Ok(format!(
            "Downloaded podcast {} with {} episodes.",
            podcast.title, podcast.track_count
        ))
    }

    /// Downloads every track of a user playlist into its own album folder
    /// and serializes the aggregate playlist file. Skipped tracks are left
    /// out of the playlist but do not fail the task.
    async fn download_playlist(&self, owner: &str, kind: u64) -> Result<String, ProcessTaskError> {
        let playlist = self.catalog.get_user_playlist(owner, kind).await?;

        info!(
            owner,
            kind,
            title = %playlist.title,
            tracks = playlist.tracks.len(),
            "Starting playlist download"
        );

        let mut writer = PlaylistWriter::new(&playlist.title);

        for entry in &playlist.tracks {
            let album_id = match entry.album_id {
                Some(album_id) => album_id,
                None => {
                    warn!(track_id = %entry.track_id, "Playlist track has no album, skipping");
                    continue;
                }
            };

            let album = match self.catalog.get_album_with_tracks(&album_id).await {
                Ok(album) => album,
                Err(error) => {
                    error!(%error, %album_id, "Unable to resolve album for playlist track");
                    continue;
                }
            };

            let track = match album
                .volumes
                .iter()
                .flatten()
                .find(|track| track.id == entry.track_id)
            {
                Some(track) => track.clone(),
                None => {
                    warn!(track_id = %entry.track_id, %album_id, "Track not listed in its album");
                    continue;
                }
            };

            let (album_dir, cover, artist_name) = self.prepare_album(&album).await?;
            let dest = self.layout.music_track_file(&album_dir, track.index, &track.title);
            let disc_count = album.volumes.len() as u32;
            let tags = build_music_tags(&album, &track, artist_name.as_deref(), disc_count);

            let outcome = self
                .fetch_track(&track.id, &dest, tags, cover.as_deref(), true)
                .await?;

            match outcome {
                TrackOutcome::Downloaded | TrackOutcome::AlreadyExists => {
                    writer.push(PlaylistEntry {
                        path: self.playlist_entry_path(&dest),
                        title: format!("{} - {}", entry.artist, entry.title),
                        duration_secs: entry.duration_secs,
                    });
                }
                TrackOutcome::Skipped => {
                    warn!(track_id = %entry.track_id, "Track skipped, left out of the playlist");
                }
            }
        }

        writer.close();

        let playlist_file = self.layout.playlist_file(&playlist.title);
        tokio::fs::write(&playlist_file, writer.render()).await?;

        info!(
            path = %playlist_file.display(),
            entries = writer.len(),
            total_duration = writer.total_duration(),
            "Playlist file written"
        );

        Ok(format!(
            "Downloaded playlist {} with {} tracks.",
            playlist.title, playlist.track_count
        ))
    }

    /// Downloads one media item and embeds its metadata.
    ///
    /// A file already present at `dest` is proof of prior completion: the
    /// download and tagging are skipped entirely. Persisting the tag
    /// container is the last step of the sequence.
    pub(crate) async fn fetch_track(
        &self,
        track_id: &TrackId,
        dest: &Path,
        mut tags: TrackTags,
        artwork: Option<&[u8]>,
        with_lyrics: bool,
    ) -> Result<TrackOutcome, ProcessTaskError> {
        if try_exists(dest).await? {
            debug!(path = %dest.display(), "Track already exists, skipping");
            return Ok(TrackOutcome::AlreadyExists);
        }

        let variants = match self
            .retry
            .run("resolve download variants", || {
                self.catalog.get_download_variants(track_id)
            })
            .await
        {
            RetryOutcome::Ok(variants) => variants,
            RetryOutcome::SkippedAfterRetries => return Ok(TrackOutcome::Skipped),
        };

        let variant = match pick_best_variant(variants) {
            Some(variant) => variant,
            None => {
                warn!(%track_id, "No download variants available");
                return Ok(TrackOutcome::Skipped);
            }
        };

        debug!(%track_id, bitrate = variant.bitrate_kbps, "Selected download variant");

        let variant_url = variant.url.as_str();
        let downloaded = self
            .retry
            .run("download track payload", || async move {
                let result = self.catalog.download_to_file(variant_url, dest).await;

                // A partial file must not satisfy the existence check on a
                // later run.
                if result.is_err() {
                    let _ = tokio::fs::remove_file(dest).await;
                }

                result
            })
            .await;

        if matches!(downloaded, RetryOutcome::SkippedAfterRetries) {
            return Ok(TrackOutcome::Skipped);
        }

        if with_lyrics {
            tags.lyrics = match self.catalog.get_lyrics(track_id).await {
                Ok(lyrics) => lyrics,
                Err(error) => {
                    error!(%error, %track_id, "Unable to fetch lyrics");
                    None
                }
            };

            if let Some(lyrics) = &tags.lyrics {
                tokio::fs::write(dest.with_extension("txt"), lyrics).await?;
            }
        }

        tags.artwork = artwork.map(|bytes| bytes.to_vec());

        self.tag_writer.write_tags(dest, &tags).await?;

        info!(path = %dest.display(), "Track downloaded and tagged");

        Ok(TrackOutcome::Downloaded)
    }

    /// Resolves the album folder, creates it, and fetches the album (and,
    /// for a named artist, the artist) cover. Returns the folder, the cover
    /// bytes for artwork embedding, and the primary artist name when the
    /// album is not a compilation.
    async fn prepare_album(
        &self,
        album: &AlbumInfo,
    ) -> Result<(PathBuf, Option<Vec<u8>>, Option<String>), ProcessTaskError> {
        let (album_dir, artist_name) = if album.is_various_artists() || album.artists.is_empty() {
            (
                self.layout.various_artists_album_dir(&album.title, album.year),
                None,
            )
        } else {
            let artist = &album.artists[0];
            let artist_dir = self.layout.artist_dir(&artist.name);
            create_dir_all(&artist_dir).await?;

            let artist_cover_file = self.layout.artist_cover_file(&artist.name);
            if !try_exists(&artist_cover_file).await? {
                match self.catalog.get_artist_cover_url(&artist.id).await {
                    Ok(Some(url)) => {
                        let url = url.as_str();
                        if let Some(bytes) = self
                            .retry
                            .run("fetch artist cover", || self.catalog.download_bytes(url))
                            .await
                            .into_option()
                        {
                            tokio::fs::write(&artist_cover_file, bytes).await?;
                        }
                    }
                    Ok(None) => {}
                    Err(error) => {
                        warn!(%error, artist_id = %artist.id, "Unable to resolve artist cover")
                    }
                }
            }

            (
                self.layout.album_dir(&artist.name, &album.title, album.year),
                Some(artist.name.clone()),
            )
        };

        create_dir_all(&album_dir).await?;

        let cover = self
            .fetch_cover_once(&album_dir.join(COVER_FILE_NAME), album.cover_url.as_deref())
            .await?;

        Ok((album_dir, cover, artist_name))
    }

    /// Reads the cover from disk when it was fetched on an earlier run,
    /// otherwise downloads and stores it. Retry exhaustion degrades to "no
    /// cover" rather than failing the task.
    async fn fetch_cover_once(
        &self,
        cover_file: &Path,
        cover_url: Option<&str>,
    ) -> Result<Option<Vec<u8>>, ProcessTaskError> {
        if try_exists(cover_file).await? {
            return Ok(Some(tokio::fs::read(cover_file).await?));
        }

        let url = match cover_url {
            Some(url) => url,
            None => return Ok(None),
        };

        match self
            .retry
            .run("fetch cover image", || self.catalog.download_bytes(url))
            .await
        {
            RetryOutcome::Ok(bytes) => {
                tokio::fs::write(cover_file, &bytes).await?;
                Ok(Some(bytes))
            }
            RetryOutcome::SkippedAfterRetries => Ok(None),
        }
    }

    fn playlist_entry_path(&self, path: &Path) -> String {
        mount_adjusted_path(
            path,
            self.layout.music_dir(),
            self.playlist_mount_root.as_deref(),
        )
    }
}

/// Rewrites a path under the music root to the configured mount root so the
/// playlist stays valid on the machine that mounts the library. Paths outside
/// the music root are kept as they are.
fn mount_adjusted_path(path: &Path, music_dir: &Path, mount_root: Option<&str>) -> String {
    if let Some(mount_root) = mount_root {
        if let Ok(relative) = path.strip_prefix(music_dir) {
            return Path::new(mount_root)
                .join(relative)
                .to_string_lossy()
                .into_owned();
        }
    }

    path.to_string_lossy().into_owned()
}

fn build_music_tags(
    album: &AlbumInfo,
    track: &TrackInfo,
    artist_name: Option<&str>,
    disc_count: u32,
) -> TrackTags {
    let year_label = album.year_label();

    let album_title = match &album.version {
        Some(version) => format!("{} {}", album.title, version),
        None => album.title.clone(),
    };

    let comment = match &track.version {
        Some(version) => format!("{} / Release date {}", version, year_label),
        None => format!("Release date {}", year_label),
    };

    let artist = artist_name
        .map(str::to_string)
        .or_else(|| track.artists.first().cloned())
        .unwrap_or_default();

    TrackTags {
        title: track.title.clone(),
        album: Some(album_title),
        disc_number: Some(track.volume),
        disc_count: Some(disc_count),
        track_number: Some(track.index),
        track_count: Some(album.track_count),
        genre: album.genre.clone(),
        year: Some(year_label),
        comment: Some(comment),
        artist,
        album_artists: album.artists.iter().map(|artist| artist.name.clone()).collect(),
        lyrics: None,
        artwork: None,
    }
}

/// Highest bitrate wins; the sort is stable, so equal bitrates keep the
/// gateway's order and the first returned variant is selected.
fn pick_best_variant(mut variants: Vec<DownloadVariant>) -> Option<DownloadVariant> {
    variants.sort_by(|a, b| b.bitrate_kbps.cmp(&a.bitrate_kbps));
    variants.into_iter().next()
}

fn parse_numeric_argument(argument: &str) -> Result<u64, ProcessTaskError> {
    // Requests often arrive as pasted catalog links; only the digits matter.
    let digits = argument
        .chars()
        .filter(|ch| ch.is_ascii_digit())
        .collect::<String>();

    digits
        .parse()
        .map_err(|_| ProcessTaskError::InvalidArgument(argument.to_string()))
}

fn parse_playlist_argument(argument: &str) -> Result<(String, u64), ProcessTaskError> {
    let (owner, kind) = argument
        .split_once(':')
        .ok_or_else(|| ProcessTaskError::InvalidArgument(argument.to_string()))?;

    Ok((owner.trim().to_string(), parse_numeric_argument(kind)?))
}

#[cfg(test)]
mod step_tests {
    use super::{
        mount_adjusted_path, parse_numeric_argument, parse_playlist_argument, pick_best_variant,
    };
    use crate::services::download_processor::types::DownloadVariant;
    use std::path::Path;

    fn variant(bitrate_kbps: u32, url: &str) -> DownloadVariant {
        DownloadVariant {
            bitrate_kbps,
            url: url.to_string(),
        }
    }

    #[test]
    fn should_pick_highest_bitrate_variant() {
        let best = pick_best_variant(vec![
            variant(192, "low"),
            variant(320, "high"),
            variant(128, "lowest"),
        ]);

        assert_eq!(best.unwrap().url, "high");
    }

    #[test]
    fn should_keep_gateway_order_on_equal_bitrate() {
        let best = pick_best_variant(vec![variant(320, "first"), variant(320, "second")]);

        assert_eq!(best.unwrap().url, "first");
    }

    #[test]
    fn should_return_none_for_empty_variants() {
        assert_eq!(pick_best_variant(vec![]), None);
    }

    #[test]
    fn should_extract_digits_from_pasted_links() {
        let id = parse_numeric_argument("https://music.example.net/album/1234567").unwrap();

        assert_eq!(id, 1234567);
    }

    #[test]
    fn should_reject_argument_without_digits() {
        assert!(parse_numeric_argument("not a link").is_err());
    }

    #[test]
    fn should_split_playlist_argument_at_colon() {
        let (owner, kind) = parse_playlist_argument("some-user:1005").unwrap();

        assert_eq!(owner, "some-user");
        assert_eq!(kind, 1005);
    }

    #[test]
    fn should_reject_playlist_argument_without_owner() {
        assert!(parse_playlist_argument("1005").is_err());
    }

    #[test]
    fn should_rewrite_music_root_to_mount_root() {
        let path = mount_adjusted_path(
            Path::new("/library/music/Robert Miles/Dreamland (1996)/1 - Children.mp3"),
            Path::new("/library/music"),
            Some("/mnt/library"),
        );

        assert_eq!(
            path,
            "/mnt/library/Robert Miles/Dreamland (1996)/1 - Children.mp3"
        );
    }

    #[test]
    fn should_keep_paths_outside_music_root_unchanged() {
        let path = mount_adjusted_path(
            Path::new("/elsewhere/1 - Children.mp3"),
            Path::new("/library/music"),
            Some("/mnt/library"),
        );

        assert_eq!(path, "/elsewhere/1 - Children.mp3");
    }

    #[test]
    fn should_keep_paths_as_they_are_without_mount_root() {
        let path = mount_adjusted_path(
            Path::new("/library/music/A/B/1 - T.mp3"),
            Path::new("/library/music"),
            None,
        );

        assert_eq!(path, "/library/music/A/B/1 - T.mp3");
    }
}
