use crate::types::{AlbumId, ArtistId, TrackId};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ArtistHit {
    pub(crate) id: ArtistId,
    pub(crate) name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AlbumArtist {
    pub(crate) id: ArtistId,
    pub(crate) name: String,
    pub(crate) various: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrackInfo {
    pub(crate) id: TrackId,
    pub(crate) title: String,
    pub(crate) version: Option<String>,
    pub(crate) duration_secs: Option<f64>,
    /// Disc number and per-disc index, both 1-based, as declared by the
    /// catalog.
    pub(crate) volume: u32,
    pub(crate) index: u32,
    pub(crate) artists: Vec<String>,
    pub(crate) short_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AlbumInfo {
    pub(crate) id: AlbumId,
    pub(crate) title: String,
    pub(crate) version: Option<String>,
    pub(crate) year: Option<u16>,
    pub(crate) release_date: Option<String>,
    pub(crate) genre: Option<String>,
    pub(crate) cover_url: Option<String>,
    pub(crate) artists: Vec<AlbumArtist>,
    pub(crate) track_count: u32,
    pub(crate) volumes: Vec<Vec<TrackInfo>>,
    pub(crate) description: Option<String>,
}

impl AlbumInfo {
    /// Year string used for tagging: the release date (date part only) when
    /// known, otherwise the bare year, otherwise empty.
    pub(crate) fn year_label(&self) -> String {
        if let Some(release_date) = &self.release_date {
            release_date.chars().take(10).collect()
        } else if let Some(year) = self.year {
            year.to_string()
        } else {
            String::new()
        }
    }

    pub(crate) fn is_various_artists(&self) -> bool {
        self.artists.first().map(|artist| artist.various).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DownloadVariant {
    pub(crate) bitrate_kbps: u32,
    pub(crate) url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlaylistTrackRef {
    pub(crate) track_id: TrackId,
    pub(crate) album_id: Option<AlbumId>,
    pub(crate) title: String,
    pub(crate) artist: String,
    pub(crate) duration_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlaylistInfo {
    pub(crate) title: String,
    pub(crate) track_count: u32,
    pub(crate) tracks: Vec<PlaylistTrackRef>,
}

/// Full set of metadata fields written into a downloaded file's tag
/// container. Optional fields are left out of the container entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TrackTags {
    pub(crate) title: String,
    pub(crate) album: Option<String>,
    pub(crate) disc_number: Option<u32>,
    pub(crate) disc_count: Option<u32>,
    pub(crate) track_number: Option<u32>,
    pub(crate) track_count: Option<u32>,
    pub(crate) genre: Option<String>,
    pub(crate) year: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) artist: String,
    pub(crate) album_artists: Vec<String>,
    pub(crate) lyrics: Option<String>,
    pub(crate) artwork: Option<Vec<u8>>,
}

/// Result of one per-item download attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TrackOutcome {
    Downloaded,
    /// The file was already present; existence is treated as proof of prior
    /// successful completion.
    AlreadyExists,
    /// Retries were exhausted; the pipeline continues with the next item.
    Skipped,
}
