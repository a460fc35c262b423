use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResultEnvelope<T> {
    pub(crate) result: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cover {
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub various: bool,
    #[serde(default)]
    pub cover: Option<Cover>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub artists: Option<SearchPage<Artist>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPosition {
    pub volume: u32,
    pub index: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackAlbum {
    pub id: u64,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub track_position: Option<TrackPosition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub albums: Vec<TrackAlbum>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub cover_uri: Option<String>,
    #[serde(default)]
    pub track_count: u32,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub volumes: Vec<Vec<Track>>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistBriefInfo {
    pub artist: Artist,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DirectAlbumsPage {
    #[serde(default)]
    pub(crate) albums: Vec<Album>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadVariant {
    pub bitrate_in_kbps: u32,
    pub direct_link: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Lyrics {
    #[serde(default)]
    pub(crate) full_lyrics: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTrack {
    pub track: Track,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub title: String,
    #[serde(default)]
    pub track_count: u32,
    #[serde(default)]
    pub tracks: Vec<PlaylistTrack>,
}
