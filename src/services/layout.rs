use std::path::{Path, PathBuf};

/// Characters that are unsafe in path segments on the supported filesystems.
const UNSAFE_PATH_CHARS: &str = "#<$+%>!`&*'|?{}\"=/:\\@";

const VARIOUS_ARTISTS_FOLDER: &str = "Various artist";
const COLLECTIONS_AUTHOR: &str = "Collections";

const MUSIC_TITLE_LIMIT: usize = 80;
const BOOK_TITLE_LIMIT: usize = 50;

/// Strips every blacklisted character from a title so it can be used as a
/// path segment. Pure: the same input always maps to the same segment.
pub(crate) fn sanitize_path_segment(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !UNSAFE_PATH_CHARS.contains(*ch))
        .collect()
}

fn truncate_chars(raw: &str, limit: usize) -> String {
    raw.chars().take(limit).collect()
}

/// Author and title of an audiobook, recovered from the catalog's combined
/// title string.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BookTitle {
    pub(crate) author: String,
    pub(crate) title: String,
}

/// Splits an audiobook catalog title into author and book title at the first
/// `.` or `—`. Titles without a delimiter fall into a generic "Collections"
/// author bucket. Known to be a heuristic; kept for compatibility with the
/// existing library layout.
pub(crate) fn parse_book_title(raw_title: &str, version: Option<&str>) -> BookTitle {
    for (position, ch) in raw_title.char_indices() {
        if ch == '.' || ch == '—' {
            let author = raw_title[..position].trim().to_string();
            let rest = raw_title[position + ch.len_utf8()..].trim();
            let title = match version {
                Some(version) => format!("{} ({})", rest, version),
                None => rest.to_string(),
            };

            return BookTitle { author, title };
        }
    }

    BookTitle {
        author: COLLECTIONS_AUTHOR.to_string(),
        title: raw_title.to_string(),
    }
}

fn album_folder_name(album_title: &str, year: Option<u16>) -> String {
    let title = sanitize_path_segment(album_title);

    match year {
        Some(year) => format!("{} ({})", title, year),
        None => title,
    }
}

/// Maps catalog entities to canonical locations under the music, audiobook,
/// and podcast roots.
#[derive(Clone, Debug)]
pub(crate) struct LibraryLayout {
    music_dir: PathBuf,
    audiobooks_dir: PathBuf,
    podcasts_dir: PathBuf,
}

impl LibraryLayout {
    pub(crate) fn new(
        music_dir: impl Into<PathBuf>,
        audiobooks_dir: impl Into<PathBuf>,
        podcasts_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            music_dir: music_dir.into(),
            audiobooks_dir: audiobooks_dir.into(),
            podcasts_dir: podcasts_dir.into(),
        }
    }

    pub(crate) fn music_dir(&self) -> &Path {
        &self.music_dir
    }

    pub(crate) fn artist_dir(&self, artist_name: &str) -> PathBuf {
        self.music_dir.join(sanitize_path_segment(artist_name))
    }

    pub(crate) fn artist_cover_file(&self, artist_name: &str) -> PathBuf {
        self.artist_dir(artist_name).join("artist.jpg")
    }

    pub(crate) fn album_dir(&self, artist_name: &str, album_title: &str, year: Option<u16>) -> PathBuf {
        self.artist_dir(artist_name)
            .join(album_folder_name(album_title, year))
    }

    pub(crate) fn various_artists_album_dir(&self, album_title: &str, year: Option<u16>) -> PathBuf {
        self.music_dir
            .join(VARIOUS_ARTISTS_FOLDER)
            .join(album_folder_name(album_title, year))
    }

    pub(crate) fn music_track_file(&self, album_dir: &Path, index: u32, title: &str) -> PathBuf {
        let short_title = sanitize_path_segment(&truncate_chars(title, MUSIC_TITLE_LIMIT));

        album_dir.join(format!("{} - {}.mp3", index, short_title))
    }

    pub(crate) fn book_dir(&self, book: &BookTitle) -> PathBuf {
        let folder_title = if book.title.chars().count() > BOOK_TITLE_LIMIT {
            format!("{}...", truncate_chars(&book.title, BOOK_TITLE_LIMIT))
        } else {
            book.title.clone()
        };

        self.audiobooks_dir
            .join(sanitize_path_segment(&book.author))
            .join(sanitize_path_segment(&folder_title))
    }

    pub(crate) fn book_part_file(&self, book_dir: &Path, index: u32, title: &str) -> PathBuf {
        let part_name = sanitize_path_segment(title);
        let file_title = if title.chars().count() > BOOK_TITLE_LIMIT {
            let chars = part_name.chars().collect::<Vec<_>>();
            let head = chars.iter().take(20).collect::<String>();
            let tail = chars.iter().skip(chars.len().saturating_sub(20)).collect::<String>();

            format!("{}...{}", head, tail)
        } else {
            part_name
        };

        book_dir.join(format!("{} - {}.mp3", index, file_title))
    }

    pub(crate) fn podcast_dir(&self, podcast_title: &str) -> PathBuf {
        self.podcasts_dir.join(sanitize_path_segment(podcast_title))
    }

    pub(crate) fn podcast_episode_file(
        &self,
        podcast_dir: &Path,
        volume: u32,
        index: u32,
        title: &str,
    ) -> PathBuf {
        // The `#<volume>-<index>` prefix keeps episodes ordered in a plain
        // lexicographic file listing.
        podcast_dir.join(format!(
            "#{}-{} - {}.mp3",
            volume,
            index,
            sanitize_path_segment(title)
        ))
    }

    pub(crate) fn playlist_file(&self, playlist_name: &str) -> PathBuf {
        self.music_dir
            .join(format!("{}.m3u", sanitize_path_segment(playlist_name)))
    }
}
