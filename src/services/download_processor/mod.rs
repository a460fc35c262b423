mod processor;
mod traits;
mod types;

pub(crate) use processor::*;
pub(crate) use traits::*;
pub(crate) use types::*;

#[cfg(test)]
mod tests {
    use super::processor::DownloadProcessor;
    use super::traits::{CatalogService, CatalogServiceError, TagWriter, TagWriterError};
    use super::types::{
        AlbumArtist, AlbumInfo, ArtistHit, DownloadVariant, PlaylistInfo, PlaylistTrackRef,
        TrackInfo, TrackTags,
    };
    use crate::services::layout::LibraryLayout;
    use crate::services::retry::RetryPolicy;
    use crate::services::worker::{ContentKind, DownloadTask};
    use crate::types::{AlbumId, ArtistId, ChatId, RequestId, TrackId};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use uuid::Uuid;

    #[derive(Default)]
    struct CatalogServiceMock {
        artists: Vec<ArtistHit>,
        direct_albums: Vec<AlbumId>,
        albums: HashMap<u64, AlbumInfo>,
        playlist: Option<PlaylistInfo>,
        lyrics: HashMap<u64, String>,
        failing_tracks: HashSet<u64>,
        artist_cover_url: Option<String>,
        variant_calls: AtomicU32,
        download_calls: AtomicU32,
        bytes_calls: AtomicU32,
    }

    #[async_trait]
    impl CatalogService for CatalogServiceMock {
        async fn search_artists(&self, _query: &str) -> Result<Vec<ArtistHit>, CatalogServiceError> {
            Ok(self.artists.clone())
        }

        async fn get_artist_direct_albums(
            &self,
            _artist_id: &ArtistId,
            _page_size: u32,
        ) -> Result<Vec<AlbumId>, CatalogServiceError> {
            Ok(self.direct_albums.clone())
        }

        async fn get_artist_cover_url(
            &self,
            _artist_id: &ArtistId,
        ) -> Result<Option<String>, CatalogServiceError> {
            Ok(self.artist_cover_url.clone())
        }

        async fn get_album_with_tracks(
            &self,
            album_id: &AlbumId,
        ) -> Result<AlbumInfo, CatalogServiceError> {
            self.albums
                .get(&album_id.0)
                .cloned()
                .ok_or(CatalogServiceError::NotFound)
        }

        async fn get_download_variants(
            &self,
            track_id: &TrackId,
        ) -> Result<Vec<DownloadVariant>, CatalogServiceError> {
            self.variant_calls.fetch_add(1, Ordering::SeqCst);

            if self.failing_tracks.contains(&track_id.0) {
                return Err(CatalogServiceError::Unexpected(Box::new(
                    std::io::Error::new(std::io::ErrorKind::Other, "gateway unavailable"),
                )));
            }

            Ok(vec![
                DownloadVariant {
                    bitrate_kbps: 192,
                    url: format!("https://cdn.example.net/{}/low", track_id),
                },
                DownloadVariant {
                    bitrate_kbps: 320,
                    url: format!("https://cdn.example.net/{}/high", track_id),
                },
            ])
        }

        async fn get_lyrics(
            &self,
            track_id: &TrackId,
        ) -> Result<Option<String>, CatalogServiceError> {
            Ok(self.lyrics.get(&track_id.0).cloned())
        }

        async fn get_user_playlist(
            &self,
            _owner: &str,
            _kind: u64,
        ) -> Result<PlaylistInfo, CatalogServiceError> {
            self.playlist.clone().ok_or(CatalogServiceError::NotFound)
        }

        async fn download_to_file(
            &self,
            _url: &str,
            dest: &Path,
        ) -> Result<(), CatalogServiceError> {
            self.download_calls.fetch_add(1, Ordering::SeqCst);

            tokio::fs::write(dest, b"payload")
                .await
                .map_err(|error| CatalogServiceError::Unexpected(Box::new(error)))
        }

        async fn download_bytes(&self, _url: &str) -> Result<Vec<u8>, CatalogServiceError> {
            self.bytes_calls.fetch_add(1, Ordering::SeqCst);

            Ok(vec![0xFF, 0xD8, 0xFF])
        }
    }

    #[derive(Default)]
    struct TagWriterMock {
        written: Mutex<Vec<(PathBuf, TrackTags)>>,
    }

    #[async_trait]
    impl TagWriter for TagWriterMock {
        async fn write_tags(
            &self,
            file_path: &Path,
            tags: &TrackTags,
        ) -> Result<(), TagWriterError> {
            self.written
                .lock()
                .unwrap()
                .push((file_path.to_path_buf(), tags.clone()));

            Ok(())
        }
    }

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("library-bot-test-{}", Uuid::new_v4()))
    }

    fn layout(root: &Path) -> LibraryLayout {
        LibraryLayout::new(root.join("music"), root.join("books"), root.join("podcasts"))
    }

    fn processor(
        catalog: Arc<CatalogServiceMock>,
        tag_writer: Arc<TagWriterMock>,
        root: &Path,
    ) -> DownloadProcessor {
        DownloadProcessor::new(
            catalog,
            tag_writer,
            layout(root),
            RetryPolicy::new(2, Duration::ZERO),
            None,
        )
    }

    fn task(kind: ContentKind, argument: &str) -> DownloadTask {
        DownloadTask {
            id: RequestId::new(),
            kind,
            argument: argument.to_string(),
            requester: ChatId(1),
        }
    }

    fn track(id: u64, title: &str, volume: u32, index: u32) -> TrackInfo {
        TrackInfo {
            id: TrackId(id),
            title: title.to_string(),
            version: None,
            duration_secs: Some(180.0),
            volume,
            index,
            artists: vec!["Robert Miles".to_string()],
            short_description: None,
        }
    }

    fn two_disc_album() -> AlbumInfo {
        AlbumInfo {
            id: AlbumId(101),
            title: "Dreamland".to_string(),
            version: None,
            year: Some(1996),
            release_date: None,
            genre: Some("electronic".to_string()),
            cover_url: Some("https://covers.example.net/101".to_string()),
            artists: vec![AlbumArtist {
                id: ArtistId(7),
                name: "Robert Miles".to_string(),
                various: false,
            }],
            track_count: 5,
            volumes: vec![
                vec![
                    track(1, "Children", 1, 1),
                    track(2, "Fable", 1, 2),
                    track(3, "Fantasya", 1, 3),
                ],
                vec![track(4, "Landscape", 2, 1), track(5, "In My Dreams", 2, 2)],
            ],
            description: None,
        }
    }

    #[actix_rt::test]
    async fn should_download_album_discs_and_tracks_in_declared_order() {
        let root = temp_root();
        let catalog = Arc::new(CatalogServiceMock {
            albums: HashMap::from([(101, two_disc_album())]),
            ..CatalogServiceMock::default()
        });
        let tag_writer = Arc::new(TagWriterMock::default());
        let processor = processor(Arc::clone(&catalog), Arc::clone(&tag_writer), &root);

        let summary = processor
            .process_task(&task(ContentKind::Album, "101"))
            .await
            .unwrap();

        assert_eq!(summary, "Downloaded album Dreamland with 5 tracks.");

        let album_dir = root.join("music/Robert Miles/Dreamland (1996)");
        for name in [
            "1 - Children.mp3",
            "2 - Fable.mp3",
            "3 - Fantasya.mp3",
            "1 - Landscape.mp3",
            "2 - In My Dreams.mp3",
        ] {
            assert!(album_dir.join(name).exists(), "missing {}", name);
        }
        assert!(album_dir.join("cover.jpg").exists());

        let written = tag_writer.written.lock().unwrap();
        assert_eq!(written.len(), 5);
        assert!(written.iter().all(|(_, tags)| tags.disc_count == Some(2)));

        let disc_two_indices = written
            .iter()
            .filter(|(_, tags)| tags.disc_number == Some(2))
            .map(|(_, tags)| tags.track_number.unwrap())
            .collect::<Vec<_>>();
        assert_eq!(disc_two_indices, vec![1, 2]);

        let (_, first) = &written[0];
        assert_eq!(first.album.as_deref(), Some("Dreamland"));
        assert_eq!(first.genre.as_deref(), Some("electronic"));
        assert_eq!(first.year.as_deref(), Some("1996"));
        assert_eq!(first.artist, "Robert Miles");
        assert_eq!(first.artwork.as_deref(), Some(&[0xFF, 0xD8, 0xFF][..]));

        drop(written);
        std::fs::remove_dir_all(&root).ok();
    }

    #[actix_rt::test]
    async fn second_album_run_performs_no_fetch_or_tag_operations() {
        let root = temp_root();
        let catalog = Arc::new(CatalogServiceMock {
            albums: HashMap::from([(101, two_disc_album())]),
            ..CatalogServiceMock::default()
        });
        let tag_writer = Arc::new(TagWriterMock::default());
        let processor = processor(Arc::clone(&catalog), Arc::clone(&tag_writer), &root);

        processor
            .process_task(&task(ContentKind::Album, "101"))
            .await
            .unwrap();

        assert_eq!(catalog.variant_calls.load(Ordering::SeqCst), 5);
        assert_eq!(catalog.download_calls.load(Ordering::SeqCst), 5);
        assert_eq!(catalog.bytes_calls.load(Ordering::SeqCst), 1);
        assert_eq!(tag_writer.written.lock().unwrap().len(), 5);

        processor
            .process_task(&task(ContentKind::Album, "101"))
            .await
            .unwrap();

        assert_eq!(catalog.variant_calls.load(Ordering::SeqCst), 5);
        assert_eq!(catalog.download_calls.load(Ordering::SeqCst), 5);
        assert_eq!(catalog.bytes_calls.load(Ordering::SeqCst), 1);
        assert_eq!(tag_writer.written.lock().unwrap().len(), 5);

        std::fs::remove_dir_all(&root).ok();
    }

    #[actix_rt::test]
    async fn artist_cover_is_fetched_at_most_once_across_runs() {
        let root = temp_root();
        let catalog = Arc::new(CatalogServiceMock {
            albums: HashMap::from([(101, two_disc_album())]),
            artist_cover_url: Some("https://covers.example.net/artist/7".to_string()),
            ..CatalogServiceMock::default()
        });
        let tag_writer = Arc::new(TagWriterMock::default());
        let processor = processor(Arc::clone(&catalog), Arc::clone(&tag_writer), &root);

        processor
            .process_task(&task(ContentKind::Album, "101"))
            .await
            .unwrap();

        assert!(root.join("music/Robert Miles/artist.jpg").exists());
        // One fetch for the artist cover, one for the album cover.
        assert_eq!(catalog.bytes_calls.load(Ordering::SeqCst), 2);

        processor
            .process_task(&task(ContentKind::Album, "101"))
            .await
            .unwrap();

        assert_eq!(catalog.bytes_calls.load(Ordering::SeqCst), 2);

        std::fs::remove_dir_all(&root).ok();
    }

    #[actix_rt::test]
    async fn should_write_lyrics_into_tags_and_sibling_file() {
        let root = temp_root();
        let catalog = Arc::new(CatalogServiceMock {
            albums: HashMap::from([(101, two_disc_album())]),
            lyrics: HashMap::from([(1, "Hush, little baby".to_string())]),
            ..CatalogServiceMock::default()
        });
        let tag_writer = Arc::new(TagWriterMock::default());
        let processor = processor(Arc::clone(&catalog), Arc::clone(&tag_writer), &root);

        processor
            .process_task(&task(ContentKind::Album, "101"))
            .await
            .unwrap();

        let lyrics_file = root.join("music/Robert Miles/Dreamland (1996)/1 - Children.txt");
        assert_eq!(
            std::fs::read_to_string(lyrics_file).unwrap(),
            "Hush, little baby"
        );

        let written = tag_writer.written.lock().unwrap();
        let (_, children) = written
            .iter()
            .find(|(path, _)| path.ends_with("1 - Children.mp3"))
            .unwrap();
        assert_eq!(children.lyrics.as_deref(), Some("Hush, little baby"));

        drop(written);
        std::fs::remove_dir_all(&root).ok();
    }

    #[actix_rt::test]
    async fn should_report_not_found_for_unknown_artist() {
        let root = temp_root();
        let catalog = Arc::new(CatalogServiceMock::default());
        let tag_writer = Arc::new(TagWriterMock::default());
        let processor = processor(catalog, tag_writer, &root);

        let summary = processor
            .process_task(&task(ContentKind::Artist, "Unknown"))
            .await
            .unwrap();

        assert_eq!(summary, "Your request \"Unknown\" was not found.");

        std::fs::remove_dir_all(&root).ok();
    }

    #[actix_rt::test]
    async fn should_download_every_direct_album_of_an_artist() {
        let root = temp_root();
        let catalog = Arc::new(CatalogServiceMock {
            artists: vec![ArtistHit {
                id: ArtistId(7),
                name: "Robert Miles".to_string(),
            }],
            direct_albums: vec![AlbumId(101)],
            albums: HashMap::from([(101, two_disc_album())]),
            ..CatalogServiceMock::default()
        });
        let tag_writer = Arc::new(TagWriterMock::default());
        let processor = processor(Arc::clone(&catalog), Arc::clone(&tag_writer), &root);

        let summary = processor
            .process_task(&task(ContentKind::Artist, "robert miles"))
            .await
            .unwrap();

        assert_eq!(summary, "Downloaded artist Robert Miles with 1 albums.");
        assert_eq!(tag_writer.written.lock().unwrap().len(), 5);

        std::fs::remove_dir_all(&root).ok();
    }

    #[actix_rt::test]
    async fn playlist_skips_failed_track_but_keeps_order_and_declared_count() {
        let root = temp_root();

        let playlist = PlaylistInfo {
            title: "Evening".to_string(),
            track_count: 3,
            tracks: vec![
                PlaylistTrackRef {
                    track_id: TrackId(1),
                    album_id: Some(AlbumId(101)),
                    title: "Children".to_string(),
                    artist: "Robert Miles".to_string(),
                    duration_secs: Some(3.4),
                },
                PlaylistTrackRef {
                    track_id: TrackId(2),
                    album_id: Some(AlbumId(101)),
                    title: "Fable".to_string(),
                    artist: "Robert Miles".to_string(),
                    duration_secs: Some(10.0),
                },
                PlaylistTrackRef {
                    track_id: TrackId(3),
                    album_id: Some(AlbumId(101)),
                    title: "Fantasya".to_string(),
                    artist: "Robert Miles".to_string(),
                    duration_secs: Some(0.2),
                },
            ],
        };

        let catalog = Arc::new(CatalogServiceMock {
            albums: HashMap::from([(101, two_disc_album())]),
            playlist: Some(playlist),
            failing_tracks: HashSet::from([2]),
            ..CatalogServiceMock::default()
        });
        let tag_writer = Arc::new(TagWriterMock::default());
        let processor = processor(Arc::clone(&catalog), Arc::clone(&tag_writer), &root);

        let summary = processor
            .process_task(&task(ContentKind::Playlist, "some-user:1005"))
            .await
            .unwrap();

        assert_eq!(summary, "Downloaded playlist Evening with 3 tracks.");

        let rendered = std::fs::read_to_string(root.join("music/Evening.m3u")).unwrap();
        let entry_lines = rendered
            .lines()
            .filter(|line| line.starts_with("#EXTINF"))
            .collect::<Vec<_>>();

        assert_eq!(
            entry_lines,
            vec![
                "#EXTINF:4,Robert Miles - Children",
                "#EXTINF:1,Robert Miles - Fantasya",
            ]
        );
        assert!(rendered.contains("#EXT-X-ENDLIST"));
        assert!(!rendered.contains("Fable"));

        std::fs::remove_dir_all(&root).ok();
    }

    #[actix_rt::test]
    async fn playlist_entries_carry_mount_root_paths_when_configured() {
        let root = temp_root();

        let playlist = PlaylistInfo {
            title: "Evening".to_string(),
            track_count: 1,
            tracks: vec![PlaylistTrackRef {
                track_id: TrackId(1),
                album_id: Some(AlbumId(101)),
                title: "Children".to_string(),
                artist: "Robert Miles".to_string(),
                duration_secs: Some(3.4),
            }],
        };

        let catalog = Arc::new(CatalogServiceMock {
            albums: HashMap::from([(101, two_disc_album())]),
            playlist: Some(playlist),
            ..CatalogServiceMock::default()
        });
        let tag_writer = Arc::new(TagWriterMock::default());
        let processor = DownloadProcessor::new(
            Arc::clone(&catalog) as Arc<dyn CatalogService>,
            Arc::clone(&tag_writer) as Arc<dyn TagWriter>,
            layout(&root),
            RetryPolicy::new(2, Duration::ZERO),
            Some("/mnt/library".to_string()),
        );

        processor
            .process_task(&task(ContentKind::Playlist, "some-user:1005"))
            .await
            .unwrap();

        let rendered = std::fs::read_to_string(root.join("music/Evening.m3u")).unwrap();

        assert!(rendered
            .contains("/mnt/library/Robert Miles/Dreamland (1996)/1 - Children.mp3"));
        assert!(!rendered.contains(root.join("music").to_str().unwrap()));

        std::fs::remove_dir_all(&root).ok();
    }

    #[actix_rt::test]
    async fn should_download_audiobook_under_parsed_author_folder() {
        let root = temp_root();

        let book = AlbumInfo {
            id: AlbumId(202),
            title: "Tolkien. The Hobbit".to_string(),
            version: None,
            year: Some(1937),
            release_date: None,
            genre: Some("audiobook".to_string()),
            cover_url: Some("https://covers.example.net/202".to_string()),
            artists: vec![AlbumArtist {
                id: ArtistId(9),
                name: "Rob Inglis".to_string(),
                various: false,
            }],
            track_count: 2,
            volumes: vec![vec![track(21, "Part one", 1, 1), track(22, "Part two", 1, 2)]],
            description: Some("There and back again".to_string()),
        };

        let catalog = Arc::new(CatalogServiceMock {
            albums: HashMap::from([(202, book)]),
            ..CatalogServiceMock::default()
        });
        let tag_writer = Arc::new(TagWriterMock::default());
        let processor = processor(Arc::clone(&catalog), Arc::clone(&tag_writer), &root);

        let summary = processor
            .process_task(&task(ContentKind::Book, "202"))
            .await
            .unwrap();

        assert_eq!(summary, "Downloaded audiobook The Hobbit with 2 parts.");

        let book_dir = root.join("books/Tolkien/The Hobbit");
        assert!(book_dir.join("1 - Part one.mp3").exists());
        assert!(book_dir.join("2 - Part two.mp3").exists());
        assert!(book_dir.join("cover.jpg").exists());

        let written = tag_writer.written.lock().unwrap();
        assert!(written.iter().all(|(_, tags)| {
            tags.album.as_deref() == Some("The Hobbit")
                && tags.genre.as_deref() == Some("audiobook")
                && tags.year.as_deref() == Some("1937")
                && tags.comment.as_deref() == Some("There and back again")
        }));

        drop(written);
        std::fs::remove_dir_all(&root).ok();
    }

    #[actix_rt::test]
    async fn should_download_podcast_with_description_and_episode_prefixes() {
        let root = temp_root();

        let mut episode = track(31, "Pilot", 1, 1);
        episode.short_description = Some("The first one".to_string());

        let podcast = AlbumInfo {
            id: AlbumId(303),
            title: "Night Signal".to_string(),
            version: None,
            year: None,
            release_date: None,
            genre: None,
            cover_url: Some("https://covers.example.net/303".to_string()),
            artists: vec![],
            track_count: 1,
            volumes: vec![vec![episode]],
            description: Some("A show about radio".to_string()),
        };

        let catalog = Arc::new(CatalogServiceMock {
            albums: HashMap::from([(303, podcast)]),
            ..CatalogServiceMock::default()
        });
        let tag_writer = Arc::new(TagWriterMock::default());
        let processor = processor(Arc::clone(&catalog), Arc::clone(&tag_writer), &root);

        let summary = processor
            .process_task(&task(ContentKind::Podcast, "303"))
            .await
            .unwrap();

        assert_eq!(summary, "Downloaded podcast Night Signal with 1 episodes.");

        let podcast_dir = root.join("podcasts/Night Signal");
        assert!(podcast_dir.join("#1-1 - Pilot.mp3").exists());
        assert!(podcast_dir.join("cover.jpg").exists());
        assert_eq!(
            std::fs::read_to_string(podcast_dir.join("info.txt")).unwrap(),
            "A show about radio"
        );

        let written = tag_writer.written.lock().unwrap();
        let (_, tags) = &written[0];
        assert_eq!(tags.artist, "Night Signal");
        assert_eq!(tags.album_artists, vec!["Night Signal".to_string()]);
        assert_eq!(tags.comment.as_deref(), Some("The first one"));

        drop(written);
        std::fs::remove_dir_all(&root).ok();
    }
}
