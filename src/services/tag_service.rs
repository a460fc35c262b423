use crate::services::download_processor::{TagWriter, TagWriterError, TrackTags};
use async_trait::async_trait;
use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::{Accessor, TagExt};
use lofty::tag::{ItemKey, Tag, TagType};
use std::path::Path;
use tracing::debug;

/// Writes ID3v2 tag containers into downloaded audio files.
pub(crate) struct TagService;

impl TagService {
    pub(crate) fn create() -> Self {
        Self
    }
}

#[async_trait]
impl TagWriter for TagService {
    async fn write_tags(&self, file_path: &Path, tags: &TrackTags) -> Result<(), TagWriterError> {
        debug!(file = %file_path.display(), title = %tags.title, "Writing tags");

        let mut tag = Tag::new(TagType::Id3v2);

        tag.set_title(tags.title.clone());
        tag.set_artist(tags.artist.clone());

        if let Some(album) = &tags.album {
            tag.set_album(album.clone());
        }

        if let Some(disc_number) = tags.disc_number {
            tag.set_disk(disc_number);
        }

        if let Some(disc_count) = tags.disc_count {
            tag.set_disk_total(disc_count);
        }

        if let Some(track_number) = tags.track_number {
            tag.set_track(track_number);
        }

        if let Some(track_count) = tags.track_count {
            tag.set_track_total(track_count);
        }

        if let Some(genre) = &tags.genre {
            tag.set_genre(genre.clone());
        }

        if let Some(comment) = &tags.comment {
            tag.set_comment(comment.clone());
        }

        if let Some(year) = &tags.year {
            tag.insert_text(ItemKey::Year, year.clone());
        }

        if !tags.album_artists.is_empty() {
            tag.insert_text(ItemKey::AlbumArtist, tags.album_artists.join("; "));
        }

        if let Some(lyrics) = &tags.lyrics {
            tag.insert_text(ItemKey::Lyrics, lyrics.clone());
        }

        if let Some(artwork) = &tags.artwork {
            tag.push_picture(Picture::new_unchecked(
                PictureType::CoverFront,
                Some(MimeType::Jpeg),
                None,
                artwork.clone(),
            ));
        }

        tag.save_to_path(file_path, WriteOptions::default())
            .map_err(|error| TagWriterError(Box::new(error)))?;

        Ok(())
    }
}
