use tracing::warn;

/// One completed download destined for playlist serialization.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlaylistEntry {
    pub(crate) path: String,
    pub(crate) title: String,
    pub(crate) duration_secs: Option<f64>,
}

/// Serializes an ordered sequence of entries into the extended M3U format.
///
/// The `#EXT-X-ENDLIST` marker is only emitted for a closed playlist; the
/// open variant is kept for streaming-style producers that append entries
/// over time.
pub(crate) struct PlaylistWriter {
    name: String,
    entries: Vec<PlaylistEntry>,
    closed: bool,
}

impl PlaylistWriter {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
            closed: false,
        }
    }

    pub(crate) fn push(&mut self, entry: PlaylistEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sum of the raw entry durations. Entries without a duration contribute
    /// zero.
    pub(crate) fn total_duration(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| match entry.duration_secs {
                Some(duration) => duration,
                None => {
                    warn!(title = %entry.title, "Playlist entry has no duration");
                    0.0
                }
            })
            .sum()
    }

    pub(crate) fn render(&self) -> String {
        let mut output = String::from("#EXTM3U\n");
        output.push_str(&format!("#PLAYLIST:{}\n", self.name));

        for entry in &self.entries {
            let duration = match entry.duration_secs {
                Some(duration) => duration.ceil() as u64,
                None => {
                    warn!(title = %entry.title, "Playlist entry has no duration");
                    0
                }
            };

            output.push_str(&format!(
                "#EXTINF:{},{}\n{}\n",
                duration, entry.title, entry.path
            ));
        }

        if self.closed {
            output.push_str("#EXT-X-ENDLIST\n");
        }

        output
    }
}
