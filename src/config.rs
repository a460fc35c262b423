use serde::Deserialize;

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30u64
}

fn default_download_attempts() -> u32 {
    3u32
}

fn default_download_retry_delay() -> u64 {
    1u64
}

fn default_queue_capacity() -> usize {
    32usize
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct CatalogCredentials {
    #[serde(rename = "catalog_token")]
    pub(crate) token: String,
    #[serde(rename = "catalog_endpoint")]
    pub(crate) endpoint: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Config {
    #[serde(default = "default_bind_address")]
    pub(crate) bind_address: String,
    #[serde(default = "default_shutdown_timeout")]
    pub(crate) shutdown_timeout: u64,
    pub(crate) telegram_bot_token: String,
    pub(crate) music_directory: String,
    pub(crate) audiobooks_directory: String,
    pub(crate) podcasts_directory: String,
    /// When set, playlist entries are rewritten from `music_directory` to
    /// this root so the playlist stays valid on the machine that mounts the
    /// library.
    #[serde(default)]
    pub(crate) playlist_mount_root: Option<String>,
    #[serde(default = "default_download_attempts")]
    pub(crate) download_attempts: u32,
    #[serde(default = "default_download_retry_delay")]
    pub(crate) download_retry_delay: u64,
    #[serde(default = "default_queue_capacity")]
    pub(crate) download_queue_capacity: usize,
    #[serde(flatten)]
    pub(crate) catalog: CatalogCredentials,
}

impl Config {
    pub(crate) fn from_env() -> Self {
        match envy::from_env::<Self>() {
            Ok(config) => config,
            Err(error) => panic!("Missing environment variable: {:#?}", error),
        }
    }
}
