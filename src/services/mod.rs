pub(crate) mod download_processor;
pub(crate) mod layout;
pub(crate) mod playlist_writer;
pub(crate) mod retry;
pub(crate) mod tag_service;
pub(crate) mod telegram;
pub(crate) mod worker;
