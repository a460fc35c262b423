mod download_request;
mod health;

pub(crate) use download_request::make_download_request;
pub(crate) use health::readiness_check;
