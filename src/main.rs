use crate::config::Config;
use crate::services::download_processor::{CatalogService, DownloadProcessor, TagWriter};
use crate::services::layout::LibraryLayout;
use crate::services::retry::RetryPolicy;
use crate::services::tag_service::TagService;
use crate::services::telegram::TelegramClient;
use crate::services::worker::{
    run_delivery_worker, run_download_worker, ChatNotifier, DownloadTask, TaskResult,
};
use actix_rt::signal::unix;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use catalog_client::CatalogClient;
use futures_lite::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::channel;
use tracing::{error, info};

mod config;
mod http;
mod impls;
mod services;
mod types;

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    let mut terminate = unix::signal(unix::SignalKind::terminate())?;
    let mut interrupt = unix::signal(unix::SignalKind::interrupt())?;

    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    info!("Starting application...");

    let catalog_client = Arc::new(CatalogClient::create(
        config.catalog.endpoint.clone(),
        config.catalog.token.clone(),
    ));
    let telegram_client = Arc::new(TelegramClient::create(config.telegram_bot_token.clone()));
    let tag_service = Arc::new(TagService::create());

    let layout = LibraryLayout::new(
        config.music_directory.clone(),
        config.audiobooks_directory.clone(),
        config.podcasts_directory.clone(),
    );
    let retry_policy = RetryPolicy::new(
        config.download_attempts,
        Duration::from_secs(config.download_retry_delay),
    );

    let download_processor = Arc::new(DownloadProcessor::new(
        Arc::clone(&catalog_client) as Arc<dyn CatalogService>,
        tag_service as Arc<dyn TagWriter>,
        layout,
        retry_policy,
        config.playlist_mount_root.clone(),
    ));

    let (task_sender, task_receiver) = channel::<DownloadTask>(config.download_queue_capacity);
    let (result_sender, result_receiver) = channel::<TaskResult>(config.download_queue_capacity);

    actix_rt::spawn(run_download_worker(
        task_receiver,
        Arc::clone(&download_processor),
        result_sender,
    ));
    actix_rt::spawn(run_delivery_worker(
        result_receiver,
        Arc::clone(&telegram_client) as Arc<dyn ChatNotifier>,
    ));

    let shutdown_timeout = config.shutdown_timeout;
    let bind_address = config.bind_address.clone();

    let server = HttpServer::new({
        move || {
            App::new()
                .app_data(Data::new(task_sender.clone()))
                .service(
                    web::resource("/download").route(web::post().to(http::make_download_request)),
                )
                .service(web::resource("/health").route(web::get().to(http::readiness_check)))
        }
    })
    .shutdown_timeout(shutdown_timeout)
    .bind(bind_address)?
    .run();

    let server_handle = server.handle();

    actix_rt::spawn({
        async move {
            if let Err(error) = server.await {
                error!(?error, "Error on http server");
            }
        }
    });

    info!("Application started");

    interrupt.recv().or(terminate.recv()).await;

    info!("Received shutdown signal. Shutting down gracefully...");

    server_handle.stop(true).await;

    Ok(())
}
