mod app;
mod cloudinary;
mod collage;
mod config;
mod gallery;
mod store;
mod transform;
mod upload;
mod viewer;

use app::LightboxApp;
use config::{AppConfig, Settings};

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    let Some(settings) = Settings::resolve(&config) else {
        eprintln!(
            "lightbox: no cloud name configured. Set LIGHTBOX_CLOUD_NAME or add \
             `cloud_name` to the config file."
        );
        std::process::exit(2);
    };
    tracing::info!(
        cloud = %settings.cloud_name,
        tag = settings.library_tag.as_deref().unwrap_or("<none>"),
        api = %settings.api_base_url,
        "starting"
    );

    let width = config.window_width.unwrap_or(1200.0);
    let height = config.window_height.unwrap_or(800.0);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Lightbox")
            .with_app_id("lightbox")
            .with_inner_size([width, height]),
        ..Default::default()
    };

    eframe::run_native(
        "lightbox",
        native_options,
        Box::new(|_cc| Ok(Box::new(LightboxApp::new(config, settings)))),
    )
}
