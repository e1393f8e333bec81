use crate::cloudinary::api::ApiClient;
use crate::config::{AppConfig, Settings};
use crate::gallery::Gallery;
use crate::store::ResourceStore;
use crate::upload::UploadControl;
use crate::viewer::{Viewer, ViewerOutcome};

pub struct LightboxApp {
    config: AppConfig,
    settings: Settings,
    api: ApiClient,
    store: ResourceStore,
    gallery: Gallery,
    upload: UploadControl,
    /// `Some` while a single resource is open full-screen.
    viewer: Option<Viewer>,
}

impl LightboxApp {
    pub fn new(config: AppConfig, settings: Settings) -> Self {
        let api = ApiClient::new(&settings.api_base_url);
        let store = ResourceStore::new(settings.library_tag.clone());
        Self {
            config,
            settings,
            api,
            store,
            gallery: Gallery::new(),
            upload: UploadControl::new(),
            viewer: None,
        }
    }

    /// Drain every background channel. Runs each frame before routing so
    /// uploads and collage saves land in the store no matter which route is
    /// showing when they complete.
    fn poll_background(&mut self, ctx: &egui::Context) {
        self.store.poll();
        if let Some(resource) = self.upload.poll() {
            self.store.append(vec![resource]);
        }
        self.gallery.poll(ctx, &mut self.store);
    }

    fn show_gallery_route(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("app_top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Lightbox").strong());
                if let Some(tag) = &self.settings.library_tag {
                    ui.label(egui::RichText::new(tag).weak());
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.upload.button(ui, &self.api);
                    if let Some(error) = &self.upload.error {
                        ui.colored_label(ui.visuals().warn_fg_color, error);
                    }
                });
            });
        });

        if let Some(asset_id) = self
            .gallery
            .show(ctx, &mut self.store, &self.api, &self.settings.cloud_name)
        {
            if let Some(resource) = self.store.find_by_asset_id(&asset_id) {
                self.viewer = Some(Viewer::new(resource.clone()));
            }
        }
    }

    fn show_viewer_route(&mut self, ctx: &egui::Context) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        match viewer.show(ctx, &self.api, &self.settings.cloud_name) {
            ViewerOutcome::None => {}
            ViewerOutcome::Back => {
                self.viewer = None;
            }
            ViewerOutcome::Saved => {
                self.store.invalidate();
            }
            ViewerOutcome::SavedCopy(resource) => {
                self.store.append(vec![resource.clone()]);
                self.viewer = Some(Viewer::new(resource));
            }
            ViewerOutcome::Deleted => {
                self.store.invalidate();
                self.viewer = None;
            }
        }
    }
}

impl eframe::App for LightboxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Track window size for saving on exit.
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.config.window_width = Some(rect.width());
            self.config.window_height = Some(rect.height());
        }

        // Poll background work before rendering.
        self.poll_background(ctx);
        self.store.ensure_fresh(&self.api, ctx);

        if self.viewer.is_some() {
            self.show_viewer_route(ctx);
        } else {
            self.show_gallery_route(ctx);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.save();
    }
}

#[cfg(test)]
mod tests {
    use super::LightboxApp;
    use crate::cloudinary::resource::Resource;
    use crate::config::{AppConfig, Settings};
    use crate::viewer::Viewer;

    fn resource(public_id: &str) -> Resource {
        Resource {
            public_id: public_id.to_string(),
            asset_id: format!("asset-{public_id}"),
            width: 100,
            height: 100,
            secure_url: format!("https://x/{public_id}"),
        }
    }

    fn app() -> LightboxApp {
        let settings = Settings {
            cloud_name: "demo".to_string(),
            library_tag: None,
            api_base_url: "http://localhost:3000/api".to_string(),
        };
        LightboxApp::new(AppConfig::default(), settings)
    }

    #[test]
    fn upload_completions_land_while_the_viewer_is_open() {
        let ctx = egui::Context::default();
        let mut app = app();
        app.viewer = Some(Viewer::new(resource("open")));

        app.upload.push_result(Ok(resource("fresh")));
        app.poll_background(&ctx);

        assert_eq!(app.store.resources().len(), 1);
        assert_eq!(app.store.resources()[0].public_id, "fresh");
        assert!(app.viewer.is_some());
    }
}
