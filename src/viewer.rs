//! Viewer/editor: full-window view of one resource, with transient edit
//! state and the save / save-as-copy / delete flows.
//!
//! The preview always shows the live transformation URL; whenever the edit
//! choices change, the new URL is fetched on a worker thread and swapped in
//! once decoded.

use std::sync::mpsc;

use crate::cloudinary::{api::ApiClient, resource::Resource, url::transformation_url};
use crate::transform::{
    self, CanvasFit, CropPreset, EditState, Enhancement, Filter, Transformation,
};

enum ViewerEvent {
    Preview {
        url: String,
        image: Option<egui::ColorImage>,
    },
    Saved(Result<Resource, String>),
    SavedCopy(Result<Resource, String>),
    Deleted(Result<(), String>),
}

/// What the app shell should do after this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerOutcome {
    None,
    /// Navigate back to the gallery.
    Back,
    /// An in-place save completed; the store should be invalidated.
    Saved,
    /// A copy was stored; append it and navigate there.
    SavedCopy(Resource),
    /// The resource was deleted; invalidate and go back.
    Deleted,
}

pub struct Viewer {
    resource: Resource,
    edit: EditState,

    edit_open: bool,
    info_open: bool,
    confirm_delete: bool,

    saving: bool,
    deleting: bool,
    error: Option<String>,

    texture: Option<egui::TextureHandle>,
    texture_url: Option<String>,
    inflight_url: Option<String>,
    failed_url: Option<String>,

    tx: mpsc::SyncSender<ViewerEvent>,
    rx: mpsc::Receiver<ViewerEvent>,
}

impl Viewer {
    pub fn new(resource: Resource) -> Self {
        let (tx, rx) = mpsc::sync_channel(8);
        Self {
            resource,
            edit: EditState::default(),
            edit_open: false,
            info_open: false,
            confirm_delete: false,
            saving: false,
            deleting: false,
            error: None,
            texture: None,
            texture_url: None,
            inflight_url: None,
            failed_url: None,
            tx,
            rx,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Close every panel and dialog. Triggered by an outside click, an
    /// explicit cancel, or a completed save/delete.
    fn close_menus(&mut self) {
        self.edit_open = false;
        self.info_open = false;
        self.confirm_delete = false;
    }

    fn drain(&mut self, ctx: &egui::Context) -> ViewerOutcome {
        let mut outcome = ViewerOutcome::None;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                ViewerEvent::Preview { url, image } => {
                    self.inflight_url = None;
                    match image {
                        Some(img) => {
                            self.texture = Some(ctx.load_texture(
                                "viewer_preview",
                                img,
                                egui::TextureOptions::LINEAR,
                            ));
                            self.texture_url = Some(url);
                            self.failed_url = None;
                        }
                        None => {
                            self.failed_url = Some(url);
                        }
                    }
                }
                ViewerEvent::Saved(result) => {
                    self.saving = false;
                    match result {
                        Ok(resource) => {
                            tracing::info!(public_id = %resource.public_id, "saved in place");
                            self.resource = resource;
                            self.edit.reset();
                            self.close_menus();
                            // Same URL, new remote pixels: force a refetch.
                            self.texture_url = None;
                            outcome = ViewerOutcome::Saved;
                        }
                        Err(message) => {
                            tracing::warn!(%message, "save failed");
                            self.error = Some(message);
                        }
                    }
                }
                ViewerEvent::SavedCopy(result) => {
                    self.saving = false;
                    match result {
                        Ok(resource) => {
                            tracing::info!(public_id = %resource.public_id, "saved as copy");
                            self.edit.reset();
                            self.close_menus();
                            outcome = ViewerOutcome::SavedCopy(resource);
                        }
                        Err(message) => {
                            tracing::warn!(%message, "save as copy failed");
                            self.error = Some(message);
                        }
                    }
                }
                ViewerEvent::Deleted(result) => {
                    self.deleting = false;
                    match result {
                        Ok(()) => {
                            tracing::info!(public_id = %self.resource.public_id, "deleted");
                            self.close_menus();
                            outcome = ViewerOutcome::Deleted;
                        }
                        Err(message) => {
                            tracing::warn!(%message, "delete failed");
                            self.confirm_delete = false;
                            self.error = Some(message);
                        }
                    }
                }
            }
        }
        outcome
    }

    fn ensure_preview(&mut self, ctx: &egui::Context, api: &ApiClient, url: &str) {
        if self.inflight_url.is_some()
            || self.texture_url.as_deref() == Some(url)
            || self.failed_url.as_deref() == Some(url)
        {
            return;
        }
        self.inflight_url = Some(url.to_string());

        let url = url.to_string();
        let api = api.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let image = api.fetch_image(&url).ok();
            let _ = tx.send(ViewerEvent::Preview { url, image });
            ctx.request_repaint();
        });
    }

    fn start_save(&mut self, ctx: &egui::Context, api: &ApiClient, url: &str, in_place: bool) {
        if self.saving {
            return;
        }
        self.saving = true;
        self.error = None;

        let url = url.to_string();
        let public_id = self.resource.public_id.clone();
        let api = api.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let event = if in_place {
                ViewerEvent::Saved(
                    api.save_url(&url, Some(&public_id))
                        .map_err(|e| e.to_string()),
                )
            } else {
                ViewerEvent::SavedCopy(api.save_url(&url, None).map_err(|e| e.to_string()))
            };
            let _ = tx.send(event);
            ctx.request_repaint();
        });
    }

    fn start_delete(&mut self, ctx: &egui::Context, api: &ApiClient) {
        if self.deleting {
            return;
        }
        self.deleting = true;
        self.error = None;

        let public_id = self.resource.public_id.clone();
        let api = api.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = api.delete(&public_id).map_err(|e| e.to_string());
            let _ = tx.send(ViewerEvent::Deleted(result));
            ctx.request_repaint();
        });
    }

    pub fn show(&mut self, ctx: &egui::Context, api: &ApiClient, cloud_name: &str) -> ViewerOutcome {
        let outcome = self.drain(ctx);

        let transformation =
            Transformation::build(self.resource.width, self.resource.height, self.edit);
        let url = transformation_url(cloud_name, &self.resource.public_id, &transformation);
        self.ensure_preview(ctx, api, &url);

        let mut back = false;
        egui::TopBottomPanel::top("viewer_top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("← Back").clicked() {
                    back = true;
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("🗑").on_hover_text("Delete").clicked() {
                        self.confirm_delete = true;
                    }
                    if ui.button("ℹ").on_hover_text("Info").clicked() {
                        self.info_open = true;
                    }
                    if ui.button("✏").on_hover_text("Edit").clicked() {
                        self.edit_open = true;
                    }
                    if let Some(error) = &self.error {
                        ui.colored_label(ui.visuals().warn_fg_color, error);
                    }
                });
            });
        });
        if back && outcome == ViewerOutcome::None {
            return ViewerOutcome::Back;
        }

        self.show_delete_dialog(ctx, api);
        self.show_edit_panel(ctx, api, &transformation, &url);
        self.show_info_panel(ctx);
        self.show_canvas(ctx, &transformation, &url);

        outcome
    }

    fn show_delete_dialog(&mut self, ctx: &egui::Context, api: &ApiClient) {
        if !self.confirm_delete {
            return;
        }
        let mut open = true;
        let mut confirmed = false;
        egui::Window::new("Are you sure you want to delete?")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("This permanently removes the image from the library.");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    let label = if self.deleting { "Deleting..." } else { "Delete" };
                    let button = egui::Button::new(label).fill(ui.visuals().error_fg_color);
                    if ui.add_enabled(!self.deleting, button).clicked() {
                        confirmed = true;
                    }
                    if ui.button("Cancel").clicked() {
                        self.confirm_delete = false;
                    }
                });
            });
        if !open {
            // Canceling the dialog fires no network call.
            self.confirm_delete = false;
        }
        if confirmed {
            self.start_delete(ctx, api);
        }
    }

    fn show_edit_panel(
        &mut self,
        ctx: &egui::Context,
        api: &ApiClient,
        transformation: &Transformation,
        url: &str,
    ) {
        if !self.edit_open {
            return;
        }
        let mut save = None;
        egui::SidePanel::right("edit_panel")
            .min_width(240.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new("Enhancements").strong());
                        for option in Enhancement::ALL {
                            if ui
                                .selectable_label(self.edit.enhancement == option, option.label())
                                .clicked()
                            {
                                self.edit.enhancement = option;
                            }
                        }

                        ui.separator();
                        ui.label(egui::RichText::new("Crop & Resize").strong());
                        for option in CropPreset::ALL {
                            if ui
                                .selectable_label(self.edit.crop == option, option.label())
                                .clicked()
                            {
                                self.edit.crop = option;
                            }
                        }

                        ui.separator();
                        ui.label(egui::RichText::new("Filters").strong());
                        for option in Filter::ALL {
                            if ui
                                .selectable_label(self.edit.filter == option, option.label())
                                .clicked()
                            {
                                self.edit.filter = option;
                            }
                        }
                    });

                ui.separator();
                // Nothing to persist unless some parameter changed.
                let can_save = transformation.has_changes() && !self.saving;
                let save_label = if self.saving { "Saving..." } else { "Save" };
                if ui
                    .add_enabled(can_save, egui::Button::new(save_label))
                    .clicked()
                {
                    save = Some(true);
                }
                if ui
                    .add_enabled(can_save, egui::Button::new("Save as copy"))
                    .clicked()
                {
                    save = Some(false);
                }
                let dismiss = if transformation.has_changes() {
                    "Cancel"
                } else {
                    "Close"
                };
                if ui.button(dismiss).clicked() {
                    self.close_menus();
                    self.edit.reset();
                }
            });
        if let Some(in_place) = save {
            self.start_save(ctx, api, url, in_place);
        }
    }

    fn show_info_panel(&mut self, ctx: &egui::Context) {
        if !self.info_open {
            return;
        }
        let mut open = true;
        egui::Window::new("Info")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("info_grid")
                    .num_columns(2)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new("ID").weak());
                        ui.label(&self.resource.public_id);
                        ui.end_row();
                        ui.label(egui::RichText::new("Asset").weak());
                        ui.label(&self.resource.asset_id);
                        ui.end_row();
                        ui.label(egui::RichText::new("Size").weak());
                        ui.label(format!(
                            "{} × {}",
                            self.resource.width, self.resource.height
                        ));
                        ui.end_row();
                        ui.label(egui::RichText::new("URL").weak());
                        ui.label(&self.resource.secure_url);
                        ui.end_row();
                    });
            });
        if !open {
            self.info_open = false;
        }
    }

    fn show_canvas(&mut self, ctx: &egui::Context, transformation: &Transformation, url: &str) {
        let mut outside_click = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            let canvas = ui.max_rect();
            let resp = ui.interact(canvas, egui::Id::new("viewer_canvas"), egui::Sense::click());
            if resp.clicked() {
                outside_click = true;
            }

            if let Some(tex) = &self.texture {
                let tex_size = tex.size_vec2();
                let (ew, eh) = transformation.effective_size();
                // Landscape output fills the width; portrait and square fill
                // the height. Capped so the image never leaves the canvas.
                let scale = match transform::canvas_fit(ew, eh) {
                    CanvasFit::FitWidth => canvas.width() / tex_size.x,
                    CanvasFit::FitHeight => canvas.height() / tex_size.y,
                }
                .min(canvas.width() / tex_size.x)
                .min(canvas.height() / tex_size.y);
                let display = tex_size * scale;
                let offset = (canvas.size() - display) * 0.5;
                let draw_rect = egui::Rect::from_min_size(canvas.min + offset, display);
                ui.painter().image(
                    tex.id(),
                    draw_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
                // Dim the stale preview while the next one is in flight.
                if self.inflight_url.is_some() {
                    ui.painter()
                        .rect_filled(draw_rect, 0.0, egui::Color32::from_black_alpha(80));
                }
            } else if self.failed_url.as_deref() == Some(url) {
                ui.centered_and_justified(|ui| {
                    ui.label("⚠ Could not load the image");
                });
            } else {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            }
        });

        if outside_click {
            // A click on the canvas outside any panel closes everything.
            self.close_menus();
        }
    }
}
