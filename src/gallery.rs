//! Gallery view: the selectable grid over the resource store, plus the
//! collage creation flow.

use std::collections::HashMap;
use std::sync::mpsc;

use crate::cloudinary::{api::ApiClient, resource::Resource, url::thumbnail_url};
use crate::collage;
use crate::store::{LoadState, ResourceStore};

const CELL: f32 = 170.0;
const THUMB_SIZE: u32 = 300;

enum ThumbState {
    Loading,
    Ready(egui::TextureHandle),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationState {
    Created,
    Saving,
}

/// A composed but not yet persisted collage, shown in the confirmation
/// dialog. Discarded without side effects if the dialog is closed.
pub struct Creation {
    pub state: CreationState,
    pub url: String,
    pub error: Option<String>,
    preview: Option<egui::TextureHandle>,
    preview_failed: bool,
}

enum GalleryEvent {
    Thumb {
        public_id: String,
        image: Option<egui::ColorImage>,
    },
    CreationPreview {
        url: String,
        image: Option<egui::ColorImage>,
    },
    CreationSaved(Result<Resource, String>),
}

pub struct Gallery {
    /// Selected public ids in the order they were checked. Insertion order
    /// determines collage slot assignment.
    selected: Vec<String>,
    creation: Option<Creation>,
    thumbnails: HashMap<String, ThumbState>,
    status: Option<String>,
    tx: mpsc::SyncSender<GalleryEvent>,
    rx: mpsc::Receiver<GalleryEvent>,
}

impl Gallery {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::sync_channel(64);
        Self {
            selected: Vec::new(),
            creation: None,
            thumbnails: HashMap::new(),
            status: None,
            tx,
            rx,
        }
    }

    pub fn selection(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selecting(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Toggle one tile in or out of the selection, preserving the insertion
    /// order of everything else.
    fn set_selected(&mut self, public_id: &str, selected: bool) {
        if selected {
            if !self.selected.iter().any(|id| id == public_id) {
                self.selected.push(public_id.to_string());
            }
        } else {
            self.selected.retain(|id| id != public_id);
        }
    }

    fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Drain background results, applying a completed creation save to the
    /// store. Runs every frame regardless of which route is showing, so a
    /// save that finishes while the viewer is open still lands.
    pub fn poll(&mut self, ctx: &egui::Context, store: &mut ResourceStore) {
        if let Some(resource) = self.drain(ctx) {
            self.finish_creation(store, resource);
        }
    }

    /// Confirmed creation: exactly one store append, then both the pending
    /// creation and the selection are cleared.
    fn finish_creation(&mut self, store: &mut ResourceStore, resource: Resource) {
        store.append(vec![resource]);
        self.creation = None;
        self.clear_selection();
    }

    /// Drain background results. Returns a freshly saved creation resource
    /// for `poll` to append to the store.
    fn drain(&mut self, ctx: &egui::Context) -> Option<Resource> {
        let mut saved = None;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                GalleryEvent::Thumb { public_id, image } => {
                    let state = match image {
                        Some(img) => ThumbState::Ready(ctx.load_texture(
                            format!("thumb_{public_id}"),
                            img,
                            egui::TextureOptions::LINEAR,
                        )),
                        None => ThumbState::Failed,
                    };
                    self.thumbnails.insert(public_id, state);
                }
                GalleryEvent::CreationPreview { url, image } => {
                    if let Some(creation) = &mut self.creation {
                        if creation.url == url {
                            match image {
                                Some(img) => {
                                    creation.preview = Some(ctx.load_texture(
                                        "creation_preview",
                                        img,
                                        egui::TextureOptions::LINEAR,
                                    ));
                                }
                                None => creation.preview_failed = true,
                            }
                        }
                    }
                }
                GalleryEvent::CreationSaved(result) => match result {
                    Ok(resource) => {
                        tracing::info!(public_id = %resource.public_id, "creation saved");
                        saved = Some(resource);
                    }
                    Err(message) => {
                        tracing::warn!(%message, "creation save failed");
                        if let Some(creation) = &mut self.creation {
                            creation.state = CreationState::Created;
                            creation.error = Some(message);
                        }
                    }
                },
            }
        }
        saved
    }

    fn queue_missing_thumbs(
        &mut self,
        ctx: &egui::Context,
        api: &ApiClient,
        cloud_name: &str,
        resources: &[Resource],
    ) {
        for resource in resources {
            if self.thumbnails.contains_key(&resource.public_id) {
                continue;
            }
            self.thumbnails
                .insert(resource.public_id.clone(), ThumbState::Loading);

            let public_id = resource.public_id.clone();
            let url = thumbnail_url(cloud_name, &public_id, THUMB_SIZE);
            let api = api.clone();
            let tx = self.tx.clone();
            let ctx = ctx.clone();
            std::thread::spawn(move || {
                let image = api.fetch_image(&url).ok();
                let _ = tx.send(GalleryEvent::Thumb { public_id, image });
                ctx.request_repaint();
            });
        }
    }

    fn create_collage(&mut self, ctx: &egui::Context, api: &ApiClient, cloud_name: &str) {
        match collage::compose(&self.selected, cloud_name, collage::now_version()) {
            Ok(url) => {
                self.status = None;
                self.spawn_preview_fetch(ctx, api, &url);
                self.creation = Some(Creation {
                    state: CreationState::Created,
                    url,
                    error: None,
                    preview: None,
                    preview_failed: false,
                });
            }
            Err(e) => {
                self.status = Some(e.to_string());
            }
        }
    }

    fn spawn_preview_fetch(&self, ctx: &egui::Context, api: &ApiClient, url: &str) {
        let url = url.to_string();
        let api = api.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let image = api.fetch_image(&url).ok();
            let _ = tx.send(GalleryEvent::CreationPreview { url, image });
            ctx.request_repaint();
        });
    }

    fn start_creation_save(&mut self, ctx: &egui::Context, api: &ApiClient) {
        let Some(creation) = &mut self.creation else {
            return;
        };
        if creation.state == CreationState::Saving {
            return;
        }
        creation.state = CreationState::Saving;
        creation.error = None;

        let url = creation.url.clone();
        let api = api.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            // Warm the derived URL first so the CDN has rendered the
            // composite before the endpoint stores it.
            let result = api
                .warm(&url)
                .and_then(|_| api.save_url(&url, None))
                .map_err(|e| e.to_string());
            let _ = tx.send(GalleryEvent::CreationSaved(result));
            ctx.request_repaint();
        });
    }

    /// Render the gallery. Returns the asset id of a tile clicked open.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        store: &mut ResourceStore,
        api: &ApiClient,
        cloud_name: &str,
    ) -> Option<String> {
        self.queue_missing_thumbs(ctx, api, cloud_name, store.resources());
        self.show_selection_bar(ctx, api, cloud_name);
        self.show_creation_dialog(ctx, api);
        self.show_grid(ctx, store)
    }

    fn show_selection_bar(&mut self, ctx: &egui::Context, api: &ApiClient, cloud_name: &str) {
        if !self.is_selecting() {
            return;
        }
        egui::TopBottomPanel::top("selection_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("✕").on_hover_text("Clear selection").clicked() {
                    self.clear_selection();
                    return;
                }
                ui.label(format!("{} selected", self.selected.len()));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let can_compose = self.selected.len() >= 2;
                    if ui
                        .add_enabled(can_compose, egui::Button::new("Create collage"))
                        .clicked()
                    {
                        self.create_collage(ui.ctx(), api, cloud_name);
                    }
                    if let Some(status) = &self.status {
                        ui.colored_label(ui.visuals().warn_fg_color, status);
                    }
                });
            });
        });
    }

    fn show_creation_dialog(&mut self, ctx: &egui::Context, api: &ApiClient) {
        if self.creation.is_none() {
            return;
        }

        let mut open = true;
        let mut save_clicked = false;
        if let Some(creation) = &self.creation {
            egui::Window::new("Save your creation?")
                .open(&mut open)
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    let preview_side = (ctx.screen_rect().height() * 0.5).clamp(240.0, 600.0);
                    match (&creation.preview, creation.preview_failed) {
                        (Some(tex), _) => {
                            let size = tex.size_vec2();
                            let scale = (preview_side / size.x).min(preview_side / size.y);
                            ui.image((tex.id(), size * scale));
                        }
                        (None, false) => {
                            ui.allocate_ui(egui::vec2(preview_side, preview_side), |ui| {
                                ui.centered_and_justified(|ui| {
                                    ui.spinner();
                                });
                            });
                        }
                        (None, true) => {
                            ui.label("⚠ Could not load the collage preview");
                        }
                    }

                    if let Some(error) = &creation.error {
                        ui.colored_label(ui.visuals().warn_fg_color, error);
                    }

                    ui.add_space(8.0);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let saving = creation.state == CreationState::Saving;
                        let label = if saving { "Saving..." } else { "Save to Library" };
                        if ui.add_enabled(!saving, egui::Button::new(label)).clicked() {
                            save_clicked = true;
                        }
                        if saving {
                            ui.spinner();
                        }
                    });
                });
        }

        if save_clicked {
            self.start_creation_save(ctx, api);
        }
        if !open {
            // Closing the dialog discards the pending creation; the
            // selection stays as it was.
            self.creation = None;
        }
    }

    fn show_grid(&mut self, ctx: &egui::Context, store: &mut ResourceStore) -> Option<String> {
        let mut opened = None;
        let mut toggled: Option<(String, bool)> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            let failure = match store.state() {
                LoadState::Failed(message) => Some(message.clone()),
                _ => None,
            };
            if let Some(message) = failure {
                ui.horizontal(|ui| {
                    ui.colored_label(
                        ui.visuals().warn_fg_color,
                        format!("Could not load the library: {message}"),
                    );
                    if ui.button("Retry").clicked() {
                        store.invalidate();
                    }
                });
                return;
            }
            if matches!(store.state(), LoadState::Idle | LoadState::Loading)
                && store.resources().is_empty()
            {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
                return;
            }

            if store.resources().is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label("No images in this library yet");
                });
                return;
            }

            let avail_w = ui.available_width();
            let cols = ((avail_w / (CELL + 8.0)) as usize).max(1);

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    egui::Grid::new("gallery_grid")
                        .num_columns(cols)
                        .spacing([8.0, 8.0])
                        .show(ui, |ui| {
                            for (i, resource) in store.resources().iter().enumerate() {
                                let is_checked =
                                    self.selected.iter().any(|id| *id == resource.public_id);
                                let thumb = match self.thumbnails.get(&resource.public_id) {
                                    Some(ThumbState::Ready(tex)) => {
                                        Some((tex.id(), tex.size_vec2()))
                                    }
                                    _ => None,
                                };

                                let mut checked = is_checked;
                                if draw_tile(ui, thumb, &mut checked) {
                                    opened = Some(resource.asset_id.clone());
                                }
                                if checked != is_checked {
                                    toggled = Some((resource.public_id.clone(), checked));
                                }

                                if (i + 1) % cols == 0 {
                                    ui.end_row();
                                }
                            }
                        });
                });
        });

        if let Some((public_id, checked)) = toggled {
            self.set_selected(&public_id, checked);
        }
        opened
    }
}

/// Draw one grid tile: thumbnail, selection border, and a corner checkbox.
/// Returns `true` when the tile itself (not the checkbox) was clicked.
fn draw_tile(
    ui: &mut egui::Ui,
    thumb: Option<(egui::TextureId, egui::Vec2)>,
    checked: &mut bool,
) -> bool {
    let (resp, painter) = ui.allocate_painter(egui::vec2(CELL, CELL), egui::Sense::click());
    let rect = resp.rect;

    if *checked {
        painter.rect_filled(rect, 4.0, ui.visuals().selection.bg_fill);
    } else if resp.hovered() {
        painter.rect_filled(rect, 4.0, ui.visuals().widgets.hovered.bg_fill);
    }

    let pad = if *checked { 6.0 } else { 0.0 };
    let img_rect = rect.shrink(pad);
    match thumb {
        Some((tex_id, tex_size)) => {
            let scale = (img_rect.width() / tex_size.x).min(img_rect.height() / tex_size.y);
            let display = tex_size * scale;
            let offset = (img_rect.size() - display) * 0.5;
            let draw_rect = egui::Rect::from_min_size(img_rect.min + offset, display);
            painter.image(
                tex_id,
                draw_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => {
            painter.rect_filled(img_rect, 4.0, egui::Color32::from_gray(40));
            painter.text(
                img_rect.center(),
                egui::Align2::CENTER_CENTER,
                "…",
                egui::FontId::proportional(22.0),
                egui::Color32::GRAY,
            );
        }
    }

    // Checkbox pinned to the top-left corner, on top of the image.
    let cb_rect = egui::Rect::from_min_size(rect.min + egui::vec2(6.0, 6.0), egui::vec2(20.0, 20.0));
    let cb_resp = ui.put(cb_rect, egui::Checkbox::without_text(checked));

    resp.clicked() && !cb_resp.clicked()
}

#[cfg(test)]
mod tests {
    use super::{Creation, CreationState, Gallery, GalleryEvent};
    use crate::cloudinary::resource::Resource;
    use crate::store::ResourceStore;

    fn resource(public_id: &str) -> Resource {
        Resource {
            public_id: public_id.to_string(),
            asset_id: format!("asset-{public_id}"),
            width: 1200,
            height: 1200,
            secure_url: format!("https://x/{public_id}"),
        }
    }

    fn pending_creation() -> Creation {
        Creation {
            state: CreationState::Saving,
            url: "https://x/collage".to_string(),
            error: None,
            preview: None,
            preview_failed: false,
        }
    }

    #[test]
    fn selection_preserves_insertion_order() {
        let mut gallery = Gallery::new();
        gallery.set_selected("a", true);
        gallery.set_selected("b", true);
        gallery.set_selected("c", true);
        assert_eq!(gallery.selection(), ["a", "b", "c"]);
    }

    #[test]
    fn deselecting_one_leaves_the_rest_in_order() {
        let mut gallery = Gallery::new();
        gallery.set_selected("a", true);
        gallery.set_selected("b", true);
        gallery.set_selected("a", false);
        assert_eq!(gallery.selection(), ["b"]);
        assert!(gallery.is_selecting());
    }

    #[test]
    fn reselecting_does_not_duplicate() {
        let mut gallery = Gallery::new();
        gallery.set_selected("a", true);
        gallery.set_selected("a", true);
        assert_eq!(gallery.selection(), ["a"]);
    }

    #[test]
    fn unchecking_the_last_tile_returns_to_idle() {
        let mut gallery = Gallery::new();
        gallery.set_selected("a", true);
        gallery.set_selected("a", false);
        assert!(!gallery.is_selecting());
    }

    #[test]
    fn clearing_forces_idle_and_keeps_creation_untouched() {
        let mut gallery = Gallery::new();
        gallery.set_selected("a", true);
        gallery.set_selected("b", true);
        gallery.clear_selection();
        assert!(!gallery.is_selecting());
        assert!(gallery.creation.is_none());
    }

    #[test]
    fn confirmed_creation_save_appends_once_and_clears() {
        let ctx = egui::Context::default();
        let mut gallery = Gallery::new();
        let mut store = ResourceStore::new(None);
        gallery.set_selected("a", true);
        gallery.set_selected("b", true);
        gallery.creation = Some(pending_creation());

        gallery
            .tx
            .send(GalleryEvent::CreationSaved(Ok(resource("collage"))))
            .expect("send");
        gallery.poll(&ctx, &mut store);

        assert_eq!(store.resources().len(), 1);
        assert_eq!(store.resources()[0].public_id, "collage");
        assert!(gallery.creation.is_none());
        assert!(!gallery.is_selecting());
    }

    #[test]
    fn failed_creation_save_recovers_to_created_with_error() {
        let ctx = egui::Context::default();
        let mut gallery = Gallery::new();
        let mut store = ResourceStore::new(None);
        gallery.set_selected("a", true);
        gallery.creation = Some(pending_creation());

        gallery
            .tx
            .send(GalleryEvent::CreationSaved(Err("cdn timeout".to_string())))
            .expect("send");
        gallery.poll(&ctx, &mut store);

        assert!(store.resources().is_empty());
        let creation = gallery.creation.as_ref().expect("creation kept");
        assert_eq!(creation.state, CreationState::Created);
        assert_eq!(creation.error.as_deref(), Some("cdn timeout"));
        assert!(gallery.is_selecting());
    }
}
