//! Upload trigger: a toolbar button that hands a local file to the
//! persistence endpoint.
//!
//! The endpoint owns the actual storage and tagging; this side only picks a
//! file, wraps it in a data URL, and posts it through the same `{ url }`
//! contract that derived images use.

use std::path::Path;
use std::sync::mpsc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::cloudinary::{api::ApiClient, resource::Resource};

pub struct UploadControl {
    in_flight: bool,
    pub error: Option<String>,
    tx: mpsc::SyncSender<Result<Resource, String>>,
    rx: mpsc::Receiver<Result<Resource, String>>,
}

impl UploadControl {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::sync_channel(2);
        Self {
            in_flight: false,
            error: None,
            tx,
            rx,
        }
    }

    /// Drain completed uploads. Returns the stored resource to append.
    pub fn poll(&mut self) -> Option<Resource> {
        match self.rx.try_recv() {
            Ok(Ok(resource)) => {
                self.in_flight = false;
                self.error = None;
                Some(resource)
            }
            Ok(Err(message)) => {
                tracing::warn!(%message, "upload failed");
                self.in_flight = false;
                self.error = Some(message);
                None
            }
            Err(_) => None,
        }
    }

    /// Render the upload button; on click, pick a file and post it in the
    /// background. The button stays disabled while an upload is in flight.
    pub fn button(&mut self, ui: &mut egui::Ui, api: &ApiClient) {
        let label = if self.in_flight {
            "Uploading..."
        } else {
            "Upload"
        };
        if !ui
            .add_enabled(!self.in_flight, egui::Button::new(label))
            .clicked()
        {
            return;
        }

        let picked = rfd::FileDialog::new()
            .set_title("Select an image to upload")
            .add_filter("Images", &["jpg", "jpeg", "png", "webp", "gif"])
            .pick_file();
        let Some(path) = picked else {
            return;
        };

        self.in_flight = true;
        self.error = None;
        let api = api.clone();
        let tx = self.tx.clone();
        let ctx = ui.ctx().clone();
        std::thread::spawn(move || {
            let result = upload_file(&api, &path).map_err(|e| e.to_string());
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }
}

#[cfg(test)]
impl UploadControl {
    pub(crate) fn push_result(&self, result: Result<Resource, String>) {
        self.tx.send(result).expect("upload channel open");
    }
}

fn upload_file(api: &ApiClient, path: &Path) -> anyhow::Result<Resource> {
    let bytes = std::fs::read(path)?;
    let data_url = to_data_url(path, &bytes);
    api.save_url(&data_url, None)
}

/// Encode file contents as a data URL the persistence endpoint can ingest.
fn to_data_url(path: &Path, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_for(path), BASE64.encode(bytes))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
