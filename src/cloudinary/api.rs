//! Blocking REST client for the library's persistence endpoints.
//!
//! Every call here blocks on the network, so callers run them on worker
//! threads and report back over an mpsc channel. The client is cheap to
//! clone into those threads; `reqwest` shares the connection pool.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use super::resource::Resource;

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the resource listing, optionally scoped to a tag.
    pub fn list_resources(&self, tag: Option<&str>) -> Result<Vec<Resource>> {
        let mut request = self.http.get(format!("{}/resources", self.base_url));
        if let Some(tag) = tag {
            request = request.query(&[("tag", tag)]);
        }
        let body: DataEnvelope<Vec<Resource>> = request
            .send()?
            .error_for_status()?
            .json()
            .context("resource listing returned malformed JSON")?;
        Ok(body.data)
    }

    /// Persist an image from a URL. With a `public_id` the endpoint
    /// overwrites that asset in place; without one it stores a new copy.
    /// Returns the stored resource either way.
    pub fn save_url(&self, url: &str, public_id: Option<&str>) -> Result<Resource> {
        let payload = match public_id {
            Some(id) => json!({ "publicId": id, "url": url }),
            None => json!({ "url": url }),
        };
        let body: DataEnvelope<Resource> = self
            .http
            .post(format!("{}/upload", self.base_url))
            .json(&payload)
            .send()?
            .error_for_status()?
            .json()
            .context("upload endpoint returned malformed JSON")?;
        Ok(body.data)
    }

    /// Irreversibly delete the asset with the given public id.
    pub fn delete(&self, public_id: &str) -> Result<()> {
        self.http
            .post(format!("{}/delete", self.base_url))
            .json(&json!({ "publicId": public_id }))
            .send()?
            .error_for_status()?;
        Ok(())
    }

    /// Request a derived URL once so the CDN renders it before it is saved.
    pub fn warm(&self, url: &str) -> Result<()> {
        self.http.get(url).send()?.error_for_status()?;
        Ok(())
    }

    /// Download an image and decode it into pixels ready for a texture.
    pub fn fetch_image(&self, url: &str) -> Result<egui::ColorImage> {
        let bytes = self.http.get(url).send()?.error_for_status()?.bytes()?;
        let decoded = image::load_from_memory(&bytes)
            .with_context(|| format!("could not decode image at {url}"))?;
        let rgba = decoded.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        Ok(egui::ColorImage::from_rgba_unmultiplied(
            size,
            &rgba.into_raw(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiClient, DataEnvelope};
    use crate::cloudinary::resource::Resource;

    #[test]
    fn base_url_loses_trailing_slashes() {
        let client = ApiClient::new("http://localhost:3000/api/");
        assert_eq!(client.base_url, "http://localhost:3000/api");
    }

    #[test]
    fn listing_envelope_unwraps_data() {
        let json = r#"{"data": [{
            "public_id": "a", "asset_id": "b",
            "width": 10, "height": 20, "secure_url": "https://x/a"
        }]}"#;
        let envelope: DataEnvelope<Vec<Resource>> =
            serde_json::from_str(json).expect("valid envelope");
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data[0].public_id, "a");
    }
}
