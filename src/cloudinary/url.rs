//! Delivery URL construction for the media CDN.
//!
//! Every image shown or saved by the app is a parameterized URL of the form
//! `https://res.cloudinary.com/{cloud}/image/upload/{seg}/{seg}/v{n}/{id}`
//! where each segment is a comma-joined parameter list. The CDN performs the
//! actual crop/filter/overlay work at delivery time.

use crate::transform::{CropPreset, Enhancement, Filter, Transformation};

const DELIVERY_BASE: &str = "https://res.cloudinary.com";

/// Builder for a single delivery URL against one public id.
#[derive(Debug, Clone)]
pub struct DeliveryUrl<'a> {
    cloud_name: &'a str,
    public_id: &'a str,
    segments: Vec<String>,
    version: Option<u64>,
}

impl<'a> DeliveryUrl<'a> {
    pub fn new(cloud_name: &'a str, public_id: &'a str) -> Self {
        Self {
            cloud_name,
            public_id,
            segments: Vec::new(),
            version: None,
        }
    }

    /// Append one transformation segment. Empty segments are dropped.
    pub fn segment(mut self, params: impl Into<String>) -> Self {
        let params = params.into();
        if !params.is_empty() {
            self.segments.push(params);
        }
        self
    }

    /// Stamp the URL with a version token, placed just before the public id.
    pub fn version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn build(&self) -> String {
        let mut url = format!("{}/{}/image/upload", DELIVERY_BASE, self.cloud_name);
        for segment in &self.segments {
            url.push('/');
            url.push_str(segment);
        }
        if let Some(version) = self.version {
            url.push_str(&format!("/v{}", version));
        }
        url.push('/');
        url.push_str(self.public_id);
        url
    }
}

/// Fill-crop to exact dimensions, anchored at the detected relevant region.
pub fn fill_crop(width: u32, height: u32) -> String {
    format!("c_fill,w_{},h_{},g_auto", width, height)
}

/// Public ids embed `/` as `:` when referenced as an overlay layer.
pub fn layer_id(public_id: &str) -> String {
    public_id.replace('/', ":")
}

fn enhancement_param(enhancement: Enhancement) -> Option<&'static str> {
    match enhancement {
        Enhancement::None => None,
        Enhancement::Improve => Some("e_improve"),
        Enhancement::Restore => Some("e_gen_restore"),
        Enhancement::RemoveBackground => Some("e_background_removal"),
    }
}

fn filter_param(filter: Filter) -> Option<&'static str> {
    match filter {
        Filter::None => None,
        Filter::Grayscale => Some("e_grayscale"),
        Filter::Sepia => Some("e_sepia"),
        Filter::Sizzle => Some("e_art:sizzle"),
    }
}

/// Render an edit into its delivery URL.
///
/// Segment order is fixed (enhancement, crop, filter) so identical edits
/// always produce identical URLs. No timestamp is involved: the same URL is
/// used for the live preview and for the save request.
pub fn transformation_url(cloud_name: &str, public_id: &str, t: &Transformation) -> String {
    let mut url = DeliveryUrl::new(cloud_name, public_id);
    if let Some(param) = enhancement_param(t.enhancement) {
        url = url.segment(param);
    }
    if t.crop != CropPreset::None {
        let (w, h) = t.effective_size();
        url = url.segment(fill_crop(w, h));
    }
    if let Some(param) = filter_param(t.filter) {
        url = url.segment(param);
    }
    url.build()
}

/// Square fill-cropped thumbnail URL for grid tiles.
///
/// Quality is left to the CDN but the format is not: `f_auto` could return
/// codecs the local decoder does not handle.
pub fn thumbnail_url(cloud_name: &str, public_id: &str, size: u32) -> String {
    DeliveryUrl::new(cloud_name, public_id)
        .segment(fill_crop(size, size))
        .segment("q_auto")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{CropPreset, EditState, Enhancement, Filter, Transformation};

    #[test]
    fn bare_url_has_no_transformation_segments() {
        let url = DeliveryUrl::new("demo", "library/abc").build();
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/library/abc"
        );
    }

    #[test]
    fn version_token_sits_between_segments_and_public_id() {
        let url = DeliveryUrl::new("demo", "abc")
            .segment(fill_crop(1200, 1200))
            .version(17)
            .build();
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/c_fill,w_1200,h_1200,g_auto/v17/abc"
        );
    }

    #[test]
    fn empty_segments_are_dropped() {
        let url = DeliveryUrl::new("demo", "abc").segment("").build();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/abc");
    }

    #[test]
    fn layer_ids_replace_slashes_with_colons() {
        assert_eq!(layer_id("library/sub/photo"), "library:sub:photo");
        assert_eq!(layer_id("plain"), "plain");
    }

    #[test]
    fn transformation_url_orders_enhancement_crop_filter() {
        let edit = EditState {
            enhancement: Enhancement::Restore,
            crop: CropPreset::Landscape,
            filter: Filter::Sepia,
        };
        let t = Transformation::build(1600, 1600, edit);
        assert_eq!(
            transformation_url("demo", "abc", &t),
            "https://res.cloudinary.com/demo/image/upload/e_gen_restore/c_fill,w_1600,h_900,g_auto/e_sepia/abc"
        );
    }

    #[test]
    fn default_edit_renders_the_bare_url() {
        let t = Transformation::build(800, 600, EditState::default());
        assert_eq!(
            transformation_url("demo", "abc", &t),
            "https://res.cloudinary.com/demo/image/upload/abc"
        );
    }

    #[test]
    fn stylized_filter_uses_named_art_effect() {
        let edit = EditState {
            filter: Filter::Sizzle,
            ..EditState::default()
        };
        let t = Transformation::build(800, 600, edit);
        assert!(transformation_url("demo", "abc", &t).contains("/e_art:sizzle/"));
    }

    #[test]
    fn thumbnail_url_is_square_fill_crop() {
        assert_eq!(
            thumbnail_url("demo", "abc", 300),
            "https://res.cloudinary.com/demo/image/upload/c_fill,w_300,h_300,g_auto/q_auto/abc"
        );
    }
}
