//! Server-side collage composition from 2-4 selected resources.
//!
//! Each supported participant count maps to a fixed layout template. The
//! first selected resource becomes the 1200x1200 base canvas; every further
//! one is an overlay placed at its template slot. The whole collage is a
//! single derived-image URL the CDN renders on first request.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::cloudinary::url::{DeliveryUrl, fill_crop, layer_id};

pub const CANVAS_SIZE: u32 = 1200;

/// One overlay slot: where the tile anchors and how large it renders.
struct Slot {
    gravity: &'static str,
    width: u32,
    height: u32,
}

const fn slot(gravity: &'static str, width: u32, height: u32) -> Slot {
    Slot {
        gravity,
        width,
        height,
    }
}

/// Overlay slots per participant count, for the participants after the base.
/// 2-up splits into west/east halves (the base shows through on the west);
/// 3-up and 4-up tile the remaining corners with 600x600 quadrants.
fn template(count: usize) -> Option<&'static [Slot]> {
    const TWO: &[Slot] = &[slot("east", 600, 1200)];
    const THREE: &[Slot] = &[slot("north_east", 600, 600), slot("south_east", 600, 600)];
    const FOUR: &[Slot] = &[
        slot("south_west", 600, 600),
        slot("north_east", 600, 600),
        slot("south_east", 600, 600),
    ];
    match count {
        2 => Some(TWO),
        3 => Some(THREE),
        4 => Some(FOUR),
        _ => None,
    }
}

/// Compose a collage URL from the ids in selection order.
///
/// `version` is a cache-busting token stamped into the URL so the CDN never
/// serves a stale composite; pass [`now_version`] outside of tests. Aside
/// from that token the construction is deterministic.
pub fn compose(ids: &[String], cloud_name: &str, version: u64) -> anyhow::Result<String> {
    let Some(slots) = template(ids.len()) else {
        anyhow::bail!("a collage needs 2 to 4 images, got {}", ids.len());
    };

    let mut url = DeliveryUrl::new(cloud_name, &ids[0])
        .segment(fill_crop(CANVAS_SIZE, CANVAS_SIZE))
        .version(version);
    for (id, slot) in ids[1..].iter().zip(slots) {
        url = url
            .segment(format!("l_{}", layer_id(id)))
            .segment(fill_crop(slot.width, slot.height))
            .segment(format!("fl_layer_apply,g_{}", slot.gravity));
    }
    Ok(url.build())
}

/// Current Unix time in milliseconds, used as the collage version token.
pub fn now_version() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::compose;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("img_{}", i)).collect()
    }

    fn overlay_count(url: &str) -> usize {
        url.matches("/l_").count()
    }

    #[test]
    fn unsupported_counts_are_rejected() {
        for n in [0, 1, 5, 9] {
            let err = compose(&ids(n), "demo", 1).unwrap_err();
            assert!(err.to_string().contains("2 to 4"), "got: {err}");
        }
    }

    #[test]
    fn supported_counts_yield_one_overlay_per_non_base_participant() {
        for n in [2, 3, 4] {
            let url = compose(&ids(n), "demo", 1).expect("supported count");
            assert_eq!(overlay_count(&url), n - 1, "count {n}: {url}");
        }
    }

    #[test]
    fn two_up_layout() {
        let url = compose(&ids(2), "demo", 42).expect("2-up");
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/c_fill,w_1200,h_1200,g_auto\
             /l_img_1/c_fill,w_600,h_1200,g_auto/fl_layer_apply,g_east/v42/img_0"
        );
    }

    #[test]
    fn overlays_follow_template_order() {
        let url = compose(&ids(4), "demo", 1).expect("4-up");
        let sw = url.find("g_south_west").expect("south west slot");
        let ne = url.find("g_north_east").expect("north east slot");
        let se = url.find("g_south_east").expect("south east slot");
        assert!(sw < ne && ne < se, "slots out of order: {url}");
    }

    #[test]
    fn base_is_the_first_selected_id() {
        let url = compose(&ids(3), "demo", 1).expect("3-up");
        assert!(url.ends_with("/img_0"));
        assert!(!url.contains("l_img_0"));
    }

    #[test]
    fn construction_is_deterministic_for_a_fixed_version() {
        let a = compose(&ids(3), "demo", 7).expect("3-up");
        let b = compose(&ids(3), "demo", 7).expect("3-up");
        assert_eq!(a, b);
    }

    #[test]
    fn version_token_defeats_caching() {
        let a = compose(&ids(2), "demo", 1).expect("2-up");
        let b = compose(&ids(2), "demo", 2).expect("2-up");
        assert_ne!(a, b);
        assert!(a.contains("/v1/"));
        assert!(b.contains("/v2/"));
    }

    #[test]
    fn slashes_in_ids_become_colons_in_overlays_only() {
        let ids = vec!["lib/base".to_string(), "lib/over".to_string()];
        let url = compose(&ids, "demo", 1).expect("2-up");
        assert!(url.contains("/l_lib:over/"));
        assert!(url.ends_with("/lib/base"));
    }
}
