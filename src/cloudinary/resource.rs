use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One managed media asset as returned by the resource listing API.
///
/// Resources are never mutated in place: saving over an asset keeps its
/// `public_id` and replaces the remote pixels, while save-as-copy yields a
/// brand new resource.
pub struct Resource {
    pub public_id: String,
    pub asset_id: String,
    pub width: u32,
    pub height: u32,
    pub secure_url: String,
}
