pub mod api;
pub mod resource;
pub mod url;
