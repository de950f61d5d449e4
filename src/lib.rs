//! Galaxy catalog loading, emission-line quality cuts and redshift wedge projection for DESI
//! survey products.
//!
//! `RecordSource → loader::load_catalog → quality::join → projection::project → render::Renderer`
pub mod catalog;
pub mod catalog_errors;
pub mod constants;
pub mod density;
pub mod emission;
pub mod loader;
pub mod projection;
pub mod quality;
pub mod release;
pub mod render;
pub mod sources;
