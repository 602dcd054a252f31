//! Image intake: everything that happens to an upload before a provider
//! sees it.
//!
//! - **decode**: format detection and bounded decoding
//! - **precheck**: plant-plausibility heuristic
//! - **encode**: classifier-ready JPEG re-encoding

pub mod decode;
pub mod encode;
pub mod precheck;

pub use decode::{DecodedImage, ImageDecoder, LeafImage};
pub use precheck::{ColorStats, PlantCheck, Plausibility};
