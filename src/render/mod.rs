//! CPU rasterization of frames: surfaces, text, icons and layouts.

pub mod fonts;
pub mod icons;
pub mod layout;
pub mod placeholder;
pub mod quantize;
pub(crate) mod surface;
pub mod text;
