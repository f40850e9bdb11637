//! The produced interface: one call that turns a device request into a finished frame.

pub mod composer;
pub mod services;

pub use composer::{FrameComposer, FrameComposerBuilder, FrameDiagnostics, FrameRequest, RenderedFrame};
