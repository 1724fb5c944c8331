//! Sponge Core - renderer-agnostic scene and image types.
//!
//! This crate provides:
//!
//! - **Scene description**: `Material`, `Shape`, `SceneObject`, `SceneDescription`
//! - **Configuration**: `RenderSettings` and its JSON loader, camera presets
//! - **Output**: `Framebuffer` and image writing through the `image` crate
//!
//! # Example
//!
//! ```ignore
//! use sponge_core::RenderSettings;
//!
//! let settings = RenderSettings::from_json_file("render.json")?;
//! settings.validate()?;
//! println!("{}x{} @ {} spp",
//!     settings.image.width,
//!     settings.image.height,
//!     settings.image.samples_per_pixel());
//! ```

pub mod camera;
pub mod framebuffer;
pub mod image_io;
pub mod material;
pub mod scene;
pub mod settings;

// Re-export commonly used types
pub use camera::{CameraConfig, CameraPreset};
pub use framebuffer::Framebuffer;
pub use image_io::{FrameOutput, ImageFile, ImageIoError};
pub use material::{Color, Material, ReflectionKind};
pub use scene::{SceneDescription, SceneObject, Shape};
pub use settings::{
    ImageSettings, IntegratorSettings, MarchSettings, RenderSettings, SettingsError,
    SettingsResult,
};
