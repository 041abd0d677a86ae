//! Loading textures from files and raw bytes.
//!
//! Image decode is the only work the engine runs off the render thread:
//! [`load_texture_file`] spawns a decode thread that hands its result back
//! through the texture's one-shot slot and never touches a GPU handle.
//! The upload itself happens later, on the render thread, the first time a
//! draw pass binds the texture.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
    thread,
};

use anyhow::Context as _;
use image::ImageFormat;
use log::warn;

use crate::data_structures::texture::{DecodedImage, Texture};

/// Decode raw image file bytes (PNG, JPEG, ...) into tightly packed RGBA8
/// pixels. `format` is an optional file-extension hint; without it the
/// format is sniffed from the bytes.
pub fn decode_image(bytes: &[u8], format: Option<&str>) -> anyhow::Result<DecodedImage> {
    let img = match format {
        None => image::load_from_memory(bytes)?,
        Some(extension) => {
            let format = ImageFormat::from_extension(extension)
                .with_context(|| format!("unknown image format `{extension}`"))?;
            image::load_from_memory_with_format(bytes, format)?
        }
    };
    let rgba = img.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

/// Decode bytes synchronously and return an upload-ready texture.
pub fn load_texture_bytes(bytes: &[u8], label: &str) -> anyhow::Result<Texture> {
    let image = decode_image(bytes, None)?;
    Ok(Texture::from_decoded(label, image))
}

/// Read and decode an image file on a background thread.
///
/// Returns immediately with a texture in the loading state; a pass binding
/// it before the decode finishes fails softly and retries next frame.
pub fn load_texture_file(path: impl AsRef<Path>) -> Texture {
    let path: PathBuf = path.as_ref().to_path_buf();
    let label = path.display().to_string();
    let slot = Arc::new(OnceLock::new());
    let result_slot = slot.clone();
    let thread_label = label.clone();
    let spawned = thread::Builder::new()
        .name(format!("decode {thread_label}"))
        .spawn(move || {
            let decoded = std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))
                .and_then(|bytes| {
                    let extension = path.extension().and_then(|e| e.to_str());
                    decode_image(&bytes, extension)
                });
            // the receiver may already be gone, which is fine
            let _ = result_slot.set(decoded);
        });
    if let Err(e) = spawned {
        warn!("could not spawn a decode thread for `{label}`: {e}");
    }
    Texture::loading(&label, slot)
}
