//! Texture lifecycle: decode off-thread, upload on the render thread.
//!
//! A [`Texture`] walks the state machine `Empty → Loading → Decoded →
//! Uploaded`. Decoding (file or network I/O plus pixel decode) is the only
//! work allowed off the render thread; it hands back a [`DecodedImage`]
//! through a one-shot slot without ever touching a GPU handle. The
//! `Decoded → Uploaded` transition happens on the render thread the first
//! time a draw pass needs the texture.
//!
//! A pass that needs a texture still mid-load fails with
//! [`RenderError::ResourceNotReady`] and heals on a later frame.

use std::sync::{Arc, OnceLock};

use log::{error, warn};

use crate::{
    device::{GraphicsDevice, TextureHandle, TextureParams},
    error::RenderError,
};

/// Decoded pixel data: tightly packed RGBA8 rows.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// The one-shot cross-thread handoff a background decode writes into.
pub type DecodeSlot = Arc<OnceLock<anyhow::Result<DecodedImage>>>;

#[derive(Debug)]
enum TextureState {
    Empty,
    Loading(DecodeSlot),
    Decoded(DecodedImage),
    Uploaded {
        handle: TextureHandle,
        width: u32,
        height: u32,
    },
}

/// A material texture in whatever loading state it currently is.
#[derive(Debug)]
pub struct Texture {
    label: String,
    state: TextureState,
    params: TextureParams,
    params_dirty: bool,
}

impl Texture {
    /// A texture with no data yet. Binding it fails until data arrives.
    pub fn empty(label: &str) -> Self {
        Self {
            label: label.to_string(),
            state: TextureState::Empty,
            params: TextureParams::default(),
            params_dirty: false,
        }
    }

    /// A texture whose pixels are being decoded elsewhere; `slot` is
    /// filled exactly once by the decoding thread.
    pub fn loading(label: &str, slot: DecodeSlot) -> Self {
        Self {
            label: label.to_string(),
            state: TextureState::Loading(slot),
            params: TextureParams::default(),
            params_dirty: false,
        }
    }

    /// A texture from already-decoded pixels, ready for upload.
    pub fn from_decoded(label: &str, image: DecodedImage) -> Self {
        Self {
            label: label.to_string(),
            state: TextureState::Decoded(image),
            params: TextureParams::default(),
            params_dirty: false,
        }
    }

    /// Override the sampling parameters. Takes effect at upload; on an
    /// already uploaded texture the parameters are re-applied on the next
    /// bind.
    pub fn set_params(&mut self, params: TextureParams) {
        self.params = params;
        self.params_dirty = true;
    }

    /// A 1×1 solid-colour texture; handy as a placeholder so shaders need
    /// no special case while the real pixels are still loading.
    pub fn solid(label: &str, rgba: [u8; 4]) -> Self {
        Self::from_decoded(
            label,
            DecodedImage {
                width: 1,
                height: 1,
                pixels: rgba.to_vec(),
            },
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether a draw pass could bind this texture right now (possibly
    /// after an upload).
    pub fn ready(&mut self) -> bool {
        self.poll();
        matches!(
            self.state,
            TextureState::Decoded(_) | TextureState::Uploaded { .. }
        )
    }

    /// Dimensions, if known yet.
    pub fn size(&self) -> Option<(u32, u32)> {
        match &self.state {
            TextureState::Decoded(image) => Some((image.width, image.height)),
            TextureState::Uploaded { width, height, .. } => Some((*width, *height)),
            _ => None,
        }
    }

    /// Advance `Loading → Decoded` if the background decode finished. A
    /// failed decode falls back to `Empty` and logs; the owning pass keeps
    /// skipping instead of erroring forever.
    pub fn poll(&mut self) {
        let next = match &self.state {
            TextureState::Loading(slot) => match slot.get() {
                None => None,
                Some(Ok(image)) => Some(TextureState::Decoded(image.clone())),
                Some(Err(e)) => {
                    error!("texture `{}` failed to decode: {e}", self.label);
                    Some(TextureState::Empty)
                }
            },
            _ => None,
        };
        if let Some(next) = next {
            self.state = next;
        }
    }

    /// The GPU handle, performing the `Decoded → Uploaded` transition if
    /// pending. Must only be called from the render thread.
    pub fn handle(&mut self, device: &mut dyn GraphicsDevice) -> Result<TextureHandle, RenderError> {
        self.poll();
        match &self.state {
            TextureState::Uploaded { handle, .. } => {
                let handle = *handle;
                if self.params_dirty {
                    device.set_texture_parameters(handle, &self.params);
                    self.params_dirty = false;
                }
                Ok(handle)
            }
            TextureState::Decoded(image) => {
                let (width, height) = (image.width, image.height);
                let max = device.capabilities().max_texture_size;
                if width > max || height > max {
                    warn!(
                        "texture `{}` is {width}x{height} but the device caps out at {max}",
                        self.label
                    );
                }
                let handle = device.create_texture(width, height, &image.pixels);
                device.set_texture_parameters(handle, &self.params);
                self.params_dirty = false;
                self.state = TextureState::Uploaded {
                    handle,
                    width,
                    height,
                };
                Ok(handle)
            }
            TextureState::Loading(_) | TextureState::Empty => {
                Err(RenderError::ResourceNotReady(self.label.clone()))
            }
        }
    }
}
