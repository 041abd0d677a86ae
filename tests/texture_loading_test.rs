use std::sync::{Arc, OnceLock};

use render_ngin::data_structures::texture::{DecodedImage, Texture};
use render_ngin::error::RenderError;

mod common;

use common::test_utils::test_context;

fn small_image() -> DecodedImage {
    DecodedImage {
        width: 2,
        height: 2,
        pixels: vec![255; 16],
    }
}

#[test]
fn should_walk_the_loading_state_machine_up_to_upload() {
    let (mut ctx, handle) = test_context();
    let slot = Arc::new(OnceLock::new());
    let mut texture = Texture::loading("background", slot.clone());

    // decode still running somewhere else
    assert!(!texture.ready());
    assert!(matches!(
        texture.handle(ctx.device.as_mut()),
        Err(RenderError::ResourceNotReady(_))
    ));

    // the decode thread hands over its result exactly once
    slot.set(Ok(small_image())).expect("slot was empty");
    assert!(texture.ready());
    assert_eq!(texture.size(), Some((2, 2)));

    let first = texture
        .handle(ctx.device.as_mut())
        .expect("decoded texture uploads");
    assert_eq!(handle.borrow().textures.len(), 1);

    // further binds reuse the uploaded handle
    let second = texture
        .handle(ctx.device.as_mut())
        .expect("uploaded texture stays usable");
    assert_eq!(first, second);
    assert_eq!(handle.borrow().textures.len(), 1);
}

#[test]
fn should_fall_back_to_empty_when_the_decode_fails() {
    let (mut ctx, _handle) = test_context();
    let slot = Arc::new(OnceLock::new());
    let mut texture = Texture::loading("broken", slot.clone());

    slot.set(Err(anyhow::anyhow!("not an image")))
        .expect("slot was empty");
    assert!(!texture.ready());
    assert!(matches!(
        texture.handle(ctx.device.as_mut()),
        Err(RenderError::ResourceNotReady(_))
    ));
}

#[test]
fn should_reject_bytes_that_are_not_an_image() {
    assert!(render_ngin::resources::decode_image(b"definitely not pixels", None).is_err());
    assert!(render_ngin::resources::decode_image(&[], Some("png")).is_err());
}

#[test]
fn should_upload_solid_textures_directly() {
    let (mut ctx, handle) = test_context();
    let mut texture = Texture::solid("white", [255, 255, 255, 255]);
    assert!(texture.ready());
    texture
        .handle(ctx.device.as_mut())
        .expect("solid texture uploads");
    let state = handle.borrow();
    assert_eq!(state.textures.len(), 1);
    assert_eq!(state.textures[0], (1, 1, vec![255, 255, 255, 255]));
}
