use render_ngin::error::RenderError;
use render_ngin::pipelines::binding::{BindingKey, VarType};
use render_ngin::pipelines::shader::Shader;

#[test]
fn should_parse_semantic_keys_at_declare_time() {
    assert_eq!(
        BindingKey::parse("material.color").expect("known key"),
        BindingKey::MaterialColour
    );
    assert_eq!(
        BindingKey::parse("material.texture").expect("known key"),
        BindingKey::MaterialTexture { unit: 0 }
    );
    assert_eq!(
        BindingKey::parse("material.texture:2").expect("known key"),
        BindingKey::MaterialTexture { unit: 2 }
    );
    assert_eq!(
        BindingKey::parse("renderer.pvm").expect("known key"),
        BindingKey::RendererPvm
    );
    assert_eq!(
        BindingKey::parse("geometry.textuv").expect("known key"),
        BindingKey::GeometryTexUv
    );
    assert_eq!(
        BindingKey::parse("instance.pose:3:0").expect("known key"),
        BindingKey::InstancePose {
            stride: 3,
            offset: 0
        }
    );
}

#[test]
fn should_reject_unknown_keys_when_declared() {
    for key in [
        "material.glitter",
        "renderer",
        "geometry.coords:1",
        "instance.pose",
        "instance.pose:3",
        "",
    ] {
        assert!(
            matches!(BindingKey::parse(key), Err(RenderError::Binding { .. })),
            "`{key}` should not parse"
        );
    }

    let mut shader = Shader::new("broken", "vs", "fs");
    assert!(shader.bind("mvp", VarType::Mat4, "renderer.mvp").is_err());
    assert!(shader.declarations().is_empty());
}

#[test]
fn should_reject_malformed_key_parameters() {
    assert!(BindingKey::parse("instance.pose:x:0").is_err());
    assert!(BindingKey::parse("instance.pose:3:-1").is_err());
    assert!(BindingKey::parse("material.texture:first").is_err());
}

#[test]
fn should_separate_attribute_keys_from_uniform_keys() {
    assert!(BindingKey::parse("geometry.coords").expect("known key").is_attribute());
    assert!(BindingKey::parse("instance.pose:4:1").expect("known key").is_attribute());
    assert!(!BindingKey::parse("renderer.aspect").expect("known key").is_attribute());
    assert!(!BindingKey::parse("material.color").expect("known key").is_attribute());
}

#[test]
fn should_check_literal_arity_when_declared() {
    let mut shader = Shader::new("literals", "vs", "fs");
    shader
        .bind_literal("tint", VarType::Vec3, &[1.0, 0.5, 0.0])
        .expect("arity matches");

    assert!(shader.bind_literal("tint", VarType::Vec3, &[1.0]).is_err());
    assert!(
        shader
            .bind_literal("tex", VarType::Sampler, &[0.0])
            .is_err()
    );
    assert_eq!(shader.declarations().len(), 1);
}
