use super::*;
use crate::device::mock_driver::{mock_screen, MockDriver};
use crate::device::ScreenConfig;
use crate::resource::constant_buffer_template::ShaderConstantBufferTemplateBuilder;
use crate::value_type::ValueType;

fn lighting_template() -> Arc<ShaderConstantBufferTemplate> {
    ShaderConstantBufferTemplateBuilder::new()
        .with_entry(ValueType::Int32, 1, "count")
        .build()
}

#[test]
fn test_desc_builder() {
    let desc = ShaderDesc::new("sprite")
        .with_sources("vs", "fs")
        .with_vertex_layout(VertexLayout::position_2d_textured(1))
        .with_constant_buffer("Lighting", lighting_template());

    assert_eq!(desc.name, "sprite");
    assert_eq!(desc.vertex_layout.stride(), 16);
    assert_eq!(desc.constant_buffers.len(), 1);
}

#[test]
fn test_constant_buffer_slots() {
    let lighting = lighting_template();
    let material = ShaderConstantBufferTemplateBuilder::new()
        .with_entry(ValueType::Color4, 1, "tint")
        .build();
    let shader = Shader::new(
        ShaderDesc::new("lit")
            .with_constant_buffer("Material", material.clone())
            .with_constant_buffer("Lighting", lighting.clone()),
    );

    assert_eq!(shader.constant_buffer_slot(&material), Some(0));
    assert_eq!(shader.constant_buffer_slot(&lighting), Some(1));
    // Same layout built separately still matches
    assert_eq!(shader.constant_buffer_slot(&lighting_template()), Some(1));
    assert_eq!(shader.constant_buffer_slot_by_name("Lighting"), Some(1));
    assert_eq!(shader.constant_buffer_slot_by_name("Missing"), None);
}

#[test]
fn test_shader_load_cycle() {
    let (mut screen, events) = mock_screen();
    let mut shader = Shader::new(ShaderDesc::new("flat"));
    assert!(shader.load_content_from(&mut screen));
    assert!(shader.content().is_some());
    shader.unload_content();
    assert!(shader.content().is_none());
    assert_eq!(events.count("create_shader"), 1);
}

#[test]
fn test_driver_refusing_shaders() {
    let mut driver = MockDriver::new();
    driver.refuse_shaders = true;
    let mut screen = Screen::new(ScreenConfig::default());
    screen.set_driver(Box::new(driver)).unwrap();

    let mut shader = Shader::new(ShaderDesc::new("flat"));
    assert!(!shader.load_content_from(&mut screen));
    assert_eq!(shader.name(), "flat");
}
