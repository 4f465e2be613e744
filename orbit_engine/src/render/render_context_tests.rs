use super::*;
use crate::device::mock_driver::{mock_screen, MockDriver};
use crate::device::ScreenConfig;
use crate::resource::{
    IndexSize, RenderBuffer, Shader, ShaderConstantBuffer, ShaderConstantBufferTemplateBuilder,
    ShaderDesc, Texture, VertexLayout,
};
use crate::io::{Image, PixelFormat};
use crate::value_type::{ShaderValue, ValueType};
use crate::error::Error;
use glam::{Vec2, Vec3};

// ============================================================================
// Helpers
// ============================================================================

fn sprite_shader() -> ShaderRef {
    Shader::new_shared(
        ShaderDesc::new("sprite").with_vertex_layout(VertexLayout::position_2d_textured(1)),
    )
}

fn quad() -> VertexBuffer {
    let mut buffer = VertexBuffer::with_layout(VertexLayout::position_2d_textured(1));
    for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
        let index = buffer.add_vertex().unwrap();
        buffer.set_vertex_position(index, Vec3::new(x, y, 0.0)).unwrap();
        buffer.set_vertex_texture_coordinate(index, 0, Vec2::new(x, y)).unwrap();
    }
    buffer
}

fn texture() -> TextureRef {
    Texture::from_image("tile", Image::empty(2, 2, PixelFormat::Rgba8)).into_shared()
}

// ============================================================================
// Frame tests
// ============================================================================

#[test]
fn test_frame_bracketing() {
    let (mut screen, events) = mock_screen();
    let ctx = screen.begin_frame().unwrap();
    let stats = ctx.end_frame().unwrap();
    assert_eq!(stats, FrameStats::default());
    assert_eq!(events.names(), vec!["pre_render", "post_render"]);
}

#[test]
fn test_dropped_context_closes_frame() {
    let (mut screen, events) = mock_screen();
    let (buffer, _) = RenderBuffer::with_color_target("rb", Rect::from_size(8.0, 8.0));
    {
        let mut ctx = screen.begin_frame().unwrap();
        assert!(ctx.push_render_buffer(&buffer));
    }
    assert_eq!(events.count("bind_screen"), 1);
    assert_eq!(events.count("post_render"), 1);

    let ctx = screen.begin_frame().unwrap();
    ctx.end_frame().unwrap();
    assert_eq!(events.count("post_render"), 2);
}

#[test]
fn test_ended_context_is_not_closed_twice() {
    let (mut screen, events) = mock_screen();
    let ctx = screen.begin_frame().unwrap();
    ctx.end_frame().unwrap();
    assert_eq!(events.count("post_render"), 1);
}

// ============================================================================
// Draw tests
// ============================================================================

#[test]
fn test_draw_without_shader_is_skipped() {
    let (mut screen, events) = mock_screen();
    let mut ctx = screen.begin_frame().unwrap();
    let mut vertices = quad();
    assert!(!ctx.draw(Primitive::TriangleStrip, &mut vertices, None));
    assert_eq!(ctx.stats().failed_draws, 1);
    ctx.end_frame().unwrap();
    assert_eq!(events.count("draw"), 0);
    // The buffer was never even loaded
    assert!(!vertices.is_loaded());
}

#[test]
fn test_draw_loads_buffers_and_dispatches() {
    let (mut screen, events) = mock_screen();
    let shader = sprite_shader();
    let mut vertices = quad();
    let mut indices = IndexBuffer::with_index_size(IndexSize::U8);
    indices.add_indices(&[0, 1, 2, 2, 1, 3]).unwrap();

    let mut ctx = screen.begin_frame().unwrap();
    assert!(ctx.set_shader(Some(&shader)));
    ctx.set_modelview_matrix(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
    assert!(ctx.draw(Primitive::Triangles, &mut vertices, Some(&mut indices)));
    let stats = ctx.end_frame().unwrap();

    assert!(vertices.is_loaded());
    assert!(indices.is_loaded());
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.triangles, 2);

    let draws = events.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].vertex_count, 4);
    assert_eq!(draws[0].index_count, Some(6));
    assert_eq!(draws[0].modelview, Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn test_draw_rejects_incompatible_layout() {
    let (mut screen, events) = mock_screen();
    let shader = Shader::new_shared(
        ShaderDesc::new("lit").with_vertex_layout({
            let mut layout = VertexLayout::position_2d_textured(0);
            layout.normal.fields = 3;
            layout
        }),
    );
    let mut vertices = quad();

    let mut ctx = screen.begin_frame().unwrap();
    assert!(ctx.set_shader(Some(&shader)));
    assert!(!ctx.draw(Primitive::TriangleStrip, &mut vertices, None));
    ctx.end_frame().unwrap();
    assert_eq!(events.count("draw"), 0);
}

#[test]
fn test_draw_with_refused_vertex_buffer() {
    let mut driver = MockDriver::new();
    driver.refuse_vertex_buffers = true;
    let events = driver.events();
    let mut screen = Screen::new(ScreenConfig::default());
    screen.set_driver(Box::new(driver)).unwrap();

    let shader = sprite_shader();
    let mut vertices = quad();
    let mut ctx = screen.begin_frame().unwrap();
    assert!(ctx.set_shader(Some(&shader)));
    assert!(!ctx.draw(Primitive::TriangleStrip, &mut vertices, None));
    assert_eq!(ctx.end_frame().unwrap().failed_draws, 1);
    assert_eq!(events.count("draw"), 0);
}

#[test]
fn test_vertex_upload_only_when_changed() {
    let (mut screen, events) = mock_screen();
    let shader = sprite_shader();
    let mut vertices = quad();

    let mut ctx = screen.begin_frame().unwrap();
    ctx.set_shader(Some(&shader));
    ctx.draw(Primitive::TriangleStrip, &mut vertices, None);
    ctx.draw(Primitive::TriangleStrip, &mut vertices, None);
    vertices.set_vertex_position(0, Vec3::ONE).unwrap();
    ctx.draw(Primitive::TriangleStrip, &mut vertices, None);
    ctx.end_frame().unwrap();

    assert_eq!(events.count("create_vertex_buffer"), 1);
    assert_eq!(events.count("upload_vertex_buffer"), 1);
    assert_eq!(events.count("draw"), 3);
}

// ============================================================================
// Shader / constant buffer tests
// ============================================================================

#[test]
fn test_set_shader_resends_matrices() {
    let (mut screen, events) = mock_screen();
    let shader = sprite_shader();
    let mut ctx = screen.begin_frame().unwrap();
    ctx.set_projection_matrix(Mat4::orthographic_rh(0.0, 10.0, 10.0, 0.0, -1.0, 1.0));
    events.clear();

    assert!(ctx.set_shader(Some(&shader)));
    assert_eq!(
        events.names(),
        vec!["create_shader", "bind_shader", "set_projection", "set_modelview"]
    );
    assert!(ctx.set_shader(None));
    assert!(ctx.active_shader().is_none());
    ctx.end_frame().unwrap();
}

#[test]
fn test_unavailable_shader_clears_active() {
    let mut driver = MockDriver::new();
    driver.refuse_shaders = true;
    let mut screen = Screen::new(ScreenConfig::default());
    screen.set_driver(Box::new(driver)).unwrap();

    let mut ctx = screen.begin_frame().unwrap();
    assert!(!ctx.set_shader(Some(&sprite_shader())));
    assert!(ctx.active_shader().is_none());
    ctx.end_frame().unwrap();
}

#[test]
fn test_assign_constant_buffer() {
    let (mut screen, events) = mock_screen();
    let template = ShaderConstantBufferTemplateBuilder::new()
        .with_entry(ValueType::Color4, 1, "tint")
        .build();
    let other = ShaderConstantBufferTemplateBuilder::new()
        .with_entry(ValueType::Float, 1, "time")
        .build();
    let shader = Shader::new_shared(ShaderDesc::new("tinted").with_constant_buffer("Material", template.clone()));
    let buffer = ShaderConstantBuffer::new_shared(template.clone());
    lock(&buffer).set_shader_value("tint", ShaderValue::Color4(glam::Vec4::ONE));

    let mut ctx = screen.begin_frame().unwrap();
    // No shader bound yet
    assert!(!ctx.assign_shader_constant_buffer(&template, &buffer));
    ctx.set_shader(Some(&shader));
    assert!(ctx.assign_shader_constant_buffer(&template, &buffer));
    assert!(!ctx.assign_shader_constant_buffer(&other, &buffer));
    ctx.end_frame().unwrap();

    assert_eq!(events.count("bind_constant_buffer"), 1);
    assert_eq!(events.count("upload_constant_buffer"), 1);
}

// ============================================================================
// Texture tests
// ============================================================================

#[test]
fn test_texture_units() {
    let (mut screen, events) = mock_screen();
    let tex = texture();
    let mut ctx = screen.begin_frame().unwrap();

    assert_eq!(ctx.max_texture_units(), 4);
    assert!(ctx.set_texture(0, Some(&tex)));
    assert!(ctx.set_texture(2, Some(&tex)));
    assert!(!ctx.set_texture(4, Some(&tex)));
    assert!(ctx.texture(2).is_some());

    ctx.prepare_texture_layers(1);
    assert!(ctx.texture(0).is_some());
    assert!(ctx.texture(2).is_none());

    ctx.clear_textures();
    assert!(ctx.texture(0).is_none());
    ctx.end_frame().unwrap();

    assert_eq!(events.count("create_texture"), 1);
    assert_eq!(events.count("bind_texture"), 2);
    assert_eq!(events.count("disable_texture_units"), 2);
}

// ============================================================================
// Render buffer stack tests
// ============================================================================

#[test]
fn test_render_buffer_stack_lifo() {
    let (mut screen, events) = mock_screen();
    let (outer, _) = RenderBuffer::with_color_target("outer", Rect::from_size(64.0, 64.0));
    let (inner, _) = RenderBuffer::with_color_target("inner", Rect::from_size(32.0, 32.0));

    let mut ctx = screen.begin_frame().unwrap();
    assert!(ctx.push_render_buffer(&outer));
    assert!(ctx.push_render_buffer(&inner));
    assert_eq!(ctx.render_buffer_depth(), 2);

    // Popping out of order is rejected and leaves the stack alone
    assert!(matches!(ctx.pop_render_buffer(&outer), Err(Error::InvalidState(_))));
    assert_eq!(ctx.render_buffer_depth(), 2);

    ctx.pop_render_buffer(&inner).unwrap();
    assert!(Arc::ptr_eq(ctx.active_render_buffer().unwrap(), &outer));
    ctx.pop_render_buffer(&outer).unwrap();
    assert!(ctx.pop_render_buffer(&outer).is_err());
    ctx.end_frame().unwrap();

    let binds: Vec<String> = events
        .names()
        .into_iter()
        .filter(|name| name.starts_with("bind_"))
        .collect();
    assert_eq!(
        binds,
        vec!["bind_render_target", "bind_render_target", "bind_render_target", "bind_screen"]
    );
}

#[test]
fn test_end_frame_unwinds_render_buffers() {
    let (mut screen, events) = mock_screen();
    let (buffer, _) = RenderBuffer::with_color_target("rb", Rect::from_size(8.0, 8.0));
    let mut ctx = screen.begin_frame().unwrap();
    assert!(ctx.push_render_buffer(&buffer));
    ctx.end_frame().unwrap();
    assert_eq!(events.count("bind_screen"), 1);
    assert_eq!(screen.tracked_count(), 1);
}

// ============================================================================
// Driver switch tests
// ============================================================================

#[test]
fn test_driver_switch_reloads_resources_bound_in_frame() {
    let (mut screen, _events) = mock_screen();
    let template = ShaderConstantBufferTemplateBuilder::new()
        .with_entry(ValueType::Color4, 1, "tint")
        .build();
    let shader = Shader::new_shared(
        ShaderDesc::new("tinted")
            .with_vertex_layout(VertexLayout::position_2d_textured(1))
            .with_constant_buffer("Material", template.clone()),
    );
    let buffer = ShaderConstantBuffer::new_shared(template.clone());
    let tex = texture();

    let mut ctx = screen.begin_frame().unwrap();
    assert!(ctx.set_shader(Some(&shader)));
    assert!(ctx.set_texture(0, Some(&tex)));
    assert!(ctx.assign_shader_constant_buffer(&template, &buffer));
    ctx.end_frame().unwrap();
    assert_eq!(screen.tracked_count(), 3);

    let replacement = MockDriver::named("replacement");
    let replacement_events = replacement.events();
    screen.set_driver(Box::new(replacement)).unwrap();

    assert_eq!(replacement_events.count("create_shader"), 1);
    assert_eq!(replacement_events.count("create_texture"), 1);
    assert_eq!(replacement_events.count("create_constant_buffer"), 1);

    screen.unload_driver();
    assert!(!lock(&shader).is_loaded());
    assert!(!lock(&tex).is_loaded());
    assert!(!lock(&buffer).is_loaded());
}
