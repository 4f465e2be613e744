use super::*;
use std::sync::{Arc, Mutex};

use glam::Vec3;

use crate::device::mock_driver::{mock_screen, MockDriver};
use crate::device::{Screen, ScreenConfig};
use crate::utils::lock;

// ============================================================================
// Helpers
// ============================================================================

type Log = Arc<Mutex<Vec<String>>>;

/// Content recording every hook call into a shared log
struct Recorder {
    name: String,
    log: Log,
    skip: bool,
}

impl Recorder {
    fn boxed(name: &str, log: &Log) -> Box<dyn NodeContent> {
        Box::new(Self { name: name.to_string(), log: log.clone(), skip: false })
    }
}

impl NodeContent for Recorder {
    fn begin_render(&mut self, _ctx: &mut RenderContext<'_>, _world: &Mat4) -> bool {
        lock(&self.log).push(format!("begin:{}", self.name));
        !self.skip
    }

    fn draw(&mut self, ctx: &mut RenderContext<'_>, world: &Mat4) {
        assert_eq!(ctx.modelview_matrix(), *world);
        lock(&self.log).push(format!("draw:{}", self.name));
    }

    fn end_render(&mut self, _ctx: &mut RenderContext<'_>, _world: &Mat4) {
        lock(&self.log).push(format!("end:{}", self.name));
    }

    fn on_viewport_changed(&mut self, _old: &Rect, new: &Rect) {
        lock(&self.log).push(format!("viewport:{}:{}x{}", self.name, new.width, new.height));
    }
}

fn draws(log: &Log) -> Vec<String> {
    lock(log).iter().filter(|entry| entry.starts_with("draw:")).cloned().collect()
}

fn screen_of(width: u32, height: u32) -> Screen {
    let mut driver = MockDriver::new();
    driver.resolution = winit::dpi::PhysicalSize::new(width, height);
    let mut screen = Screen::new(ScreenConfig::default());
    screen.set_driver(Box::new(driver)).unwrap();
    screen
}

fn render(scene: &mut Scene, screen: &mut Screen) {
    let mut ctx = screen.begin_frame().unwrap();
    scene.render(&mut ctx);
    ctx.end_frame().unwrap();
}

fn assert_point(transform: Mat4, point: Vec3, expected: Vec3) {
    let actual = transform.transform_point3(point);
    assert!(actual.abs_diff_eq(expected, 1e-4), "{actual} != {expected}");
}

// ============================================================================
// Hierarchy tests
// ============================================================================

#[test]
fn test_new_scene_has_root_viewport() {
    let scene = Scene::new();
    assert_eq!(scene.node_count(), 1);
    let root = scene.node(scene.root()).unwrap();
    assert_eq!(root.name(), "root");
    assert_eq!(root.viewport().unwrap().scale_mode(), ScaleMode::INHERIT);
}

#[test]
fn test_children_sorted_by_order_stable() {
    let mut scene = Scene::new();
    let root = scene.root();
    let mut keys = Vec::new();
    for (name, order) in [("a", 3), ("b", -1), ("c", 0), ("d", -2), ("e", 0)] {
        let key = scene.create_node(name);
        scene.set_order(key, order).unwrap();
        scene.add_child(root, key).unwrap();
        keys.push(key);
    }
    let names: Vec<&str> = scene
        .node(root)
        .unwrap()
        .children()
        .iter()
        .map(|key| scene.node(*key).unwrap().name())
        .collect();
    assert_eq!(names, vec!["d", "b", "c", "e", "a"]);

    // Reordering moves the node behind its new equals
    scene.set_order(keys[3], 0).unwrap();
    assert_eq!(
        scene.node(root).unwrap().children(),
        &[keys[1], keys[2], keys[4], keys[3], keys[0]]
    );
}

#[test]
fn test_add_child_rejects_invalid_links() {
    let mut scene = Scene::new();
    let root = scene.root();
    let a = scene.create_node("a");
    let b = scene.create_node("b");
    scene.add_child(root, a).unwrap();
    scene.add_child(a, b).unwrap();

    // Already parented
    assert!(matches!(scene.add_child(root, b), Err(Error::InvalidState(_))));
    // Root cannot be a child
    assert!(matches!(scene.add_child(b, root), Err(Error::InvalidState(_))));

    // Cycle through a detached subtree
    scene.detach_child(root, a).unwrap();
    assert!(matches!(scene.add_child(b, a), Err(Error::InvalidState(_))));
    assert_eq!(scene.node(a).unwrap().parent(), None);
}

#[test]
fn test_detach_keeps_and_remove_destroys() {
    let mut scene = Scene::new();
    let root = scene.root();
    let a = scene.create_node("a");
    let b = scene.create_node("b");
    scene.add_child(root, a).unwrap();
    scene.add_child(a, b).unwrap();

    scene.detach_child(root, a).unwrap();
    assert_eq!(scene.node_count(), 3);
    assert!(scene.node(root).unwrap().children().is_empty());
    assert!(scene.detach_child(root, a).is_err());

    scene.add_child(root, a).unwrap();
    scene.remove_child(root, a).unwrap();
    assert_eq!(scene.node_count(), 1);
    assert!(!scene.contains(b));
    assert!(matches!(scene.set_visible(b, false), Err(Error::NotFound(_))));
}

#[test]
fn test_remove_node_refuses_root() {
    let mut scene = Scene::new();
    let root = scene.root();
    assert!(matches!(scene.remove_node(root), Err(Error::InvalidState(_))));
    let a = scene.create_node("a");
    scene.remove_node(a).unwrap();
    assert_eq!(scene.node_count(), 1);
}

#[test]
fn test_find_node() {
    let mut scene = Scene::new();
    let root = scene.root();
    let a = scene.create_node("a");
    let b = scene.create_node("target");
    scene.add_child(root, a).unwrap();
    scene.add_child(a, b).unwrap();
    assert_eq!(scene.find_node("target"), Some(b));
    assert_eq!(scene.find_node("missing"), None);
    let detached = scene.create_node("detached");
    assert!(scene.contains(detached));
    assert_eq!(scene.find_node("detached"), None);
}

// ============================================================================
// Transform tests
// ============================================================================

#[test]
fn test_dirty_propagates_to_subtree_only() {
    let mut scene = Scene::new();
    let root = scene.root();
    let a = scene.create_node_2d("a", Vec2::ZERO);
    let b = scene.create_node_2d("b", Vec2::ZERO);
    let c = scene.create_node_2d("c", Vec2::ZERO);
    scene.add_child(root, a).unwrap();
    scene.add_child(a, b).unwrap();
    scene.add_child(b, c).unwrap();

    scene.update_transform(c).unwrap();
    for key in [root, a, b, c] {
        assert!(!scene.is_transform_dirty(key));
    }

    scene.set_position(b, Vec2::new(1.0, 0.0)).unwrap();
    assert!(!scene.is_transform_dirty(root));
    assert!(!scene.is_transform_dirty(a));
    assert!(scene.is_transform_dirty(b));
    assert!(scene.is_transform_dirty(c));

    // Reading the leaf pulls the dirty ancestor first
    assert_point(scene.world_transform(c).unwrap(), Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
    assert!(!scene.is_transform_dirty(b));
}

#[test]
fn test_world_is_parent_world_times_local() {
    let mut scene = Scene::new();
    let root = scene.root();
    let parent = scene.create_node_2d("parent", Vec2::new(10.0, 0.0));
    let child = scene.create_node_2d("child", Vec2::new(1.0, 0.0));
    scene.add_child(root, parent).unwrap();
    scene.add_child(parent, child).unwrap();
    scene.set_rotation(parent, std::f32::consts::FRAC_PI_2).unwrap();
    scene.set_scale(parent, Vec2::splat(2.0)).unwrap();

    let parent_world = scene.world_transform(parent).unwrap();
    let child_local = scene.local_transform(child).unwrap();
    let child_world = scene.world_transform(child).unwrap();
    assert!(child_world.abs_diff_eq(parent_world * child_local, 1e-5));
    // Scaled by 2, rotated a quarter turn, then moved
    assert_point(child_world, Vec3::ZERO, Vec3::new(10.0, 2.0, 0.0));
}

#[test]
fn test_plain_node_local_transform() {
    let mut scene = Scene::new();
    let root = scene.root();
    let plain = scene.create_node("plain");
    let node_2d = scene.create_node_2d("2d", Vec2::ZERO);
    scene.add_child(root, plain).unwrap();

    let translation = Mat4::from_translation(Vec3::new(3.0, 4.0, 0.0));
    scene.set_local_transform(plain, translation).unwrap();
    assert_eq!(scene.world_transform(plain).unwrap(), translation);

    assert!(matches!(scene.set_local_transform(node_2d, translation), Err(Error::InvalidState(_))));
    assert!(matches!(scene.set_position(plain, Vec2::ONE), Err(Error::InvalidState(_))));
    assert!(matches!(scene.set_scale_mode(plain, ScaleMode::INHERIT), Err(Error::InvalidState(_))));
}

#[test]
fn test_reattach_recomputes_world() {
    let mut scene = Scene::new();
    let root = scene.root();
    let a = scene.create_node_2d("a", Vec2::new(5.0, 0.0));
    let b = scene.create_node_2d("b", Vec2::new(0.0, 5.0));
    let child = scene.create_node_2d("child", Vec2::ZERO);
    scene.add_child(root, a).unwrap();
    scene.add_child(root, b).unwrap();
    scene.add_child(a, child).unwrap();
    assert_point(scene.world_transform(child).unwrap(), Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0));

    scene.detach_child(a, child).unwrap();
    scene.add_child(b, child).unwrap();
    assert_point(scene.world_transform(child).unwrap(), Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0));
}

// ============================================================================
// Viewport tests
// ============================================================================

#[test]
fn test_root_viewport_covers_screen() {
    let mut scene = Scene::new();
    let root = scene.root();
    scene.set_screen_size(Vec2::new(640.0, 480.0));
    assert_eq!(scene.viewport_rect(root).unwrap(), Rect::from_size(640.0, 480.0));
    assert_eq!(scene.parent_viewport(root).unwrap(), Rect::from_size(640.0, 480.0));
}

#[test]
fn test_nested_viewport_fits_parent() {
    let mut scene = Scene::new();
    let root = scene.root();
    let viewport = scene.create_viewport("ui", Vec2::new(100.0, 100.0), ScaleMode::SCALE_BY_WIDTH_OR_HEIGHT);
    let item = scene.create_node_2d("item", Vec2::new(100.0, 100.0));
    scene.add_child(root, viewport).unwrap();
    scene.add_child(viewport, item).unwrap();
    scene.set_screen_size(Vec2::new(200.0, 50.0));

    assert_eq!(scene.viewport_rect(viewport).unwrap(), Rect::from_size(100.0, 100.0));
    assert_eq!(scene.node(viewport).unwrap().viewport().unwrap().scale(), 0.5);
    assert_eq!(scene.parent_viewport(item).unwrap(), Rect::from_size(100.0, 100.0));
    // Logical (100, 100) lands at the bottom-right of the centered 50x50 area
    assert_point(scene.world_transform(item).unwrap(), Vec3::ZERO, Vec3::new(125.0, 50.0, 0.0));

    scene.set_scale_mode(viewport, ScaleMode::SCALE_BY_WIDTH_OR_HEIGHT | ScaleMode::EXTEND_WIDTH).unwrap();
    assert_eq!(scene.viewport_rect(viewport).unwrap(), Rect::from_size(400.0, 100.0));
    assert!(matches!(scene.viewport_rect(item), Err(Error::InvalidState(_))));
}

#[test]
fn test_viewport_change_notifies_content() {
    let log: Log = Arc::default();
    let mut scene = Scene::new();
    let root = scene.root();
    let viewport = scene.create_viewport("vp", Vec2::new(100.0, 50.0), ScaleMode::SCALE_BY_WIDTH | ScaleMode::EXTEND_HEIGHT);
    scene.set_content(viewport, Recorder::boxed("vp", &log)).unwrap();
    scene.add_child(root, viewport).unwrap();

    scene.set_screen_size(Vec2::new(200.0, 200.0));
    scene.update_transform(viewport).unwrap();
    // Same screen: nothing to report
    scene.set_screen_size(Vec2::new(200.0, 200.0));
    scene.update_transform(viewport).unwrap();
    scene.set_screen_size(Vec2::new(200.0, 400.0));
    scene.update_transform(viewport).unwrap();

    assert_eq!(*lock(&log), vec!["viewport:vp:100x100", "viewport:vp:100x200"]);
}

// ============================================================================
// Render traversal tests
// ============================================================================

#[test]
fn test_self_draw_placement_by_order() {
    let log: Log = Arc::default();
    let (mut screen, _events) = mock_screen();
    let mut scene = Scene::new();
    let root = scene.root();
    let parent = scene.create_node_2d("parent", Vec2::ZERO);
    scene.set_content(parent, Recorder::boxed("parent", &log)).unwrap();
    scene.add_child(root, parent).unwrap();
    for order in [3, 0, -1, -2] {
        let name = order.to_string();
        let child = scene.create_node_2d(&name, Vec2::ZERO);
        scene.set_content(child, Recorder::boxed(&name, &log)).unwrap();
        scene.set_order(child, order).unwrap();
        scene.add_child(parent, child).unwrap();
    }

    render(&mut scene, &mut screen);
    assert_eq!(
        draws(&log),
        vec!["draw:-2", "draw:-1", "draw:parent", "draw:0", "draw:3"]
    );
    let log = lock(&log);
    assert_eq!(log.first().map(String::as_str), Some("begin:parent"));
    assert_eq!(log.last().map(String::as_str), Some("end:parent"));
}

#[test]
fn test_invisible_node_skips_subtree() {
    let log: Log = Arc::default();
    let (mut screen, _events) = mock_screen();
    let mut scene = Scene::new();
    let root = scene.root();
    let hidden = scene.create_node("hidden");
    let child = scene.create_node("child");
    scene.set_content(hidden, Recorder::boxed("hidden", &log)).unwrap();
    scene.set_content(child, Recorder::boxed("child", &log)).unwrap();
    scene.add_child(root, hidden).unwrap();
    scene.add_child(hidden, child).unwrap();

    scene.set_visible(hidden, false).unwrap();
    render(&mut scene, &mut screen);
    assert!(lock(&log).is_empty());

    scene.set_visible(hidden, true).unwrap();
    render(&mut scene, &mut screen);
    assert_eq!(draws(&log), vec!["draw:hidden", "draw:child"]);
}

#[test]
fn test_refused_begin_render_skips_subtree() {
    let log: Log = Arc::default();
    let (mut screen, _events) = mock_screen();
    let mut scene = Scene::new();
    let root = scene.root();
    let gate = scene.create_node("gate");
    let child = scene.create_node("child");
    scene.set_content(gate, Box::new(Recorder { name: "gate".into(), log: log.clone(), skip: true })).unwrap();
    scene.set_content(child, Recorder::boxed("child", &log)).unwrap();
    scene.add_child(root, gate).unwrap();
    scene.add_child(gate, child).unwrap();

    render(&mut scene, &mut screen);
    assert_eq!(*lock(&log), vec!["begin:gate"]);
}

#[test]
fn test_render_tracks_screen_resolution() {
    let mut screen = screen_of(320, 240);
    let mut scene = Scene::new();
    let root = scene.root();
    render(&mut scene, &mut screen);
    assert_eq!(scene.screen_size(), Vec2::new(320.0, 240.0));
    assert_eq!(scene.viewport_rect(root).unwrap(), Rect::from_size(320.0, 240.0));

    screen.resize(winit::dpi::PhysicalSize::new(640, 480));
    render(&mut scene, &mut screen);
    assert_eq!(scene.viewport_rect(root).unwrap(), Rect::from_size(640.0, 480.0));
}

#[test]
fn test_render_sets_pixel_projection() {
    let (mut screen, events) = mock_screen();
    let mut scene = Scene::new();
    render(&mut scene, &mut screen);
    assert_eq!(events.projection(), Mat4::orthographic_rh(0.0, 800.0, 600.0, 0.0, -1.0, 1.0));
}

#[test]
fn test_light_node_follows_world_position() {
    use crate::lighting::LightSource;
    use crate::scene::LightNode;

    let mut scene = Scene::new();
    let root = scene.root();
    let arm = scene.create_node_2d("arm", Vec2::new(10.0, 0.0));
    let lamp = scene.create_node_2d("lamp", Vec2::new(0.0, 5.0));
    let light = LightSource::new_shared(Vec3::ZERO);
    scene.set_content(lamp, Box::new(LightNode::new(light.clone()))).unwrap();
    scene.add_child(root, arm).unwrap();
    scene.add_child(arm, lamp).unwrap();

    scene.update_transform(lamp).unwrap();
    assert_eq!(lock(&light).position(), Vec3::new(10.0, 5.0, 0.0));

    scene.set_position(arm, Vec2::new(20.0, 0.0)).unwrap();
    scene.update_transform(lamp).unwrap();
    assert_eq!(lock(&light).position(), Vec3::new(20.0, 5.0, 0.0));
}
