use glam::Vec3;
use stagecraft_engine::camera_rig::AspectRatio;
use stagecraft_engine::config::StudioConfig;
use stagecraft_engine::events::{MemoryStatusSink, StudioEvent, ToastKind};
use stagecraft_engine::input::EditorCommand;
use stagecraft_engine::media::{MemoryJobQueue, MemoryUploader};
use stagecraft_engine::renderer::TestPatternRenderer;
use stagecraft_engine::scene::{NodeTransform, SceneGraph, SceneNode};
use stagecraft_engine::selection::InteractionMode;
use stagecraft_engine::Editor;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn rigged_scene() -> SceneGraph {
    let mut scene = SceneGraph::new();
    scene.spawn(SceneNode::camera_rig());
    // The character sits where the default edit camera looks.
    let hero = scene.spawn(
        SceneNode::character("hero").with_transform(NodeTransform::from_translation(Vec3::new(0.0, 1.0, 0.0))),
    );
    let hips = scene.spawn_child(hero, SceneNode::bone("hips")).expect("hips");
    scene.spawn_child(hips, SceneNode::bone("spine")).expect("spine");
    scene.spawn_child(hips, SceneNode::bone("hips_end")).expect("end bone");
    scene.spawn(
        SceneNode::mesh("crate").with_transform(NodeTransform::from_translation(Vec3::new(5.0, 0.0, 0.0))),
    );
    scene
}

fn make_editor() -> (Editor, Arc<MemoryStatusSink>) {
    let config = StudioConfig::default();
    let viewport = config.viewport.size();
    let export = config.presets.for_aspect(AspectRatio::Horizontal16x9);
    let renderer = Box::new(TestPatternRenderer::new(viewport, export));
    let status = Arc::new(MemoryStatusSink::new());
    let editor = Editor::new(
        config,
        rigged_scene(),
        renderer,
        Arc::new(MemoryUploader::new()),
        Arc::new(MemoryJobQueue::new()),
        status.clone(),
    );
    (editor, status)
}

fn tick(editor: &mut Editor, now: &mut Instant) {
    *now += Duration::from_millis(20);
    editor.tick(*now).expect("tick");
}

#[test]
fn click_selects_top_level_character() {
    let (mut editor, _status) = make_editor();
    let mut now = Instant::now();
    // Center of the viewport, straight at the character.
    editor.commands.push(EditorCommand::PointerClick { x: 640.0, y: 360.0 });
    tick(&mut editor, &mut now);

    let hero = editor.scene.find_by_name("hero").expect("hero");
    assert_eq!(editor.selection.selected(), Some(hero));
    assert_eq!(editor.selection.mode(), InteractionMode::Transform);
    let events = editor.events.drain();
    assert!(events.iter().any(|e| matches!(e, StudioEvent::SelectionChanged)));
}

#[test]
fn fk_toggle_on_character_builds_bone_targets() {
    let (mut editor, _status) = make_editor();
    let mut now = Instant::now();
    let hero = editor.scene.find_by_name("hero").expect("hero");
    editor.selection.select(&editor.scene, hero);

    editor.commands.push(EditorCommand::ToggleFkMode);
    tick(&mut editor, &mut now);

    assert_eq!(editor.selection.mode(), InteractionMode::ForwardKinematics);
    // hips and spine get targets; hips_end is denylisted.
    assert_eq!(editor.selection.bone_targets().len(), 2);
    let events = editor.events.drain();
    assert!(events.iter().any(|e| matches!(e, StudioEvent::FkModeChanged { active: true })));
}

#[test]
fn fk_toggle_on_mesh_is_rejected_with_a_toast() {
    let (mut editor, status) = make_editor();
    let mut now = Instant::now();
    let crate_node = editor.scene.find_by_name("crate").expect("crate");
    editor.selection.select(&editor.scene, crate_node);

    editor.commands.push(EditorCommand::ToggleFkMode);
    tick(&mut editor, &mut now);

    assert_eq!(editor.selection.mode(), InteractionMode::Transform);
    assert_eq!(status.toast_count(ToastKind::Error), 1);
    let events = editor.events.drain();
    assert!(!events.iter().any(|e| matches!(e, StudioEvent::FkModeChanged { .. })));
}

#[test]
fn deleting_the_posed_character_leaves_fk_cleanly() {
    let (mut editor, _status) = make_editor();
    let mut now = Instant::now();
    let hero = editor.scene.find_by_name("hero").expect("hero");
    editor.selection.select(&editor.scene, hero);
    editor.commands.push(EditorCommand::ToggleFkMode);
    tick(&mut editor, &mut now);
    assert_eq!(editor.selection.mode(), InteractionMode::ForwardKinematics);

    editor.commands.push(EditorCommand::DeleteSelected);
    tick(&mut editor, &mut now);

    assert!(!editor.scene.contains(hero));
    assert!(editor.scene.find_by_name("hips").is_none(), "bones removed with the character");
    assert_eq!(editor.selection.mode(), InteractionMode::None);
    assert!(editor.selection.selected().is_none());
    assert!(editor.selection.bone_targets().is_empty());
}

#[test]
fn deselect_command_clears_handles() {
    let (mut editor, _status) = make_editor();
    let mut now = Instant::now();
    let hero = editor.scene.find_by_name("hero").expect("hero");
    editor.selection.select(&editor.scene, hero);
    assert!(editor.selection.handle().is_some());

    editor.commands.push(EditorCommand::Deselect);
    tick(&mut editor, &mut now);

    assert!(editor.selection.selected().is_none());
    assert!(editor.selection.handle().is_none());
}

#[test]
fn scrub_while_locked_resnaps_the_edit_camera() {
    let (mut editor, _status) = make_editor();
    let mut now = Instant::now();
    // Move the rig node somewhere distinctive.
    let rig = editor.scene.rig_node().expect("rig node");
    editor.scene.get_mut(rig).unwrap().transform =
        NodeTransform::from_translation(Vec3::new(7.0, 2.0, 7.0));

    editor.commands.push(EditorCommand::ScrubTo(10));
    tick(&mut editor, &mut now);

    assert_eq!(editor.playback.cursor(), 10);
    assert!((editor.rig.edit_camera.position - Vec3::new(7.0, 2.0, 7.0)).length() < 1e-4);
    assert!((editor.rig.export_camera.position - Vec3::new(7.0, 2.0, 7.0)).length() < 1e-4);
}
