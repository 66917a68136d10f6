use anyhow::Result;
use glam::Vec3;
use stagecraft_engine::config::StudioConfig;
use stagecraft_engine::events::ConsoleStatusSink;
use stagecraft_engine::input::EditorCommand;
use stagecraft_engine::media::{MemoryJobQueue, MemoryUploader};
use stagecraft_engine::renderer::TestPatternRenderer;
use stagecraft_engine::scene::{NodeTransform, SceneGraph, SceneNode};
use stagecraft_engine::Editor;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Headless demo: builds a small scene, records it once, records it again
/// to show the cache hit, and prints every event the session produced.
fn main() {
    if let Err(err) = run() {
        eprintln!("[cli] {err:?}");
        std::process::exit(2);
    }
}

fn run() -> Result<()> {
    let config = StudioConfig::load_or_default("config/studio.json");
    let viewport = config.viewport.size();
    let export =
        config.presets.for_aspect(stagecraft_engine::camera_rig::AspectRatio::Horizontal16x9);
    let renderer = Box::new(TestPatternRenderer::new(viewport, export));
    let uploader = Arc::new(MemoryUploader::new());
    let jobs = Arc::new(MemoryJobQueue::new());
    let status = Arc::new(ConsoleStatusSink);

    let mut editor =
        Editor::new(config, demo_scene(), renderer, uploader.clone(), jobs.clone(), status);

    editor.commands.push(EditorCommand::StartRecording);
    drive_until_idle(&mut editor)?;

    // Second run over the unchanged scene goes through the cache.
    editor.commands.push(EditorCommand::StartRecording);
    drive_until_idle(&mut editor)?;

    for event in editor.events.drain() {
        println!("{event}");
    }
    println!("uploads={} jobs={}", uploader.upload_count(), jobs.job_count());
    Ok(())
}

fn demo_scene() -> SceneGraph {
    let mut scene = SceneGraph::new();
    scene.spawn(SceneNode::camera_rig());
    scene.spawn(
        SceneNode::mesh("floor").with_transform(NodeTransform::from_translation(Vec3::new(0.0, -0.5, 0.0))),
    );
    let hero = scene.spawn(SceneNode::character("hero"));
    if let Some(hips) = scene.spawn_child(hero, SceneNode::bone("hips")) {
        scene.spawn_child(hips, SceneNode::bone("spine"));
    }
    scene.spawn(SceneNode::light("key_light"));
    scene.spawn(SceneNode::helper("grid"));
    scene
}

fn drive_until_idle(editor: &mut Editor) -> Result<()> {
    let step = Duration::from_millis(17);
    let mut now = Instant::now();
    for _ in 0..2_000 {
        editor.tick(now)?;
        now += step;
        if editor.playback.state() == stagecraft_engine::playback::PlaybackState::Editing
            && !editor.playback.finalize_in_flight()
            && editor.commands.is_empty()
        {
            return Ok(());
        }
        std::thread::sleep(Duration::from_micros(200));
    }
    anyhow::bail!("demo recording never settled");
}
