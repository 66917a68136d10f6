pub mod app;
pub mod camera3d;
pub mod camera_rig;
pub mod capture;
pub mod config;
pub mod events;
pub mod freefly;
pub mod generation;
pub mod input;
pub mod media;
pub mod picking;
pub mod playback;
pub mod render_cache;
pub mod renderer;
pub mod scene;
pub mod scene_digest;
pub mod selection;
pub mod time;

pub use app::Editor;
