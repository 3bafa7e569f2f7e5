pub mod scene_flow;

pub use scene_flow::{SceneFlow, SceneOutcome};
