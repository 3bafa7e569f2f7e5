pub mod scene;
pub mod style;
pub mod user;

pub use scene::{AspectRatio, Scene, SceneDraft, SceneId};
pub use style::StyleProfile;
pub use user::UserProfile;
