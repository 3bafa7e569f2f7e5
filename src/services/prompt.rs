//! 提示词合成 - 业务能力层
//!
//! 纯函数：同样的输入永远产生同样的输出（无随机、无时间依赖），
//! 这是可复现测试的前提。

use crate::models::{Scene, StyleProfile};

/// 固定的画质关键词后缀，追加在所有最终提示词的末尾
pub const QUALITY_SUFFIX: &str =
    "cinematic lighting, highly detailed, professional storyboard illustration";

/// 合成最终的图片生成提示词
///
/// - 无风格档案：分镜提示词直接拼接画质后缀
/// - 有风格档案：按模板嵌入艺术风格和分镜提示词，并附带
///   强制遵守条款，逐字引用角色描述，最后同样以画质后缀收尾
pub fn compose(scene: &Scene, style: Option<&StyleProfile>) -> String {
    match style {
        Some(profile) => format!(
            "{} style. {} The main character MUST strictly conform to this description: \"{}\". {}",
            profile.artistic_style, scene.prompt, profile.character_description, QUALITY_SUFFIX
        ),
        None => format!("{}, {}", scene.prompt, QUALITY_SUFFIX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SceneId;

    fn scene(prompt: &str) -> Scene {
        Scene {
            id: SceneId::new(1),
            scene_number: 1,
            script: "夜晚，侦探走进小巷".to_string(),
            prompt: prompt.to_string(),
        }
    }

    fn profile() -> StyleProfile {
        StyleProfile {
            character_description: "a tall detective in a gray trench coat with a red scarf"
                .to_string(),
            artistic_style: "film noir watercolor".to_string(),
        }
    }

    #[test]
    fn test_compose_is_deterministic() {
        let s = scene("a detective entering a dark alley at night");
        let p = profile();

        assert_eq!(compose(&s, None), compose(&s, None));
        assert_eq!(compose(&s, Some(&p)), compose(&s, Some(&p)));
    }

    #[test]
    fn test_compose_always_ends_with_quality_suffix() {
        let s = scene("a detective entering a dark alley at night");
        let p = profile();

        assert!(compose(&s, None).ends_with(QUALITY_SUFFIX));
        assert!(compose(&s, Some(&p)).ends_with(QUALITY_SUFFIX));
    }

    #[test]
    fn test_compose_without_style_contains_scene_prompt() {
        let s = scene("a red balloon drifting over the rooftops");
        let output = compose(&s, None);
        assert!(output.contains("a red balloon drifting over the rooftops"));
    }

    #[test]
    fn test_compose_with_style_quotes_profile_verbatim() {
        let s = scene("a detective entering a dark alley at night");
        let p = profile();
        let output = compose(&s, Some(&p));

        assert!(output.contains(&p.artistic_style));
        assert!(output.contains(&p.character_description));
        assert!(output.contains(&s.prompt));
    }
}
