//! 单分镜生成流程 - 流程层
//!
//! 核心职责：定义"一个分镜"的完整生成流程
//!
//! 流程顺序：
//! 1. 在途检查与标记（同一把锁内，硬保证不可重入）
//! 2. 合成提示词（当前分镜提示词 + 当前风格档案）
//! 3. 调用图片模型并等待完成
//! 4. 成功写缓存 / 失败保留旧结果，最后一定移出在途集合

use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::ImageGenerator;
use crate::error::{AppError, AppResult, GenerationError};
use crate::models::{AspectRatio, SceneId};
use crate::services::prompt;
use crate::session::SharedSession;

/// 单分镜生成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneOutcome {
    /// 生成成功，返回图片 URL 列表
    Generated(Vec<String>),
    /// 分镜不存在，按约定作为空操作跳过
    Skipped,
}

/// 单分镜生成流程
///
/// - 可由批量协调器驱动，也可由用户对单个分镜直接触发
/// - 只依赖图片生成能力接口，不关心具体服务商
/// - 不持有批量状态，不关心分镜之间的顺序
pub struct SceneFlow<G> {
    session: SharedSession,
    generator: Arc<G>,
    aspect_ratio: AspectRatio,
}

impl<G: ImageGenerator> SceneFlow<G> {
    /// 创建新的单分镜生成流程
    pub fn new(session: SharedSession, generator: Arc<G>, aspect_ratio: AspectRatio) -> Self {
        Self {
            session,
            generator,
            aspect_ratio,
        }
    }

    /// 为一个分镜生成图片
    ///
    /// 约定：
    /// - 分镜不存在：空操作（防御性分支，正常不会走到）
    /// - 分镜已在途：拒绝，不排队
    /// - 失败：不写缓存（旧结果保留），错误携带分镜展示序号
    /// - 无论成败，退出时一定把分镜移出在途集合
    pub async fn generate(&self, id: &SceneId) -> AppResult<SceneOutcome> {
        // 检查、合成提示词、标记在途，全部在同一把锁内完成
        let (scene_number, composed_prompt) = {
            let mut state = self.session.lock();

            let (scene_number, composed_prompt) = match state.scene(id) {
                Some(scene) => (scene.scene_number, prompt::compose(scene, state.style())),
                None => {
                    warn!("⚠️ 分镜 {} 不存在，跳过生成", id);
                    return Ok(SceneOutcome::Skipped);
                }
            };

            // 分镜此时必定存在，标记失败只可能是已在途
            if !state.try_begin_generation(id) {
                warn!("⚠️ 分镜 {} 已有请求在途，拒绝重复生成", scene_number);
                return Err(AppError::Generation(GenerationError::AlreadyInFlight {
                    scene_number,
                }));
            }

            (scene_number, composed_prompt)
        };

        info!("🖼️ 正在生成分镜 {} 的图片...", scene_number);

        // 锁已释放，远程调用期间其他分镜的状态可以正常读写
        let result = self.generator.generate(&composed_prompt, self.aspect_ratio).await;

        let mut state = self.session.lock();
        state.finish_generation(id);

        match result {
            Ok(urls) => {
                state.store_result(id, urls.clone());
                info!("✓ 分镜 {} 生成成功", scene_number);
                Ok(SceneOutcome::Generated(urls))
            }
            Err(e) => Err(AppError::scene_failed(scene_number, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::testing::ScriptedGenerator;
    use crate::models::{SceneDraft, StyleProfile};
    use crate::services::prompt::QUALITY_SUFFIX;

    fn session_with_scenes(n: u32) -> SharedSession {
        let session = SharedSession::new();
        let drafts = (1..=n)
            .map(|i| SceneDraft {
                scene: i,
                script: format!("第 {} 场", i),
                prompt: format!("scene {} prompt", i),
            })
            .collect();
        session.lock().load_scenes(drafts);
        session
    }

    fn flow(
        session: &SharedSession,
        generator: Arc<ScriptedGenerator>,
    ) -> SceneFlow<ScriptedGenerator> {
        SceneFlow::new(session.clone(), generator, AspectRatio::Landscape16x9)
    }

    #[tokio::test]
    async fn test_generate_success_stores_result_and_clears_status() {
        let session = session_with_scenes(1);
        let id = session.lock().scenes()[0].id.clone();
        let generator = Arc::new(ScriptedGenerator::with_outcomes([Ok(vec![
            "data:image/jpeg;base64,abc".to_string(),
        ])]));

        let outcome = flow(&session, generator.clone()).generate(&id).await.unwrap();

        assert_eq!(
            outcome,
            SceneOutcome::Generated(vec!["data:image/jpeg;base64,abc".to_string()])
        );
        let state = session.lock();
        assert_eq!(state.result(&id), Some(&vec!["data:image/jpeg;base64,abc".to_string()]));
        assert!(!state.is_in_flight(&id));
    }

    #[tokio::test]
    async fn test_status_is_set_exactly_during_flight() {
        let session = session_with_scenes(1);
        let id = session.lock().scenes()[0].id.clone();

        let generator = Arc::new(ScriptedGenerator::new());
        let observer_session = session.clone();
        let observer_id = id.clone();
        generator.set_on_call(move |_| {
            // 远程调用期间必须处于在途状态
            assert!(observer_session.lock().is_in_flight(&observer_id));
        });

        assert!(!session.lock().is_in_flight(&id));
        flow(&session, generator).generate(&id).await.unwrap();
        assert!(!session.lock().is_in_flight(&id));
    }

    #[tokio::test]
    async fn test_unknown_scene_is_noop() {
        let session = session_with_scenes(1);
        let generator = Arc::new(ScriptedGenerator::new());

        let outcome = flow(&session, generator.clone())
            .generate(&SceneId::new(999))
            .await
            .unwrap();

        assert_eq!(outcome, SceneOutcome::Skipped);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_request_is_rejected() {
        let session = session_with_scenes(1);
        let id = session.lock().scenes()[0].id.clone();
        let generator = Arc::new(ScriptedGenerator::new());

        // 模拟另一个调用方已把该分镜标记为在途
        assert!(session.lock().try_begin_generation(&id));

        let err = flow(&session, generator.clone()).generate(&id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Generation(GenerationError::AlreadyInFlight { scene_number: 1 })
        ));
        assert_eq!(generator.call_count(), 0);
        // 原调用方的在途标记不受影响
        assert!(session.lock().is_in_flight(&id));
    }

    #[tokio::test]
    async fn test_failure_keeps_prior_result_and_clears_status() {
        let session = session_with_scenes(1);
        let id = session.lock().scenes()[0].id.clone();
        session.lock().store_result(&id, vec!["old".to_string()]);

        let generator = Arc::new(ScriptedGenerator::with_outcomes([Err(
            "provider exploded".to_string()
        )]));

        let err = flow(&session, generator).generate(&id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Generation(GenerationError::SceneFailed { scene_number: 1, .. })
        ));

        let state = session.lock();
        assert_eq!(state.result(&id), Some(&vec!["old".to_string()]));
        assert!(!state.is_in_flight(&id));
    }

    #[tokio::test]
    async fn test_prompt_uses_current_style_profile() {
        let session = session_with_scenes(1);
        let id = session.lock().scenes()[0].id.clone();
        session.lock().set_style(StyleProfile {
            character_description: "a knight with a silver helmet".to_string(),
            artistic_style: "oil painting".to_string(),
        });

        let generator = Arc::new(ScriptedGenerator::new());
        flow(&session, generator.clone()).generate(&id).await.unwrap();

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("a knight with a silver helmet"));
        assert!(calls[0].contains("oil painting"));
        assert!(calls[0].ends_with(QUALITY_SUFFIX));
    }
}
