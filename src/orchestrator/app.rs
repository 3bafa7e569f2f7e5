//! 应用主结构 - 编排层
//!
//! 管道顺序：解析身份 -> 读取剧本 PDF -> 拆解分镜 ->
//! （可选）分析角色参考图 -> 批量生成 -> 导出图片 -> 统计。
//!
//! Ctrl-C 不会杀死进程，而是置位停止信号，让批量生成在
//! 下一个迭代边界优雅收尾，已完成的结果照常导出。

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::clients::{ImageClient, TextClient};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{SceneDraft, StyleProfile, UserProfile};
use crate::orchestrator::batch_runner::{BatchReport, BatchRunner, CancelFlag};
use crate::services::identity;
use crate::services::{DecomposeService, ExportService, StyleService};
use crate::session::SharedSession;
use crate::utils::logging;
use crate::workflow::SceneFlow;

/// 应用主结构
pub struct App {
    config: Config,
    session: SharedSession,
    runner: BatchRunner<ImageClient>,
    decompose_service: DecomposeService,
    style_service: StyleService,
    export_service: ExportService,
    user: UserProfile,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        if config.api_key.is_empty() {
            anyhow::bail!("未配置 GEMINI_API_KEY，无法调用模型服务");
        }

        let user = resolve_user(&config);
        log_startup(&config, &user);

        let text_client = TextClient::new(&config);
        let image_client = Arc::new(ImageClient::new(&config)?);

        let session = SharedSession::new();
        let flow = Arc::new(SceneFlow::new(
            session.clone(),
            image_client,
            config.aspect_ratio,
        ));
        let runner = BatchRunner::new(
            session.clone(),
            flow,
            Duration::from_millis(config.batch_delay_ms),
        );

        Ok(Self {
            decompose_service: DecomposeService::new(text_client.clone()),
            style_service: StyleService::new(text_client),
            export_service: ExportService::new(&config.output_dir),
            session,
            runner,
            user,
            config,
        })
    }

    /// 当前会话的用户身份
    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        // 拆解剧本
        let scene_count = self.load_script().await?;
        if scene_count == 0 {
            warn!("⚠️ 剧本未产生任何分镜，程序结束");
            return Ok(());
        }

        // 可选的风格档案
        if let Some(style_image) = self.config.style_image.clone() {
            self.apply_style_image(&style_image).await;
        }

        // Ctrl-C 置位停止信号，批量生成在迭代边界优雅收尾
        let cancel = CancelFlag::new();
        let cancel_for_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("🛑 收到 Ctrl-C，将在当前分镜完成后停止批量生成");
                cancel_for_signal.set();
            }
        });

        let report = self.runner.run_all(&cancel).await?;

        // 导出已有结果
        let exported = self.export_results().await?;

        print_final_stats(&report, exported, &self.config);
        Ok(())
    }

    /// 读取剧本 PDF 并拆解为分镜，返回分镜数量
    async fn load_script(&self) -> Result<usize> {
        let pdf_path = &self.config.script_pdf;
        let pdf_bytes = tokio::fs::read(pdf_path)
            .await
            .map_err(|e| AppError::file_read_failed(pdf_path.clone(), e))?;

        let result = self.decompose_service.decompose(&pdf_bytes).await;
        let count = apply_decompose_result(&self.session, result).context("剧本拆解失败")?;
        Ok(count)
    }

    /// 分析角色参考图并写入风格档案
    async fn apply_style_image(&self, path: &str) {
        let result = match tokio::fs::read(path).await {
            Ok(bytes) => {
                self.style_service
                    .analyze(&bytes, guess_image_mime(path))
                    .await
            }
            Err(e) => Err(AppError::file_read_failed(path, e)),
        };
        apply_style_result(&self.session, result);
    }

    /// 把所有已有结果的分镜导出为图片文件，返回导出数量
    async fn export_results(&self) -> Result<usize> {
        let completed = self.session.lock().completed_scenes();
        if completed.is_empty() {
            warn!("⚠️ 没有可导出的分镜图片");
            return Ok(0);
        }

        self.export_service.ensure_output_dir().await?;

        let mut exported = 0;
        for (scene, urls) in &completed {
            // 每个分镜只有一张图，导出第一个 URL
            let Some(url) = urls.first() else { continue };
            match self.export_service.export(scene.scene_number, url).await {
                Ok(path) => {
                    info!("💾 分镜 {} 已导出: {}", scene.scene_number, path.display());
                    exported += 1;
                }
                Err(e) => error!("❌ 分镜 {} 导出失败: {}", scene.scene_number, e),
            }
        }

        Ok(exported)
    }
}

/// 把拆解结果写入会话
///
/// 成功时载入新分镜（旧缓存键全部失效），失败时清空分镜列表，
/// 绝不保留部分分镜
fn apply_decompose_result(
    session: &SharedSession,
    result: AppResult<Vec<SceneDraft>>,
) -> AppResult<usize> {
    match result {
        Ok(drafts) => Ok(session.lock().load_scenes(drafts)),
        Err(e) => {
            session.lock().clear_scenes();
            Err(e)
        }
    }
}

/// 把风格分析结果写入会话
///
/// 成功时整体替换档案，失败时清空已有档案并继续管道
/// （风格是增强项，不是前置条件），绝不留下半套状态
fn apply_style_result(session: &SharedSession, result: AppResult<StyleProfile>) {
    match result {
        Ok(profile) => session.lock().set_style(profile),
        Err(e) => {
            error!("❌ 风格分析失败，本次生成不使用风格档案: {}", e);
            session.lock().clear_style();
        }
    }
}

/// 解析当前用户身份
///
/// 配置了身份令牌就解码展示信息，没配置或解码失败都退回演示身份
fn resolve_user(config: &Config) -> UserProfile {
    match &config.google_id_token {
        Some(token) => match identity::decode_id_token(token) {
            Ok(user) => user,
            Err(e) => {
                warn!("⚠️ 身份令牌解析失败，使用演示身份: {}", e);
                identity::demo_user()
            }
        },
        None => identity::demo_user(),
    }
}

/// 根据扩展名猜测参考图的 MIME 类型
fn guess_image_mime(path: &str) -> &'static str {
    match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config, user: &UserProfile) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 剧本分镜生成模式");
    info!("👤 当前用户: {} <{}>", user.name, user.email);
    info!("📝 文本模型: {}", config.text_model_name);
    info!("🖼️ 图片模型: {} ({})", config.image_model_name, config.aspect_ratio);
    info!("{}", "=".repeat(60));
}

fn print_final_stats(report: &BatchReport, exported: usize, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.succeeded, report.candidates);
    info!("❌ 失败: {}", report.failed);
    info!("💾 已导出: {} 张，目录: {}", exported, config.output_dir);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecomposeError, StyleError};

    fn drafts(n: u32) -> Vec<SceneDraft> {
        (1..=n)
            .map(|i| SceneDraft {
                scene: i,
                script: format!("第 {} 场", i),
                prompt: format!("scene {} prompt", i),
            })
            .collect()
    }

    fn sample_profile() -> StyleProfile {
        StyleProfile {
            character_description: "a knight with a silver helmet".to_string(),
            artistic_style: "oil painting".to_string(),
        }
    }

    #[test]
    fn test_decompose_success_replaces_scene_list() {
        let session = SharedSession::new();
        apply_decompose_result(&session, Ok(drafts(1))).unwrap();

        let count = apply_decompose_result(&session, Ok(drafts(3))).unwrap();
        assert_eq!(count, 3);
        assert_eq!(session.lock().scenes().len(), 3);
    }

    #[test]
    fn test_decompose_failure_resets_scene_list() {
        let session = SharedSession::new();
        apply_decompose_result(&session, Ok(drafts(2))).unwrap();
        let id = session.lock().scenes()[0].id.clone();
        session.lock().store_result(&id, vec!["u".to_string()]);

        let outcome = apply_decompose_result(
            &session,
            Err(AppError::Decompose(DecomposeError::EmptyScenes)),
        );
        assert!(outcome.is_err());

        // 拆解失败不保留部分分镜，旧缓存一并清空
        let state = session.lock();
        assert!(state.scenes().is_empty());
        assert_eq!(state.results_count(), 0);
    }

    #[test]
    fn test_style_success_replaces_profile() {
        let session = SharedSession::new();
        apply_style_result(&session, Ok(sample_profile()));
        assert_eq!(session.lock().style(), Some(&sample_profile()));
    }

    #[test]
    fn test_style_failure_clears_active_profile() {
        let session = SharedSession::new();
        session.lock().set_style(sample_profile());

        apply_style_result(
            &session,
            Err(AppError::Style(StyleError::NoJsonObject {
                preview: "这张图片我看不清。".to_string(),
            })),
        );
        assert!(session.lock().style().is_none());
    }

    #[test]
    fn test_guess_image_mime() {
        assert_eq!(guess_image_mime("ref.png"), "image/png");
        assert_eq!(guess_image_mime("ref.PNG"), "image/png");
        assert_eq!(guess_image_mime("ref.webp"), "image/webp");
        assert_eq!(guess_image_mime("ref.jpg"), "image/jpeg");
        assert_eq!(guess_image_mime("ref"), "image/jpeg");
    }

    #[test]
    fn test_resolve_user_without_token_is_demo() {
        let config = Config::default();
        let user = resolve_user(&config);
        assert_eq!(user.name, "Demo User");
    }

    #[test]
    fn test_resolve_user_with_bad_token_falls_back() {
        let config = Config {
            google_id_token: Some("not-a-jwt".to_string()),
            ..Config::default()
        };
        let user = resolve_user(&config);
        assert_eq!(user.email, "demo@example.com");
    }
}
