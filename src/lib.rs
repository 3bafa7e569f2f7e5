//! # Script Storyboard
//!
//! 一个把剧本 PDF 拆解为分镜并批量生成分镜图片的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 持有远程模型连接，只暴露能力
//! - `TextClient` - 文本/视觉模型调用能力（OpenAI 兼容端点）
//! - `ImageClient` - 图片生成能力，实现 `ImageGenerator` 接口
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `DecomposeService` - PDF 剧本拆解为分镜列表
//! - `StyleService` - 角色参考图分析为风格档案
//! - `prompt` - 提示词合成（纯函数）
//! - `identity` - 身份令牌 payload 解码
//! - `ExportService` - 分镜图片导出
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个分镜"的完整生成流程
//! - `SceneFlow` - 在途标记 → 合成提示词 → 调用模型 → 写缓存
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_runner` - 批量生成协调器，串行节流与协作式取消
//! - `orchestrator/app` - 应用主结构，串起完整管道
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod session;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ImageClient, ImageGenerator, TextClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AspectRatio, Scene, SceneDraft, SceneId, StyleProfile, UserProfile};
pub use orchestrator::{App, BatchOutcome, BatchReport, BatchRunner, CancelFlag};
pub use session::{SessionState, SharedSession};
pub use workflow::{SceneFlow, SceneOutcome};
