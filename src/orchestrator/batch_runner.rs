//! 批量生成协调器 - 编排层
//!
//! ## 职责
//!
//! 1. **候选计算**：进入运行态时快照"尚无结果缓存"的分镜列表
//! 2. **严格串行**：一次只有一个分镜在生成，绝不并发
//! 3. **协作式取消**：停止信号只在迭代边界检查，在途请求总是跑完
//! 4. **节流**：每个候选处理完后等待固定间隔，尊重第三方限流
//! 5. **互斥**：同一时间只允许一个批量任务在运行
//!
//! 单个分镜的失败只影响它自己，批量继续推进。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::clients::ImageGenerator;
use crate::error::{AppError, AppResult, GenerationError};
use crate::session::SharedSession;
use crate::workflow::{SceneFlow, SceneOutcome};

/// 协作式停止信号
///
/// 外部可随时置位；批量循环只在迭代边界观察它，
/// 绝不打断在途的单分镜生成
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 置位停止信号
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// 清除停止信号
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 批量任务的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// 候选列表全部尝试完毕
    Completed,
    /// 被停止信号终止
    Stopped,
}

/// 一次批量任务的统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// 终态
    pub outcome: BatchOutcome,
    /// 候选总数（快照时尚无结果的分镜数）
    pub candidates: usize,
    /// 实际尝试的候选数
    pub attempted: usize,
    /// 成功数
    pub succeeded: usize,
    /// 失败数
    pub failed: usize,
}

/// 运行态标记的复位 guard
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 批量生成协调器
pub struct BatchRunner<G> {
    session: SharedSession,
    flow: Arc<SceneFlow<G>>,
    delay: Duration,
    running: AtomicBool,
}

impl<G: ImageGenerator> BatchRunner<G> {
    /// 创建新的批量协调器
    ///
    /// `delay` 是候选之间的固定节流间隔（不是重试）
    pub fn new(session: SharedSession, flow: Arc<SceneFlow<G>>, delay: Duration) -> Self {
        Self {
            session,
            flow,
            delay,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 为所有尚无结果的分镜依次生成图片
    ///
    /// 已有批量任务在运行时直接拒绝（原系统未定义该操作，
    /// 这里显式禁止而不是依赖界面把按钮禁掉）
    pub async fn run_all(&self, cancel: &CancelFlag) -> AppResult<BatchReport> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("⚠️ 批量生成任务已在运行中，本次启动被拒绝");
            return Err(AppError::Generation(GenerationError::BatchAlreadyRunning));
        }

        // 互斥标记在 guard 析构时复位，run_inner panic 也不例外
        let _guard = RunningGuard(&self.running);
        let report = self.run_inner(cancel).await;
        Ok(report)
    }

    async fn run_inner(&self, cancel: &CancelFlag) -> BatchReport {
        // 进入运行态：清除上一次遗留的停止信号，再快照候选列表
        cancel.clear();
        let candidates = self.session.lock().pending_scene_ids();

        log_batch_start(candidates.len());

        let mut report = BatchReport {
            outcome: BatchOutcome::Completed,
            candidates: candidates.len(),
            attempted: 0,
            succeeded: 0,
            failed: 0,
        };

        for (index, id) in candidates.iter().enumerate() {
            // 停止信号只在这里检查，在途请求不会被打断
            if cancel.is_set() {
                info!("🛑 收到停止信号，批量生成在第 {} 个候选前终止", index + 1);
                report.outcome = BatchOutcome::Stopped;
                break;
            }

            report.attempted += 1;
            match self.flow.generate(id).await {
                Ok(SceneOutcome::Generated(_)) => report.succeeded += 1,
                Ok(SceneOutcome::Skipped) => {
                    warn!("⚠️ 候选分镜 {} 已不存在，跳过", id);
                }
                Err(e) => {
                    // 单个分镜失败不中止批量
                    error!("❌ {}", e);
                    report.failed += 1;
                }
            }

            // 固定节流间隔，成功失败都要等
            if index + 1 < candidates.len() {
                sleep(self.delay).await;
            }
        }

        log_batch_complete(&report);
        report
    }
}

// ========== 日志辅助函数 ==========

fn log_batch_start(candidates: usize) {
    info!("{}", "=".repeat(60));
    info!("📦 开始批量生成，候选分镜: {} 个", candidates);
    info!("{}", "=".repeat(60));
}

fn log_batch_complete(report: &BatchReport) {
    let state = match report.outcome {
        BatchOutcome::Completed => "全部完成",
        BatchOutcome::Stopped => "已停止",
    };
    info!("{}", "─".repeat(60));
    info!(
        "✓ 批量生成{}: 成功 {}/{}, 失败 {}",
        state, report.succeeded, report.candidates, report.failed
    );
    info!("{}", "─".repeat(60));
}
