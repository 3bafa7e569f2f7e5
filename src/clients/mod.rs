pub mod image_client;
pub mod text_client;

pub use image_client::ImageClient;
pub use text_client::TextClient;

use crate::error::AppResult;
use crate::models::AspectRatio;

/// 图片生成能力
///
/// 工作流和批量协调器只依赖这个接口，不关心具体服务商；
/// 测试中用脚本化的假实现替换真实客户端
#[allow(async_fn_in_trait)]
pub trait ImageGenerator: Send + Sync {
    /// 根据提示词生成图片，返回图片 URL 列表（实际长度为 1）
    async fn generate(&self, prompt: &str, aspect_ratio: AspectRatio) -> AppResult<Vec<String>>;
}
