//! 分镜数据模型
//!
//! 剧本拆解后的每一个分镜（Scene）是本系统的基本处理单元

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 分镜唯一标识
///
/// 拆解完成时由 SessionState 统一分配，会话期间稳定且不会复用
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneId(String);

impl SceneId {
    pub fn new(seq: u64) -> Self {
        Self(format!("scene-{}", seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 一个分镜
///
/// `prompt` 是唯一允许后续修改的字段（用户可随时编辑，
/// 包括其他分镜正在生成的过程中）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// 分镜唯一标识
    pub id: SceneId,
    /// 分镜序号（从 1 开始，用于展示和导出文件名）
    pub scene_number: u32,
    /// 该分镜对应的剧本片段
    pub script: String,
    /// 图片生成提示词
    pub prompt: String,
}

/// 剧本拆解响应中的单个分镜条目
///
/// 文本模型被要求严格返回 `{scene, script, prompt}` 数组，
/// 这里是该数组元素的反序列化目标；id 由调用方另行分配
#[derive(Debug, Clone, Deserialize)]
pub struct SceneDraft {
    /// 分镜序号
    pub scene: u32,
    /// 剧本片段
    pub script: String,
    /// 图片生成提示词
    pub prompt: String,
}

/// 图片宽高比
///
/// 图片生成服务只接受 `16:9` 和 `9:16` 两种取值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    /// 横版 16:9
    Landscape16x9,
    /// 竖版 9:16
    Portrait9x16,
}

impl AspectRatio {
    /// 转换为 API 请求中的选择器字符串
    pub fn as_selector(&self) -> &'static str {
        match self {
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Portrait9x16 => "9:16",
        }
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Landscape16x9),
            "9:16" => Ok(AspectRatio::Portrait9x16),
            other => Err(format!("不支持的宽高比: {}", other)),
        }
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_selector())
    }
}
