//! 角色风格档案
//!
//! 从用户上传的参考图分析得出，作用于之后所有分镜的提示词

use serde::{Deserialize, Serialize};

/// 角色风格档案
///
/// 每个会话最多存在一份；重新分析时整体替换，显式移除或分析失败时清空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleProfile {
    /// 角色外观描述（生成时要求逐字遵守）
    pub character_description: String,
    /// 画面艺术风格
    pub artistic_style: String,
}
