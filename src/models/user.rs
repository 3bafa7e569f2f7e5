//! 用户信息模型

use serde::{Deserialize, Serialize};

/// 登录用户的展示信息
///
/// 来自身份令牌的 payload，或未配置登录时的固定演示身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// 显示名称
    pub name: String,
    /// 邮箱
    pub email: String,
    /// 头像 URL
    pub picture: String,
}
