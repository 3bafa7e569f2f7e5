//! 身份令牌解码 - 业务能力层
//!
//! ## 信任边界（重要）
//!
//! 本模块只对登录组件返回的身份令牌做 **payload 解码**，用于填充
//! 用户展示信息，**不做任何签名校验**。令牌内容不可作为授权依据；
//! 如果部署环境要求验证身份，必须在上游补充签名校验，而不是
//! 依赖这里的解码结果。

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;

use crate::error::{AppError, AppResult, IdentityError};
use crate::models::UserProfile;

/// 身份令牌 payload 中我们关心的 claims
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    picture: String,
}

/// 解码身份令牌的 payload，取出用户展示信息
///
/// 只接受标准三段式 JWT；签名段不校验（见模块文档的信任边界说明）
pub fn decode_id_token(token: &str) -> AppResult<UserProfile> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_header), Some(payload), Some(_signature), None) => payload,
        _ => return Err(AppError::Identity(IdentityError::MalformedToken)),
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim()).map_err(|e| {
        AppError::Identity(IdentityError::PayloadDecodeFailed {
            source: Box::new(e),
        })
    })?;

    let claims: IdTokenClaims = serde_json::from_slice(&bytes).map_err(|e| {
        AppError::Identity(IdentityError::ClaimsParseFailed {
            source: Box::new(e),
        })
    })?;

    Ok(UserProfile {
        name: claims.name,
        email: claims.email,
        picture: claims.picture,
    })
}

/// 未配置登录时的固定演示身份
pub fn demo_user() -> UserProfile {
    UserProfile {
        name: "Demo User".to_string(),
        email: "demo@example.com".to_string(),
        picture: String::new(),
    }
}
