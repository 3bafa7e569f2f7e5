//! 风格分析服务 - 业务能力层
//!
//! 只负责"参考图 -> 风格档案"能力，不关心流程。
//! 分析失败时由调用方负责清空已有档案，绝不留下半套状态。

use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::clients::TextClient;
use crate::error::{AppError, AppResult, StyleError};
use crate::models::StyleProfile;
use crate::utils::logging::truncate_text;

/// 固定的分析指令：要求严格的 `{character_description, artistic_style}` 对象
const STYLE_INSTRUCTION: &str = "Analyze the attached character reference image. Return ONLY \
a strict JSON object with exactly these keys: \"character_description\" (a detailed physical \
description of the character, including clothing and colors), \"artistic_style\" (a concise \
description of the artistic style of the image). Do not return any other text.";

const STYLE_SYSTEM: &str = "You are a professional art director. You describe characters and \
artistic styles precisely and always answer with strict JSON only.";

/// 模型响应的反序列化目标
#[derive(Debug, Deserialize)]
struct StyleResponse {
    character_description: String,
    artistic_style: String,
}

/// 风格分析服务
pub struct StyleService {
    client: TextClient,
}

impl StyleService {
    /// 创建新的风格分析服务
    pub fn new(client: TextClient) -> Self {
        Self { client }
    }

    /// 分析角色参考图，得到风格档案
    ///
    /// # 参数
    /// - `image_bytes`: 参考图原始字节
    /// - `mime_type`: 图片 MIME 类型（如 `image/png`）
    pub async fn analyze(&self, image_bytes: &[u8], mime_type: &str) -> AppResult<StyleProfile> {
        info!("🎨 正在分析角色参考图 ({} 字节)...", image_bytes.len());

        let data_url = format!("data:{};base64,{}", mime_type, STANDARD.encode(image_bytes));

        let raw = self
            .client
            .send(STYLE_INSTRUCTION, Some(STYLE_SYSTEM), Some(&[data_url]))
            .await?;

        debug!("风格分析响应长度: {} 字符", raw.len());

        let profile = parse_style_response(&raw)?;
        info!("✓ 风格分析完成: {}", truncate_text(&profile.artistic_style, 60));
        Ok(profile)
    }
}

/// 解析文本模型返回的风格档案
fn parse_style_response(raw: &str) -> AppResult<StyleProfile> {
    let cleaned = strip_markdown_fences(raw);

    let json_text = extract_json_object(cleaned).ok_or_else(|| {
        AppError::Style(StyleError::NoJsonObject {
            preview: truncate_text(raw, 120),
        })
    })?;

    let response: StyleResponse = serde_json::from_str(json_text).map_err(|e| {
        AppError::Style(StyleError::ParseFailed {
            preview: truncate_text(raw, 120),
            source: Box::new(e),
        })
    })?;

    if response.character_description.trim().is_empty() {
        return Err(AppError::Style(StyleError::EmptyField {
            field: "character_description",
        }));
    }
    if response.artistic_style.trim().is_empty() {
        return Err(AppError::Style(StyleError::EmptyField {
            field: "artistic_style",
        }));
    }

    Ok(StyleProfile {
        character_description: response.character_description,
        artistic_style: response.artistic_style,
    })
}

fn strip_markdown_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// 提取响应中最外层的 JSON 对象
fn extract_json_object(text: &str) -> Option<&str> {
    if let Ok(re) = Regex::new(r"(?s)\{.*\}") {
        if let Some(m) = re.find(text) {
            return Some(m.as_str());
        }
    }
    None
}
