//! 剧本拆解服务 - 业务能力层
//!
//! 只负责"PDF 剧本 -> 分镜列表"能力，不关心流程。
//! PDF 本身不在本地解析，整个文档交给远端文本模型处理。

use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use tracing::{debug, info};

use crate::clients::TextClient;
use crate::error::{AppError, AppResult, DecomposeError};
use crate::models::SceneDraft;
use crate::utils::logging::truncate_text;

/// 固定的拆解指令：要求严格的 `{scene, script, prompt}` JSON 数组
const DECOMPOSE_INSTRUCTION: &str = "Analyze the attached script document and break it down \
into storyboard scenes. Return ONLY a strict JSON array in which every element is an object \
with exactly these keys: \"scene\" (positive integer, sequential scene number), \"script\" \
(the script excerpt covered by this scene), \"prompt\" (a detailed English image-generation \
prompt describing the visual content of the scene). Do not return any other text.";

const DECOMPOSE_SYSTEM: &str = "You are a professional storyboard assistant. You convert \
scripts into structured scene lists and always answer with strict JSON only.";

/// 剧本拆解服务
///
/// 职责：
/// - 把 PDF 字节交给文本模型并取回分镜数组
/// - 严格校验响应结构，解析失败即整体失败，不保留部分分镜
/// - 不分配 id，不接触会话状态
pub struct DecomposeService {
    client: TextClient,
}

impl DecomposeService {
    /// 创建新的拆解服务
    pub fn new(client: TextClient) -> Self {
        Self { client }
    }

    /// 把 PDF 剧本拆解为分镜列表
    pub async fn decompose(&self, pdf_bytes: &[u8]) -> AppResult<Vec<SceneDraft>> {
        info!("📖 正在拆解剧本 (PDF {} 字节)...", pdf_bytes.len());

        let data_url = format!("data:application/pdf;base64,{}", STANDARD.encode(pdf_bytes));

        let raw = self
            .client
            .send(DECOMPOSE_INSTRUCTION, Some(DECOMPOSE_SYSTEM), Some(&[data_url]))
            .await?;

        debug!("拆解响应长度: {} 字符", raw.len());

        let drafts = parse_scene_response(&raw)?;
        info!("✓ 拆解出 {} 个分镜", drafts.len());
        Ok(drafts)
    }
}

/// 解析文本模型返回的分镜数组
///
/// 模型偶尔会把 JSON 包在 markdown 代码块或说明文字里，
/// 这里先剥掉围栏再提取最外层数组，之后严格按 schema 解析
fn parse_scene_response(raw: &str) -> AppResult<Vec<SceneDraft>> {
    let cleaned = strip_markdown_fences(raw);

    let json_text = extract_json_array(cleaned).ok_or_else(|| {
        AppError::Decompose(DecomposeError::NoJsonArray {
            preview: truncate_text(raw, 120),
        })
    })?;

    let drafts: Vec<SceneDraft> = serde_json::from_str(json_text).map_err(|e| {
        AppError::Decompose(DecomposeError::ParseFailed {
            preview: truncate_text(raw, 120),
            source: Box::new(e),
        })
    })?;

    if drafts.is_empty() {
        return Err(AppError::Decompose(DecomposeError::EmptyScenes));
    }

    for (position, draft) in drafts.iter().enumerate() {
        if draft.scene == 0 {
            return Err(AppError::Decompose(DecomposeError::InvalidSceneNumber {
                position,
            }));
        }
    }

    Ok(drafts)
}

/// 剥掉可能的 markdown 代码块围栏
fn strip_markdown_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// 提取响应中最外层的 JSON 数组
fn extract_json_array(text: &str) -> Option<&str> {
    if let Ok(re) = Regex::new(r"(?s)\[.*\]") {
        if let Some(m) = re.find(text) {
            return Some(m.as_str());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_array() {
        let raw = r#"[
            {"scene": 1, "script": "开场", "prompt": "a sunrise over the city"},
            {"scene": 2, "script": "相遇", "prompt": "two people meet at a cafe"}
        ]"#;

        let drafts = parse_scene_response(raw).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].scene, 1);
        assert_eq!(drafts[1].prompt, "two people meet at a cafe");
    }

    #[test]
    fn test_parse_fenced_array() {
        let raw = "```json\n[{\"scene\": 1, \"script\": \"s\", \"prompt\": \"p\"}]\n```";
        let drafts = parse_scene_response(raw).unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn test_parse_array_with_surrounding_prose() {
        let raw = "好的，以下是拆解结果：\n[{\"scene\": 1, \"script\": \"s\", \"prompt\": \"p\"}]\n希望对你有帮助。";
        let drafts = parse_scene_response(raw).unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn test_parse_rejects_missing_json() {
        let err = parse_scene_response("抱歉，我无法处理这个文档。").unwrap_err();
        assert!(matches!(
            err,
            AppError::Decompose(DecomposeError::NoJsonArray { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_schema_violation() {
        // 缺少 prompt 字段
        let raw = r#"[{"scene": 1, "script": "s"}]"#;
        let err = parse_scene_response(raw).unwrap_err();
        assert!(matches!(
            err,
            AppError::Decompose(DecomposeError::ParseFailed { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_empty_array() {
        let err = parse_scene_response("[]").unwrap_err();
        assert!(matches!(
            err,
            AppError::Decompose(DecomposeError::EmptyScenes)
        ));
    }

    #[test]
    fn test_parse_rejects_zero_scene_number() {
        let raw = r#"[{"scene": 0, "script": "s", "prompt": "p"}]"#;
        let err = parse_scene_response(raw).unwrap_err();
        assert!(matches!(
            err,
            AppError::Decompose(DecomposeError::InvalidSceneNumber { position: 0 })
        ));
    }
}
