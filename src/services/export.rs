//! 分镜图片导出服务 - 业务能力层
//!
//! 浏览器端"点击下载"的对应物：把结果缓存里的 data URL 解码后
//! 按 `scene_<序号>.jpeg` 的命名写入导出目录。

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AppError, AppResult, FileError};

/// 分镜图片导出服务
pub struct ExportService {
    output_dir: PathBuf,
}

impl ExportService {
    /// 创建新的导出服务
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 确保导出目录存在
    pub async fn ensure_output_dir(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::file_write_failed(self.output_dir.display().to_string(), e))
    }

    /// 导出一张分镜图片，返回写入的文件路径
    pub async fn export(&self, scene_number: u32, image_url: &str) -> AppResult<PathBuf> {
        let bytes = decode_data_url(image_url)?;
        let path = self.output_dir.join(format!("scene_{}.jpeg", scene_number));

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        debug!("已导出分镜 {} -> {}", scene_number, path.display());
        Ok(path)
    }
}

/// 解码 `data:<mime>;base64,<payload>` 形式的图片 URL
fn decode_data_url(url: &str) -> AppResult<Vec<u8>> {
    if !url.starts_with("data:") {
        return Err(AppError::File(FileError::InvalidDataUrl {
            reason: "不是 data URL".to_string(),
        }));
    }

    let payload = url.split_once("base64,").map(|(_, p)| p).ok_or_else(|| {
        AppError::File(FileError::InvalidDataUrl {
            reason: "缺少 base64 数据段".to_string(),
        })
    })?;

    STANDARD.decode(payload.trim()).map_err(|e| {
        AppError::File(FileError::InvalidDataUrl {
            reason: e.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_url() {
        let url = format!("data:image/jpeg;base64,{}", STANDARD.encode(b"jpeg-bytes"));
        assert_eq!(decode_data_url(&url).unwrap(), b"jpeg-bytes");
    }

    #[test]
    fn test_decode_rejects_plain_url() {
        let err = decode_data_url("https://example.com/a.jpeg").unwrap_err();
        assert!(matches!(
            err,
            AppError::File(FileError::InvalidDataUrl { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_missing_payload() {
        let err = decode_data_url("data:image/jpeg;base64").unwrap_err();
        assert!(matches!(
            err,
            AppError::File(FileError::InvalidDataUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_export_writes_named_file() {
        let dir = std::env::temp_dir().join(format!(
            "storyboard_export_test_{}_{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));

        let service = ExportService::new(&dir);
        service.ensure_output_dir().await.unwrap();

        let url = format!("data:image/jpeg;base64,{}", STANDARD.encode(b"fake image"));
        let path = service.export(7, &url).await.unwrap();

        assert!(path.ends_with("scene_7.jpeg"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"fake image");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
