//! 图片生成模型客户端
//!
//! 调用 Imagen 风格的 `:predict` 端点，图片以内联 base64 字节返回，
//! 这里统一转换成 data URL 交给上层缓存和导出。

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::clients::ImageGenerator;
use crate::config::Config;
use crate::error::{AppError, AppResult, ProviderError};
use crate::models::AspectRatio;

/// 每次请求固定只要一张图
const SAMPLE_COUNT: u32 = 1;

/// 图片 API 的底层错误
#[derive(Error, Debug)]
pub enum ImageApiError {
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("图片 API 返回错误 (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

/// 图片生成模型客户端
#[derive(Debug, Clone)]
pub struct ImageClient {
    client: Client,
    api_key: String,
    base_url: String,
    model_name: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

impl ImageClient {
    /// 创建新的图片模型客户端
    ///
    /// 超时来自配置：远端卡死时该请求会在 deadline 处失败，
    /// 而不是无限期占住对应分镜
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Other(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.image_api_base_url.clone(),
            model_name: config.image_model_name.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn predict(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<Vec<String>, ImageApiError> {
        let endpoint = format!("{}/models/{}:predict", self.base_url, self.model_name);

        let request_body = json!({
            "instances": [
                {
                    "prompt": prompt
                }
            ],
            "parameters": {
                "sampleCount": SAMPLE_COUNT,
                "aspectRatio": aspect_ratio.as_selector()
            }
        });

        debug!("提交图片生成请求，宽高比: {}", aspect_ratio);

        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("图片 API 返回错误 (HTTP {}): {}", status, error_text);
            return Err(ImageApiError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let predict: PredictResponse = response.json().await?;

        let urls: Vec<String> = predict
            .predictions
            .into_iter()
            .filter_map(|p| {
                let bytes = p.bytes_base64_encoded?;
                let mime = p.mime_type.unwrap_or_else(|| "image/jpeg".to_string());
                Some(format!("data:{};base64,{}", mime, bytes))
            })
            .collect();

        Ok(urls)
    }
}

impl ImageGenerator for ImageClient {
    async fn generate(&self, prompt: &str, aspect_ratio: AspectRatio) -> AppResult<Vec<String>> {
        let urls = self
            .predict(prompt, aspect_ratio)
            .await
            .map_err(|e| AppError::image_request_failed(&self.model_name, e))?;

        if urls.is_empty() {
            return Err(AppError::Provider(ProviderError::ImageEmptyResult {
                model: self.model_name.clone(),
            }));
        }

        debug!("图片生成成功，返回 {} 张", urls.len());
        Ok(urls)
    }
}
