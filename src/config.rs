use crate::models::AspectRatio;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 模型服务 API Key（文本和图片共用）
    pub api_key: String,
    /// 文本模型 API 基地址（OpenAI 兼容端点）
    pub text_api_base_url: String,
    /// 文本模型名称
    pub text_model_name: String,
    /// 图片模型 API 基地址
    pub image_api_base_url: String,
    /// 图片模型名称
    pub image_model_name: String,
    /// 生成图片的宽高比
    pub aspect_ratio: AspectRatio,
    /// 批量生成的间隔（毫秒），用于尊重第三方限流
    pub batch_delay_ms: u64,
    /// 单次远程调用的超时（秒）
    pub request_timeout_secs: u64,
    /// Google 登录的身份令牌（可选，缺省时使用演示身份）
    pub google_id_token: Option<String>,
    /// 待处理的剧本 PDF 路径
    pub script_pdf: String,
    /// 角色参考图路径（可选）
    pub style_image: Option<String>,
    /// 分镜图片导出目录
    pub output_dir: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            text_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai"
                .to_string(),
            text_model_name: "gemini-2.0-flash".to_string(),
            image_api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            image_model_name: "imagen-3.0-generate-002".to_string(),
            aspect_ratio: AspectRatio::Landscape16x9,
            batch_delay_ms: 1000,
            request_timeout_secs: 120,
            google_id_token: None,
            script_pdf: "script.pdf".to_string(),
            style_image: None,
            output_dir: "storyboard".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or(default.api_key),
            text_api_base_url: std::env::var("TEXT_API_BASE_URL").unwrap_or(default.text_api_base_url),
            text_model_name: std::env::var("TEXT_MODEL_NAME").unwrap_or(default.text_model_name),
            image_api_base_url: std::env::var("IMAGE_API_BASE_URL").unwrap_or(default.image_api_base_url),
            image_model_name: std::env::var("IMAGE_MODEL_NAME").unwrap_or(default.image_model_name),
            aspect_ratio: std::env::var("ASPECT_RATIO").ok().and_then(|v| v.parse().ok()).unwrap_or(default.aspect_ratio),
            batch_delay_ms: std::env::var("BATCH_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.batch_delay_ms),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            google_id_token: std::env::var("GOOGLE_ID_TOKEN").ok(),
            script_pdf: std::env::var("SCRIPT_PDF").unwrap_or(default.script_pdf),
            style_image: std::env::var("STYLE_IMAGE").ok(),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}
