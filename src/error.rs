use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 模型服务调用错误
    Provider(ProviderError),
    /// 剧本拆解错误
    Decompose(DecomposeError),
    /// 风格分析错误
    Style(StyleError),
    /// 图片生成流程错误
    Generation(GenerationError),
    /// 身份令牌解析错误
    Identity(IdentityError),
    /// 文件操作错误
    File(FileError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Provider(e) => write!(f, "模型服务错误: {}", e),
            AppError::Decompose(e) => write!(f, "剧本拆解错误: {}", e),
            AppError::Style(e) => write!(f, "风格分析错误: {}", e),
            AppError::Generation(e) => write!(f, "图片生成错误: {}", e),
            AppError::Identity(e) => write!(f, "身份令牌错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Provider(e) => Some(e),
            AppError::Decompose(e) => Some(e),
            AppError::Style(e) => Some(e),
            AppError::Generation(e) => Some(e),
            AppError::Identity(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 模型服务调用错误
#[derive(Debug)]
pub enum ProviderError {
    /// 文本模型调用失败
    TextRequestFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 文本模型返回内容为空
    TextEmptyContent {
        model: String,
    },
    /// 图片模型调用失败
    ImageRequestFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 图片模型未返回任何图片
    ImageEmptyResult {
        model: String,
    },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::TextRequestFailed { model, source } => {
                write!(f, "文本模型调用失败 (模型: {}): {}", model, source)
            }
            ProviderError::TextEmptyContent { model } => {
                write!(f, "文本模型返回内容为空 (模型: {})", model)
            }
            ProviderError::ImageRequestFailed { model, source } => {
                write!(f, "图片模型调用失败 (模型: {}): {}", model, source)
            }
            ProviderError::ImageEmptyResult { model } => {
                write!(f, "图片模型未返回任何图片 (模型: {})", model)
            }
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProviderError::TextRequestFailed { source, .. }
            | ProviderError::ImageRequestFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 剧本拆解错误
///
/// 任何一种都意味着本次拆解整体失败，不保留部分分镜
#[derive(Debug)]
pub enum DecomposeError {
    /// 响应中找不到 JSON 数组
    NoJsonArray {
        preview: String,
    },
    /// JSON 数组解析失败
    ParseFailed {
        preview: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 拆解结果为空
    EmptyScenes,
    /// 分镜序号不合法（必须为正整数）
    InvalidSceneNumber {
        position: usize,
    },
}

impl fmt::Display for DecomposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecomposeError::NoJsonArray { preview } => {
                write!(f, "响应中找不到 JSON 数组: {}", preview)
            }
            DecomposeError::ParseFailed { preview, source } => {
                write!(f, "分镜 JSON 解析失败 (响应: {}): {}", preview, source)
            }
            DecomposeError::EmptyScenes => write!(f, "拆解结果为空，剧本未产生任何分镜"),
            DecomposeError::InvalidSceneNumber { position } => {
                write!(f, "第 {} 个分镜的序号不合法", position + 1)
            }
        }
    }
}

impl std::error::Error for DecomposeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecomposeError::ParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 风格分析错误
#[derive(Debug)]
pub enum StyleError {
    /// 响应中找不到 JSON 对象
    NoJsonObject {
        preview: String,
    },
    /// JSON 对象解析失败
    ParseFailed {
        preview: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 必填字段为空
    EmptyField {
        field: &'static str,
    },
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleError::NoJsonObject { preview } => {
                write!(f, "响应中找不到 JSON 对象: {}", preview)
            }
            StyleError::ParseFailed { preview, source } => {
                write!(f, "风格 JSON 解析失败 (响应: {}): {}", preview, source)
            }
            StyleError::EmptyField { field } => {
                write!(f, "风格档案字段 {} 为空", field)
            }
        }
    }
}

impl std::error::Error for StyleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StyleError::ParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 图片生成流程错误
#[derive(Debug)]
pub enum GenerationError {
    /// 该分镜已有请求在途，拒绝重复生成
    AlreadyInFlight {
        scene_number: u32,
    },
    /// 单个分镜生成失败（携带展示序号和底层原因）
    SceneFailed {
        scene_number: u32,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 已有批量任务在运行，拒绝重复启动
    BatchAlreadyRunning,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::AlreadyInFlight { scene_number } => {
                write!(f, "分镜 {} 正在生成中，已拒绝重复请求", scene_number)
            }
            GenerationError::SceneFailed {
                scene_number,
                source,
            } => {
                write!(f, "分镜 {} 生成失败: {}", scene_number, source)
            }
            GenerationError::BatchAlreadyRunning => {
                write!(f, "批量生成任务已在运行中，无法重复启动")
            }
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::SceneFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 身份令牌解析错误
///
/// 本系统只解码 payload，不做签名校验（信任边界见 services/identity.rs）
#[derive(Debug)]
pub enum IdentityError {
    /// 令牌格式不是三段式 JWT
    MalformedToken,
    /// payload 的 base64url 解码失败
    PayloadDecodeFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// claims JSON 解析失败
    ClaimsParseFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::MalformedToken => write!(f, "令牌不是合法的三段式 JWT"),
            IdentityError::PayloadDecodeFailed { source } => {
                write!(f, "令牌 payload 解码失败: {}", source)
            }
            IdentityError::ClaimsParseFailed { source } => {
                write!(f, "令牌 claims 解析失败: {}", source)
            }
        }
    }
}

impl std::error::Error for IdentityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IdentityError::PayloadDecodeFailed { source }
            | IdentityError::ClaimsParseFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            IdentityError::MalformedToken => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 图片 data URL 格式不合法
    InvalidDataUrl {
        reason: String,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::InvalidDataUrl { reason } => {
                write!(f, "图片 data URL 不合法: {}", reason)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. } | FileError::WriteFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            FileError::InvalidDataUrl { .. } => None,
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文本模型调用失败错误
    pub fn text_request_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Provider(ProviderError::TextRequestFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建图片模型调用失败错误
    pub fn image_request_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Provider(ProviderError::ImageRequestFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建单分镜生成失败错误
    pub fn scene_failed(
        scene_number: u32,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Generation(GenerationError::SceneFailed {
            scene_number,
            source: Box::new(source),
        })
    }

    /// 创建文件读取失败错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入失败错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
