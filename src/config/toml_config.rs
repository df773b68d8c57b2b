use crate::core::query::QuerySpec;
use crate::domain::ports::ConfigProvider;
use crate::domain::report::SortDirection;
use crate::utils::error::{FundingError, Result};
use crate::utils::validation::{
    validate_allowed_values, validate_path, validate_positive_number, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const OUTPUT_FORMATS: [&str; 2] = ["csv", "json"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub query: QueryDefaults,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    pub search_fields: Option<Vec<String>>,
    pub sort_key: Option<String>,
    pub sort_direction: SortDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub compress: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            output_formats: OUTPUT_FORMATS.iter().map(|f| f.to_string()).collect(),
            compress: true,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FundingError::ConfigValidation {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FUNDING_API_TOKEN})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FundingError::ConfigValidation {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Query defaults from the `[query]` section.
    pub fn base_query(&self) -> QuerySpec {
        let mut spec = QuerySpec::new();
        if let Some(fields) = &self.query.search_fields {
            spec = spec.search_in(fields.iter().cloned());
        }
        if let Some(key) = &self.query.sort_key {
            spec = spec.sorted_by(key, self.query.sort_direction);
        }
        spec
    }

    /// A blank token counts as no token.
    pub fn token(&self) -> Option<&str> {
        self.api
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.starts_with("${"))
    }
}

impl ConfigProvider for AppConfig {
    fn api_base_url(&self) -> &str {
        &self.api.base_url
    }

    fn output_path(&self) -> &str {
        &self.export.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.export.output_formats
    }

    fn compress_output(&self) -> bool {
        self.export.compress
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        // 驗證 API 位址
        validate_url("api.base_url", &self.api.base_url)?;

        // 驗證逾時秒數
        validate_positive_number("api.timeout_seconds", self.api.timeout_seconds, 1)?;

        // 驗證輸出路徑
        validate_path("export.output_path", &self.export.output_path)?;

        // 驗證輸出格式
        if self.export.output_formats.is_empty() {
            return Err(FundingError::ConfigValidation {
                field: "export.output_formats".to_string(),
                message: "At least one output format is required".to_string(),
            });
        }
        validate_allowed_values("export.output_formats", &self.export.output_formats, &OUTPUT_FORMATS)
    }
}
