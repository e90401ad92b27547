//! 配置管理
//!
//! 提供统一的配置加载、验证和保存功能。配置来源依次为默认值、
//! TOML配置文件和 `DENTSCAN__*` 环境变量，后者覆盖前者。

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use dentscan_workflow::AnalysisTiming;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置数据
    config: Arc<RwLock<DentscanConfig>>,
    /// 配置文件路径
    config_path: Option<String>,
    /// 配置验证器
    validator: ConfigValidator,
}

/// DentScan系统完整配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DentscanConfig {
    /// 分析配置
    pub analysis: AnalysisConfig,
    /// 上传配置
    pub upload: UploadConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 分析配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 每个处理步骤的时长（毫秒）
    pub step_duration_ms: u64,
    /// 最后一步结束后到出结果的间隔（毫秒）
    pub settle_ms: u64,
    /// 进度信号间隔（毫秒）
    pub progress_interval_ms: u64,
}

impl AnalysisConfig {
    /// 转换为工作流使用的时间参数
    pub fn timing(&self) -> AnalysisTiming {
        AnalysisTiming {
            step_duration: Duration::from_millis(self.step_duration_ms),
            settle: Duration::from_millis(self.settle_ms),
            progress_interval: Duration::from_millis(self.progress_interval_ms),
        }
    }
}

/// 上传配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    /// 最大文件大小（字节）
    pub max_file_size_bytes: u64,
    /// 允许的文件扩展名（小写，不含点）
    pub allowed_extensions: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或过滤指令
    pub level: String,
    /// 输出格式
    pub format: LogFormat,
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Pretty,
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    /// 验证规则
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: &'static str,
    /// 验证函数
    validator: fn(&DentscanConfig) -> Result<()>,
    /// 错误消息
    error_message: &'static str,
}

impl ConfigManager {
    /// 创建新的配置管理器，`config_path` 为空时只使用默认值和环境变量
    pub fn new(config_path: Option<&str>) -> Result<Self> {
        let config = Self::load_config(config_path)?;
        let validator = ConfigValidator::new();
        validator.validate(&config)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: config_path.map(str::to_string),
            validator,
        })
    }

    /// 加载配置
    fn load_config(config_path: Option<&str>) -> Result<DentscanConfig> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&DentscanConfig::default())
                .context("Failed to build default configuration")?,
        );

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("DENTSCAN")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("upload.allowed_extensions"),
            )
            .build()
            .context("Failed to load configuration")?;

        let config: DentscanConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        match config_path {
            Some(path) => info!("Configuration loaded successfully from: {}", path),
            None => info!("Configuration loaded from defaults and environment"),
        }
        Ok(config)
    }

    /// 获取配置
    pub async fn get_config(&self) -> DentscanConfig {
        let config = self.config.read().await;
        config.clone()
    }

    /// 更新配置
    pub async fn update_config(&self, new_config: DentscanConfig) -> Result<()> {
        self.validator.validate(&new_config)?;

        {
            let mut config = self.config.write().await;
            *config = new_config;
        }

        if self.config_path.is_some() {
            self.save_config().await?;
        }

        info!("Configuration updated successfully");
        Ok(())
    }

    /// 保存配置到文件
    async fn save_config(&self) -> Result<()> {
        let Some(path) = &self.config_path else {
            return Ok(());
        };

        let config = self.config.read().await;
        let config_str = toml::to_string_pretty(&*config)
            .context("Failed to serialize configuration")?;

        tokio::fs::write(path, config_str)
            .await
            .context("Failed to write configuration file")?;

        info!("Configuration saved to: {}", path);
        Ok(())
    }

    /// 重新加载配置
    pub async fn reload_config(&self) -> Result<()> {
        let new_config = Self::load_config(self.config_path.as_deref())?;
        self.update_config(new_config).await
    }

    /// 验证配置
    pub async fn validate_config(&self) -> Result<()> {
        let config = self.config.read().await;
        self.validator.validate(&config)
    }
}

impl ConfigValidator {
    /// 创建新的配置验证器
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "analysis.step_duration_ms",
                validator: |config| {
                    if config.analysis.step_duration_ms == 0 {
                        Err(anyhow::anyhow!("Step duration cannot be 0"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid analysis step duration",
            },
            ValidationRule {
                field_path: "analysis.progress_interval_ms",
                validator: |config| {
                    if config.analysis.progress_interval_ms == 0 {
                        Err(anyhow::anyhow!("Progress interval cannot be 0"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid progress interval",
            },
            ValidationRule {
                field_path: "upload.max_file_size_bytes",
                validator: |config| {
                    if config.upload.max_file_size_bytes == 0 {
                        Err(anyhow::anyhow!("Max file size cannot be 0"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid upload size limit",
            },
            ValidationRule {
                field_path: "upload.allowed_extensions",
                validator: |config| {
                    if config.upload.allowed_extensions.iter().all(|e| e.trim().is_empty()) {
                        Err(anyhow::anyhow!("At least one file extension must be allowed"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid upload extensions",
            },
            ValidationRule {
                field_path: "logging.level",
                validator: |config| {
                    if config.logging.level.trim().is_empty() {
                        Err(anyhow::anyhow!("Log level cannot be empty"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid log level",
            },
        ];

        Self { validation_rules }
    }

    /// 验证配置
    pub fn validate(&self, config: &DentscanConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if let Err(e) = (rule.validator)(config) {
                error!("Configuration validation failed for {}: {}", rule.field_path, e);
                return Err(anyhow::anyhow!("{}: {}", rule.error_message, e));
            }
        }

        info!("Configuration validation passed");
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            step_duration_ms: 300,
            settle_ms: 500,
            progress_interval_ms: 50,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 10 * 1024 * 1024, // 10MB
            allowed_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}
