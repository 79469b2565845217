use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use migrator_config::{AppConfig, LogConfig, LogLevel, OutputFormat};
use repo_migrator::report::{progress_line, render_summary, write_json_report};
use repo_migrator::MigrationApp;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Git仓库批量镜像迁移工具
#[derive(Parser, Debug)]
#[command(name = "repo-migrator")]
#[command(version = "1.0.0")]
#[command(about = "Git仓库批量镜像迁移工具")]
#[command(long_about = "按照配置文件中的任务列表，把源仓库完整镜像到目标仓库，支持并发执行和失败重试")]
struct Cli {
    /// 配置文件路径
    #[arg(default_value = "config.yaml")]
    config: PathBuf,

    /// 日志级别，覆盖配置文件
    #[arg(short, long)]
    log_level: Option<LogLevel>,

    /// 日志格式 (json, text, pretty)，覆盖配置文件
    #[arg(long)]
    log_format: Option<OutputFormat>,

    /// 日志文件路径，覆盖配置文件
    #[arg(long)]
    log_file: Option<String>,

    /// 跳过目标仓库访问验证
    #[arg(long)]
    skip_preflight: bool,

    /// 把最终结果以JSON格式写入该文件
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

impl Cli {
    fn log_config(&self, configured: &LogConfig) -> LogConfig {
        let mut log_config = configured.clone();
        if let Some(level) = self.log_level {
            log_config = log_config.with_level(level);
        }
        if let Some(format) = self.log_format {
            log_config = log_config.with_format(format);
        }
        if let Some(file) = &self.log_file {
            log_config = log_config.with_file_logging(file.clone());
        }
        log_config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("运行失败: {e:#}");
            eprintln!("错误: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// 返回批次是否全部成功
async fn run(cli: Cli) -> Result<bool> {
    // 配置加载期间的日志先交给只看命令行参数的临时订阅者
    let bootstrap = cli.log_config(&LogConfig::default());
    let loaded = tracing::subscriber::with_default(bootstrap_subscriber(&bootstrap), || {
        AppConfig::load(&cli.config)
    });
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            init_logging(&bootstrap)?;
            return Err(e).with_context(|| format!("加载配置文件失败: {}", cli.config.display()));
        }
    };

    init_logging(&cli.log_config(&config.logging))?;
    info!("=== 启动Git仓库迁移 ===");
    info!("配置文件: {}", cli.config.display());

    let app = MigrationApp::new(config).skip_preflight(cli.skip_preflight);
    let on_progress = |current: usize, total: usize| println!("{}", progress_line(current, total));
    let result = app.run(&on_progress).await?;

    println!("\n{}\n", render_summary(&result));

    if let Some(path) = &cli.report {
        write_json_report(path, &result)?;
        info!("结果报告已写入: {}", path.display());
    }

    Ok(result.is_success())
}

fn env_filter(log_config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_config.level.to_string()))
}

/// 只输出到stderr的临时订阅者
fn bootstrap_subscriber(log_config: &LogConfig) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_config))
        .with_writer(std::io::stderr)
        .compact()
        .finish()
}

/// 初始化日志系统
fn init_logging(log_config: &LogConfig) -> Result<()> {
    let env_filter = env_filter(log_config);

    let file_layer = match &log_config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("打开日志文件失败: {path}"))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    match log_config.format {
        OutputFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        OutputFormat::Pretty => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        OutputFormat::Text => {
            registry
                .with(tracing_subscriber::fmt::layer().compact())
                .try_init()
                .context("初始化Text日志格式失败")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_configured_logging() {
        let cli = Cli::parse_from([
            "repo-migrator",
            "catalog.yaml",
            "--log-level",
            "debug",
            "--log-file",
            "run.log",
        ]);
        let configured = LogConfig::default().with_format(OutputFormat::Json);

        let merged = cli.log_config(&configured);
        assert_eq!(merged.level, LogLevel::Debug);
        assert_eq!(merged.format, OutputFormat::Json);
        assert_eq!(merged.file.as_deref(), Some("run.log"));
    }

    #[test]
    fn test_config_load_logs_reach_bootstrap_subscriber() {
        let cli = Cli::parse_from(["repo-migrator", "--log-level", "info"]);
        let bootstrap = cli.log_config(&LogConfig::default());
        assert_eq!(bootstrap.level, LogLevel::Info);

        let enabled = tracing::subscriber::with_default(bootstrap_subscriber(&bootstrap), || {
            tracing::enabled!(tracing::Level::INFO)
        });
        assert!(enabled);
    }
}
