//! 终端输出和结果报告

use std::path::Path;

use anyhow::{Context, Result};
use migrator_domain::BatchResult;

const RULE_WIDTH: usize = 50;

pub fn progress_line(current: usize, total: usize) -> String {
    let percentage = if total == 0 {
        100.0
    } else {
        current as f64 / total as f64 * 100.0
    };
    format!("Progress: [{current}/{total}] {percentage:.1}%")
}

/// 最终的结果汇总
pub fn render_summary(result: &BatchResult) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        "=== 迁移结果汇总 ===".to_string(),
        rule.clone(),
        format!("仓库总数: {}", result.total()),
        format!("✓ 成功: {}", result.success()),
        format!("✗ 失败: {}", result.failed()),
    ];

    if !result.failed_names().is_empty() {
        lines.push(String::new());
        lines.push("失败的仓库:".to_string());
        for name in result.failed_names() {
            match result.detail(name).and_then(|d| d.error.as_deref()) {
                Some(error) => lines.push(format!("  - {name}: {error}")),
                None => lines.push(format!("  - {name}")),
            }
        }
    }

    lines.push(rule);
    lines.join("\n")
}

/// 把最终结果以JSON格式写入文件
pub fn write_json_report<P: AsRef<Path>>(path: P, result: &BatchResult) -> Result<()> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(result).context("序列化迁移结果失败")?;
    std::fs::write(path, content)
        .with_context(|| format!("写入结果报告失败: {}", path.display()))?;
    Ok(())
}
