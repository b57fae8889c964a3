// 报告导出 - 把汇总好的报告落盘为JSON/CSV
//
// PDF等排版格式由外层展示壳负责，这里只提供结构化导出

use super::CareReport;
use crate::models::ExportFormat;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// 报告导出器
pub struct ReportExporter;

impl ReportExporter {
    /// 导出报告到指定目录，返回生成的文件路径
    pub async fn export(
        report: &CareReport,
        format: ExportFormat,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(output_dir).await?;

        let file_name = format!(
            "care-report-{}.{}",
            sanitize_file_stem(&report.period_label),
            format.extension()
        );
        let path = output_dir.join(file_name);

        let content = match format {
            ExportFormat::Json => serde_json::to_string_pretty(report)?,
            ExportFormat::Csv => render_csv(report),
        };

        tokio::fs::write(&path, content).await?;
        info!("报告已导出: {:?}", path);

        Ok(path)
    }
}

/// 时间段标签转文件名（空格等字符替换为连字符）
fn sanitize_file_stem(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

/// 渲染CSV（含表头）
fn render_csv(report: &CareReport) -> String {
    let mut out = String::from("id,kind,title,details,timestamp,severity,warning\n");

    for entry in &report.entries {
        let fields = [
            entry.id.as_str(),
            entry.kind.as_str(),
            entry.title.as_str(),
            entry.details.as_str(),
            entry.timestamp.as_str(),
            entry.severity.as_deref().unwrap_or(""),
            entry.warning.as_deref().unwrap_or(""),
        ];
        let row: Vec<String> = fields.iter().map(|f| escape_csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// CSV字段转义 - 含逗号/引号/换行的字段加引号包裹
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
