// ==========================================
// 车队管理后台 - 批量导入命令行入口
// ==========================================
// 用法:
//   fleet-import template <entity> [out.xlsx]
//   fleet-import check <entity> <file> [errors.csv]
//   fleet-import import <entity> <file> [db_path]
// ==========================================

use anyhow::{bail, Context, Result};
use fleet_import::api::ImportApi;
use fleet_import::db::default_db_path;
use fleet_import::domain::EntityKind;
use fleet_import::{logging, APP_NAME, VERSION};
use std::path::Path;

fn usage() -> String {
    format!(
        "{} v{}\n\n用法:\n  fleet-import template <entity> [out.xlsx]\n  fleet-import check <entity> <file> [errors.csv]\n  fleet-import import <entity> <file> [db_path]\n\nentity: part | customer | vehicle | driver",
        APP_NAME, VERSION
    )
}

fn parse_entity(raw: Option<&String>) -> Result<EntityKind> {
    let raw = raw.context("缺少实体类型参数")?;
    raw.parse::<EntityKind>().map_err(anyhow::Error::msg)
}

fn read_input(path: Option<&String>) -> Result<(Vec<u8>, String)> {
    let path = path.context("缺少文件路径参数")?;
    let bytes = std::fs::read(path).with_context(|| format!("无法读取文件: {}", path))?;
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.clone());
    Ok((bytes, file_name))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", usage());
        return Ok(());
    };

    match command.as_str() {
        "template" => {
            let entity = parse_entity(args.get(1))?;
            let api = ImportApi::open(&default_db_path()).await?;
            let download = api.download_template(entity).await?;
            let out = args.get(2).cloned().unwrap_or(download.file_name);
            std::fs::write(&out, &download.bytes)
                .with_context(|| format!("无法写入模板: {}", out))?;
            println!("模板已生成: {}", out);
        }
        "check" => {
            let entity = parse_entity(args.get(1))?;
            let (bytes, file_name) = read_input(args.get(2))?;
            let api = ImportApi::open(&default_db_path()).await?;

            let snapshot = api.open_session(entity, bytes, &file_name).await?;
            let summary = snapshot.summary;
            println!(
                "共 {} 行，有效 {} 行，错误 {} 行",
                summary.total_rows, summary.valid_count, summary.error_row_count
            );

            if let Some(out) = args.get(3) {
                let report = api.export_errors(&snapshot.session_id, true).await?;
                std::fs::write(out, report)
                    .with_context(|| format!("无法写入错误报告: {}", out))?;
                println!("错误报告已写入: {}", out);
            }
            api.discard(&snapshot.session_id).await?;
        }
        "import" => {
            let entity = parse_entity(args.get(1))?;
            let (bytes, file_name) = read_input(args.get(2))?;
            let db_path = args.get(3).cloned().unwrap_or_else(default_db_path);
            let api = ImportApi::open(&db_path).await?;

            let snapshot = api.open_session(entity, bytes, &file_name).await?;
            if snapshot.summary.error_row_count > 0 || !snapshot.faults.is_empty() {
                bail!(
                    "{} 行存在错误，请先修正（可用 check 命令导出错误报告）",
                    snapshot.summary.error_row_count
                );
            }

            let receipt = api.commit(&snapshot.session_id).await?;
            println!(
                "导入成功: {} {} 行，批次 {}",
                receipt.entity, receipt.row_count, receipt.batch_id
            );
        }
        _ => {
            println!("{}", usage());
        }
    }

    Ok(())
}
