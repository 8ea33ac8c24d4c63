use crate::model::TableRow;
use crate::prelude::*;
use std::fs::{DirBuilder, File};
use tracing::info;

/// 出力先に日時のディレクトリを作成し、表示中のテーブルをCSVに保存する
pub fn export_table<T: TableRow>(export_dir: &Path, name: &str, rows: &[T]) -> Result<PathBuf> {
    let now_str = Local::now().format("%Y-%m-%d-%H%M%S").to_string();
    let save_dir = export_dir.join(&now_str);
    if !save_dir.exists() {
        DirBuilder::new().recursive(true).create(&save_dir)?;
    }

    let mut save_path = save_dir.join(name);
    save_path.set_extension("csv");

    let file = File::create(&save_path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(T::HEADER)?;
    for row in rows {
        writer.write_record(row.cells())?;
    }
    writer.flush()?;

    info!(path = %save_path.display(), rows = rows.len(), "table exported");
    Ok(save_path)
}
