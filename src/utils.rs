use crate::prelude::*;
use std::fs::{self, File};
use std::io::{BufReader, Read};

/// 対象ディレクトリを探索して、指定拡張子のファイルのパスの配列を返す
pub fn glob(target: &Path, target_ext: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for file_path in fs::read_dir(target)? {
        let file_path = file_path?.path();
        if file_path.is_dir() {
            if recursive {
                let mut _files = glob(&file_path, target_ext, true)?;
                files.append(&mut _files);
            }
        } else if let Some(file_ext) = file_path.extension() {
            if file_ext == target_ext {
                files.push(file_path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// 指定パスのファイルをStringに読み出して返す
pub fn get_text(path: &Path) -> Result<String> {
    let f = File::open(path)
        .map_err(|e| anyhow::anyhow!("couldn't open {}: {}", path.display(), e))?;
    // バッファリングされたストリーム
    let mut br = BufReader::new(f);
    let mut text = String::new();
    br.read_to_string(&mut text)
        .map_err(|e| anyhow::anyhow!("couldn't read {}: {}", path.display(), e))?;
    Ok(text)
}
