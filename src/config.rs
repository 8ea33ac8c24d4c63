use crate::prelude::*;
use serde::Deserialize;
use std::env;
use std::fs::{DirBuilder, File};
use std::io::{BufWriter, Write};
use std::time::Duration;

const DEFAULT_CONFIG: &str = r#"
[api]
base_url = "http://localhost:5000"
timeout_secs = 30

[export]
directory = '{CUR}/data/export/'

[log]
file = '{CUR}/log/carrental-tui.log'
level = "info"
"#;

/// 環境変数でAPIのURLを上書きできる
pub const API_URL_ENV: &str = "CARRENTAL_API_URL";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub export: ExportConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}
impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub directory: PathBuf,
}
impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data/export"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub file: PathBuf,
    pub level: String,
}
impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("log/carrental-tui.log"),
            level: "info".to_string(),
        }
    }
}

// toml形式の設定ファイルを読み込む
pub fn load_config() -> Result<Config> {
    // 当プログラムのディレクトリ
    let cur_path = env::current_exe()?;
    let cur_dir = cur_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    // 当プログラムのディレクトリ配下に存在するtomlファイルを全て読み込む
    let mut conf_toml_str = String::new();
    for path in glob(&cur_dir, "toml", true)? {
        conf_toml_str.push_str(&get_text(&path)?);
        conf_toml_str.push('\n');
    }

    // 設定を1件も取得できていなければデフォルトを書き出す
    if conf_toml_str.trim().is_empty() {
        let path = cur_dir.join("config").join("config.toml");
        write_default_config(&path)?;
        conf_toml_str = DEFAULT_CONFIG.to_string();
    }

    let mut config = parse_config(&conf_toml_str, &cur_dir)?;
    apply_env(&mut config, env::var(API_URL_ENV).ok());
    Ok(config)
}

/// 環境変数の値が空でなければAPIのURLを置き換える
pub fn apply_env(config: &mut Config, api_url: Option<String>) {
    if let Some(url) = api_url {
        let url = url.trim();
        if !url.is_empty() {
            config.api.base_url = url.to_string();
        }
    }
}

/// 「{CUR}」は当プログラムが存在するディレクトリに置換する。
/// パスに「\」を含む場合があるので、{CUR}はリテラル文字列('...')の中で使う
pub fn parse_config(text: &str, cur_dir: &Path) -> Result<Config> {
    let text = text.replace("{CUR}", &cur_dir.display().to_string());
    let config: Config = toml::from_str(&text)
        .map_err(|e| anyhow::anyhow!("couldn't parse config file to toml format: {}", e))?;
    Ok(config)
}

fn write_default_config(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        DirBuilder::new().recursive(true).create(dir)?;
    }
    let mut f = BufWriter::new(File::create(path)?);
    f.write_all(DEFAULT_CONFIG.as_bytes())?;
    f.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = parse_config(DEFAULT_CONFIG, Path::new("/opt/rental")).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(
            config.export.directory,
            PathBuf::from("/opt/rental/data/export/")
        );
        assert_eq!(
            config.log.file,
            PathBuf::from("/opt/rental/log/carrental-tui.log")
        );
    }

    #[test]
    fn backslashed_directory_stays_verbatim() {
        let config = parse_config(DEFAULT_CONFIG, Path::new(r"C:\Users\rental\app")).unwrap();
        assert_eq!(
            config.export.directory,
            PathBuf::from(r"C:\Users\rental\app/data/export/")
        );
        assert_eq!(
            config.log.file,
            PathBuf::from(r"C:\Users\rental\app/log/carrental-tui.log")
        );
    }

    #[test]
    fn env_url_overrides_configured_url() {
        let mut config = Config::default();
        apply_env(&mut config, Some(" http://rental.internal:8080 ".into()));
        assert_eq!(config.api.base_url, "http://rental.internal:8080");

        apply_env(&mut config, Some("   ".into()));
        assert_eq!(config.api.base_url, "http://rental.internal:8080");

        apply_env(&mut config, None);
        assert_eq!(config.api.base_url, "http://rental.internal:8080");
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = parse_config("[api]\nbase_url = \"http://rental:8080\"\n", Path::new(".")).unwrap();
        assert_eq!(config.api.base_url, "http://rental:8080");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(parse_config("[api\nbase_url = 1", Path::new(".")).is_err());
        assert!(parse_config("[api]\ntimeout_secs = \"soon\"", Path::new(".")).is_err());
    }

    #[test]
    fn writes_default_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("config.toml");
        write_default_config(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_config(&text, dir.path()).unwrap().api.timeout_secs, 30);
    }
}
