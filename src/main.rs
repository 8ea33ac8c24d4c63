mod prelude {
    pub use crate::utils::{get_text, glob};
    pub use anyhow::Result;
    pub use chrono::{Local, NaiveDate};
    pub use std::path::{Path, PathBuf};
}

mod api_client;
mod config;
mod controller;
mod export;
mod form;
mod model;
mod service;
#[cfg(test)]
mod test_support;
mod ui;
mod utils;
use crate::prelude::*;

use config::LogConfig;
use std::fs::{DirBuilder, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

// 画面を使うのでログはファイルに出す
fn init_logging(log: &LogConfig) -> Result<()> {
    if let Some(dir) = log.file.parent() {
        DirBuilder::new().recursive(true).create(dir)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log.file)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let config = config::load_config()?;
    init_logging(&config.log)?;
    tracing::info!(base_url = %config.api.base_url, "starting");

    let mut system = controller::System::new(&config)?;
    let res = system.run();
    // 端末を戻してからエラーを返す
    drop(system);

    report(res)
}

// エラーはログに残したうえでそのまま返し、終了コードを非0にする
fn report(res: Result<()>) -> Result<()> {
    if let Err(err) = &res {
        tracing::error!(error = ?err, "terminated with error");
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_failure_is_returned_from_main() {
        let err = report(Err(anyhow::anyhow!("terminal lost"))).unwrap_err();
        assert_eq!(err.to_string(), "terminal lost");
        assert!(report(Ok(())).is_ok());
    }
}
