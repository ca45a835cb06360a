// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// 入出力境界 (設定・入力 JSON・ディスク走査) の Result 型
pub type Result<T> = std::result::Result<T, ScaffoldError>;

/// コアの外側で起こり得るエラー。コア処理自体はエラーを返さない。
#[derive(Error, Debug)]
pub enum ScaffoldError {
    /// ファイル読み書きの失敗
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON の形式不正
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// TOML 設定の形式不正
    #[error("Invalid config in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// 設定値の矛盾
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 走査対象ディレクトリが存在しない、など
    #[error("Not found: {0}")]
    NotFound(String),

    /// ディレクトリ走査の失敗
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl ScaffoldError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
