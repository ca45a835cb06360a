// src/parser.rs

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::{Result, ScaffoldError};
use crate::model::{FeatureDrafts, GeneratedStructure, PageInput, RouteTree};

/// `[...]` と `{ "pages": [...] }` のどちらも受け付ける
#[derive(Deserialize)]
#[serde(untagged)]
enum PagesFile {
    List(Vec<PageInput>),
    Wrapped { pages: Vec<PageInput> },
}

/// 生成物一式、またはツリー配列だけのファイル
#[derive(Deserialize)]
#[serde(untagged)]
enum StructureFile {
    Full(GeneratedStructure),
    TreeOnly(RouteTree),
}

/// ファイルを読んで JSON としてデシリアライズする
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    log::debug!("読み込み開始: {:?}", path);
    let src = fs::read_to_string(path).map_err(|e| ScaffoldError::io(path, e))?;
    log::debug!("ファイルサイズ: {} bytes", src.len());
    serde_json::from_str(&src).map_err(|e| ScaffoldError::json(path, e))
}

/// ページ定義を読み込む。
///
/// - `path`: ページ定義 JSON (例: `[{"id": "p1", "name": "Home", "route": "/", "description": ""}]`)
///
/// 戻り値:
/// - Ok(pages) → 読み込んだページ (ファイル内の順)
/// - Err(...)  → 読み込み失敗または JSON 不正
pub fn load_pages(path: &Path) -> Result<Vec<PageInput>> {
    let pages = match read_json::<PagesFile>(path)? {
        PagesFile::List(pages) => pages,
        PagesFile::Wrapped { pages } => pages,
    };
    log::info!("{} ページを読み込みました", pages.len());
    Ok(pages)
}

/// ページ id → フィーチャー下書き列 の JSON を読み込む
pub fn load_feature_drafts(path: &Path) -> Result<FeatureDrafts> {
    let drafts: FeatureDrafts = read_json(path)?;
    log::info!(
        "{} ページ分 ({} 件) のフィーチャー下書きを読み込みました",
        drafts.len(),
        drafts.values().map(Vec::len).sum::<usize>()
    );
    Ok(drafts)
}

/// 以前の生成物を読み込む。ツリー配列だけのファイルならフィーチャーは空。
pub fn load_structure(path: &Path) -> Result<GeneratedStructure> {
    Ok(match read_json::<StructureFile>(path)? {
        StructureFile::Full(structure) => structure,
        StructureFile::TreeOnly(tree) => GeneratedStructure {
            tree,
            ..Default::default()
        },
    })
}
