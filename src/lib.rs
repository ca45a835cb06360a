// src/lib.rs

//! ページ定義から App Router 形式のディレクトリツリーを生成し、
//! フィーチャーをユーティリティファイルへリンクして検証する。
//!
//! 流れ: グループ検出 → ツリー構築 → スコープ解決とリンク → (バッチ間の) マージ → 検証

pub mod builder;
pub mod config;
pub mod error;
pub mod grouping;
pub mod ids;
pub mod linker;
pub mod merger;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod scan;
pub mod tree;
pub mod validator;

pub use builder::{BuiltTree, TreeBuilder};
pub use config::ScaffoldConfig;
pub use error::{Result, ScaffoldError};
pub use ids::{IdSource, PathIds, SequentialIds};
pub use linker::{FeatureLinker, Linked};
pub use model::{
    Feature, FeatureDraft, FeatureDrafts, FeatureMap, FileType, FileTypeFlags, GeneratedStructure,
    PageInput, RouteGroup, RouteTree, RouteTreeNode, Scope,
};
pub use pipeline::Pipeline;
pub use resolver::{PageContext, ScopeResolver};
pub use validator::{Finding, ValidationResult, Validator};
