// src/pipeline.rs

//! ページ定義からツリー・フィーチャー・グループまでを一通り生成する。

use crate::builder::TreeBuilder;
use crate::config::ScaffoldConfig;
use crate::grouping::GroupDetector;
use crate::ids::{IdSource, PathIds};
use crate::linker::FeatureLinker;
use crate::merger::{merge_feature_maps, merge_groups};
use crate::model::{FeatureDrafts, GeneratedStructure, PageInput};
use crate::resolver::ScopeResolver;
use crate::validator::{ValidationResult, Validator, source_text_of};

pub struct Pipeline<'a> {
    config: &'a ScaffoldConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a ScaffoldConfig) -> Self {
        Pipeline { config }
    }

    /// パス由来の id で生成する
    pub fn run(
        &self,
        pages: &[PageInput],
        drafts: &FeatureDrafts,
        existing: Option<&GeneratedStructure>,
    ) -> GeneratedStructure {
        self.run_with_ids(PathIds, pages, drafts, existing)
    }

    /// 生成する。
    ///
    /// 1) グループ検出 (既存のグループとは名前で和集合)
    /// 2) 既存ツリー (なければスケルトン) へ全ページを挿入
    /// 3) フィーチャーをリンクし、既存のフィーチャーマップの後ろに連結
    pub fn run_with_ids<I: IdSource>(
        &self,
        ids: I,
        pages: &[PageInput],
        drafts: &FeatureDrafts,
        existing: Option<&GeneratedStructure>,
    ) -> GeneratedStructure {
        let detected = GroupDetector::new(&self.config.grouping).detect(pages);
        let groups = match existing {
            Some(prev) => merge_groups(&[prev.groups.as_slice(), detected.as_slice()]),
            None => detected,
        };

        let mut builder = TreeBuilder::with_ids(&self.config.layout, ids);
        let built = builder.build_onto(existing.map(|s| &s.tree), pages, &groups);

        let mut linker = FeatureLinker::new(&mut builder, ScopeResolver::new(&self.config.scope));
        if let Some(prev) = existing {
            linker = linker.with_existing(&prev.features);
        }
        let linked = linker.link_all(&built.tree, &built.page_dirs, &groups, drafts);

        let features = match existing {
            Some(prev) => merge_feature_maps(&[prev.features.clone(), linked.features]),
            None => linked.features,
        };

        GeneratedStructure {
            tree: linked.tree,
            features,
            groups,
        }
    }

    /// 生成物を検証する。`pages` の説明文を出典テキストとして使う。
    pub fn validate(&self, structure: &GeneratedStructure, pages: &[PageInput]) -> ValidationResult {
        Validator::new(&self.config.validation, &self.config.layout).validate(
            &structure.tree,
            &structure.features,
            &source_text_of(pages),
        )
    }
}
