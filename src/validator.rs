// src/validator.rs

//! 完成したツリーとフィーチャーマップを検証する。
//!
//! 各規則は独立していて、0 件以上の指摘を返す。例外は投げない。
//! `error` が 1 件でもあれば `is_valid` は false になる。
//! `warning` はパッケージングを止めないが、利用者に見せること。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::{LayoutConfig, ValidationConfig};
use crate::model::{FeatureMap, FileType, Marker, PageInput, RouteTree};
use crate::tree::{
    find_by_id, find_by_path, is_ancestor_or_self, is_dynamic_segment, parent_of, root_dir,
    route_dirs, route_list, route_string, split_path, walk,
};

static TITLE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    IncompleteStructure,
    GenericFeature,
    MissingActionFile,
    MissingTypeFile,
    MissingRoute,
    RouteConflict,
    MissingLinkedFile,
    ScopeViolation,
    OrphanFeature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub suggestion: String,
}

impl Finding {
    pub fn error(category: Category, message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Finding {
            severity: Severity::Error,
            category,
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn warning(category: Category, message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Finding {
            severity: Severity::Warning,
            category,
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub warnings: Vec<Finding>,
}

impl ValidationResult {
    pub fn from_findings(warnings: Vec<Finding>) -> Self {
        ValidationResult {
            is_valid: !warnings.iter().any(|f| f.severity == Severity::Error),
            warnings,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.warnings.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn has(&self, category: Category) -> bool {
        self.warnings.iter().any(|f| f.category == category)
    }
}

/// 規則に渡す検証対象
pub struct ValidationContext<'a> {
    pub tree: &'a RouteTree,
    pub features: &'a FeatureMap,
    /// ルートの有無を推測する元の説明文
    pub source_text: &'a str,
    /// 解決済みの論理ルート一覧
    pub routes: Vec<String>,
}

pub trait Rule {
    fn name(&self) -> &'static str;
    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Finding>;
}

pub struct Validator {
    rules: Vec<Box<dyn Rule>>,
}

impl Validator {
    /// すべての規則を持つ Validator
    pub fn new(config: &ValidationConfig, layout: &LayoutConfig) -> Self {
        Validator::with_rules(vec![
            Box::new(StructureRule {
                root_dir: layout.root_dir.clone(),
            }),
            Box::new(RouteConflictRule),
            Box::new(GenericFeatureRule::new(config)),
            Box::new(MissingActionFileRule::new(config)),
            Box::new(LinkedFileRule),
            Box::new(ScopeRule),
            Box::new(MissingRouteRule::new(config)),
        ])
    }

    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Validator { rules }
    }

    pub fn validate(&self, tree: &RouteTree, features: &FeatureMap, source_text: &str) -> ValidationResult {
        let ctx = ValidationContext {
            tree,
            features,
            source_text,
            routes: route_list(tree),
        };
        let mut findings = Vec::new();
        for rule in &self.rules {
            let found = rule.check(&ctx);
            log::debug!("規則 {}: {} 件", rule.name(), found.len());
            findings.extend(found);
        }
        let result = ValidationResult::from_findings(findings);
        log::info!(
            "検証完了: valid={}, error {} 件, 指摘合計 {} 件",
            result.is_valid,
            result.errors().count(),
            result.warnings.len()
        );
        result
    }
}

/// ページ説明文をまとめて検証用のテキストにする
pub fn source_text_of(pages: &[PageInput]) -> String {
    pages
        .iter()
        .map(|p| format!("{}. {}", p.name, p.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn all_features(features: &FeatureMap) -> impl Iterator<Item = (&String, &crate::model::Feature)> {
    features
        .iter()
        .flat_map(|(node_id, list)| list.iter().map(move |f| (node_id, f)))
}

fn display_title(title: &str) -> &str {
    if title.trim().is_empty() { "(untitled)" } else { title }
}

/// ルートレイアウト・ルートの有無・ルート "/" の重複
pub struct StructureRule {
    pub root_dir: String,
}

impl Rule for StructureRule {
    fn name(&self) -> &'static str {
        "incomplete-structure"
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        let mut out = Vec::new();
        let dirs: Vec<_> = ctx.tree.roots.iter().filter(|n| n.is_dir()).collect();

        match root_dir(ctx.tree, &self.root_dir) {
            None => out.push(Finding::error(
                Category::IncompleteStructure,
                format!("No '{}' root directory", self.root_dir),
                format!("Create the '{}' directory with a root layout", self.root_dir),
            )),
            Some(root) if !root.has_marker(Marker::Layout) => out.push(Finding::error(
                Category::IncompleteStructure,
                "Root layout is missing",
                format!("Add {}/layout.tsx", self.root_dir),
            )),
            Some(_) => {}
        }

        if dirs.len() > 1 {
            out.push(Finding::error(
                Category::IncompleteStructure,
                format!("Expected a single root directory, found {}", dirs.len()),
                format!("Move every route under '{}'", self.root_dir),
            ));
        }

        let routes = route_dirs(ctx.tree);
        if routes.is_empty() {
            out.push(Finding::error(
                Category::IncompleteStructure,
                "The structure has no routes",
                "Add at least one page",
            ));
        }

        let roots: Vec<String> = routes
            .iter()
            .filter(|(logical, _)| logical.is_empty())
            .map(|(_, physical)| physical.join("/"))
            .collect();
        if roots.len() > 1 {
            out.push(Finding::error(
                Category::IncompleteStructure,
                format!("Multiple directories resolve to '/': {}", roots.join(", ")),
                "Keep a single root page",
            ));
        }
        out
    }
}

/// 同じ論理ルートの重複、動的セグメント名の食い違い、大文字小文字違いの兄弟
pub struct RouteConflictRule;

impl Rule for RouteConflictRule {
    fn name(&self) -> &'static str {
        "route-conflict"
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        let mut out = Vec::new();

        let mut by_route: BTreeMap<Vec<String>, Vec<String>> = BTreeMap::new();
        for (logical, physical) in route_dirs(ctx.tree) {
            by_route.entry(logical).or_default().push(physical.join("/"));
        }
        for (logical, dirs) in by_route {
            // "/" の重複は StructureRule が扱う
            if dirs.len() > 1 && !logical.is_empty() {
                out.push(Finding::error(
                    Category::RouteConflict,
                    format!("Route {} is defined by {}", route_string(&logical), dirs.join(", ")),
                    "Remove one of the duplicate pages",
                ));
            }
        }

        for entry in walk(ctx.tree).into_iter().filter(|e| e.node.is_dir()) {
            let dirs: Vec<&str> = entry
                .node
                .children
                .iter()
                .filter(|c| c.is_dir())
                .map(|c| c.name.as_str())
                .collect();

            let dynamic: Vec<&str> = dirs.iter().copied().filter(|n| is_dynamic_segment(n)).collect();
            if dynamic.len() > 1 {
                out.push(Finding::error(
                    Category::RouteConflict,
                    format!(
                        "{} has different dynamic segments at the same position: {}",
                        entry.joined(),
                        dynamic.join(", ")
                    ),
                    format!("Use a single parameter name, e.g. {}", dynamic[0]),
                ));
            }

            let mut seen: BTreeMap<String, &str> = BTreeMap::new();
            for name in dirs {
                if let Some(prev) = seen.insert(name.to_lowercase(), name) {
                    if prev != name {
                        out.push(Finding::warning(
                            Category::RouteConflict,
                            format!("{} has '{}' and '{}' differing only by case", entry.joined(), prev, name),
                            "Use lowercase route segments",
                        ));
                    }
                }
            }
        }
        out
    }
}

/// タイトル・説明文が空、短い、または汎用語ばかり
pub struct GenericFeatureRule {
    min_title_len: usize,
    min_description_len: usize,
    thin_description_len: usize,
    generic_words: BTreeSet<String>,
}

impl GenericFeatureRule {
    pub fn new(config: &ValidationConfig) -> Self {
        GenericFeatureRule {
            min_title_len: config.min_title_len,
            min_description_len: config.min_description_len,
            thin_description_len: config.thin_description_len,
            generic_words: config.generic_words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    fn is_generic(&self, title: &str) -> bool {
        let words: Vec<String> = TITLE_WORD
            .find_iter(title)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        if words.is_empty() {
            return false;
        }
        let generic = words.iter().filter(|w| self.generic_words.contains(*w)).count();
        generic * 2 >= words.len()
    }
}

impl Rule for GenericFeatureRule {
    fn name(&self) -> &'static str {
        "generic-feature"
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        let mut out = Vec::new();
        for (_, feature) in all_features(ctx.features) {
            let title = feature.title.trim();
            let description = feature.description.trim();

            if title.is_empty() {
                out.push(Finding::error(
                    Category::GenericFeature,
                    format!("Feature '{}' has no title", feature.id),
                    "Give the feature a specific title",
                ));
                continue;
            }
            if title.chars().count() < self.min_title_len {
                out.push(Finding::warning(
                    Category::GenericFeature,
                    format!("Feature title '{}' is too short", title),
                    "Describe what the feature does in the title",
                ));
            }
            if description.chars().count() < self.min_description_len {
                out.push(Finding::warning(
                    Category::GenericFeature,
                    format!("Feature '{}' has a missing or very short description", title),
                    "Explain the behavior, inputs and outcome of the feature",
                ));
            }
            if self.is_generic(title) && description.chars().count() < self.thin_description_len {
                out.push(Finding::warning(
                    Category::GenericFeature,
                    format!("Feature '{}' is too generic", title),
                    "Name the concrete data or action involved",
                ));
            }
        }
        out
    }
}

/// データを変更しそうな説明なのに actions ファイルがない
pub struct MissingActionFileRule {
    verbs: Option<Regex>,
}

impl MissingActionFileRule {
    pub fn new(config: &ValidationConfig) -> Self {
        MissingActionFileRule {
            verbs: word_alternation(&config.mutation_verbs, r"(?:s|es|d|ed|ing)?"),
        }
    }
}

impl Rule for MissingActionFileRule {
    fn name(&self) -> &'static str {
        "missing-action-file"
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        let Some(verbs) = &self.verbs else {
            return Vec::new();
        };
        all_features(ctx.features)
            .filter(|(_, f)| !f.linked_files.contains_key(&FileType::Actions))
            .filter_map(|(_, f)| {
                let verb = verbs.find(&f.description)?;
                Some(Finding::warning(
                    Category::MissingActionFile,
                    format!(
                        "Feature '{}' mentions '{}' but has no actions file",
                        display_title(&f.title),
                        verb.as_str()
                    ),
                    "Link an actions file for the mutation",
                ))
            })
            .collect()
    }
}

/// リンク先ファイルがツリーに存在し、種別どおりの名前か。
/// 存在しない types は missing-type-file として報告する。
pub struct LinkedFileRule;

impl Rule for LinkedFileRule {
    fn name(&self) -> &'static str {
        "linked-files"
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        let mut out = Vec::new();
        for (_, feature) in all_features(ctx.features) {
            for (file_type, path) in &feature.linked_files {
                let segments = split_path(path);
                let exists = find_by_path(ctx.tree, &segments).is_some_and(|n| n.is_file());
                if exists {
                    let named_type = segments
                        .last()
                        .and_then(|name| FileType::parse_utility_name(name))
                        .map(|(_, t)| t);
                    if named_type != Some(*file_type) {
                        out.push(Finding::error(
                            Category::MissingLinkedFile,
                            format!(
                                "Feature '{}' links {} as its {} file",
                                display_title(&feature.title),
                                path,
                                file_type
                            ),
                            format!("Link a <page|layout>.{}.* file instead", file_type),
                        ));
                    }
                    continue;
                }
                let category = if *file_type == FileType::Types {
                    Category::MissingTypeFile
                } else {
                    Category::MissingLinkedFile
                };
                out.push(Finding::error(
                    category,
                    format!(
                        "Feature '{}' links {} file {} which is not in the tree",
                        display_title(&feature.title),
                        file_type,
                        path
                    ),
                    format!("Create {} or re-link the feature", path),
                ));
            }
        }
        out
    }
}

/// リンク先が所有ノードのディレクトリかその祖先にあるか。所有ノードの存在も確認する。
pub struct ScopeRule;

impl Rule for ScopeRule {
    fn name(&self) -> &'static str {
        "scope-violation"
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        let mut out = Vec::new();
        for (node_id, features) in ctx.features {
            let Some(owner) = find_by_id(ctx.tree, node_id) else {
                out.push(Finding::warning(
                    Category::OrphanFeature,
                    format!("{} feature(s) belong to unknown node '{}'", features.len(), node_id),
                    "Re-link the features to an existing page or layout",
                ));
                continue;
            };
            let owner_dir = if owner.node.is_dir() {
                owner.path.clone()
            } else {
                parent_of(&owner.path).to_vec()
            };

            for feature in features {
                for path in feature.linked_files.values() {
                    let segments = split_path(path);
                    let dir = parent_of(&segments);
                    if !is_ancestor_or_self(dir, &owner_dir) {
                        out.push(Finding::error(
                            Category::ScopeViolation,
                            format!(
                                "Feature '{}' links {} outside {} and its ancestors",
                                display_title(&feature.title),
                                path,
                                owner_dir.join("/")
                            ),
                            "Move the utility file to the page directory or a shared ancestor",
                        ));
                    }
                }
            }
        }
        out
    }
}

/// 説明文が "settings page" のようにルートを示すのに、そのルートがない
pub struct MissingRouteRule {
    hints: Option<Regex>,
}

impl MissingRouteRule {
    pub fn new(config: &ValidationConfig) -> Self {
        MissingRouteRule {
            hints: word_alternation(&config.route_hints, r"\s+(?:page|screen|view)"),
        }
    }
}

impl Rule for MissingRouteRule {
    fn name(&self) -> &'static str {
        "missing-route"
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        let Some(hints) = &self.hints else {
            return Vec::new();
        };
        let segments: BTreeSet<String> = ctx
            .routes
            .iter()
            .flat_map(|r| split_path(r))
            .map(|s| s.to_lowercase())
            .collect();

        let mut implied = BTreeSet::new();
        for caps in hints.captures_iter(ctx.source_text) {
            if let Some(word) = caps.get(1) {
                implied.insert(word.as_str().to_lowercase());
            }
        }

        implied
            .into_iter()
            .filter(|word| !segments.contains(word))
            .map(|word| {
                Finding::warning(
                    Category::MissingRoute,
                    format!("The description mentions a {} page but no /{} route exists", word, word),
                    format!("Add a /{} route", word),
                )
            })
            .collect()
    }
}

/// `\b(?i)(w1|w2|...)<suffix>\b` を組み立てる。語が空なら None。
fn word_alternation(words: &[String], suffix: &str) -> Option<Regex> {
    if words.is_empty() {
        return None;
    }
    let alternation = words
        .iter()
        .map(|w| regex::escape(&w.to_lowercase()))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)\b({}){}\b", alternation, suffix);
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("キーワード正規表現を作れませんでした: {}", e);
            None
        }
    }
}
