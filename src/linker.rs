// src/linker.rs

//! フィーチャーをユーティリティファイルへリンクする。
//!
//! 同じスコープ・同じ種別のフィーチャーは同じファイルに集約される。
//! (タイトル, 説明文) が同じ重複フィーチャーは同じファイル・同じ関数名に解決される。
//! 同じファイルで同じ関数名を別のフィーチャーが使っていれば `2`, `3`, ... を付ける。

use std::collections::BTreeMap;

use crate::builder::TreeBuilder;
use crate::grouping::group_of;
use crate::ids::IdSource;
use crate::model::{
    Feature, FeatureDraft, FeatureDrafts, FeatureMap, FileType, FunctionName, Marker,
    RouteGroup, RouteTree, Scope,
};
use crate::resolver::{PageContext, ScopeResolver};
use crate::tree::{find_by_path, is_ancestor_or_self, join_path};

/// `link_all` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linked {
    pub tree: RouteTree,
    pub features: FeatureMap,
}

/// (ユーティリティファイル, 関数名) → それを使うフィーチャーの (タイトル, 説明文)
type ClaimedNames = BTreeMap<(String, String), (String, String)>;

pub struct FeatureLinker<'b, 'a, I: IdSource> {
    builder: &'b mut TreeBuilder<'a, I>,
    resolver: ScopeResolver<'a>,
    claimed: ClaimedNames,
}

impl<'b, 'a, I: IdSource> FeatureLinker<'b, 'a, I> {
    pub fn new(builder: &'b mut TreeBuilder<'a, I>, resolver: ScopeResolver<'a>) -> Self {
        FeatureLinker {
            builder,
            resolver,
            claimed: ClaimedNames::new(),
        }
    }

    /// 既にリンク済みのフィーチャーが使っている関数名を登録する (前のバッチなど)
    pub fn with_existing(mut self, features: &FeatureMap) -> Self {
        for feature in features.values().flatten() {
            for function in feature.function_names.values() {
                self.claimed
                    .entry((function.util_file.clone(), function.name.clone()))
                    .or_insert_with(|| (feature.title.clone(), feature.description.clone()));
            }
        }
        self
    }

    /// 全ページの下書きをリンクし、新しいツリーとフィーチャーマップを返す。
    ///
    /// - `page_dirs`: ページ id → ページディレクトリ (`build_tree` の結果)
    /// - `groups`: 検出済みのルートグループ
    /// - `drafts`: ページ id → フィーチャー下書き
    pub fn link_all(
        &mut self,
        tree: &RouteTree,
        page_dirs: &BTreeMap<String, Vec<String>>,
        groups: &[RouteGroup],
        drafts: &FeatureDrafts,
    ) -> Linked {
        let mut tree = tree.clone();
        let mut features = FeatureMap::new();

        for (page_id, page_drafts) in drafts {
            let Some(dir) = page_dirs.get(page_id) else {
                log::warn!("ページ '{}' がツリーにないため {} 件の下書きを飛ばします", page_id, page_drafts.len());
                continue;
            };
            let group = group_of(groups, page_id).map(|g| g.name.clone());
            let ctx = PageContext::new(dir.clone(), group);

            for draft in page_drafts {
                if let Some((owner_id, feature)) = self.link_feature(&mut tree, draft, &ctx) {
                    features.entry(owner_id).or_default().push(feature);
                }
            }
        }

        let linked: usize = features.values().map(Vec::len).sum();
        log::info!("{} 件のフィーチャーをリンクしました", linked);
        Linked { tree, features }
    }

    /// 1 件の下書きをリンクする。戻り値は (所有ノード id, フィーチャー)。
    /// ページディレクトリが見つからなければ None。
    pub(crate) fn link_feature(
        &mut self,
        tree: &mut RouteTree,
        draft: &FeatureDraft,
        page: &PageContext,
    ) -> Option<(String, Feature)> {
        let owner_marker = self.builder.ensure_marker_in(tree, &page.dir, Marker::Page)?;
        let owner_id = find_by_path(tree, &owner_marker)?.id.clone();

        let (scope, dir) = self.resolver.resolve(draft, page);
        // 祖先以外に解決されるのは Resolver の不具合
        assert!(
            is_ancestor_or_self(&dir, &page.dir),
            "scope {} of feature '{}' resolved to {} which is not an ancestor of {}",
            scope,
            draft.title,
            join_path(&dir),
            join_path(&page.dir)
        );

        let dir = self.ensure_path(tree, &dir)?;
        let carrier = match scope {
            Scope::Page(_) => Marker::Page,
            Scope::Global | Scope::Section(_) => {
                self.builder.ensure_marker_in(tree, &dir, Marker::Layout)?;
                Marker::Layout
            }
        };

        let mut feature = Feature::from_draft(draft);
        for file_type in draft.needs.requested() {
            let name = self.builder.layout().utility_file(carrier, file_type);
            let (path, created) = self.builder.ensure_file_in(tree, &dir, &name)?;
            let path = join_path(&path);
            log::debug!(
                "'{}' [{}] → {} ({}, {})",
                draft.title,
                file_type,
                path,
                scope,
                if created { "created" } else { "reused" }
            );
            let name = self.claim_name(&path, function_name(&draft.title, file_type), draft);
            feature.function_names.insert(
                file_type,
                FunctionName {
                    name,
                    util_file: path.clone(),
                },
            );
            feature.linked_files.insert(file_type, path);
        }

        Some((owner_id, feature))
    }

    /// `util_file` 内で `base` を使う。別のフィーチャーが使用済みなら連番を付ける。
    fn claim_name(&mut self, util_file: &str, base: String, draft: &FeatureDraft) -> String {
        let owner = (draft.title.clone(), draft.description.clone());
        let mut n = 1;
        loop {
            let candidate = if n == 1 { base.clone() } else { format!("{}{}", base, n) };
            let key = (util_file.to_string(), candidate);
            match self.claimed.get(&key) {
                Some(existing) if *existing == owner => return key.1,
                Some(_) => n += 1,
                None => {
                    if n > 1 {
                        log::debug!("{} の '{}' は使用済みのため '{}' にします", util_file, base, key.1);
                    }
                    let name = key.1.clone();
                    self.claimed.insert(key, owner);
                    return name;
                }
            }
        }
    }

    /// パス上の足りないディレクトリを作る (通常は既存)
    fn ensure_path(&mut self, tree: &mut RouteTree, path: &[String]) -> Option<Vec<String>> {
        find_by_path(tree, path.get(..1)?)?;
        let mut current = path[..1].to_vec();
        for segment in &path[1..] {
            current = self.builder.ensure_dir_in(tree, &current, segment)?;
        }
        Some(current)
    }
}

/// タイトルと種別から決まる関数名。
///
/// - hooks: `useSignOutUser`
/// - actions: `signOutUserAction`
/// - stores: `useSignOutUserStore`
/// - types: `SignOutUser`
pub fn function_name(title: &str, file_type: FileType) -> String {
    let pascal = pascal_case(title);
    match file_type {
        FileType::Hooks => format!("use{}", pascal),
        FileType::Actions => format!("{}Action", lower_first(&pascal)),
        FileType::Stores => format!("use{}Store", pascal),
        FileType::Types => pascal,
    }
}

fn pascal_case(title: &str) -> String {
    let words: Vec<String> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect();

    let joined = words.concat();
    if joined.is_empty() {
        return "Feature".to_string();
    }
    if joined.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("F{}", joined);
    }
    joined
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutConfig, ScopeConfig};
    use crate::model::FileTypeFlags;
    use crate::tree::{find_by_path, split_path};
    use pretty_assertions::assert_eq;

    fn p(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn names_follow_file_type_conventions() {
        assert_eq!(function_name("Sign out user", FileType::Hooks), "useSignOutUser");
        assert_eq!(function_name("Sign out user", FileType::Actions), "signOutUserAction");
        assert_eq!(function_name("Sign out user", FileType::Stores), "useSignOutUserStore");
        assert_eq!(function_name("Sign out user", FileType::Types), "SignOutUser");
        assert_eq!(function_name("  ", FileType::Types), "Feature");
        assert_eq!(function_name("2FA setup", FileType::Hooks), "useF2faSetup");
    }

    fn linked(drafts: FeatureDrafts, routes: &[(&str, &str)]) -> Linked {
        let layout = LayoutConfig::default();
        let scope = ScopeConfig::default();
        let mut builder = TreeBuilder::new(&layout);
        let mut tree = builder.skeleton();
        let mut page_dirs = BTreeMap::new();
        for (id, route) in routes {
            let dir = builder.insert_route_in(&mut tree, None, route).unwrap();
            page_dirs.insert(id.to_string(), dir);
        }
        let mut linker = FeatureLinker::new(&mut builder, ScopeResolver::new(&scope));
        linker.link_all(&tree, &page_dirs, &[], &drafts)
    }

    #[test]
    fn page_features_link_next_to_their_page() {
        let mut drafts = FeatureDrafts::new();
        drafts.insert(
            "dash".into(),
            vec![FeatureDraft::new(
                "f1",
                "Revenue chart",
                "Shows monthly revenue",
                FileTypeFlags::only(&[FileType::Hooks, FileType::Types]),
            )],
        );
        let result = linked(drafts, &[("dash", "/dashboard")]);

        let features = &result.features["app/dashboard/page.tsx"];
        assert_eq!(features.len(), 1);
        assert_eq!(
            features[0].linked_files[&FileType::Hooks],
            "app/dashboard/page.hooks.tsx"
        );
        assert_eq!(
            features[0].function_names[&FileType::Types],
            FunctionName {
                name: "RevenueChart".into(),
                util_file: "app/dashboard/page.types.ts".into()
            }
        );
        for path in features[0].linked_files.values() {
            assert!(find_by_path(&result.tree, &split_path(path)).is_some());
        }
    }

    #[test]
    fn global_features_share_one_root_file() {
        let sign_out = |id: &str| {
            FeatureDraft::new(id, "Sign out user", "Ends the session", FileTypeFlags::only(&[FileType::Actions]))
        };
        let mut drafts = FeatureDrafts::new();
        drafts.insert("dash".into(), vec![sign_out("a")]);
        drafts.insert("admin".into(), vec![sign_out("b")]);
        let result = linked(drafts, &[("dash", "/dashboard"), ("admin", "/admin")]);

        let a = &result.features["app/dashboard/page.tsx"][0];
        let b = &result.features["app/admin/page.tsx"][0];
        assert_eq!(a.linked_files, b.linked_files);
        assert_eq!(a.function_names, b.function_names);
        assert_eq!(a.linked_files[&FileType::Actions], "app/layout.actions.ts");

        let root = find_by_path(&result.tree, &p(&["app"])).unwrap();
        let actions = root
            .children
            .iter()
            .filter(|c| c.name == "layout.actions.ts")
            .count();
        assert_eq!(actions, 1);
    }

    #[test]
    fn same_title_with_other_description_gets_suffix() {
        let draft = |id: &str, description: &str| {
            FeatureDraft::new(id, "Save draft", description, FileTypeFlags::only(&[FileType::Actions]))
        };
        let mut drafts = FeatureDrafts::new();
        drafts.insert(
            "editor".into(),
            vec![
                draft("a", "Saves the post body as a draft"),
                draft("b", "Saves the cover image as a draft"),
                draft("c", "Saves the post body as a draft"),
            ],
        );
        let result = linked(drafts, &[("editor", "/editor")]);

        let names: Vec<&str> = result.features["app/editor/page.tsx"]
            .iter()
            .map(|f| f.function_names[&FileType::Actions].name.as_str())
            .collect();
        assert_eq!(names, vec!["saveDraftAction", "saveDraftAction2", "saveDraftAction"]);
        for feature in &result.features["app/editor/page.tsx"] {
            assert_eq!(feature.linked_files[&FileType::Actions], "app/editor/page.actions.ts");
        }
    }

    #[test]
    fn names_from_earlier_batches_are_kept() {
        let layout = LayoutConfig::default();
        let scope = ScopeConfig::default();
        let mut builder = TreeBuilder::new(&layout);
        let mut tree = builder.skeleton();
        let dir = builder.insert_route_in(&mut tree, None, "/editor").unwrap();
        let mut page_dirs = BTreeMap::new();
        page_dirs.insert("editor".to_string(), dir);

        let mut earlier = Feature::from_draft(&FeatureDraft::new(
            "old",
            "Save draft",
            "Saves the cover image as a draft",
            FileTypeFlags::default(),
        ));
        earlier.function_names.insert(
            FileType::Actions,
            FunctionName {
                name: "saveDraftAction".into(),
                util_file: "app/editor/page.actions.ts".into(),
            },
        );
        let mut existing = FeatureMap::new();
        existing.insert("app/editor/page.tsx".into(), vec![earlier]);

        let mut drafts = FeatureDrafts::new();
        drafts.insert(
            "editor".into(),
            vec![FeatureDraft::new(
                "new",
                "Save draft",
                "Saves the post body as a draft",
                FileTypeFlags::only(&[FileType::Actions]),
            )],
        );
        let mut linker =
            FeatureLinker::new(&mut builder, ScopeResolver::new(&scope)).with_existing(&existing);
        let result = linker.link_all(&tree, &page_dirs, &[], &drafts);
        assert_eq!(
            result.features["app/editor/page.tsx"][0].function_names[&FileType::Actions].name,
            "saveDraftAction2"
        );
    }

    #[test]
    fn section_features_create_section_layout() {
        let mut drafts = FeatureDrafts::new();
        drafts.insert(
            "billing".into(),
            vec![FeatureDraft::new(
                "f",
                "Settings sidebar",
                "",
                FileTypeFlags::only(&[FileType::Stores]),
            )],
        );
        let result = linked(drafts, &[("billing", "/settings/billing")]);
        let feature = &result.features["app/settings/billing/page.tsx"][0];
        assert_eq!(
            feature.linked_files[&FileType::Stores],
            "app/settings/layout.stores.ts"
        );
        let settings = find_by_path(&result.tree, &p(&["app", "settings"])).unwrap();
        assert!(settings.has_marker(Marker::Layout));
        assert!(!settings.has_marker(Marker::Page));
    }

    #[test]
    fn drafts_for_unknown_pages_are_skipped() {
        let mut drafts = FeatureDrafts::new();
        drafts.insert(
            "ghost".into(),
            vec![FeatureDraft::new("f", "Anything", "", FileTypeFlags::all())],
        );
        let result = linked(drafts, &[("home", "/")]);
        assert!(result.features.is_empty());
    }

    #[test]
    fn linking_does_not_touch_input_tree() {
        let layout = LayoutConfig::default();
        let scope = ScopeConfig::default();
        let mut builder = TreeBuilder::new(&layout);
        let tree = builder.skeleton();
        let tree = builder.insert_route(&tree, "/");
        let before = tree.clone();

        let mut page_dirs = BTreeMap::new();
        page_dirs.insert("home".to_string(), p(&["app"]));
        let mut drafts = FeatureDrafts::new();
        drafts.insert(
            "home".into(),
            vec![FeatureDraft::new("f", "Hero banner", "", FileTypeFlags::all())],
        );
        let mut linker = FeatureLinker::new(&mut builder, ScopeResolver::new(&scope));
        let result = linker.link_all(&tree, &page_dirs, &[], &drafts);

        assert_eq!(tree, before);
        assert_ne!(result.tree, before);
    }
}
