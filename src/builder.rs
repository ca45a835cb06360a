// src/builder.rs

//! ルート文字列からディレクトリツリーを組み立てる。
//!
//! 公開 API は入力ツリーを書き換えず、新しいツリーを返す。
//! 挿入は冪等で、失敗しない: 解決できないルートは新しい枝として入れ、
//! 矛盾の報告は Validator に任せる。

use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::grouping::group_of;
use crate::ids::{IdSource, PathIds};
use crate::model::{Marker, PageInput, RouteGroup, RouteTree, RouteTreeNode};
use crate::tree::{
    find_by_path, find_by_path_mut, find_route_dir, is_ancestor_or_self, is_route_group,
    normalize_route, segments_match, walk,
};

/// `build_tree` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTree {
    pub tree: RouteTree,
    /// ページ id → そのページのディレクトリ (物理パス)
    pub page_dirs: BTreeMap<String, Vec<String>>,
}

pub struct TreeBuilder<'a, I: IdSource = PathIds> {
    layout: &'a LayoutConfig,
    ids: I,
}

impl<'a> TreeBuilder<'a, PathIds> {
    pub fn new(layout: &'a LayoutConfig) -> Self {
        TreeBuilder::with_ids(layout, PathIds)
    }
}

impl<'a, I: IdSource> TreeBuilder<'a, I> {
    pub fn with_ids(layout: &'a LayoutConfig, ids: I) -> Self {
        TreeBuilder { layout, ids }
    }

    pub fn layout(&self) -> &LayoutConfig {
        self.layout
    }

    /// `app` ルートとルートレイアウトだけの初期ツリー
    pub fn skeleton(&mut self) -> RouteTree {
        let mut tree = RouteTree::default();
        let root = self.ensure_root_in(&mut tree);
        self.ensure_marker_in(&mut tree, &root, Marker::Layout);
        tree
    }

    /// ルートを挿入した新しいツリーを返す
    pub fn insert_route(&mut self, tree: &RouteTree, route: &str) -> RouteTree {
        let mut next = tree.clone();
        self.insert_route_in(&mut next, None, route);
        next
    }

    /// ルートのディレクトリに layout マーカーを置いた新しいツリーを返す
    pub fn insert_layout(&mut self, tree: &RouteTree, route: &str) -> RouteTree {
        let mut next = tree.clone();
        self.insert_layout_in(&mut next, route);
        next
    }

    /// ルートグループ `(name)` を用意した新しいツリーを返す
    pub fn ensure_group(&mut self, tree: &RouteTree, name: &str) -> RouteTree {
        let mut next = tree.clone();
        self.ensure_group_in(&mut next, name);
        next
    }

    /// 空のスケルトンから全ページを挿入する
    pub fn build_tree(&mut self, pages: &[PageInput], groups: &[RouteGroup]) -> BuiltTree {
        self.build_onto(None, pages, groups)
    }

    /// 既存ツリー (あれば) に全ページを挿入する
    pub fn build_onto(
        &mut self,
        existing: Option<&RouteTree>,
        pages: &[PageInput],
        groups: &[RouteGroup],
    ) -> BuiltTree {
        let mut tree = match existing {
            Some(t) => t.clone(),
            None => self.skeleton(),
        };
        self.ensure_root_in(&mut tree);

        let mut group_dirs: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        let mut page_dirs = BTreeMap::new();
        for page in pages {
            // 1) 既にあるルートはそのまま使う (再実行・既存ツリーへの追加)
            if let Some(dir) = find_route_dir(&tree, &page.route) {
                page_dirs.insert(page.id.clone(), dir);
                continue;
            }

            // 2) グループ所属ならグループディレクトリを用意してその下から辿る
            let mut base = None;
            if let Some(group) = group_of(groups, &page.id) {
                if !group_dirs.contains_key(group.name.as_str()) {
                    if let Some(dir) = self.ensure_group_in(&mut tree, &group.name) {
                        group_dirs.insert(group.name.as_str(), dir);
                    }
                }
                base = group_dirs.get(group.name.as_str()).cloned();
            }

            match self.insert_route_in(&mut tree, base.as_deref(), &page.route) {
                Some(dir) => {
                    page_dirs.insert(page.id.clone(), dir);
                }
                None => log::warn!("ページ '{}' ({}) を挿入できませんでした", page.id, page.route),
            }
        }

        log::info!("ツリー構築完了: {} ページ, {} グループ", page_dirs.len(), group_dirs.len());
        BuiltTree { tree, page_dirs }
    }

    /// ルートを挿入し、page マーカーを置いたディレクトリの物理パスを返す
    pub(crate) fn insert_route_in(
        &mut self,
        tree: &mut RouteTree,
        base: Option<&[String]>,
        route: &str,
    ) -> Option<Vec<String>> {
        let dir = self.materialize_in(tree, base, route)?;
        self.ensure_marker_in(tree, &dir, Marker::Page)?;
        Some(dir)
    }

    pub(crate) fn insert_layout_in(&mut self, tree: &mut RouteTree, route: &str) -> Option<Vec<String>> {
        let dir = self.materialize_in(tree, None, route)?;
        self.ensure_marker_in(tree, &dir, Marker::Layout)?;
        Some(dir)
    }

    /// `app/(name)` とその layout マーカーを用意する
    pub(crate) fn ensure_group_in(&mut self, tree: &mut RouteTree, name: &str) -> Option<Vec<String>> {
        let root = self.ensure_root_in(tree);
        let dir = self.ensure_dir_in(tree, &root, &format!("({})", name))?;
        self.ensure_marker_in(tree, &dir, Marker::Layout)?;
        Some(dir)
    }

    /// ルートディレクトリがなければ作る
    pub(crate) fn ensure_root_in(&mut self, tree: &mut RouteTree) -> Vec<String> {
        let root_name = self.layout.root_dir.clone();
        if !tree.roots.iter().any(|n| n.is_dir() && n.name == root_name) {
            log::debug!("ルートディレクトリ '{}' を作成", root_name);
            let id = self.ids.next_id(std::slice::from_ref(&root_name));
            tree.roots.push(RouteTreeNode::directory(id, &root_name));
        }
        vec![root_name]
    }

    /// `parent` 直下にディレクトリを用意する (既存なら再利用)
    pub(crate) fn ensure_dir_in(
        &mut self,
        tree: &mut RouteTree,
        parent: &[String],
        name: &str,
    ) -> Option<Vec<String>> {
        let mut path = parent.to_vec();
        path.push(name.to_string());

        let parent_node = find_by_path(tree, parent).filter(|n| n.is_dir())?;
        if parent_node.children.iter().any(|c| c.is_file() && c.name == name) {
            log::warn!(
                "{} はファイルなのでディレクトリを作れません",
                path.join("/")
            );
            return None;
        }
        let exists = parent_node.children.iter().any(|c| c.is_dir() && c.name == name);
        if !exists {
            log::debug!("ディレクトリを作成: {}", path.join("/"));
            let id = self.ids.next_id(&path);
            find_by_path_mut(tree, parent)?
                .children
                .push(RouteTreeNode::directory(id, name));
        }
        Some(path)
    }

    /// `dir` 直下にファイルを用意する。戻り値の bool は新規作成したかどうか。
    pub(crate) fn ensure_file_in(
        &mut self,
        tree: &mut RouteTree,
        dir: &[String],
        name: &str,
    ) -> Option<(Vec<String>, bool)> {
        let mut path = dir.to_vec();
        path.push(name.to_string());

        let exists = find_by_path(tree, dir)
            .filter(|n| n.is_dir())?
            .children
            .iter()
            .any(|c| c.is_file() && c.name == name);
        if exists {
            return Some((path, false));
        }
        log::debug!("ファイルを作成: {}", path.join("/"));
        let id = self.ids.next_id(&path);
        find_by_path_mut(tree, dir)?
            .children
            .push(RouteTreeNode::file(id, name));
        Some((path, true))
    }

    /// マーカーがなければ作る。拡張子違いの既存マーカーもそのまま使う。
    pub(crate) fn ensure_marker_in(
        &mut self,
        tree: &mut RouteTree,
        dir: &[String],
        marker: Marker,
    ) -> Option<Vec<String>> {
        if let Some(existing) = find_by_path(tree, dir)
            .filter(|n| n.is_dir())?
            .marker_child(marker)
        {
            let mut path = dir.to_vec();
            path.push(existing.name.clone());
            return Some(path);
        }
        let name = self.layout.marker_file(marker);
        self.ensure_file_in(tree, dir, &name).map(|(path, _)| path)
    }

    /// ルートのディレクトリ列を辿り、足りない分を作る。終端ディレクトリのパスを返す。
    fn materialize_in(
        &mut self,
        tree: &mut RouteTree,
        base: Option<&[String]>,
        route: &str,
    ) -> Option<Vec<String>> {
        let root = self.ensure_root_in(tree);
        let segments = normalize_route(route);

        // ルート "/" は app 直下にだけ置き、下には降りない
        if segments.is_empty() {
            if !route.trim().trim_matches('/').is_empty() {
                log::warn!("ルート '{}' は空に正規化されたため '/' として扱います", route);
            }
            return Some(root);
        }

        let base = match base {
            Some(b) if find_by_path(tree, b).is_some_and(|n| n.is_dir()) => b.to_vec(),
            _ => root.clone(),
        };

        let mut current = base.clone();
        let mut depth = 0;
        while depth < segments.len() {
            let segment = &segments[depth];
            if let Some(found) = find_child_dir(tree, &current, segment) {
                current = found;
                depth += 1;
                continue;
            }

            if let Some((parent, parent_depth)) = best_existing_parent(tree, &base, &segments) {
                let current_is_route = find_by_path(tree, &current)
                    .is_some_and(|n| n.has_marker(Marker::Page));
                // より深い接頭辞はグループの外でも使う。同じ深さなら base 配下に限る。
                let deeper = parent_depth > depth;
                let same_level_better = parent_depth == depth
                    && parent != current
                    && !current_is_route
                    && is_ancestor_or_self(&base, &parent);
                if deeper || same_level_better {
                    log::debug!(
                        "既存の親 {} から '{}' を延長",
                        parent.join("/"),
                        segments.join("/")
                    );
                    current = parent;
                    depth = parent_depth;
                    continue;
                }
            }

            current = self.ensure_dir_in(tree, &current, segment)?;
            depth += 1;
        }
        Some(current)
    }
}

/// `dir` の子から `wanted` に一致するディレクトリを探す。
/// ルートグループは透過的に潜って探すが、祖先ノードとしては残る。
/// 完全一致を動的セグメントの位置一致より優先する。
fn find_child_dir(tree: &RouteTree, dir: &[String], wanted: &str) -> Option<Vec<String>> {
    if is_route_group(wanted) {
        let node = find_by_path(tree, dir)?;
        return node
            .children
            .iter()
            .find(|c| c.is_dir() && c.name == wanted)
            .map(|c| child_path(dir, &c.name));
    }

    let mut frontier = vec![dir.to_vec()];
    while !frontier.is_empty() {
        let mut next_frontier = Vec::new();
        let mut positional = None;
        for parent in &frontier {
            let Some(node) = find_by_path(tree, parent) else {
                continue;
            };
            for child in node.children.iter().filter(|c| c.is_dir()) {
                if is_route_group(&child.name) {
                    next_frontier.push(child_path(parent, &child.name));
                } else if child.name == wanted {
                    return Some(child_path(parent, &child.name));
                } else if positional.is_none() && segments_match(&child.name, wanted) {
                    positional = Some(child_path(parent, &child.name));
                }
            }
        }
        if positional.is_some() {
            return positional;
        }
        frontier = next_frontier;
    }
    None
}

/// ルート配下で page マーカーを持ち、論理パスが `segments` の真の接頭辞である
/// 最も深いディレクトリ。同じ深さなら `prefer` 配下のものを選ぶ。
/// 戻り値は (物理パス, 論理パスの長さ)。
fn best_existing_parent(
    tree: &RouteTree,
    prefer: &[String],
    segments: &[String],
) -> Option<(Vec<String>, usize)> {
    let mut best: Option<(Vec<String>, usize)> = None;
    for entry in walk(tree) {
        if !entry.node.is_dir() || !entry.node.has_marker(Marker::Page) {
            continue;
        }
        let logical = entry.logical();
        let is_prefix = logical.len() < segments.len()
            && logical
                .iter()
                .zip(segments)
                .all(|(have, want)| segments_match(have, want));
        if !is_prefix {
            continue;
        }
        let better = match &best {
            None => true,
            Some((path, depth)) => {
                logical.len() > *depth
                    || (logical.len() == *depth
                        && is_ancestor_or_self(prefer, &entry.path)
                        && !is_ancestor_or_self(prefer, path))
            }
        };
        if better {
            best = Some((entry.path.clone(), logical.len()));
        }
    }
    best
}

fn child_path(parent: &[String], name: &str) -> Vec<String> {
    let mut path = parent.to_vec();
    path.push(name.to_string());
    path
}
