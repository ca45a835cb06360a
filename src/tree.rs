// src/tree.rs

//! ルートツリーへの読み取り専用クエリ。
//!
//! 走査はすべて明示的なスタックで行い、再帰の深さ制限に依存しない。
//! パスは文字列の連結ではなくセグメント名の列 (`Vec<String>`) で持ち回る。

use crate::model::{Marker, RouteTree, RouteTreeNode};

/// `app/(auth)/login` のような括弧で囲まれたディレクトリはルートグループ
pub fn is_route_group(name: &str) -> bool {
    name.len() > 2 && name.starts_with('(') && name.ends_with(')')
}

/// `[id]`, `[...slug]`, `[[...slug]]` は動的セグメント
pub fn is_dynamic_segment(name: &str) -> bool {
    name.len() > 2 && name.starts_with('[') && name.ends_with(']')
}

/// 同名、または同じ位置にある動的セグメント同士なら一致とみなす
pub fn segments_match(existing: &str, wanted: &str) -> bool {
    existing == wanted || (is_dynamic_segment(existing) && is_dynamic_segment(wanted))
}

/// ルート文字列をセグメント列に正規化する。`/` は空の列になる。
/// `..` は直前のセグメントを取り除く (ルートより上には出ない)。
pub fn normalize_route(route: &str) -> Vec<String> {
    let without_query = route.split(['?', '#']).next().unwrap_or("");
    let mut segments: Vec<String> = Vec::new();
    for segment in without_query.trim().replace('\\', "/").split('/').map(str::trim) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment.to_string()),
        }
    }
    segments
}

/// 論理セグメント列を `/a/b` 形式に戻す
pub fn route_string(logical: &[String]) -> String {
    format!("/{}", logical.join("/"))
}

/// 物理パスからルートディレクトリとルートグループを除いた論理パス
pub fn logical_segments(physical: &[String]) -> Vec<String> {
    physical
        .iter()
        .skip(1)
        .filter(|s| !is_route_group(s))
        .cloned()
        .collect()
}

pub fn join_path(path: &[String]) -> String {
    path.join("/")
}

pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// ファイルパスの親ディレクトリ
pub fn parent_of(path: &[String]) -> &[String] {
    match path.split_last() {
        Some((_, parent)) => parent,
        None => path,
    }
}

/// `ancestor` が `path` 自身か、その祖先か
pub fn is_ancestor_or_self(ancestor: &[String], path: &[String]) -> bool {
    ancestor.len() <= path.len() && path[..ancestor.len()] == *ancestor
}

/// 走査時に 1 ノードごとに得られる情報
#[derive(Debug, Clone)]
pub struct WalkEntry<'a> {
    pub node: &'a RouteTreeNode,
    /// ルートからこのノード自身までの名前列
    pub path: Vec<String>,
}

impl WalkEntry<'_> {
    /// ディレクトリなら自身の、ファイルなら親ディレクトリの論理パス
    pub fn logical(&self) -> Vec<String> {
        if self.node.is_dir() {
            logical_segments(&self.path)
        } else {
            logical_segments(parent_of(&self.path))
        }
    }

    pub fn joined(&self) -> String {
        join_path(&self.path)
    }
}

/// 前順 (pre-order) で全ノードを返す
pub fn walk(tree: &RouteTree) -> Vec<WalkEntry<'_>> {
    let mut out = Vec::new();
    let mut stack: Vec<(&RouteTreeNode, Vec<String>)> = tree
        .roots
        .iter()
        .rev()
        .map(|n| (n, vec![n.name.clone()]))
        .collect();

    while let Some((node, path)) = stack.pop() {
        for child in node.children.iter().rev() {
            let mut child_path = path.clone();
            child_path.push(child.name.clone());
            stack.push((child, child_path));
        }
        out.push(WalkEntry { node, path });
    }
    out
}

/// 物理パスでノードを探す。途中のセグメントはディレクトリだけを辿り、
/// 末尾は同名のディレクトリがあればそちらを優先する。
pub fn find_by_path<'a>(tree: &'a RouteTree, path: &[String]) -> Option<&'a RouteTreeNode> {
    let (first, rest) = path.split_first()?;
    let mut current = &tree.roots[step(&tree.roots, first, rest.is_empty())?];
    for (i, segment) in rest.iter().enumerate() {
        let last = i + 1 == rest.len();
        current = &current.children[step(&current.children, segment, last)?];
    }
    Some(current)
}

pub fn find_by_path_mut<'a>(
    tree: &'a mut RouteTree,
    path: &[String],
) -> Option<&'a mut RouteTreeNode> {
    let (first, rest) = path.split_first()?;
    let index = step(&tree.roots, first, rest.is_empty())?;
    let mut current = &mut tree.roots[index];
    for (i, segment) in rest.iter().enumerate() {
        let last = i + 1 == rest.len();
        let index = step(&current.children, segment, last)?;
        current = &mut current.children[index];
    }
    Some(current)
}

fn step(nodes: &[RouteTreeNode], name: &str, last: bool) -> Option<usize> {
    nodes
        .iter()
        .position(|n| n.is_dir() && n.name == name)
        .or_else(|| {
            if last {
                nodes.iter().position(|n| n.name == name)
            } else {
                None
            }
        })
}

/// id でノードを探し、そのパスと一緒に返す
pub fn find_by_id<'a>(tree: &'a RouteTree, id: &str) -> Option<WalkEntry<'a>> {
    walk(tree).into_iter().find(|e| e.node.id == id)
}

/// 指定した名前のルートディレクトリ
pub fn root_dir<'a>(tree: &'a RouteTree, root_name: &str) -> Option<&'a RouteTreeNode> {
    tree.roots
        .iter()
        .find(|n| n.is_dir() && n.name == root_name)
}

/// page マーカーを持つディレクトリの (論理パス, 物理パス)
pub fn route_dirs(tree: &RouteTree) -> Vec<(Vec<String>, Vec<String>)> {
    walk(tree)
        .into_iter()
        .filter(|e| e.node.is_dir() && e.node.has_marker(Marker::Page))
        .map(|e| (e.logical(), e.path))
        .collect()
}

/// ナビゲーション可能な論理ルートの一覧 (ソート済み・重複なし)
pub fn route_list(tree: &RouteTree) -> Vec<String> {
    let mut routes: Vec<String> = route_dirs(tree)
        .into_iter()
        .map(|(logical, _)| route_string(&logical))
        .collect();
    routes.sort();
    routes.dedup();
    routes
}

/// ルート文字列に対応する page ディレクトリの物理パス。
/// 完全一致を優先し、なければ動的セグメントの位置一致で探す。
pub fn find_route_dir(tree: &RouteTree, route: &str) -> Option<Vec<String>> {
    let wanted = normalize_route(route);
    let candidates = route_dirs(tree);

    if let Some((_, physical)) = candidates.iter().find(|(logical, _)| *logical == wanted) {
        return Some(physical.clone());
    }
    candidates
        .into_iter()
        .find(|(logical, _)| {
            logical.len() == wanted.len()
                && logical
                    .iter()
                    .zip(&wanted)
                    .all(|(have, want)| segments_match(have, want))
        })
        .map(|(_, physical)| physical)
}

/// すべてのファイルのパス (パッケージング側が使う)
pub fn file_paths(tree: &RouteTree) -> Vec<String> {
    walk(tree)
        .into_iter()
        .filter(|e| e.node.is_file())
        .map(|e| e.joined())
        .collect()
}

/// インデント付きのテキスト表示
pub fn render(tree: &RouteTree) -> String {
    let mut out = String::new();
    for entry in walk(tree) {
        let depth = entry.path.len() - 1;
        out.push_str(&"  ".repeat(depth));
        out.push_str(&entry.node.name);
        if entry.node.is_dir() {
            out.push('/');
        }
        out.push('\n');
    }
    out
}
