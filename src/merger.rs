// src/merger.rs

//! バッチ生成された部分ツリー・フィーチャーマップを 1 つにまとめる。
//!
//! 左から順に畳み込む。同名ディレクトリは子を名前で和集合にし、
//! 同名ファイルや同種マーカーは先に現れた方を残す。
//! 呼び出し側は生成順にツリーを渡すこと。

use crate::model::{FeatureMap, GeneratedStructure, RouteGroup, RouteTree, RouteTreeNode};
use crate::tree::find_by_path_mut;

pub fn merge_trees(trees: &[RouteTree]) -> RouteTree {
    let mut iter = trees.iter();
    let Some(first) = iter.next() else {
        return RouteTree::default();
    };
    iter.fold(first.clone(), |acc, next| merge_two(&acc, next))
}

/// 2 つのツリーをマージした新しいツリー
pub fn merge_two(first: &RouteTree, second: &RouteTree) -> RouteTree {
    let mut merged = first.clone();
    // (結果側の親ディレクトリのパス, 取り込む子ノード列)。空のパスはルート階層。
    let mut stack: Vec<(Vec<String>, Vec<RouteTreeNode>)> = vec![(Vec::new(), second.roots.clone())];

    while let Some((parent, incoming)) = stack.pop() {
        let Some(target) = children_mut(&mut merged, &parent) else {
            continue;
        };
        for node in incoming {
            match target.iter().position(|t| t.name == node.name) {
                Some(i) if target[i].is_dir() && node.is_dir() => {
                    let mut path = parent.clone();
                    path.push(node.name.clone());
                    stack.push((path, node.children));
                }
                Some(_) => {
                    log::debug!("'{}' は先のツリーのものを残します", node.name);
                }
                None => {
                    // 拡張子違いでも同種マーカーは 1 つまで
                    if let Some(marker) = node.marker() {
                        if target.iter().any(|t| t.marker() == Some(marker)) {
                            log::debug!(
                                "{} マーカー '{}' を破棄 (/{} には既にある)",
                                marker.prefix(),
                                node.name,
                                parent.join("/")
                            );
                            continue;
                        }
                    }
                    target.push(node);
                }
            }
        }
    }
    merged
}

fn children_mut<'t>(tree: &'t mut RouteTree, parent: &[String]) -> Option<&'t mut Vec<RouteTreeNode>> {
    if parent.is_empty() {
        return Some(&mut tree.roots);
    }
    find_by_path_mut(tree, parent).map(|n| &mut n.children)
}

/// ノード id ごとにフィーチャー列を連結する。重複 id もそのまま残す。
pub fn merge_feature_maps(maps: &[FeatureMap]) -> FeatureMap {
    let mut merged = FeatureMap::new();
    for map in maps {
        for (node_id, features) in map {
            merged
                .entry(node_id.clone())
                .or_default()
                .extend(features.iter().cloned());
        }
    }
    merged
}

/// グループは名前で、ページは id で和集合をとる
pub fn merge_groups(lists: &[&[RouteGroup]]) -> Vec<RouteGroup> {
    let mut merged: Vec<RouteGroup> = Vec::new();
    for group in lists.iter().flat_map(|l| l.iter()) {
        match merged.iter_mut().find(|g| g.name == group.name) {
            Some(existing) => {
                for page in &group.pages {
                    if !existing.contains_page(&page.id) {
                        existing.pages.push(page.clone());
                    }
                }
            }
            None => merged.push(group.clone()),
        }
    }
    merged
}

/// 生成物一式をマージする
pub fn merge_structures(structures: &[GeneratedStructure]) -> GeneratedStructure {
    let trees: Vec<RouteTree> = structures.iter().map(|s| s.tree.clone()).collect();
    let maps: Vec<FeatureMap> = structures.iter().map(|s| s.features.clone()).collect();
    let groups: Vec<&[RouteGroup]> = structures.iter().map(|s| s.groups.as_slice()).collect();

    log::info!("{} 個の生成物をマージします", structures.len());
    GeneratedStructure {
        tree: merge_trees(&trees),
        features: merge_feature_maps(&maps),
        groups: merge_groups(&groups),
    }
}
