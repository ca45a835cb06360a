// src/scan.rs

//! ディスク上の既存 `app/` ディレクトリをルートツリーとして取り込む。

use path_absolutize::Absolutize;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::error::{Result, ScaffoldError};
use crate::ids::IdSource;
use crate::model::{RouteTree, RouteTreeNode};
use crate::tree::find_by_path_mut;

/// 取り込まないディレクトリ
const SKIPPED_DIRS: [&str; 3] = ["node_modules", ".next", ".git"];

/// `dir` 以下を再帰的に走査してツリーにする。
///
/// - `dir`: 取り込むディレクトリ (例: `./my-app/app`)。その名前がルートノード名になる
/// - `ids`: ノード id の供給元
///
/// 隠しファイルと `node_modules` などは無視する。兄弟はファイル名順。
pub fn scan_app_dir<I: IdSource>(dir: &Path, ids: &mut I) -> Result<RouteTree> {
    let root = dir
        .absolutize()
        .map_err(|e| ScaffoldError::io(dir, e))?
        .to_path_buf();
    if !root.is_dir() {
        return Err(ScaffoldError::NotFound(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| ScaffoldError::NotFound(format!("{} has no name", root.display())))?;

    let mut tree = RouteTree::default();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e));

    for entry in walker {
        let entry = entry?;
        // 1) ルートからの名前列を作る
        let mut path = vec![root_name.clone()];
        if let Ok(rel) = entry.path().strip_prefix(&root) {
            path.extend(rel.iter().map(|c| c.to_string_lossy().to_string()));
        }

        // 2) ノードを作り、親の children に追加する (walkdir は親を先に返す)
        let id = ids.next_id(&path);
        let name = &path[path.len() - 1];
        let node = if entry.file_type().is_dir() {
            RouteTreeNode::directory(id, name)
        } else {
            RouteTreeNode::file(id, name)
        };

        if entry.depth() == 0 {
            tree.roots.push(node);
            continue;
        }
        match find_by_path_mut(&mut tree, &path[..path.len() - 1]) {
            Some(parent) => parent.children.push(node),
            None => log::warn!("親が見つからないため {:?} を飛ばします", entry.path()),
        }
    }

    log::info!(
        "{} を取り込みました ({} ノード)",
        root.display(),
        crate::tree::walk(&tree).len()
    );
    Ok(tree)
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::PathIds;
    use crate::tree::{render, route_list};
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn scans_nested_routes_in_name_order() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("app");
        fs::create_dir_all(app.join("(auth)/login")).unwrap();
        fs::create_dir_all(app.join("dashboard")).unwrap();
        fs::create_dir_all(app.join("node_modules/x")).unwrap();
        fs::write(app.join("layout.tsx"), "").unwrap();
        fs::write(app.join("page.tsx"), "").unwrap();
        fs::write(app.join(".DS_Store"), "").unwrap();
        fs::write(app.join("(auth)/login/page.tsx"), "").unwrap();
        fs::write(app.join("dashboard/page.tsx"), "").unwrap();

        let tree = scan_app_dir(&app, &mut PathIds).unwrap();
        assert_eq!(
            render(&tree),
            "app/\n  (auth)/\n    login/\n      page.tsx\n  dashboard/\n    page.tsx\n  layout.tsx\n  page.tsx\n"
        );
        assert_eq!(route_list(&tree), vec!["/", "/dashboard", "/login"]);
        assert_eq!(tree.roots[0].children[0].id, "app/(auth)");
    }

    #[test]
    fn missing_dir_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = scan_app_dir(&tmp.path().join("nope"), &mut PathIds).unwrap_err();
        assert!(matches!(err, ScaffoldError::NotFound(_)));
    }
}
