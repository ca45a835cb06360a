use pretty_assertions::assert_eq;

use route_scaffolder::config::{GroupingConfig, LayoutConfig, ScopeConfig};
use route_scaffolder::grouping::detect_groups;
use route_scaffolder::merger::merge_trees;
use route_scaffolder::model::Marker;
use route_scaffolder::tree::{find_by_path, render, route_list};
use route_scaffolder::{
    FeatureDraft, FeatureDrafts, FeatureLinker, FileType, FileTypeFlags, PageInput, RouteTree,
    ScopeResolver, SequentialIds, TreeBuilder,
};

fn p(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[test]
fn nested_route_into_skeleton() {
    let layout = LayoutConfig::default();
    let mut builder = TreeBuilder::new(&layout);
    let tree = builder.skeleton();
    let tree = builder.insert_route(&tree, "/dashboard/settings");

    let dashboard = find_by_path(&tree, &p(&["app", "dashboard"])).unwrap();
    let settings = find_by_path(&tree, &p(&["app", "dashboard", "settings"])).unwrap();
    assert!(!dashboard.has_marker(Marker::Page));
    assert!(settings.has_marker(Marker::Page));
    assert_eq!(route_list(&tree), vec!["/dashboard/settings"]);

    // 別途挿入すれば dashboard もルートになる
    let tree = builder.insert_route(&tree, "/dashboard");
    assert_eq!(route_list(&tree), vec!["/dashboard", "/dashboard/settings"]);
}

#[test]
fn login_and_register_form_auth_group() {
    let pages = vec![
        PageInput::new("p1", "Login", "/login", "Sign in to your account"),
        PageInput::new("p2", "Register", "/register", "Create a new account"),
    ];
    let groups = detect_groups(&pages, &GroupingConfig::default());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "auth");
    let ids: Vec<&str> = groups[0].pages.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
}

#[test]
fn first_batch_root_page_wins() {
    let layout = LayoutConfig::default();

    let mut a = TreeBuilder::with_ids(&layout, SequentialIds::new("a"));
    let tree_a = a.skeleton();
    let tree_a = a.insert_route(&tree_a, "/");
    let tree_a = a.insert_route(&tree_a, "/about");
    let p1 = find_by_path(&tree_a, &p(&["app", "page.tsx"])).unwrap().id.clone();

    let mut b = TreeBuilder::with_ids(&layout, SequentialIds::new("b"));
    let tree_b = b.skeleton();
    let tree_b = b.insert_route(&tree_b, "/");
    let tree_b = b.insert_route(&tree_b, "/contact");

    let merged = merge_trees(&[tree_a, tree_b]);
    let root_page = find_by_path(&merged, &p(&["app", "page.tsx"])).unwrap();
    assert_eq!(root_page.id, p1);
    assert_eq!(route_list(&merged), vec!["/", "/about", "/contact"]);
    assert_eq!(
        render(&merged),
        "app/\n  layout.tsx\n  page.tsx\n  about/\n    page.tsx\n  contact/\n    page.tsx\n"
    );
}

#[test]
fn identical_global_features_share_file_and_name() {
    let layout = LayoutConfig::default();
    let scope = ScopeConfig::default();
    let mut builder = TreeBuilder::new(&layout);
    let pages = vec![
        PageInput::new("dash", "Dashboard", "/dashboard", ""),
        PageInput::new("admin", "Admin", "/admin", ""),
    ];
    let built = builder.build_tree(&pages, &[]);

    let sign_out = |id: &str| {
        FeatureDraft::new(
            id,
            "Sign out user",
            "Ends the current session and returns to the landing page",
            FileTypeFlags::only(&[FileType::Actions, FileType::Hooks]),
        )
    };
    let mut drafts = FeatureDrafts::new();
    drafts.insert("dash".into(), vec![sign_out("f1")]);
    drafts.insert("admin".into(), vec![sign_out("f2")]);

    let mut linker = FeatureLinker::new(&mut builder, ScopeResolver::new(&scope));
    let linked = linker.link_all(&built.tree, &built.page_dirs, &[], &drafts);

    let from_dash = &linked.features["app/dashboard/page.tsx"][0];
    let from_admin = &linked.features["app/admin/page.tsx"][0];
    assert_eq!(from_dash.linked_files, from_admin.linked_files);
    assert_eq!(from_dash.function_names, from_admin.function_names);
    assert_eq!(from_dash.linked_files[&FileType::Actions], "app/layout.actions.ts");
    assert_eq!(from_dash.linked_files[&FileType::Hooks], "app/layout.hooks.tsx");
    assert_eq!(from_dash.function_names[&FileType::Actions].name, "signOutUserAction");
    // 重複フィーチャー自体は両方残る
    assert_ne!(from_dash.id, from_admin.id);
}

#[test]
fn empty_tree_gets_a_root_on_first_insert() {
    let layout = LayoutConfig::default();
    let mut builder = TreeBuilder::new(&layout);
    let tree = builder.insert_route(&RouteTree::default(), "/");
    assert_eq!(render(&tree), "app/\n  page.tsx\n");
}
