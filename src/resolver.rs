// src/resolver.rs

use crate::config::ScopeConfig;
use crate::grouping::mentions;
use crate::model::{FeatureDraft, Scope};
use crate::tree::{logical_segments, route_string};

/// スコープ判定に必要な、フィーチャーを所有するページの情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// ページの論理ルート (例: "/dashboard")
    pub route: String,
    /// 所属するルートグループ名 (あれば)
    pub group: Option<String>,
    /// ページのディレクトリの物理パス (例: ["app", "(dashboard)", "dashboard"])
    pub dir: Vec<String>,
}

impl PageContext {
    pub fn new(dir: Vec<String>, group: Option<String>) -> Self {
        PageContext {
            route: route_string(&logical_segments(&dir)),
            group,
            dir,
        }
    }
}

/// フィーチャーの可視スコープを分類し、配置先ディレクトリへ解決する。
/// ツリーは書き換えない。
pub struct ScopeResolver<'a> {
    config: &'a ScopeConfig,
}

impl<'a> ScopeResolver<'a> {
    pub fn new(config: &'a ScopeConfig) -> Self {
        ScopeResolver { config }
    }

    /// タイトルと説明文のキーワードからスコープを決める。
    ///
    /// - ID・セッション・テーマ・全体通知 → `Global`
    /// - 共有サイドバー・セクション権限 → `Section(name)`。ただしページが実際に
    ///   そのセクションのディレクトリ配下にある場合だけ
    /// - それ以外 → `Page(route)`
    pub fn classify(&self, draft: &FeatureDraft, page: &PageContext) -> Scope {
        let text = format!("{} {}", draft.title, draft.description).to_lowercase();

        if self
            .config
            .global_keywords
            .iter()
            .any(|k| mentions(&text, &k.to_lowercase()))
        {
            return Scope::Global;
        }

        if self
            .config
            .section_keywords
            .iter()
            .any(|k| mentions(&text, &k.to_lowercase()))
        {
            if let Some(section) = section_of(page) {
                return Scope::Section(section);
            }
            log::debug!(
                "'{}' はセクション向けだが {} はセクション配下にないためページスコープに落とします",
                draft.title,
                page.route
            );
        }

        Scope::Page(page.route.clone())
    }

    /// スコープを具体的なディレクトリ (物理パス) に解決する。
    ///
    /// - `scope`: `classify` の結果
    /// - `page`: フィーチャーを所有するページ
    ///
    /// 戻り値:
    /// - Global → ルートディレクトリ
    /// - Section → ページの祖先にあるセクションディレクトリ
    /// - Page → ページ自身のディレクトリ
    pub fn resolve_dir(&self, scope: &Scope, page: &PageContext) -> Vec<String> {
        match scope {
            Scope::Global => page.dir.iter().take(1).cloned().collect(),
            Scope::Section(name) => match section_dir(&page.dir, name) {
                Some(dir) => dir,
                None => {
                    log::warn!(
                        "セクション '{}' が {} の祖先に見つからないためページに配置します",
                        name,
                        page.dir.join("/")
                    );
                    page.dir.clone()
                }
            },
            Scope::Page(_) => page.dir.clone(),
        }
    }

    /// classify + resolve_dir
    pub fn resolve(&self, draft: &FeatureDraft, page: &PageContext) -> (Scope, Vec<String>) {
        let scope = self.classify(draft, page);
        let dir = self.resolve_dir(&scope, page);
        (scope, dir)
    }
}

/// ページが属するセクション名。
/// ルートグループ配下ならグループ名、そうでなく 2 段以上のルートなら先頭セグメント。
fn section_of(page: &PageContext) -> Option<String> {
    if let Some(group) = &page.group {
        if section_dir(&page.dir, group).is_some() {
            return Some(group.clone());
        }
    }
    let logical = logical_segments(&page.dir);
    let top = page.dir.get(1)?;
    if logical.len() >= 2 && logical.first() == Some(top) {
        return Some(top.clone());
    }
    None
}

/// `dir` の中でセクション `name` を表す祖先ディレクトリまでの接頭辞
fn section_dir(dir: &[String], name: &str) -> Option<Vec<String>> {
    let grouped = format!("({})", name);
    if let Some(i) = dir.iter().position(|s| *s == grouped) {
        return Some(dir[..=i].to_vec());
    }
    match dir.get(1) {
        Some(top) if top == name => Some(dir[..2].to_vec()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileTypeFlags;
    use pretty_assertions::assert_eq;

    fn p(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn draft(title: &str, description: &str) -> FeatureDraft {
        FeatureDraft::new("f", title, description, FileTypeFlags::all())
    }

    #[test]
    fn identity_features_are_global() {
        let config = ScopeConfig::default();
        let resolver = ScopeResolver::new(&config);
        let page = PageContext::new(p(&["app", "dashboard"]), None);

        let (scope, dir) = resolver.resolve(&draft("Sign out user", "Ends the session"), &page);
        assert_eq!(scope, Scope::Global);
        assert_eq!(dir, p(&["app"]));
    }

    #[test]
    fn sidebar_features_resolve_to_group_dir() {
        let config = ScopeConfig::default();
        let resolver = ScopeResolver::new(&config);
        let page = PageContext::new(
            p(&["app", "(admin)", "admin", "users"]),
            Some("admin".to_string()),
        );
        assert_eq!(page.route, "/admin/users");

        let (scope, dir) = resolver.resolve(&draft("Admin sidebar", "Collapsible sidebar"), &page);
        assert_eq!(scope, Scope::Section("admin".to_string()));
        assert_eq!(dir, p(&["app", "(admin)"]));
    }

    #[test]
    fn ungrouped_sections_use_top_level_segment() {
        let config = ScopeConfig::default();
        let resolver = ScopeResolver::new(&config);
        let page = PageContext::new(p(&["app", "settings", "billing"]), None);

        let (scope, dir) = resolver.resolve(&draft("Settings sidebar", ""), &page);
        assert_eq!(scope, Scope::Section("settings".to_string()));
        assert_eq!(dir, p(&["app", "settings"]));
    }

    #[test]
    fn section_without_ancestor_falls_back_to_page() {
        let config = ScopeConfig::default();
        let resolver = ScopeResolver::new(&config);
        let page = PageContext::new(p(&["app", "reports"]), None);

        let (scope, dir) = resolver.resolve(&draft("Reports sidebar", ""), &page);
        assert_eq!(scope, Scope::Page("/reports".to_string()));
        assert_eq!(dir, p(&["app", "reports"]));
    }

    #[test]
    fn everything_else_is_page_scoped() {
        let config = ScopeConfig::default();
        let resolver = ScopeResolver::new(&config);
        let page = PageContext::new(p(&["app", "(auth)", "login"]), Some("auth".into()));

        let (scope, dir) = resolver.resolve(&draft("Login form", "Email and password form"), &page);
        assert_eq!(scope, Scope::Page("/login".to_string()));
        assert_eq!(dir, page.dir);
    }

    #[test]
    fn root_page_route_is_slash() {
        let page = PageContext::new(p(&["app"]), None);
        assert_eq!(page.route, "/");
    }
}
