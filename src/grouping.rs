// src/grouping.rs

use std::collections::HashSet;

use crate::config::{GroupRule, GroupingConfig};
use crate::model::{PageInput, RouteGroup};

/// キーワードによるルートグループ検出。
///
/// 規則は設定の順 (認証 → 管理 → 一般ナビゲーション) に評価し、
/// 先の規則が取ったページは後の規則では数えない。
/// グループが 1 つも見つからないのは正常な結果。
pub struct GroupDetector<'a> {
    config: &'a GroupingConfig,
}

impl<'a> GroupDetector<'a> {
    pub fn new(config: &'a GroupingConfig) -> Self {
        GroupDetector { config }
    }

    pub fn detect(&self, pages: &[PageInput]) -> Vec<RouteGroup> {
        let corpus = page_list_text(pages);
        let mut claimed: HashSet<&str> = HashSet::new();
        let mut groups = Vec::new();

        for rule in &self.config.groups {
            let matched: Vec<&PageInput> = pages
                .iter()
                .filter(|p| !claimed.contains(p.id.as_str()))
                .filter(|p| page_matches(p, rule))
                .collect();

            let strong = rule
                .strong_keywords
                .iter()
                .any(|k| mentions(&corpus, &k.to_lowercase()));

            let proposed = matched.len() >= self.config.threshold || (strong && !matched.is_empty());
            log::debug!(
                "グループ '{}': 一致 {} ページ, strong={}, proposed={}",
                rule.name,
                matched.len(),
                strong,
                proposed
            );
            if !proposed {
                continue;
            }

            claimed.extend(matched.iter().map(|p| p.id.as_str()));
            groups.push(RouteGroup {
                name: rule.name.clone(),
                pages: matched.into_iter().cloned().collect(),
                theme: rule.theme.clone(),
            });
        }

        groups
    }
}

/// 既定の呼び出し口
pub fn detect_groups(pages: &[PageInput], config: &GroupingConfig) -> Vec<RouteGroup> {
    GroupDetector::new(config).detect(pages)
}

/// ページ id が属するグループ
pub fn group_of<'g>(groups: &'g [RouteGroup], page_id: &str) -> Option<&'g RouteGroup> {
    groups.iter().find(|g| g.contains_page(page_id))
}

fn page_matches(page: &PageInput, rule: &GroupRule) -> bool {
    let route = page.route.to_lowercase();
    let name = page.name.to_lowercase();
    rule.keywords.iter().any(|k| {
        let k = k.to_lowercase();
        mentions(&route, &k) || mentions(&name, &k)
    })
}

fn page_list_text(pages: &[PageInput]) -> String {
    pages
        .iter()
        .map(|p| format!("{} {} {}", p.name, p.route, p.description))
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}

/// 単語境界つきの部分一致 ("/author" は "auth" に一致しない)
pub(crate) fn mentions(haystack: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    haystack.match_indices(keyword).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + keyword.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
