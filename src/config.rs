// src/config.rs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{Result, ScaffoldError};
use crate::model::{FileType, Marker};

/// スキャフォールド全体の設定。どの項目も省略可能。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaffoldConfig {
    pub layout: LayoutConfig,
    pub grouping: GroupingConfig,
    pub scope: ScopeConfig,
    pub validation: ValidationConfig,
}

impl ScaffoldConfig {
    /// TOML ファイルから読み込んで検証する
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| ScaffoldError::io(path, e))?;
        let config: ScaffoldConfig = toml::from_str(&raw).map_err(|e| ScaffoldError::Toml {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        log::debug!("設定を読み込みました: {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.layout.root_dir.trim().is_empty() {
            return Err(ScaffoldError::invalid_config("layout.root_dir must not be empty"));
        }
        if self.layout.root_dir.contains('/') {
            return Err(ScaffoldError::invalid_config(format!(
                "layout.root_dir ({}) must be a single directory name",
                self.layout.root_dir
            )));
        }
        if self.layout.component_ext.is_empty() || self.layout.plain_ext.is_empty() {
            return Err(ScaffoldError::invalid_config("file extensions must not be empty"));
        }
        if self.grouping.threshold == 0 {
            return Err(ScaffoldError::invalid_config("grouping.threshold must be > 0"));
        }
        let mut seen = HashSet::new();
        for rule in &self.grouping.groups {
            if !seen.insert(rule.name.as_str()) {
                return Err(ScaffoldError::invalid_config(format!(
                    "duplicate group name: {}",
                    rule.name
                )));
            }
        }
        Ok(())
    }
}

/// ファイル配置の規約
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// ルートディレクトリ名 (既定 "app")
    pub root_dir: String,
    /// コンポーネントを書ける拡張子 (マーカーと hooks に使う)
    pub component_ext: String,
    /// それ以外のユーティリティの拡張子
    pub plain_ext: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            root_dir: "app".to_string(),
            component_ext: "tsx".to_string(),
            plain_ext: "ts".to_string(),
        }
    }
}

impl LayoutConfig {
    pub fn marker_file(&self, marker: Marker) -> String {
        marker.file_name(&self.component_ext)
    }

    pub fn extension_for(&self, file_type: FileType) -> &str {
        if file_type.is_component_capable() {
            &self.component_ext
        } else {
            &self.plain_ext
        }
    }

    /// `<prefix>.<type>.<ext>`
    pub fn utility_file(&self, carrier: Marker, file_type: FileType) -> String {
        format!(
            "{}.{}.{}",
            carrier.prefix(),
            file_type.as_str(),
            self.extension_for(file_type)
        )
    }
}

/// ルートグループ検出のキーワード規則
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// グループを提案するのに必要な一致ページ数
    pub threshold: usize,
    /// 優先順に並んだ規則。先の規則が取ったページは後の規則では数えない。
    pub groups: Vec<GroupRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRule {
    pub name: String,
    pub theme: String,
    pub keywords: Vec<String>,
    /// ページ一覧のどこかに現れるだけでグループを提案する複数語キーワード
    #[serde(default)]
    pub strong_keywords: Vec<String>,
}

impl GroupRule {
    fn new(name: &str, theme: &str, keywords: &[&str], strong: &[&str]) -> Self {
        GroupRule {
            name: name.to_string(),
            theme: theme.to_string(),
            keywords: to_strings(keywords),
            strong_keywords: to_strings(strong),
        }
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        GroupingConfig {
            threshold: 2,
            groups: vec![
                GroupRule::new(
                    "auth",
                    "authentication",
                    &[
                        "login",
                        "signin",
                        "sign-in",
                        "signup",
                        "sign-up",
                        "register",
                        "forgot-password",
                        "reset-password",
                        "verify-email",
                        "logout",
                        "auth",
                    ],
                    &["sign in", "sign up", "log in", "forgot password", "reset password"],
                ),
                GroupRule::new(
                    "admin",
                    "administration",
                    &["admin", "moderation", "moderator", "backoffice"],
                    &["admin panel", "admin dashboard", "back office"],
                ),
                GroupRule::new(
                    "dashboard",
                    "primary navigation",
                    &[
                        "dashboard",
                        "settings",
                        "profile",
                        "account",
                        "analytics",
                        "overview",
                        "billing",
                        "notifications",
                        "reports",
                    ],
                    &["user dashboard", "control panel", "member area"],
                ),
            ],
        }
    }
}

/// スコープ分類のキーワード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// ID・セッション・テーマ・全体通知
    pub global_keywords: Vec<String>,
    /// 共有サイドバー・セクション権限
    pub section_keywords: Vec<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        ScopeConfig {
            global_keywords: to_strings(&[
                "sign out",
                "signout",
                "log out",
                "logout",
                "session",
                "current user",
                "authentication",
                "auth state",
                "theme",
                "dark mode",
                "global notification",
                "toast",
                "notification center",
                "locale",
            ]),
            section_keywords: to_strings(&[
                "sidebar",
                "shared navigation",
                "section navigation",
                "section permission",
                "permission",
                "role-based",
                "breadcrumb",
            ]),
        }
    }
}

/// Validator のしきい値と語彙
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_title_len: usize,
    pub min_description_len: usize,
    /// 汎用語だけのタイトルを許容する説明文の長さ
    pub thin_description_len: usize,
    pub generic_words: Vec<String>,
    pub mutation_verbs: Vec<String>,
    /// "settings page" のように説明文からルートを推測する語
    pub route_hints: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            min_title_len: 3,
            min_description_len: 20,
            thin_description_len: 60,
            generic_words: to_strings(&[
                "manage",
                "management",
                "handle",
                "handling",
                "data",
                "feature",
                "functionality",
                "stuff",
                "misc",
                "general",
                "basic",
                "page",
                "info",
                "information",
                "content",
                "thing",
                "things",
                "process",
                "system",
            ]),
            mutation_verbs: to_strings(&[
                "create", "update", "delete", "remove", "submit", "save", "edit", "add",
                "upload", "post", "send", "publish", "archive", "cancel", "register", "invite",
                "checkout", "pay",
            ]),
            route_hints: to_strings(&[
                "settings",
                "profile",
                "login",
                "register",
                "signup",
                "dashboard",
                "checkout",
                "cart",
                "pricing",
                "contact",
                "about",
                "admin",
                "search",
                "notifications",
                "billing",
                "account",
                "faq",
                "blog",
                "help",
                "onboarding",
            ]),
        }
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = ScaffoldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout.marker_file(Marker::Page), "page.tsx");
        assert_eq!(
            config.layout.utility_file(Marker::Layout, FileType::Actions),
            "layout.actions.ts"
        );
        assert_eq!(
            config.layout.utility_file(Marker::Page, FileType::Hooks),
            "page.hooks.tsx"
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[layout]\ncomponent_ext = \"jsx\"\n\n[grouping]\nthreshold = 3").unwrap();

        let config = ScaffoldConfig::load(file.path()).unwrap();
        assert_eq!(config.layout.component_ext, "jsx");
        assert_eq!(config.layout.root_dir, "app");
        assert_eq!(config.grouping.threshold, 3);
        assert_eq!(config.grouping.groups.len(), 3);
    }

    #[test]
    fn rejects_zero_threshold_and_duplicate_groups() {
        let mut config = ScaffoldConfig::default();
        config.grouping.threshold = 0;
        assert!(config.validate().is_err());

        let mut config = ScaffoldConfig::default();
        let first = config.grouping.groups[0].clone();
        config.grouping.groups.push(first);
        assert!(matches!(
            config.validate(),
            Err(ScaffoldError::InvalidConfig(_))
        ));
    }

    #[test]
    fn broken_toml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[layout\nroot_dir = ").unwrap();
        let err = ScaffoldConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ScaffoldError::Toml { .. }));
    }
}
