// src/model.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// マーカーとして認識するファイル拡張子
pub const MARKER_EXTENSIONS: [&str; 4] = ["tsx", "ts", "jsx", "js"];

/// 外部から渡されるページ定義 (不変の入力)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInput {
    pub id: String,
    pub name: String,
    /// ルート文字列 (例: "/dashboard/settings")
    pub route: String,
    #[serde(default)]
    pub description: String,
}

impl PageInput {
    pub fn new(id: &str, name: &str, route: &str, description: &str) -> Self {
        PageInput {
            id: id.to_string(),
            name: name.to_string(),
            route: route.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// ルートツリーの 1 ノード。各ノードは自分の children を排他的に所有する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTreeNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteTreeNode>,
}

impl RouteTreeNode {
    pub fn directory(id: String, name: &str) -> Self {
        RouteTreeNode {
            id,
            name: name.to_string(),
            kind: NodeKind::Directory,
            is_expanded: Some(true),
            children: Vec::new(),
        }
    }

    pub fn file(id: String, name: &str) -> Self {
        RouteTreeNode {
            id,
            name: name.to_string(),
            kind: NodeKind::File,
            is_expanded: None,
            children: Vec::new(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// ファイルであればマーカー種別を返す
    pub fn marker(&self) -> Option<Marker> {
        if self.is_file() {
            Marker::from_file_name(&self.name)
        } else {
            None
        }
    }

    /// 直下に指定種別のマーカーを持つか
    pub fn has_marker(&self, marker: Marker) -> bool {
        self.children.iter().any(|c| c.marker() == Some(marker))
    }

    pub fn marker_child(&self, marker: Marker) -> Option<&RouteTreeNode> {
        self.children.iter().find(|c| c.marker() == Some(marker))
    }

    /// 名前で子を探す。同名のディレクトリとファイルがあればディレクトリ
    pub fn child(&self, name: &str) -> Option<&RouteTreeNode> {
        self.children
            .iter()
            .find(|c| c.is_dir() && c.name == name)
            .or_else(|| self.children.iter().find(|c| c.name == name))
    }
}

/// ツリー全体。慣例として `app` という名前のルートディレクトリを 1 つだけ持つ。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTree {
    pub roots: Vec<RouteTreeNode>,
}

impl RouteTree {
    pub fn new(roots: Vec<RouteTreeNode>) -> Self {
        RouteTree { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// ルートマーカー (page / layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    Page,
    Layout,
}

impl Marker {
    /// ユーティリティファイル名の先頭に付くキャリア名
    pub fn prefix(self) -> &'static str {
        match self {
            Marker::Page => "page",
            Marker::Layout => "layout",
        }
    }

    /// `page.tsx` や `layout.js` のようなファイル名を判定する
    pub fn from_file_name(name: &str) -> Option<Marker> {
        let (stem, ext) = name.rsplit_once('.')?;
        if !MARKER_EXTENSIONS.contains(&ext) {
            return None;
        }
        match stem {
            "page" => Some(Marker::Page),
            "layout" => Some(Marker::Layout),
            _ => None,
        }
    }

    pub fn file_name(self, ext: &str) -> String {
        format!("{}.{}", self.prefix(), ext)
    }
}

/// ユーティリティファイルの種別 (閉じた集合)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Hooks,
    Actions,
    Stores,
    Types,
}

impl FileType {
    pub const ALL: [FileType; 4] = [
        FileType::Hooks,
        FileType::Actions,
        FileType::Stores,
        FileType::Types,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Hooks => "hooks",
            FileType::Actions => "actions",
            FileType::Stores => "stores",
            FileType::Types => "types",
        }
    }

    /// hooks だけはコンポーネントを書ける拡張子を使う
    pub fn is_component_capable(self) -> bool {
        matches!(self, FileType::Hooks)
    }

    /// `page.hooks.tsx` のような名前から (キャリア, 種別) を取り出す
    pub fn parse_utility_name(name: &str) -> Option<(Marker, FileType)> {
        let mut parts = name.split('.');
        let carrier = match parts.next()? {
            "page" => Marker::Page,
            "layout" => Marker::Layout,
            _ => return None,
        };
        let type_part = parts.next()?;
        let file_type = FileType::ALL
            .into_iter()
            .find(|t| t.as_str() == type_part)?;
        // 拡張子は必須、それ以上のドットは不可
        parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some((carrier, file_type))
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// フィーチャーが必要とするユーティリティファイル種別のフラグ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTypeFlags {
    pub hooks: bool,
    pub actions: bool,
    pub stores: bool,
    pub types: bool,
}

impl FileTypeFlags {
    pub fn all() -> Self {
        FileTypeFlags {
            hooks: true,
            actions: true,
            stores: true,
            types: true,
        }
    }

    pub fn only(types: &[FileType]) -> Self {
        let mut flags = FileTypeFlags::default();
        for t in types {
            match t {
                FileType::Hooks => flags.hooks = true,
                FileType::Actions => flags.actions = true,
                FileType::Stores => flags.stores = true,
                FileType::Types => flags.types = true,
            }
        }
        flags
    }

    pub fn contains(&self, file_type: FileType) -> bool {
        match file_type {
            FileType::Hooks => self.hooks,
            FileType::Actions => self.actions,
            FileType::Stores => self.stores,
            FileType::Types => self.types,
        }
    }

    /// 要求された種別を固定順 (hooks, actions, stores, types) で返す
    pub fn requested(&self) -> Vec<FileType> {
        FileType::ALL
            .into_iter()
            .filter(|t| self.contains(*t))
            .collect()
    }
}

/// 上流のフィーチャー推論で作られた下書き。ページ id をキーに渡される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDraft {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub needs: FileTypeFlags,
}

impl FeatureDraft {
    pub fn new(id: &str, title: &str, description: &str, needs: FileTypeFlags) -> Self {
        FeatureDraft {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            needs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionName {
    pub name: String,
    pub util_file: String,
}

/// リンク済みのフィーチャー。ツリーには埋め込まず、ノード id をキーにした Map に置く。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub linked_files: BTreeMap<FileType, String>,
    #[serde(default)]
    pub function_names: BTreeMap<FileType, FunctionName>,
}

impl Feature {
    pub fn from_draft(draft: &FeatureDraft) -> Self {
        Feature {
            id: draft.id.clone(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            linked_files: BTreeMap::new(),
            function_names: BTreeMap::new(),
        }
    }
}

/// ノード id → そのノードに属するフィーチャー列
pub type FeatureMap = BTreeMap<String, Vec<Feature>>;

/// ページ id → フィーチャー下書き列
pub type FeatureDrafts = BTreeMap<String, Vec<FeatureDraft>>;

/// ツリー構築中だけ使う一時的なグループ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteGroup {
    pub name: String,
    pub pages: Vec<PageInput>,
    pub theme: String,
}

impl RouteGroup {
    pub fn contains_page(&self, page_id: &str) -> bool {
        self.pages.iter().any(|p| p.id == page_id)
    }

    /// ツリー上のディレクトリ名 (例: "(auth)")
    pub fn dir_name(&self) -> String {
        format!("({})", self.name)
    }
}

/// フィーチャーごとに算出される可視スコープ。永続化しない。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Section(String),
    Page(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Section(group) => write!(f, "section({})", group),
            Scope::Page(route) => write!(f, "page({})", route),
        }
    }
}

/// 1 回の生成 (またはバッチ) の成果物
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedStructure {
    pub tree: RouteTree,
    #[serde(default)]
    pub features: FeatureMap,
    #[serde(default)]
    pub groups: Vec<RouteGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn marker_recognizes_any_script_extension() {
        assert_eq!(Marker::from_file_name("page.tsx"), Some(Marker::Page));
        assert_eq!(Marker::from_file_name("layout.js"), Some(Marker::Layout));
        assert_eq!(Marker::from_file_name("page.hooks.tsx"), None);
        assert_eq!(Marker::from_file_name("page.css"), None);
        assert_eq!(Marker::from_file_name("page"), None);
    }

    #[test]
    fn utility_names_parse_into_carrier_and_type() {
        assert_eq!(
            FileType::parse_utility_name("layout.actions.ts"),
            Some((Marker::Layout, FileType::Actions))
        );
        assert_eq!(
            FileType::parse_utility_name("page.hooks.tsx"),
            Some((Marker::Page, FileType::Hooks))
        );
        assert_eq!(FileType::parse_utility_name("page.tsx"), None);
        assert_eq!(FileType::parse_utility_name("page.hooks"), None);
    }

    #[test]
    fn flags_keep_canonical_order() {
        let flags = FileTypeFlags::only(&[FileType::Types, FileType::Hooks]);
        assert_eq!(flags.requested(), vec![FileType::Hooks, FileType::Types]);
    }

    #[test]
    fn feature_serializes_with_camel_case_keys() {
        let mut feature = Feature::from_draft(&FeatureDraft::new(
            "f1",
            "Sign out user",
            "",
            FileTypeFlags::default(),
        ));
        feature
            .linked_files
            .insert(FileType::Actions, "app/layout.actions.ts".to_string());
        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["linkedFiles"]["actions"], "app/layout.actions.ts");
        assert!(json.get("functionNames").is_some());
    }

    #[test]
    fn tree_serializes_as_plain_node_array() {
        let tree = RouteTree::new(vec![RouteTreeNode::directory("app".into(), "app")]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json[0]["kind"], "directory");
        assert_eq!(json[0]["isExpanded"], true);
    }
}
