// src/ids.rs

//! ノード id の供給元。
//!
//! id は決定的で、同じ入力からは同じツリーができる。

/// 注入される決定的な id 供給元
pub trait IdSource {
    /// `path` はルートからそのノードまでの名前列 (ノード自身を含む)
    fn next_id(&mut self, path: &[String]) -> String;
}

/// パスそのものを id にする (例: "app/dashboard/page.tsx")。既定。
#[derive(Debug, Clone, Copy, Default)]
pub struct PathIds;

impl IdSource for PathIds {
    fn next_id(&mut self, path: &[String]) -> String {
        path.join("/")
    }
}

/// `<prefix>-<n>` 形式の単調増加カウンタ
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: &str) -> Self {
        SequentialIds {
            prefix: prefix.to_string(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        SequentialIds::new("node")
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self, _path: &[String]) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn path_ids_are_stable() {
        let mut ids = PathIds;
        let p = path(&["app", "dashboard", "page.tsx"]);
        assert_eq!(ids.next_id(&p), "app/dashboard/page.tsx");
        assert_eq!(ids.next_id(&p), ids.next_id(&p));
    }

    #[test]
    fn sequential_ids_count_up() {
        let mut ids = SequentialIds::new("n");
        assert_eq!(ids.next_id(&[]), "n-1");
        assert_eq!(ids.next_id(&[]), "n-2");
    }
}
