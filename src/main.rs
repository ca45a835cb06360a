// src/main.rs

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use path_absolutize::Absolutize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use route_scaffolder::merger::merge_structures;
use route_scaffolder::parser::{load_feature_drafts, load_pages, load_structure};
use route_scaffolder::scan::scan_app_dir;
use route_scaffolder::tree::render;
use route_scaffolder::{
    FeatureDrafts, GeneratedStructure, PathIds, Pipeline, ScaffoldConfig, ValidationResult,
};

/// CLI 引数定義
#[derive(Parser, Debug)]
#[command(
    name = "route-scaffolder",
    version,
    about = "ページ定義から App Router のディレクトリ構成を生成し、フィーチャーをリンクして JSON 出力する CLI ツール"
)]
struct Cli {
    /// 設定ファイル (TOML)。省略時は既定値
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// debug ログを出す
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// ページ定義からツリーを生成してフィーチャーをリンクする
    Build {
        /// ページ定義 JSON
        /// 例: `--pages ./pages.json`
        #[arg(short = 'p', long = "pages", value_name = "FILE")]
        pages: PathBuf,

        /// ページ id → フィーチャー下書き の JSON
        #[arg(short = 'f', long = "features", value_name = "FILE")]
        features: Option<PathBuf>,

        /// 追加先の既存生成物 JSON
        #[arg(long = "existing", value_name = "FILE", conflicts_with = "scan_dir")]
        existing: Option<PathBuf>,

        /// 追加先としてディスク上の app ディレクトリを取り込む
        #[arg(long = "scan-dir", value_name = "DIR")]
        scan_dir: Option<PathBuf>,

        /// 検証エラーがあれば終了コード 1
        #[arg(long = "strict")]
        strict: bool,

        /// 生成したツリーを stderr に表示する
        #[arg(long = "print-tree")]
        print_tree: bool,
    },
    /// 生成物 JSON を左から順にマージする
    Merge {
        #[arg(value_name = "FILE", required = true)]
        structures: Vec<PathBuf>,
    },
    /// 生成物 JSON を検証する
    Validate {
        #[arg(value_name = "FILE")]
        structure: PathBuf,

        /// 説明文の出典となるページ定義 JSON
        #[arg(short = 'p', long = "pages", value_name = "FILE")]
        pages: Option<PathBuf>,

        #[arg(long = "strict")]
        strict: bool,
    },
    /// ディスク上の app ディレクトリをツリーとして出力する
    Scan {
        #[arg(short = 'd', long = "dir", value_name = "DIR")]
        dir: PathBuf,
    },
}

/// build の出力
#[derive(Serialize)]
struct BuildOutput {
    #[serde(flatten)]
    structure: GeneratedStructure,
    validation: ValidationResult,
}

fn main() -> anyhow::Result<()> {
    // 1) CLI 引数をパースし、ログを初期化
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    // 2) 設定を読み込む
    let config = match &cli.config {
        Some(path) => {
            let path = absolute(path)?;
            ScaffoldConfig::load(&path)
                .with_context(|| format!("設定ファイルを読み込めませんでした: {}", path.display()))?
        }
        None => ScaffoldConfig::default(),
    };
    let pipeline = Pipeline::new(&config);

    // 3) サブコマンドを実行して JSON を標準出力
    match cli.command {
        Command::Build {
            pages,
            features,
            existing,
            scan_dir,
            strict,
            print_tree,
        } => {
            let pages_path = absolute(&pages)?;
            let pages = load_pages(&pages_path)
                .with_context(|| format!("ページ定義を読み込めませんでした: {}", pages_path.display()))?;

            let drafts = match features {
                Some(path) => {
                    let path = absolute(&path)?;
                    load_feature_drafts(&path).with_context(|| {
                        format!("フィーチャー下書きを読み込めませんでした: {}", path.display())
                    })?
                }
                None => FeatureDrafts::new(),
            };

            let existing = match (existing, scan_dir) {
                (Some(path), _) => Some(read_structure(&path)?),
                (None, Some(dir)) => {
                    let dir = absolute(&dir)?;
                    let tree = scan_app_dir(&dir, &mut PathIds)
                        .with_context(|| format!("ディレクトリを取り込めませんでした: {}", dir.display()))?;
                    Some(GeneratedStructure {
                        tree,
                        ..Default::default()
                    })
                }
                (None, None) => None,
            };

            let structure = pipeline.run(&pages, &drafts, existing.as_ref());
            let validation = pipeline.validate(&structure, &pages);
            if print_tree {
                eprint!("{}", render(&structure.tree));
            }
            let valid = validation.is_valid;
            print_json(&BuildOutput {
                structure,
                validation,
            })?;
            if strict && !valid {
                bail!("検証エラーがあります");
            }
        }
        Command::Merge { structures } => {
            let loaded = structures
                .iter()
                .map(|p| read_structure(p))
                .collect::<anyhow::Result<Vec<_>>>()?;
            print_json(&merge_structures(&loaded))?;
        }
        Command::Validate {
            structure,
            pages,
            strict,
        } => {
            let structure = read_structure(&structure)?;
            let pages = match pages {
                Some(path) => {
                    let path = absolute(&path)?;
                    load_pages(&path)
                        .with_context(|| format!("ページ定義を読み込めませんでした: {}", path.display()))?
                }
                None => Vec::new(),
            };
            let validation = pipeline.validate(&structure, &pages);
            let valid = validation.is_valid;
            print_json(&validation)?;
            if strict && !valid {
                bail!("検証エラーがあります");
            }
        }
        Command::Scan { dir } => {
            let dir = absolute(&dir)?;
            let tree = scan_app_dir(&dir, &mut PathIds)
                .with_context(|| format!("ディレクトリを取り込めませんでした: {}", dir.display()))?;
            print_json(&tree)?;
        }
    }

    Ok(())
}

/// カレントディレクトリ基準で絶対パス化する
fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    Ok(path
        .absolutize()
        .with_context(|| format!("パスを解決できませんでした: {}", path.display()))?
        .to_path_buf())
}

fn read_structure(path: &Path) -> anyhow::Result<GeneratedStructure> {
    let path = absolute(path)?;
    load_structure(&path)
        .with_context(|| format!("生成物を読み込めませんでした: {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
