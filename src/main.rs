//! 程序入口：初始化日志、解析命令行，把 Session 的清单/着色能力暴露为子命令

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::SubscriberBuilder;

use lottie_recolor::{
    model::rewriter::ColorizeOptions,
    utils::clipboard::copy_to_clipboard,
    vm::bridge::*,
    Session,
};

/// Lottie 颜色查看与替换
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 列出文档中的静态颜色位点
    List {
        /// Lottie JSON 文件
        file: PathBuf,

        /// 输出完整清单 JSON
        #[arg(long)]
        json: bool,

        /// 同时复制到剪贴板
        #[arg(long)]
        copy: bool,
    },
    /// 输出 路径 -> 颜色 的编辑映射片段（可修改后交给 apply）
    Snippet {
        /// Lottie JSON 文件
        file: PathBuf,

        /// 同时复制到剪贴板
        #[arg(long)]
        copy: bool,
    },
    /// 按编辑映射替换颜色
    Apply {
        /// Lottie JSON 文件
        file: PathBuf,

        /// 编辑映射 JSON 文件（{"路径": "颜色"}）
        #[arg(short, long)]
        edits: Option<PathBuf>,

        /// 单条编辑，形如 layers.0.shapes.1.c.k=#ff0000，可重复
        #[arg(short, long = "set", value_parser = parse_set_arg)]
        set: Vec<(String, String)>,

        /// 输出文件；省略时写到标准输出
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 无改动时共享输入文档而不是深拷贝
        #[arg(long)]
        share: bool,
    },
}

fn load(file: &Path, options: ColorizeOptions) -> Result<Session> {
    let mut session = Session::with_options(options);
    session
        .load_file(file)
        .with_context(|| format!("无法加载 {}", file.display()))?;
    tracing::info!("{}: {} 个颜色位点", STATUS_LOADED, session.sites.len());
    Ok(session)
}

fn emit(text: &str, copy: bool) -> Result<()> {
    println!("{}", text);
    if copy {
        copy_to_clipboard(text).context("复制失败")?;
        tracing::info!("{}", STATUS_COPIED);
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::List { file, json, copy } => {
            let session = load(&file, ColorizeOptions::default())?;
            let text = if json {
                render_inventory_json(&session.sites)?
            } else {
                render_site_table(&session.sites)
            };
            emit(&text, copy)
        }
        Command::Snippet { file, copy } => {
            let session = load(&file, ColorizeOptions::default())?;
            emit(&render_edit_map(&session.sites)?, copy)
        }
        Command::Apply { file, edits, set, output, share } => {
            let mut session = load(&file, ColorizeOptions { share_unmodified_subtrees: share })?;

            let mut batch: Vec<(String, Option<String>)> = Vec::new();
            if let Some(edits_path) = edits {
                let text = fs::read_to_string(&edits_path)
                    .with_context(|| format!("无法读取编辑映射 {}", edits_path.display()))?;
                batch.extend(parse_edit_map(&text)?);
            }
            batch.extend(set.into_iter().map(|(path, color)| (path, Some(color))));

            let skipped = session.apply_edits(batch)?;
            for s in &skipped {
                tracing::warn!("{}{} ({})", STATUS_SKIPPED_PREFIX, s.path, s.reason);
            }

            match output {
                Some(out) => {
                    session
                        .save_to_file(&out)
                        .with_context(|| format!("无法写入 {}", out.display()))?;
                }
                None => {
                    let dom = session.dom.as_ref().context("文档尚未加载")?;
                    let mut stdout = std::io::stdout().lock();
                    serde_json::to_writer_pretty(&mut stdout, dom)?;
                    writeln!(stdout)?;
                }
            }
            tracing::info!("{}: 跳过 {} 条", STATUS_WRITE_BACK_SUCCESS, skipped.len());
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志输出（写到标准错误，避免污染 JSON 输出）
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = SubscriberBuilder::default()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();

    run(args)
}
