// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! combtool
//!
//! Developer tool over combination records: convert between the flat JSON
//! token list and the binary record, inspect record headers, and push placements
//! into a tree.

mod config;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comb_codec::math::Mat4;
use comb_codec::{
    apply_transform_with, count, decode_with, encode, read_header, CombTree, RecordView, TreeSpec,
};
use comfy_table::Table;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::ToolPrefs;

/// Opcode bytes shown by `inspect` before eliding the rest.
const OPCODE_PREVIEW: usize = 32;

#[derive(Parser, Debug)]
#[command(author, version, about = "Encode, decode and inspect combination records")]
struct Args {
    /// Preferences file (default: combtool.json in the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset (overrides prefs)
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Decoder stack ceiling (overrides prefs)
    #[arg(long, global = true)]
    stack_ceiling: Option<usize>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a JSON tree into a binary record
    Encode {
        /// JSON token list (`[]` for the empty tree)
        input: PathBuf,
        /// Output record path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Decode a binary record and print the tree as JSON
    Decode {
        /// Record path
        input: PathBuf,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Print a record's header and region layout
    Inspect {
        /// Record path
        input: PathBuf,
    },
    /// Compose a placement into every leaf and print the tree as JSON
    ///
    /// The placement scales first, then rotates about Z, then translates.
    Transform {
        /// JSON tree
        input: PathBuf,
        /// Translation
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        translate: Option<Vec<f64>>,
        /// Uniform scale factor
        #[arg(long, allow_negative_numbers = true)]
        scale: Option<f64>,
        /// Rotation about Z, in degrees
        #[arg(long, allow_negative_numbers = true)]
        rotate_z: Option<f64>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Print the counting-pass figures for a JSON tree
    Count {
        /// JSON tree
        input: PathBuf,
    },
    /// Print the effective preferences
    Prefs {
        /// Persist them to the preferences file
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let prefs_path = match args.config {
        Some(path) => path,
        None => ToolPrefs::default_path().context("locate preferences")?,
    };
    let mut prefs = ToolPrefs::load(&prefs_path)
        .with_context(|| format!("load preferences {}", prefs_path.display()))?;
    if let Some(level) = args.log_level {
        prefs.log_level = level;
    }
    if let Some(ceiling) = args.stack_ceiling {
        prefs.stack_ceiling = ceiling;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&prefs.log_level))
        .context("parse log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
    debug!(?prefs, "preferences");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.cmd {
        Command::Encode { input, output } => {
            let tree = read_tree(&input)?;
            let bytes = encode(&tree).with_context(|| format!("encode {}", input.display()))?;
            fs::write(&output, &bytes).with_context(|| format!("write {}", output.display()))?;
            info!(bytes = bytes.len(), path = %output.display(), "record written");
        }
        Command::Decode { input, pretty } => {
            let bytes = read_bytes(&input)?;
            let tree = decode_with(&bytes, &prefs.decode_options())
                .with_context(|| format!("decode {}", input.display()))?;
            write_json(&mut out, &TreeSpec::from_tree(&tree), pretty)?;
        }
        Command::Inspect { input } => {
            let bytes = read_bytes(&input)?;
            let view =
                read_header(&bytes).with_context(|| format!("read header of {}", input.display()))?;
            writeln!(out, "{}", header_table(&view, bytes.len()))?;
            let tree = decode_with(&bytes, &prefs.decode_options())
                .with_context(|| format!("decode {}", input.display()))?;
            writeln!(out, "tree: {tree}")?;
        }
        Command::Transform {
            input,
            translate,
            scale,
            rotate_z,
            pretty,
        } => {
            let mut tree = read_tree(&input)?;
            let placement = placement(translate.as_deref(), scale, rotate_z);
            apply_transform_with(&mut tree, &placement, &prefs.tolerance());
            write_json(&mut out, &TreeSpec::from_tree(&tree), pretty)?;
        }
        Command::Count { input } => {
            let tree = read_tree(&input)?;
            write_json(&mut out, &count(&tree), true)?;
        }
        Command::Prefs { save } => {
            if save {
                prefs
                    .save(&prefs_path)
                    .with_context(|| format!("save preferences {}", prefs_path.display()))?;
                info!(path = %prefs_path.display(), "preferences saved");
            }
            write_json(&mut out, &prefs, true)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read {}", path.display()))
}

fn read_tree(path: &Path) -> Result<CombTree> {
    let bytes = read_bytes(path)?;
    let spec: TreeSpec =
        serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))?;
    spec.to_tree()
        .with_context(|| format!("build tree from {}", path.display()))
}

fn write_json<T: Serialize>(out: &mut impl Write, value: &T, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn placement(translate: Option<&[f64]>, scale: Option<f64>, rotate_z: Option<f64>) -> Mat4 {
    let mut m = Mat4::identity();
    if let Some(s) = scale {
        m = Mat4::scale(s, s, s) * m;
    }
    if let Some(deg) = rotate_z {
        m = Mat4::rotation_z(deg.to_radians()) * m;
    }
    if let Some(&[x, y, z]) = translate {
        m = Mat4::translation(x, y, z) * m;
    }
    m
}

fn header_table(view: &RecordView<'_>, total: usize) -> Table {
    let h = &view.header;
    let region = |offset: usize, len: usize| format!("offset {offset}, {len} bytes");
    let mut table = Table::new();
    table.set_header(vec!["field", "value"]);
    table.add_row(vec![
        "width".to_owned(),
        format!("{} (code {})", h.width, h.width.code()),
    ]);
    table.add_row(vec!["n_matrices".to_owned(), h.n_matrices.to_string()]);
    table.add_row(vec!["n_leaves".to_owned(), h.n_leaves.to_string()]);
    table.add_row(vec!["leaf_bytes".to_owned(), h.leaf_bytes.to_string()]);
    table.add_row(vec!["rpn_len".to_owned(), h.rpn_len.to_string()]);
    table.add_row(vec!["max_stack_depth".to_owned(), h.max_stack_depth.to_string()]);
    table.add_row(vec![
        "matrix region".to_owned(),
        region(view.matrix_offset, view.matrices.len()),
    ]);
    table.add_row(vec![
        "leaf region".to_owned(),
        region(view.leaf_offset, view.leaves.len()),
    ]);
    table.add_row(vec![
        "opcode region".to_owned(),
        region(view.opcode_offset, view.opcodes.len()),
    ]);
    if view.is_postfix() {
        let shown = &view.opcodes[..view.opcodes.len().min(OPCODE_PREVIEW)];
        let more = if shown.len() < view.opcodes.len() { "…" } else { "" };
        table.add_row(vec!["opcodes".to_owned(), format!("{}{more}", hex::encode(shown))]);
    }
    let path = if view.is_postfix() {
        "postfix (exact shape)"
    } else {
        "balanced union"
    };
    table.add_row(vec!["decode path".to_owned(), path.to_owned()]);
    table.add_row(vec!["record bytes".to_owned(), total.to_string()]);
    table
}
