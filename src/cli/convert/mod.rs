//! `mdlive convert`: Markdown files to HTML documents.
//!
//! One input file, or every `.md` file of a directory (only its top level
//! unless `--recursive`), is written to `<output>/<relative path>.html`.
//! A failing file is logged and the batch goes on.

mod watch;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jwalk::WalkDir;
use rayon::prelude::*;

use super::args::ConvertArgs;
use crate::freshness::ContentHash;
use crate::markdown::Processor;
use crate::utils::plural_count;
use crate::{debug, log, pipeline};

pub fn run(args: &ConvertArgs) -> Result<()> {
    let job = Job::new(&args.path, &args.output, args.recursive)?;
    let processor = Processor::default();

    let report = job.convert_all(&processor);
    report.log();

    if args.watch {
        watch::run(&job, &processor, &report)?;
    }
    Ok(())
}

/// What to convert and where to write it.
#[derive(Debug, Clone)]
pub struct Job {
    /// Canonical input file or directory
    input: PathBuf,
    /// Directory output paths are relative to
    base: PathBuf,
    output: PathBuf,
    recursive: bool,
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct Report {
    /// Converted sources with the fingerprint of the converted content
    pub converted: Vec<(PathBuf, ContentHash)>,
    pub failed: usize,
}

impl Report {
    fn log(&self) {
        if self.converted.is_empty() && self.failed == 0 {
            log!("convert"; "no markdown files found");
            return;
        }
        if self.failed == 0 {
            log!("convert"; "converted {}", plural_count(self.converted.len(), "file"));
        } else {
            log!(
                "convert";
                "converted {}, {} failed",
                plural_count(self.converted.len(), "file"),
                self.failed
            );
        }
    }
}

impl Job {
    pub fn new(input: &Path, output: &Path, recursive: bool) -> Result<Self> {
        let input = input
            .canonicalize()
            .with_context(|| format!("cannot access {}", input.display()))?;
        let base = if input.is_file() {
            if !is_markdown(&input) {
                anyhow::bail!("{} is neither a directory nor a Markdown file", input.display());
            }
            input.parent().map(Path::to_path_buf).unwrap_or_default()
        } else {
            input.clone()
        };
        Ok(Self {
            input,
            base,
            output: output.to_path_buf(),
            recursive,
        })
    }

    fn is_single_file(&self) -> bool {
        self.input != self.base
    }

    /// Markdown sources of this job, sorted.
    pub fn inputs(&self) -> Vec<PathBuf> {
        if self.is_single_file() {
            return vec![self.input.clone()];
        }
        let depth = if self.recursive { usize::MAX } else { 1 };
        let mut files: Vec<PathBuf> = WalkDir::new(&self.base)
            .max_depth(depth)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path())
            .filter(|path| is_markdown(path))
            .collect();
        files.sort();
        files
    }

    /// Whether a changed `path` belongs to this job.
    pub fn covers(&self, path: &Path) -> bool {
        if self.is_single_file() {
            return path == self.input;
        }
        is_markdown(path)
            && match path.parent() {
                Some(parent) if self.recursive => parent.starts_with(&self.base),
                Some(parent) => parent == self.base,
                None => false,
            }
    }

    /// Whether a `config.yml` in `dir` affects this job.
    pub fn covers_dir(&self, dir: &Path) -> bool {
        dir == self.base || (self.recursive && dir.starts_with(&self.base))
    }

    pub fn output_path(&self, source: &Path) -> PathBuf {
        let relative = source
            .strip_prefix(&self.base)
            .ok()
            .map(Path::to_path_buf)
            .or_else(|| source.file_name().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("index.md"));
        self.output.join(relative).with_extension("html")
    }

    /// Source path relative to the input, for messages.
    pub fn display<'a>(&self, source: &'a Path) -> std::path::Display<'a> {
        source.strip_prefix(&self.base).unwrap_or(source).display()
    }

    /// Convert every input in parallel.
    pub fn convert_all(&self, processor: &Processor) -> Report {
        let results: Vec<_> = self
            .inputs()
            .into_par_iter()
            .map(|source| {
                let result = self.convert(&source, processor);
                (source, result)
            })
            .collect();

        let mut report = Report::default();
        for (source, result) in results {
            match result {
                Ok(hash) => report.converted.push((source, hash)),
                Err(e) => {
                    log!("error"; "{}: {:#}", self.display(&source), e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Read, render and write one source.
    pub fn convert(&self, source: &Path, processor: &Processor) -> Result<ContentHash> {
        let bytes =
            fs::read(source).with_context(|| format!("failed to read {}", source.display()))?;
        self.convert_bytes(source, &bytes, processor)?;
        Ok(ContentHash::of(&bytes))
    }

    /// Render already-read `bytes` of `source` and write the document.
    pub fn convert_bytes(
        &self,
        source: &Path,
        bytes: &[u8],
        processor: &Processor,
    ) -> Result<PathBuf> {
        let text = std::str::from_utf8(bytes)
            .with_context(|| format!("{} is not valid UTF-8", source.display()))?;
        let doc = pipeline::render_source(text, source, processor, "");
        debug!(
            "convert";
            "{}: \"{}\", {} references, {} run blocks",
            self.display(source),
            doc.config.title(),
            doc.rendered.references.len(),
            doc.rendered.run_blocks.len()
        );

        let out = self.output_path(source);
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&out, doc.html).with_context(|| format!("failed to write {}", out.display()))?;
        Ok(out)
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}
