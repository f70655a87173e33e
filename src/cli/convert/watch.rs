//! `convert --watch`: reconvert sources as they change.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::Result;
use notify::{EventKind, RecursiveMode, Watcher};

use super::{Job, Report};
use crate::config::SIBLING_CONFIG;
use crate::freshness::{ChangeDetector, Freshness};
use crate::markdown::Processor;
use crate::{debug, log, logger};

/// Block on filesystem events until the process is interrupted.
pub fn run(job: &Job, processor: &Processor, initial: &Report) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })?;
    let mode = if job.recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher.watch(&job.base, mode)?;
    log!("watch"; "watching {} (ctrl+c to stop)", job.base.display());

    let mut rebuilder = Rebuilder::new(job, processor, initial);
    while let Ok(result) = rx.recv() {
        match result {
            Ok(event) => rebuilder.handle(&event),
            Err(e) => log!("watch"; "notify error: {}", e),
        }
        if crate::core::is_shutdown() {
            break;
        }
    }
    Ok(())
}

/// Turns filesystem events into conversions.
struct Rebuilder<'a> {
    job: &'a Job,
    processor: &'a Processor,
    detector: ChangeDetector,
}

impl<'a> Rebuilder<'a> {
    fn new(job: &'a Job, processor: &'a Processor, initial: &Report) -> Self {
        let mut detector = ChangeDetector::new();
        for (source, hash) in &initial.converted {
            detector.record(source, *hash);
        }
        Self {
            job,
            processor,
            detector,
        }
    }

    fn handle(&mut self, event: &notify::Event) {
        if matches!(event.kind, EventKind::Access(_) | EventKind::Other) {
            return;
        }
        for path in &event.paths {
            if path.file_name().is_some_and(|name| name == SIBLING_CONFIG) {
                if let Some(dir) = path.parent()
                    && self.job.covers_dir(dir)
                {
                    self.reconvert_dir(dir);
                }
            } else if self.job.covers(path) {
                self.reconvert(path);
            }
        }
    }

    /// Every input of `dir` picks up the changed directory defaults.
    fn reconvert_dir(&mut self, dir: &Path) {
        for source in self.job.inputs() {
            if source.parent() == Some(dir) {
                self.detector.forget(&source);
                self.reconvert(&source);
            }
        }
    }

    fn reconvert(&mut self, source: &Path) {
        let name = self.job.display(source).to_string();
        let bytes = match std::fs::read(source) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("watch"; "removed: {}", name);
                self.detector.forget(source);
                return;
            }
            Err(e) => {
                logger::status_error(&format!("failed: {name}"), &e.to_string());
                return;
            }
        };

        let hash = match self.detector.check(source, &bytes) {
            Freshness::Changed(hash) => hash,
            Freshness::Unchanged => {
                debug!("watch"; "unchanged: {}", name);
                return;
            }
        };

        match self.job.convert_bytes(source, &bytes, self.processor) {
            Ok(out) => {
                self.detector.record(source, hash);
                logger::status_success(&format!("converted: {name} -> {}", out.display()));
            }
            Err(e) => logger::status_error(&format!("failed: {name}"), &format!("{e:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{DataChange, ModifyKind};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn modified(path: PathBuf) -> notify::Event {
        notify::Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path)
    }

    fn setup() -> (TempDir, Job, PathBuf) {
        let dir = TempDir::new().unwrap();
        let notes = dir.path().join("notes");
        fs::create_dir(&notes).unwrap();
        fs::write(notes.join("a.md"), "# A\n").unwrap();
        let out = dir.path().join("out");
        let job = Job::new(&notes, &out, false).unwrap();
        (dir, job, out)
    }

    #[test]
    fn test_changed_source_is_reconverted() {
        let (_dir, job, out) = setup();
        let processor = Processor::default();
        let report = job.convert_all(&processor);
        let mut rebuilder = Rebuilder::new(&job, &processor, &report);

        let source = job.base.join("a.md");
        fs::write(&source, "# Changed\n").unwrap();
        rebuilder.handle(&modified(source));

        let html = fs::read_to_string(out.join("a.html")).unwrap();
        assert!(html.contains("<h1 id=\"changed\">Changed</h1>"));
    }

    #[test]
    fn test_identical_content_is_skipped() {
        let (_dir, job, out) = setup();
        let processor = Processor::default();
        let report = job.convert_all(&processor);
        let mut rebuilder = Rebuilder::new(&job, &processor, &report);

        fs::remove_file(out.join("a.html")).unwrap();
        rebuilder.handle(&modified(job.base.join("a.md")));
        assert!(!out.join("a.html").exists());
    }

    #[test]
    fn test_config_change_reconverts_directory() {
        let (_dir, job, out) = setup();
        let processor = Processor::default();
        let report = job.convert_all(&processor);
        let mut rebuilder = Rebuilder::new(&job, &processor, &report);

        let config = job.base.join(SIBLING_CONFIG);
        fs::write(&config, "title: Retitled\n").unwrap();
        rebuilder.handle(&modified(config));

        let html = fs::read_to_string(out.join("a.html")).unwrap();
        assert!(html.contains("<title>Retitled</title>"));
    }

    #[test]
    fn test_new_file_is_converted_and_html_ignored() {
        let (_dir, job, out) = setup();
        let processor = Processor::default();
        let mut rebuilder = Rebuilder::new(&job, &processor, &Report::default());

        let fresh = job.base.join("new.md");
        fs::write(&fresh, "new").unwrap();
        rebuilder.handle(&modified(fresh));
        rebuilder.handle(&modified(job.base.join("page.html")));

        assert!(out.join("new.html").is_file());
        assert!(!out.join("page.html").exists());
    }
}
