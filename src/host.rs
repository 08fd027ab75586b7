//! File-level driver: finds sources, runs the pipeline on each unit in
//! parallel and persists the results.
//!
//! A unit is all or nothing. Any failure, or a cancellation observed before
//! the write, leaves its file untouched.

use crate::config::Options;
use crate::persist::{PersistError, SourceFile, WriteOutcome, WriteSink};
use crate::pipeline::{Mode, Pipeline, PipelineError};
use crate::report::Report;
use crate::safety::{is_forbidden_dir, SafetyError, WorkspaceGuard};
use crate::semantic::SymbolResolver;
use crate::ts::{parse_unit, validate_rewrite, TreeSitterError};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: TreeSitterError,
    },

    #[error("{path}: {source}")]
    Pipeline {
        path: PathBuf,
        #[source]
        source: PipelineError,
    },

    #[error("rewrite of {path} would introduce a syntax error: {source}")]
    SyntaxRegression {
        path: PathBuf,
        #[source]
        source: TreeSitterError,
    },

    #[error("refusing to touch {path}: {source}")]
    Safety {
        path: PathBuf,
        #[source]
        source: SafetyError,
    },

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Rewritten,
    /// Apply mode found changes but the run is a dry run.
    WouldRewrite,
    Unchanged,
    /// Report-only run; see the findings.
    Checked,
    Cancelled,
}

/// What happened to one file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    pub report: Report,
    pub original: String,
    pub rewritten: String,
}

impl FileReport {
    fn cancelled(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            outcome: FileOutcome::Cancelled,
            report: Report::new(),
            original: String::new(),
            rewritten: String::new(),
        }
    }
}

/// Everything one run over a set of files shares.
pub struct HostContext<'r> {
    pipeline: Pipeline<'r>,
    guard: Option<WorkspaceGuard>,
    sink: WriteSink,
    cancel: Arc<AtomicBool>,
    dry_run: bool,
}

impl<'r> HostContext<'r> {
    pub fn new(resolver: &'r dyn SymbolResolver, options: Options) -> Self {
        Self {
            pipeline: Pipeline::new(resolver, options),
            guard: None,
            sink: WriteSink::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            dry_run: false,
        }
    }

    /// Only files inside the guard's workspace are read or written.
    pub fn with_guard(mut self, guard: WorkspaceGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Flag that stops units that have not written yet.
    pub fn cancellation(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Run the pipeline over source text, rejecting rewrites that break the
    /// unit's syntax.
    pub fn process_source(
        &self,
        path: &Path,
        text: &str,
        mode: Mode,
    ) -> Result<(String, Report), HostError> {
        let root = parse_unit(text).map_err(|source| HostError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let outcome = self
            .pipeline
            .run(&root, mode)
            .map_err(|source| HostError::Pipeline {
                path: path.to_path_buf(),
                source,
            })?;

        let rewritten = outcome.root.text();
        if outcome.changed {
            validate_rewrite(text, &rewritten).map_err(|source| HostError::SyntaxRegression {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok((rewritten, outcome.report))
    }

    #[tracing::instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    pub fn process_file(&self, path: &Path, mode: Mode) -> Result<FileReport, HostError> {
        if self.is_cancelled() {
            return Ok(FileReport::cancelled(path));
        }
        let path = match &self.guard {
            Some(guard) => guard.validate_path(path).map_err(|source| HostError::Safety {
                path: path.to_path_buf(),
                source,
            })?,
            None => path.to_path_buf(),
        };

        let file = SourceFile::read(&path)?;
        let (rewritten, report) = self.process_source(&path, &file.text, mode)?;
        let changed = rewritten != file.text;

        let outcome = match mode {
            Mode::ReportOnly => FileOutcome::Checked,
            Mode::Apply if !changed => FileOutcome::Unchanged,
            Mode::Apply if self.dry_run => FileOutcome::WouldRewrite,
            Mode::Apply if self.is_cancelled() => FileOutcome::Cancelled,
            Mode::Apply => {
                if let Some(guard) = &self.guard {
                    guard.revalidate(&path).map_err(|source| HostError::Safety {
                        path: path.clone(),
                        source,
                    })?;
                }
                match self.sink.write(&file, &rewritten)? {
                    WriteOutcome::Written { .. } => FileOutcome::Rewritten,
                    WriteOutcome::Unchanged => FileOutcome::Unchanged,
                }
            }
        };
        tracing::debug!(?outcome, findings = report.len(), "processed file");

        Ok(FileReport {
            path,
            outcome,
            report,
            original: file.text,
            rewritten,
        })
    }

    /// Process every file in parallel. Results come back in input order.
    pub fn process_files(
        &self,
        paths: &[PathBuf],
        mode: Mode,
    ) -> Vec<(PathBuf, Result<FileReport, HostError>)> {
        paths
            .par_iter()
            .map(|path| (path.clone(), self.process_file(path, mode)))
            .collect()
    }
}

/// Expand paths into the `.cs` files they name. Directories are walked,
/// skipping build output and version control; files are taken as given.
pub fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>, HostError> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_file() {
            sources.push(path.clone());
            continue;
        }
        let walker = WalkDir::new(path).follow_links(false).into_iter();
        for entry in walker.filter_entry(|e| {
            e.depth() == 0
                || !(e.file_type().is_dir() && e.file_name().to_str().is_some_and(is_forbidden_dir))
        }) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "cs")
            {
                sources.push(entry.into_path());
            }
        }
    }
    sources.sort();
    sources.dedup();
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSet;
    use crate::semantic::LexicalResolver;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn host(rules: RuleSet) -> HostContext<'static> {
        HostContext::new(&LexicalResolver, Options::with_rules(rules))
    }

    #[test]
    fn collects_cs_files_outside_build_output() {
        let dir = tempfile::tempdir().unwrap();
        for file in ["A.cs", "src/B.cs", "src/readme.md", "obj/Gen.cs", "src/bin/Debug/C.cs"] {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "class X { }").unwrap();
        }

        let sources = collect_sources(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = sources
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("A.cs"), PathBuf::from("src/B.cs")]);
    }

    #[test]
    fn apply_rewrites_and_check_does_not() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("C.cs");
        fs::write(&path, "class C { int count = 0; }").unwrap();

        let checked = host(RuleSet::REMOVE_DEFAULT_INITIALIZERS)
            .process_file(&path, Mode::ReportOnly)
            .unwrap();
        assert_eq!(checked.outcome, FileOutcome::Checked);
        assert_eq!(checked.report.len(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "class C { int count = 0; }");

        let applied = host(RuleSet::REMOVE_DEFAULT_INITIALIZERS)
            .process_file(&path, Mode::Apply)
            .unwrap();
        assert_eq!(applied.outcome, FileOutcome::Rewritten);
        assert_eq!(fs::read_to_string(&path).unwrap(), "class C { int count; }");
    }

    #[test]
    fn dry_run_leaves_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("C.cs");
        fs::write(&path, "class C { int count = 0; }").unwrap();

        let report = host(RuleSet::REMOVE_DEFAULT_INITIALIZERS)
            .with_dry_run(true)
            .process_file(&path, Mode::Apply)
            .unwrap();
        assert_eq!(report.outcome, FileOutcome::WouldRewrite);
        assert_eq!(report.rewritten, "class C { int count; }");
        assert_eq!(fs::read_to_string(&path).unwrap(), "class C { int count = 0; }");
    }

    #[test]
    fn cancelled_units_persist_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("C.cs");
        fs::write(&path, "class C { int count = 0; }").unwrap();

        let host = host(RuleSet::REMOVE_DEFAULT_INITIALIZERS);
        host.cancel();
        let results = host.process_files(&[path.clone()], Mode::Apply);
        assert_eq!(results[0].1.as_ref().unwrap().outcome, FileOutcome::Cancelled);
        assert_eq!(fs::read_to_string(&path).unwrap(), "class C { int count = 0; }");
    }

    #[test]
    fn unparsable_files_fail_alone() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("Good.cs");
        let bad = dir.path().join("Bad.cs");
        fs::write(&good, "class C { int count = 0; }").unwrap();
        fs::write(&bad, "class C { int count = ; }").unwrap();

        let results = host(RuleSet::REMOVE_DEFAULT_INITIALIZERS)
            .process_files(&[bad.clone(), good.clone()], Mode::Apply);
        assert!(matches!(results[0].1, Err(HostError::Parse { .. })));
        assert_eq!(results[1].1.as_ref().unwrap().outcome, FileOutcome::Rewritten);
        assert_eq!(fs::read_to_string(&bad).unwrap(), "class C { int count = ; }");
    }

    #[test]
    fn guard_rejects_files_outside_the_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = dir.path().join("ws");
        fs::create_dir_all(&workspace).unwrap();
        let outside = dir.path().join("Outside.cs");
        fs::write(&outside, "class C { }").unwrap();

        let host = host(RuleSet::defaults()).with_guard(WorkspaceGuard::new(&workspace).unwrap());
        let err = host.process_file(&outside, Mode::Apply).unwrap_err();
        assert!(matches!(err, HostError::Safety { .. }));
    }
}
