//! Tests for directory-level batch comparison.

mod common;

use common::{page, pages, FakeRasterizer};
use pdf_parity::batch::{discover_pdfs, write_artifacts, BatchRunner};
use pdf_parity::report::{ComparisonSummary, REPORT_FILE, SUMMARY_FILE};
use pdf_parity::{CompareConfig, DocumentStatus, Error, Grade};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Reference and candidate trees with placeholder PDF files.
struct Workspace {
    _dir: TempDir,
    reference: PathBuf,
    candidate: PathBuf,
    output: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("reference");
        let candidate = dir.path().join("candidate");
        let output = dir.path().join("comparison");
        fs::create_dir_all(&reference).unwrap();
        fs::create_dir_all(&candidate).unwrap();
        Self {
            _dir: dir,
            reference,
            candidate,
            output,
        }
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"%PDF-1.4\n").unwrap();
    }

    fn add_reference(&self, relative: &str) -> PathBuf {
        Self::touch(&self.reference, relative);
        self.reference.join(relative)
    }

    fn add_pair(&self, relative: &str) -> (PathBuf, PathBuf) {
        Self::touch(&self.reference, relative);
        Self::touch(&self.candidate, relative);
        (self.reference.join(relative), self.candidate.join(relative))
    }

    fn config(&self) -> CompareConfig {
        CompareConfig::new()
            .with_reference_dir(&self.reference)
            .with_candidate_dir(&self.candidate)
            .with_output_dir(&self.output)
    }
}

mod pairing {
    use super::*;

    #[test]
    fn test_missing_candidate_skips_rasterizer() {
        let ws = Workspace::new();
        ws.add_reference("gone.pdf");
        let rasterizer = FakeRasterizer::new();
        let config = ws.config();

        let results = BatchRunner::new(&config, &rasterizer).run().unwrap();

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.status(), DocumentStatus::Missing);
        assert_eq!(result.grade(), Grade::F);
        assert_eq!(result.avg_ssim(), 0.0);
        assert_eq!(result.reference_path(), Path::new("gone.pdf"));
        assert_eq!(rasterizer.calls(), 0);
    }

    #[test]
    fn test_every_reference_yields_one_result() {
        let ws = Workspace::new();
        let (r1, c1) = ws.add_pair("a.pdf");
        let (r2, c2) = ws.add_pair("nested/b.pdf");
        let (r3, c3) = ws.add_pair("nested/deeper/c.pdf");
        ws.add_reference("d.pdf");

        let rasterizer = FakeRasterizer::new()
            .with_document(r1, pages(2, 40, 50))
            .with_document(c1, pages(2, 40, 50))
            .with_document(r2, pages(1, 40, 50))
            .with_failure(c2, "broken xref")
            .with_document(r3, Vec::new())
            .with_document(c3, pages(1, 40, 50));
        let config = ws.config();

        let results = BatchRunner::new(&config, &rasterizer).run().unwrap();

        let statuses: Vec<DocumentStatus> = results.iter().map(|r| r.status()).collect();
        assert_eq!(
            statuses,
            vec![
                DocumentStatus::Compared,
                DocumentStatus::Missing,
                DocumentStatus::Error,
                DocumentStatus::RefEmpty,
            ]
        );
        let references: Vec<&Path> = results.iter().map(|r| r.reference_path()).collect();
        assert_eq!(
            references,
            vec![
                Path::new("a.pdf"),
                Path::new("d.pdf"),
                Path::new("nested/b.pdf"),
                Path::new("nested/deeper/c.pdf"),
            ]
        );
        assert_eq!(results[0].grade(), Grade::A);
        assert!(results[2].error().unwrap().contains("broken xref"));
    }

    #[test]
    fn test_limit_applies_after_sorting() {
        let ws = Workspace::new();
        for name in ["c.pdf", "a.pdf", "b.pdf"] {
            ws.add_reference(name);
        }
        let rasterizer = FakeRasterizer::new();
        let config = ws.config().with_limit(Some(2));

        let results = BatchRunner::new(&config, &rasterizer).run().unwrap();
        let names: Vec<String> = results.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_parallel_run_preserves_order() {
        let ws = Workspace::new();
        let mut rasterizer = FakeRasterizer::new();
        for i in 0..12 {
            let name = format!("doc{:02}.pdf", i);
            let (r, c) = ws.add_pair(&name);
            // Alternate good and bad candidates so results are distinguishable.
            let seed = if i % 2 == 0 { 1 } else { 9 };
            rasterizer = rasterizer
                .with_document(r, vec![page(32, 32, 1)])
                .with_document(c, vec![page(32, 32, seed)]);
        }

        let sequential = BatchRunner::new(&ws.config(), &rasterizer).run().unwrap();
        let config = ws.config().with_jobs(4);
        let seen = Mutex::new(Vec::new());
        let parallel = BatchRunner::new(&config, &rasterizer)
            .run_with_progress(|done, total, _| seen.lock().unwrap().push((done, total)))
            .unwrap();

        assert_eq!(sequential, parallel);
        for (i, result) in parallel.iter().enumerate() {
            assert_eq!(result.name(), format!("doc{:02}", i));
            assert_eq!(result.grade() == Grade::A, i % 2 == 0);
        }

        let mut progress = seen.into_inner().unwrap();
        progress.sort();
        let expected: Vec<(usize, usize)> = (1..=12).map(|n| (n, 12)).collect();
        assert_eq!(progress, expected);
    }
}

mod artifacts {
    use super::*;

    #[test]
    fn test_reports_written() {
        let ws = Workspace::new();
        let (r, c) = ws.add_pair("report.pdf");
        ws.add_reference("absent.pdf");
        let rasterizer = FakeRasterizer::new()
            .with_document(r, pages(2, 40, 40))
            .with_document(c, pages(2, 40, 40));
        let config = ws.config().with_dpi(96);

        let runner = BatchRunner::new(&config, &rasterizer);
        let results = runner.run().unwrap();
        let summary = runner.write_artifacts(results).unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.dpi, 96);
        assert_eq!(summary.grades.a, 1);
        assert_eq!(summary.grades.f, 1);

        let loaded = ComparisonSummary::load(&ws.output.join(SUMMARY_FILE)).unwrap();
        assert_eq!(loaded.results, summary.results);

        let report = fs::read_to_string(ws.output.join(REPORT_FILE)).unwrap();
        assert!(report.contains("| Total documents | 2 |"));
        assert!(report.contains("| absent | F | 0.00 | ?/? |"));
    }

    #[test]
    fn test_write_artifacts_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("deep/out");
        let summary = write_artifacts(&output, Vec::new(), 150).unwrap();
        assert_eq!(summary.total, 0);
        assert!(output.join(SUMMARY_FILE).is_file());
        assert!(output.join(REPORT_FILE).is_file());
    }

    #[test]
    fn test_stale_diffs_removed() {
        let ws = Workspace::new();
        let stale = ws.output.join("diffs/old_page1_diff.png");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"stale").unwrap();

        let (r, c) = ws.add_pair("fresh.pdf");
        let rasterizer = FakeRasterizer::new()
            .with_document(r, vec![page(32, 32, 1)])
            .with_document(c, vec![page(32, 32, 9)]);
        let config = ws.config();

        let results = BatchRunner::new(&config, &rasterizer).run().unwrap();
        assert!(results[0].pages()[0].ssim() < 0.8);
        assert!(!stale.exists());
        assert!(ws.output.join("diffs/fresh_page1_diff.png").is_file());
    }

    #[test]
    fn test_no_diffs_option() {
        let ws = Workspace::new();
        let (r, c) = ws.add_pair("fresh.pdf");
        let rasterizer = FakeRasterizer::new()
            .with_document(r, vec![page(32, 32, 1)])
            .with_document(c, vec![page(32, 32, 9)]);
        let config = ws.config().with_diffs(false);

        let results = BatchRunner::new(&config, &rasterizer).run().unwrap();
        assert_eq!(results[0].status(), DocumentStatus::Compared);
        assert!(!ws.output.join("diffs").exists());
    }
}

mod failures {
    use super::*;

    #[test]
    fn test_missing_reference_dir() {
        let ws = Workspace::new();
        let config = ws.config().with_reference_dir(ws.reference.join("nope"));
        let err = BatchRunner::new(&config, &FakeRasterizer::new())
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::InputDirectory(_)));
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let ws = Workspace::new();
        let config = ws.config().with_jobs(0);
        let err = BatchRunner::new(&config, &FakeRasterizer::new())
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_reference_tree() {
        let ws = Workspace::new();
        assert!(discover_pdfs(&ws.reference).unwrap().is_empty());
        let results = BatchRunner::new(&ws.config(), &FakeRasterizer::new())
            .run()
            .unwrap();
        assert!(results.is_empty());
    }
}
