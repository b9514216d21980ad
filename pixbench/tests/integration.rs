//! Integration tests for PixBench
//!
//! These tests verify the end-to-end behavior of the benchmark: discovery,
//! dispatch across every backend, failure isolation and the TSV report.

use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, ImageFormat as Codec, Rgb, RgbImage};
use pixbench::{
    BackendRegistry, BenchRun, BenchmarkConfig, COLUMNS, CancellationFlag, ConfigError,
    FailureKind,
    OrchestratorError, PixConfig, TrackingAllocator, is_tracking, parse_tsv, run_benchmark,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

/// Input, output and report directories for one benchmark
struct Workspace {
    input: TempDir,
    output: TempDir,
    reports: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            input: tempfile::tempdir().unwrap(),
            output: tempfile::tempdir().unwrap(),
            reports: tempfile::tempdir().unwrap(),
        }
    }

    fn config(&self, sizes: &[u32]) -> BenchmarkConfig {
        let mut pix = PixConfig::default();
        pix.paths.input = self.input.path().to_path_buf();
        pix.paths.output = self.output.path().to_path_buf();
        pix.paths.reports = self.reports.path().to_path_buf();
        pix.encode.sizes = sizes.to_vec();
        pix.runner.jobs = Some(3);
        pix.runner.progress = false;
        BenchmarkConfig::from_config(&pix).unwrap()
    }

    fn run(&self, sizes: &[u32]) -> BenchRun {
        run_benchmark(self.config(sizes), CancellationFlag::new()).unwrap()
    }
}

fn photo(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    }))
}

fn write_fixture(dir: &Path, name: &str, width: u32, height: u32) {
    let img = photo(width, height);
    let path = dir.join(name);
    let ext = name.rsplit('.').next().unwrap().to_ascii_lowercase();
    match ext.as_str() {
        "webp" => {
            let rgb = img.to_rgb8();
            let mut buf = Vec::new();
            WebPEncoder::new_lossless(&mut buf)
                .write_image(rgb.as_raw(), width, height, ColorType::Rgb8)
                .unwrap();
            fs::write(path, buf).unwrap();
        }
        "jpg" | "jpeg" => img.save_with_format(path, Codec::Jpeg).unwrap(),
        "png" => img.save_with_format(path, Codec::Png).unwrap(),
        "bmp" => img.save_with_format(path, Codec::Bmp).unwrap(),
        other => panic!("no fixture writer for {}", other),
    }
}

fn write_corpus(dir: &Path) {
    write_fixture(dir, "landscape.jpg", 320, 180);
    write_fixture(dir, "portrait.png", 120, 240);
    write_fixture(dir, "square.bmp", 200, 200);
    write_fixture(dir, "tiny.webp", 40, 30);
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// A corrupt file loses only its own runs
#[test]
fn test_poison_file_is_isolated() {
    let ws = Workspace::new();
    write_corpus(ws.input.path());
    fs::write(ws.input.path().join("poison.jpg"), b"definitely not a jpeg").unwrap();

    let bench = ws.run(&[100]);
    let set = &bench.outcome.run_set;

    let backends = BackendRegistry::builtin().len();
    assert_eq!(set.runs.len(), 4 * backends);
    assert!(set.runs.iter().all(|r| r.file_name != "poison.jpg"));

    assert_eq!(set.skipped.len(), backends);
    for skip in &set.skipped {
        assert_eq!(skip.file_name, "poison.jpg");
        assert_eq!(skip.kind, FailureKind::Codec);
    }

    // Every good image was benchmarked by every backend
    let good: BTreeSet<_> = set.runs.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(
        good.into_iter().collect::<Vec<_>>(),
        vec!["landscape.jpg", "portrait.png", "square.bmp", "tiny.webp"]
    );
}

/// Each input is only benchmarked in its own format
#[test]
fn test_format_fidelity() {
    let ws = Workspace::new();
    write_corpus(ws.input.path());
    write_fixture(ws.input.path(), "upper.JPEG", 64, 64);

    let bench = ws.run(&[64]);
    for run in &bench.outcome.run_set.runs {
        let ext = run.file_name.rsplit('.').next().unwrap().to_ascii_lowercase();
        assert_eq!(run.format, ext, "{}", run.file_name);

        let stem = run.file_name.rsplit_once('.').unwrap().0;
        let output = ws
            .output
            .path()
            .join(format!("{}_{}_{}.{}", stem, run.backend, run.target_size, ext));
        let bytes = fs::read(&output).unwrap();
        assert_eq!(bytes.len() as u64, run.output_size);

        let expected = match ext.as_str() {
            "jpg" | "jpeg" => Codec::Jpeg,
            "png" => Codec::Png,
            "bmp" => Codec::Bmp,
            _ => Codec::WebP,
        };
        assert_eq!(image::guess_format(&bytes).unwrap(), expected);
    }
}

/// Outputs fit the bound, keep the aspect ratio and are never upscaled
#[test]
fn test_outputs_fit_target_size() {
    let ws = Workspace::new();
    write_corpus(ws.input.path());

    let bench = ws.run(&[50, 150]);
    let set = &bench.outcome.run_set;
    assert!(set.skipped.is_empty(), "{:?}", set.skipped);

    for run in &set.runs {
        let stem = run.file_name.rsplit_once('.').unwrap().0;
        let path = ws.output.path().join(format!(
            "{}_{}_{}.{}",
            stem, run.backend, run.target_size, run.format
        ));
        let img = image::open(&path).unwrap();
        let (w, h) = (img.width(), img.height());
        assert!(w.max(h) <= run.target_size, "{} is {}x{}", path.display(), w, h);

        if run.file_name == "tiny.webp" {
            assert_eq!((w, h), (40, 30));
        }
        if run.file_name == "landscape.jpg" && run.target_size == 150 {
            assert_eq!((w, h), (150, 84));
        }
    }
}

/// At most one record per (file, backend, size), and reruns cover the same keys
#[test]
fn test_no_duplicates_and_idempotent_keys() {
    let first = Workspace::new();
    let second = Workspace::new();
    write_corpus(first.input.path());
    write_corpus(second.input.path());

    let a = first.run(&[32, 96]);
    let b = second.run(&[32, 96]);

    let keys = |bench: &BenchRun| -> BTreeSet<(String, String, u32)> {
        bench
            .outcome
            .run_set
            .runs
            .iter()
            .map(|r| (r.file_name.clone(), r.backend.clone(), r.target_size))
            .collect()
    };
    assert_eq!(keys(&a).len(), a.outcome.run_set.runs.len());
    assert_eq!(keys(&a), keys(&b));

    let formats = |bench: &BenchRun| -> BTreeSet<(String, String, String)> {
        bench
            .outcome
            .run_set
            .runs
            .iter()
            .map(|r| (r.file_name.clone(), r.backend.clone(), r.format.clone()))
            .collect()
    };
    assert_eq!(formats(&a), formats(&b));
}

/// Compressed images never become inputs of a later run
#[test]
fn test_outputs_are_not_rediscovered() {
    let ws = Workspace::new();
    write_fixture(ws.input.path(), "a.png", 40, 30);

    let mut pix = PixConfig::default();
    pix.paths.input = ws.input.path().to_path_buf();
    pix.paths.output = ws.input.path().to_path_buf();
    pix.paths.reports = ws.reports.path().to_path_buf();
    pix.encode.sizes = vec![20];
    pix.runner.progress = false;
    assert!(matches!(
        BenchmarkConfig::from_config(&pix),
        Err(ConfigError::OutputIsInput(_))
    ));

    // A subdirectory of the input is fine: discovery does not recurse
    pix.paths.output = ws.input.path().join("compressed");
    let run = || {
        let config = BenchmarkConfig::from_config(&pix).unwrap();
        run_benchmark(config, CancellationFlag::new()).unwrap()
    };
    let formats = |bench: &BenchRun| -> BTreeSet<(String, String, String)> {
        bench
            .outcome
            .run_set
            .runs
            .iter()
            .map(|r| (r.file_name.clone(), r.backend.clone(), r.format.clone()))
            .collect()
    };

    let first = run();
    let second = run();
    assert_eq!(first.outcome.run_set.runs.len(), 3);
    assert_eq!(second.outcome.run_set.runs.len(), 3);
    assert_eq!(formats(&first), formats(&second));
}

/// The TSV report parses back to one row per successful run
#[test]
fn test_report_round_trip() {
    let ws = Workspace::new();
    write_corpus(ws.input.path());
    fs::write(ws.input.path().join("broken.png"), b"nope").unwrap();

    let bench = ws.run(&[80]);
    let name = bench.report_path.file_name().unwrap().to_string_lossy();
    assert!(name.starts_with("compression_report_"));
    assert!(name.ends_with(".tsv"));

    let text = fs::read_to_string(&bench.report_path).unwrap();
    assert_eq!(text.lines().next().unwrap(), COLUMNS.join("\t"));

    let rows = parse_tsv(&text).unwrap();
    assert_eq!(rows.len(), bench.outcome.run_set.runs.len());
    assert!(rows.iter().all(|r| r.file_name != "broken.png"));

    // Sorted by file, then backend
    let order: Vec<_> = rows
        .iter()
        .map(|r| (r.file_name.clone(), r.backend.clone()))
        .collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);

    for (row, run) in rows.iter().zip(bench.outcome.run_set.sorted()) {
        assert_eq!(row.elapsed_ms, run.elapsed_ms);
        assert!((row.input_kb - run.input_size as f64 / 1024.0).abs() < 0.01);
    }
}

/// Neither compressed images nor the report leave partial files behind
#[test]
fn test_no_partial_files_remain() {
    let ws = Workspace::new();
    write_corpus(ws.input.path());
    fs::write(ws.input.path().join("broken.bmp"), b"BM").unwrap();

    ws.run(&[64]);
    ws.run(&[64]);

    for dir in [ws.output.path(), ws.reports.path()] {
        for name in files_in(dir) {
            assert!(!name.ends_with(".partial"), "{}", name);
        }
    }
    // Two reports, neither overwritten
    assert_eq!(files_in(ws.reports.path()).len(), 2);
    // 4 images × 3 backends; broken.bmp wrote nothing
    assert_eq!(files_in(ws.output.path()).len(), 12);
}

/// Cancelling before dispatch records every unit as cancelled
#[test]
fn test_cancellation_before_dispatch() {
    let ws = Workspace::new();
    write_corpus(ws.input.path());

    let cancel = CancellationFlag::new();
    cancel.cancel();
    let bench = run_benchmark(ws.config(&[32, 64]), cancel).unwrap();
    let set = &bench.outcome.run_set;

    assert!(set.cancelled);
    assert!(set.runs.is_empty());
    assert_eq!(set.skipped.len(), 4 * 3 * 2);
    assert!(set.skipped.iter().all(|s| s.kind == FailureKind::Cancelled));
    assert!(files_in(ws.output.path()).is_empty());

    let text = fs::read_to_string(&bench.report_path).unwrap();
    assert!(parse_tsv(&text).unwrap().is_empty());
}

/// An empty directory is not an error and still yields a header-only report
#[test]
fn test_empty_corpus() {
    let ws = Workspace::new();
    fs::write(ws.input.path().join("readme.txt"), b"not an image").unwrap();

    let bench = ws.run(&[64]);
    assert!(bench.outcome.run_set.is_empty());
    assert_eq!(bench.outcome.inputs, 0);

    let text = fs::read_to_string(&bench.report_path).unwrap();
    assert_eq!(text, format!("{}\n", COLUMNS.join("\t")));
}

/// A missing input directory is the one fatal error
#[test]
fn test_missing_input_directory_is_fatal() {
    let ws = Workspace::new();
    let mut config = ws.config(&[64]);
    config.input_dir = ws.input.path().join("does-not-exist");

    let err = run_benchmark(config, CancellationFlag::new()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<OrchestratorError>(),
        Some(OrchestratorError::Discovery(_))
    ));
    assert!(files_in(ws.reports.path()).is_empty());
}

/// With the tracking allocator installed, runs are measured
#[test]
fn test_runs_are_measured() {
    let ws = Workspace::new();
    write_fixture(ws.input.path(), "big.png", 600, 400);

    let bench = ws.run(&[300]);
    assert!(is_tracking());
    assert_eq!(bench.outcome.run_set.runs.len(), 3);
    for run in &bench.outcome.run_set.runs {
        assert!(run.output_size > 0);
        assert_eq!(run.input_size, fs::metadata(ws.input.path().join("big.png")).unwrap().len());
    }
}
