//! Integration tests for the CLI application
//!
//! These tests verify that the CLI commands work correctly with real data files.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

/// Helper to create test data files
struct TestDataFiles {
    pub train_file: NamedTempFile,
    pub test_file: NamedTempFile,
    pub points_file: NamedTempFile,
    pub queries_file: NamedTempFile,
}

impl TestDataFiles {
    fn new() -> std::io::Result<Self> {
        let mut train_file = NamedTempFile::new()?;
        writeln!(train_file, "+1 1:2.0 2:1.0")?;
        writeln!(train_file, "-1 1:-2.0 2:-1.0")?;
        writeln!(train_file, "+1 1:1.5 2:0.8")?;
        writeln!(train_file, "-1 1:-1.5 2:-0.8")?;
        writeln!(train_file, "+1 1:1.8 2:0.9")?;
        writeln!(train_file, "-1 1:-1.8 2:-0.9")?;
        train_file.flush()?;

        let mut test_file = NamedTempFile::new()?;
        writeln!(test_file, "+1 1:1.6 2:0.7")?;
        writeln!(test_file, "-1 1:-1.6 2:-0.7")?;
        test_file.flush()?;

        // Points 0..19 on a line; labels are ignored by the search commands
        let mut points_file = NamedTempFile::new()?;
        for i in 0..20 {
            if i == 0 {
                writeln!(points_file, "0")?;
            } else {
                writeln!(points_file, "0 1:{i}")?;
            }
        }
        points_file.flush()?;

        let mut queries_file = NamedTempFile::new()?;
        writeln!(queries_file, "0 1:10.2")?;
        queries_file.flush()?;

        Ok(TestDataFiles {
            train_file,
            test_file,
            points_file,
            queries_file,
        })
    }
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kernelspace"))
        .args(args)
        .output()
        .expect("Failed to run CLI")
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// `(query, neighbor)` pairs from search output
fn parse_hits(stdout: &[u8]) -> Vec<(usize, usize)> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| {
            let mut parts = l.split_whitespace();
            let q = parts.next().unwrap().parse().unwrap();
            let n = parts.next().unwrap().parse().unwrap();
            (q, n)
        })
        .collect()
}

fn train_model(data: &TestDataFiles, dir: &TempDir, extra: &[&str]) -> std::path::PathBuf {
    let model_path = dir.path().join("model.json");
    let mut args = vec![
        "train",
        "--data",
        data.train_file.path().to_str().unwrap(),
        "--output",
        model_path.to_str().unwrap(),
    ];
    args.extend_from_slice(extra);
    let output = run(&args);
    assert_success(&output, "Train command");
    assert!(model_path.exists(), "Model file was not created");
    model_path
}

#[test]
fn test_cli_train_each_learner() {
    let data = TestDataFiles::new().expect("Failed to create test data");
    for learner in ["perceptron", "projectron", "projectron++", "scw"] {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let model_path = train_model(&data, &dir, &["--learner", learner, "--epochs", "2"]);

        let content = std::fs::read_to_string(&model_path).unwrap();
        assert!(content.contains("\"learner\""));
        assert!(content.contains("\"created_at\""));
    }
}

#[test]
fn test_cli_train_with_budget() {
    let data = TestDataFiles::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(
        &data,
        &dir,
        &[
            "--kernel",
            "rbf",
            "--gamma",
            "0.5",
            "--budget-strategy",
            "merge-rbf",
            "--max-budget",
            "2",
        ],
    );

    let content = std::fs::read_to_string(&model_path).unwrap();
    assert!(content.contains("merge-rbf"));
}

#[test]
fn test_cli_merge_budget_requires_rbf() {
    let data = TestDataFiles::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = dir.path().join("model.json");

    let output = run(&[
        "train",
        "--data",
        data.train_file.path().to_str().unwrap(),
        "--output",
        model_path.to_str().unwrap(),
        "--kernel",
        "linear",
        "--budget-strategy",
        "merge-rbf",
    ]);
    assert!(!output.status.success());
    assert!(!model_path.exists());
}

#[test]
fn test_cli_info_command() {
    let data = TestDataFiles::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&data, &dir, &["--learner", "projectron"]);

    let output = run(&["info", model_path.to_str().unwrap()]);
    assert_success(&output, "Info command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Model Summary"));
    assert!(stdout.contains("projectron"));
    assert!(stdout.contains("Support Vectors"));
}

#[test]
fn test_cli_predict_command() {
    let data = TestDataFiles::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&data, &dir, &["--kernel", "linear", "--epochs", "3"]);
    let predictions_path = dir.path().join("predictions.txt");

    let output = run(&[
        "predict",
        "--model",
        model_path.to_str().unwrap(),
        "--data",
        data.test_file.path().to_str().unwrap(),
        "--output",
        predictions_path.to_str().unwrap(),
        "--confidence",
    ]);
    assert_success(&output, "Predict command");

    let content = std::fs::read_to_string(&predictions_path).unwrap();
    let lines: Vec<&str> = content.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("0 1 "));
    assert!(lines[1].starts_with("1 -1 "));
}

#[test]
fn test_cli_predict_stdout() {
    let data = TestDataFiles::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&data, &dir, &["--learner", "scw"]);

    let output = run(&[
        "predict",
        "--model",
        model_path.to_str().unwrap(),
        "--data",
        data.test_file.path().to_str().unwrap(),
    ]);
    assert_success(&output, "Predict command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Predictions for 2 samples"));
    assert!(stdout.contains("0 1"));
    assert!(stdout.contains("1 -1"));
}

#[test]
fn test_cli_evaluate_detailed() {
    let data = TestDataFiles::new().expect("Failed to create test data");
    let dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&data, &dir, &["--kernel", "linear"]);

    let output = run(&[
        "evaluate",
        "--model",
        model_path.to_str().unwrap(),
        "--data",
        data.test_file.path().to_str().unwrap(),
        "--detailed",
    ]);
    assert_success(&output, "Evaluate command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Accuracy: 100.00%"));
    assert!(stdout.contains("F1 Score"));
}

#[test]
fn test_cli_knn_tree_and_brute_force_agree() {
    let data = TestDataFiles::new().expect("Failed to create test data");
    let base = [
        "knn",
        "--data",
        data.points_file.path().to_str().unwrap(),
        "--queries",
        data.queries_file.path().to_str().unwrap(),
        "-k",
        "3",
        "--seed",
        "5",
    ];

    let tree = run(&base);
    assert_success(&tree, "Knn command");
    let mut brute_args = base.to_vec();
    brute_args.push("--brute-force");
    let brute = run(&brute_args);
    assert_success(&brute, "Knn brute force command");

    assert_eq!(parse_hits(&tree.stdout), vec![(0, 10), (0, 11), (0, 9)]);
    assert_eq!(parse_hits(&tree.stdout), parse_hits(&brute.stdout));
}

#[test]
fn test_cli_range_command() {
    let data = TestDataFiles::new().expect("Failed to create test data");
    let output = run(&[
        "range",
        "--data",
        data.points_file.path().to_str().unwrap(),
        "--queries",
        data.queries_file.path().to_str().unwrap(),
        "--radius",
        "1.5",
        "--metric",
        "manhattan",
        "--parallel",
    ]);
    assert_success(&output, "Range command");
    assert_eq!(parse_hits(&output.stdout), vec![(0, 10), (0, 11), (0, 9)]);
}

#[test]
fn test_cli_rejects_non_metric_and_bad_radius() {
    let data = TestDataFiles::new().expect("Failed to create test data");
    let points = data.points_file.path().to_str().unwrap();
    let queries = data.queries_file.path().to_str().unwrap();

    let output = run(&[
        "knn", "--data", points, "--queries", queries, "--metric", "squared-euclidean",
    ]);
    assert!(!output.status.success());

    let output = run(&[
        "range", "--data", points, "--queries", queries, "--radius", "0",
    ]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_error_handling_invalid_file() {
    let output = run(&[
        "train",
        "--data",
        "/non/existent/file.libsvm",
        "--output",
        "/tmp/never-written.json",
    ]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_verbose_and_debug_flags() {
    let data = TestDataFiles::new().expect("Failed to create test data");
    for flag in ["--verbose", "--debug"] {
        let dir = TempDir::new().expect("Failed to create temp dir");
        train_model(&data, &dir, &[flag]);
    }
}

#[test]
fn test_cli_help_output() {
    let output = run(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["train", "predict", "evaluate", "info", "knn", "range"] {
        assert!(stdout.contains(command), "help is missing {command}");
    }
}

#[test]
fn test_cli_version_output() {
    let output = run(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}
