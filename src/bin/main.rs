//! kernelspace Command Line Interface
//!
//! Train and apply online kernel classifiers on LibSVM data, and run
//! nearest-neighbor queries against a vantage-point tree.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info, warn};
use kernelspace::core::{KernelSpaceError, OnlineLearner, Result, Sample};
use kernelspace::kernel::{KernelSpec, RBFKernel};
use kernelspace::kernel_point::{BudgetConfig, BudgetStrategy};
use kernelspace::learner::{BudgetKernelPerceptron, Covariance, Projectron, Scw, ScwMode};
use kernelspace::metric::{
    ChebyshevDistance, DistanceMetric, EuclideanDistance, KernelDistance, ManhattanDistance,
    SquaredEuclideanDistance,
};
use kernelspace::persistence::SerializableModel;
use kernelspace::vptree::{VPTree, VantageSelection};
use kernelspace::{BruteForceCollection, Dataset, LibSVMDataset, Neighbor, VectorCollection};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "kernelspace")]
#[command(about = "Online kernel learning and vantage-point tree search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and save it
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Evaluate a model on test data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
    /// k-nearest-neighbor queries
    Knn(KnnArgs),
    /// Range queries
    Range(RangeArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CliLearner {
    Perceptron,
    Projectron,
    #[value(name = "projectron++")]
    ProjectronPlusPlus,
    Scw,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    Linear,
    Rbf,
    Polynomial,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliBudgetStrategy {
    Projection,
    #[value(name = "merge-rbf")]
    MergeRbf,
    Stop,
    Random,
}

impl From<CliBudgetStrategy> for BudgetStrategy {
    fn from(cli_strategy: CliBudgetStrategy) -> Self {
        match cli_strategy {
            CliBudgetStrategy::Projection => BudgetStrategy::Projection,
            CliBudgetStrategy::MergeRbf => BudgetStrategy::MergeRbf,
            CliBudgetStrategy::Stop => BudgetStrategy::Stop,
            CliBudgetStrategy::Random => BudgetStrategy::Random,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliScwMode {
    #[value(name = "1")]
    I,
    #[value(name = "2")]
    II,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliCovariance {
    Full,
    Diagonal,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliMetric {
    Euclidean,
    Manhattan,
    Chebyshev,
    /// Not a metric; rejected by the tree
    #[value(name = "squared-euclidean")]
    SquaredEuclidean,
    /// Feature-space distance of an RBF kernel
    Rbf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliSelection {
    Random,
    Sampling,
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (LibSVM format)
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Learning algorithm
    #[arg(short, long, value_enum, default_value = "perceptron")]
    learner: CliLearner,

    /// Kernel for the kernel learners
    #[arg(short, long, value_enum, default_value = "rbf")]
    kernel: CliKernel,

    /// Kernel gamma (defaults to 1 / number of features)
    #[arg(short, long)]
    gamma: Option<f64>,

    /// Polynomial degree
    #[arg(long, default_value = "3")]
    degree: u32,

    /// Polynomial independent term
    #[arg(long, default_value = "1.0")]
    coef0: f64,

    /// Budget maintenance strategy (perceptron)
    #[arg(long, value_enum, default_value = "projection")]
    budget_strategy: CliBudgetStrategy,

    /// Projection error tolerance (perceptron)
    #[arg(long, default_value = "0.001")]
    tolerance: f64,

    /// Maximum number of support vectors (perceptron)
    #[arg(long)]
    max_budget: Option<usize>,

    /// Projection threshold (projectron)
    #[arg(long, default_value = "0.1")]
    eta: f64,

    /// Aggressiveness C (scw)
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Confidence level in (0.5, 1) (scw)
    #[arg(long, default_value = "0.9")]
    confidence: f64,

    /// SCW variant
    #[arg(long, value_enum, default_value = "1")]
    scw_mode: CliScwMode,

    /// SCW covariance shape
    #[arg(long, value_enum, default_value = "full")]
    covariance: CliCovariance,

    /// Passes over the training data
    #[arg(short, long, default_value = "1")]
    epochs: usize,

    /// Seed for random budget eviction
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show confidence scores
    #[arg(long)]
    confidence: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Test data file
    #[arg(long)]
    data: PathBuf,

    /// Show detailed metrics
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

#[derive(Args)]
struct SearchArgs {
    /// Points to index (LibSVM format, labels ignored)
    #[arg(long)]
    data: PathBuf,

    /// Query points (LibSVM format, labels ignored)
    #[arg(short, long)]
    queries: PathBuf,

    /// Distance metric
    #[arg(long, value_enum, default_value = "euclidean")]
    metric: CliMetric,

    /// Gamma of the RBF kernel distance
    #[arg(short, long, default_value = "1.0")]
    gamma: f64,

    /// Maximum points per leaf
    #[arg(long, default_value = "5")]
    leaf_size: usize,

    /// Vantage point selection
    #[arg(long, value_enum, default_value = "sampling")]
    selection: CliSelection,

    /// Seed for vantage point selection
    #[arg(long)]
    seed: Option<u64>,

    /// Build the tree on a worker pool
    #[arg(long)]
    parallel: bool,

    /// Scan every point instead of building a tree
    #[arg(long)]
    brute_force: bool,
}

#[derive(Args)]
struct KnnArgs {
    #[command(flatten)]
    search: SearchArgs,

    /// Number of neighbors
    #[arg(short, long, default_value = "5")]
    k: usize,
}

#[derive(Args)]
struct RangeArgs {
    #[command(flatten)]
    search: SearchArgs,

    /// Search radius
    #[arg(short, long)]
    radius: f64,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
        Commands::Knn(args) => knn_command(args),
        Commands::Range(args) => range_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn kernel_spec(args: &TrainArgs, dim: usize) -> KernelSpec {
    let gamma = args.gamma.unwrap_or(1.0 / dim.max(1) as f64);
    match args.kernel {
        CliKernel::Linear => KernelSpec::Linear,
        CliKernel::Rbf => KernelSpec::Rbf { gamma },
        CliKernel::Polynomial => KernelSpec::Polynomial {
            degree: args.degree,
            gamma,
            coef0: args.coef0,
        },
    }
}

fn fit<L: OnlineLearner>(model: &mut L, samples: &[Sample], epochs: usize) -> Result<()> {
    for epoch in 0..epochs {
        model.train(samples)?;
        info!(
            "Epoch {}: training accuracy {:.2}%, {} support vectors",
            epoch + 1,
            model.accuracy(samples) * 100.0,
            model.n_support_vectors()
        );
    }
    Ok(())
}

fn train_command(args: TrainArgs) -> Result<()> {
    info!("Training {:?} model on {:?}", args.learner, args.data);

    let dataset = LibSVMDataset::from_file(&args.data)?;
    info!(
        "Loaded {} samples with {} dimensions",
        dataset.len(),
        dataset.dim()
    );
    if dataset.classes().len() > 2 {
        warn!("More than two labels found; positive labels are treated as +1, the rest as -1");
    }

    let samples = dataset.binary_samples();
    let n = samples.len();
    let epochs = args.epochs.max(1);

    let saved = match args.learner {
        CliLearner::Perceptron => {
            let kernel = kernel_spec(&args, dataset.dim());
            kernel.validate()?;
            let mut config = BudgetConfig::default()
                .with_strategy(args.budget_strategy.into())
                .with_error_tolerance(args.tolerance);
            if let Some(max_budget) = args.max_budget {
                config = config.with_max_budget(max_budget);
            }
            let mut model = BudgetKernelPerceptron::new(kernel, config)?;
            if let Some(seed) = args.seed {
                model = model.with_seed(seed);
            }
            fit(&mut model, &samples, epochs)?;
            info!("Mistakes during training: {}", model.n_mistakes());
            SerializableModel::from_perceptron(&model, n, epochs)
        }
        CliLearner::Projectron | CliLearner::ProjectronPlusPlus => {
            let kernel = kernel_spec(&args, dataset.dim());
            kernel.validate()?;
            let mut model = Projectron::new(kernel, args.eta)?
                .with_margin_updates(args.learner == CliLearner::ProjectronPlusPlus);
            fit(&mut model, &samples, epochs)?;
            info!("Mistakes during training: {}", model.n_mistakes());
            SerializableModel::from_projectron(&model, n, epochs)
        }
        CliLearner::Scw => {
            let mode = match args.scw_mode {
                CliScwMode::I => ScwMode::I,
                CliScwMode::II => ScwMode::II,
            };
            let covariance = match args.covariance {
                CliCovariance::Full => Covariance::Full,
                CliCovariance::Diagonal => Covariance::Diagonal,
            };
            let mut model = Scw::builder(dataset.dim())
                .with_c(args.c)
                .with_eta(args.confidence)
                .with_mode(mode)
                .with_covariance(covariance)
                .build()?;
            fit(&mut model, &samples, epochs)?;
            SerializableModel::from_scw(&model, n, epochs)
        }
    };

    let metrics = saved.evaluate(&samples);
    saved.save_to_file(&args.output)?;
    info!("Model saved to: {:?}", args.output);
    println!(
        "Trained {} on {} samples: {} support vectors, training accuracy {:.2}%",
        saved.learner.name(),
        n,
        saved.metadata.n_support_vectors,
        metrics.accuracy() * 100.0
    );

    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = SerializableModel::load_from_file(&args.model)?;

    info!("Loading prediction data from: {:?}", args.data);
    let dataset = LibSVMDataset::from_file(&args.data)?;
    let predictions: Vec<_> = dataset
        .samples()
        .iter()
        .map(|s| model.predict(&s.features))
        .collect();

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    writeln!(writer, "# Predictions for {} samples", predictions.len())?;
    writeln!(
        writer,
        "# Format: sample_index predicted_label{}",
        if args.confidence { " confidence" } else { "" }
    )?;
    for (i, pred) in predictions.iter().enumerate() {
        if args.confidence {
            writeln!(writer, "{} {:.0} {:.6}", i, pred.label, pred.confidence())?;
        } else {
            writeln!(writer, "{} {:.0}", i, pred.label)?;
        }
    }
    writer.flush()?;

    if let Some(path) = &args.output {
        info!("Predictions saved to: {path:?}");
    }
    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = SerializableModel::load_from_file(&args.model)?;

    info!("Loading test data from: {:?}", args.data);
    let dataset = LibSVMDataset::from_file(&args.data)?;
    let metrics = model.evaluate(&dataset.binary_samples());

    println!("=== Model Evaluation ===");
    model.print_summary();

    println!("\nTest Results:");
    println!("  Accuracy: {:.2}%", metrics.accuracy() * 100.0);

    if args.detailed {
        println!("\nDetailed Metrics:");
        println!("  True Positives:  {}", metrics.true_positives);
        println!("  True Negatives:  {}", metrics.true_negatives);
        println!("  False Positives: {}", metrics.false_positives);
        println!("  False Negatives: {}", metrics.false_negatives);
        println!("  Precision:       {:.4}", metrics.precision());
        println!("  Recall:          {:.4}", metrics.recall());
        println!("  F1 Score:        {:.4}", metrics.f1_score());
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = SerializableModel::load_from_file(&args.model)?;

    model.print_summary();

    if !model.support_vectors.is_empty() {
        println!("\nSupport Vector Details:");
        println!("  Total: {}", model.support_vectors.len());
        let first_sv = &model.support_vectors[0];
        println!("  First SV non-zeros: {}", first_sv.nnz());
        println!(
            "  First SV indices: {:?}",
            &first_sv.indices[..first_sv.indices.len().min(5)]
        );

        println!("\nCoefficients:");
        let n_show = model.coefficients.len().min(10);
        for (i, alpha) in model.coefficients.iter().enumerate().take(n_show) {
            println!("  α{i}: {alpha:.6}");
        }
        if model.coefficients.len() > n_show {
            println!("  ... ({} more)", model.coefficients.len() - n_show);
        }
    } else if !model.weights.is_empty() {
        println!("\nWeights:");
        let n_show = model.weights.len().min(10);
        for (j, w) in model.weights.iter().enumerate().take(n_show) {
            println!("  w{j}: {w:.6}");
        }
        if model.weights.len() > n_show {
            println!("  ... ({} more)", model.weights.len() - n_show);
        }
    }

    Ok(())
}

/// What to ask each collection
#[derive(Clone, Copy)]
enum Query {
    Knn(usize),
    Range(f64),
}

fn knn_command(args: KnnArgs) -> Result<()> {
    run_search(&args.search, Query::Knn(args.k))
}

fn range_command(args: RangeArgs) -> Result<()> {
    run_search(&args.search, Query::Range(args.radius))
}

fn run_search(args: &SearchArgs, query: Query) -> Result<()> {
    match args.metric {
        CliMetric::Euclidean => search_with(args, query, EuclideanDistance),
        CliMetric::Manhattan => search_with(args, query, ManhattanDistance),
        CliMetric::Chebyshev => search_with(args, query, ChebyshevDistance),
        CliMetric::SquaredEuclidean => search_with(args, query, SquaredEuclideanDistance),
        CliMetric::Rbf => {
            if args.gamma <= 0.0 || !args.gamma.is_finite() {
                return Err(KernelSpaceError::InvalidParameter(format!(
                    "RBF gamma must be positive, got {}",
                    args.gamma
                )));
            }
            search_with(args, query, KernelDistance::new(RBFKernel::new(args.gamma)))
        }
    }
}

fn search_with<M: DistanceMetric + 'static>(args: &SearchArgs, query: Query, metric: M) -> Result<()> {
    let points = LibSVMDataset::from_file(&args.data)?.features();
    let queries = LibSVMDataset::from_file(&args.queries)?.features();
    info!(
        "Indexing {} points with {} for {} queries",
        points.len(),
        metric.name(),
        queries.len()
    );

    let collection: Box<dyn VectorCollection> = if args.brute_force {
        Box::new(BruteForceCollection::new(points, metric))
    } else {
        let selection = match args.selection {
            CliSelection::Random => VantageSelection::Random,
            CliSelection::Sampling => VantageSelection::Sampling,
        };
        let mut builder = VPTree::builder(metric)
            .with_max_leaf_size(args.leaf_size)
            .with_selection(selection)
            .with_parallel(args.parallel);
        if let Some(seed) = args.seed {
            builder = builder.with_seed(seed);
        }
        let tree = builder.build(points)?;
        info!(
            "Built tree with {} nodes, depth {}",
            tree.node_count(),
            tree.depth()
        );
        Box::new(tree)
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "# Format: query_index neighbor_index distance")?;
    for (q, x) in queries.iter().enumerate() {
        let hits: Vec<Neighbor> = match query {
            Query::Knn(k) => collection.search_knn(x, k),
            Query::Range(radius) => collection.search_range(x, radius)?,
        };
        for hit in hits {
            writeln!(out, "{} {} {:.6}", q, hit.index, hit.distance)?;
        }
    }
    Ok(())
}
