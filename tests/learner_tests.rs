//! End-to-end tests for the online learners and model persistence

use approx::assert_relative_eq;
use kernelspace::kernel::{LinearKernel, RBFKernel};
use kernelspace::learner::{
    BudgetKernelPerceptron, Covariance, EvaluationMetrics, MulticlassKernelPerceptron,
    Projectron, Scw, ScwMode,
};
use kernelspace::persistence::LearnerKind;
use kernelspace::{
    BudgetConfig, BudgetStrategy, KernelSpec, OnlineLearner, Sample, SerializableModel,
    SparseVector,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::NamedTempFile;

/// Two well separated blobs around (2, 2) and (−2, −2)
fn blobs(n: usize, seed: u64) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let label = if i % 2 == 0 { 1.0 } else { -1.0 };
            let x = 2.0 * label + rng.gen_range(-1.0..1.0);
            let y = 2.0 * label + rng.gen_range(-1.0..1.0);
            Sample::new(SparseVector::from_dense(&[x, y]), label)
        })
        .collect()
}

fn clusters(n: usize, seed: u64) -> Vec<Sample> {
    let centers = [(3.0, 0.0), (-3.0, 0.0), (0.0, 3.0)];
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let c = i % 3;
            let (cx, cy) = centers[c];
            let x = cx + rng.gen_range(-0.8..0.8);
            let y = cy + rng.gen_range(-0.8..0.8);
            Sample::new(SparseVector::from_dense(&[x, y]), c as f64)
        })
        .collect()
}

fn train_epochs<L: OnlineLearner>(learner: &mut L, samples: &[Sample], epochs: usize) {
    for _ in 0..epochs {
        learner.train(samples).unwrap();
    }
}

#[test]
fn test_projectron_learns_blobs() {
    let train = blobs(200, 1);
    let test = blobs(100, 2);

    let mut model = Projectron::new(RBFKernel::new(0.5), 0.1).unwrap();
    train_epochs(&mut model, &train, 3);

    assert!(model.accuracy(&test) >= 0.95);
    assert!(model.n_support_vectors() <= model.n_mistakes());
    assert_eq!(model.support_vectors().len(), model.coefficients().len());
}

#[test]
fn test_projectron_plus_plus_learns_blobs() {
    let train = blobs(200, 3);
    let test = blobs(100, 4);

    let mut model = Projectron::plus_plus(RBFKernel::new(0.5), 0.1).unwrap();
    assert!(model.margin_updates());
    train_epochs(&mut model, &train, 3);

    let metrics = EvaluationMetrics::evaluate(&model, &test);
    assert_eq!(metrics.total(), 100);
    assert!(metrics.accuracy() >= 0.95);
}

#[test]
fn test_projectron_linear_kernel_keeps_basis_small() {
    // In two dimensions the linear feature space is spanned by two vectors
    let train = blobs(200, 5);
    let mut model = Projectron::new(LinearKernel, 1e-6).unwrap();
    train_epochs(&mut model, &train, 2);

    assert!(model.n_support_vectors() <= 2);
    assert!(model.accuracy(&train) >= 0.95);
}

#[test]
fn test_scw_variants_learn_blobs() {
    let train = blobs(200, 6);
    let test = blobs(100, 7);

    for mode in [ScwMode::I, ScwMode::II] {
        for covariance in [Covariance::Full, Covariance::Diagonal] {
            let mut model = Scw::builder(2)
                .with_c(1.0)
                .with_eta(0.9)
                .with_mode(mode)
                .with_covariance(covariance)
                .build()
                .unwrap();
            train_epochs(&mut model, &train, 2);

            assert!(
                model.accuracy(&test) >= 0.95,
                "{mode:?} / {covariance:?} accuracy {}",
                model.accuracy(&test)
            );
            assert_eq!(model.n_support_vectors(), 0);
            assert!(model.variance(0) > 0.0);
            assert!(model.variance(0) <= 1.0);
        }
    }
}

#[test]
fn test_perceptron_with_projection_matches_plain_span() {
    let train = blobs(200, 8);
    let config = BudgetConfig::default()
        .with_strategy(BudgetStrategy::Projection)
        .with_error_tolerance(1e-6);
    let mut model = BudgetKernelPerceptron::new(LinearKernel, config).unwrap();
    train_epochs(&mut model, &train, 3);

    assert!(model.n_support_vectors() <= 2);
    assert!(model.accuracy(&train) >= 0.95);
}

#[test]
fn test_perceptron_budget_strategies_respect_budget() {
    let train = blobs(300, 9);
    for strategy in [
        BudgetStrategy::MergeRbf,
        BudgetStrategy::Stop,
        BudgetStrategy::Random,
    ] {
        let config = BudgetConfig::default()
            .with_strategy(strategy)
            .with_max_budget(5);
        let mut model = BudgetKernelPerceptron::new(RBFKernel::new(0.1), config)
            .unwrap()
            .with_seed(11);
        train_epochs(&mut model, &train, 2);

        assert!(
            model.n_support_vectors() <= 5,
            "{strategy:?} kept {} vectors",
            model.n_support_vectors()
        );
        assert!(model.n_mistakes() >= 1);
    }
}

#[test]
fn test_merge_budget_rejects_linear_kernel() {
    let config = BudgetConfig::default()
        .with_strategy(BudgetStrategy::MergeRbf)
        .with_max_budget(5);
    assert!(BudgetKernelPerceptron::new(LinearKernel, config).is_err());
}

#[test]
fn test_multiclass_perceptron_learns_clusters() {
    let train = clusters(300, 12);
    let test = clusters(90, 13);

    let mut model =
        MulticlassKernelPerceptron::new(RBFKernel::new(0.5), vec![0.0, 1.0, 2.0], BudgetConfig::default())
            .unwrap();
    for _ in 0..3 {
        model.train(&train).unwrap();
    }

    assert!(model.accuracy(&test) >= 0.95);
    assert_eq!(model.scores(&test[0].features).len(), 3);
    assert!(model.n_support_vectors() <= model.n_mistakes());
}

#[test]
fn test_projectron_model_round_trip() {
    let train = blobs(100, 14);
    let test = blobs(40, 15);
    let kernel = KernelSpec::Rbf { gamma: 0.5 };

    let mut model = Projectron::plus_plus(kernel.clone(), 0.1).unwrap();
    train_epochs(&mut model, &train, 2);

    let saved = SerializableModel::from_projectron(&model, train.len(), 2);
    let file = NamedTempFile::new().unwrap();
    saved.save_to_file(file.path()).unwrap();
    let loaded = SerializableModel::load_from_file(file.path()).unwrap();

    assert_eq!(loaded.learner, LearnerKind::ProjectronPlusPlus);
    assert_eq!(loaded.kernel, Some(kernel));
    assert_eq!(loaded.metadata.n_support_vectors, model.n_support_vectors());
    assert_eq!(loaded.metadata.n_training_samples, 100);
    assert_eq!(loaded.metadata.training_params.eta, Some(0.1));
    for sample in &test {
        assert_relative_eq!(
            loaded.score(&sample.features),
            model.score(&sample.features),
            epsilon = 1e-12
        );
    }
}

#[test]
fn test_perceptron_and_scw_model_round_trip() {
    let train = blobs(100, 16);
    let test = blobs(40, 17);

    let config = BudgetConfig::default()
        .with_strategy(BudgetStrategy::Stop)
        .with_max_budget(10);
    let mut perceptron =
        BudgetKernelPerceptron::new(KernelSpec::Rbf { gamma: 0.5 }, config.clone()).unwrap();
    train_epochs(&mut perceptron, &train, 1);

    let mut scw = Scw::builder(2)
        .with_covariance(Covariance::Diagonal)
        .with_mode(ScwMode::II)
        .build()
        .unwrap();
    train_epochs(&mut scw, &train, 1);

    let file = NamedTempFile::new().unwrap();

    SerializableModel::from_perceptron(&perceptron, train.len(), 1)
        .save_to_file(file.path())
        .unwrap();
    let loaded = SerializableModel::load_from_file(file.path()).unwrap();
    assert_eq!(loaded.learner, LearnerKind::Perceptron);
    assert_eq!(loaded.metadata.training_params.budget, Some(config));
    for sample in &test {
        assert_eq!(
            loaded.predict(&sample.features).label,
            perceptron.predict(&sample.features).label
        );
    }

    SerializableModel::from_scw(&scw, train.len(), 1)
        .save_to_file(file.path())
        .unwrap();
    let loaded = SerializableModel::load_from_file(file.path()).unwrap();
    assert_eq!(loaded.learner, LearnerKind::Scw);
    assert!(loaded.kernel.is_none());
    assert_eq!(loaded.weights, scw.weights());
    let metrics = loaded.evaluate(&test);
    assert_relative_eq!(metrics.accuracy(), scw.accuracy(&test));
}
