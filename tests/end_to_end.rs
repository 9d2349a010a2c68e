//! Train on a synthetic ECG table, then score new rows with the saved artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use ecg::{PredictError, PredictionPaths, TrainingConfig, fit_dataset, run_prediction, run_training};
use ecg_io::{
    ArtifactStore, ENCODER_FILE, EVALUATION_FILE, LabeledDatasetReader, MODEL_FILE, SCALER_FILE,
};
use ecg_prep::train_test_split;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

const FEATURES: [&str; 4] = ["Heart_Rate", "RR_Mean", "QRS_Duration", "ST_Level"];

fn synthetic_row(rng: &mut ChaCha8Rng, abnormal: bool) -> [f64; 4] {
    if abnormal {
        [
            rng.gen_range(110.0..150.0),
            rng.gen_range(0.40..0.55),
            rng.gen_range(0.12..0.18),
            rng.gen_range(0.15..0.40),
        ]
    } else {
        [
            rng.gen_range(60.0..85.0),
            rng.gen_range(0.70..1.00),
            rng.gen_range(0.07..0.10),
            rng.gen_range(-0.05..0.05),
        ]
    }
}

/// 80 Normal rows followed by 20 Abnormal rows.
fn write_training_csv(dir: &Path) -> PathBuf {
    let path = dir.join("unequal_ecg_dataset.csv");
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut writer = csv::Writer::from_path(&path).unwrap();

    let mut header: Vec<&str> = FEATURES.to_vec();
    header.push("Label");
    writer.write_record(&header).unwrap();

    for i in 0..100 {
        let abnormal = i >= 80;
        let mut record: Vec<String> = synthetic_row(&mut rng, abnormal)
            .iter()
            .map(|v| v.to_string())
            .collect();
        record.push(if abnormal { "Abnormal" } else { "Normal" }.to_string());
        writer.write_record(&record).unwrap();
    }
    writer.flush().unwrap();
    path
}

/// Three rows with an extra id column and the feature columns reordered.
fn write_prediction_csv(dir: &Path) -> PathBuf {
    let path = dir.join("new_ecg_data_matched.csv");
    fs::write(
        &path,
        "Patient,ST_Level,QRS_Duration,RR_Mean,Heart_Rate\n\
         p1,0.01,0.08,0.85,70\n\
         p2,0.30,0.16,0.45,135\n\
         p3,-0.02,0.09,0.90,66\n",
    )
    .unwrap();
    path
}

fn train(dir: &Path) -> PathBuf {
    let data = write_training_csv(dir);
    let models = dir.join("models");
    let config = TrainingConfig::new(&data, &models).with_n_trees(40);
    run_training(&config, &mut std::io::sink()).unwrap();
    models
}

#[test]
fn training_writes_artifacts_and_evaluation() {
    let dir = TempDir::new().unwrap();
    let data = write_training_csv(dir.path());
    let models = dir.path().join("models");
    let config = TrainingConfig::new(&data, &models).with_n_trees(40);

    let mut out = Vec::new();
    let outcome = run_training(&config, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Dataset shape: (100, 5)"));
    assert!(text.contains("Model training completed"));
    assert!(text.contains("Model, scaler, and encoder saved in:"));
    for name in [MODEL_FILE, SCALER_FILE, ENCODER_FILE] {
        assert!(models.join(name).is_file(), "{name} missing");
    }

    let accuracy = outcome.model.evaluation.accuracy();
    assert!((0.0..=1.0).contains(&accuracy));
    assert_eq!(outcome.model.evaluation.n_test, 20);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(models.join(EVALUATION_FILE)).unwrap()).unwrap();
    assert_eq!(json["seed"], 42);
    assert_eq!(json["class_names"], serde_json::json!(["Abnormal", "Normal"]));
    assert_eq!(json["confusion_matrix"].as_array().unwrap().len(), 2);

    let bundle = ArtifactStore::new(&models).load_bundle().unwrap();
    assert_eq!(bundle.encoder.classes(), ["Abnormal", "Normal"]);
    assert_eq!(bundle.required_columns(), FEATURES);
}

#[test]
fn prediction_appends_columns_and_keeps_rows() {
    let dir = TempDir::new().unwrap();
    let models = train(dir.path());
    let input = write_prediction_csv(dir.path());
    let output = dir.path().join("data").join("prediction_results.csv");

    let paths = PredictionPaths {
        models_dir: models,
        input: input.clone(),
        output: output.clone(),
    };
    let mut out = Vec::new();
    let run = run_prediction(&paths, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("First 5 predictions:"));
    assert!(text.trim_end().ends_with("Done!"));

    assert_eq!(run.predictions.len(), 3);
    assert_eq!(run.predictions[0].label, "Normal");
    assert_eq!(run.predictions[1].label, "Abnormal");

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        [
            "Patient",
            "ST_Level",
            "QRS_Duration",
            "RR_Mean",
            "Heart_Rate",
            "Prediction",
            "Confidence"
        ]
    );

    let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), 3);
    let original = fs::read_to_string(&input).unwrap();
    for (record, line) in records.iter().zip(original.lines().skip(1)) {
        let cells: Vec<&str> = line.split(',').collect();
        assert_eq!(&record.iter().take(5).collect::<Vec<_>>(), &cells);
        assert!(["Normal", "Abnormal"].contains(&&record[5]));
        let confidence: f64 = record[6].parse().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
    }
}

#[test]
fn missing_feature_column_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let models = train(dir.path());
    let input = dir.path().join("partial.csv");
    fs::write(&input, "Heart_Rate,RR_Mean\n70,0.85\n").unwrap();
    let output = dir.path().join("out.csv");

    let paths = PredictionPaths {
        models_dir: models,
        input,
        output: output.clone(),
    };
    let err = run_prediction(&paths, &mut std::io::sink()).unwrap_err();
    match err {
        PredictError::MissingColumns { missing, .. } => {
            assert_eq!(missing, ["QRS_Duration", "ST_Level"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.exists());
}

#[test]
fn prediction_without_training_suggests_training() {
    let dir = TempDir::new().unwrap();
    let paths = PredictionPaths {
        models_dir: dir.path().join("models"),
        input: write_prediction_csv(dir.path()),
        output: dir.path().join("out.csv"),
    };
    let err = run_prediction(&paths, &mut std::io::sink()).unwrap_err();
    assert!(matches!(err, PredictError::MissingArtifact { .. }));
    assert_eq!(err.hint(), Some("run `ecg train` first"));
}

#[test]
fn scaler_ignores_held_out_rows() {
    let dir = TempDir::new().unwrap();
    let data = write_training_csv(dir.path());
    let config = TrainingConfig::new(&data, dir.path().join("models")).with_n_trees(5);

    let dataset = LabeledDatasetReader::new(&data).read().unwrap();
    let baseline = fit_dataset(&dataset, &config).unwrap();

    // the split depends only on labels and seed, so perturbing test rows
    // leaves the training partition untouched
    let codes: Vec<usize> = dataset
        .labels
        .iter()
        .map(|l| usize::from(l == "Normal"))
        .collect();
    let split = train_test_split(&codes, 0.2, config.seed()).unwrap();
    let mut perturbed = dataset.clone();
    for &i in &split.test {
        for v in &mut perturbed.features[i] {
            *v *= 1000.0;
        }
    }
    let refit = fit_dataset(&perturbed, &config).unwrap();

    assert_eq!(baseline.bundle.scaler.means(), refit.bundle.scaler.means());
    assert_eq!(baseline.bundle.scaler.scales(), refit.bundle.scaler.scales());
    assert_eq!(baseline.bundle.scaler.n_samples_seen(), 80);
}

#[test]
fn same_seed_gives_same_artifacts() {
    let dir = TempDir::new().unwrap();
    let data = write_training_csv(dir.path());
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    for models in [&a, &b] {
        let config = TrainingConfig::new(&data, models).with_n_trees(10);
        run_training(&config, &mut std::io::sink()).unwrap();
    }
    for name in [MODEL_FILE, SCALER_FILE, ENCODER_FILE] {
        assert_eq!(fs::read(a.join(name)).unwrap(), fs::read(b.join(name)).unwrap());
    }
}

const REFERENCE_COLUMNS: [&str; 5] =
    ["Heart_Rate", "RR_Mean", "QRS_Duration", "P_Amplitude", "T_Amplitude"];

/// 80 Normal / 20 Abnormal rows over the five reference ECG columns.
fn write_reference_csv(dir: &Path) -> PathBuf {
    let path = dir.join("reference.csv");
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut writer = csv::Writer::from_path(&path).unwrap();
    let mut header: Vec<&str> = REFERENCE_COLUMNS.to_vec();
    header.push("Label");
    writer.write_record(&header).unwrap();

    for i in 0..100 {
        let abnormal = i >= 80;
        let row: [f64; 5] = if abnormal {
            [
                rng.gen_range(110.0..150.0),
                rng.gen_range(0.40..0.55),
                rng.gen_range(0.12..0.18),
                rng.gen_range(0.02..0.08),
                rng.gen_range(-0.30..-0.05),
            ]
        } else {
            [
                rng.gen_range(60.0..85.0),
                rng.gen_range(0.70..1.00),
                rng.gen_range(0.07..0.10),
                rng.gen_range(0.10..0.25),
                rng.gen_range(0.20..0.50),
            ]
        };
        let mut record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        record.push(if abnormal { "Abnormal" } else { "Normal" }.to_string());
        writer.write_record(&record).unwrap();
    }
    writer.flush().unwrap();
    path
}

#[test]
fn reference_columns_train_and_predict() {
    let dir = TempDir::new().unwrap();
    let data = write_reference_csv(dir.path());
    let models = dir.path().join("models");
    let config = TrainingConfig::new(&data, &models).with_n_trees(40);
    let outcome = run_training(&config, &mut std::io::sink()).unwrap();
    assert!((0.0..=1.0).contains(&outcome.model.evaluation.accuracy()));
    assert_eq!(outcome.model.bundle.required_columns(), REFERENCE_COLUMNS);

    let input = dir.path().join("new_ecg_data_matched.csv");
    fs::write(
        &input,
        "Heart_Rate,RR_Mean,QRS_Duration,P_Amplitude,T_Amplitude\n\
         72,0.83,0.08,0.18,0.35\n\
         140,0.43,0.15,0.05,-0.2\n\
         65,0.92,0.09,0.15,0.4\n",
    )
    .unwrap();
    let output = dir.path().join("prediction_results.csv");
    let paths = PredictionPaths {
        models_dir: models.clone(),
        input,
        output: output.clone(),
    };
    let run = run_prediction(&paths, &mut std::io::sink()).unwrap();
    let labels: Vec<&str> = run.predictions.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, ["Normal", "Abnormal", "Normal"]);
    assert_eq!(csv::Reader::from_path(&output).unwrap().records().count(), 3);

    let partial = dir.path().join("partial.csv");
    fs::write(
        &partial,
        "Heart_Rate,RR_Mean,QRS_Duration,P_Amplitude\n72,0.83,0.08,0.18\n",
    )
    .unwrap();
    let rejected = dir.path().join("rejected.csv");
    let paths = PredictionPaths {
        models_dir: models,
        input: partial,
        output: rejected.clone(),
    };
    let err = run_prediction(&paths, &mut std::io::sink()).unwrap_err();
    let message = err.to_string();
    match err {
        PredictError::MissingColumns { required, missing } => {
            assert_eq!(required, REFERENCE_COLUMNS);
            assert_eq!(missing, ["T_Amplitude"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(message.contains(
        r#"["Heart_Rate", "RR_Mean", "QRS_Duration", "P_Amplitude", "T_Amplitude"]"#
    ));
    assert!(!rejected.exists());
}
