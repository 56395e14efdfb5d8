//! Integration test: zip archive ingestion

mod common;

use prices_predictor::data::{DataIngestorFactory, ZipDataIngestor};
use prices_predictor::error::PipelineError;
use std::path::Path;

#[test]
fn test_ingests_single_csv_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archive = common::housing_zip(dir.path());
    let extract_dir = dir.path().join("extracted");

    let df = DataIngestorFactory::for_path(&archive)
        .unwrap()
        .with_extract_dir(&extract_dir)
        .ingest(&archive)
        .unwrap();

    assert_eq!(df.height(), common::N_ROWS);
    assert_eq!(df.width(), 6);
    assert!(extract_dir.join("AmesHousing.csv").exists());
    assert_eq!(df.column("Lot Area").unwrap().null_count(), 4);
    assert_eq!(df.column("Neighborhood").unwrap().null_count(), 1);
}

#[test]
fn test_txt_extension_is_rejected_without_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let extract_dir = dir.path().join("extracted");

    let result = DataIngestorFactory::for_path(Path::new("houses.txt"))
        .map(|ingestor| ingestor.with_extract_dir(&extract_dir));

    assert!(matches!(result, Err(PipelineError::UnsupportedExtension(_))));
    assert!(!extract_dir.exists());
}

#[test]
fn test_archive_without_csv() {
    let dir = tempfile::tempdir().unwrap();
    let archive = common::write_zip(&dir.path().join("notes.zip"), &[("readme.txt", "hello")]);

    let err = ZipDataIngestor::new()
        .with_extract_dir(dir.path().join("out"))
        .ingest(&archive)
        .unwrap_err();
    match err {
        PipelineError::UnsupportedFormat(msg) => assert!(msg.contains("no CSV")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_archive_with_multiple_csvs() {
    let dir = tempfile::tempdir().unwrap();
    let archive = common::write_zip(
        &dir.path().join("many.zip"),
        &[("a.csv", "x\n1\n"), ("b.csv", "y\n2\n")],
    );

    let err = ZipDataIngestor::new()
        .with_extract_dir(dir.path().join("out"))
        .ingest(&archive)
        .unwrap_err();
    match err {
        PipelineError::UnsupportedFormat(msg) => assert!(msg.contains("multiple CSV")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_macos_metadata_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let archive = common::write_zip(
        &dir.path().join("mac.zip"),
        &[("__MACOSX/._data.csv", "junk"), ("data.csv", "x,y\n1,2\n3,4\n")],
    );

    let df = ZipDataIngestor::new()
        .with_extract_dir(dir.path().join("out"))
        .ingest(&archive)
        .unwrap();
    assert_eq!(df.shape(), (2, 2));
}
