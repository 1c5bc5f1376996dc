//! Integration tests for loading claims extracts.

use std::io::Write;

use claims_ingest::{IngestError, LoadOptions, load_dataset};
use claims_model::{ColumnData, ColumnKind};
use tempfile::NamedTempFile;

fn create_temp_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

const SAMPLE: &str = "\
UnderwrittenCoverID,PolicyID,TransactionMonth,Province,PostalCode,Gender,NewVehicle,SumInsured,TotalPremium,TotalClaims,Bank
145249,12827,2015-03-01 00:00:00,gauteng,1459,Male,Yes,0.01,21.93,0,
145249,12827,2015-05-01 00:00:00,Gauteng,1459,Not specified,No,0.01,21.93,120.5,
145255,12827,7/2015,Western Cape,0122,Female,,5000,0,0,
";

#[test]
fn loads_and_types_columns() {
    let file = create_temp_csv(SAMPLE);
    let loaded = load_dataset(file.path(), &LoadOptions::default()).unwrap();
    let ds = &loaded.dataset;

    assert_eq!(ds.height(), 3);
    assert_eq!(loaded.dropped_columns, vec!["Bank".to_string()]);
    assert!(!ds.has_column("Bank"));

    assert_eq!(ds.column("TotalClaims").unwrap().kind(), ColumnKind::Numeric);
    assert_eq!(ds.column("TransactionMonth").unwrap().kind(), ColumnKind::Date);
    assert_eq!(ds.column("NewVehicle").unwrap().kind(), ColumnKind::Boolean);
    assert_eq!(ds.column("PostalCode").unwrap().kind(), ColumnKind::Categorical);
    assert_eq!(ds.column("Province").unwrap().kind(), ColumnKind::Categorical);

    let postal = ds.column("PostalCode").unwrap().data();
    assert_eq!(postal.label(2).as_deref(), Some("0122"));

    let province = ds.column("Province").unwrap().data();
    assert_eq!(province.label(0).as_deref(), Some("Gauteng"));
    assert_eq!(province.label(1).as_deref(), Some("Gauteng"));

    let gender = ds.column("Gender").unwrap().data();
    assert!(gender.is_missing(1));
}

#[test]
fn derives_margin_and_claim_flag() {
    let file = create_temp_csv(SAMPLE);
    let loaded = load_dataset(file.path(), &LoadOptions::default()).unwrap();
    let ds = &loaded.dataset;

    let margin = ds.column("Margin").unwrap().data();
    assert_eq!(margin.numeric_value(0), Some(21.93));
    assert_eq!(margin.numeric_value(1), Some(21.93 - 120.5));

    assert_eq!(
        ds.column("HasClaim").unwrap().data(),
        &ColumnData::Boolean(vec![Some(false), Some(true), Some(false)])
    );
}

#[test]
fn reports_all_missing_required_columns() {
    let file = create_temp_csv("TotalPremium,Province\n1,Gauteng\n");
    let err = load_dataset(file.path(), &LoadOptions::default()).unwrap_err();
    match err {
        IngestError::MissingColumns { columns, .. } => {
            assert_eq!(columns, vec!["TotalClaims", "PostalCode", "Gender"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn pipe_delimited_without_derivation() {
    let file = create_temp_csv("A|B\n1|x\n2|y\n");
    let options = LoadOptions {
        delimiter: '|',
        required_columns: Vec::new(),
        derive_columns: false,
        ..LoadOptions::default()
    };
    let loaded = load_dataset(file.path(), &options).unwrap();
    assert_eq!(loaded.dataset.column("A").unwrap().kind(), ColumnKind::Numeric);
    assert_eq!(loaded.dataset.column("B").unwrap().kind(), ColumnKind::Categorical);
    assert!(!loaded.dataset.has_column("Margin"));
}

#[test]
fn counts_coercion_failures() {
    let file = create_temp_csv(
        "TotalPremium,TotalClaims,Province,PostalCode,Gender\n10,abc,Gauteng,1,Male\n20,5,Gauteng,2,Female\n",
    );
    let loaded = load_dataset(file.path(), &LoadOptions::default()).unwrap();
    assert_eq!(
        loaded.coercion_failures,
        vec![("TotalClaims".to_string(), 1)]
    );
    assert!(loaded.dataset.column("HasClaim").unwrap().data().is_missing(0));
}

#[test]
fn rejects_required_column_without_values() {
    let file = create_temp_csv(
        "TotalPremium,TotalClaims,Province,PostalCode,Gender,Bank\n10,0,Gauteng,1,,\n20,5,Gauteng,2,,\n",
    );
    let err = load_dataset(file.path(), &LoadOptions::default()).unwrap_err();
    match err {
        IngestError::EmptyRequiredColumns { columns, .. } => {
            assert_eq!(columns, vec!["Gender"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_non_ascii_delimiter() {
    let file = create_temp_csv("A\u{e9}B\n1\u{e9}x\n");
    let options = LoadOptions {
        delimiter: '\u{e9}',
        required_columns: Vec::new(),
        derive_columns: false,
        ..LoadOptions::default()
    };
    let err = load_dataset(file.path(), &options).unwrap_err();
    assert!(matches!(err, IngestError::CsvParse { .. }));
}
