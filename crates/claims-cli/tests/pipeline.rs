//! Integration tests for the shared load step.

use std::fs;

use claims_cli::config::AnalysisConfig;
use claims_cli::pipeline::load;
use tempfile::tempdir;

const EXTRACT: &str = "\
PolicyID|TransactionMonth|Province|PostalCode|Gender|SumInsured|TotalPremium|TotalClaims|Bank
1|2015-03-01 00:00:00|Gauteng|2000|Male|10000|120.5|0|
2|2015-04-01 00:00:00|gauteng|2000|Female|20000|90|500|
3|2015-04-01 00:00:00|Western Cape|8000|Not specified|15000|110|0|
4|2015-05-01 00:00:00|Western Cape|8000|Female||100|250|
";

#[test]
fn loads_fingerprints_and_imputes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claims.txt");
    fs::write(&path, EXTRACT).unwrap();

    let config = AnalysisConfig::from_toml("[load]\ndelimiter = \"|\"").unwrap();
    let loaded = load(&path, &config.load, false, &config.imputation).unwrap();
    assert_eq!(loaded.dataset.height(), 4);
    assert_eq!(loaded.fingerprint.len(), 64);
    assert_eq!(loaded.dropped_columns, vec!["Bank".to_string()]);
    assert!(loaded.imputed.is_empty());
    assert_eq!(
        loaded.dataset.column("Gender").unwrap().data().missing_count(),
        1
    );
    assert!(loaded.dataset.has_column("Margin"));

    let imputed = load(&path, &config.load, true, &config.imputation).unwrap();
    let gender = imputed.dataset.column("Gender").unwrap().data();
    assert_eq!(gender.missing_count(), 0);
    assert_eq!(gender.label(2).as_deref(), Some("Female"));
    let sum = imputed.dataset.column("SumInsured").unwrap().data();
    assert_eq!(sum.numeric_value(3), Some(15000.0));
    assert_eq!(loaded.fingerprint, imputed.fingerprint);
}

#[test]
fn missing_file_is_reported_with_path() {
    let config = AnalysisConfig::default();
    let err = load(
        std::path::Path::new("/nonexistent/claims.csv"),
        &config.load,
        false,
        &config.imputation,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/claims.csv"));
}

#[test]
fn imputed_margin_follows_imputed_inputs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claims.csv");
    fs::write(
        &path,
        "TotalPremium,TotalClaims,Province,PostalCode,Gender\n\
         100,10,Gauteng,2000,Male\n\
         200,20,Gauteng,2000,Female\n\
         300,30,Limpopo,0700,Male\n\
         400,,Limpopo,0700,Female\n",
    )
    .unwrap();

    let config = AnalysisConfig::default();
    let loaded = load(&path, &config.load, true, &config.imputation).unwrap();
    let dataset = &loaded.dataset;
    let premium = dataset.column("TotalPremium").unwrap().data();
    let claims = dataset.column("TotalClaims").unwrap().data();
    let margin = dataset.column("Margin").unwrap().data();
    let has_claim = dataset.column("HasClaim").unwrap().data();
    assert_eq!(claims.numeric_value(3), Some(20.0));
    for row in 0..dataset.height() {
        let expected = premium.numeric_value(row).unwrap() - claims.numeric_value(row).unwrap();
        assert_eq!(margin.numeric_value(row), Some(expected), "row {row}");
    }
    assert_eq!(margin.numeric_value(3), Some(380.0));
    assert_eq!(has_claim.label(3).as_deref(), Some("Yes"));
    assert!(loaded.imputed.iter().all(|c| c.column != "Margin" && c.column != "HasClaim"));
}
