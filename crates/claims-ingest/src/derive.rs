//! Derived claims columns.

use claims_model::{Column, ColumnData, ColumnKind, Dataset, fields};

use crate::error::Result;

/// Add `Margin = TotalPremium - TotalClaims` and `HasClaim = TotalClaims > 0`.
///
/// Margin is missing when either operand is missing; HasClaim is missing when
/// TotalClaims is. Columns already present are recomputed.
pub fn add_derived_columns(dataset: &mut Dataset) -> Result<()> {
    let premium = dataset.column_of_kind(fields::TOTAL_PREMIUM, ColumnKind::Numeric)?;
    let claims = dataset.column_of_kind(fields::TOTAL_CLAIMS, ColumnKind::Numeric)?;
    let (ColumnData::Numeric(premium), ColumnData::Numeric(claims)) = (premium.data(), claims.data())
    else {
        return Ok(());
    };

    let margin: Vec<Option<f64>> = premium
        .iter()
        .zip(claims)
        .map(|(p, c)| Some((*p)? - (*c)?))
        .collect();
    let has_claim: Vec<Option<bool>> = claims.iter().map(|c| c.map(|v| v > 0.0)).collect();

    dataset.upsert_column(Column::numeric(fields::MARGIN, margin))?;
    dataset.upsert_column(Column::boolean(fields::HAS_CLAIM, has_claim))?;
    Ok(())
}
