//! Conversion of raw text cells into typed columns.

use chrono::{NaiveDate, NaiveDateTime};
use claims_common::{capitalize, is_missing_token, parse_bool, parse_numeric};
use claims_model::{ColumnData, ColumnKind};

/// Parse a date cell.
///
/// Accepted layouts: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` (also with `T`),
/// `MM/YYYY` (first of the month), `YYYY/MM/DD` and `DD/MM/YYYY`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    let parts: Vec<&str> = value.split('/').collect();
    if let [month, year] = parts.as_slice() {
        let month: u32 = month.parse().ok()?;
        let year: i32 = year.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }
    ["%Y/%m/%d", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Outcome of coercing one raw column.
#[derive(Debug)]
pub struct Coerced {
    pub data: ColumnData,
    /// Non-missing cells that failed to parse and became missing.
    pub failures: usize,
}

/// Trim cells and replace missing tokens with `None`.
pub fn clean_cells<'a>(cells: impl IntoIterator<Item = Option<&'a str>>) -> Vec<Option<String>> {
    cells
        .into_iter()
        .map(|cell| {
            cell.map(str::trim)
                .filter(|s| !is_missing_token(s))
                .map(str::to_string)
        })
        .collect()
}

/// Kind for an undeclared column: numeric when every present cell parses as
/// a number, categorical otherwise.
pub fn infer_kind(cells: &[Option<String>]) -> ColumnKind {
    let mut present = cells.iter().flatten().peekable();
    if present.peek().is_none() {
        return ColumnKind::Categorical;
    }
    if present.all(|s| parse_numeric(s).is_some()) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Coerce cleaned cells to `kind`.
pub fn coerce(cells: Vec<Option<String>>, kind: ColumnKind, normalize_case: bool) -> Coerced {
    let mut failures = 0;
    let data = match kind {
        ColumnKind::Numeric => ColumnData::Numeric(parse_cells(cells, &mut failures, parse_numeric)),
        ColumnKind::Date => ColumnData::Date(parse_cells(cells, &mut failures, parse_date)),
        ColumnKind::Boolean => ColumnData::Boolean(parse_cells(cells, &mut failures, parse_bool)),
        ColumnKind::Categorical => ColumnData::Categorical(
            cells
                .into_iter()
                .map(|cell| cell.map(|s| if normalize_case { capitalize(&s) } else { s }))
                .collect(),
        ),
    };
    Coerced { data, failures }
}

fn parse_cells<T>(
    cells: Vec<Option<String>>,
    failures: &mut usize,
    parse: impl Fn(&str) -> Option<T>,
) -> Vec<Option<T>> {
    cells
        .into_iter()
        .map(|cell| {
            let cell = cell?;
            let parsed = parse(&cell);
            if parsed.is_none() {
                *failures += 1;
            }
            parsed
        })
        .collect()
}
