use std::path::Path;

use survey_maps::builder::Builder;
use survey_maps::{Value, Variable, VariableKind};

use crate::dashboard::*;

/// Cell contents that always mean that the question was not answered.
const MISSING_LABELS: [&str; 5] = ["", "NA", "N/A", "nan", "NaN"];

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Reads the content of a cell as a value of the given variable.
/// Returns None if the content is not valid for this variable.
pub fn parse_cell(variable: &Variable, raw: &str, missing_labels: &[String]) -> Option<Value> {
    let s = raw.trim();
    if MISSING_LABELS.contains(&s) || missing_labels.iter().any(|m| m == s) {
        return Some(Value::Missing);
    }
    match variable.kind {
        VariableKind::Boolean => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "ja" => Some(Value::Bool(true)),
            "false" | "0" | "no" | "n" | "nee" | "nein" => Some(Value::Bool(false)),
            _ => None,
        },
        VariableKind::Numeric => s
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(Value::Number),
        VariableKind::CategoricalOrdered | VariableKind::CategoricalUnordered => variable
            .category_code(s)
            .map(|_| Value::Category(s.to_string())),
    }
}

/// The positions of the group key and of the variables in the header of a file.
pub fn locate_columns(
    path: &str,
    header: &[String],
    group_key: &str,
    variables: &[(Variable, String)],
) -> DashResult<(usize, Vec<usize>)> {
    let position = |column: &str| -> DashResult<usize> {
        header
            .iter()
            .position(|h| h.trim() == column)
            .context(MissingColumnSnafu {
                column,
                path: simplify_file_name(path),
            })
    };
    let group_idx = position(group_key)?;
    let mut var_idxs: Vec<usize> = Vec::new();
    for (_, column) in variables.iter() {
        var_idxs.push(position(column)?);
    }
    debug!(
        "locate_columns: group key at {}, variables at {:?}",
        group_idx, var_idxs
    );
    Ok((group_idx, var_idxs))
}

/// Starts a table with all the variables declared.
pub fn new_builder(group_key: &str, variables: &[(Variable, String)]) -> DashResult<Builder> {
    let mut builder = Builder::new(group_key).context(MapSnafu {
        variable: group_key,
    })?;
    for (variable, _) in variables.iter() {
        builder = builder.variable(variable.clone()).context(MapSnafu {
            variable: variable.name.clone(),
        })?;
    }
    Ok(builder)
}

/// Adds one row of a file to the table.
///
/// lineno: the line in the file, starting at 1 for the header.
#[allow(clippy::too_many_arguments)]
pub fn add_row(
    builder: &mut Builder,
    lineno: usize,
    cells: &[String],
    group_idx: usize,
    variables: &[(Variable, String)],
    var_idxs: &[usize],
    missing_labels: &[String],
) -> DashResult<()> {
    let group = cells.get(group_idx).context(LineTooShortSnafu {
        lineno,
        column: group_idx,
    })?;
    let mut values: Vec<(&str, Value)> = Vec::new();
    for ((variable, _), idx) in variables.iter().zip(var_idxs.iter()) {
        let raw = cells.get(*idx).context(LineTooShortSnafu {
            lineno,
            column: *idx,
        })?;
        let value = parse_cell(variable, raw, missing_labels).context(InvalidCellSnafu {
            lineno,
            variable: variable.name.clone(),
            content: raw.clone(),
        })?;
        values.push((variable.name.as_str(), value));
    }
    builder
        .add_record(group.trim(), &values)
        .context(RecordSnafu { lineno })
}
