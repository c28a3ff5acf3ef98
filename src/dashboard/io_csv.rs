// Reading the survey responses from CSV files.

use survey_maps::{Table, Variable};

use crate::dashboard::{
    io_common::{add_row, locate_columns, new_builder, simplify_file_name},
    *,
};

/// Reads a CSV file with a header line.
///
/// The group key and every variable must have a column in the header. The
/// other columns are ignored.
pub fn read_csv_responses(
    path: &str,
    group_key: &str,
    variables: &[(Variable, String)],
    missing_labels: &[String],
) -> DashResult<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: simplify_file_name(path),
        })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_responses: header: {:?}", header);
    ensure!(
        !header.is_empty(),
        EmptyInputSnafu {
            path: simplify_file_name(path)
        }
    );

    let (group_idx, var_idxs) = locate_columns(path, &header, group_key, variables)?;
    let mut builder = new_builder(group_key, variables)?;

    for (idx, line_r) in rdr.records().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        debug!("read_csv_responses: lineno: {:?} row: {:?}", lineno, cells);
        add_row(
            &mut builder,
            lineno,
            &cells,
            group_idx,
            variables,
            &var_idxs,
            missing_labels,
        )?;
    }
    Ok(builder.build())
}
