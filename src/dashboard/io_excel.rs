// Reading the survey responses from Excel workbooks.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use survey_maps::{Table, Variable};

use crate::dashboard::{
    io_common::{add_row, locate_columns, new_builder, simplify_file_name},
    *,
};

pub fn read_excel_responses(
    path: &str,
    worksheet_name: Option<&str>,
    group_key: &str,
    variables: &[(Variable, String)],
    missing_labels: &[String],
) -> DashResult<Table> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header_row = iter.next().context(EmptyInputSnafu {
        path: simplify_file_name(path),
    })?;
    let header: Vec<String> = header_row
        .iter()
        .map(|cell| read_cell(1, cell))
        .collect::<DashResult<Vec<String>>>()?;
    debug!("read_excel_responses: header: {:?}", header);

    let (group_idx, var_idxs) = locate_columns(path, &header, group_key, variables)?;
    let mut builder = new_builder(group_key, variables)?;

    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        let cells = row
            .iter()
            .map(|cell| read_cell(lineno, cell))
            .collect::<DashResult<Vec<String>>>()?;
        debug!("read_excel_responses: lineno: {:?} row: {:?}", lineno, cells);
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

/// The content of a cell, as it would appear in a CSV export.
fn read_cell(lineno: usize, cell: &DataType) -> DashResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Bool(b) => Ok(b.to_string()),
        DataType::Empty => Ok("".to_string()),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> DashResult<Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: simplify_file_name(path),
    })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path: simplify_file_name(path),
                worksheet: worksheet_name,
            })?
            .context(OpeningExcelSnafu {
                path: simplify_file_name(path),
            })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyInputSnafu {
                path: simplify_file_name(path),
            }
            .fail(),
            [(worksheet_name, wrange)] => {
                debug!("get_range: using worksheet {:?}", worksheet_name);
                Ok(wrange.clone())
            }
            _ => whatever!(
                "{}: too many worksheets, the worksheet name must be provided",
                simplify_file_name(path)
            ),
        }
    }
}
