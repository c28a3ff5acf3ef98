use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use survey_maps::{MapErrors, Table};

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod map_data;

use crate::dashboard::config_reader::*;
use crate::dashboard::map_data::*;

#[derive(Debug, Snafu)]
pub enum DashboardError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the dashboard data"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the responses"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} is too short: column {column} is missing"))]
    LineTooShort { lineno: usize, column: usize },
    #[snafu(display("Error opening the Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {worksheet} not found in {path}"))]
    MissingWorksheet { path: String, worksheet: String },
    #[snafu(display("The file {path} has no header"))]
    EmptyInput { path: String },
    #[snafu(display("Column {column} not found in the header of {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Line {lineno}: invalid value {content:?} for variable {variable}"))]
    InvalidCell {
        lineno: usize,
        variable: String,
        content: String,
    },
    #[snafu(display("Line {lineno}: cannot read cell {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Variable {variable}: {source}"))]
    Map { source: MapErrors, variable: String },
    #[snafu(display("Line {lineno}: {source}"))]
    Record { source: MapErrors, lineno: usize },
    #[snafu(display("Invalid boundaries in {path}: {reason}"))]
    InvalidBoundaries { path: String, reason: String },
    #[snafu(display("Unsupported dataset {name}"))]
    UnsupportedDataset { name: String },
    #[snafu(display("Cannot find the directory of {path}"))]
    MissingParentDir { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashResult<T> = Result<T, DashboardError>;

fn resolve_path(root: &Path, file: &str) -> String {
    let p: PathBuf = [root, Path::new(file)].iter().collect();
    p.as_path().display().to_string()
}

fn read_responses(root: &Path, config: &DashboardConfig) -> DashResult<Table> {
    let path = resolve_path(root, &config.responses_file);
    info!("Attempting to read responses file {:?}", path);
    let variables = config.data_variables()?;
    let responses_type = config.responses_type.clone().unwrap_or_else(|| {
        if path.ends_with(".xlsx") {
            "xlsx".to_string()
        } else {
            "csv".to_string()
        }
    });
    let table = match responses_type.as_str() {
        "csv" => io_csv::read_csv_responses(
            &path,
            &config.group_key,
            &variables,
            &config.missing_labels,
        )?,
        "xlsx" => io_excel::read_excel_responses(
            &path,
            config.excel_worksheet_name.as_deref(),
            &config.group_key,
            &variables,
            &config.missing_labels,
        )?,
        x => whatever!("Unsupported responses type {:?}", x),
    };
    info!(
        "read_responses: {} records, {} groups",
        table.num_records(),
        table.groups().len()
    );
    Ok(table)
}

/// Assembles the document read by the dashboard.
pub fn build_dashboard_data(
    config: &DashboardConfig,
    table: &Table,
    boundaries: &JSValue,
) -> DashResult<JSValue> {
    let language = Language::from_name(&config.language)?;

    let mut groups: Vec<String> = Vec::new();
    let mut group_to_plot_type: JSMap<String, JSValue> = JSMap::new();
    let mut map_data: JSMap<String, JSValue> = JSMap::new();

    let mut tooltips: JSMap<String, JSValue> = JSMap::new();
    for (key, translation) in language.tooltips() {
        tooltips.insert(key.to_string(), json!(translation));
    }
    map_data.insert("tooltips".to_string(), JSValue::Object(tooltips));

    for group in config.groups.iter() {
        let plot_type = group.plot_type()?;
        if group.is_background() {
            debug!("build_dashboard_data: skipping background group {:?}", group.name);
            continue;
        }
        groups.push(group.name.clone());
        group_to_plot_type.insert(group.name.clone(), json!(plot_type.name()));

        let map_variables: Vec<MapVariable> = config
            .variables_of_group(&group.name)
            .iter()
            .filter(|vd| vd.name != config.group_key)
            .map(|vd| MapVariable {
                name: vd.name.clone(),
                nice_name: vd.nice_name(),
                label: vd.label(),
            })
            .collect();
        debug!(
            "build_dashboard_data: group {:?} has variables {:?}",
            group.name, map_variables
        );
        let (geojson, types) = prepare_map_data(table, &map_variables, boundaries)?;
        map_data.insert(
            group.name.clone(),
            json!({"geojson": geojson, "types": types}),
        );
    }

    let background_variables: Vec<String> = config
        .variables_of_group(BACKGROUND_GROUPS[0])
        .iter()
        .filter(|vd| vd.name != config.group_key)
        .map(|vd| vd.nice_name())
        .collect();

    Ok(json!({
        "language": language.name(),
        "groups": groups,
        "groupToPlotType": group_to_plot_type,
        "backgroundVariables": background_variables,
        "mapData": map_data,
    }))
}

fn write_output(location: &str, contents: &str) -> DashResult<()> {
    if location == "stdout" {
        println!("{}", contents);
        return Ok(());
    }
    info!("Writing dashboard data to {:?}", location);
    fs::write(location, contents).context(WritingFileSnafu { path: location })
}

pub fn run_dashboard(
    config_path: String,
    out: Option<String>,
    reference: Option<String>,
) -> DashResult<()> {
    let config = read_config(&config_path)?;
    info!("config: {:?}", config.dataset_name);

    let config_p = Path::new(config_path.as_str());
    let root_p = config_p.parent().context(MissingParentDirSnafu {
        path: config_path.clone(),
    })?;

    let dataset = Dataset::from_name(&config.dataset_name)?;
    let table = read_responses(root_p, &config)?;
    let boundaries = read_boundaries(&resolve_path(root_p, &config.boundaries_file), dataset)?;

    let result_js = build_dashboard_data(&config, &table, &boundaries)?;
    let pretty_js = serde_json::to_string_pretty(&result_js).context(WritingJsonSnafu {})?;

    // The command line takes precedence over the configuration.
    let out_location = match (out, config.output_file.clone()) {
        (Some(o), _) if !o.is_empty() => Some(o),
        (_, Some(f)) if !f.is_empty() => Some(resolve_path(root_p, &f)),
        _ => None,
    };
    // Without a reference to check, the data always goes somewhere.
    match out_location {
        Some(loc) => write_output(&loc, &pretty_js)?,
        None if reference.is_none() => write_output("stdout", &pretty_js)?,
        None => {}
    }

    // The reference data, if provided for comparison
    if let Some(reference_p) = reference {
        let contents =
            fs::read_to_string(&reference_p).context(OpeningFileSnafu { path: &reference_p })?;
        let reference_js: JSValue =
            serde_json::from_str(&contents).context(ParsingJsonSnafu { path: &reference_p })?;
        let pretty_js_ref =
            serde_json::to_string_pretty(&reference_js).context(WritingJsonSnafu {})?;
        if pretty_js_ref != pretty_js {
            warn!("Found differences with the reference data");
            print_diff(pretty_js_ref.as_str(), pretty_js.as_ref(), "\n");
            whatever!("Difference detected between computed data and reference data")
        }
        info!("The dashboard data matches the reference {:?}", reference_p);
    }

    Ok(())
}

/// Runs the dashboard stored under tests/<name>/ and compares it with the
/// expected output next to it.
pub fn test_wrapper(test_name: &str) -> DashResult<()> {
    let test_dir = option_env!("SURVEYMAPS_TEST_DIR")
        .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests"));
    info!("Running test {}", test_name);
    let res = run_dashboard(
        format!("{}/{}/config.json", test_dir, test_name),
        None,
        Some(format!("{}/{}/expected.json", test_dir, test_name)),
    );
    if let Err(e) = &res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
    }
    res
}
