use clap::Parser;

/// This program builds the map data of the survey dashboard.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the dashboard: the responses file, the boundaries of the regions,
    /// the data dictionary and the groups of variables. Relative paths in this file are resolved against
    /// the directory of the file.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference file containing the expected dashboard data in JSON format. If provided,
    /// surveymaps will check that the computed output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the dashboard data will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified in the --config file.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
