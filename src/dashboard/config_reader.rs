use crate::dashboard::*;

use serde::{Deserialize, Serialize};
use survey_maps::palette::Palette;
use survey_maps::{Variable, VariableKind};

/// The groups that describe the respondents. They are not shown on the maps.
pub const BACKGROUND_GROUPS: [&str; 2] = ["Background Overview", "Background Correlation"];

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VariableDescription {
    pub name: String,
    /// The column in the responses file. Defaults to the name.
    pub column: Option<String>,
    #[serde(rename = "niceName")]
    pub nice_name: Option<String>,
    pub label: Option<String>,
    pub kind: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub hue: Option<String>,
    pub group: Option<String>,
}

impl VariableDescription {
    pub fn nice_name(&self) -> String {
        self.nice_name.clone().unwrap_or_else(|| self.name.clone())
    }

    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.nice_name())
    }

    pub fn column(&self) -> String {
        self.column.clone().unwrap_or_else(|| self.name.clone())
    }

    pub fn is_binned(&self) -> bool {
        self.name.ends_with("_binned")
    }

    pub fn to_variable(&self) -> DashResult<Variable> {
        let kind = VariableKind::parse(&self.name, &self.kind).context(MapSnafu {
            variable: self.name.clone(),
        })?;
        let variable =
            Variable::from_parts(&self.name, kind, &self.categories).context(MapSnafu {
                variable: self.name.clone(),
            })?;
        match &self.hue {
            Some(hue) => {
                let palette = Palette::from_name(hue).context(MapSnafu {
                    variable: self.name.clone(),
                })?;
                variable.with_hue(palette).context(MapSnafu {
                    variable: self.name.clone(),
                })
            }
            None => Ok(variable),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GroupDescription {
    pub name: String,
    #[serde(rename = "plotType")]
    pub _plot_type: String,
}

impl GroupDescription {
    pub fn plot_type(&self) -> DashResult<PlotType> {
        PlotType::from_name(&self._plot_type)
    }

    pub fn is_background(&self) -> bool {
        BACKGROUND_GROUPS.contains(&self.name.as_str())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(rename = "datasetName")]
    pub dataset_name: String,
    pub language: String,
    #[serde(rename = "responsesFile")]
    pub responses_file: String,
    /// csv (default) or xlsx
    #[serde(rename = "responsesType")]
    pub responses_type: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "groupKey")]
    pub group_key: String,
    #[serde(rename = "boundariesFile")]
    pub boundaries_file: String,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
    /// Extra cell contents that mark a missing answer.
    #[serde(rename = "missingLabels", default)]
    pub missing_labels: Vec<String>,
    pub variables: Vec<VariableDescription>,
    pub groups: Vec<GroupDescription>,
}

impl DashboardConfig {
    /// The variables that are read from the responses file, with their columns.
    ///
    /// The group key is read separately, and the binned variables reuse the
    /// column of the variable they are derived from.
    pub fn data_variables(&self) -> DashResult<Vec<(Variable, String)>> {
        let mut res: Vec<(Variable, String)> = Vec::new();
        for vd in self.variables.iter() {
            if vd.name == self.group_key || vd.is_binned() {
                continue;
            }
            res.push((vd.to_variable()?, vd.column()));
        }
        Ok(res)
    }

    pub fn variables_of_group(&self, group: &str) -> Vec<&VariableDescription> {
        self.variables
            .iter()
            .filter(|vd| vd.group.as_deref() == Some(group))
            .collect()
    }
}

/// The plots that the dashboard can show for a group of variables.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PlotType {
    StackedBarplot,
    Barplot,
    NoPlot,
    Distplot,
}

impl PlotType {
    pub fn from_name(name: &str) -> DashResult<PlotType> {
        match name {
            "stacked_barplot" => Ok(PlotType::StackedBarplot),
            "barplot" => Ok(PlotType::Barplot),
            "no_plot" => Ok(PlotType::NoPlot),
            "distplot" => Ok(PlotType::Distplot),
            x => whatever!("unknown plot type: {}", x),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlotType::StackedBarplot => "stacked_barplot",
            PlotType::Barplot => "barplot",
            PlotType::NoPlot => "no_plot",
            PlotType::Distplot => "distplot",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Language {
    English,
    German,
}

impl Language {
    pub fn from_name(name: &str) -> DashResult<Language> {
        match name {
            "english" => Ok(Language::English),
            "german" => Ok(Language::German),
            x => whatever!("unsupported language: {}", x),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::German => "german",
        }
    }

    /// The labels used in the tooltips of the maps.
    pub fn tooltips(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            Language::English => vec![
                ("Province", "Province"),
                ("No. Obs", "No. Obs"),
                ("Question", "Question"),
                ("Value", "Value"),
                ("Share", "Share"),
                ("Mean", "Mean"),
                ("Most Common", "Most Common"),
            ],
            Language::German => vec![
                ("Province", "Provinz"),
                ("No. Obs", "Antworten"),
                ("Question", "Frage"),
                ("Value", "Wert"),
                ("Share", "Anteil"),
                ("Mean", "Mittelwert"),
                ("Most Common", "Häufigste Antwort"),
            ],
        }
    }
}

pub fn read_config(path: &str) -> DashResult<DashboardConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: DashboardConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}
