// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use crate::palette::Palette;

/// The kind of a survey variable.
///
/// The kind is declared once with the schema of the variable. It controls both
/// how the per-group aggregate is computed and how it is colored.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum VariableKind {
    /// Categories with a natural order (Likert scales, agreement levels, ...).
    /// Aggregated as the mean of the category codes.
    CategoricalOrdered,
    /// Categories without order. Aggregated as the most common category.
    CategoricalUnordered,
    /// Yes/no answers. Aggregated as the share of `true`.
    Boolean,
    /// Any numeric answer. Aggregated as the mean.
    Numeric,
}

impl VariableKind {
    /// Reads the kind of a variable from the name used in a data dictionary.
    pub fn parse(variable: &str, kind: &str) -> Result<VariableKind, MapErrors> {
        match kind {
            "categorical_ordered" | "categorical-ordered" | "ordered" => {
                Ok(VariableKind::CategoricalOrdered)
            }
            "categorical_unordered" | "categorical-unordered" | "categorical" => {
                Ok(VariableKind::CategoricalUnordered)
            }
            "boolean" | "bool" => Ok(VariableKind::Boolean),
            "numeric" | "float" | "int" => Ok(VariableKind::Numeric),
            x => Err(MapErrors::UnrecognizedKind {
                variable: variable.to_string(),
                kind: x.to_string(),
            }),
        }
    }

    pub fn aggregation_type(&self) -> AggregationType {
        match self {
            VariableKind::CategoricalUnordered => AggregationType::MostCommon,
            VariableKind::Boolean => AggregationType::Share,
            VariableKind::CategoricalOrdered | VariableKind::Numeric => AggregationType::Mean,
        }
    }
}

/// One cell of the record table.
#[derive(PartialEq, Debug, Clone)]
pub enum Value {
    Missing,
    Bool(bool),
    Number(f64),
    /// The label of a category. It must be one of the declared categories.
    Category(String),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

/// The schema of one variable.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    /// Declared categories, in order. Empty for boolean and numeric variables.
    pub categories: Vec<String>,
    /// The monochrome ramp used for binned colors.
    pub hue: Palette,
}

impl Variable {
    pub fn numeric(name: &str) -> Variable {
        Variable {
            name: name.to_string(),
            kind: VariableKind::Numeric,
            categories: Vec::new(),
            hue: Palette::Blue,
        }
    }

    pub fn boolean(name: &str) -> Variable {
        Variable {
            name: name.to_string(),
            kind: VariableKind::Boolean,
            categories: Vec::new(),
            hue: Palette::Blue,
        }
    }

    pub fn ordered(name: &str, categories: &[&str]) -> Variable {
        Variable {
            name: name.to_string(),
            kind: VariableKind::CategoricalOrdered,
            categories: categories.iter().map(|s| s.to_string()).collect(),
            hue: Palette::Blue,
        }
    }

    pub fn unordered(name: &str, categories: &[&str]) -> Variable {
        Variable {
            name: name.to_string(),
            kind: VariableKind::CategoricalUnordered,
            categories: categories.iter().map(|s| s.to_string()).collect(),
            hue: Palette::Blue,
        }
    }

    /// Builds a variable from the parts found in a data dictionary.
    pub fn from_parts(
        name: &str,
        kind: VariableKind,
        categories: &[String],
    ) -> Result<Variable, MapErrors> {
        let categorical = matches!(
            kind,
            VariableKind::CategoricalOrdered | VariableKind::CategoricalUnordered
        );
        if categorical && categories.is_empty() {
            return Err(MapErrors::MissingCategories(name.to_string()));
        }
        Ok(Variable {
            name: name.to_string(),
            kind,
            categories: if categorical {
                categories.to_vec()
            } else {
                Vec::new()
            },
            hue: Palette::Blue,
        })
    }

    /// Changes the ramp used for binned colors. Only monochrome palettes are accepted.
    pub fn with_hue(self, hue: Palette) -> Result<Variable, MapErrors> {
        if !hue.is_monochrome() {
            return Err(MapErrors::ColormapNotMonochrome(hue.name().to_string()));
        }
        Ok(Variable { hue, ..self })
    }

    /// The integer code of a category: its position in the declared list.
    pub fn category_code(&self, label: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == label)
    }

    /// Probability variables are displayed as percentages.
    pub fn is_probability(&self) -> bool {
        self.name.starts_with("p_")
    }
}

// ******** Output data structures *********

/// The summary statistic shown for a variable, as named in the map tooltips.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum AggregationType {
    Share,
    Mean,
    MostCommon,
}

impl AggregationType {
    pub fn label(&self) -> &'static str {
        match self {
            AggregationType::Share => "Share",
            AggregationType::Mean => "Mean",
            AggregationType::MostCommon => "Most Common",
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Aggregate {
    /// Share of `true` values, between 0 and 1.
    Share(f64),
    /// Mean of the values or of the category codes.
    Mean(f64),
    /// Most common category.
    Mode(String),
}

impl Aggregate {
    /// The numeric value used for binning, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Aggregate::Share(x) | Aggregate::Mean(x) => Some(*x),
            Aggregate::Mode(_) => None,
        }
    }
}

/// The aggregate of one variable for one group.
#[derive(PartialEq, Debug, Clone)]
pub struct GroupAggregate {
    pub group: String,
    pub aggregate: Aggregate,
    pub display: String,
    pub color: String,
    /// Number of rows in the group, including the missing values.
    pub nobs: u64,
    /// Number of non-missing values that entered the aggregate.
    pub n_valid: u64,
}

/// Equal-width bins used to color numeric aggregates.
#[derive(PartialEq, Debug, Clone)]
pub struct Bins {
    /// Invariant: strictly increasing, one more element than `colors`.
    pub edges: Vec<f64>,
    pub colors: Vec<String>,
}

impl Bins {
    /// Index of the right-closed interval `(edges[i], edges[i + 1]]` containing the value.
    /// Values outside the edges are clamped into the first or the last bin.
    pub fn locate(&self, value: f64) -> usize {
        let num_bins = self.colors.len();
        let idx = self.edges[1..]
            .iter()
            .position(|upper| value <= *upper)
            .unwrap_or(num_bins.saturating_sub(1));
        idx.min(num_bins.saturating_sub(1))
    }

    pub fn color(&self, value: f64) -> &str {
        self.colors[self.locate(value)].as_str()
    }
}

/// The aggregates and colors of one variable for all the groups.
#[derive(PartialEq, Debug, Clone)]
pub struct VariableResult {
    pub variable: String,
    pub kind: VariableKind,
    pub aggregation_type: AggregationType,
    /// The groups, in the order in which they first appear in the table.
    pub groups: Vec<GroupAggregate>,
    /// Only present for boolean and numeric variables.
    pub bins: Option<Bins>,
}

impl VariableResult {
    pub fn get(&self, group: &str) -> Option<&GroupAggregate> {
        self.groups.iter().find(|ga| ga.group == group)
    }
}

/// Errors that prevent the map data from being computed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MapErrors {
    UnknownPalette(String),
    PaletteSize { palette: String, requested: usize },
    ColormapNotMonochrome(String),
    InvalidColor(String),
    UnrecognizedKind { variable: String, kind: String },
    MissingCategories(String),
    UnknownVariable(String),
    DuplicateVariable(String),
    MissingGroupKey { row: usize },
    InvalidValue { variable: String, value: String },
    EmptyVariable(String),
}

impl Error for MapErrors {}

impl Display for MapErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapErrors::UnknownPalette(name) => write!(f, "palette {} is not implemented", name),
            MapErrors::PaletteSize { palette, requested } => write!(
                f,
                "palette {}: requested {} colors, must be between 1 and 12",
                palette, requested
            ),
            MapErrors::ColormapNotMonochrome(name) => write!(
                f,
                "palette {}: a color map can only be built from a monochrome palette",
                name
            ),
            MapErrors::InvalidColor(hex) => write!(f, "invalid hex color {:?}", hex),
            MapErrors::UnrecognizedKind { variable, kind } => write!(
                f,
                "variable {} has unrecognized kind {:?}",
                variable, kind
            ),
            MapErrors::MissingCategories(variable) => {
                write!(f, "categorical variable {} has no categories", variable)
            }
            MapErrors::UnknownVariable(variable) => write!(f, "unknown variable {}", variable),
            MapErrors::DuplicateVariable(variable) => {
                write!(f, "variable {} is declared twice", variable)
            }
            MapErrors::MissingGroupKey { row } => write!(f, "row {} has no group key", row),
            MapErrors::InvalidValue { variable, value } => {
                write!(f, "variable {}: invalid value {}", variable, value)
            }
            MapErrors::EmptyVariable(variable) => {
                write!(f, "variable {} has no observed value", variable)
            }
        }
    }
}
