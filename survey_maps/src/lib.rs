mod config;
pub mod builder;
pub mod manual;
pub mod palette;

use log::{debug, info};

pub use crate::builder::{Builder, Table};
pub use crate::config::*;
use crate::palette::{get_colors, Palette, MAX_COLORS};

/// Number of bins used to color boolean and numeric aggregates.
pub const NUM_BINS: usize = MAX_COLORS;

// Added on both sides of the binning range so that the extreme values fall
// inside the first and the last bin.
const BIN_PADDING: f64 = 0.01;

// **** Private structures ****

// All the values of one group for one variable, missing values included.
#[derive(Debug)]
struct GroupValues<'a> {
    group: &'a str,
    values: Vec<&'a Value>,
}

impl<'a> GroupValues<'a> {
    fn nobs(&self) -> u64 {
        self.values.len() as u64
    }
}

// A group with its numeric aggregate, before any color is assigned.
#[derive(Debug)]
struct NumericAggregate<'a> {
    group: &'a str,
    mean: f64,
    nobs: u64,
    n_valid: u64,
}

/// Computes the aggregate of a variable for every group of the table and
/// assigns a color to each of them.
///
/// Arguments:
/// * `table` the survey responses
/// * `variable` the name of the variable. A name ending with `_binned` uses
/// the values of the variable without the suffix.
///
/// Groups in which all the values of the variable are missing do not receive
/// any entry.
pub fn aggregate_and_color(table: &Table, variable: &str) -> Result<VariableResult, MapErrors> {
    let (var, values) = table.resolve(variable)?;
    info!(
        "aggregate_and_color: variable {:?} ({:?}) over {} records, grouped by {:?}",
        var.name,
        var.kind,
        values.len(),
        table.group_key()
    );

    let partition = partition_by_group(table.record_groups(), values);
    debug!("aggregate_and_color: {} groups", partition.len());

    let (groups, bins) = match var.kind {
        VariableKind::CategoricalUnordered => (aggregate_mode(var, &partition)?, None),
        VariableKind::CategoricalOrdered => (aggregate_ordered(var, &partition)?, None),
        VariableKind::Boolean | VariableKind::Numeric => {
            let (groups, bins) = aggregate_binned(var, values, &partition)?;
            (groups, Some(bins))
        }
    };

    Ok(VariableResult {
        variable: var.name.clone(),
        kind: var.kind,
        aggregation_type: var.kind.aggregation_type(),
        groups,
        bins,
    })
}

fn partition_by_group<'a>(record_groups: &'a [String], values: &'a [Value]) -> Vec<GroupValues<'a>> {
    let mut res: Vec<GroupValues<'a>> = Vec::new();
    for (group, value) in record_groups.iter().zip(values.iter()) {
        match res.iter_mut().find(|gv| gv.group == group.as_str()) {
            Some(gv) => gv.values.push(value),
            None => res.push(GroupValues {
                group: group.as_str(),
                values: vec![value],
            }),
        }
    }
    res
}

/// The numeric code of a value: 0/1 for booleans, the position in the
/// declared categories for categories.
fn numeric_code(variable: &Variable, value: &Value) -> Option<f64> {
    match value {
        Value::Missing => None,
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(x) => Some(*x),
        Value::Category(c) => variable.category_code(c).map(|code| code as f64),
    }
}

fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

fn numeric_aggregates<'a>(
    variable: &Variable,
    partition: &[GroupValues<'a>],
) -> Vec<NumericAggregate<'a>> {
    let mut res: Vec<NumericAggregate<'a>> = Vec::new();
    for gv in partition.iter() {
        let codes: Vec<f64> = gv
            .values
            .iter()
            .filter_map(|v| numeric_code(variable, v))
            .collect();
        match mean(&codes) {
            Some(m) => res.push(NumericAggregate {
                group: gv.group,
                mean: m,
                nobs: gv.nobs(),
                n_valid: codes.len() as u64,
            }),
            None => {
                debug!(
                    "numeric_aggregates: variable {:?}: group {:?} has no value, skipping",
                    variable.name, gv.group
                );
            }
        }
    }
    res
}

fn aggregate_mode(
    variable: &Variable,
    partition: &[GroupValues],
) -> Result<Vec<GroupAggregate>, MapErrors> {
    let colors = get_colors(Palette::Categorical, variable.categories.len())?;
    let mut res: Vec<GroupAggregate> = Vec::new();
    for gv in partition.iter() {
        let mut counts: Vec<u64> = vec![0; variable.categories.len()];
        for v in gv.values.iter() {
            if let Value::Category(c) = v {
                if let Some(code) = variable.category_code(c) {
                    counts[code] += 1;
                }
            }
        }
        let n_valid: u64 = counts.iter().sum();
        if n_valid == 0 {
            debug!(
                "aggregate_mode: variable {:?}: group {:?} has no value, skipping",
                variable.name, gv.group
            );
            continue;
        }
        // Ties go to the category declared first.
        let mut best = 0;
        for (code, count) in counts.iter().enumerate() {
            if *count > counts[best] {
                best = code;
            }
        }
        let label = variable.categories[best].clone();
        res.push(GroupAggregate {
            group: gv.group.to_string(),
            display: label.clone(),
            aggregate: Aggregate::Mode(label),
            color: colors[best].to_string(),
            nobs: gv.nobs(),
            n_valid,
        });
    }
    ensure_observed(variable, &res)?;
    Ok(res)
}

fn aggregate_ordered(
    variable: &Variable,
    partition: &[GroupValues],
) -> Result<Vec<GroupAggregate>, MapErrors> {
    let num_categories = variable.categories.len();
    let colors = get_colors(Palette::Ordered, num_categories)?;
    let res: Vec<GroupAggregate> = numeric_aggregates(variable, partition)
        .into_iter()
        .map(|na| {
            let code = nearest_code(na.mean, num_categories);
            GroupAggregate {
                group: na.group.to_string(),
                display: format!("{:.1} ({})", na.mean, variable.categories[code]),
                aggregate: Aggregate::Mean(na.mean),
                color: colors[code].to_string(),
                nobs: na.nobs,
                n_valid: na.n_valid,
            }
        })
        .collect();
    ensure_observed(variable, &res)?;
    Ok(res)
}

fn nearest_code(mean: f64, num_categories: usize) -> usize {
    (mean.round().max(0.0) as usize).min(num_categories - 1)
}

fn aggregate_binned(
    variable: &Variable,
    all_values: &[Value],
    partition: &[GroupValues],
) -> Result<(Vec<GroupAggregate>, Bins), MapErrors> {
    let full: Vec<f64> = all_values
        .iter()
        .filter_map(|v| numeric_code(variable, v))
        .collect();
    if full.is_empty() {
        return Err(MapErrors::EmptyVariable(variable.name.clone()));
    }
    let aggregates = numeric_aggregates(variable, partition);
    let means: Vec<f64> = aggregates.iter().map(|na| na.mean).collect();
    let bins = compute_bins(&full, &means, variable.hue)?;
    debug!(
        "aggregate_binned: variable {:?}: edges {:?}",
        variable.name, bins.edges
    );

    let res: Vec<GroupAggregate> = aggregates
        .into_iter()
        .map(|na| {
            let (aggregate, display) = match variable.kind {
                VariableKind::Boolean => {
                    (Aggregate::Share(na.mean), format!("{:.0}%", 100.0 * na.mean))
                }
                _ if variable.is_probability() => {
                    (Aggregate::Mean(na.mean), format!("{:.0}%", na.mean))
                }
                _ => (Aggregate::Mean(na.mean), format!("{:.1}", na.mean)),
            };
            GroupAggregate {
                group: na.group.to_string(),
                aggregate,
                display,
                color: bins.color(na.mean).to_string(),
                nobs: na.nobs,
                n_valid: na.n_valid,
            }
        })
        .collect();
    Ok((res, bins))
}

fn ensure_observed(variable: &Variable, groups: &[GroupAggregate]) -> Result<(), MapErrors> {
    if groups.is_empty() {
        Err(MapErrors::EmptyVariable(variable.name.clone()))
    } else {
        Ok(())
    }
}

/// Builds the bins for a variable.
///
/// The range covers the interquartile range of the full distribution, and is
/// extended to include all the group aggregates. Aggregates far in the tails
/// therefore end up in the outermost bins instead of stretching the ramp.
fn compute_bins(full: &[f64], aggregates: &[f64], hue: Palette) -> Result<Bins, MapErrors> {
    let q25 = quantile(full, 0.25);
    let q75 = quantile(full, 0.75);
    let min_ = aggregates.iter().cloned().fold(q25, f64::min);
    let max_ = aggregates.iter().cloned().fold(q75, f64::max);
    debug!(
        "compute_bins: q25: {} q75: {} range: [{}, {}]",
        q25, q75, min_, max_
    );
    let edges = linspace(min_ - BIN_PADDING, max_ + BIN_PADDING, NUM_BINS + 1);
    let colors = get_colors(hue, NUM_BINS)?
        .iter()
        .map(|s| s.to_string())
        .collect();
    Ok(Bins { edges, colors })
}

/// Quantile with linear interpolation between the closest ranks.
/// The input must not be empty.
fn quantile(xs: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<f64> = xs.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    let step = (stop - start) / (num - 1) as f64;
    let mut res: Vec<f64> = (0..num).map(|i| start + step * i as f64).collect();
    // Avoid accumulating a rounding error on the last edge.
    if let Some(last) = res.last_mut() {
        *last = stop;
    }
    res
}

/// Turns a display label into an identifier that can be used as a key.
///
/// German umlauts and the sharp s are transliterated; spaces and punctuation
/// become underscores. The transformation is idempotent.
pub fn compatible_str(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'ä' => res.push_str("ae"),
            'ö' => res.push_str("oe"),
            'ü' => res.push_str("ue"),
            'Ä' => res.push_str("Ae"),
            'Ö' => res.push_str("Oe"),
            'Ü' => res.push_str("Ue"),
            'ß' => res.push_str("ss"),
            ' ' | '.' | '/' | ':' | '(' | ')' | '-' => res.push('_'),
            _ => res.push(c),
        }
    }
    res
}

/// The properties attached to a map region for one variable.
///
/// The keys are `label_<id>`, `value_<id>`, `color_<id>` and `nobs_<id>`, with
/// `<id>` the sanitized nice name of the variable.
pub fn region_properties(
    nice_name: &str,
    label: &str,
    group_aggregate: &GroupAggregate,
) -> Vec<(String, String)> {
    let id = compatible_str(nice_name);
    vec![
        (format!("label_{}", id), label.to_string()),
        (format!("value_{}", id), group_aggregate.display.clone()),
        (format!("color_{}", id), group_aggregate.color.clone()),
        (format!("nobs_{}", id), group_aggregate.nobs.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn cat(s: &str) -> Value {
        Value::Category(s.to_string())
    }

    fn one_variable_table(variable: Variable, rows: &[(&str, Value)]) -> Table {
        let name = variable.name.clone();
        let mut builder = Builder::new("prov").unwrap().variable(variable).unwrap();
        for (group, value) in rows.iter() {
            builder
                .add_record(group, &[(name.as_str(), value.clone())])
                .unwrap();
        }
        builder.build()
    }

    #[test]
    fn boolean_share() {
        init();
        let table = one_variable_table(
            Variable::boolean("worried"),
            &[
                ("Utrecht", Value::Bool(true)),
                ("Utrecht", Value::Bool(true)),
                ("Utrecht", Value::Bool(false)),
                ("Utrecht", Value::Bool(false)),
            ],
        );
        let res = aggregate_and_color(&table, "worried").unwrap();
        let utrecht = res.get("Utrecht").unwrap();
        assert_eq!(utrecht.aggregate, Aggregate::Share(0.5));
        assert_eq!(utrecht.display, "50%");
        assert_eq!(utrecht.nobs, 4);
        assert_eq!(res.aggregation_type, AggregationType::Share);
    }

    #[test]
    fn ordered_display_uses_rounded_code() {
        init();
        let trust = Variable::ordered("trust", &["low", "medium", "high"]);
        let table = one_variable_table(
            trust,
            &[
                ("Gelderland", cat("medium")),
                ("Gelderland", cat("medium")),
                ("Gelderland", cat("medium")),
                ("Gelderland", cat("high")),
                ("Gelderland", cat("high")),
            ],
        );
        let res = aggregate_and_color(&table, "trust").unwrap();
        let g = res.get("Gelderland").unwrap();
        assert_eq!(g.display, "1.4 (medium)");
        assert_eq!(g.color, get_colors(Palette::Ordered, 3).unwrap()[1]);
        assert_eq!(res.aggregation_type, AggregationType::Mean);
        assert!(res.bins.is_none());
    }

    #[test]
    fn ordered_mean_ignores_missing() {
        let table = one_variable_table(
            Variable::ordered("trust", &["low", "medium", "high"]),
            &[
                ("Flevoland", cat("low")),
                ("Flevoland", Value::Missing),
                ("Flevoland", cat("high")),
            ],
        );
        let res = aggregate_and_color(&table, "trust").unwrap();
        let g = res.get("Flevoland").unwrap();
        assert_eq!(g.aggregate, Aggregate::Mean(1.0));
        assert_eq!(g.nobs, 3);
        assert_eq!(g.n_valid, 2);
    }

    #[test]
    fn mode_ties_use_declaration_order() {
        let table = one_variable_table(
            Variable::unordered("transport", &["car", "bike", "train"]),
            &[
                ("Zeeland", cat("train")),
                ("Zeeland", cat("bike")),
                ("Drenthe", cat("train")),
                ("Drenthe", cat("train")),
                ("Drenthe", cat("car")),
            ],
        );
        let res = aggregate_and_color(&table, "transport").unwrap();
        let colors = get_colors(Palette::Categorical, 3).unwrap();

        let zeeland = res.get("Zeeland").unwrap();
        assert_eq!(zeeland.aggregate, Aggregate::Mode("bike".to_string()));
        assert_eq!(zeeland.display, "bike");
        assert_eq!(zeeland.color, colors[1]);

        let drenthe = res.get("Drenthe").unwrap();
        assert_eq!(drenthe.display, "train");
        assert_eq!(drenthe.color, colors[2]);
        assert_eq!(res.aggregation_type, AggregationType::MostCommon);
    }

    #[test]
    fn numeric_bins_clamp_outliers() {
        init();
        let table = one_variable_table(
            Variable::numeric("hours"),
            &[
                ("Utrecht", Value::Number(1.0)),
                ("Utrecht", Value::Number(2.0)),
                ("Drenthe", Value::Number(10.0)),
            ],
        );
        let res = aggregate_and_color(&table, "hours").unwrap();
        let bins = res.bins.clone().unwrap();
        assert_eq!(bins.edges.len(), NUM_BINS + 1);
        assert_eq!(bins.colors.len(), NUM_BINS);

        let utrecht = res.get("Utrecht").unwrap();
        assert_eq!(utrecht.display, "1.5");
        assert_eq!(utrecht.color, "#547482");
        let drenthe = res.get("Drenthe").unwrap();
        assert_eq!(drenthe.display, "10.0");
        assert_eq!(drenthe.color, "#cedae0");
    }

    #[test]
    fn every_aggregate_falls_in_one_bin() {
        let values = [0.0, 0.5, 0.7, 0.8, 0.9, 1.0, 1.1, 40.0, -25.0, 3.3];
        let groups = ["a", "b", "c", "d", "e"];
        let rows: Vec<(&str, Value)> = values
            .iter()
            .enumerate()
            .map(|(idx, x)| (groups[idx % groups.len()], Value::Number(*x)))
            .collect();
        let table = one_variable_table(Variable::numeric("score"), &rows);
        let res = aggregate_and_color(&table, "score").unwrap();
        let bins = res.bins.clone().unwrap();
        assert_eq!(res.groups.len(), groups.len());
        for ga in res.groups.iter() {
            let x = ga.aggregate.as_f64().unwrap();
            let idx = bins.locate(x);
            assert!(idx < NUM_BINS);
            assert!(bins.edges[idx] < x && x <= bins.edges[idx + 1]);
            assert_eq!(ga.color, bins.colors[idx]);
        }
    }

    #[test]
    fn probability_display() {
        let table = one_variable_table(
            Variable::numeric("p_infected"),
            &[
                ("Limburg", Value::Number(10.0)),
                ("Limburg", Value::Number(20.0)),
            ],
        );
        let res = aggregate_and_color(&table, "p_infected").unwrap();
        assert_eq!(res.get("Limburg").unwrap().display, "15%");
    }

    #[test]
    fn hue_changes_the_ramp() {
        let variable = Variable::boolean("worried").with_hue(Palette::Red).unwrap();
        let table = one_variable_table(variable, &[("Limburg", Value::Bool(true))]);
        let res = aggregate_and_color(&table, "worried").unwrap();
        let red = get_colors(Palette::Red, NUM_BINS).unwrap();
        assert!(red.contains(&res.get("Limburg").unwrap().color.as_str()));
        assert!(Variable::boolean("x").with_hue(Palette::Categorical).is_err());
    }

    #[test]
    fn absent_groups_have_no_entry() {
        let mut builder = Builder::new("prov")
            .unwrap()
            .variable(Variable::numeric("age"))
            .unwrap()
            .variable(Variable::boolean("worried"))
            .unwrap();
        builder
            .add_record("Utrecht", &[("age", Value::Number(30.0))])
            .unwrap();
        builder
            .add_record("Zeeland", &[("worried", Value::Bool(true))])
            .unwrap();
        let table = builder.build();
        let res = aggregate_and_color(&table, "age").unwrap();
        assert!(res.get("Utrecht").is_some());
        assert!(res.get("Zeeland").is_none());
        assert!(res.get("Friesland").is_none());
    }

    #[test]
    fn unknown_and_empty_variables() {
        let table = one_variable_table(Variable::numeric("age"), &[("Utrecht", Value::Missing)]);
        assert_eq!(
            aggregate_and_color(&table, "income"),
            Err(MapErrors::UnknownVariable("income".to_string()))
        );
        assert_eq!(
            aggregate_and_color(&table, "age"),
            Err(MapErrors::EmptyVariable("age".to_string()))
        );
    }

    #[test]
    fn too_many_categories() {
        let names: Vec<String> = (0..13).map(|i| format!("c{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let table = one_variable_table(
            Variable::unordered("many", &refs),
            &[("Utrecht", cat("c0"))],
        );
        assert!(matches!(
            aggregate_and_color(&table, "many"),
            Err(MapErrors::PaletteSize { requested: 13, .. })
        ));
    }

    #[test]
    fn unrecognized_kind() {
        assert_eq!(
            VariableKind::parse("age", "date"),
            Err(MapErrors::UnrecognizedKind {
                variable: "age".to_string(),
                kind: "date".to_string()
            })
        );
        assert_eq!(
            VariableKind::parse("age", "numeric"),
            Ok(VariableKind::Numeric)
        );
    }

    #[test]
    fn quantiles_interpolate() {
        assert_eq!(quantile(&[10.0, 1.0, 2.0], 0.25), 1.5);
        assert_eq!(quantile(&[10.0, 1.0, 2.0], 0.75), 6.0);
        assert_eq!(quantile(&[4.0], 0.75), 4.0);
    }

    #[test]
    fn sanitized_identifiers() {
        assert_eq!(
            compatible_str("Sorgen über Ansteckung (Anteil)"),
            "Sorgen_ueber_Ansteckung__Anteil_"
        );
        assert_eq!(compatible_str("Größe/Gewicht: Ä-Ö"), "Groesse_Gewicht__Ae_Oe");
        for label in ["Häufigste Antwort", "No. Obs", "plain"] {
            let once = compatible_str(label);
            assert_eq!(compatible_str(&once), once);
            assert_eq!(compatible_str(label), once);
        }
    }

    #[test]
    fn region_property_keys() {
        let ga = GroupAggregate {
            group: "Utrecht".to_string(),
            aggregate: Aggregate::Share(0.25),
            display: "25%".to_string(),
            color: "#547482".to_string(),
            nobs: 8,
            n_valid: 4,
        };
        let props = region_properties("Worried (share)", "Are you worried?", &ga);
        assert_eq!(
            props,
            vec![
                ("label_Worried__share_".to_string(), "Are you worried?".to_string()),
                ("value_Worried__share_".to_string(), "25%".to_string()),
                ("color_Worried__share_".to_string(), "#547482".to_string()),
                ("nobs_Worried__share_".to_string(), "8".to_string()),
            ]
        );
    }
}
