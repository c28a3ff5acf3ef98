use std::collections::HashSet;

use survey_maps::{aggregate_and_color, region_properties, Table};

use crate::dashboard::*;

/// The surveys for which region boundaries are known.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Dataset {
    /// Dutch provinces.
    Liss,
    /// German states.
    Gesis,
}

impl Dataset {
    pub fn from_name(name: &str) -> DashResult<Dataset> {
        match name {
            "liss" => Ok(Dataset::Liss),
            "gesis" => Ok(Dataset::Gesis),
            x => UnsupportedDatasetSnafu { name: x }.fail(),
        }
    }

    /// Region names of the boundary files that differ from the group keys of the responses.
    fn renames(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Dataset::Liss => &[("Friesland (Fryslân)", "Friesland")],
            Dataset::Gesis => &[],
        }
    }
}

/// A variable shown on the maps of a group.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MapVariable {
    pub name: String,
    pub nice_name: String,
    pub label: String,
}

pub fn read_boundaries(path: &str, dataset: Dataset) -> DashResult<JSValue> {
    info!("Attempting to read boundaries file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    normalize_boundaries(path, js, dataset)
}

/// Checks that the boundaries are a collection of named features and renames
/// the regions of the dataset.
pub fn normalize_boundaries(path: &str, mut js: JSValue, dataset: Dataset) -> DashResult<JSValue> {
    let features = match js.get_mut("features").and_then(|f| f.as_array_mut()) {
        Some(features) => features,
        None => {
            return InvalidBoundariesSnafu {
                path,
                reason: "no list of features",
            }
            .fail()
        }
    };
    for (idx, feature) in features.iter_mut().enumerate() {
        let name_js = feature
            .get_mut("properties")
            .and_then(|p| p.as_object_mut())
            .and_then(|p| p.get_mut("name"));
        let name_js = match name_js {
            Some(n) if n.is_string() => n,
            _ => {
                return InvalidBoundariesSnafu {
                    path,
                    reason: format!("feature {} has no name", idx),
                }
                .fail()
            }
        };
        for &(from, to) in dataset.renames() {
            if name_js.as_str() == Some(from) {
                debug!("normalize_boundaries: renaming {:?} to {:?}", from, to);
                *name_js = json!(to);
            }
        }
    }
    Ok(js)
}

/// The names of the regions, in the order of the features.
pub fn region_names(boundaries: &JSValue) -> Vec<String> {
    boundaries["features"]
        .as_array()
        .map(|features| {
            features
                .iter()
                .filter_map(|f| f["properties"]["name"].as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Adds the properties of every variable to the regions of a copy of the boundaries.
///
/// Returns the boundaries and the aggregation type of each variable, keyed by
/// nice name. Regions without responses are left untouched, and groups
/// without a region are dropped.
pub fn prepare_map_data(
    table: &Table,
    variables: &[MapVariable],
    boundaries: &JSValue,
) -> DashResult<(JSValue, JSMap<String, JSValue>)> {
    let mut geojson = boundaries.clone();
    let mut types: JSMap<String, JSValue> = JSMap::new();
    let regions: HashSet<String> = region_names(boundaries).into_iter().collect();

    for mv in variables.iter() {
        let result = aggregate_and_color(table, &mv.name).context(MapSnafu {
            variable: mv.name.clone(),
        })?;
        types.insert(
            mv.nice_name.clone(),
            json!(result.aggregation_type.label()),
        );

        for ga in result.groups.iter() {
            if !regions.contains(&ga.group) {
                debug!(
                    "prepare_map_data: variable {:?}: dropping group {:?} without region",
                    mv.name, ga.group
                );
            }
        }

        if let Some(features) = geojson["features"].as_array_mut() {
            for feature in features.iter_mut() {
                let name = feature["properties"]["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let ga = match result.get(&name) {
                    Some(ga) => ga,
                    None => continue,
                };
                if let Some(props) = feature["properties"].as_object_mut() {
                    for (key, value) in region_properties(&mv.nice_name, &mv.label, ga) {
                        props.insert(key, JSValue::String(value));
                    }
                }
            }
        }
    }
    Ok((geojson, types))
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_maps::{Builder, Value, Variable};

    fn boundaries() -> JSValue {
        json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "Utrecht"}, "geometry": null},
                {"type": "Feature", "properties": {"name": "Friesland (Fryslân)"}, "geometry": null},
                {"type": "Feature", "properties": {"name": "Limburg"}, "geometry": null}
            ]
        })
    }

    fn table() -> Table {
        let mut b = Builder::new("prov")
            .unwrap()
            .variable(Variable::boolean("worried"))
            .unwrap();
        for (prov, w) in [
            ("Utrecht", true),
            ("Utrecht", false),
            ("Friesland", true),
            ("Groningen", true),
        ] {
            b.add_record(prov, &[("worried", Value::Bool(w))]).unwrap();
        }
        b.build()
    }

    fn worried() -> Vec<MapVariable> {
        vec![MapVariable {
            name: "worried".to_string(),
            nice_name: "Worried (a lot)".to_string(),
            label: "Are you worried?".to_string(),
        }]
    }

    #[test]
    fn datasets() {
        assert_eq!(Dataset::from_name("gesis").unwrap(), Dataset::Gesis);
        assert_eq!(
            Dataset::from_name("soep").unwrap_err().to_string(),
            "Unsupported dataset soep"
        );
    }

    #[test]
    fn liss_renames_friesland() {
        let js = normalize_boundaries("p", boundaries(), Dataset::Liss).unwrap();
        assert_eq!(region_names(&js), vec!["Utrecht", "Friesland", "Limburg"]);
        let js = normalize_boundaries("p", boundaries(), Dataset::Gesis).unwrap();
        assert_eq!(region_names(&js)[1], "Friesland (Fryslân)");
    }

    #[test]
    fn invalid_boundaries() {
        assert!(normalize_boundaries("p", json!({"type": "Feature"}), Dataset::Liss).is_err());
        let js = json!({"features": [{"properties": {"name": 3}}]});
        assert!(normalize_boundaries("p", js, Dataset::Liss).is_err());
    }

    #[test]
    fn properties_of_the_regions() {
        let bounds = normalize_boundaries("p", boundaries(), Dataset::Liss).unwrap();
        let (geojson, types) = prepare_map_data(&table(), &worried(), &bounds).unwrap();
        assert_eq!(types.get("Worried (a lot)"), Some(&json!("Share")));

        let utrecht = &geojson["features"][0]["properties"];
        assert_eq!(utrecht["label_Worried__a_lot_"], json!("Are you worried?"));
        assert_eq!(utrecht["value_Worried__a_lot_"], json!("50%"));
        assert_eq!(utrecht["nobs_Worried__a_lot_"], json!("2"));
        assert!(utrecht["color_Worried__a_lot_"].is_string());
        assert_eq!(
            geojson["features"][1]["properties"]["value_Worried__a_lot_"],
            json!("100%")
        );
    }

    #[test]
    fn regions_without_data_are_untouched() {
        let bounds = normalize_boundaries("p", boundaries(), Dataset::Liss).unwrap();
        let (geojson, _) = prepare_map_data(&table(), &worried(), &bounds).unwrap();
        assert_eq!(geojson["features"][2]["properties"], json!({"name": "Limburg"}));
        // Groningen has no region and is not added.
        assert_eq!(region_names(&geojson), region_names(&bounds));
    }
}
