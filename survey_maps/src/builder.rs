pub use crate::config::*;

use log::debug;

/// A builder for the table of survey responses.
///
/// Every record belongs to one group (for example a province) and carries the
/// values of some of the declared variables. The values are checked against
/// the kind of their variable when they are added.
///
/// ```
/// pub use survey_maps::builder::Builder;
/// pub use survey_maps::{Value, Variable};
/// # use survey_maps::MapErrors;
///
/// let mut builder = Builder::new("prov")?
///     .variable(Variable::boolean("worried"))?
///     .variable(Variable::numeric("p_infected"))?;
///
/// builder.add_record("Utrecht", &[("worried", Value::Bool(true))])?;
/// builder.add_record("Drenthe", &[("p_infected", Value::Number(12.0))])?;
///
/// let table = builder.build();
/// assert_eq!(table.groups(), vec!["Utrecht", "Drenthe"]);
/// # Ok::<(), MapErrors>(())
/// ```
pub struct Builder {
    pub(crate) _group_key: String,
    pub(crate) _variables: Vec<Variable>,
    pub(crate) _groups: Vec<String>,
    // One column per variable, each with one value per record.
    pub(crate) _columns: Vec<Vec<Value>>,
}

impl Builder {
    pub fn new(group_key: &str) -> Result<Builder, MapErrors> {
        Ok(Builder {
            _group_key: group_key.to_string(),
            _variables: Vec::new(),
            _groups: Vec::new(),
            _columns: Vec::new(),
        })
    }

    /// Declares a variable. Records added before the declaration have a missing value for it.
    pub fn variable(mut self, variable: Variable) -> Result<Builder, MapErrors> {
        if self._variables.iter().any(|v| v.name == variable.name) {
            return Err(MapErrors::DuplicateVariable(variable.name));
        }
        self._columns.push(vec![Value::Missing; self._groups.len()]);
        self._variables.push(variable);
        Ok(self)
    }

    /// Adds one record.
    ///
    /// group: the group key of the record. It may not be empty.
    /// values: the values of this record. The variables that are not mentioned are missing.
    pub fn add_record(&mut self, group: &str, values: &[(&str, Value)]) -> Result<(), MapErrors> {
        if group.trim().is_empty() {
            return Err(MapErrors::MissingGroupKey {
                row: self._groups.len(),
            });
        }
        let mut row: Vec<Value> = vec![Value::Missing; self._variables.len()];
        for (name, value) in values.iter() {
            let idx = self
                ._variables
                .iter()
                .position(|v| v.name == *name)
                .ok_or_else(|| MapErrors::UnknownVariable(name.to_string()))?;
            check_value(&self._variables[idx], value)?;
            row[idx] = value.clone();
        }
        for (column, value) in self._columns.iter_mut().zip(row) {
            column.push(value);
        }
        self._groups.push(group.to_string());
        Ok(())
    }

    pub fn build(self) -> Table {
        debug!(
            "build: {} records, {} variables, group key {:?}",
            self._groups.len(),
            self._variables.len(),
            self._group_key
        );
        Table {
            group_key: self._group_key,
            variables: self._variables,
            groups: self._groups,
            columns: self._columns,
        }
    }
}

fn check_value(variable: &Variable, value: &Value) -> Result<(), MapErrors> {
    let valid = match (variable.kind, value) {
        (_, Value::Missing) => true,
        (VariableKind::Boolean, Value::Bool(_)) => true,
        (VariableKind::Numeric, Value::Number(x)) => x.is_finite(),
        (VariableKind::CategoricalOrdered, Value::Category(c))
        | (VariableKind::CategoricalUnordered, Value::Category(c)) => {
            variable.category_code(c).is_some()
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(MapErrors::InvalidValue {
            variable: variable.name.clone(),
            value: format!("{:?}", value),
        })
    }
}

/// The validated table of survey responses.
#[derive(PartialEq, Debug, Clone)]
pub struct Table {
    group_key: String,
    variables: Vec<Variable>,
    // The group of each record.
    groups: Vec<String>,
    columns: Vec<Vec<Value>>,
}

impl Table {
    pub fn group_key(&self) -> &str {
        self.group_key.as_str()
    }

    pub fn num_records(&self) -> usize {
        self.groups.len()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The distinct groups, in the order of their first record.
    pub fn groups(&self) -> Vec<&str> {
        let mut res: Vec<&str> = Vec::new();
        for g in self.groups.iter() {
            if !res.contains(&g.as_str()) {
                res.push(g.as_str());
            }
        }
        res
    }

    /// The group key of every record.
    pub fn record_groups(&self) -> &[String] {
        &self.groups
    }

    /// Finds the column of a variable. Names ending with `_binned` refer to
    /// the column without the suffix.
    pub fn resolve(&self, name: &str) -> Result<(&Variable, &[Value]), MapErrors> {
        let data_name = name.strip_suffix("_binned").unwrap_or(name);
        self.variables
            .iter()
            .zip(self.columns.iter())
            .find(|(v, _)| v.name == data_name)
            .map(|(v, c)| (v, c.as_slice()))
            .ok_or_else(|| MapErrors::UnknownVariable(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn likert() -> Variable {
        Variable::ordered("trust", &["low", "medium", "high"])
    }

    #[test]
    fn missing_group_key() {
        let mut builder = Builder::new("prov").unwrap().variable(likert()).unwrap();
        builder
            .add_record("Zeeland", &[("trust", Value::Category("low".to_string()))])
            .unwrap();
        assert_eq!(
            builder.add_record(" ", &[]),
            Err(MapErrors::MissingGroupKey { row: 1 })
        );
    }

    #[test]
    fn rejects_unknown_category() {
        let mut builder = Builder::new("prov").unwrap().variable(likert()).unwrap();
        let res = builder.add_record("Zeeland", &[("trust", Value::Category("none".to_string()))]);
        assert!(matches!(res, Err(MapErrors::InvalidValue { .. })));
    }

    #[test]
    fn rejects_wrong_type() {
        let mut builder = Builder::new("prov")
            .unwrap()
            .variable(Variable::boolean("worried"))
            .unwrap();
        let res = builder.add_record("Zeeland", &[("worried", Value::Number(1.0))]);
        assert!(matches!(res, Err(MapErrors::InvalidValue { .. })));
        let res = builder.add_record("Zeeland", &[("other", Value::Bool(true))]);
        assert_eq!(res, Err(MapErrors::UnknownVariable("other".to_string())));
    }

    #[test]
    fn duplicate_variable() {
        let res = Builder::new("prov")
            .unwrap()
            .variable(likert())
            .unwrap()
            .variable(likert());
        assert!(matches!(res, Err(MapErrors::DuplicateVariable(_))));
    }

    #[test]
    fn late_variable_is_missing() {
        let mut builder = Builder::new("prov").unwrap();
        builder.add_record("Limburg", &[]).unwrap();
        let mut builder = builder.variable(Variable::numeric("age")).unwrap();
        builder
            .add_record("Limburg", &[("age", Value::Number(40.0))])
            .unwrap();
        let table = builder.build();
        let (_, column) = table.resolve("age").unwrap();
        assert_eq!(column, &[Value::Missing, Value::Number(40.0)]);
        assert_eq!(table.groups(), vec!["Limburg"]);
        assert_eq!(table.num_records(), 2);
    }

    #[test]
    fn binned_names_resolve_to_the_data_column() {
        let table = Builder::new("prov")
            .unwrap()
            .variable(Variable::numeric("age"))
            .unwrap()
            .build();
        assert_eq!(table.resolve("age_binned").unwrap().0.name, "age");
        assert!(table.resolve("income_binned").is_err());
    }
}
