//! Operadores de tablas.
//!
//! Una tabla es un array JSON de filas; cada fila es un objeto
//! `atributo -> valor`. Los atributos numéricos se leen con `as_f64`.

use log::Level;
use op_core::metadata::{AttributeMetaData, Cardinality, KindPrecondition, MetaData, TableMetaData};
use op_core::model::TABLE_KIND;
use op_core::operator::{GenerateRule, GroupAggregationRule, PassThroughRule, RowsEffect, TransformationRule};
use op_core::{ExecutionContext, ExecutionError, GraphError, GroupId, IOObject, Operator, OperatorBuilder,
              ParameterType, ParameterValue, PortId, Severity, TransformContext};
use serde_json::{Map, Value};

pub const ROWS_VALUE: &str = "rows";

fn numeric(row: &Value, attribute: &str) -> Option<f64> {
    row.get(attribute).and_then(Value::as_f64)
}

/// Atributos de una lista separada por comas, sin vacíos.
fn attribute_names(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// create_table
// ---------------------------------------------------------------------------

/// Fuente: tabla numérica descrita por los parámetros `attributes`
/// (nombre -> rol, `regular` o un rol especial) y `data` (una fila por
/// vector).
#[derive(Debug, Default)]
pub struct CreateTable {
    output: Option<PortId>,
}

impl CreateTable {
    pub const TYPE_KEY: &'static str = "create_table";

    pub fn new() -> Self {
        Self::default()
    }
}

/// Esquema declarado más el número exacto de filas.
fn declared_table(attributes: &[(String, String)], data: &[Vec<f64>]) -> TableMetaData {
    let mut table = TableMetaData::new().with_rows(Cardinality::exact(data.len()));
    for (index, (name, role)) in attributes.iter().enumerate() {
        let column = data.iter().filter_map(|row| row.get(index).copied());
        let (min, max) = column.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let mut attribute = if data.is_empty() {
            AttributeMetaData::unknown(name)
        } else {
            AttributeMetaData::numeric(name, min, max)
        };
        if role != "regular" && !role.is_empty() {
            attribute = attribute.with_role(role);
        }
        table.put_attribute(attribute);
    }
    table
}

fn ragged_row(width: usize, data: &[Vec<f64>]) -> Option<usize> {
    data.iter().position(|row| row.len() != width)
}

impl Operator for CreateTable {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let output = builder.output("output")?;
        builder.parameter(ParameterType::list("attributes", "attribute name -> role ('regular' or a special role)"))?;
        builder.parameter(ParameterType::matrix("data", "one vector of values per row")
                          .with_default(ParameterValue::Matrix(Vec::new())))?;
        builder.rule(GenerateRule::computed(output, |ctx| {
                         let attributes = ctx.get_list("attributes").unwrap_or_default();
                         let data = ctx.parameters().get_matrix("data").unwrap_or_default();
                         MetaData::Table(declared_table(&attributes, &data))
                     }))?;
        self.output = Some(output);
        Ok(())
    }

    fn transform(&mut self, ctx: &mut TransformContext<'_>) {
        ctx.apply_rules();
        let (Ok(attributes), Ok(data)) = (ctx.get_list("attributes"), ctx.parameters().get_matrix("data")) else {
            return;
        };
        if let Some(row) = ragged_row(attributes.len(), &data) {
            ctx.add_issue(None,
                          Severity::Error,
                          format!("row {} does not have {} values", row + 1, attributes.len()));
        }
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let attributes = ctx.get_list("attributes")?;
        let data = ctx.get_matrix("data")?;
        if let Some(row) = ragged_row(attributes.len(), &data) {
            return Err(ExecutionError::user("invalid_data",
                                            [format!("row {} does not have {} values", row + 1, attributes.len())]));
        }
        let rows = data.iter()
                       .map(|values| {
                           let row: Map<String, Value> = attributes.iter()
                                                                   .zip(values)
                                                                   .map(|((name, _), v)| (name.clone(), Value::from(*v)))
                                                                   .collect();
                           Value::Object(row)
                       })
                       .collect();
        ctx.deliver("output", IOObject::table(rows))
    }
}

// ---------------------------------------------------------------------------
// filter_rows
// ---------------------------------------------------------------------------

const COMPARISONS: [&str; 6] = ["<", "<=", ">", ">=", "==", "!="];

fn compare(comparison: &str, left: f64, right: f64) -> bool {
    match comparison {
        "<" => left < right,
        "<=" => left <= right,
        ">" => left > right,
        ">=" => left >= right,
        "==" => left == right,
        _ => left != right,
    }
}

/// Conserva las filas cuyo atributo numérico cumple la comparación.
#[derive(Debug, Default)]
pub struct FilterRows {
    input: Option<PortId>,
}

impl FilterRows {
    pub const TYPE_KEY: &'static str = "filter_rows";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Operator for FilterRows {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let input = builder.input("input")?;
        let output = builder.output("output")?;
        builder.precondition(input, KindPrecondition::new(TABLE_KIND))?;
        builder.parameter(ParameterType::string("attribute", "numeric attribute to test"))?;
        builder.parameter(ParameterType::category("comparison", &COMPARISONS, "comparison operator")
                          .with_default(ParameterValue::Category(">=".into())))?;
        builder.parameter(ParameterType::real("value", "value compared against"))?;
        builder.rule(PassThroughRule::new(input, output).with_rows(RowsEffect::Reduce))?;
        self.input = Some(input);
        Ok(())
    }

    fn transform(&mut self, ctx: &mut TransformContext<'_>) {
        ctx.apply_rules();
        check_attribute_present(ctx, self.input, "attribute");
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let attribute = ctx.get_string("attribute")?;
        let comparison = ctx.get_category("comparison")?;
        let value = ctx.get_real("value")?;
        let table = ctx.input("input")?;
        let mut kept = Vec::new();
        for row in table.rows() {
            let Some(v) = numeric(row, &attribute) else {
                return Err(ExecutionError::user("missing_attribute", [attribute]));
            };
            if compare(&comparison, v, value) {
                kept.push(row.clone());
            }
        }
        ctx.log(Level::Debug, &format!("kept {} of {} rows", kept.len(), table.rows().len()));
        ctx.deliver("output", table.derive(Value::Array(kept)))
    }
}

/// Con el esquema conocido, un atributo ausente es un problema del puerto.
fn check_attribute_present(ctx: &mut TransformContext<'_>, input: Option<PortId>, key: &str) {
    let (Some(input), Ok(attribute)) = (input, ctx.get_string(key)) else { return };
    let md = ctx.input_meta_data(input);
    let Some(table) = md.as_table() else { return };
    match table.contains_attribute(&attribute) {
        Some(false) => ctx.add_issue(Some(input),
                                     Severity::Error,
                                     format!("input table lacks attribute '{attribute}'")),
        None => ctx.add_issue(Some(input),
                              Severity::Warning,
                              format!("input table may lack attribute '{attribute}'")),
        Some(true) => {}
    }
}

// ---------------------------------------------------------------------------
// select_attributes
// ---------------------------------------------------------------------------

/// Proyección a los atributos listados en `attributes` (separados por comas).
#[derive(Debug, Default)]
pub struct SelectAttributes;

impl SelectAttributes {
    pub const TYPE_KEY: &'static str = "select_attributes";

    pub fn new() -> Self {
        Self
    }
}

struct SelectRule {
    input: PortId,
    output: PortId,
}

impl TransformationRule for SelectRule {
    fn apply(&self, ctx: &mut TransformContext<'_>) {
        let mut md = ctx.input_meta_data(self.input);
        if let (Some(table), Ok(list)) = (md.as_table_mut(), ctx.get_string("attributes")) {
            let wanted = attribute_names(&list);
            let missing: Vec<&String> = wanted.iter().filter(|w| table.contains_attribute(w) == Some(false)).collect();
            let mut selected = table.clone();
            for attribute in table.attributes() {
                if !wanted.contains(&attribute.name) {
                    selected.remove_attribute(&attribute.name);
                }
            }
            *table = selected;
            if !missing.is_empty() {
                let names: Vec<&str> = missing.iter().map(|s| s.as_str()).collect();
                ctx.add_issue(Some(self.input),
                              Severity::Error,
                              format!("input table lacks attributes: {}", names.join(", ")));
            }
        }
        ctx.deliver_meta_data(self.output, md);
    }
}

impl Operator for SelectAttributes {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let input = builder.input("input")?;
        let output = builder.output("output")?;
        builder.precondition(input, KindPrecondition::new(TABLE_KIND))?;
        builder.parameter(ParameterType::string("attributes", "comma separated attributes to keep"))?;
        builder.rule(SelectRule { input, output })
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let wanted = attribute_names(&ctx.get_string("attributes")?);
        let table = ctx.input("input")?;
        let mut rows = Vec::with_capacity(table.rows().len());
        for row in table.rows() {
            let mut selected = Map::new();
            for name in &wanted {
                let value = row.get(name)
                               .cloned()
                               .ok_or_else(|| ExecutionError::user("missing_attribute", [name.as_str()]))?;
                selected.insert(name.clone(), value);
            }
            rows.push(Value::Object(selected));
        }
        ctx.deliver("output", table.derive(Value::Array(rows)))
    }
}

// ---------------------------------------------------------------------------
// append_tables
// ---------------------------------------------------------------------------

/// Concatena por filas todas las tablas conectadas a `table N`.
#[derive(Debug, Default)]
pub struct AppendTables {
    tables: Option<GroupId>,
}

impl AppendTables {
    pub const TYPE_KEY: &'static str = "append_tables";

    pub fn new() -> Self {
        Self::default()
    }
}

fn append_meta_data(inputs: &[MetaData]) -> MetaData {
    let mut tables = inputs.iter().map(MetaData::as_table);
    let Some(Some(first)) = tables.next() else { return MetaData::Unknown };
    tables.try_fold(first.clone(), |acc, next| next.map(|t| acc.append(t)))
          .map_or(MetaData::Unknown, MetaData::Table)
}

impl Operator for AppendTables {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let tables = builder.extend_inputs("table")?;
        let output = builder.output("output")?;
        builder.extended_precondition(tables, KindPrecondition::new(TABLE_KIND))?;
        builder.rule(GroupAggregationRule::new(tables, output, append_meta_data))?;
        self.tables = Some(tables);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let group = self.tables
                        .ok_or_else(|| ExecutionError::Internal("append_tables was never declared".into()))?;
        let rows: Vec<Value> = ctx.collect(group).iter().flat_map(|t| t.rows().to_vec()).collect();
        ctx.deliver("output", IOObject::table(rows))
    }
}

// ---------------------------------------------------------------------------
// count_rows
// ---------------------------------------------------------------------------

/// Publica el número de filas como valor `rows` y como objeto `number`;
/// la tabla sale intacta por `output`.
#[derive(Debug, Default)]
pub struct CountRows;

impl CountRows {
    pub const TYPE_KEY: &'static str = "count_rows";

    pub fn new() -> Self {
        Self
    }
}

impl Operator for CountRows {
    fn type_key(&self) -> &str {
        Self::TYPE_KEY
    }

    fn declare(&mut self, builder: &mut OperatorBuilder<'_>) -> Result<(), GraphError> {
        let input = builder.input("input")?;
        let output = builder.output("output")?;
        let count = builder.output("count")?;
        builder.precondition(input, KindPrecondition::new(TABLE_KIND))?;
        builder.rule(PassThroughRule::new(input, output))?;
        builder.rule(GenerateRule::fixed(count, MetaData::generic("number")))
    }

    fn execute(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecutionError> {
        let table = ctx.input("input")?;
        let rows = table.row_count()
                        .ok_or_else(|| ExecutionError::user("wrong_input_kind", [TABLE_KIND, table.kind()]))?;
        ctx.set_value(ROWS_VALUE, rows);
        ctx.deliver("count", IOObject::new("number", Value::from(rows)))?;
        ctx.deliver_shared("output", table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn declared_schema_tracks_ranges_and_roles() {
        let attributes = vec![("x".to_string(), "regular".to_string()), ("y".to_string(), "label".to_string())];
        let table = declared_table(&attributes, &[vec![1.0, 0.0], vec![3.0, 1.0]]);
        assert_eq!(table.rows(), Cardinality::exact(2));
        assert!(table.special("label").is_some());
        assert_eq!(table.attribute("x"), Some(&AttributeMetaData::numeric("x", 1.0, 3.0)));
    }

    #[test]
    fn appending_sums_rows_and_gives_up_on_non_tables() {
        let a = MetaData::Table(TableMetaData::new().with_rows(Cardinality::exact(2)));
        let b = MetaData::Table(TableMetaData::new().with_rows(Cardinality::at_least(3)));
        let joined = append_meta_data(&[a.clone(), b]);
        assert_eq!(joined.as_table().map(|t| t.rows()), Some(Cardinality::at_least(5)));
        assert!(append_meta_data(&[a, MetaData::generic("text")]).is_unknown());
        assert!(append_meta_data(&[]).is_unknown());
    }

    #[test]
    fn comparisons_and_attribute_lists() {
        assert!(compare(">=", 2.0, 2.0));
        assert!(!compare("<", 2.0, 2.0));
        assert!(compare("!=", 1.0, 2.0));
        assert_eq!(attribute_names(" a, ,b "), vec!["a", "b"]);
        assert_eq!(numeric(&json!({ "a": 2 }), "a"), Some(2.0));
    }
}
