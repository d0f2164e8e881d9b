use agora_types::Id;
use anyhow::{Result, anyhow, bail};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

/// Columns kept outside the JSON body. Filters on these hit the column
/// directly instead of `json_extract`.
pub(crate) const RESERVED_FIELDS: [&str; 4] = ["id", "version", "created_at", "updated_at"];

/// Document selector, compiled to a SQL predicate over the `documents` table.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document in the collection.
    All,
    /// Field equals a scalar value.
    Eq(String, Value),
    /// Array field has an element equal to a scalar value.
    Contains(String, Value),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::Eq(field.to_string(), value.into())
    }

    pub fn contains(field: &str, value: impl Into<Value>) -> Self {
        Self::Contains(field.to_string(), value.into())
    }

    pub fn id(id: Id) -> Self {
        Self::eq("id", id)
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Self::And(mut parts) => {
                parts.push(other);
                Self::And(parts)
            }
            this => Self::And(vec![this, other]),
        }
    }

    pub fn or(self, other: Filter) -> Self {
        match self {
            Self::Or(mut parts) => {
                parts.push(other);
                Self::Or(parts)
            }
            this => Self::Or(vec![this, other]),
        }
    }

    /// Render as a SQL boolean expression, pushing bound values onto `params`
    /// in placeholder order.
    pub(crate) fn to_sql(&self, params: &mut Vec<SqlValue>) -> Result<String> {
        match self {
            Self::All => Ok("1".to_string()),
            Self::Eq(field, value) => {
                let target = field_expr(field)?;
                if value.is_null() {
                    return Ok(format!("{} IS NULL", target));
                }
                params.push(sql_value(value)?);
                Ok(format!("{} = ?", target))
            }
            Self::Contains(field, value) => {
                let path = json_path(field)?;
                params.push(sql_value(value)?);
                Ok(format!(
                    "EXISTS (SELECT 1 FROM json_each(body, '{}') WHERE json_each.value = ?)",
                    path
                ))
            }
            Self::And(parts) => join(parts, " AND ", "1", params),
            Self::Or(parts) => join(parts, " OR ", "0", params),
        }
    }
}

fn join(parts: &[Filter], sep: &str, empty: &str, params: &mut Vec<SqlValue>) -> Result<String> {
    if parts.is_empty() {
        return Ok(empty.to_string());
    }
    let rendered = parts
        .iter()
        .map(|p| p.to_sql(params).map(|sql| format!("({})", sql)))
        .collect::<Result<Vec<_>>>()?;
    Ok(rendered.join(sep))
}

fn field_expr(field: &str) -> Result<String> {
    if RESERVED_FIELDS.contains(&field) {
        return Ok(field.to_string());
    }
    Ok(format!("json_extract(body, '{}')", json_path(field)?))
}

/// Field names are spliced into the SQL text, so only plain identifiers are
/// accepted.
fn json_path(field: &str) -> Result<String> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        bail!("Invalid filter field: {:?}", field);
    }
    Ok(format!("$.{}", field))
}

/// JSON scalars as SQLite sees them after `json_extract`: booleans become
/// 0/1, numbers stay numeric, strings are text.
fn sql_value(value: &Value) -> Result<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .ok_or_else(|| anyhow!("Unrepresentable number in filter: {}", n)),
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => bail!("Filters compare scalar values only"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_fields_use_columns() {
        let mut params = Vec::new();
        let sql = Filter::eq("version", 3).to_sql(&mut params).unwrap();
        assert_eq!(sql, "version = ?");
        assert_eq!(params, vec![SqlValue::Integer(3)]);
    }

    #[test]
    fn nested_filters_keep_param_order() {
        let filter = Filter::eq("from", "a")
            .and(Filter::eq("to", "b"))
            .or(Filter::eq("from", "b").and(Filter::eq("to", "a")));

        let mut params = Vec::new();
        let sql = filter.to_sql(&mut params).unwrap();

        assert_eq!(sql.matches('?').count(), 4);
        assert_eq!(
            params,
            vec![
                SqlValue::Text("a".into()),
                SqlValue::Text("b".into()),
                SqlValue::Text("b".into()),
                SqlValue::Text("a".into()),
            ]
        );
    }

    #[test]
    fn rejects_field_names_that_are_not_identifiers() {
        let mut params = Vec::new();
        let result = Filter::eq("x') OR 1=1 --", 1).to_sql(&mut params);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_structured_values() {
        let mut params = Vec::new();
        let result = Filter::eq("tags", serde_json::json!(["a"])).to_sql(&mut params);
        assert!(result.is_err());
    }

    #[test]
    fn empty_or_matches_nothing() {
        let mut params = Vec::new();
        assert_eq!(Filter::Or(vec![]).to_sql(&mut params).unwrap(), "0");
    }
}
