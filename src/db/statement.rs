//! SQL text assembly.
//!
//! Statements are plain text: values are spliced in as literals, never bound
//! as parameters. Identifiers (schema, table, column names) are written as
//! given.

use crate::model::{Filters, Row, Value};

/// Row-count restriction for deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
  Count(u64),
  Range { offset: u64, count: u64 },
}

impl From<u64> for Limit {
  fn from(count: u64) -> Self {
    Limit::Count(count)
  }
}

impl From<(u64, u64)> for Limit {
  fn from((offset, count): (u64, u64)) -> Self {
    Limit::Range { offset, count }
  }
}

/// `" WHERE a = 1 AND b = 'x'"`, or the empty string for no filters.
pub fn and_convert(filters: &Filters) -> String {
  if filters.is_empty() {
    return String::new();
  }
  let clauses: Vec<String> = filters
    .iter()
    .map(|(column, value)| format!("{} = {}", column, value.sql_literal()))
    .collect();
  format!(" WHERE {}", clauses.join(" AND "))
}

pub fn select(schema: &str, table: &str, filters: &Filters, single: bool) -> String {
  let mut query = format!("SELECT * FROM {}.{}{}", schema, table, and_convert(filters));
  if single {
    query.push_str(" LIMIT 1");
  }
  query.push(';');
  query
}

/// One `col = value` assignment per column of every row.
pub fn update<'a>(
  schema: &str,
  table: &str,
  rows: impl IntoIterator<Item = &'a Row>,
  filters: &Filters,
) -> Option<String> {
  let assignments: Vec<String> = rows
    .into_iter()
    .flat_map(|row| row.iter())
    .map(|(column, value)| format!("{} = {}", column, value.sql_literal()))
    .collect();
  if assignments.is_empty() {
    return None;
  }
  Some(format!(
    "UPDATE {}.{} SET {}{};",
    schema,
    table,
    assignments.join(", "),
    and_convert(filters)
  ))
}

pub fn insert(schema: &str, table: &str, row: &Row) -> Option<String> {
  if row.is_empty() {
    return None;
  }
  let values: Vec<String> = row.values().iter().map(|v| v.sql_literal()).collect();
  Some(format!(
    "INSERT INTO {}.{} ({}) VALUES ({});",
    schema,
    table,
    row.columns().join(","),
    values.join(",")
  ))
}

/// PostgreSQL's `DELETE` has no `LIMIT`; a limited delete goes through the
/// `ctid` of the matching rows instead.
pub fn delete(schema: &str, table: &str, filters: &Filters, limit: Option<Limit>) -> String {
  let target = format!("{}.{}", schema, table);
  let filter = and_convert(filters);
  match limit {
    None => format!("DELETE FROM {}{};", target, filter),
    Some(limit) => {
      let window = match limit {
        Limit::Count(count) => format!("LIMIT {}", count),
        Limit::Range { offset, count } => format!("LIMIT {} OFFSET {}", count, offset),
      };
      format!(
        "DELETE FROM {t} WHERE ctid IN (SELECT ctid FROM {t}{f} {w});",
        t = target,
        f = filter,
        w = window
      )
    }
  }
}

pub fn drop_table(schema: &str, table: &str) -> String {
  format!("DROP TABLE {}.{};", schema, table)
}

pub fn drop_column(schema: &str, table: &str, column: &str) -> String {
  format!("ALTER TABLE {}.{} DROP COLUMN {};", schema, table, column)
}

pub fn add_column(
  schema: &str,
  table: &str,
  column: &str,
  column_type: &str,
  default: Option<&str>,
) -> String {
  let default = default
    .map(|d| format!(" DEFAULT {}", d))
    .unwrap_or_default();
  format!(
    "ALTER TABLE {}.{} ADD COLUMN {} {}{};",
    schema, table, column, column_type, default
  )
}

pub fn create_table(schema: &str, table: &str, columns: &[(&str, &str)]) -> String {
  let definitions: Vec<String> = columns
    .iter()
    .map(|(name, ty)| format!("{} {}", name, ty))
    .collect();
  format!(
    "CREATE TABLE {}.{} ({});",
    schema,
    table,
    definitions.join(",\n")
  )
}

pub fn list_tables(schema: &str) -> String {
  format!(
    "SELECT table_name FROM information_schema.tables WHERE table_schema = {};",
    Value::from(schema).sql_literal()
  )
}

pub fn schema_exists(schema: &str) -> String {
  format!(
    "SELECT exists(SELECT schema_name FROM information_schema.schemata WHERE schema_name = {});",
    Value::from(schema).sql_literal()
  )
}

pub fn create_schema(schema: &str) -> String {
  format!("CREATE SCHEMA {};", schema)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::RowKind;

  static USER: RowKind = RowKind::new("user", Some("users"), &["id", "name"]);

  fn user(id: i64, name: &str) -> Row {
    Row::new(&USER, vec![id.into(), name.into()]).unwrap()
  }

  #[test]
  fn test_and_convert() {
    assert_eq!(and_convert(&Filters::new()), "");
    assert_eq!(and_convert(&Filters::new().with("id", 1)), " WHERE id = 1");
    assert_eq!(
      and_convert(&Filters::new().with("name", "bob").with("id", 1)),
      " WHERE id = 1 AND name = 'bob'"
    );
  }

  #[test]
  fn test_select() {
    let f = Filters::new().with("id", 3);
    assert_eq!(
      select("app", "users", &f, true),
      "SELECT * FROM app.users WHERE id = 3 LIMIT 1;"
    );
    assert_eq!(
      select("app", "users", &Filters::new(), false),
      "SELECT * FROM app.users;"
    );
  }

  #[test]
  fn test_update_quotes_text_only() {
    let rows = [user(1, "o'neil")];
    let sql = update("app", "users", &rows, &Filters::new().with("id", 1)).unwrap();
    assert_eq!(
      sql,
      "UPDATE app.users SET id = 1, name = 'o''neil' WHERE id = 1;"
    );
  }

  #[test]
  fn test_update_without_columns() {
    let rows: Vec<Row> = Vec::new();
    assert!(update("app", "users", &rows, &Filters::new()).is_none());
  }

  #[test]
  fn test_insert() {
    assert_eq!(
      insert("app", "users", &user(2, "amy")).unwrap(),
      "INSERT INTO app.users (id,name) VALUES (2,'amy');"
    );
  }

  #[test]
  fn test_insert_null() {
    let row = Row::new(&USER, vec![5.into(), Value::Null]).unwrap();
    assert_eq!(
      insert("app", "users", &row).unwrap(),
      "INSERT INTO app.users (id,name) VALUES (5,NULL);"
    );
  }

  #[test]
  fn test_delete_variants() {
    let f = Filters::new().with("id", 5);
    assert_eq!(
      delete("app", "users", &f, None),
      "DELETE FROM app.users WHERE id = 5;"
    );
    assert_eq!(
      delete("app", "users", &f, Some(Limit::from(2u64))),
      "DELETE FROM app.users WHERE ctid IN (SELECT ctid FROM app.users WHERE id = 5 LIMIT 2);"
    );
    assert_eq!(
      delete("app", "users", &Filters::new(), Some(Limit::from((10u64, 3u64)))),
      "DELETE FROM app.users WHERE ctid IN (SELECT ctid FROM app.users LIMIT 3 OFFSET 10);"
    );
  }

  #[test]
  fn test_schema_changes() {
    assert_eq!(drop_table("app", "users"), "DROP TABLE app.users;");
    assert_eq!(
      drop_column("app", "users", "name"),
      "ALTER TABLE app.users DROP COLUMN name;"
    );
    assert_eq!(
      add_column("app", "users", "age", "integer", Some("0")),
      "ALTER TABLE app.users ADD COLUMN age integer DEFAULT 0;"
    );
    assert_eq!(
      add_column("app", "users", "bio", "text", None),
      "ALTER TABLE app.users ADD COLUMN bio text;"
    );
    assert_eq!(
      create_table("app", "users", &[("id", "integer"), ("name", "text")]),
      "CREATE TABLE app.users (id integer,\nname text);"
    );
  }

  #[test]
  fn test_catalog_queries_quote_schema() {
    assert!(list_tables("app").ends_with("table_schema = 'app';"));
    assert!(schema_exists("app").contains("schema_name = 'app'"));
  }
}
