//! Subcommands and filter-argument parsing for the CLI

use clap::Subcommand;

use rowcache::model::{Filters, Value};

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
  /// List tables in the configured schema
  #[command(visible_alias = "t")]
  Tables,

  /// Check whether the configured schema exists
  SchemaExists,

  /// Create the configured schema
  CreateSchema,

  /// Print the first row matching the filters
  #[command(visible_alias = "g")]
  Get {
    table: String,
    /// Filters as col=value
    #[arg(value_parser = parse_filter)]
    filters: Vec<(String, Value)>,
  },

  /// Print every row matching the filters
  #[command(visible_alias = "ls")]
  List {
    table: String,
    #[arg(value_parser = parse_filter)]
    filters: Vec<(String, Value)>,
  },

  /// Delete rows matching the filters
  #[command(visible_alias = "rm")]
  Delete {
    table: String,
    #[arg(value_parser = parse_filter)]
    filters: Vec<(String, Value)>,
    /// Delete at most this many rows
    #[arg(long)]
    limit: Option<u64>,
    /// Skip this many matching rows first (requires --limit)
    #[arg(long, requires = "limit")]
    offset: Option<u64>,
  },

  /// Drop a table
  Drop { table: String },
}

/// Collect parsed filter arguments.
pub fn to_filters(pairs: &[(String, Value)]) -> Filters {
  pairs.iter().cloned().collect()
}

/// Parse a `col=value` argument.
///
/// The value is inferred: `null`, `true`/`false`, integers, finite floats,
/// `'quoted text'`, and anything else as bare text.
pub fn parse_filter(arg: &str) -> Result<(String, Value), String> {
  let (column, raw) = arg
    .split_once('=')
    .ok_or_else(|| format!("expected col=value, got '{}'", arg))?;
  let column = column.trim();
  if column.is_empty() {
    return Err(format!("missing column name in '{}'", arg));
  }
  Ok((column.to_string(), infer_value(raw)))
}

fn infer_value(raw: &str) -> Value {
  if raw.eq_ignore_ascii_case("null") {
    return Value::Null;
  }
  if raw.eq_ignore_ascii_case("true") {
    return Value::Bool(true);
  }
  if raw.eq_ignore_ascii_case("false") {
    return Value::Bool(false);
  }
  if let Ok(i) = raw.parse::<i64>() {
    return Value::Int(i);
  }
  if let Some(f) = raw.parse::<f64>().ok().filter(|f| f.is_finite()) {
    return Value::Float(f);
  }
  if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
    return Value::Text(raw[1..raw.len() - 1].to_string());
  }
  Value::Text(raw.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_value_inference() {
    assert_eq!(parse_filter("a=null").unwrap().1, Value::Null);
    assert_eq!(parse_filter("a=TRUE").unwrap().1, Value::Bool(true));
    assert_eq!(parse_filter("a=42").unwrap().1, Value::Int(42));
    assert_eq!(parse_filter("a=-1.5").unwrap().1, Value::Float(-1.5));
    assert_eq!(parse_filter("a=bob").unwrap().1, Value::from("bob"));
  }

  #[test]
  fn test_quoted_text_stays_text() {
    assert_eq!(parse_filter("a='42'").unwrap().1, Value::from("42"));
    assert_eq!(parse_filter("a=''").unwrap().1, Value::from(""));
    assert_eq!(parse_filter("a=inf").unwrap().1, Value::from("inf"));
  }

  #[test]
  fn test_value_may_contain_equals() {
    let (column, value) = parse_filter("expr=a=b").unwrap();
    assert_eq!(column, "expr");
    assert_eq!(value, Value::from("a=b"));
  }

  #[test]
  fn test_malformed_filters() {
    assert!(parse_filter("novalue").is_err());
    assert!(parse_filter("=5").is_err());
  }

  #[test]
  fn test_to_filters() {
    let pairs = vec![
      parse_filter("id=1").unwrap(),
      parse_filter("name=amy").unwrap(),
    ];
    let filters = to_filters(&pairs);
    assert_eq!(filters.len(), 2);
    assert_eq!(filters.get("id"), Some(&Value::Int(1)));
  }
}
