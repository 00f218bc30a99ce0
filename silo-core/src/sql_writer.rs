use crate::{Column, ColumnType, Value, separated_by};
use std::fmt::Write;

/// Synthesizes the SQL text of every statement the layer issues.
///
/// All methods append into a caller-provided buffer. Values are embedded as
/// literals: the wire contract is plain statement text with no bound
/// parameters, so string-like literals are escaped here by doubling any
/// embedded single quote.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlWriter;

impl SqlWriter {
    pub fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_quoted(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    /// A filter value as a literal: strings and timestamps quoted, numbers
    /// and booleans bare, nulls as `null`.
    pub fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            Value::Varchar(Some(text)) => self.write_quoted(out, text),
            Value::Timestamp(Some(..)) => self.write_quoted(out, &value.to_string()),
            other => out.push_str(&other.to_string()),
        }
    }

    /// A column value as a literal, normalized through its column type
    /// first (JSON serialization of non-string input, fraction-less
    /// timestamps).
    pub fn write_typed_value(&self, out: &mut String, column: &Column, value: &Value) {
        if value.is_null() {
            out.push_str("null");
            return;
        }
        match column.ty {
            ColumnType::String(..) | ColumnType::CodeString(..) | ColumnType::DateTime => {
                self.write_quoted(out, &column.ty.format(value));
            }
            _ => out.push_str(&column.ty.format(value)),
        }
    }

    fn write_predicates(&self, out: &mut String, fields: &[(&str, Value)], combinator: &str) {
        separated_by(
            out,
            fields,
            |out, (name, value)| {
                out.push_str(name);
                out.push('=');
                self.write_value(out, value);
            },
            combinator,
        );
    }

    /// Flat `a=b AND c=d` predicate, used by every select-side filter.
    pub fn write_conjunction(&self, out: &mut String, fields: &[(&str, Value)]) {
        self.write_predicates(out, fields, " AND ");
    }

    /// Flat `a=b OR c=d` predicate. Deletion conditions are ORed, unlike
    /// the select-side conjunction; the two must stay distinct.
    pub fn write_disjunction(&self, out: &mut String, fields: &[(&str, Value)]) {
        self.write_predicates(out, fields, " OR ");
    }

    pub fn write_create_table(
        &self,
        out: &mut String,
        table: &str,
        columns: &[Column],
        unique_together: &[&str],
    ) {
        out.push_str("CREATE TABLE ");
        out.push_str(table);
        out.push_str(" (");
        separated_by(out, columns, |out, column| column.write_ddl(out), ", ");
        if !unique_together.is_empty() {
            out.push_str(", UNIQUE (");
            separated_by(out, unique_together, |out, name| out.push_str(name), ", ");
            out.push(')');
        }
        out.push(')');
    }

    pub fn write_table_exists(&self, out: &mut String, table: &str) {
        out.push_str(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE tables.table_name = ",
        );
        self.write_quoted(out, table);
        out.push(')');
    }

    /// Plain select; a non-empty suffix is appended verbatim, an explicit
    /// unsanitized escape hatch for trailing fragments such as ORDER BY.
    pub fn write_select(&self, out: &mut String, table: &str, suffix: &str) {
        out.push_str("SELECT * FROM ");
        out.push_str(table);
        if !suffix.is_empty() {
            out.push(' ');
            out.push_str(suffix);
        }
    }

    pub fn write_select_where(&self, out: &mut String, table: &str, fields: &[(&str, Value)]) {
        out.push_str("SELECT * FROM ");
        out.push_str(table);
        out.push_str(" WHERE ");
        self.write_conjunction(out, fields);
    }

    /// Naive cross-style join: the caller supplies the join predicates as
    /// part of `conditions`, and the projection is restricted to the
    /// primary table's own column names.
    pub fn write_select_join(
        &self,
        out: &mut String,
        projection: &[&str],
        table: &str,
        other_tables: &[&str],
        conditions: &[(&str, Value)],
    ) {
        out.push_str("SELECT ");
        separated_by(out, projection, |out, name| out.push_str(name), ", ");
        out.push_str(" FROM ");
        out.push_str(table);
        for other in other_tables {
            out.push_str(", ");
            out.push_str(other);
        }
        out.push_str(" WHERE ");
        self.write_conjunction(out, conditions);
    }

    /// Insert listing every schema column except the primary key, with each
    /// value formatted per its column type. `values` is aligned with the
    /// full schema order.
    pub fn write_insert(&self, out: &mut String, table: &str, columns: &[Column], values: &[Value]) {
        out.push_str("INSERT INTO ");
        out.push_str(table);
        out.push_str(" (");
        separated_by(
            out,
            columns.iter().filter(|column| !column.primary_key),
            |out, column| out.push_str(column.name),
            ", ",
        );
        out.push_str(") VALUES (");
        separated_by(
            out,
            columns.iter().zip(values).filter(|(c, ..)| !c.primary_key),
            |out, (column, value)| self.write_typed_value(out, column, value),
            ", ",
        );
        out.push(')');
    }

    /// The post-insert identifier read-back.
    pub fn write_last_id(&self, out: &mut String, table: &str, primary_key: &str) {
        let _ = write!(
            out,
            "SELECT {} FROM {} ORDER BY {} DESC LIMIT 1",
            primary_key, table, primary_key
        );
    }

    fn write_update_prefix(&self, out: &mut String, table: &str, sets: &[(&Column, Value)]) {
        out.push_str("UPDATE ");
        out.push_str(table);
        out.push_str(" SET ");
        separated_by(
            out,
            sets,
            |out, (column, value)| {
                out.push_str(column.name);
                out.push('=');
                self.write_typed_value(out, column, value);
            },
            ", ",
        );
    }

    pub fn write_update_by_id(
        &self,
        out: &mut String,
        table: &str,
        sets: &[(&Column, Value)],
        id: i64,
    ) {
        self.write_update_prefix(out, table, sets);
        let _ = write!(out, " WHERE id = {}", id);
    }

    pub fn write_update_where(
        &self,
        out: &mut String,
        table: &str,
        sets: &[(&Column, Value)],
        fields: &[(&str, Value)],
    ) {
        self.write_update_prefix(out, table, sets);
        out.push_str(" WHERE ");
        self.write_conjunction(out, fields);
    }

    pub fn write_delete_by_id(&self, out: &mut String, table: &str, id: i64) {
        let _ = write!(out, "DELETE FROM {} WHERE id={}", table, id);
    }

    pub fn write_delete_where(&self, out: &mut String, table: &str, fields: &[(&str, Value)]) {
        out.push_str("DELETE FROM ");
        out.push_str(table);
        out.push_str(" WHERE ");
        self.write_disjunction(out, fields);
    }

    pub fn write_count(&self, out: &mut String, table: &str, fields: &[(&str, Value)]) {
        out.push_str("SELECT COUNT(*) FROM ");
        out.push_str(table);
        if !fields.is_empty() {
            out.push_str(" WHERE ");
            self.write_conjunction(out, fields);
        }
    }

    pub fn write_group_by(
        &self,
        out: &mut String,
        table: &str,
        column: &str,
        fields: &[(&str, Value)],
    ) {
        let _ = write!(out, "SELECT {}, COUNT(*) FROM {}", column, table);
        if !fields.is_empty() {
            out.push_str(" WHERE ");
            self.write_conjunction(out, fields);
        }
        let _ = write!(out, " GROUP BY {}", column);
    }
}
