use crate::{Column, Error, Executor, Result, RowLabeled, RowNames, RowsAffected, SqlWriter, Value};
use std::collections::BTreeMap;
use std::future::Future;

/// The contract a record type implements to become a mapped table.
///
/// A concrete entity declares its table name and ordered schema once; the
/// trait supplies DDL application and the whole CRUD surface on top of any
/// [`Executor`]. Schema order determines both DDL column order and the
/// positional mapping used when rehydrating rows.
pub trait Entity: Sized + Send + Sync {
    fn table() -> &'static str;

    /// The ordered column descriptors. At most one column may be a primary
    /// key, named `id` by convention.
    fn schema() -> &'static [Column];

    /// Rehydrates an instance from a labeled row. Values may still be in
    /// the store's text form; the [`AsValue`](crate::AsValue) conversions
    /// behind [`RowLabeled::decode`] take care of both.
    fn from_row(row: &RowLabeled) -> Result<Self>;

    /// Current field values, aligned with `schema()` order.
    fn values(&self) -> Vec<Value>;

    /// Assigns one field by column name.
    fn set(&mut self, column: &str, value: Value) -> Result<()>;

    /// Column names combined into a table-level UNIQUE constraint.
    fn unique_together() -> &'static [&'static str] {
        &[]
    }

    /// Keys always excluded from [`Entity::to_map`].
    fn restricted_keys() -> &'static [&'static str] {
        &[]
    }

    /// Keys excluded from [`Entity::to_map`] unless explicitly requested.
    fn soft_restricted_keys() -> &'static [&'static str] {
        &[]
    }

    fn in_schema(name: &str) -> bool {
        Self::schema().iter().any(|column| column.name == name)
    }

    fn primary_key() -> Option<&'static Column> {
        Self::schema().iter().find(|column| column.primary_key)
    }

    /// The primary-key value once persisted.
    fn id(&self) -> Option<i64> {
        let index = Self::schema().iter().position(|column| column.primary_key)?;
        match self.values().get(index) {
            Some(Value::Integer(id)) => *id,
            _ => None,
        }
    }

    /// The current value of one named field.
    fn value_of(&self, column: &str) -> Option<Value> {
        let index = Self::schema().iter().position(|c| c.name == column)?;
        self.values().into_iter().nth(index)
    }

    /// Constructs an instance from named values. Absent columns take their
    /// declared default; a missing required, non-default, non-primary-key
    /// column fails with [`Error::MissingField`]. Provided values are taken
    /// verbatim, without validation.
    fn build(fields: &[(&str, Value)]) -> Result<Self> {
        let schema = Self::schema();
        let mut values = Vec::with_capacity(schema.len());
        for column in schema {
            match fields.iter().find(|(name, ..)| *name == column.name) {
                Some((.., value)) => values.push(value.clone()),
                None => match &column.default {
                    Some(default) => values.push(default.clone()),
                    None if column.required && !column.primary_key => {
                        return Err(Error::MissingField(column.name));
                    }
                    None => values.push(Value::Null),
                },
            }
        }
        let labels: RowNames = schema
            .iter()
            .map(|column| column.name.to_string())
            .collect::<Vec<_>>()
            .into();
        Self::from_row(&RowLabeled::new(labels, values.into()))
    }

    fn from_rows(rows: Vec<RowLabeled>) -> Result<Vec<Self>> {
        rows.iter().map(Self::from_row).collect()
    }

    /// Plain-mapping projection of the instance. Hard-restricted keys are
    /// always left out; soft-restricted keys only when `include_soft` is
    /// false.
    fn to_map(&self, include_soft: bool) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        for (column, value) in Self::schema().iter().zip(self.values()) {
            if Self::restricted_keys().contains(&column.name) {
                continue;
            }
            if !include_soft && Self::soft_restricted_keys().contains(&column.name) {
                continue;
            }
            map.insert(column.name.to_string(), (&value).into());
        }
        map
    }

    /// Idempotent DDL application: probes the information schema first and
    /// only issues CREATE TABLE when the table is absent.
    fn create_table<Exec: Executor>(executor: &mut Exec) -> impl Future<Output = Result<()>> + Send {
        async move {
            let mut sql = String::new();
            SqlWriter.write_table_exists(&mut sql, Self::table());
            let rows = executor.fetch(sql).await?;
            let exists = rows
                .first()
                .map(|row| row.decode::<bool>("exists"))
                .transpose()?
                .unwrap_or(false);
            if exists {
                log::info!("{} table already exists", Self::table());
                return Ok(());
            }
            let mut sql = String::with_capacity(256);
            SqlWriter.write_create_table(
                &mut sql,
                Self::table(),
                Self::schema(),
                Self::unique_together(),
            );
            executor.execute(sql).await?;
            log::info!("{} table created", Self::table());
            Ok(())
        }
    }

    /// Fetches exactly one row by primary key. Absence is a caller bug and
    /// reads as [`Error::Fatal`], not the not-found condition.
    fn get_by_id<Exec: Executor>(
        executor: &mut Exec,
        id: i64,
    ) -> impl Future<Output = Result<Self>> + Send {
        async move {
            let mut sql = String::new();
            SqlWriter.write_select_where(&mut sql, Self::table(), &[("id", id.into())]);
            let rows = executor.fetch(sql).await?;
            match rows.first() {
                Some(row) => Self::from_row(row),
                None => Err(Error::Fatal(format!(
                    "no {} row with id {}",
                    Self::table(),
                    id
                ))),
            }
        }
    }

    fn get_all<Exec: Executor>(
        executor: &mut Exec,
    ) -> impl Future<Output = Result<Vec<Self>>> + Send {
        Self::get_all_with(executor, "")
    }

    /// `suffix` is appended to the statement verbatim — a raw escape hatch
    /// for trailing fragments such as ORDER BY, not sanitized.
    fn get_all_with<'a, Exec: Executor>(
        executor: &'a mut Exec,
        suffix: &'a str,
    ) -> impl Future<Output = Result<Vec<Self>>> + Send {
        async move {
            let mut sql = String::new();
            SqlWriter.write_select(&mut sql, Self::table(), suffix);
            Self::from_rows(executor.fetch(sql).await?)
        }
    }

    fn get_by_field_value<'a, Exec: Executor>(
        executor: &'a mut Exec,
        field: &'a str,
        value: Value,
    ) -> impl Future<Output = Result<Vec<Self>>> + Send {
        async move {
            let mut sql = String::new();
            SqlWriter.write_select_where(&mut sql, Self::table(), &[(field, value)]);
            Self::from_rows(executor.fetch(sql).await?)
        }
    }

    /// Conjunction filter: all field/value pairs must match. An empty set
    /// of pairs falls back to fetching everything. No match yields an empty
    /// sequence, not an error.
    fn get_by_many_field_value<'a, Exec: Executor>(
        executor: &'a mut Exec,
        fields: &'a [(&'a str, Value)],
    ) -> impl Future<Output = Result<Vec<Self>>> + Send {
        async move {
            if fields.is_empty() {
                return Self::get_all(executor).await;
            }
            let mut sql = String::new();
            SqlWriter.write_select_where(&mut sql, Self::table(), fields);
            Self::from_rows(executor.fetch(sql).await?)
        }
    }

    /// Naive cross-style join over this table and `other_tables`; the
    /// caller supplies join predicates through `conditions`. The projection
    /// is restricted to this entity's own schema columns.
    fn get_by_join<'a, Exec: Executor>(
        executor: &'a mut Exec,
        other_tables: &'a [&'a str],
        conditions: &'a [(&'a str, Value)],
    ) -> impl Future<Output = Result<Vec<Self>>> + Send {
        async move {
            let projection: Vec<&str> = Self::schema().iter().map(|column| column.name).collect();
            let mut sql = String::new();
            SqlWriter.write_select_join(
                &mut sql,
                &projection,
                Self::table(),
                other_tables,
                conditions,
            );
            Self::from_rows(executor.fetch(sql).await?)
        }
    }

    /// Deletes every row matching ANY of the given pairs: deletion
    /// conditions are a disjunction, deliberately unlike the select-side
    /// conjunction.
    fn delete_by_many_fields<'a, Exec: Executor>(
        executor: &'a mut Exec,
        fields: &'a [(&'a str, Value)],
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            if fields.is_empty() {
                return Err(Error::Schema(format!(
                    "refusing to delete from {} without a predicate",
                    Self::table()
                )));
            }
            let mut sql = String::new();
            SqlWriter.write_delete_where(&mut sql, Self::table(), fields);
            executor.execute(sql).await
        }
    }

    /// First match of [`Entity::get_by_many_field_value`];
    /// [`Error::NotFound`] when nothing matches.
    fn get_first_by_many_field_value<'a, Exec: Executor>(
        executor: &'a mut Exec,
        fields: &'a [(&'a str, Value)],
    ) -> impl Future<Output = Result<Self>> + Send {
        async move {
            let rows = Self::get_by_many_field_value(executor, fields).await?;
            rows.into_iter().next().ok_or(Error::NotFound)
        }
    }

    /// First match of [`Entity::get_by_field_value`]; [`Error::NotFound`]
    /// when nothing matches.
    fn get_first<'a, Exec: Executor>(
        executor: &'a mut Exec,
        field: &'a str,
        value: Value,
    ) -> impl Future<Output = Result<Self>> + Send {
        async move {
            let rows = Self::get_by_field_value(executor, field, value).await?;
            rows.into_iter().next().ok_or(Error::NotFound)
        }
    }

    /// Inserts every schema column except the primary key, then reads back
    /// the highest identifier in the table as the assigned id. The
    /// read-back assumes no concurrent inserts into the same table; under
    /// concurrency it can observe a later row's id.
    fn create<Exec: Executor>(
        &self,
        executor: &mut Exec,
    ) -> impl Future<Output = Result<Option<i64>>> + Send {
        async move {
            let mut sql = String::with_capacity(256);
            SqlWriter.write_insert(&mut sql, Self::table(), Self::schema(), &self.values());
            executor.execute(sql).await?;
            let Some(primary_key) = Self::primary_key() else {
                return Ok(None);
            };
            let mut sql = String::new();
            SqlWriter.write_last_id(&mut sql, Self::table(), primary_key.name);
            let rows = executor.fetch(sql).await?;
            let row = rows.first().ok_or_else(|| {
                Error::Fatal(format!("{} id read-back returned no rows", Self::table()))
            })?;
            Ok(Some(row.decode::<i64>(primary_key.name)?))
        }
    }

    /// Looks up an existing row by the given key fields (values taken from
    /// this instance). Found rows are updated in place and reported as
    /// `(id, true)`; otherwise a new row is created and reported as
    /// `(new_id, false)`.
    fn update_or_create<'a, Exec: Executor>(
        &'a self,
        executor: &'a mut Exec,
        key_fields: &'a [&'a str],
    ) -> impl Future<Output = Result<(Option<i64>, bool)>> + Send {
        async move {
            let mut keys = Vec::with_capacity(key_fields.len());
            for key in key_fields {
                let value = self
                    .value_of(key)
                    .ok_or_else(|| Error::Schema(format!("unknown column {}", key)))?;
                keys.push((*key, value));
            }
            match Self::get_first_by_many_field_value(executor, &keys).await {
                Ok(existing) => {
                    existing.update(executor, &keys).await?;
                    Ok((existing.id(), true))
                }
                Err(Error::NotFound) => Ok((self.create(executor).await?, false)),
                Err(error) => Err(error),
            }
        }
    }

    /// Writes this instance back. A persisted instance updates by id and
    /// `conditions` is ignored; an unpersisted one updates by the
    /// conjunction of `conditions`. Only columns that are truthy or
    /// required take part in the SET clause; the primary key and columns
    /// named with the `time_created` prefix never do.
    fn update<'a, Exec: Executor>(
        &'a self,
        executor: &'a mut Exec,
        conditions: &'a [(&'a str, Value)],
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            let values = self.values();
            let sets: Vec<(&Column, Value)> = Self::schema()
                .iter()
                .zip(&values)
                .filter(|(column, value)| {
                    !column.primary_key
                        && !column.name.starts_with("time_created")
                        && (column.required || value.is_truthy())
                })
                .map(|(column, value)| (column, value.clone()))
                .collect();
            let mut sql = String::with_capacity(256);
            match self.id() {
                Some(id) => SqlWriter.write_update_by_id(&mut sql, Self::table(), &sets, id),
                None => SqlWriter.write_update_where(&mut sql, Self::table(), &sets, conditions),
            }
            executor.execute(sql).await
        }
    }

    /// Applies the keys of `data` that are declared in the schema and are
    /// in neither restricted set, then writes the instance back.
    fn update_from_dict<'a, Exec: Executor>(
        &'a mut self,
        executor: &'a mut Exec,
        data: &'a serde_json::Map<String, serde_json::Value>,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            for (key, value) in data {
                let restricted = Self::restricted_keys().contains(&key.as_str())
                    || Self::soft_restricted_keys().contains(&key.as_str());
                if Self::in_schema(key) && !restricted {
                    self.set(key, value.clone().into())?;
                }
            }
            self.update(executor, &[]).await
        }
    }

    /// Deletes the row behind this instance. Failures are logged and
    /// reported as `false`, never propagated; the instance itself is left
    /// stale.
    fn delete<Exec: Executor>(&self, executor: &mut Exec) -> impl Future<Output = bool> + Send {
        async move {
            match self.id() {
                Some(id) => Self::delete_by_id(executor, id).await,
                None => {
                    log::error!("could not delete {}: instance has no id", Self::table());
                    false
                }
            }
        }
    }

    fn delete_by_id<Exec: Executor>(
        executor: &mut Exec,
        id: i64,
    ) -> impl Future<Output = bool> + Send {
        async move {
            let mut sql = String::new();
            SqlWriter.write_delete_by_id(&mut sql, Self::table(), id);
            match executor.execute(sql).await {
                Ok(..) => true,
                Err(Error::IntegrityViolation(error)) => {
                    log::error!("could not delete {} id: {}: {}", Self::table(), id, error);
                    false
                }
                Err(error) => {
                    log::error!("could not delete: {}", error);
                    false
                }
            }
        }
    }

    fn count_all<Exec: Executor>(executor: &mut Exec) -> impl Future<Output = Result<i64>> + Send {
        async move {
            let mut sql = String::new();
            SqlWriter.write_count(&mut sql, Self::table(), &[]);
            Self::read_count(executor.fetch(sql).await?)
        }
    }

    fn count_by_field<'a, Exec: Executor>(
        executor: &'a mut Exec,
        fields: &'a [(&'a str, Value)],
    ) -> impl Future<Output = Result<i64>> + Send {
        async move {
            let mut sql = String::new();
            SqlWriter.write_count(&mut sql, Self::table(), fields);
            Self::read_count(executor.fetch(sql).await?)
        }
    }

    fn read_count(rows: Vec<RowLabeled>) -> Result<i64> {
        let row = rows
            .first()
            .ok_or_else(|| Error::Fatal(format!("{} count returned no rows", Self::table())))?;
        row.decode::<i64>("count")
    }

    /// Mapping from each grouped value (in its text form) to its count.
    fn group_by_field<'a, Exec: Executor>(
        executor: &'a mut Exec,
        column: &'a str,
        fields: &'a [(&'a str, Value)],
    ) -> impl Future<Output = Result<BTreeMap<String, i64>>> + Send {
        async move {
            let mut sql = String::new();
            SqlWriter.write_group_by(&mut sql, Self::table(), column, fields);
            let rows = executor.fetch(sql).await?;
            let mut groups = BTreeMap::new();
            for row in &rows {
                let key = row
                    .values()
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "null".into());
                groups.insert(key, row.decode::<i64>("count")?);
            }
            Ok(groups)
        }
    }
}
