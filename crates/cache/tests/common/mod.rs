//! Common test utilities for the row cache integration tests
#![allow(dead_code)]

use rowmirror_cache::{Error, Parameter, Result, Row, RowCache, RowSource, RowWriter, Value};

/// In-memory source serving pages out of a fixed row list
pub struct FixtureSource {
    pub rows: Vec<Row>,
    pub fail: bool,
    pub fetches: usize,
    pub last_command: Option<String>,
    pub last_params: Vec<Parameter>,
}

impl FixtureSource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            fail: false,
            fetches: 0,
            last_command: None,
            last_params: Vec::new(),
        }
    }
}

impl RowSource for FixtureSource {
    fn fetch_page(
        &mut self,
        command: &str,
        params: &[Parameter],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>> {
        if self.fail {
            return Err(Error::Adapter("source unavailable".to_string()));
        }
        self.fetches += 1;
        self.last_command = Some(command.to_string());
        self.last_params = params.to_vec();

        if offset >= self.rows.len() {
            return Ok(Vec::new());
        }
        let end = if limit == 0 {
            self.rows.len()
        } else {
            self.rows.len().min(offset + limit)
        };
        Ok(self.rows[offset..end].to_vec())
    }
}

/// In-memory writer modeling the backing table, with failure injection
pub struct MockWriter {
    pub table: Vec<Row>,
    pub fail_inserts: bool,
    pub fail_updates: bool,
    pub commits: usize,
    pub rollbacks: usize,
    pub savepoints: Vec<String>,
}

impl MockWriter {
    pub fn new(table: Vec<Row>) -> Self {
        Self {
            table,
            fail_inserts: false,
            fail_updates: false,
            commits: 0,
            rollbacks: 0,
            savepoints: Vec::new(),
        }
    }

    fn position(&self, key_columns: &[usize], original: &Row) -> Option<usize> {
        self.table.iter().position(|row| {
            if key_columns.is_empty() {
                row == original
            } else {
                key_columns.iter().all(|&c| row[c] == original[c])
            }
        })
    }
}

impl RowWriter for MockWriter {
    fn insert(&mut self, row: &Row) -> Result<()> {
        if self.fail_inserts {
            return Err(Error::Adapter("insert rejected".to_string()));
        }
        self.table.push(row.clone());
        Ok(())
    }

    fn update(&mut self, key_columns: &[usize], original: &Row, current: &Row) -> Result<()> {
        if self.fail_updates {
            return Err(Error::Adapter("update rejected".to_string()));
        }
        match self.position(key_columns, original) {
            Some(index) => {
                self.table[index] = current.clone();
                Ok(())
            }
            None => Err(Error::Adapter("row not found".to_string())),
        }
    }

    fn delete(&mut self, key_columns: &[usize], original: &Row) -> Result<()> {
        match self.position(key_columns, original) {
            Some(index) => {
                self.table.remove(index);
                Ok(())
            }
            None => Err(Error::Adapter("row not found".to_string())),
        }
    }

    fn current_value_at(&mut self, key_columns: &[usize], original: &Row) -> Result<Option<Row>> {
        Ok(self
            .position(key_columns, original)
            .map(|index| self.table[index].clone()))
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.rollbacks += 1;
        Ok(())
    }

    fn rollback_to(&mut self, savepoint: &str) -> Result<()> {
        self.savepoints.push(savepoint.to_string());
        Ok(())
    }
}

/// Two-column row: integer id and string name
pub fn row2(id: i64, name: &str) -> Row {
    vec![Value::I64(id), Value::string(name)]
}

/// Source holding [(1,"a"), (2,"b"), (3,"c")]
pub fn abc_source() -> FixtureSource {
    FixtureSource::new(vec![row2(1, "a"), row2(2, "b"), row2(3, "c")])
}

/// Cache with command and key column set, populated from `source`
pub fn populated_cache(source: &mut FixtureSource) -> RowCache {
    let mut cache = RowCache::new();
    cache.set_command("SELECT id, name FROM people");
    cache.set_key_columns(vec![0]).unwrap();
    cache.populate(source, 0).unwrap();
    cache
}

/// Writer whose table mirrors the source contents
pub fn matching_writer(source: &FixtureSource) -> MockWriter {
    MockWriter::new(source.rows.clone())
}
