// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;
use std::path::PathBuf;

use leasecraft_core::progress::store::KeyValue;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::error::ErrorReport;
use crate::error::Fallible;

/// File name of the progress database inside the data directory.
pub const DB_FILE: &str = "leasecraft.db";

const SCHEMA: &str = "
    create table if not exists kv (
        key text primary key,
        value text not null
    ) strict;
";

/// A string key-value table in SQLite.
pub struct Database {
    conn: Connection,
}

fn db_error(e: rusqlite::Error) -> ErrorReport {
    ErrorReport::new(format!("Database error: {e}"))
}

impl Database {
    pub fn new(path: &Path) -> Fallible<Self> {
        let conn = Connection::open(path).map_err(db_error)?;
        Self::init(conn)
    }

    /// Open the database in a data directory, creating both if necessary.
    pub fn in_directory(directory: Option<String>) -> Fallible<Self> {
        let directory = PathBuf::from(directory.unwrap_or_else(|| ".".to_string()));
        std::fs::create_dir_all(&directory)?;
        let path = directory.join(DB_FILE);
        log::debug!("Opening database at {}", path.display());
        Self::new(&path)
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Fallible<Self> {
        conn.execute_batch(SCHEMA).map_err(db_error)?;
        Ok(Self { conn })
    }
}

impl KeyValue for Database {
    fn get(&self, key: &str) -> Fallible<Option<String>> {
        self.conn
            .query_row("select value from kv where key = ?", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(db_error)
    }

    fn set(&mut self, key: &str, value: &str) -> Fallible<()> {
        self.conn
            .execute(
                "insert into kv (key, value) values (?1, ?2)
                 on conflict (key) do update set value = excluded.value",
                params![key, value],
            )
            .map_err(db_error)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Fallible<()> {
        self.conn
            .execute("delete from kv where key = ?", [key])
            .map_err(db_error)?;
        Ok(())
    }
}
