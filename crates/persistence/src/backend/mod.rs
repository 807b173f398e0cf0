// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database backend utilities.
//!
//! Only `SQLite` is supported. Everything that cannot be expressed in Diesel
//! DSL (PRAGMA statements, `last_insert_rowid()`) lives in [`sqlite`]; all
//! domain queries and mutations live in `queries/` and `mutations/`.

pub mod sqlite;
