// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per entity.

pub mod movies;
pub mod users;

/// Store-assigned columns returned by an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStamp {
    pub id: i64,
    pub created_at: String,
    pub version: i64,
}

impl RecordStamp {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            version: row.get(2)?,
        })
    }
}
