//! Database schema definitions using sea-query.
//!
//! Every entity kind shares one table; rows are told apart by `kind`.
//!
//! Index fields live inside the JSON `document`, so list and count read every
//! row of a kind and filter after decoding. A sweep over unfinished records
//! therefore costs O(all records of the kind), finished history included.

use sea_query::Iden;

/// Entities table schema.
#[derive(Iden)]
pub enum Entities {
    Table,
    #[iden = "seq"]
    Seq,
    #[iden = "kind"]
    Kind,
    #[iden = "primary_key"]
    PrimaryKey,
    #[iden = "document"]
    Document,
    #[iden = "created_at"]
    CreatedAt,
}

/// SQL for creating the entities table.
pub const CREATE_ENTITIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    primary_key TEXT NOT NULL,
    document TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (kind, primary_key)
);

CREATE INDEX IF NOT EXISTS idx_entities_kind ON entities(kind);
"#;
