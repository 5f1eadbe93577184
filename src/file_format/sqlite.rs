//! Relational export for ad-hoc querying.  Ids are the database's own 0-based
//! indices; absent references are NULL.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{params, Connection};

use crate::db::{FileIdx, NodeIdx, SymbolDb, TokenIdx, TypeIdx};
use crate::errors::Result;
use crate::file_utils::staging_file_for;
use crate::kinds::CursorKind;

const SCHEMA: &str = r#"
    CREATE TABLE SourceFiles (
        Id INTEGER PRIMARY KEY,
        Path TEXT NOT NULL
    );

    CREATE TABLE Tokens (
        Id INTEGER PRIMARY KEY,
        Text TEXT NOT NULL
    );

    CREATE TABLE Kinds (
        Id INTEGER PRIMARY KEY,
        Name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE Types (
        Id INTEGER PRIMARY KEY,
        Hash INTEGER NOT NULL,
        TokenId INTEGER,
        Kind TEXT,
        IsConst INTEGER,
        FOREIGN KEY(TokenId) REFERENCES Tokens(Id)
    );

    CREATE TABLE TypeChildren (
        TypeId INTEGER,
        Position INTEGER,
        ChildId INTEGER,
        FOREIGN KEY(TypeId) REFERENCES Types(Id),
        FOREIGN KEY(ChildId) REFERENCES Types(Id)
    );

    CREATE TABLE Nodes (
        Id INTEGER PRIMARY KEY,
        CompilingFileId INTEGER,
        ParentId INTEGER,
        ReferencedId INTEGER,
        KindId INTEGER,
        Flags INTEGER,
        TypeId INTEGER,
        TokenId INTEGER,
        Line INTEGER,
        ColumnNumber INTEGER,
        StartOffset INTEGER,
        EndOffset INTEGER,
        SourceFileId INTEGER,
        FOREIGN KEY(CompilingFileId) REFERENCES SourceFiles(Id),
        FOREIGN KEY(ParentId) REFERENCES Nodes(Id),
        FOREIGN KEY(ReferencedId) REFERENCES Nodes(Id),
        FOREIGN KEY(KindId) REFERENCES Kinds(Id),
        FOREIGN KEY(TypeId) REFERENCES Types(Id),
        FOREIGN KEY(TokenId) REFERENCES Tokens(Id),
        FOREIGN KEY(SourceFileId) REFERENCES SourceFiles(Id)
    );

    CREATE TABLE Diagnostics (
        Id INTEGER PRIMARY KEY,
        Line INTEGER,
        ColumnNumber INTEGER,
        Category INTEGER,
        Description TEXT,
        FileId INTEGER,
        CompiledFileId INTEGER,
        FOREIGN KEY(FileId) REFERENCES SourceFiles(Id),
        FOREIGN KEY(CompiledFileId) REFERENCES SourceFiles(Id)
    );

    CREATE INDEX idx_nodes_parent ON Nodes(ParentId);
    CREATE INDEX idx_nodes_token ON Nodes(TokenId);
    CREATE INDEX idx_type_children ON TypeChildren(TypeId);
"#;

fn file_id(idx: Option<FileIdx>) -> Option<i64> {
    idx.map(|i| i.0 as i64)
}

fn node_id(idx: Option<NodeIdx>) -> Option<i64> {
    idx.map(|i| i.0 as i64)
}

fn token_id(idx: Option<TokenIdx>) -> Option<i64> {
    idx.map(|i| i.0 as i64)
}

fn type_id(idx: Option<TypeIdx>) -> Option<i64> {
    idx.map(|i| i.0 as i64)
}

/// Build a SQLite database in a staging file next to `path` and move it over
/// `path` once `fill` succeeds.  On failure any existing file is untouched.
fn write_staged<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut Connection) -> Result<()>,
{
    let staged = staging_file_for(path)?;
    let mut conn = Connection::open(staged.path())?;
    fill(&mut conn)?;
    conn.close().map_err(|(_, e)| e)?;
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write `db` into a fresh SQLite database at `path`, replacing any existing
/// file only once the export is complete.  Everything is inserted in one
/// transaction.
pub fn export_to_sqlite(db: &SymbolDb, path: &Path) -> Result<()> {
    write_staged(path, |conn| write_tables(db, conn))?;
    info!(path = %path.display(), counts = %db.counts(), "exported to sqlite");
    Ok(())
}

pub fn write_tables(db: &SymbolDb, conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA)?;

    {
        let mut stmt = tx.prepare("INSERT INTO SourceFiles (Id, Path) VALUES (?1, ?2)")?;
        for (idx, path) in db.files.iter() {
            stmt.execute(params![idx.0 as i64, path])?;
        }

        let mut stmt = tx.prepare("INSERT INTO Tokens (Id, Text) VALUES (?1, ?2)")?;
        for (idx, text) in db.tokens.iter() {
            stmt.execute(params![idx.0 as i64, text])?;
        }

        // Every kind we know by name, plus whatever unknown kinds the nodes use.
        let mut kinds: BTreeMap<i32, String> = CursorKind::all_known()
            .into_iter()
            .map(|(kind, name)| (kind.0, name.to_string()))
            .collect();
        for node in &db.nodes {
            kinds.entry(node.kind.0).or_insert_with(|| node.kind.to_string());
        }
        let mut stmt = tx.prepare("INSERT INTO Kinds (Id, Name) VALUES (?1, ?2)")?;
        for (id, name) in &kinds {
            stmt.execute(params![*id as i64, name])?;
        }

        let mut type_stmt = tx.prepare(
            "INSERT INTO Types (Id, Hash, TokenId, Kind, IsConst) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        let mut child_stmt =
            tx.prepare("INSERT INTO TypeChildren (TypeId, Position, ChildId) VALUES (?1, ?2, ?3)")?;
        for (idx, ty) in db.types.iter() {
            type_stmt.execute(params![
                idx.0 as i64,
                ty.hash as i64,
                token_id(ty.token),
                ty.kind.to_string(),
                ty.is_const as i64,
            ])?;
            for (pos, child) in ty.children.iter().enumerate() {
                child_stmt.execute(params![idx.0 as i64, pos as i64, child.0 as i64])?;
            }
        }

        let mut stmt = tx.prepare(
            "INSERT INTO Nodes (Id, CompilingFileId, ParentId, ReferencedId, KindId, Flags, TypeId, \
             TokenId, Line, ColumnNumber, StartOffset, EndOffset, SourceFileId) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )?;
        for (idx, node) in db.nodes.iter().enumerate() {
            stmt.execute(params![
                idx as i64,
                file_id(node.compiling_file),
                node_id(node.parent),
                node_id(node.referenced),
                node.kind.0 as i64,
                node.flags.bits() as i64,
                type_id(node.type_idx),
                token_id(node.token),
                node.line as i64,
                node.column as i64,
                node.start_offset as i64,
                node.end_offset as i64,
                file_id(node.source_file),
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO Diagnostics (Id, Line, ColumnNumber, Category, Description, FileId, CompiledFileId) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (idx, diag) in db.diagnostics.iter().enumerate() {
            stmt.execute(params![
                idx as i64,
                diag.line as i64,
                diag.column as i64,
                diag.category as i64,
                diag.description,
                file_id(diag.file),
                file_id(diag.compiled_file),
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}
