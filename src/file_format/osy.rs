//! The OSY container.
//!
//! ```text
//! [u32 LE uncompressed size][zlib stream]
//! ```
//!
//! The inflated payload holds, in order, the source file, token, type and node
//! sections and, when there is anything to store, a trailing diagnostics
//! section.  Every section starts with a `u64` record count; every integer is
//! little-endian; `-1` marks an absent index.

use std::convert::TryFrom;
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::io_helpers::{ByteReader, ByteWriter};
use crate::db::{
    Diagnostic, FileIdx, Node, NodeIdx, SymbolDb, TokenIdx, TypeIdx, TypeNode,
};
use crate::errors::{DecodeError, EncodeError, OsyError, Result};
use crate::file_utils::write_file_atomically;
use crate::kinds::{CursorKind, NodeFlags, TypeKind};

const HEADER_LEN: usize = 4;

const MIN_FILE_RECORD: usize = 2;
const MIN_TOKEN_RECORD: usize = 8 + 2;
const MIN_TYPE_RECORD: usize = 8 + 8 + 8 + 8 + 4 + 1;
const NODE_RECORD: usize = 8 * 4 + 4 * 2 + 8 * 2 + 4 * 4 + 8;
const MIN_DIAGNOSTIC_RECORD: usize = 8 + 4 * 3 + 2 + 8 + 8;

pub fn encode_payload(db: &SymbolDb) -> std::result::Result<Vec<u8>, EncodeError> {
    let mut w = ByteWriter::new();

    w.count(db.files.len());
    for (_, path) in db.files.iter() {
        w.string(path)?;
    }

    w.count(db.tokens.len());
    for (idx, text) in db.tokens.iter() {
        w.i64(idx.0 as i64);
        w.string(text)?;
    }

    w.count(db.types.len());
    for (idx, ty) in db.types.iter() {
        w.i64(idx.0 as i64);
        w.i64(ty.hash as i64);
        w.count(ty.children.len());
        for child in &ty.children {
            w.i64(child.0 as i64);
        }
        w.i64(TokenIdx::to_disk(ty.token));
        w.i32(ty.kind.0);
        w.u8(ty.is_const as u8);
    }

    w.count(db.nodes.len());
    for (idx, node) in db.nodes.iter().enumerate() {
        w.i64(idx as i64);
        w.i64(FileIdx::to_disk(node.compiling_file));
        w.i64(NodeIdx::to_disk(node.parent));
        w.i64(NodeIdx::to_disk(node.referenced));
        w.i32(node.kind.0);
        w.i32(node.flags.bits() as i32);
        w.i64(TypeIdx::to_disk(node.type_idx));
        w.i64(TokenIdx::to_disk(node.token));
        w.u32(node.line);
        w.u32(node.column);
        w.u32(node.start_offset);
        w.u32(node.end_offset);
        w.i64(FileIdx::to_disk(node.source_file));
    }

    if !db.diagnostics.is_empty() {
        w.count(db.diagnostics.len());
        for (idx, diag) in db.diagnostics.iter().enumerate() {
            w.i64(idx as i64);
            w.u32(diag.line);
            w.u32(diag.column);
            w.u32(diag.category);
            w.string(&diag.description)?;
            w.i64(FileIdx::to_disk(diag.file));
            w.i64(FileIdx::to_disk(diag.compiled_file));
        }
    }

    Ok(w.into_inner())
}

fn check_key(section: &'static str, position: usize, key: i64) -> std::result::Result<(), DecodeError> {
    if key == position as i64 {
        Ok(())
    } else {
        Err(DecodeError::KeyMismatch {
            section,
            position,
            found: key,
        })
    }
}

/// Resolve an on-disk index field against a table of `limit` entries.
macro_rules! field {
    ($ty:ident, $raw:expr, $limit:expr, $section:expr, $record:expr, $field:expr) => {
        $ty::from_disk($raw, $limit).map_err(|index| DecodeError::IndexOutOfRange {
            section: $section,
            record: $record,
            field: $field,
            index,
            limit: $limit,
        })?
    };
}

pub fn decode_payload(payload: &[u8]) -> std::result::Result<SymbolDb, DecodeError> {
    let mut r = ByteReader::new(payload);
    let mut db = SymbolDb::new();

    let file_count = r.count("source files", MIN_FILE_RECORD)?;
    for _ in 0..file_count {
        let path = r.string("source files")?;
        db.files.push_raw(path);
    }
    let files = db.files.len();

    let token_count = r.count("tokens", MIN_TOKEN_RECORD)?;
    for position in 0..token_count {
        check_key("tokens", position, r.i64()?)?;
        let text = r.string("tokens")?;
        db.tokens.push_raw(text);
    }

    let type_count = r.count("types", MIN_TYPE_RECORD)?;
    for position in 0..type_count {
        check_key("types", position, r.i64()?)?;
        let hash = r.i64()? as u64;
        let child_count = r.count("type children", 8)?;
        let mut children = Vec::with_capacity(child_count);
        for _ in 0..child_count {
            let child = field!(TypeIdx, r.i64()?, type_count, "types", position, "child");
            match child {
                Some(child) => children.push(child),
                None => {
                    return Err(DecodeError::IndexOutOfRange {
                        section: "types",
                        record: position,
                        field: "child",
                        index: -1,
                        limit: type_count,
                    })
                }
            }
        }
        let token = field!(TokenIdx, r.i64()?, token_count, "types", position, "token");
        let kind = TypeKind(r.i32()?);
        let is_const = r.u8()? != 0;
        db.types.push(TypeNode {
            kind,
            is_const,
            token,
            children,
            hash,
        });
    }

    let node_count = r.count("nodes", NODE_RECORD)?;
    db.nodes.reserve(node_count);
    for position in 0..node_count {
        check_key("nodes", position, r.i64()?)?;
        let compiling_file = field!(FileIdx, r.i64()?, files, "nodes", position, "compiling_file");
        let parent = field!(NodeIdx, r.i64()?, node_count, "nodes", position, "parent");
        let referenced = field!(NodeIdx, r.i64()?, node_count, "nodes", position, "referenced");
        let kind = CursorKind(r.i32()?);
        let flags = NodeFlags::from_bits_retain(r.i32()? as u32);
        let type_idx = field!(TypeIdx, r.i64()?, type_count, "nodes", position, "type");
        let token = field!(TokenIdx, r.i64()?, token_count, "nodes", position, "token");
        let line = r.u32()?;
        let column = r.u32()?;
        let start_offset = r.u32()?;
        let end_offset = r.u32()?;
        let source_file = field!(FileIdx, r.i64()?, files, "nodes", position, "source_file");
        db.nodes.push(Node {
            compiling_file,
            parent,
            referenced,
            kind,
            flags,
            type_idx,
            token,
            line,
            column,
            start_offset,
            end_offset,
            source_file,
        });
    }

    if !r.is_at_end() {
        let diag_count = r.count("diagnostics", MIN_DIAGNOSTIC_RECORD)?;
        for position in 0..diag_count {
            check_key("diagnostics", position, r.i64()?)?;
            let line = r.u32()?;
            let column = r.u32()?;
            let category = r.u32()?;
            let description = r.string("diagnostics")?;
            let file = field!(FileIdx, r.i64()?, files, "diagnostics", position, "file");
            let compiled_file =
                field!(FileIdx, r.i64()?, files, "diagnostics", position, "compiled_file");
            db.diagnostics.push(Diagnostic {
                line,
                column,
                category,
                description,
                file,
                compiled_file,
            });
        }
    }

    if !r.is_at_end() {
        return Err(DecodeError::TrailingBytes {
            remaining: r.remaining(),
        });
    }
    Ok(db)
}

pub fn save_to_bytes(db: &SymbolDb, compression_level: u32) -> std::result::Result<Vec<u8>, EncodeError> {
    let payload = encode_payload(db)?;
    let size = u32::try_from(payload.len()).map_err(|_| EncodeError::PayloadTooLarge {
        len: payload.len(),
    })?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() / 4);
    out.extend_from_slice(&size.to_le_bytes());
    let mut encoder = ZlibEncoder::new(out, Compression::new(compression_level));
    encoder.write_all(&payload)?;
    Ok(encoder.finish()?)
}

pub fn load_from_bytes(bytes: &[u8]) -> std::result::Result<SymbolDb, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::MissingHeader {
            expected: HEADER_LEN,
        });
    }
    let mut header = [0u8; HEADER_LEN];
    header.copy_from_slice(&bytes[..HEADER_LEN]);
    let expected = u32::from_le_bytes(header);

    // Read one byte past the promised size so an oversized stream is caught
    // without inflating all of it.
    let mut payload = Vec::new();
    ZlibDecoder::new(&bytes[HEADER_LEN..])
        .take(expected as u64 + 1)
        .read_to_end(&mut payload)
        .map_err(|e| DecodeError::Decompress(e.to_string()))?;
    if payload.len() != expected as usize {
        return Err(DecodeError::SizeMismatch {
            expected,
            actual: payload.len(),
        });
    }
    decode_payload(&payload)
}

pub fn load_file(path: &Path) -> Result<SymbolDb> {
    let bytes = std::fs::read(path)?;
    let db = load_from_bytes(&bytes).map_err(|source| OsyError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), counts = %db.counts(), "loaded database");
    Ok(db)
}

/// Check `db`, encode it and atomically replace `path` with the result.
pub fn save_file(db: &SymbolDb, path: &Path, compression_level: u32) -> Result<()> {
    db.ensure_consistent()?;
    let bytes = save_to_bytes(db, compression_level)?;
    write_file_atomically(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "saved database");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{AccessSpecifier, StorageClass};

    fn sample_db() -> SymbolDb {
        let mut db = SymbolDb::new();
        let main = db.files.intern("/src/main.cpp");
        let header = db.files.intern("/src/a.h");
        let foo = db.tokens.intern("Foo");
        let int = db.tokens.intern("int");
        let int_ty = db.types.push(TypeNode {
            kind: TypeKind::INT,
            token: Some(int),
            hash: 11,
            ..TypeNode::default()
        });
        let ptr_ty = db.types.push(TypeNode {
            kind: TypeKind::POINTER,
            is_const: true,
            children: vec![int_ty],
            hash: 12,
            ..TypeNode::default()
        });
        db.nodes.push(Node {
            compiling_file: main,
            kind: CursorKind::CLASS_DECL,
            token: Some(foo),
            source_file: header,
            line: 3,
            column: 7,
            start_offset: 20,
            end_offset: 60,
            ..Node::default()
        });
        db.nodes.push(Node {
            compiling_file: main,
            parent: Some(NodeIdx(0)),
            referenced: Some(NodeIdx(0)),
            kind: CursorKind::FIELD_DECL,
            flags: NodeFlags::pack(AccessSpecifier::Private, false, StorageClass::None, false),
            type_idx: Some(ptr_ty),
            source_file: header,
            line: 4,
            ..Node::default()
        });
        db
    }

    #[test]
    fn empty_database_round_trips() {
        let bytes = save_to_bytes(&SymbolDb::new(), 6).unwrap();
        assert_eq!(load_from_bytes(&bytes).unwrap(), SymbolDb::new());
    }

    #[test]
    fn populated_database_round_trips() {
        let db = sample_db();
        let bytes = save_to_bytes(&db, 9).unwrap();
        assert_eq!(load_from_bytes(&bytes).unwrap(), db);
    }

    #[test]
    fn diagnostics_section_round_trips() {
        let mut db = SymbolDb::new();
        let main = db.files.intern("main.cpp");
        db.diagnostics.push(Diagnostic {
            line: 9,
            column: 2,
            category: 3,
            description: "expected ';'".to_string(),
            file: main,
            compiled_file: main,
        });
        let bytes = save_to_bytes(&db, 6).unwrap();
        assert_eq!(load_from_bytes(&bytes).unwrap(), db);
    }

    #[test]
    fn header_is_the_uncompressed_size() {
        let db = sample_db();
        let payload = encode_payload(&db).unwrap();
        let bytes = save_to_bytes(&db, 6).unwrap();
        assert_eq!(&bytes[..4], &(payload.len() as u32).to_le_bytes());
    }

    #[test]
    fn missing_header_is_an_error() {
        assert_eq!(
            load_from_bytes(&[1, 2]),
            Err(DecodeError::MissingHeader { expected: 4 })
        );
    }

    #[test]
    fn size_mismatch_is_an_error() {
        let mut bytes = save_to_bytes(&sample_db(), 6).unwrap();
        let real = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        bytes[..4].copy_from_slice(&(real + 5).to_le_bytes());
        assert!(matches!(
            load_from_bytes(&bytes),
            Err(DecodeError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let payload = encode_payload(&sample_db()).unwrap();
        let cut = &payload[..payload.len() - 3];
        assert!(matches!(
            decode_payload(cut),
            Err(DecodeError::Truncated { .. }) | Err(DecodeError::CountOverrun { .. })
        ));
    }

    #[test]
    fn inflated_counts_are_an_error() {
        let mut payload = encode_payload(&SymbolDb::new()).unwrap();
        payload[..8].copy_from_slice(&1_000_000u64.to_le_bytes());
        assert!(matches!(
            decode_payload(&payload),
            Err(DecodeError::CountOverrun {
                section: "source files",
                ..
            })
        ));
    }

    #[test]
    fn out_of_range_indices_are_an_error() {
        let mut db = sample_db();
        db.nodes[1].token = Some(TokenIdx(40));
        let payload = encode_payload(&db).unwrap();
        assert!(matches!(
            decode_payload(&payload),
            Err(DecodeError::IndexOutOfRange { field: "token", .. })
        ));
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        let mut payload = encode_payload(&sample_db()).unwrap();
        payload.extend_from_slice(&[0, 0, 0]);
        assert!(decode_payload(&payload).is_err());
    }

    #[test]
    fn saving_refuses_inconsistent_databases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.osy");
        let mut db = sample_db();
        db.nodes[0].parent = Some(NodeIdx(1));
        assert!(matches!(
            save_file(&db, &path, 6),
            Err(OsyError::Inconsistent { .. })
        ));
        assert!(!path.exists());
    }
}
