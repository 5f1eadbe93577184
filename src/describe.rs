//! Human- and machine-readable listings of a database.

use std::io::Write;

use itertools::Itertools;
use serde_json::{json, Value};

use crate::db::nodes::depths;
use crate::db::{Node, SymbolDb, TypeIdx};
use crate::errors::Result;
use crate::kinds::{AccessSpecifier, StorageClass};

fn type_label(db: &SymbolDb, idx: TypeIdx) -> String {
    let ty = db.types.get(idx);
    let spelling = match db.token_text(ty.token) {
        Some(text) => text.to_string(),
        None => ty.kind.to_string(),
    };
    if ty.is_const {
        format!("const {}", spelling)
    } else {
        spelling
    }
}

fn flag_labels(node: &Node) -> Vec<String> {
    let mut labels = Vec::new();
    let access = node.flags.access_specifier();
    if access != AccessSpecifier::Invalid {
        labels.push(format!("{:?}", access).to_lowercase());
    }
    let storage = node.flags.storage_class();
    if storage != StorageClass::Invalid && storage != StorageClass::None {
        labels.push(format!("{:?}", storage).to_lowercase());
    }
    if node.flags.is_abstract() {
        labels.push("abstract".to_string());
    }
    if node.flags.is_deleted() {
        labels.push("deleted".to_string());
    }
    labels
}

/// Write the tables as text, with the node forest indented by depth.
pub fn describe_db<W: Write>(db: &SymbolDb, out: &mut W) -> Result<()> {
    writeln!(out, "files:")?;
    for (idx, path) in db.files.iter() {
        writeln!(out, "  {} {}", idx.0, path)?;
    }

    writeln!(out, "types:")?;
    for (idx, ty) in db.types.iter() {
        writeln!(
            out,
            "  {} {} {} [{}]",
            idx.0,
            ty.kind,
            type_label(db, idx),
            ty.children.iter().map(|c| c.0).join(", ")
        )?;
    }

    writeln!(out, "nodes:")?;
    let depths = depths(&db.nodes);
    for (idx, node) in db.nodes.iter().enumerate() {
        let mut line = format!("{}#{} {}", "  ".repeat(depths[idx] + 1), idx, node.kind);
        if let Some(text) = db.token_text(node.token) {
            line.push_str(&format!(" {}", text));
        }
        if let Some(ty) = node.type_idx {
            line.push_str(&format!(" : {}", type_label(db, ty)));
        }
        if let Some(path) = db.file_path(node.source_file) {
            line.push_str(&format!(" @ {}:{}:{}", path, node.line, node.column));
        }
        let flags = flag_labels(node);
        if !flags.is_empty() {
            line.push_str(&format!(" [{}]", flags.join(" ")));
        }
        if let Some(target) = node.referenced {
            line.push_str(&format!(" -> #{}", target.0));
        }
        writeln!(out, "{}", line)?;
    }

    if !db.diagnostics.is_empty() {
        writeln!(out, "diagnostics:")?;
        for diag in &db.diagnostics {
            writeln!(
                out,
                "  {}:{}:{} [{}] {}",
                db.file_path(diag.file).unwrap_or("<unknown>"),
                diag.line,
                diag.column,
                diag.category,
                diag.description
            )?;
        }
    }
    Ok(())
}

fn node_record(db: &SymbolDb, idx: usize, node: &Node) -> Value {
    json!({
        "node": {
            "id": idx,
            "kind": node.kind,
            "kind_name": node.kind.to_string(),
            "parent": node.parent,
            "referenced": node.referenced,
            "token": db.token_text(node.token),
            "type": node.type_idx,
            "file": db.file_path(node.source_file),
            "compiling_file": db.file_path(node.compiling_file),
            "line": node.line,
            "column": node.column,
            "start_offset": node.start_offset,
            "end_offset": node.end_offset,
            "access": node.flags.access_specifier(),
            "storage_class": node.flags.storage_class(),
            "is_abstract": node.flags.is_abstract(),
            "is_deleted": node.flags.is_deleted(),
        }
    })
}

/// All records of `db`, one JSON value per table row.
pub fn json_records(db: &SymbolDb) -> Vec<Value> {
    let mut records = Vec::new();
    for (idx, path) in db.files.iter() {
        records.push(json!({ "file": { "id": idx, "path": path } }));
    }
    for (idx, text) in db.tokens.iter() {
        records.push(json!({ "token": { "id": idx, "text": text } }));
    }
    for (idx, ty) in db.types.iter() {
        records.push(json!({
            "type": {
                "id": idx,
                "kind": ty.kind,
                "kind_name": ty.kind.to_string(),
                "token": db.token_text(ty.token),
                "is_const": ty.is_const,
                "hash": format!("{:016x}", ty.hash),
                "children": ty.children,
            }
        }));
    }
    for (idx, node) in db.nodes.iter().enumerate() {
        records.push(node_record(db, idx, node));
    }
    for (idx, diag) in db.diagnostics.iter().enumerate() {
        records.push(json!({
            "diagnostic": {
                "id": idx,
                "line": diag.line,
                "column": diag.column,
                "category": diag.category,
                "description": diag.description,
                "file": db.file_path(diag.file),
                "compiled_file": db.file_path(diag.compiled_file),
            }
        }));
    }
    records
}

/// Newline-delimited JSON form of `json_records`.
pub fn dump_json<W: Write>(db: &SymbolDb, out: &mut W) -> Result<()> {
    for record in json_records(db) {
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
    }
    Ok(())
}
