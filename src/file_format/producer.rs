//! The front-end's output: newline-delimited JSON, one record per line.
//!
//! ```text
//! {"unit":{"file":"/src/main.cpp"}}
//! {"node":{"kind":4,"file":"/src/a.h","line":3,"column":7,"token":"Foo"}}
//! {"diagnostic":{"line":9,"column":1,"category":3,"text":"expected ';'"}}
//! ```
//!
//! Nodes arrive in pre-order.  `parent` is the position of an earlier node in
//! the same file; `referenced` may point forward.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::build::{BuildContext, BuildOptions};
use crate::db::TypeDescriptor;
use crate::errors::{OsyError, Result};
use crate::kinds::{AccessSpecifier, CursorKind, StorageClass};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNode {
    pub kind: CursorKind,
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
    pub start_offset: u32,
    pub end_offset: u32,
    pub token: String,
    #[serde(rename = "type")]
    pub type_desc: Option<TypeDescriptor>,
    pub parent: Option<u32>,
    pub referenced: Option<u32>,
    /// The front-end's 32-bit cursor hash; equal for a declaration and every
    /// reference to it.  0 means unknown.
    pub external_hash: u32,
    pub is_ref: bool,
    pub access: AccessSpecifier,
    pub storage_class: StorageClass,
    pub is_abstract: bool,
    pub is_deleted: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDiagnostic {
    pub line: u32,
    pub column: u32,
    pub category: u32,
    pub text: String,
    pub file: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub file: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawRecord {
    Unit(UnitRecord),
    Node(RawNode),
    Diagnostic(RawDiagnostic),
}

/// What reading one producer stream yielded besides the context itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub records: usize,
    pub skipped_lines: usize,
}

/// Feed every record of `reader` into a fresh `BuildContext`.
///
/// A line that is not valid JSON for any record type is logged and skipped.
/// A node that breaks the stream's ordering rules is fatal, because every
/// later parent index would be off.
pub fn read_producer<R: BufRead>(reader: R, options: BuildOptions) -> Result<(BuildContext, ReadStats)> {
    let mut ctx = BuildContext::new(options);
    let mut stats = ReadStats::default();
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = line_idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: RawRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(err) => {
                warn!(lineno, %err, "skipping unreadable producer line");
                stats.skipped_lines += 1;
                continue;
            }
        };
        stats.records += 1;
        match record {
            RawRecord::Unit(unit) => ctx.set_compiling_file(&unit.file),
            RawRecord::Node(node) => {
                ctx.add_node(node).map_err(|err| OsyError::Producer {
                    line: lineno,
                    message: err.to_string(),
                })?;
            }
            RawRecord::Diagnostic(diag) => ctx.add_diagnostic(diag),
        }
    }
    Ok((ctx, stats))
}

pub fn read_producer_file(path: &Path, options: BuildOptions) -> Result<(BuildContext, ReadStats)> {
    let file = File::open(path)?;
    read_producer(BufReader::new(file), options)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = r#"{"unit":{"file":"/src/main.cpp"}}
{"node":{"kind":4,"file":"/src/a.h","line":3,"column":7,"token":"Foo","external_hash":17}}
not json at all
{"node":{"kind":6,"file":"/src/a.h","line":4,"column":9,"token":"x","parent":0,"type":{"kind":17,"spelling":"int"}}}

{"diagnostic":{"line":9,"column":1,"category":3,"text":"expected ';'","file":"/src/main.cpp"}}
"#;

    #[test]
    fn records_parse_and_bad_lines_are_skipped() {
        let (ctx, stats) = read_producer(STREAM.as_bytes(), BuildOptions::default()).unwrap();
        assert_eq!(stats.records, 4);
        assert_eq!(stats.skipped_lines, 1);
        assert_eq!(ctx.pending_nodes(), 2);
    }

    #[test]
    fn forward_parent_is_fatal() {
        let stream = r#"{"node":{"kind":4,"file":"a.h","parent":0}}"#;
        match read_producer(stream.as_bytes(), BuildOptions::default()) {
            Err(OsyError::Producer { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected result: {:?}", other.map(|(_, s)| s)),
        }
    }

    #[test]
    fn node_record_shape() {
        let record: RawRecord = serde_json::from_str(
            r#"{"node":{"kind":21,"token":"run","access":1,"storage_class":3,"is_abstract":true}}"#,
        )
        .unwrap();
        match record {
            RawRecord::Node(node) => {
                assert_eq!(node.kind, CursorKind::CXX_METHOD);
                assert_eq!(node.access, AccessSpecifier::Public);
                assert_eq!(node.storage_class, StorageClass::Static);
                assert!(node.is_abstract);
                assert_eq!(node.file, None);
            }
            other => panic!("expected a node, got {:?}", other),
        }
    }
}
