use super::FileIdx;

/// A compiler diagnostic reported while parsing a translation unit.  These
/// ride along with the node graph but never take part in dedup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub column: u32,
    pub category: u32,
    pub description: String,
    pub file: Option<FileIdx>,
    pub compiled_file: Option<FileIdx>,
}
