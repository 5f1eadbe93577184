use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::tokens::TokenTable;
use super::{TokenIdx, TypeIdx};
use crate::hashing::{mix, str_hash, PLACEHOLDER_SEED, SEED};
use crate::kinds::TypeKind;

/// A type as the front-end describes it: a kind, a spelling and the types it
/// is built from (pointee, template arguments, parameter types...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    #[serde(default)]
    pub spelling: String,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub children: Vec<TypeDescriptor>,
}

/// An interned type.  `children` may point anywhere in the table (an upgraded
/// placeholder can sit before its children) but never forms a cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeNode {
    pub kind: TypeKind,
    pub is_const: bool,
    pub token: Option<TokenIdx>,
    pub children: Vec<TypeIdx>,
    pub hash: u64,
}

/// Structural hash of a type.  Children are mixed in declaration order.
pub fn type_hash(is_const: bool, kind: TypeKind, spelling: &str, child_hashes: &[u64]) -> u64 {
    let mut h = mix(SEED, is_const as u64);
    h = mix(h, kind.0 as u32 as u64);
    h = mix(h, str_hash(spelling));
    for child in child_hashes {
        h = mix(h, *child);
    }
    h
}

fn spelling_key(spelling: &str) -> u64 {
    mix(PLACEHOLDER_SEED, str_hash(spelling))
}

/// The spelling we intern for a descriptor: trimmed, and without the leading
/// `const ` that the const flag already records.
pub fn clean_spelling(desc: &TypeDescriptor) -> &str {
    let trimmed = desc.spelling.trim();
    if desc.is_const {
        if let Some(rest) = trimmed.strip_prefix("const ") {
            return rest.trim_start();
        }
    }
    trimmed
}

/// Spelling to type lookup for one build session.  Placeholder types are only
/// known by spelling, so this is how a later concrete type finds the
/// placeholder it should replace.  Not persisted.
#[derive(Debug, Default)]
pub struct SpellingIndex {
    by_key: FxHashMap<u64, TypeIdx>,
}

impl SpellingIndex {
    pub fn new() -> SpellingIndex {
        SpellingIndex::default()
    }
}

#[derive(Clone, Debug, Default)]
pub struct TypeTable {
    types: Vec<TypeNode>,
    by_hash: FxHashMap<u64, TypeIdx>,
}

impl PartialEq for TypeTable {
    fn eq(&self, other: &Self) -> bool {
        self.types == other.types
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    Open,
    Done,
}

impl TypeTable {
    pub fn new() -> TypeTable {
        TypeTable::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, idx: TypeIdx) -> &TypeNode {
        &self.types[idx.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeIdx, &TypeNode)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeIdx::from_usize(i), t))
    }

    pub fn find_hash(&self, hash: u64) -> Option<TypeIdx> {
        self.by_hash.get(&hash).copied()
    }

    /// Append an already-hashed type.  If another type carries the same hash
    /// the lookup keeps pointing at the earlier one.
    pub fn push(&mut self, node: TypeNode) -> TypeIdx {
        let idx = TypeIdx::from_usize(self.types.len());
        self.by_hash.entry(node.hash).or_insert(idx);
        self.types.push(node);
        idx
    }

    /// Intern `desc` and everything it is built from, children first.
    pub fn intern(
        &mut self,
        tokens: &mut TokenTable,
        spellings: &mut SpellingIndex,
        desc: &TypeDescriptor,
    ) -> TypeIdx {
        let children: Vec<TypeIdx> = desc
            .children
            .iter()
            .map(|child| self.intern(tokens, spellings, child))
            .collect();

        let spelling = clean_spelling(desc);
        let token = if spelling.is_empty() {
            None
        } else {
            Some(tokens.intern(spelling))
        };
        let key = spelling_key(spelling);

        if desc.kind.is_placeholder() {
            // Whatever already answers to this spelling wins, concrete or not.
            if let Some(idx) = spellings.by_key.get(&key) {
                return *idx;
            }
        }

        let child_hashes: Vec<u64> = children.iter().map(|c| self.get(*c).hash).collect();
        let hash = type_hash(desc.is_const, desc.kind, spelling, &child_hashes);
        if let Some(idx) = self.find_hash(hash) {
            spellings.by_key.entry(key).or_insert(idx);
            return idx;
        }

        if !desc.kind.is_placeholder() {
            if let Some(&idx) = spellings.by_key.get(&key) {
                let upgradable = self.get(idx).kind.is_placeholder() && !self.reaches(&children, idx);
                if upgradable {
                    trace!(spelling, kind = %desc.kind, "upgrading placeholder type");
                    let entry = &mut self.types[idx.index()];
                    entry.kind = desc.kind;
                    entry.is_const = desc.is_const;
                    entry.children = children;
                    entry.hash = hash;
                    // Every type built on the placeholder now hashes differently.
                    self.refresh_hashes(tokens);
                    return idx;
                }
            }
        }

        let idx = self.push(TypeNode {
            kind: desc.kind,
            is_const: desc.is_const,
            token,
            children,
            hash,
        });
        spellings.by_key.entry(key).or_insert(idx);
        idx
    }

    /// True if `target` is one of `roots` or a descendant of one.
    fn reaches(&self, roots: &[TypeIdx], target: TypeIdx) -> bool {
        let mut seen = vec![false; self.types.len()];
        let mut stack: Vec<TypeIdx> = roots.to_vec();
        while let Some(idx) = stack.pop() {
            if idx == target {
                return true;
            }
            if !std::mem::replace(&mut seen[idx.index()], true) {
                stack.extend_from_slice(&self.types[idx.index()].children);
            }
        }
        false
    }

    /// Recompute every structural hash children first and rebuild the hash
    /// lookup.  Only meaningful for a table filled by `intern`, whose hashes
    /// all follow `type_hash`.
    fn refresh_hashes(&mut self, tokens: &TokenTable) {
        let order = match self.topo_order() {
            Ok(order) => order,
            Err(ty) => panic!("type {} is part of a cycle", ty.0),
        };
        for idx in order {
            let ty = &self.types[idx.index()];
            let spelling = ty.token.map_or("", |t| tokens.get(t));
            let child_hashes: Vec<u64> = ty
                .children
                .iter()
                .map(|c| self.types[c.index()].hash)
                .collect();
            let hash = type_hash(ty.is_const, ty.kind, spelling, &child_hashes);
            self.types[idx.index()].hash = hash;
        }
        self.by_hash.clear();
        for (i, ty) in self.types.iter().enumerate() {
            self.by_hash.entry(ty.hash).or_insert_with(|| TypeIdx::from_usize(i));
        }
    }

    /// Every type, each one after all of its children.  `Err` names a type
    /// that sits on a cycle.
    pub fn topo_order(&self) -> Result<Vec<TypeIdx>, TypeIdx> {
        let count = self.types.len();
        let mut marks = vec![Mark::Unvisited; count];
        let mut order = Vec::with_capacity(count);
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..count {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::Open;
            stack.push((root, 0));
            while let Some(top) = stack.last_mut() {
                let (idx, pos) = *top;
                match self.types[idx].children.get(pos) {
                    Some(child) => {
                        top.1 += 1;
                        let child = child.index();
                        match marks[child] {
                            Mark::Unvisited => {
                                marks[child] = Mark::Open;
                                stack.push((child, 0));
                            }
                            Mark::Open => return Err(TypeIdx::from_usize(child)),
                            Mark::Done => {}
                        }
                    }
                    None => {
                        marks[idx] = Mark::Done;
                        order.push(TypeIdx::from_usize(idx));
                        stack.pop();
                    }
                }
            }
        }
        Ok(order)
    }
}
