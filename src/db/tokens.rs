use rustc_hash::FxHashMap;

use super::TokenIdx;

/// Interned spellings.  Identity is the exact text.
#[derive(Clone, Debug, Default)]
pub struct TokenTable {
    texts: Vec<String>,
    by_text: FxHashMap<String, TokenIdx>,
}

impl PartialEq for TokenTable {
    fn eq(&self, other: &Self) -> bool {
        self.texts == other.texts
    }
}

impl TokenTable {
    pub fn new() -> TokenTable {
        TokenTable::default()
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn intern(&mut self, text: &str) -> TokenIdx {
        if let Some(idx) = self.by_text.get(text) {
            return *idx;
        }
        let idx = TokenIdx::from_usize(self.texts.len());
        self.texts.push(text.to_string());
        self.by_text.insert(text.to_string(), idx);
        idx
    }

    /// Append `text` as stored on disk, even if it repeats an earlier token.
    pub fn push_raw(&mut self, text: String) -> TokenIdx {
        let idx = TokenIdx::from_usize(self.texts.len());
        self.by_text.entry(text.clone()).or_insert(idx);
        self.texts.push(text);
        idx
    }

    pub fn find(&self, text: &str) -> Option<TokenIdx> {
        self.by_text.get(text).copied()
    }

    pub fn get(&self, idx: TokenIdx) -> &str {
        &self.texts[idx.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TokenIdx, &str)> {
        self.texts
            .iter()
            .enumerate()
            .map(|(i, t)| (TokenIdx::from_usize(i), t.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut tokens = TokenTable::new();
        let foo = tokens.intern("Foo");
        let bar = tokens.intern("Bar");
        assert_eq!(tokens.intern("Foo"), foo);
        assert_ne!(foo, bar);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens.get(bar), "Bar");
        assert_eq!(tokens.find("Baz"), None);
    }
}
