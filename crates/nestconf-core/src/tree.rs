//! Configuration tree produced by the parser.
//!
//! The tree is designed to be:
//!
//! - **Zero-copy**: Uses `Cow<'a, str>` to borrow from input when possible
//! - **Ordered**: Directives keep their first-appearance order
//! - **Lossless for repeats**: Repeated directive names collect every value

use std::borrow::Cow;
use std::slice;

use indexmap::IndexMap;

use crate::span::Span;

/// Copy-on-write string type used throughout the tree.
pub type CowStr<'a> = Cow<'a, str>;

/// The value of one directive occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue<'a> {
    /// A single string (several tokens on one line are space-joined).
    Str(CowStr<'a>),
    /// Tokens of one directive line, kept apart when token lists are enabled.
    List(Vec<CowStr<'a>>),
    /// A nested block.
    Block(ConfigNode<'a>),
}

impl<'a> ConfigValue<'a> {
    /// The string, if this is a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(&**s),
            _ => None,
        }
    }

    /// The tokens, if this is a `List` value.
    pub fn as_list(&self) -> Option<&[CowStr<'a>]> {
        match self {
            ConfigValue::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// The nested node, if this is a `Block` value.
    pub fn as_block(&self) -> Option<&ConfigNode<'a>> {
        match self {
            ConfigValue::Block(node) => Some(node),
            _ => None,
        }
    }

    /// Check if this value is a nested block.
    pub fn is_block(&self) -> bool {
        matches!(self, ConfigValue::Block(_))
    }

    /// Detach the value from the input it borrows.
    pub fn into_owned(self) -> ConfigValue<'static> {
        match self {
            ConfigValue::Str(s) => ConfigValue::Str(Cow::Owned(s.into_owned())),
            ConfigValue::List(items) => ConfigValue::List(
                items
                    .into_iter()
                    .map(|s| Cow::Owned(s.into_owned()))
                    .collect(),
            ),
            ConfigValue::Block(node) => ConfigValue::Block(node.into_owned()),
        }
    }
}

impl<'a> From<&'a str> for ConfigValue<'a> {
    fn from(s: &'a str) -> Self {
        ConfigValue::Str(Cow::Borrowed(s))
    }
}

impl From<String> for ConfigValue<'_> {
    fn from(s: String) -> Self {
        ConfigValue::Str(Cow::Owned(s))
    }
}

impl<'a> From<ConfigNode<'a>> for ConfigValue<'a> {
    fn from(node: ConfigNode<'a>) -> Self {
        ConfigValue::Block(node)
    }
}

/// Every value recorded under one directive name in a block.
///
/// The first occurrence is stored as `Single`; a second occurrence promotes
/// the entry to `Many` holding both in order, and later ones append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEntry<'a> {
    /// The directive appeared once.
    Single(ConfigValue<'a>),
    /// The directive appeared more than once, in source order.
    Many(Vec<ConfigValue<'a>>),
}

impl<'a> ConfigEntry<'a> {
    /// Record another occurrence of the directive.
    pub fn push(&mut self, value: ConfigValue<'a>) {
        let values = match std::mem::replace(self, ConfigEntry::Many(Vec::new())) {
            ConfigEntry::Single(old) => vec![old, value],
            ConfigEntry::Many(mut values) => {
                values.push(value);
                values
            }
        };
        *self = ConfigEntry::Many(values);
    }

    /// All values in source order.
    pub fn values(&self) -> &[ConfigValue<'a>] {
        match self {
            ConfigEntry::Single(value) => slice::from_ref(value),
            ConfigEntry::Many(values) => values,
        }
    }

    /// The first occurrence.
    pub fn first(&self) -> Option<&ConfigValue<'a>> {
        self.values().first()
    }

    /// The last occurrence.
    pub fn last(&self) -> Option<&ConfigValue<'a>> {
        self.values().last()
    }

    /// The single value, if the directive appeared exactly once.
    pub fn as_single(&self) -> Option<&ConfigValue<'a>> {
        match self {
            ConfigEntry::Single(value) => Some(value),
            ConfigEntry::Many(_) => None,
        }
    }

    /// Number of occurrences.
    pub fn len(&self) -> usize {
        self.values().len()
    }

    /// Always false: an entry exists only once a value was recorded.
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// Check if the directive appeared more than once.
    pub fn is_many(&self) -> bool {
        matches!(self, ConfigEntry::Many(_))
    }

    /// Detach the entry from the input it borrows.
    pub fn into_owned(self) -> ConfigEntry<'static> {
        match self {
            ConfigEntry::Single(value) => ConfigEntry::Single(value.into_owned()),
            ConfigEntry::Many(values) => {
                ConfigEntry::Many(values.into_iter().map(ConfigValue::into_owned).collect())
            }
        }
    }
}

/// A block of directives.
///
/// Equality compares directives in order and ignores spans.
#[derive(Debug, Clone, Default)]
pub struct ConfigNode<'a> {
    entries: IndexMap<CowStr<'a>, ConfigEntry<'a>>,
    /// Source span of the block body.
    pub span: Span,
}

impl<'a> ConfigNode<'a> {
    /// Create an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directive, applying the merge rule for repeated names.
    pub fn insert(&mut self, name: impl Into<CowStr<'a>>, value: ConfigValue<'a>) {
        match self.entries.entry(name.into()) {
            indexmap::map::Entry::Occupied(mut slot) => slot.get_mut().push(value),
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(ConfigEntry::Single(value));
            }
        }
    }

    /// Look up a directive by name.
    pub fn get(&self, name: &str) -> Option<&ConfigEntry<'a>> {
        self.entries.get(name)
    }

    /// Check if a directive is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up a directive through nested blocks.
    ///
    /// Each segment but the last descends into the first block recorded
    /// under that name.
    ///
    /// ```rust
    /// let config = nestconf_core::parse("http { server { listen 80; } }");
    /// let listen = config.get_path(["http", "server", "listen"]).unwrap();
    /// assert_eq!(listen.first().and_then(|v| v.as_str()), Some("80"));
    /// ```
    pub fn get_path<I, S>(&self, path: I) -> Option<&ConfigEntry<'a>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut segments = path.into_iter().peekable();
        let mut node = self;
        while let Some(segment) = segments.next() {
            let entry = node.get(segment.as_ref())?;
            if segments.peek().is_none() {
                return Some(entry);
            }
            node = entry.values().iter().find_map(ConfigValue::as_block)?;
        }
        None
    }

    /// Iterate over directives in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigEntry<'a>)> {
        self.entries.iter().map(|(k, v)| (&**k, v))
    }

    /// Directive names in first-appearance order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| &**k)
    }

    /// Number of distinct directive names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the block has no directives.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total directive occurrences, counting nested blocks.
    pub fn directive_count(&self) -> usize {
        self.stats().directives
    }

    /// Deepest nesting below this node; a node without blocks has depth 0.
    pub fn depth(&self) -> usize {
        self.stats().max_depth
    }

    /// Collect counts over the whole tree.
    pub fn stats(&self) -> Stats {
        let mut stats = Stats::default();
        stats.visit(self, 0);
        stats
    }

    /// Detach the tree from the input it borrows.
    pub fn into_owned(self) -> ConfigNode<'static> {
        ConfigNode {
            entries: self
                .entries
                .into_iter()
                .map(|(k, v)| (Cow::Owned(k.into_owned()), v.into_owned()))
                .collect(),
            span: self.span,
        }
    }
}

impl PartialEq for ConfigNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a == b)
    }
}

impl Eq for ConfigNode<'_> {}

impl<'a, K> FromIterator<(K, ConfigValue<'a>)> for ConfigNode<'a>
where
    K: Into<CowStr<'a>>,
{
    fn from_iter<T: IntoIterator<Item = (K, ConfigValue<'a>)>>(iter: T) -> Self {
        let mut node = ConfigNode::new();
        for (name, value) in iter {
            node.insert(name, value);
        }
        node
    }
}

impl<'n, 'a> IntoIterator for &'n ConfigNode<'a> {
    type Item = (&'n CowStr<'a>, &'n ConfigEntry<'a>);
    type IntoIter = indexmap::map::Iter<'n, CowStr<'a>, ConfigEntry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Counts gathered by walking a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Directive occurrences, blocks included.
    pub directives: usize,
    /// Occurrences whose value is a block.
    pub blocks: usize,
    /// Occurrences whose value is a string or token list.
    pub values: usize,
    /// Names that appeared more than once within one block.
    pub repeated: usize,
    /// Deepest block nesting.
    pub max_depth: usize,
}

impl Stats {
    fn visit(&mut self, node: &ConfigNode<'_>, depth: usize) {
        self.max_depth = self.max_depth.max(depth);
        for (_, entry) in node.iter() {
            if entry.is_many() {
                self.repeated += 1;
            }
            for value in entry.values() {
                self.directives += 1;
                match value {
                    ConfigValue::Block(child) => {
                        self.blocks += 1;
                        self.visit(child, depth + 1);
                    }
                    ConfigValue::Str(_) | ConfigValue::List(_) => self.values += 1,
                }
            }
        }
    }
}
