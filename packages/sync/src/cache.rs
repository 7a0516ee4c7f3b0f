//! # Local cache
//!
//! Bounded LRU map from fragment keys to loaded fragments. A key whose load
//! is still in flight holds the shared load future, so concurrent readers
//! await one backend call instead of issuing their own.
//!
//! ```text
//!   FragmentKey::Attribute(GlyphMap)   -> Ready(Fragment::GlyphMap(..))
//!   FragmentKey::Glyph("A")            -> Ready(Fragment::Glyph(Some(..)))
//!   FragmentKey::Glyph("B")            -> Loading(shared future)
//! ```

use crate::error::BackendError;
use futures::future::{BoxFuture, Shared};
use glyphhub_changes::{cast, ChangeResult, ChangeSubject, PathSegment, Pattern, Value};
use glyphhub_model::{FontAxis, FontLib, GlyphMap, VariableGlyph};
use lru::LruCache;
use std::any::Any;
use std::fmt;
use std::num::NonZeroUsize;

/// Root key under which glyphs live.
pub const GLYPHS_KEY: &str = "glyphs";

/// A top-level attribute of the font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontAttribute {
    GlyphMap,
    Axes,
    UnitsPerEm,
    Lib,
}

impl FontAttribute {
    pub const ALL: [FontAttribute; 4] = [
        FontAttribute::GlyphMap,
        FontAttribute::Axes,
        FontAttribute::UnitsPerEm,
        FontAttribute::Lib,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FontAttribute::GlyphMap => "glyphMap",
            FontAttribute::Axes => "axes",
            FontAttribute::UnitsPerEm => "unitsPerEm",
            FontAttribute::Lib => "lib",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attribute| attribute.key() == key)
    }
}

/// Unit of loading, caching and persisting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FragmentKey {
    Attribute(FontAttribute),
    Glyph(String),
}

impl FragmentKey {
    pub fn glyph(glyph_name: impl Into<String>) -> Self {
        FragmentKey::Glyph(glyph_name.into())
    }

    pub fn glyph_name(&self) -> Option<&str> {
        match self {
            FragmentKey::Glyph(glyph_name) => Some(glyph_name),
            FragmentKey::Attribute(_) => None,
        }
    }

    /// Path of this fragment in the font's root object.
    pub fn path(&self) -> Vec<PathSegment> {
        match self {
            FragmentKey::Attribute(attribute) => vec![attribute.key().into()],
            FragmentKey::Glyph(glyph_name) => vec![GLYPHS_KEY.into(), glyph_name.as_str().into()],
        }
    }

    pub fn to_pattern(&self) -> Pattern {
        Pattern::from_path(&self.path())
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentKey::Attribute(attribute) => write!(f, "{}", attribute.key()),
            FragmentKey::Glyph(glyph_name) => write!(f, "{}/{}", GLYPHS_KEY, glyph_name),
        }
    }
}

/// A loaded fragment value.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    GlyphMap(GlyphMap),
    Axes(Vec<FontAxis>),
    UnitsPerEm(i64),
    Lib(FontLib),
    /// `None` when the backend has no such glyph.
    Glyph(Option<VariableGlyph>),
}

impl Fragment {
    /// Cast an assigned value into the fragment type of `attribute`.
    pub fn from_attribute_value(attribute: FontAttribute, value: Value) -> ChangeResult<Self> {
        Ok(match attribute {
            FontAttribute::GlyphMap => Fragment::GlyphMap(cast(value)?),
            FontAttribute::Axes => Fragment::Axes(cast(value)?),
            FontAttribute::UnitsPerEm => Fragment::UnitsPerEm(cast(value)?),
            FontAttribute::Lib => Fragment::Lib(cast(value)?),
        })
    }

    fn inner_mut(&mut self) -> &mut dyn ChangeSubject {
        match self {
            Fragment::GlyphMap(glyph_map) => glyph_map,
            Fragment::Axes(axes) => axes,
            Fragment::UnitsPerEm(units_per_em) => units_per_em,
            Fragment::Lib(lib) => lib,
            Fragment::Glyph(glyph) => glyph,
        }
    }
}

impl ChangeSubject for Fragment {
    fn child_mut(&mut self, segment: &PathSegment) -> ChangeResult<&mut dyn ChangeSubject> {
        self.inner_mut().child_mut(segment)
    }

    fn set_item(&mut self, key: &PathSegment, item: Value) -> ChangeResult<()> {
        self.inner_mut().set_item(key, item)
    }

    fn delete_item(&mut self, key: &PathSegment) -> ChangeResult<()> {
        self.inner_mut().delete_item(key)
    }

    fn splice_items(
        &mut self,
        index: i64,
        delete_count: usize,
        items: Vec<Value>,
    ) -> ChangeResult<()> {
        self.inner_mut().splice_items(index, delete_count, items)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self.inner_mut().as_any_mut()
    }

    fn type_name(&self) -> &'static str {
        match self {
            Fragment::GlyphMap(_) | Fragment::Lib(_) => "dict",
            Fragment::Axes(_) => "list",
            Fragment::UnitsPerEm(_) => "i64",
            Fragment::Glyph(Some(_)) => "VariableGlyph",
            Fragment::Glyph(None) => "None",
        }
    }
}

pub type SharedLoad = Shared<BoxFuture<'static, Result<Fragment, BackendError>>>;

pub enum CacheEntry {
    Ready(Fragment),
    Loading(SharedLoad),
}

pub struct LocalCache {
    entries: LruCache<FragmentKey, CacheEntry>,
}

impl LocalCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Look up `key`, marking it recently used.
    pub fn get(&mut self, key: &FragmentKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn peek_ready(&self, key: &FragmentKey) -> Option<&Fragment> {
        match self.entries.peek(key) {
            Some(CacheEntry::Ready(fragment)) => Some(fragment),
            _ => None,
        }
    }

    pub fn is_ready(&self, key: &FragmentKey) -> bool {
        self.peek_ready(key).is_some()
    }

    pub fn insert_ready(&mut self, key: FragmentKey, fragment: Fragment) {
        self.entries.put(key, CacheEntry::Ready(fragment));
    }

    pub fn insert_loading(&mut self, key: FragmentKey, load: SharedLoad) {
        self.entries.put(key, CacheEntry::Loading(load));
    }

    /// True when `key` is still waiting on exactly `load`.
    pub fn is_loading(&self, key: &FragmentKey, load: &SharedLoad) -> bool {
        matches!(self.entries.peek(key), Some(CacheEntry::Loading(current)) if current.ptr_eq(load))
    }

    pub fn remove(&mut self, key: &FragmentKey) -> bool {
        self.entries.pop(key).is_some()
    }

    pub fn remove_all_glyphs(&mut self) -> usize {
        let glyph_keys: Vec<FragmentKey> = self
            .entries
            .iter()
            .map(|(key, _)| key)
            .filter(|key| key.glyph_name().is_some())
            .cloned()
            .collect();
        for key in &glyph_keys {
            self.entries.pop(key);
        }
        glyph_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Everything currently held, as a pattern over the root object.
    pub fn local_data_pattern(&self) -> Pattern {
        self.entries
            .iter()
            .filter(|(_, entry)| matches!(entry, CacheEntry::Ready(_)))
            .map(|(key, _)| key.path())
            .collect()
    }
}
