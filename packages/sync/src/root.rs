//! # Root object
//!
//! The minimal font object a change is applied to: only the fragments the
//! change names are present. Glyphs sit behind a [`GlyphSet`] that remembers
//! which glyphs existed before, so the handler can tell creations,
//! updates and deletions apart afterwards.
//!
//! ```text
//! RootObject
//! ├── "glyphMap"   -> Fragment::GlyphMap     (only if named)
//! ├── "unitsPerEm" -> Fragment::UnitsPerEm   (only if named)
//! └── "glyphs"     -> GlyphSet { "A" -> Some(glyph), "B" -> None }
//! ```

use crate::cache::{FontAttribute, Fragment, FragmentKey, GLYPHS_KEY};
use crate::error::{SyncError, SyncResult};
use glyphhub_changes::{
    cast, collect_change_paths, Change, ChangeError, ChangeResult, ChangeSubject, Operation,
    PathSegment, Value,
};
use glyphhub_model::VariableGlyph;
use indexmap::IndexMap;
use std::any::Any;
use std::collections::BTreeSet;

/// All fragments `change` needs loaded before it can be applied.
///
/// Root keys come from the first path segment of every branch and from the
/// key argument of `=`/`d` applied at the root. Glyph names come from the
/// second segment under `glyphs` and from `=`/`d` applied at `["glyphs"]`.
pub fn collect_fragment_keys(change: &Change) -> SyncResult<Vec<FragmentKey>> {
    let mut root_keys: BTreeSet<String> = collect_change_paths(change, 1)
        .into_iter()
        .map(|path| path[0].to_key())
        .collect();
    collect_key_arguments(change, &[], &[], &mut root_keys);

    let mut keys = BTreeSet::new();
    for root_key in root_keys {
        if root_key == GLYPHS_KEY {
            let mut glyph_names: BTreeSet<String> = collect_change_paths(change, 2)
                .into_iter()
                .filter(|path| path[0].as_key() == Some(GLYPHS_KEY))
                .map(|path| path[1].to_key())
                .collect();
            collect_key_arguments(change, &[], &[GLYPHS_KEY.into()], &mut glyph_names);
            keys.extend(glyph_names.into_iter().map(FragmentKey::Glyph));
        } else {
            let attribute =
                FontAttribute::from_key(&root_key).ok_or(SyncError::UnknownRootKey(root_key))?;
            keys.insert(FragmentKey::Attribute(attribute));
        }
    }
    Ok(keys.into_iter().collect())
}

/// Key arguments of `=`/`d` functions applied exactly at `target`.
fn collect_key_arguments(
    change: &Change,
    prefix: &[PathSegment],
    target: &[PathSegment],
    keys: &mut BTreeSet<String>,
) {
    let mut path = prefix.to_vec();
    path.extend(change.path.iter().cloned());
    if path.len() > target.len() || !target.starts_with(&path) {
        return;
    }
    if path == target {
        let keyed = change
            .function
            .as_deref()
            .map(|function| {
                matches!(Operation::parse(function), Operation::Set | Operation::DeleteKey)
            })
            .unwrap_or(false);
        let key = change.arguments.first().and_then(PathSegment::from_value);
        if let Some(key) = key.filter(|_| keyed) {
            keys.insert(key.to_key());
        }
    }
    for child in &change.children {
        collect_key_arguments(child, &path, target, keys);
    }
}

/// What happened to a fragment while a change was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentUpdate {
    Created,
    Updated,
    Deleted,
    /// A glyph that was absent and still is
    Absent,
}

/// Glyphs named by a change; `None` for glyphs that do not exist.
#[derive(Debug, Default)]
pub struct GlyphSet {
    glyphs: IndexMap<String, Option<VariableGlyph>>,
    existing: BTreeSet<String>,
}

impl GlyphSet {
    fn insert(&mut self, glyph_name: String, glyph: Option<VariableGlyph>) {
        if glyph.is_some() {
            self.existing.insert(glyph_name.clone());
        }
        self.glyphs.insert(glyph_name, glyph);
    }
}

impl ChangeSubject for GlyphSet {
    fn child_mut(&mut self, segment: &PathSegment) -> ChangeResult<&mut dyn ChangeSubject> {
        match self.glyphs.get_mut(&segment.to_key()) {
            Some(Some(glyph)) => Ok(glyph),
            _ => Err(ChangeError::key_not_found(segment)),
        }
    }

    fn set_item(&mut self, key: &PathSegment, item: Value) -> ChangeResult<()> {
        let glyph: VariableGlyph = cast(item)?;
        self.glyphs.insert(key.to_key(), Some(glyph));
        Ok(())
    }

    fn delete_item(&mut self, key: &PathSegment) -> ChangeResult<()> {
        match self.glyphs.get_mut(&key.to_key()) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                Ok(())
            }
            _ => Err(ChangeError::key_not_found(key)),
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        "GlyphSet"
    }
}

#[derive(Debug, Default)]
pub struct RootObject {
    attributes: IndexMap<FontAttribute, Fragment>,
    glyphs: GlyphSet,
}

impl RootObject {
    pub fn new(fragments: impl IntoIterator<Item = (FragmentKey, Fragment)>) -> Self {
        let mut root = RootObject::default();
        for (key, fragment) in fragments {
            match (key, fragment) {
                (FragmentKey::Glyph(glyph_name), Fragment::Glyph(glyph)) => {
                    root.glyphs.insert(glyph_name, glyph)
                }
                (FragmentKey::Attribute(attribute), fragment) => {
                    root.attributes.insert(attribute, fragment);
                }
                (FragmentKey::Glyph(glyph_name), fragment) => {
                    tracing::warn!(
                        "ignoring non-glyph fragment {:?} for glyph {}",
                        fragment,
                        glyph_name
                    );
                }
            }
        }
        root
    }

    pub fn attribute(&self, attribute: FontAttribute) -> Option<&Fragment> {
        self.attributes.get(&attribute)
    }

    /// Every fragment of this root with what the change did to it.
    pub fn into_updates(self) -> Vec<(FragmentKey, Fragment, FragmentUpdate)> {
        let mut updates: Vec<_> = self
            .attributes
            .into_iter()
            .map(|(attribute, fragment)| {
                (FragmentKey::Attribute(attribute), fragment, FragmentUpdate::Updated)
            })
            .collect();

        let existing = self.glyphs.existing;
        for (glyph_name, glyph) in self.glyphs.glyphs {
            let update = match (existing.contains(&glyph_name), glyph.is_some()) {
                (false, true) => FragmentUpdate::Created,
                (true, true) => FragmentUpdate::Updated,
                (true, false) => FragmentUpdate::Deleted,
                (false, false) => FragmentUpdate::Absent,
            };
            updates.push((FragmentKey::Glyph(glyph_name), Fragment::Glyph(glyph), update));
        }
        updates
    }
}

impl ChangeSubject for RootObject {
    fn child_mut(&mut self, segment: &PathSegment) -> ChangeResult<&mut dyn ChangeSubject> {
        let key = segment.to_key();
        if key == GLYPHS_KEY {
            return Ok(&mut self.glyphs);
        }
        match FontAttribute::from_key(&key) {
            Some(attribute) => match self.attributes.get_mut(&attribute) {
                Some(fragment) => Ok(fragment),
                None => Err(ChangeError::key_not_found(segment)),
            },
            None => Err(ChangeError::no_such_field("Font", segment)),
        }
    }

    fn set_item(&mut self, key: &PathSegment, item: Value) -> ChangeResult<()> {
        match FontAttribute::from_key(&key.to_key()) {
            Some(attribute) => {
                self.attributes
                    .insert(attribute, Fragment::from_attribute_value(attribute, item)?);
                Ok(())
            }
            None => Err(ChangeError::no_such_field("Font", key)),
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        "Font"
    }
}
