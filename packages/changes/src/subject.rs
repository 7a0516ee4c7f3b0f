//! # Change subjects
//!
//! Anything a change can navigate into or mutate implements [`ChangeSubject`].
//! Containers (`Vec`, maps, JSON values) index by key or position; typed
//! structs expose their fields through [`impl_change_subject!`], which doubles
//! as the static field table of the data model. Assigning into a typed slot
//! deserializes the JSON argument into the slot's type, so list items and map
//! values are constructed as the right class without runtime reflection.

use crate::{ChangeError, ChangeResult, PathSegment};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::Any;

pub trait ChangeSubject: Any {
    /// Navigate one path segment deeper.
    fn child_mut(&mut self, segment: &PathSegment) -> ChangeResult<&mut dyn ChangeSubject>;

    /// Assign `item` at `key` (the `=` function).
    fn set_item(&mut self, key: &PathSegment, item: Value) -> ChangeResult<()>;

    /// Remove the entry at `key` (the `d` function).
    fn delete_item(&mut self, _key: &PathSegment) -> ChangeResult<()> {
        Err(ChangeError::Unsupported {
            function: "d",
            type_name: self.type_name(),
        })
    }

    /// Replace `delete_count` items starting at `index` with `items`.
    fn splice_items(
        &mut self,
        _index: i64,
        _delete_count: usize,
        _items: Vec<Value>,
    ) -> ChangeResult<()> {
        Err(ChangeError::Unsupported {
            function: ":",
            type_name: self.type_name(),
        })
    }

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn type_name(&self) -> &'static str;
}

/// Deserialize a change argument into a typed slot.
pub fn cast<T: DeserializeOwned>(item: Value) -> ChangeResult<T> {
    Ok(serde_json::from_value(item)?)
}

/// Resolve a possibly negative position against a sequence of `len` items.
///
/// `allow_end` admits `index == len` (insertion point).
pub fn resolve_index(index: i64, len: usize, allow_end: bool) -> ChangeResult<usize> {
    let resolved = if index < 0 { index + len as i64 } else { index };
    let limit = if allow_end { len as i64 + 1 } else { len as i64 };
    if resolved < 0 || resolved >= limit {
        return Err(ChangeError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}

/// Slice-style range: negative start counts from the end, both ends clamp.
fn splice_range(index: i64, delete_count: usize, len: usize) -> (usize, usize) {
    let start = if index < 0 {
        (index + len as i64).max(0) as usize
    } else {
        (index as usize).min(len)
    };
    let end = start.saturating_add(delete_count).min(len);
    (start, end)
}

fn sequence_index(segment: &PathSegment, len: usize) -> ChangeResult<usize> {
    match segment {
        PathSegment::Index(index) => resolve_index(*index, len, false),
        PathSegment::Key(key) => key
            .parse::<i64>()
            .map_err(|_| ChangeError::key_not_found(segment))
            .and_then(|index| resolve_index(index, len, false)),
    }
}

impl<T> ChangeSubject for Vec<T>
where
    T: ChangeSubject + DeserializeOwned,
{
    fn child_mut(&mut self, segment: &PathSegment) -> ChangeResult<&mut dyn ChangeSubject> {
        let index = sequence_index(segment, self.len())?;
        Ok(&mut self[index])
    }

    fn set_item(&mut self, key: &PathSegment, item: Value) -> ChangeResult<()> {
        let index = sequence_index(key, self.len())?;
        self[index] = cast(item)?;
        Ok(())
    }

    fn splice_items(
        &mut self,
        index: i64,
        delete_count: usize,
        items: Vec<Value>,
    ) -> ChangeResult<()> {
        let items = items.into_iter().map(cast).collect::<ChangeResult<Vec<T>>>()?;
        let (start, end) = splice_range(index, delete_count, self.len());
        self.splice(start..end, items);
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        "list"
    }
}

impl<T> ChangeSubject for IndexMap<String, T>
where
    T: ChangeSubject + DeserializeOwned,
{
    fn child_mut(&mut self, segment: &PathSegment) -> ChangeResult<&mut dyn ChangeSubject> {
        match self.get_mut(&segment.to_key()) {
            Some(value) => Ok(value),
            None => Err(ChangeError::key_not_found(segment)),
        }
    }

    fn set_item(&mut self, key: &PathSegment, item: Value) -> ChangeResult<()> {
        self.insert(key.to_key(), cast(item)?);
        Ok(())
    }

    fn delete_item(&mut self, key: &PathSegment) -> ChangeResult<()> {
        self.shift_remove(&key.to_key())
            .map(|_| ())
            .ok_or_else(|| ChangeError::key_not_found(key))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        "dict"
    }
}

impl ChangeSubject for Map<String, Value> {
    fn child_mut(&mut self, segment: &PathSegment) -> ChangeResult<&mut dyn ChangeSubject> {
        match self.get_mut(&segment.to_key()) {
            Some(value) => Ok(value),
            None => Err(ChangeError::key_not_found(segment)),
        }
    }

    fn set_item(&mut self, key: &PathSegment, item: Value) -> ChangeResult<()> {
        self.insert(key.to_key(), item);
        Ok(())
    }

    fn delete_item(&mut self, key: &PathSegment) -> ChangeResult<()> {
        self.shift_remove(&key.to_key())
            .map(|_| ())
            .ok_or_else(|| ChangeError::key_not_found(key))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        "dict"
    }
}

impl ChangeSubject for Value {
    fn child_mut(&mut self, segment: &PathSegment) -> ChangeResult<&mut dyn ChangeSubject> {
        match self {
            Value::Object(map) => map.child_mut(segment),
            Value::Array(items) => {
                let index = sequence_index(segment, items.len())?;
                Ok(&mut items[index])
            }
            _ => Err(ChangeError::NotAContainer {
                type_name: json_type_name(self),
            }),
        }
    }

    fn set_item(&mut self, key: &PathSegment, item: Value) -> ChangeResult<()> {
        match self {
            Value::Object(map) => map.set_item(key, item),
            Value::Array(items) => {
                let index = sequence_index(key, items.len())?;
                items[index] = item;
                Ok(())
            }
            _ => Err(ChangeError::NotAContainer {
                type_name: json_type_name(self),
            }),
        }
    }

    fn delete_item(&mut self, key: &PathSegment) -> ChangeResult<()> {
        match self {
            Value::Object(map) => map.delete_item(key),
            _ => Err(ChangeError::Unsupported {
                function: "d",
                type_name: json_type_name(self),
            }),
        }
    }

    fn splice_items(
        &mut self,
        index: i64,
        delete_count: usize,
        items: Vec<Value>,
    ) -> ChangeResult<()> {
        match self {
            Value::Array(existing) => {
                let (start, end) = splice_range(index, delete_count, existing.len());
                existing.splice(start..end, items);
                Ok(())
            }
            _ => Err(ChangeError::Unsupported {
                function: ":",
                type_name: json_type_name(self),
            }),
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        json_type_name(self)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Optional fields delegate to their value when present.
impl<T> ChangeSubject for Option<T>
where
    T: ChangeSubject,
{
    fn child_mut(&mut self, segment: &PathSegment) -> ChangeResult<&mut dyn ChangeSubject> {
        match self {
            Some(value) => value.child_mut(segment),
            None => Err(ChangeError::NotAContainer { type_name: "None" }),
        }
    }

    fn set_item(&mut self, key: &PathSegment, item: Value) -> ChangeResult<()> {
        match self {
            Some(value) => value.set_item(key, item),
            None => Err(ChangeError::NotAContainer { type_name: "None" }),
        }
    }

    fn delete_item(&mut self, key: &PathSegment) -> ChangeResult<()> {
        match self {
            Some(value) => value.delete_item(key),
            None => Err(ChangeError::NotAContainer { type_name: "None" }),
        }
    }

    fn splice_items(
        &mut self,
        index: i64,
        delete_count: usize,
        items: Vec<Value>,
    ) -> ChangeResult<()> {
        match self {
            Some(value) => value.splice_items(index, delete_count, items),
            None => Err(ChangeError::NotAContainer { type_name: "None" }),
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        match self {
            Some(value) => value.type_name(),
            None => "None",
        }
    }
}

/// Implement [`ChangeSubject`] for scalar types that can be assigned but
/// not navigated into.
#[macro_export]
macro_rules! impl_leaf_subject {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::ChangeSubject for $ty {
                fn child_mut(
                    &mut self,
                    _segment: &$crate::PathSegment,
                ) -> $crate::ChangeResult<&mut dyn $crate::ChangeSubject> {
                    Err($crate::ChangeError::NotAContainer {
                        type_name: stringify!($ty),
                    })
                }

                fn set_item(
                    &mut self,
                    _key: &$crate::PathSegment,
                    _item: $crate::Value,
                ) -> $crate::ChangeResult<()> {
                    Err($crate::ChangeError::NotAContainer {
                        type_name: stringify!($ty),
                    })
                }

                fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                    self
                }

                fn type_name(&self) -> &'static str {
                    stringify!($ty)
                }
            }
        )*
    };
}

impl_leaf_subject!(bool, i64, u32, usize, f64, String);

/// Implement [`ChangeSubject`] for a struct from its field table.
///
/// Each entry maps the wire name of a field to the struct field. Assigning
/// casts the argument into the field's type; deleting resets the field to
/// its default.
///
/// ```rust,ignore
/// impl_change_subject!(Component {
///     "name" => name,
///     "transformation" => transformation,
///     "location" => location,
/// });
/// ```
#[macro_export]
macro_rules! impl_change_subject {
    ($ty:ident { $($name:literal => $field:ident),* $(,)? }) => {
        impl $crate::ChangeSubject for $ty {
            fn child_mut(
                &mut self,
                segment: &$crate::PathSegment,
            ) -> $crate::ChangeResult<&mut dyn $crate::ChangeSubject> {
                match segment.as_key() {
                    $(Some($name) => Ok(&mut self.$field),)*
                    _ => Err($crate::ChangeError::no_such_field(stringify!($ty), segment)),
                }
            }

            fn set_item(
                &mut self,
                key: &$crate::PathSegment,
                item: $crate::Value,
            ) -> $crate::ChangeResult<()> {
                match key.as_key() {
                    $(Some($name) => {
                        self.$field = $crate::cast(item)?;
                        Ok(())
                    })*
                    _ => Err($crate::ChangeError::no_such_field(stringify!($ty), key)),
                }
            }

            fn delete_item(&mut self, key: &$crate::PathSegment) -> $crate::ChangeResult<()> {
                match key.as_key() {
                    $(Some($name) => {
                        self.$field = Default::default();
                        Ok(())
                    })*
                    _ => Err($crate::ChangeError::no_such_field(stringify!($ty), key)),
                }
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }
        }
    };
}
