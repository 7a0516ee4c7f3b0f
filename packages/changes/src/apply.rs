//! # Applying changes
//!
//! `apply_change` walks the change path against a subject, invokes the
//! change function at the navigated subject and recurses into the children
//! against that same subject. The subject is mutated in place.
//!
//! Function names resolve to an [`Operation`]: the generic container
//! operations are a closed set, everything else is looked up in the
//! [`ChangeFunctions`] table where domain layers register their own.

use crate::{cast, Change, ChangeError, ChangeResult, ChangeSubject, PathSegment};
use serde_json::Value;
use std::collections::HashMap;

/// Signature of a registered domain-specific change function.
pub type ChangeFunction = fn(&mut dyn ChangeSubject, &[Value]) -> ChangeResult<()>;

/// Change function resolved from its wire name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a> {
    /// `"="`: `(key, item)`
    Set,
    /// `"d"`: `(key)`
    DeleteKey,
    /// `"-"`: `(index, deleteCount = 1)`
    DeleteItems,
    /// `"+"`: `(index, ...items)`
    InsertItems,
    /// `":"`: `(index, deleteCount, ...items)`
    SpliceItems,
    /// Anything else, looked up in the registry
    Registered(&'a str),
}

impl<'a> Operation<'a> {
    pub fn parse(name: &'a str) -> Self {
        match name {
            "=" => Operation::Set,
            "d" => Operation::DeleteKey,
            "-" => Operation::DeleteItems,
            "+" => Operation::InsertItems,
            ":" => Operation::SpliceItems,
            other => Operation::Registered(other),
        }
    }
}

/// Registry of domain-specific change functions
#[derive(Clone, Default)]
pub struct ChangeFunctions {
    registered: HashMap<&'static str, ChangeFunction>,
}

impl ChangeFunctions {
    /// Registry with only the generic container operations
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, function: ChangeFunction) {
        self.registered.insert(name, function);
    }

    pub fn contains(&self, name: &str) -> bool {
        match Operation::parse(name) {
            Operation::Registered(name) => self.registered.contains_key(name),
            _ => true,
        }
    }

    /// Invoke the function called `name` on `subject`.
    pub fn call(
        &self,
        name: &str,
        subject: &mut dyn ChangeSubject,
        arguments: &[Value],
    ) -> ChangeResult<()> {
        match Operation::parse(name) {
            Operation::Set => {
                let key = key_argument(name, arguments, 0)?;
                let item = arguments
                    .get(1)
                    .cloned()
                    .ok_or_else(|| ChangeError::invalid_arguments(name, "missing item"))?;
                subject.set_item(&key, item)
            }
            Operation::DeleteKey => {
                let key = key_argument(name, arguments, 0)?;
                subject.delete_item(&key)
            }
            Operation::DeleteItems => {
                let index = int_argument(name, arguments, 0)?;
                let delete_count = match arguments.get(1) {
                    Some(_) => count_argument(name, arguments, 1)?,
                    None => 1,
                };
                subject.splice_items(index, delete_count, Vec::new())
            }
            Operation::InsertItems => {
                let index = int_argument(name, arguments, 0)?;
                subject.splice_items(index, 0, arguments[1..].to_vec())
            }
            Operation::SpliceItems => {
                let index = int_argument(name, arguments, 0)?;
                let delete_count = count_argument(name, arguments, 1)?;
                subject.splice_items(index, delete_count, arguments[2..].to_vec())
            }
            Operation::Registered(registered) => match self.registered.get(registered) {
                Some(function) => function(subject, arguments),
                None => Err(ChangeError::UnknownFunction(registered.to_string())),
            },
        }
    }
}

/// Apply `change` to `subject` in place.
pub fn apply_change(
    subject: &mut dyn ChangeSubject,
    change: &Change,
    functions: &ChangeFunctions,
) -> ChangeResult<()> {
    let mut subject = subject;
    for segment in &change.path {
        subject = subject.child_mut(segment)?;
    }

    if let Some(function) = &change.function {
        functions.call(function, &mut *subject, &change.arguments)?;
    }

    for child in &change.children {
        apply_change(&mut *subject, child, functions)?;
    }

    Ok(())
}

fn key_argument(function: &str, arguments: &[Value], position: usize) -> ChangeResult<PathSegment> {
    arguments
        .get(position)
        .and_then(PathSegment::from_value)
        .ok_or_else(|| {
            ChangeError::invalid_arguments(
                function,
                format!("argument {} must be a key or index", position),
            )
        })
}

/// Integer argument of a change function.
pub fn int_argument(function: &str, arguments: &[Value], position: usize) -> ChangeResult<i64> {
    arguments
        .get(position)
        .and_then(Value::as_i64)
        .ok_or_else(|| {
            ChangeError::invalid_arguments(
                function,
                format!("argument {} must be an integer", position),
            )
        })
}

/// Non-negative integer argument of a change function.
pub fn count_argument(function: &str, arguments: &[Value], position: usize) -> ChangeResult<usize> {
    arguments
        .get(position)
        .and_then(Value::as_u64)
        .map(|count| count as usize)
        .ok_or_else(|| {
            ChangeError::invalid_arguments(
                function,
                format!("argument {} must be a count", position),
            )
        })
}

/// Number argument of a change function.
pub fn number_argument(function: &str, arguments: &[Value], position: usize) -> ChangeResult<f64> {
    arguments
        .get(position)
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            ChangeError::invalid_arguments(
                function,
                format!("argument {} must be a number", position),
            )
        })
}

/// Typed argument of a change function.
pub fn typed_argument<T: serde::de::DeserializeOwned>(
    function: &str,
    arguments: &[Value],
    position: usize,
) -> ChangeResult<T> {
    let value = arguments
        .get(position)
        .cloned()
        .ok_or_else(|| {
            ChangeError::invalid_arguments(
                function,
                format!("missing argument {}", position),
            )
        })?;
    cast(value)
}
