//! Structural edits over a document tree.
//!
//! All operations are [`Engine`] methods because names and strings are
//! copied through the engine's allocator and removed nodes are released
//! into it. An operation that takes ownership of a node releases that node
//! when it fails, so the caller never has to clean up after an error.

use std::borrow::Cow;

use super::types::{Node, Value};
use crate::alloc::Allocator;
use crate::engine::Engine;
use crate::error::{ErrorCode, JsonResult};

fn index_not_found(index: usize) -> ErrorCode {
    ErrorCode::E203_ItemNotFound(format!("index {index}"))
}

fn key_not_found(name: &str) -> ErrorCode {
    ErrorCode::E203_ItemNotFound(format!("key {name:?}"))
}

/// Collapse alias-of-alias so a reference always points at real data.
fn reference_to<'a>(target: &'a Node<'a>) -> Node<'a> {
    match target.value {
        Value::Reference(inner) => reference_to(inner),
        _ => Node::new(Value::Reference(target)),
    }
}

impl<A: Allocator> Engine<A> {
    /// Release `item` and hand back `error`.
    fn reject<'a>(&self, item: Node<'a>, error: ErrorCode) -> ErrorCode {
        self.delete(item);
        error
    }

    fn rename<'a>(&self, item: &mut Node<'a>, name: Cow<'a, str>) {
        if let Some(Cow::Owned(old)) = item.name.replace(name) {
            self.release_text(old);
        }
    }

    /// Give `item` an owned copy of `name`, releasing it on failure.
    fn named<'a>(&self, mut item: Node<'a>, name: &str) -> JsonResult<Node<'a>> {
        match self.dup_str(name) {
            Ok(copy) => {
                self.rename(&mut item, Cow::Owned(copy));
                Ok(item)
            }
            Err(e) => Err(self.reject(item, e)),
        }
    }

    // ========================================================================
    // Adding
    // ========================================================================

    /// Append `item` to an array (or object).
    pub fn add_to_array<'a>(&self, array: &mut Node<'a>, item: Node<'a>) -> JsonResult<()> {
        match array.items_mut() {
            Ok(items) => {
                items.push(item);
                Ok(())
            }
            Err(e) => Err(self.reject(item, e)),
        }
    }

    /// Append `item` to an object under an owned copy of `name`.
    ///
    /// Any name `item` already carried is replaced.
    pub fn add_to_object<'a>(
        &self,
        object: &mut Node<'a>,
        name: &str,
        item: Node<'a>,
    ) -> JsonResult<()> {
        if let Err(e) = object.items_mut() {
            return Err(self.reject(item, e));
        }
        let item = self.named(item, name)?;
        self.add_to_array(object, item)
    }

    /// Append `item` to an object under a borrowed `name` that is never
    /// copied or released.
    pub fn add_to_object_cs<'a>(
        &self,
        object: &mut Node<'a>,
        name: &'a str,
        mut item: Node<'a>,
    ) -> JsonResult<()> {
        if let Err(e) = object.items_mut() {
            return Err(self.reject(item, e));
        }
        self.rename(&mut item, Cow::Borrowed(name));
        self.add_to_array(object, item)
    }

    /// Append an alias of `target` to an array. Deleting the array never
    /// touches `target`.
    pub fn add_reference_to_array<'a>(
        &self,
        array: &mut Node<'a>,
        target: &'a Node<'a>,
    ) -> JsonResult<()> {
        self.add_to_array(array, reference_to(target))
    }

    /// Append an alias of `target` to an object under an owned copy of `name`.
    pub fn add_reference_to_object<'a>(
        &self,
        object: &mut Node<'a>,
        name: &str,
        target: &'a Node<'a>,
    ) -> JsonResult<()> {
        self.add_to_object(object, name, reference_to(target))
    }

    /// Add a `null` member.
    pub fn add_null_to_object(&self, object: &mut Node<'_>, name: &str) -> JsonResult<()> {
        self.add_to_object(object, name, Node::null())
    }

    /// Add a `true` member.
    pub fn add_true_to_object(&self, object: &mut Node<'_>, name: &str) -> JsonResult<()> {
        self.add_to_object(object, name, Node::bool(true))
    }

    /// Add a `false` member.
    pub fn add_false_to_object(&self, object: &mut Node<'_>, name: &str) -> JsonResult<()> {
        self.add_to_object(object, name, Node::bool(false))
    }

    /// Add a boolean member.
    pub fn add_bool_to_object(
        &self,
        object: &mut Node<'_>,
        name: &str,
        value: bool,
    ) -> JsonResult<()> {
        self.add_to_object(object, name, Node::bool(value))
    }

    /// Add a number member.
    pub fn add_number_to_object(
        &self,
        object: &mut Node<'_>,
        name: &str,
        value: u32,
    ) -> JsonResult<()> {
        self.add_to_object(object, name, Node::number(value))
    }

    /// Add a string member holding a copy of `value`.
    pub fn add_string_to_object(
        &self,
        object: &mut Node<'_>,
        name: &str,
        value: &str,
    ) -> JsonResult<()> {
        let item = self.create_string(value)?;
        self.add_to_object(object, name, item)
    }

    /// Add a raw member holding a copy of `text`.
    pub fn add_raw_to_object(&self, object: &mut Node<'_>, name: &str, text: &str) -> JsonResult<()> {
        let item = self.create_raw(text)?;
        self.add_to_object(object, name, item)
    }

    /// Array of numbers.
    pub fn create_int_array<'a>(&self, numbers: &[u32]) -> Node<'a> {
        Node::new(Value::Array(numbers.iter().copied().map(Node::number).collect()))
    }

    /// Array of string copies. Nothing is kept if any copy fails.
    pub fn create_string_array<'a>(&self, strings: &[&str]) -> JsonResult<Node<'a>> {
        let mut array = Node::array();
        for s in strings {
            let item = match self.create_string(s) {
                Ok(item) => item,
                Err(e) => return Err(self.reject(array, e)),
            };
            self.add_to_array(&mut array, item)?;
        }
        Ok(array)
    }

    // ========================================================================
    // Removing
    // ========================================================================

    /// Unlink the child at `index` and hand it back.
    pub fn detach_from_array<'a>(&self, array: &mut Node<'a>, index: usize) -> JsonResult<Node<'a>> {
        let items = array.items_mut()?;
        if index >= items.len() {
            return Err(index_not_found(index));
        }
        Ok(items.remove(index))
    }

    /// Unlink the first member named `name` (ASCII case-insensitive) and
    /// hand it back. The member keeps its name.
    pub fn detach_from_object<'a>(&self, object: &mut Node<'a>, name: &str) -> JsonResult<Node<'a>> {
        let items = object.items_mut()?;
        let index = items
            .iter()
            .position(|item| item.name_matches(name))
            .ok_or_else(|| key_not_found(name))?;
        Ok(items.remove(index))
    }

    /// Remove and release the child at `index`.
    pub fn delete_from_array(&self, array: &mut Node<'_>, index: usize) -> JsonResult<()> {
        let item = self.detach_from_array(array, index)?;
        self.delete(item);
        Ok(())
    }

    /// Remove and release the first member named `name`.
    pub fn delete_from_object(&self, object: &mut Node<'_>, name: &str) -> JsonResult<()> {
        let item = self.detach_from_object(object, name)?;
        self.delete(item);
        Ok(())
    }

    // ========================================================================
    // Splicing
    // ========================================================================

    /// Insert `item` before the child at `index`, or append when `index` is
    /// past the end.
    pub fn insert_in_array<'a>(
        &self,
        array: &mut Node<'a>,
        index: usize,
        item: Node<'a>,
    ) -> JsonResult<()> {
        let items = match array.items_mut() {
            Ok(items) => items,
            Err(e) => return Err(self.reject(item, e)),
        };
        if index >= items.len() {
            items.push(item);
        } else {
            items.insert(index, item);
        }
        Ok(())
    }

    /// Put `item` in place of the child at `index` and release the old child.
    pub fn replace_in_array<'a>(
        &self,
        array: &mut Node<'a>,
        index: usize,
        item: Node<'a>,
    ) -> JsonResult<()> {
        let items = match array.items_mut() {
            Ok(items) => items,
            Err(e) => return Err(self.reject(item, e)),
        };
        let Some(slot) = items.get_mut(index) else {
            return Err(self.reject(item, index_not_found(index)));
        };
        let old = std::mem::replace(slot, item);
        self.delete(old);
        Ok(())
    }

    /// Put `item` in place of the first member named `name`, giving it an
    /// owned copy of `name`, and release the old member.
    pub fn replace_in_object<'a>(
        &self,
        object: &mut Node<'a>,
        name: &str,
        item: Node<'a>,
    ) -> JsonResult<()> {
        let index = match object.items_mut() {
            Ok(items) => items.iter().position(|member| member.name_matches(name)),
            Err(e) => return Err(self.reject(item, e)),
        };
        let Some(index) = index else {
            return Err(self.reject(item, key_not_found(name)));
        };
        let item = self.named(item, name)?;
        self.replace_in_array(object, index, item)
    }

    // ========================================================================
    // Copying
    // ========================================================================

    /// Copy `node`, and with `recurse` everything below it.
    ///
    /// The copy is never a reference: duplicating an alias copies the target's
    /// data. A borrowed name stays borrowed; owned strings are copied.
    pub fn duplicate<'a>(&self, node: &Node<'a>, recurse: bool) -> JsonResult<Node<'a>> {
        let value = match node.value.resolve() {
            Value::Null | Value::Reference(_) => Value::Null,
            Value::False => Value::False,
            Value::True => Value::True,
            Value::Number(n) => Value::Number(*n),
            Value::String(s) => Value::String(Cow::Owned(self.dup_str(s)?)),
            Value::Raw(text) => Value::Raw(Cow::Owned(self.dup_str(text)?)),
            Value::Array(items) => Value::Array(self.duplicate_children(items, recurse)?),
            Value::Object(members) => Value::Object(self.duplicate_children(members, recurse)?),
        };
        let copy = Node::new(value);
        match &node.name {
            None => Ok(copy),
            Some(Cow::Borrowed(name)) => Ok(Node {
                name: Some(Cow::Borrowed(*name)),
                ..copy
            }),
            Some(Cow::Owned(name)) => self.named(copy, name),
        }
    }

    fn duplicate_children<'a>(&self, items: &[Node<'a>], recurse: bool) -> JsonResult<Vec<Node<'a>>> {
        if !recurse {
            return Ok(Vec::new());
        }
        let mut copies = Vec::with_capacity(items.len());
        for item in items {
            match self.duplicate(item, true) {
                Ok(copy) => copies.push(copy),
                Err(e) => {
                    for copy in copies {
                        self.delete(copy);
                    }
                    return Err(e);
                }
            }
        }
        Ok(copies)
    }
}
