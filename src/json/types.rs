//! Document tree types.
//!
//! A document is a tree of [`Node`]s. Each node carries an optional member
//! name and a [`Value`]; arrays and objects own their children as an ordered
//! `Vec`, so sibling order is position and a detached node never points back
//! into its old parent.
//!
//! Ownership is encoded in the types rather than in flag bits:
//!
//! - A member name is a `Cow<'a, str>`. `Cow::Borrowed` is a constant name
//!   the tree never frees; `Cow::Owned` is released with the node.
//! - [`Value::Reference`] aliases another node. The borrow ties the alias to
//!   the target's lifetime, and releasing the alias never touches the target.

use std::borrow::Cow;
use std::fmt;

use crate::alloc::Allocator;
use crate::error::{ErrorCode, JsonResult};

/// Base kind of a node, looking through references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `null`
    Null,
    /// `false`
    False,
    /// `true`
    True,
    /// Saturating unsigned 32-bit integer
    Number,
    /// Escaped on output
    String,
    /// Emitted verbatim on output
    Raw,
    /// Ordered list of unnamed children
    Array,
    /// Ordered list of named children
    Object,
}

impl Kind {
    /// Returns the kind name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::False | Kind::True => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Raw => "raw",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

/// Payload of a node.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    /// `null`
    Null,
    /// `false`
    False,
    /// `true`
    True,
    /// Integer clamped to `0..=u32::MAX`
    Number(u32),
    /// Unescaped string contents
    String(Cow<'a, str>),
    /// Pre-rendered JSON text
    Raw(Cow<'a, str>),
    /// Array children
    Array(Vec<Node<'a>>),
    /// Object members, each carrying a name
    Object(Vec<Node<'a>>),
    /// Non-owning alias of another node's value
    Reference(&'a Node<'a>),
}

impl<'a> Value<'a> {
    /// Follow references to the value that actually holds data.
    pub fn resolve(&self) -> &Value<'a> {
        let mut value = self;
        while let Value::Reference(target) = value {
            value = &target.value;
        }
        value
    }

    /// Base kind, looking through references.
    pub fn kind(&self) -> Kind {
        match self.resolve() {
            Value::Null | Value::Reference(_) => Kind::Null,
            Value::False => Kind::False,
            Value::True => Kind::True,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Raw(_) => Kind::Raw,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }
}

// Equality is structural: ownership (owned vs borrowed, alias vs original)
// never affects it.
impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.resolve(), other.resolve()) {
            (Value::Null, Value::Null)
            | (Value::False, Value::False)
            | (Value::True, Value::True) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) | (Value::Raw(a), Value::Raw(b)) => a == b,
            (Value::Array(a), Value::Array(b)) | (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value<'_> {}

/// One element of a document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<'a> {
    pub(crate) name: Option<Cow<'a, str>>,
    pub(crate) value: Value<'a>,
}

impl<'a> Node<'a> {
    /// Create an unnamed node.
    pub fn new(value: Value<'a>) -> Self {
        Self { name: None, value }
    }

    /// `null` node.
    pub fn null() -> Self {
        Self::new(Value::Null)
    }

    /// `true` or `false` node.
    pub fn bool(value: bool) -> Self {
        Self::new(if value { Value::True } else { Value::False })
    }

    /// Number node.
    pub fn number(value: u32) -> Self {
        Self::new(Value::Number(value))
    }

    /// Empty array node.
    pub fn array() -> Self {
        Self::new(Value::Array(Vec::new()))
    }

    /// Empty object node.
    pub fn object() -> Self {
        Self::new(Value::Object(Vec::new()))
    }

    /// The node's payload.
    pub fn value(&self) -> &Value<'a> {
        &self.value
    }

    /// Member name, when the node belongs to an object.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns true if the member name is borrowed rather than owned.
    pub fn name_is_const(&self) -> bool {
        matches!(self.name, Some(Cow::Borrowed(_)))
    }

    /// Returns true if this node aliases another node's value.
    pub fn is_reference(&self) -> bool {
        matches!(self.value, Value::Reference(_))
    }

    /// Base kind, looking through references.
    pub fn kind(&self) -> Kind {
        self.value.kind()
    }

    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        self.kind() == Kind::Null
    }

    /// Returns true if this is `true`.
    pub fn is_true(&self) -> bool {
        self.kind() == Kind::True
    }

    /// Returns true if this is `false`.
    pub fn is_false(&self) -> bool {
        self.kind() == Kind::False
    }

    /// Returns true if this is a boolean value.
    pub fn is_bool(&self) -> bool {
        matches!(self.kind(), Kind::True | Kind::False)
    }

    /// Returns true if this is a number value.
    pub fn is_number(&self) -> bool {
        self.kind() == Kind::Number
    }

    /// Returns true if this is a string value.
    pub fn is_string(&self) -> bool {
        self.kind() == Kind::String
    }

    /// Returns true if this is a raw value.
    pub fn is_raw(&self) -> bool {
        self.kind() == Kind::Raw
    }

    /// Returns true if this is an array value.
    pub fn is_array(&self) -> bool {
        self.kind() == Kind::Array
    }

    /// Returns true if this is an object value.
    pub fn is_object(&self) -> bool {
        self.kind() == Kind::Object
    }

    /// Read a boolean.
    pub fn as_bool(&self) -> JsonResult<bool> {
        match self.value.resolve() {
            Value::True => Ok(true),
            Value::False => Ok(false),
            _ => Err(self.mismatch(Kind::True)),
        }
    }

    /// Read a number.
    pub fn as_number(&self) -> JsonResult<u32> {
        match self.value.resolve() {
            Value::Number(n) => Ok(*n),
            _ => Err(self.mismatch(Kind::Number)),
        }
    }

    /// Read a string value.
    pub fn as_str(&self) -> JsonResult<&str> {
        match self.value.resolve() {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch(Kind::String)),
        }
    }

    /// Read the text of a raw value.
    pub fn as_raw(&self) -> JsonResult<&str> {
        match self.value.resolve() {
            Value::Raw(s) => Ok(s),
            _ => Err(self.mismatch(Kind::Raw)),
        }
    }

    /// Overwrite the value of a number node.
    pub fn set_number(&mut self, value: u32) -> JsonResult<()> {
        let error = match &self.value {
            Value::Reference(_) => ErrorCode::E202_ReferenceIsReadOnly,
            _ => self.mismatch(Kind::Number),
        };
        match &mut self.value {
            Value::Number(n) => {
                *n = value;
                Ok(())
            }
            _ => Err(error),
        }
    }

    fn mismatch(&self, expected: Kind) -> ErrorCode {
        ErrorCode::E200_TypeMismatch(expected.name(), self.kind().name())
    }

    /// Children of an array or object; empty for every other kind.
    pub fn items(&self) -> &[Node<'a>] {
        match self.value.resolve() {
            Value::Array(items) | Value::Object(items) => items,
            _ => &[],
        }
    }

    /// Iterate over children in order.
    pub fn children(&self) -> std::slice::Iter<'_, Node<'a>> {
        self.items().iter()
    }

    /// Number of children.
    pub fn array_size(&self) -> usize {
        self.items().len()
    }

    /// Child at `index`, walking from the first.
    pub fn array_item(&self, index: usize) -> Option<&Node<'a>> {
        self.items().get(index)
    }

    /// First member whose name matches, ignoring ASCII case.
    pub fn object_item(&self, name: &str) -> Option<&Node<'a>> {
        self.items().iter().find(|item| item.name_matches(name))
    }

    /// Returns true if a member with this name exists (ASCII case-insensitive).
    pub fn has_item(&self, name: &str) -> bool {
        self.object_item(name).is_some()
    }

    /// Mutable child at `index`. References are read-only and yield `None`.
    pub fn array_item_mut(&mut self, index: usize) -> Option<&mut Node<'a>> {
        self.items_mut().ok()?.get_mut(index)
    }

    /// Mutable member by name. References are read-only and yield `None`.
    pub fn object_item_mut(&mut self, name: &str) -> Option<&mut Node<'a>> {
        self.items_mut()
            .ok()?
            .iter_mut()
            .find(|item| item.name_matches(name))
    }

    pub(crate) fn name_matches(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(name))
    }

    pub(crate) fn items_mut(&mut self) -> JsonResult<&mut Vec<Node<'a>>> {
        match &mut self.value {
            Value::Array(items) | Value::Object(items) => Ok(items),
            Value::Reference(_) => Err(ErrorCode::E202_ReferenceIsReadOnly),
            other => Err(ErrorCode::E201_NotAContainer(other.kind().name())),
        }
    }

    /// Hand every owned buffer in this subtree back to `alloc`.
    ///
    /// Borrowed names and the targets of references are left alone.
    pub(crate) fn release_into<A: Allocator + ?Sized>(self, alloc: &A) {
        if let Some(Cow::Owned(name)) = self.name {
            alloc.release(name.into_bytes());
        }
        match self.value {
            Value::String(Cow::Owned(text)) | Value::Raw(Cow::Owned(text)) => {
                alloc.release(text.into_bytes());
            }
            Value::Array(items) | Value::Object(items) => {
                for item in items {
                    item.release_into(alloc);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Clamp a signed parse result into the number range.
pub fn saturate(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member<'a>(name: &'a str, value: Value<'a>) -> Node<'a> {
        Node {
            name: Some(Cow::Borrowed(name)),
            value,
        }
    }

    #[test]
    fn test_node_kinds() {
        assert!(Node::null().is_null());
        assert!(Node::bool(true).is_true());
        assert!(Node::bool(false).is_false());
        assert!(Node::bool(false).is_bool());
        assert!(Node::number(42).is_number());
        assert!(Node::new(Value::String("x".into())).is_string());
        assert!(Node::new(Value::Raw("[1]".into())).is_raw());
        assert!(Node::array().is_array());
        assert!(Node::object().is_object());
    }

    #[test]
    fn test_typed_accessors() {
        assert_eq!(Node::number(7).as_number(), Ok(7));
        assert_eq!(Node::bool(true).as_bool(), Ok(true));
        assert_eq!(Node::new(Value::String("hi".into())).as_str(), Ok("hi"));
        assert_eq!(
            Node::number(7).as_str(),
            Err(ErrorCode::E200_TypeMismatch("string", "number"))
        );
        assert_eq!(
            Node::null().as_bool(),
            Err(ErrorCode::E200_TypeMismatch("boolean", "null"))
        );
    }

    #[test]
    fn test_set_number() {
        let mut node = Node::number(1);
        node.set_number(9).unwrap();
        assert_eq!(node.as_number(), Ok(9));
        assert!(Node::null().set_number(1).is_err());
    }

    #[test]
    fn test_saturate() {
        assert_eq!(saturate(-5), 0);
        assert_eq!(saturate(0), 0);
        assert_eq!(saturate(17), 17);
        assert_eq!(saturate(4_294_967_295), u32::MAX);
        assert_eq!(saturate(4_294_967_296), u32::MAX);
        assert_eq!(saturate(i64::MAX), u32::MAX);
    }

    #[test]
    fn test_object_item_ignores_ascii_case() {
        let object = Node::new(Value::Object(vec![
            member("Alpha", Value::Number(1)),
            member("beta", Value::Number(2)),
        ]));
        assert_eq!(object.object_item("alpha").unwrap().as_number(), Ok(1));
        assert_eq!(object.object_item("BETA").unwrap().as_number(), Ok(2));
        assert!(object.has_item("ALPHA"));
        assert!(!object.has_item("gamma"));
    }

    #[test]
    fn test_array_item_out_of_range() {
        let array = Node::new(Value::Array(vec![Node::null(), Node::bool(true)]));
        assert_eq!(array.array_size(), 2);
        assert!(array.array_item(1).unwrap().is_true());
        assert!(array.array_item(2).is_none());
        assert_eq!(Node::number(3).array_size(), 0);
    }

    #[test]
    fn test_reference_sees_through() {
        let target = Node::new(Value::Array(vec![Node::number(1), Node::number(2)]));
        let alias = Node::new(Value::Reference(&target));
        assert!(alias.is_reference());
        assert!(alias.is_array());
        assert_eq!(alias.array_size(), 2);
        assert_eq!(alias, target);
    }

    #[test]
    fn test_reference_is_read_only() {
        let target = Node::array();
        let mut alias = Node::new(Value::Reference(&target));
        assert_eq!(alias.items_mut().unwrap_err(), ErrorCode::E202_ReferenceIsReadOnly);
        assert!(alias.array_item_mut(0).is_none());
    }

    #[test]
    fn test_const_name_flag() {
        let owned = Node {
            name: Some(Cow::Owned("k".to_string())),
            value: Value::Null,
        };
        assert!(!owned.name_is_const());
        assert!(member("k", Value::Null).name_is_const());
        assert_eq!(owned, member("k", Value::Null));
    }
}
