// Copyright 2026 fedcache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;

use itertools::Itertools;

/// One field value of a composite index key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    /// String field, e.g. an ID or a URI.
    Str(Box<str>),
    /// Signed integer field.
    Int(i64),
    /// Unsigned integer field.
    Uint(u64),
    /// Boolean field.
    Bool(bool),
    /// Single byte tag, e.g. an enum discriminant.
    Byte(u8),
}

impl KeyPart {
    /// Whether the part holds the zero value of its type.
    pub fn is_zero(&self) -> bool {
        match self {
            KeyPart::Str(s) => s.is_empty(),
            KeyPart::Int(v) => *v == 0,
            KeyPart::Uint(v) => *v == 0,
            KeyPart::Bool(v) => !*v,
            KeyPart::Byte(v) => *v == 0,
        }
    }

    /// Get the string value, if this is a string part.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyPart::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for KeyPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyPart::Str(s) => write!(f, "{s}"),
            KeyPart::Int(v) => write!(f, "{v}"),
            KeyPart::Uint(v) => write!(f, "{v}"),
            KeyPart::Bool(v) => write!(f, "{v}"),
            KeyPart::Byte(v) => write!(f, "{}", *v as char),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(v: &str) -> Self {
        Self::Str(v.into())
    }
}

impl From<String> for KeyPart {
    fn from(v: String) -> Self {
        Self::Str(v.into_boxed_str())
    }
}

impl From<&String> for KeyPart {
    fn from(v: &String) -> Self {
        Self::Str(v.as_str().into())
    }
}

impl From<i64> for KeyPart {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for KeyPart {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<bool> for KeyPart {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u8> for KeyPart {
    fn from(v: u8) -> Self {
        Self::Byte(v)
    }
}

/// A composite index key: the ordered field values of one index, evaluated against one value.
///
/// Keys compare by value and are order sensitive: `("a", "b")` and `("b", "a")` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    parts: Box<[KeyPart]>,
}

impl Key {
    /// Create a key from its parts.
    pub fn new(parts: impl IntoIterator<Item = KeyPart>) -> Self {
        Self {
            parts: parts.into_iter().collect(),
        }
    }

    /// Get all parts of the key.
    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    /// Get the part at `i`.
    pub fn part(&self, i: usize) -> Option<&KeyPart> {
        self.parts.get(i)
    }

    /// Whether any of the parts holds a zero value.
    pub fn has_zero(&self) -> bool {
        self.parts.iter().any(KeyPart::is_zero)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.parts.iter().join(","))
    }
}

/// Conversion into a [`Key`], implemented for single fields and for tuples of fields.
pub trait IntoKey {
    /// Convert into a key.
    fn into_key(self) -> Key;
}

impl IntoKey for Key {
    fn into_key(self) -> Key {
        self
    }
}

impl IntoKey for &Key {
    fn into_key(self) -> Key {
        self.clone()
    }
}

macro_rules! impl_into_key_for_scalar {
    ($($t:ty),*) => {
        $(
            impl IntoKey for $t {
                fn into_key(self) -> Key {
                    Key::new([KeyPart::from(self)])
                }
            }
        )*
    };
}

impl_into_key_for_scalar! { &str, String, &String, i64, u64, bool, u8 }

macro_rules! impl_into_key_for_tuple {
    ($($name:ident $var:ident),+) => {
        impl<$($name),+> IntoKey for ($($name,)+)
        where
            $($name: Into<KeyPart>),+
        {
            fn into_key(self) -> Key {
                let ($($var,)+) = self;
                Key::new([$(Into::<KeyPart>::into($var)),+])
            }
        }
    };
}

impl_into_key_for_tuple! { A a }
impl_into_key_for_tuple! { A a, B b }
impl_into_key_for_tuple! { A a, B b, C c }
impl_into_key_for_tuple! { A a, B b, C c, D d }
