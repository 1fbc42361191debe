use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The runtime kind of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Number,
    Boolean,
}

impl Primitive {
    /// Returns true when `value` has exactly this runtime kind. No coercion.
    #[must_use]
    pub fn accepts(self, value: &serde_json::Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }

    /// The DSL keyword for this primitive.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// Describes the shape a field value must have.
///
/// The JSON form mirrors the schema DSL:
/// `"string" | "number" | "boolean" | {"union": [..]} | {"ref": [..]} |
/// {"arrayOf": D} | {"optional": D}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DescriptorRepr", into = "DescriptorRepr")]
pub enum TypeDescriptor {
    /// A scalar of exactly this kind.
    Primitive(Primitive),
    /// A string drawn from a fixed set of literals.
    Union(BTreeSet<String>),
    /// May be absent; when present must match the inner descriptor.
    Optional(Box<TypeDescriptor>),
    /// A sequence whose every element matches the inner descriptor.
    ArrayOf(Box<TypeDescriptor>),
    /// A `{ref: id}` pointer to an entity of one of the listed kinds,
    /// tried in declaration order.
    Ref(Vec<String>),
}

impl TypeDescriptor {
    #[must_use]
    pub const fn string() -> Self {
        Self::Primitive(Primitive::String)
    }

    #[must_use]
    pub const fn number() -> Self {
        Self::Primitive(Primitive::Number)
    }

    #[must_use]
    pub const fn boolean() -> Self {
        Self::Primitive(Primitive::Boolean)
    }

    /// A union of string literals.
    pub fn union<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Union(literals.into_iter().map(Into::into).collect())
    }

    /// Wraps `inner` as optional.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// An array of `inner`.
    #[must_use]
    pub fn array_of(inner: Self) -> Self {
        Self::ArrayOf(Box::new(inner))
    }

    /// A reference to one of the named kinds.
    pub fn reference<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Ref(kinds.into_iter().map(Into::into).collect())
    }

    /// Returns true for a top-level `Optional`.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Strips one top-level `Optional`, if any.
    #[must_use]
    pub fn unwrap_optional(&self) -> &Self {
        match self {
            Self::Optional(inner) => inner,
            other => other,
        }
    }

    /// Collects every kind name mentioned by a `Ref` anywhere in this descriptor.
    pub fn referenced_kinds<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Primitive(_) | Self::Union(_) => {}
            Self::Optional(inner) | Self::ArrayOf(inner) => inner.referenced_kinds(out),
            Self::Ref(kinds) => out.extend(kinds.iter().map(String::as_str)),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.keyword()),
            Self::Union(literals) => {
                let parts: Vec<String> = literals.iter().map(|l| format!("{l:?}")).collect();
                write!(f, "{}", parts.join(" | "))
            }
            Self::Optional(inner) => write!(f, "optional {inner}"),
            Self::ArrayOf(inner) => write!(f, "array of {inner}"),
            Self::Ref(kinds) => write!(f, "ref<{}>", kinds.join(" | ")),
        }
    }
}

impl From<Primitive> for TypeDescriptor {
    fn from(p: Primitive) -> Self {
        Self::Primitive(p)
    }
}

// Wire form of a descriptor. Unit variants render as bare strings and the
// compound variants as single-key objects, which is exactly the DSL shape.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum DescriptorRepr {
    String,
    Number,
    Boolean,
    Union(BTreeSet<String>),
    Optional(Box<TypeDescriptor>),
    ArrayOf(Box<TypeDescriptor>),
    Ref(Vec<String>),
}

impl From<DescriptorRepr> for TypeDescriptor {
    fn from(repr: DescriptorRepr) -> Self {
        match repr {
            DescriptorRepr::String => Self::string(),
            DescriptorRepr::Number => Self::number(),
            DescriptorRepr::Boolean => Self::boolean(),
            DescriptorRepr::Union(literals) => Self::Union(literals),
            DescriptorRepr::Optional(inner) => Self::Optional(inner),
            DescriptorRepr::ArrayOf(inner) => Self::ArrayOf(inner),
            DescriptorRepr::Ref(kinds) => Self::Ref(kinds),
        }
    }
}

impl From<TypeDescriptor> for DescriptorRepr {
    fn from(descriptor: TypeDescriptor) -> Self {
        match descriptor {
            TypeDescriptor::Primitive(Primitive::String) => Self::String,
            TypeDescriptor::Primitive(Primitive::Number) => Self::Number,
            TypeDescriptor::Primitive(Primitive::Boolean) => Self::Boolean,
            TypeDescriptor::Union(literals) => Self::Union(literals),
            TypeDescriptor::Optional(inner) => Self::Optional(inner),
            TypeDescriptor::ArrayOf(inner) => Self::ArrayOf(inner),
            TypeDescriptor::Ref(kinds) => Self::Ref(kinds),
        }
    }
}
