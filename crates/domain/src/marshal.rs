//! Type-directed marshaling between wire payloads and domain records.
//!
//! The server speaks camel-cased JSON (`attributeVersion`, `totp`, `type`,
//! ...). Domain records use snake-cased field names. The translation between
//! the two is driven entirely by a [`TypeRegistry`]: for every record type it
//! lists the fields to carry, the wire key each one maps to, and the type name
//! to recurse with. Nothing is inferred from the shape of the payload.
//!
//! Two layers are exposed:
//!
//! - [`Marshaler`] works on untyped [`Value`]s and never fails. Unknown types
//!   and unexpected shapes pass through verbatim.
//! - [`to_wire`] / [`from_wire`] / [`from_wire_list`] bridge typed records
//!   (anything implementing [`WireRecord`]) through serde on top of the
//!   built-in registry. Only these can fail, and only when serde cannot shape
//!   the result into the requested record.
//!
//! ## Polymorphism
//!
//! A record type may declare a [`Discriminator`]. When the source object
//! carries a non-empty string at the discriminator key and that string names a
//! registered record type, the named type is used instead of the requested one.
//! The built-in registry declares `@type` on `Item`, which lets a summary read
//! resolve to `FullItem`.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::records::{
    CharacterSet, FieldPurpose, FieldType, ItemCategory, ItemState, VaultType,
};

/// Type names that are carried verbatim. Compared case-insensitively.
const PRIMITIVES: &[&str] = &[
    "string", "boolean", "double", "integer", "long", "float", "number", "any", "date",
];

const ARRAY_PREFIX: &str = "Array<";
const ARRAY_SUFFIX: &str = ">";

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// One attribute of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Domain-side key.
    pub name: &'static str,
    /// Wire-side key.
    pub wire_name: &'static str,
    /// Type name to marshal the attribute with: a primitive, an enumeration,
    /// a record, or `Array<T>` of any of those.
    pub type_name: &'static str,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, wire_name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            wire_name,
            type_name,
        }
    }
}

/// Where to look for the concrete type name of a polymorphic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discriminator {
    /// Key inspected on domain-side objects.
    pub field: &'static str,
    /// Key inspected on wire-side objects.
    pub wire: &'static str,
}

/// Describes one record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: &'static str,
    /// Attributes in wire order. Keys not listed here are dropped.
    pub fields: &'static [FieldDescriptor],
    pub discriminator: Option<Discriminator>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Lookup table from type names to record descriptors and enumeration members.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    records: HashMap<&'static str, TypeDescriptor>,
    enums: HashMap<&'static str, &'static [&'static str]>,
}

impl TypeRegistry {
    /// An empty registry. Everything passes through until types are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry describing every Connect record and enumeration.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for descriptor in BUILTIN_RECORDS {
            registry.register_record(*descriptor);
        }
        registry
            .register_enum("ItemCategory", ItemCategory::KNOWN)
            .register_enum("FieldType", FieldType::KNOWN)
            .register_enum("FieldPurpose", FieldPurpose::KNOWN)
            .register_enum("CharacterSet", CharacterSet::KNOWN)
            .register_enum("VaultType", VaultType::KNOWN)
            .register_enum("ItemState", ItemState::KNOWN);
        registry
    }

    /// Adds or replaces a record type.
    pub fn register_record(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        self.records.insert(descriptor.name, descriptor);
        self
    }

    /// Adds or replaces an enumeration.
    pub fn register_enum(&mut self, name: &'static str, members: &'static [&'static str]) -> &mut Self {
        self.enums.insert(name, members);
        self
    }

    pub fn record(&self, name: &str) -> Option<&TypeDescriptor> {
        self.records.get(name)
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }
}

static BUILTIN: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::builtin);

/// A [`Marshaler`] over the process-wide built-in registry.
pub fn builtin() -> Marshaler<'static> {
    Marshaler::new(&BUILTIN)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Domain,
    Wire,
}

/// Converts [`Value`]s between domain and wire shapes using a [`TypeRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct Marshaler<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> Marshaler<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Converts a domain-shaped value to its wire shape.
    ///
    /// Absent in, absent out. `null` stays `null`.
    pub fn serialize(&self, value: Option<&Value>, type_name: &str) -> Option<Value> {
        value.map(|v| self.convert(v, type_name, Side::Domain))
    }

    /// Converts a wire-shaped value to its domain shape.
    ///
    /// Absent in, absent out. `null` stays `null`.
    pub fn deserialize(&self, value: Option<&Value>, type_name: &str) -> Option<Value> {
        value.map(|v| self.convert(v, type_name, Side::Wire))
    }

    /// Returns the concrete type a wire payload requested as `requested`
    /// should be read as.
    ///
    /// Falls back to `requested` when it has no discriminator, the payload does
    /// not name a type, or the named type is not registered.
    pub fn resolve_type(&self, wire: &Value, requested: &str) -> String {
        self.resolve(wire, requested, Side::Wire)
            .map_or_else(|| requested.to_owned(), |d| d.name.to_owned())
    }

    fn resolve(&self, value: &Value, requested: &str, side: Side) -> Option<&'r TypeDescriptor> {
        let base = self.registry.record(requested)?;
        let Some(discriminator) = base.discriminator else {
            return Some(base);
        };
        let key = match side {
            Side::Domain => discriminator.field,
            Side::Wire => discriminator.wire,
        };
        match value.get(key).and_then(Value::as_str) {
            Some(tag) if !tag.is_empty() => Some(self.registry.record(tag).unwrap_or(base)),
            _ => Some(base),
        }
    }

    fn convert(&self, value: &Value, type_name: &str, side: Side) -> Value {
        if value.is_null() || is_primitive(type_name) {
            return value.clone();
        }

        if let Some(element) = array_element(type_name) {
            return match value {
                Value::Array(items) => Value::Array(
                    items
                        .iter()
                        .map(|item| self.convert(item, element, side))
                        .collect(),
                ),
                other => other.clone(),
            };
        }

        if self.registry.is_enum(type_name) {
            return value.clone();
        }

        let Some(descriptor) = self.resolve(value, type_name, side) else {
            return value.clone();
        };
        let Value::Object(source) = value else {
            return value.clone();
        };

        let mut target = Map::with_capacity(descriptor.fields.len());
        for field in descriptor.fields {
            let (from, to) = match side {
                Side::Domain => (field.name, field.wire_name),
                Side::Wire => (field.wire_name, field.name),
            };
            if let Some(attribute) = source.get(from) {
                target.insert(to.to_owned(), self.convert(attribute, field.type_name, side));
            }
        }
        Value::Object(target)
    }
}

fn is_primitive(type_name: &str) -> bool {
    PRIMITIVES.iter().any(|p| p.eq_ignore_ascii_case(type_name))
}

fn array_element(type_name: &str) -> Option<&str> {
    type_name
        .strip_prefix(ARRAY_PREFIX)
        .and_then(|rest| rest.strip_suffix(ARRAY_SUFFIX))
}

// ---------------------------------------------------------------------------
// Typed layer
// ---------------------------------------------------------------------------

/// A domain record registered under [`Self::TYPE_NAME`] in the built-in registry.
pub trait WireRecord: Serialize + DeserializeOwned {
    const TYPE_NAME: &'static str;
}

/// A typed record could not be moved across the wire boundary.
#[derive(Debug, Error)]
pub enum MarshalError {
    /// The record could not be rendered as JSON.
    #[error("failed to encode {type_name}: {source}")]
    Encode {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The payload does not fit the record's shape.
    #[error("failed to decode {type_name}: {source}")]
    Decode {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The response body is not JSON at all.
    #[error("response body is not valid JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// Renders `record` in wire shape.
///
/// # Errors
///
/// Returns [`MarshalError::Encode`] if serde rejects the record.
pub fn to_wire<T: WireRecord>(record: &T) -> Result<Value, MarshalError> {
    let domain = serde_json::to_value(record).map_err(|source| MarshalError::Encode {
        type_name: T::TYPE_NAME,
        source,
    })?;
    Ok(builtin()
        .serialize(Some(&domain), T::TYPE_NAME)
        .unwrap_or(Value::Null))
}

/// Reads a wire payload as `T`.
///
/// # Errors
///
/// Returns [`MarshalError::Decode`] if the payload does not fit `T`.
pub fn from_wire<T: WireRecord>(wire: Value) -> Result<T, MarshalError> {
    let domain = builtin()
        .deserialize(Some(&wire), T::TYPE_NAME)
        .unwrap_or(Value::Null);
    serde_json::from_value(domain).map_err(|source| MarshalError::Decode {
        type_name: T::TYPE_NAME,
        source,
    })
}

/// Reads a wire array as `Vec<T>`.
///
/// Anything other than an array reads as no records.
///
/// # Errors
///
/// Returns [`MarshalError::Decode`] on the first element that does not fit `T`.
pub fn from_wire_list<T: WireRecord>(wire: Value) -> Result<Vec<T>, MarshalError> {
    match wire {
        Value::Array(items) => items.into_iter().map(from_wire).collect(),
        _ => Ok(Vec::new()),
    }
}

// ---------------------------------------------------------------------------
// Built-in descriptors
// ---------------------------------------------------------------------------

const fn f(name: &'static str, wire_name: &'static str, type_name: &'static str) -> FieldDescriptor {
    FieldDescriptor::new(name, wire_name, type_name)
}

const ITEM_FIELDS: &[FieldDescriptor] = &[
    f("id", "id", "string"),
    f("title", "title", "string"),
    f("vault", "vault", "ItemVault"),
    f("category", "category", "ItemCategory"),
    f("urls", "urls", "Array<ItemUrls>"),
    f("favorite", "favorite", "boolean"),
    f("tags", "tags", "Array<string>"),
    f("version", "version", "integer"),
    f("state", "state", "ItemState"),
    f("created_at", "createdAt", "Date"),
    f("updated_at", "updatedAt", "Date"),
    f("last_edited_by", "lastEditedBy", "string"),
];

const FULL_ITEM_FIELDS: &[FieldDescriptor] = &[
    f("id", "id", "string"),
    f("title", "title", "string"),
    f("vault", "vault", "ItemVault"),
    f("category", "category", "ItemCategory"),
    f("urls", "urls", "Array<ItemUrls>"),
    f("favorite", "favorite", "boolean"),
    f("tags", "tags", "Array<string>"),
    f("version", "version", "integer"),
    f("state", "state", "ItemState"),
    f("created_at", "createdAt", "Date"),
    f("updated_at", "updatedAt", "Date"),
    f("last_edited_by", "lastEditedBy", "string"),
    f("sections", "sections", "Array<FullItemAllOfSections>"),
    f("fields", "fields", "Array<FullItemAllOfFields>"),
    f("files", "files", "Array<ItemFile>"),
];

const BUILTIN_RECORDS: &[TypeDescriptor] = &[
    TypeDescriptor {
        name: "Vault",
        fields: &[
            f("id", "id", "string"),
            f("name", "name", "string"),
            f("description", "description", "string"),
            f("attribute_version", "attributeVersion", "integer"),
            f("content_version", "contentVersion", "integer"),
            f("items", "items", "integer"),
            f("vault_type", "type", "VaultType"),
            f("created_at", "createdAt", "Date"),
            f("updated_at", "updatedAt", "Date"),
        ],
        discriminator: None,
    },
    TypeDescriptor {
        name: "ItemVault",
        fields: &[f("id", "id", "string")],
        discriminator: None,
    },
    TypeDescriptor {
        name: "ItemUrls",
        fields: &[
            f("label", "label", "string"),
            f("primary", "primary", "boolean"),
            f("href", "href", "string"),
        ],
        discriminator: None,
    },
    TypeDescriptor {
        name: "Item",
        fields: ITEM_FIELDS,
        discriminator: Some(Discriminator {
            field: "@type",
            wire: "@type",
        }),
    },
    TypeDescriptor {
        name: "FullItem",
        fields: FULL_ITEM_FIELDS,
        discriminator: None,
    },
    TypeDescriptor {
        name: "FullItemAllOfSections",
        fields: &[f("id", "id", "string"), f("label", "label", "string")],
        discriminator: None,
    },
    TypeDescriptor {
        name: "FullItemAllOfSection",
        fields: &[f("id", "id", "string")],
        discriminator: None,
    },
    TypeDescriptor {
        name: "FullItemAllOfFields",
        fields: &[
            f("id", "id", "string"),
            f("section", "section", "FullItemAllOfSection"),
            f("field_type", "type", "FieldType"),
            f("purpose", "purpose", "FieldPurpose"),
            f("label", "label", "string"),
            f("value", "value", "string"),
            f("generate", "generate", "boolean"),
            f("recipe", "recipe", "GeneratorRecipe"),
            f("entropy", "entropy", "number"),
            f("otp", "totp", "string"),
        ],
        discriminator: None,
    },
    TypeDescriptor {
        name: "GeneratorRecipe",
        fields: &[
            f("length", "length", "integer"),
            f("character_sets", "characterSets", "Array<CharacterSet>"),
            f("exclude_characters", "excludeCharacters", "string"),
        ],
        discriminator: None,
    },
    TypeDescriptor {
        name: "ItemFile",
        fields: &[
            f("id", "id", "string"),
            f("name", "name", "string"),
            f("size", "size", "number"),
            f("content_path", "content_path", "string"),
            f("content", "content", "string"),
            f("section", "section", "FullItemAllOfSection"),
        ],
        discriminator: None,
    },
    TypeDescriptor {
        name: "ErrorResponse",
        fields: &[
            f("status", "status", "integer"),
            f("message", "message", "string"),
        ],
        discriminator: None,
    },
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::records::{Field, FullItem, GeneratorRecipe, ItemSummary, Vault};

    #[test]
    fn absent_and_null_are_preserved() {
        let m = builtin();
        assert_eq!(m.serialize(None, "Vault"), None);
        assert_eq!(m.deserialize(None, "Vault"), None);
        assert_eq!(m.serialize(Some(&Value::Null), "Vault"), Some(Value::Null));
        assert_eq!(m.deserialize(Some(&Value::Null), "Vault"), Some(Value::Null));
    }

    #[test]
    fn primitives_pass_through_case_insensitively() {
        let m = builtin();
        let v = json!("2021-04-01T00:00:00Z");
        assert_eq!(m.serialize(Some(&v), "Date"), Some(v.clone()));
        assert_eq!(m.serialize(Some(&v), "STRING"), Some(v.clone()));
        assert_eq!(m.deserialize(Some(&json!(3)), "Integer"), Some(json!(3)));
    }

    #[test]
    fn empty_array_stays_empty() {
        let m = builtin();
        assert_eq!(m.deserialize(Some(&json!([])), "Array<Vault>"), Some(json!([])));
    }

    #[test]
    fn arrays_preserve_order() {
        let m = builtin();
        let wire = json!([{"id": "b"}, {"id": "a"}, {"id": "c"}]);
        assert_eq!(m.deserialize(Some(&wire), "Array<ItemVault>"), Some(wire));
    }

    #[test]
    fn wire_keys_are_renamed_and_unknown_keys_dropped() {
        let m = builtin();
        let wire = json!({
            "id": "v1",
            "attributeVersion": 2,
            "type": "USER_CREATED",
            "secretAdminNote": "drop me"
        });
        let domain = m.deserialize(Some(&wire), "Vault").unwrap();
        assert_eq!(
            domain,
            json!({"id": "v1", "attribute_version": 2, "vault_type": "USER_CREATED"})
        );
    }

    #[test]
    fn enums_pass_through_including_unknown_members() {
        let m = builtin();
        assert_eq!(m.serialize(Some(&json!("LOGIN")), "ItemCategory"), Some(json!("LOGIN")));
        assert_eq!(m.serialize(Some(&json!("NEW_KIND")), "ItemCategory"), Some(json!("NEW_KIND")));
    }

    #[test]
    fn unregistered_types_pass_through() {
        let m = builtin();
        let v = json!({"anything": [1, 2, 3]});
        assert_eq!(m.serialize(Some(&v), "NotAType"), Some(v.clone()));
        assert_eq!(m.deserialize(Some(&v), "NotAType"), Some(v));
    }

    #[test]
    fn record_given_non_object_passes_through() {
        let m = builtin();
        assert_eq!(m.deserialize(Some(&json!("oops")), "Vault"), Some(json!("oops")));
    }

    #[test]
    fn nested_records_recurse() {
        let m = builtin();
        let wire = json!({
            "fields": [{
                "type": "OTP",
                "totp": "123456",
                "section": {"id": "s1", "label": "dropped"},
                "recipe": {"characterSets": ["LETTERS"], "excludeCharacters": "l1"}
            }]
        });
        let domain = m.deserialize(Some(&wire), "FullItem").unwrap();
        assert_eq!(
            domain,
            json!({
                "fields": [{
                    "field_type": "OTP",
                    "otp": "123456",
                    "section": {"id": "s1"},
                    "recipe": {"character_sets": ["LETTERS"], "exclude_characters": "l1"}
                }]
            })
        );
    }

    #[test]
    fn discriminator_selects_registered_type() {
        let m = builtin();
        let wire = json!({"@type": "FullItem", "id": "i1", "fields": [{"totp": "1"}]});
        assert_eq!(m.resolve_type(&wire, "Item"), "FullItem");
        let domain = m.deserialize(Some(&wire), "Item").unwrap();
        assert_eq!(domain, json!({"id": "i1", "fields": [{"otp": "1"}]}));
    }

    #[test]
    fn discriminator_falls_back_to_requested_type() {
        let m = builtin();
        assert_eq!(m.resolve_type(&json!({"@type": "Unregistered"}), "Item"), "Item");
        assert_eq!(m.resolve_type(&json!({"@type": ""}), "Item"), "Item");
        assert_eq!(m.resolve_type(&json!({}), "Item"), "Item");
        assert_eq!(m.resolve_type(&json!({"@type": "FullItem"}), "Vault"), "Vault");
    }

    #[test]
    fn custom_registry_declares_its_own_types() {
        const PET: &[FieldDescriptor] = &[FieldDescriptor::new("pet_name", "petName", "string")];
        let mut registry = TypeRegistry::new();
        registry.register_record(TypeDescriptor {
            name: "Pet",
            fields: PET,
            discriminator: None,
        });
        let m = Marshaler::new(&registry);
        assert_eq!(
            m.serialize(Some(&json!({"pet_name": "Rex", "age": 3})), "Pet"),
            Some(json!({"petName": "Rex"}))
        );
        // Not registered here, so passes through.
        assert_eq!(m.serialize(Some(&json!({"a": 1})), "Vault"), Some(json!({"a": 1})));
    }

    #[test]
    fn typed_round_trip_preserves_record() {
        let item = FullItem {
            title: Some("Secret".into()),
            category: Some(ItemCategory::Login),
            tags: vec!["a".into(), "b".into()],
            fields: vec![Field {
                field_type: Some(FieldType::Concealed),
                purpose: Some(FieldPurpose::Password),
                generate: Some(true),
                recipe: Some(GeneratorRecipe {
                    length: Some(12),
                    character_sets: vec![CharacterSet::Letters, CharacterSet::Digits],
                    exclude_characters: None,
                }),
                ..Field::default()
            }],
            ..FullItem::default()
        };
        let wire = to_wire(&item).unwrap();
        assert_eq!(wire["fields"][0]["type"], json!("CONCEALED"));
        assert_eq!(wire["fields"][0]["recipe"]["characterSets"], json!(["LETTERS", "DIGITS"]));
        assert!(wire.get("id").is_none());
        assert_eq!(from_wire::<FullItem>(wire).unwrap(), item);
    }

    #[test]
    fn typed_decode_reports_type_name() {
        let err = from_wire::<Vault>(json!({"attributeVersion": "not a number"})).unwrap_err();
        assert!(matches!(err, MarshalError::Decode { type_name: "Vault", .. }));
    }

    #[test]
    fn from_wire_list_treats_non_array_as_empty() {
        let items: Vec<ItemSummary> = from_wire_list(json!({"not": "a list"})).unwrap();
        assert!(items.is_empty());
    }
}
