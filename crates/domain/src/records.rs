//! Domain records exchanged with the Connect server.
//!
//! Field names here are the *domain* names. The mapping to and from wire names
//! (`attributeVersion`, `totp`, `type`, ...) lives in the type registry of
//! [`crate::marshal`], not in serde attributes, so every record goes through the
//! same type-directed engine.
//!
//! Scalar attributes are optional because the server omits whatever it has no
//! value for; lists default to empty.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::identifiers::{FileId, ItemId, SectionId, VaultId};
use crate::marshal::{self, MarshalError, WireRecord};

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// A string that is not a member of the named enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {enumeration}")]
pub struct UnknownVariant {
    /// Registry name of the enumeration.
    pub enumeration: &'static str,
    /// The rejected input.
    pub value: String,
}

// ---------------------------------------------------------------------------
// Macro for server-defined string enumerations.
// Generates: enum with an Unknown(String) catch-all, KNOWN, as_str(),
// from_wire(), FromStr (rejecting unknown values), Display and serde impls.
// ---------------------------------------------------------------------------
macro_rules! wire_enum {
    (
        $(#[$attr:meta])*
        $name:ident {
            $( $(#[$vattr:meta])* $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vattr])* $variant, )+
            /// A value the server sent that this client does not know. Kept
            /// verbatim so the record survives a read-modify-write cycle.
            Unknown(String),
        }

        impl $name {
            /// Every known member's wire value, in declaration order.
            pub const KNOWN: &'static [&'static str] = &[$($wire),+];

            /// Returns the wire value.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )+
                    Self::Unknown(raw) => raw,
                }
            }

            /// Maps a wire value to a member, falling back to `Unknown`.
            pub fn from_wire(raw: &str) -> Self {
                match raw {
                    $( $wire => Self::$variant, )+
                    other => Self::Unknown(other.to_owned()),
                }
            }

            /// Returns `false` for the `Unknown` catch-all.
            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Unknown(_))
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match Self::from_wire(s) {
                    Self::Unknown(value) => Err(UnknownVariant {
                        enumeration: stringify!($name),
                        value,
                    }),
                    known => Ok(known),
                }
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(Self::from_wire(&raw))
            }
        }
    };
}

wire_enum! {
    /// What kind of secret an item holds. Required on every item.
    ItemCategory {
        Login => "LOGIN",
        Password => "PASSWORD",
        ApiCredential => "API_CREDENTIAL",
        Server => "SERVER",
        Database => "DATABASE",
        CreditCard => "CREDIT_CARD",
        Membership => "MEMBERSHIP",
        Passport => "PASSPORT",
        SoftwareLicense => "SOFTWARE_LICENSE",
        OutdoorLicense => "OUTDOOR_LICENSE",
        SecureNote => "SECURE_NOTE",
        WirelessRouter => "WIRELESS_ROUTER",
        BankAccount => "BANK_ACCOUNT",
        DriverLicense => "DRIVER_LICENSE",
        Identity => "IDENTITY",
        RewardProgram => "REWARD_PROGRAM",
        Document => "DOCUMENT",
        EmailAccount => "EMAIL_ACCOUNT",
        SocialSecurityNumber => "SOCIAL_SECURITY_NUMBER",
        MedicalRecord => "MEDICAL_RECORD",
        SshKey => "SSH_KEY",
        Custom => "CUSTOM",
    }
}

wire_enum! {
    /// How a field's value is interpreted and displayed.
    FieldType {
        String => "STRING",
        Email => "EMAIL",
        Concealed => "CONCEALED",
        Url => "URL",
        /// One-time password; the current code is carried in [`Field::otp`].
        Otp => "OTP",
        Date => "DATE",
        MonthYear => "MONTH_YEAR",
        Menu => "MENU",
    }
}

wire_enum! {
    /// The role a field plays in autofill. `Empty` means "no purpose".
    FieldPurpose {
        Empty => "",
        Username => "USERNAME",
        Password => "PASSWORD",
        Notes => "NOTES",
    }
}

wire_enum! {
    /// Character classes a generated value may draw from.
    CharacterSet {
        Letters => "LETTERS",
        Digits => "DIGITS",
        Symbols => "SYMBOLS",
    }
}

wire_enum! {
    /// How a vault came to exist.
    VaultType {
        UserCreated => "USER_CREATED",
        Personal => "PERSONAL",
        Everyone => "EVERYONE",
        Transfer => "TRANSFER",
    }
}

wire_enum! {
    /// Lifecycle state of an item that is no longer active.
    ItemState {
        Archived => "ARCHIVED",
        Deleted => "DELETED",
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly. Carried as an RFC 3339 string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Vaults
// ---------------------------------------------------------------------------

/// A named collection of items. Created only by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<VaultId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Version of the vault metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_version: Option<u64>,
    /// Version of the vault contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_version: Option<u64>,
    /// Number of active items in the vault.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_type: Option<VaultType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Reference from an item to the vault that owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<VaultId>,
}

impl VaultRef {
    /// A reference to `id`.
    pub fn new(id: VaultId) -> Self {
        Self { id: Some(id) }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// One address attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUrl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// At most one URL of a built item carries `Some(true)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl ItemUrl {
    /// A non-primary URL pointing at `href`.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            label: None,
            primary: None,
            href: Some(href.into()),
        }
    }

    /// Marks this URL as the primary one.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = Some(true);
        self
    }

    /// Attaches a display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns `true` if the primary flag is set.
    pub fn is_primary(&self) -> bool {
        self.primary == Some(true)
    }
}

/// Lightweight projection of an item, returned by list and search endpoints.
///
/// Never carries sections, fields or files; fetch the [`FullItem`] for those.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault: Option<VaultRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ItemCategory>,
    #[serde(default)]
    pub urls: Vec<ItemUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ItemState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_by: Option<String>,
}

/// A complete item: everything in [`ItemSummary`] plus sections, fields and
/// file metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault: Option<VaultRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ItemCategory>,
    #[serde(default)]
    pub urls: Vec<ItemUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ItemState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_by: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub files: Vec<ItemFile>,
}

impl FullItem {
    /// Returns the current code of the item's first one-time-password field.
    ///
    /// Only the first OTP-typed field is considered; if it carries no code the
    /// result is `None` even when a later OTP field has one.
    pub fn otp(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.field_type == Some(FieldType::Otp))
            .and_then(|f| f.otp.as_deref())
            .filter(|code| !code.is_empty())
    }

    /// Returns the owning vault's id, if the item carries one.
    pub fn vault_id(&self) -> Option<&VaultId> {
        self.vault.as_ref().and_then(|v| v.id.as_ref())
    }
}

/// A named grouping of fields within one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SectionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Reference from a field or file to its section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SectionId>,
}

/// One value stored in an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<FieldPurpose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Ask the server to generate the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate: Option<bool>,
    /// Present only when `generate` is `Some(true)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<GeneratorRecipe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy: Option<f64>,
    /// Current one-time code of an OTP field (`totp` on the wire).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

/// Parameters for server-side value generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorRecipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default)]
    pub character_sets: Vec<CharacterSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_characters: Option<String>,
}

/// Metadata about a file attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Server path from which the raw content can be fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_path: Option<String>,
    /// Base64 content, only present when inlined by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionRef>,
}

/// The body the server sends alongside a non-2xx status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Registry bindings
// ---------------------------------------------------------------------------

macro_rules! wire_record {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl WireRecord for $ty {
                const TYPE_NAME: &'static str = $name;
            }
        )+
    };
}

wire_record! {
    Vault => "Vault",
    VaultRef => "ItemVault",
    ItemUrl => "ItemUrls",
    ItemSummary => "Item",
    FullItem => "FullItem",
    Section => "FullItemAllOfSections",
    SectionRef => "FullItemAllOfSection",
    Field => "FullItemAllOfFields",
    GeneratorRecipe => "GeneratorRecipe",
    ItemFile => "ItemFile",
    ErrorResponse => "ErrorResponse",
}

// ---------------------------------------------------------------------------
// Polymorphic item reads
// ---------------------------------------------------------------------------

/// An item read whose concrete shape was chosen by the payload's discriminator.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyItem {
    /// The payload resolved to the summary shape.
    Summary(ItemSummary),
    /// The payload declared itself a full item.
    Full(FullItem),
}

impl AnyItem {
    /// Decodes `wire` as an `Item`, letting a discriminator upgrade it to a
    /// [`FullItem`].
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError`] if the payload does not fit the resolved shape.
    pub fn from_wire(wire: Value) -> Result<Self, MarshalError> {
        let resolved = marshal::builtin().resolve_type(&wire, ItemSummary::TYPE_NAME);
        if resolved == FullItem::TYPE_NAME {
            marshal::from_wire::<FullItem>(wire).map(Self::Full)
        } else {
            marshal::from_wire::<ItemSummary>(wire).map(Self::Summary)
        }
    }

    /// The item's id, whichever shape it has.
    pub fn id(&self) -> Option<&ItemId> {
        match self {
            Self::Summary(s) => s.id.as_ref(),
            Self::Full(f) => f.id.as_ref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn category_parses_known_and_rejects_unknown() {
        assert_eq!("LOGIN".parse::<ItemCategory>(), Ok(ItemCategory::Login));
        let err = "invalid".parse::<ItemCategory>().unwrap_err();
        assert_eq!(err.enumeration, "ItemCategory");
        assert_eq!(err.value, "invalid");
    }

    #[test]
    fn unknown_enum_values_survive_serde() {
        let parsed: FieldType = serde_json::from_value(json!("PHONE")).unwrap();
        assert_eq!(parsed, FieldType::Unknown("PHONE".into()));
        assert!(!parsed.is_known());
        assert_eq!(serde_json::to_value(&parsed).unwrap(), json!("PHONE"));
    }

    #[test]
    fn empty_purpose_is_the_empty_string() {
        assert_eq!(FieldPurpose::Empty.as_str(), "");
        assert_eq!(FieldPurpose::from_wire(""), FieldPurpose::Empty);
    }

    #[test]
    fn character_set_cardinality() {
        assert_eq!(CharacterSet::KNOWN.len(), 3);
    }

    #[test]
    fn otp_uses_first_otp_field_only() {
        let item = FullItem {
            fields: vec![
                Field {
                    field_type: Some(FieldType::String),
                    otp: Some("not me".into()),
                    ..Field::default()
                },
                Field {
                    field_type: Some(FieldType::Otp),
                    otp: Some("123456".into()),
                    ..Field::default()
                },
                Field {
                    field_type: Some(FieldType::Otp),
                    otp: Some("654321".into()),
                    ..Field::default()
                },
            ],
            ..FullItem::default()
        };
        assert_eq!(item.otp(), Some("123456"));
    }

    #[test]
    fn otp_absent_without_otp_field() {
        let item = FullItem {
            fields: vec![Field {
                field_type: Some(FieldType::Concealed),
                value: Some("secret".into()),
                ..Field::default()
            }],
            ..FullItem::default()
        };
        assert_eq!(item.otp(), None);
    }

    #[test]
    fn any_item_resolves_full_item_through_discriminator() {
        let wire = json!({
            "@type": "FullItem",
            "id": "llriqid2uq6ucvxpe2nta4hcb1",
            "fields": [{"type": "OTP", "totp": "123456"}]
        });
        match AnyItem::from_wire(wire).unwrap() {
            AnyItem::Full(item) => assert_eq!(item.otp(), Some("123456")),
            AnyItem::Summary(_) => panic!("expected a full item"),
        }
    }

    #[test]
    fn timestamps_travel_as_rfc3339() {
        use chrono::TimeZone;

        let at = Timestamp::from_utc(Utc.with_ymd_and_hms(2021, 4, 10, 17, 34, 26).unwrap());
        let vault = Vault {
            created_at: Some(at),
            ..Vault::default()
        };
        let wire = marshal::to_wire(&vault).unwrap();
        assert_eq!(wire["createdAt"], json!("2021-04-10T17:34:26Z"));

        let back: Vault = marshal::from_wire(wire).unwrap();
        assert_eq!(back.created_at.map(Timestamp::as_datetime), Some(at.as_datetime()));
    }

    #[test]
    fn any_item_falls_back_to_summary() {
        let wire = json!({"@type": "NoSuchType", "id": "abc", "title": "t"});
        let any = AnyItem::from_wire(wire).unwrap();
        assert!(matches!(any, AnyItem::Summary(_)));
        assert_eq!(any.id().map(ItemId::as_str), Some("abc"));
    }
}
