//! Domain model for the Connect vault/item client.
//!
//! This crate holds every record the Connect server exchanges, the
//! type-directed marshaling engine that moves those records across the wire
//! boundary, the item builder, the error taxonomy, and the transport port the
//! resolver sends requests through.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is sent; the `transport` crate defines *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`VaultId`, `ItemId`, ...) and [`Query`] |
//! | [`records`] | Vaults, items, fields, files and their enumerations |
//! | [`marshal`] | Type registry, [`Marshaler`] and the typed wire bridge |
//! | [`builder`] | [`ItemBuilder`] for new item drafts |
//! | [`errors`] | [`ConnectError`] and its categories |
//! | [`transport`] | [`Transport`] port, [`Request`], [`Response`] |

pub mod builder;
pub mod errors;
pub mod identifiers;
pub mod marshal;
pub mod records;
pub mod transport;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use builder::{FieldSpec, ItemBuilder, RecipeSpec};
pub use errors::{ConnectError, DomainError, ResourceKind, TransportError, ValidationError};
pub use identifiers::{is_valid_id, FileId, ItemId, Query, SectionId, VaultId};
pub use marshal::{from_wire, from_wire_list, to_wire, MarshalError, Marshaler, TypeRegistry, WireRecord};
pub use records::{
    AnyItem, CharacterSet, ErrorResponse, Field, FieldPurpose, FieldType, FullItem,
    GeneratorRecipe, ItemCategory, ItemFile, ItemState, ItemSummary, ItemUrl, Section,
    SectionRef, Timestamp, Vault, VaultRef, VaultType,
};
pub use transport::{ByteStream, Method, Request, Response, Transport};
