//! Resource resolver for the Connect API.
//!
//! Turns caller intents ("the item titled *Bank* in vault *Personal*") into
//! request sequences sent through a [`domain::Transport`], and the responses
//! back into domain records.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Sequences requests and applies the single-match
//! rule. Wire shaping lives in [`domain::marshal`]; HTTP lives behind the
//! transport port.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`vaults`] | [`Vaults`]: list, title search, get by id or title |
//! | [`items`] | [`Items`]: get, search, hydrate, create, update, delete, OTP |
//! | [`files`] | [`Files`]: file metadata and content |
//! | [`client`] | [`ConnectClient`] facade |
//! | [`paths`] | API paths and title filters |

pub mod client;
pub mod files;
pub mod items;
pub mod paths;
mod resolve;
pub mod vaults;

pub use client::ConnectClient;
pub use files::Files;
pub use items::Items;
pub use vaults::Vaults;
