//! Request paths and title filters of the Connect v1 API.
//!
//! Paths are relative; the transport joins them onto the server base URL.

/// Query parameter carrying title filters.
pub const FILTER_PARAM: &str = "filter";

const VAULTS: &str = "v1/vaults";

pub fn vaults() -> String {
    format!("{VAULTS}/")
}

pub fn vault(vault_id: &str) -> String {
    format!("{VAULTS}/{vault_id}")
}

pub fn items(vault_id: &str) -> String {
    format!("{VAULTS}/{vault_id}/items/")
}

pub fn item(vault_id: &str, item_id: &str) -> String {
    format!("{VAULTS}/{vault_id}/items/{item_id}")
}

pub fn files(vault_id: &str, item_id: &str) -> String {
    format!("{VAULTS}/{vault_id}/items/{item_id}/files/")
}

pub fn file(vault_id: &str, item_id: &str, file_id: &str) -> String {
    format!("{VAULTS}/{vault_id}/items/{item_id}/files/{file_id}")
}

pub fn file_content(vault_id: &str, item_id: &str, file_id: &str) -> String {
    format!("{}/content", file(vault_id, item_id, file_id))
}

/// Exact title match: `title eq "<title>"`.
pub fn title_equals(title: &str) -> String {
    format!("title eq \"{title}\"")
}

/// Substring title match: `title co "<fragment>"`.
pub fn title_contains(fragment: &str) -> String {
    format!("title co \"{fragment}\"")
}
