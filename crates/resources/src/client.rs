//! Single entry point over every resource handle.

use std::sync::Arc;

use domain::{
    ByteStream, ConnectError, FullItem, ItemFile, ItemId, ItemSummary, Transport, Vault, VaultId,
};

use crate::files::Files;
use crate::items::Items;
use crate::vaults::Vaults;

/// A Connect client sharing one transport across vaults, items and files.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone, Debug)]
pub struct ConnectClient {
    vaults: Vaults,
    items: Items,
    files: Files,
}

impl ConnectClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let vaults = Vaults::new(Arc::clone(&transport));
        let items = Items::new(Arc::clone(&transport));
        let files = Files::new(transport, vaults.clone(), items.clone());
        Self {
            vaults,
            items,
            files,
        }
    }

    pub fn vaults(&self) -> &Vaults {
        &self.vaults
    }

    pub fn items(&self) -> &Items {
        &self.items
    }

    pub fn files(&self) -> &Files {
        &self.files
    }

    // -- vaults --------------------------------------------------------------

    pub async fn list_vaults(&self) -> Result<Vec<Vault>, ConnectError> {
        self.vaults.list().await
    }

    pub async fn list_vaults_by_title(&self, title: &str) -> Result<Vec<Vault>, ConnectError> {
        self.vaults.list_by_title(title).await
    }

    pub async fn get_vault(&self, query: &str) -> Result<Vault, ConnectError> {
        self.vaults.get(query).await
    }

    pub async fn get_vault_by_id(&self, vault_id: &VaultId) -> Result<Vault, ConnectError> {
        self.vaults.get_by_id(vault_id).await
    }

    pub async fn get_vault_by_title(&self, title: &str) -> Result<Vault, ConnectError> {
        self.vaults.get_by_title(title).await
    }

    pub async fn list_items(&self, vault_id: &VaultId) -> Result<Vec<ItemSummary>, ConnectError> {
        self.vaults.list_items(vault_id).await
    }

    // -- items ---------------------------------------------------------------

    pub async fn list_items_by_title(&self, vault_id: &VaultId, title: &str) -> Result<Vec<FullItem>, ConnectError> {
        self.items.list_by_title(vault_id, title).await
    }

    pub async fn list_items_by_title_contains(
        &self,
        vault_id: &VaultId,
        fragment: &str,
    ) -> Result<Vec<FullItem>, ConnectError> {
        self.items.list_by_title_contains(vault_id, fragment).await
    }

    pub async fn get_item(&self, vault_id: &VaultId, query: &str) -> Result<FullItem, ConnectError> {
        self.items.get(vault_id, query).await
    }

    pub async fn get_item_by_id(&self, vault_id: &VaultId, item_id: &ItemId) -> Result<FullItem, ConnectError> {
        self.items.get_by_id(vault_id, item_id).await
    }

    pub async fn get_item_by_title(&self, vault_id: &VaultId, title: &str) -> Result<FullItem, ConnectError> {
        self.items.get_by_title(vault_id, title).await
    }

    pub async fn get_item_otp(&self, vault_id: &VaultId, query: &str) -> Result<String, ConnectError> {
        self.items.otp(vault_id, query).await
    }

    pub async fn create_item(&self, vault_id: &VaultId, item: FullItem) -> Result<FullItem, ConnectError> {
        self.items.create(vault_id, item).await
    }

    pub async fn update_item(&self, item: &FullItem) -> Result<FullItem, ConnectError> {
        self.items.update(item).await
    }

    pub async fn delete_item(&self, vault_id: &VaultId, query: &str) -> Result<(), ConnectError> {
        self.items.delete(vault_id, query).await
    }

    pub async fn delete_item_by_id(&self, vault_id: &VaultId, item_id: &ItemId) -> Result<(), ConnectError> {
        self.items.delete_by_id(vault_id, item_id).await
    }

    pub async fn delete_item_by_title(&self, vault_id: &VaultId, title: &str) -> Result<(), ConnectError> {
        self.items.delete_by_title(vault_id, title).await
    }

    // -- files ---------------------------------------------------------------

    pub async fn list_files(&self, vault_query: &str, item_query: &str) -> Result<Vec<ItemFile>, ConnectError> {
        self.files.list(vault_query, item_query).await
    }

    pub async fn get_file(&self, vault_query: &str, item_query: &str, file_id: &str) -> Result<ItemFile, ConnectError> {
        self.files.get(vault_query, item_query, file_id).await
    }

    pub async fn get_file_content(
        &self,
        vault_query: &str,
        item_query: &str,
        file_id: &str,
    ) -> Result<String, ConnectError> {
        self.files.content(vault_query, item_query, file_id).await
    }

    pub async fn get_file_content_stream(
        &self,
        vault_query: &str,
        item_query: &str,
        file_id: &str,
    ) -> Result<ByteStream, ConnectError> {
        self.files.content_stream(vault_query, item_query, file_id).await
    }
}
