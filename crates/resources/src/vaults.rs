//! Vault lookups.

use std::sync::Arc;

use domain::{
    from_wire, from_wire_list, ConnectError, ItemSummary, Query, Request, ResourceKind, Transport,
    Vault, VaultId,
};
use tracing::{debug, instrument};

use crate::paths;
use crate::resolve::{send_json, single_match};

/// Read-only access to the vaults visible to the token.
#[derive(Clone)]
pub struct Vaults {
    transport: Arc<dyn Transport>,
}

impl Vaults {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Every vault the token can see.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Vault>, ConnectError> {
        let body = send_json(self.transport.as_ref(), Request::get(paths::vaults())).await?;
        Ok(from_wire_list(body)?)
    }

    /// Vaults whose title equals `title` exactly.
    #[instrument(skip(self))]
    pub async fn list_by_title(&self, title: &str) -> Result<Vec<Vault>, ConnectError> {
        let request = Request::get(paths::vaults())
            .with_query(paths::FILTER_PARAM, paths::title_equals(title));
        let body = send_json(self.transport.as_ref(), request).await?;
        Ok(from_wire_list(body)?)
    }

    /// Fetches a vault by id or, failing the id shape, by exact title.
    #[instrument(skip(self))]
    pub async fn get(&self, query: &str) -> Result<Vault, ConnectError> {
        match Query::classify(query)? {
            Query::ById(id) => self.fetch(&id).await,
            Query::ByTitle(title) => self.get_by_title(&title).await,
        }
    }

    #[instrument(skip(self), fields(vault_id = %vault_id))]
    pub async fn get_by_id(&self, vault_id: &VaultId) -> Result<Vault, ConnectError> {
        self.fetch(vault_id.as_str()).await
    }

    /// The one vault titled `title`.
    ///
    /// # Errors
    ///
    /// [`ConnectError::NotFound`] or [`ConnectError::Ambiguous`] unless exactly
    /// one vault matches.
    #[instrument(skip(self))]
    pub async fn get_by_title(&self, title: &str) -> Result<Vault, ConnectError> {
        let matches = self.list_by_title(title).await?;
        debug!(matches = matches.len(), "vault title search");
        single_match(matches, ResourceKind::Vault, title)
    }

    /// Summaries of every item in the vault.
    #[instrument(skip(self), fields(vault_id = %vault_id))]
    pub async fn list_items(&self, vault_id: &VaultId) -> Result<Vec<ItemSummary>, ConnectError> {
        let request = Request::get(paths::items(vault_id.as_str()));
        let body = send_json(self.transport.as_ref(), request).await?;
        Ok(from_wire_list(body)?)
    }

    async fn fetch(&self, vault_id: &str) -> Result<Vault, ConnectError> {
        let body = send_json(self.transport.as_ref(), Request::get(paths::vault(vault_id))).await?;
        Ok(from_wire(body)?)
    }
}

impl std::fmt::Debug for Vaults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vaults").finish_non_exhaustive()
    }
}
