//! Item lookups and mutations within one vault.
//!
//! Every lookup accepts either an item id or an exact title. Title lookups go
//! through the summary search endpoint first and then fetch the full item by
//! the matched id, since search results never carry fields or sections.

use std::sync::Arc;

use domain::{
    from_wire, from_wire_list, to_wire, ConnectError, DomainError, FullItem, ItemId, ItemSummary,
    Query, Request, ResourceKind, Transport, ValidationError, VaultId, VaultRef,
};
use futures::future::try_join_all;
use tracing::{debug, instrument};

use crate::paths;
use crate::resolve::{require_id, send_json, send_raw, single_match};

/// Item operations.
#[derive(Clone)]
pub struct Items {
    transport: Arc<dyn Transport>,
}

impl Items {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetches a full item by id or, failing the id shape, by exact title.
    #[instrument(skip(self, vault_id), fields(vault_id = %vault_id))]
    pub async fn get(&self, vault_id: &VaultId, query: &str) -> Result<FullItem, ConnectError> {
        match Query::classify(query)? {
            Query::ById(id) => self.fetch(vault_id.as_str(), &id).await,
            Query::ByTitle(title) => self.get_by_title(vault_id, &title).await,
        }
    }

    #[instrument(skip(self, vault_id, item_id), fields(vault_id = %vault_id, item_id = %item_id))]
    pub async fn get_by_id(&self, vault_id: &VaultId, item_id: &ItemId) -> Result<FullItem, ConnectError> {
        self.fetch(vault_id.as_str(), item_id.as_str()).await
    }

    /// Fetches the one item titled `title`.
    ///
    /// # Errors
    ///
    /// [`ConnectError::NotFound`] or [`ConnectError::Ambiguous`] unless exactly
    /// one item matches.
    #[instrument(skip(self, vault_id), fields(vault_id = %vault_id))]
    pub async fn get_by_title(&self, vault_id: &VaultId, title: &str) -> Result<FullItem, ConnectError> {
        let summary = self.summary_by_title(vault_id, title).await?;
        let item_id = require_id(summary.id, ResourceKind::Item)?;
        self.fetch(vault_id.as_str(), item_id.as_str()).await
    }

    /// The summary of the one item titled `title`, without the follow-up fetch.
    #[instrument(skip(self, vault_id), fields(vault_id = %vault_id))]
    pub async fn summary_by_title(&self, vault_id: &VaultId, title: &str) -> Result<ItemSummary, ConnectError> {
        let matches = self.search(vault_id, paths::title_equals(title)).await?;
        debug!(matches = matches.len(), "item title search");
        single_match(matches, ResourceKind::Item, title)
    }

    /// Every item whose title equals `title`, fully fetched.
    #[instrument(skip(self, vault_id), fields(vault_id = %vault_id))]
    pub async fn list_by_title(&self, vault_id: &VaultId, title: &str) -> Result<Vec<FullItem>, ConnectError> {
        let matches = self.search(vault_id, paths::title_equals(title)).await?;
        self.hydrate(vault_id, matches).await
    }

    /// Every item whose title contains `fragment`, fully fetched.
    #[instrument(skip(self, vault_id), fields(vault_id = %vault_id))]
    pub async fn list_by_title_contains(
        &self,
        vault_id: &VaultId,
        fragment: &str,
    ) -> Result<Vec<FullItem>, ConnectError> {
        let matches = self.search(vault_id, paths::title_contains(fragment)).await?;
        self.hydrate(vault_id, matches).await
    }

    /// Creates `item` in the vault. The vault reference on the item is
    /// overwritten with `vault_id`.
    #[instrument(skip(self, vault_id, item), fields(vault_id = %vault_id))]
    pub async fn create(&self, vault_id: &VaultId, mut item: FullItem) -> Result<FullItem, ConnectError> {
        item.vault = Some(VaultRef::new(vault_id.clone()));
        let request = Request::post(paths::items(vault_id.as_str()), to_wire(&item)?);
        let body = send_json(self.transport.as_ref(), request).await?;
        Ok(from_wire(body)?)
    }

    /// Replaces a persisted item.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingIdentifier`] if the item has no id or no vault
    /// reference. Nothing is sent in that case.
    #[instrument(skip(self, item), fields(item_id = ?item.id))]
    pub async fn update(&self, item: &FullItem) -> Result<FullItem, ConnectError> {
        let item_id = item.id.as_ref().ok_or(ValidationError::MissingIdentifier {
            resource: ResourceKind::Item,
        })?;
        let vault_id = item.vault_id().ok_or(ValidationError::MissingIdentifier {
            resource: ResourceKind::Vault,
        })?;
        let request = Request::put(paths::item(vault_id.as_str(), item_id.as_str()), to_wire(item)?);
        let body = send_json(self.transport.as_ref(), request).await?;
        Ok(from_wire(body)?)
    }

    /// Deletes the item matching `query` (id or exact title).
    #[instrument(skip(self, vault_id), fields(vault_id = %vault_id))]
    pub async fn delete(&self, vault_id: &VaultId, query: &str) -> Result<(), ConnectError> {
        match Query::classify(query)? {
            Query::ById(id) => self.remove(vault_id.as_str(), &id).await,
            Query::ByTitle(title) => self.delete_by_title(vault_id, &title).await,
        }
    }

    #[instrument(skip(self, vault_id, item_id), fields(vault_id = %vault_id, item_id = %item_id))]
    pub async fn delete_by_id(&self, vault_id: &VaultId, item_id: &ItemId) -> Result<(), ConnectError> {
        self.remove(vault_id.as_str(), item_id.as_str()).await
    }

    #[instrument(skip(self, vault_id), fields(vault_id = %vault_id))]
    pub async fn delete_by_title(&self, vault_id: &VaultId, title: &str) -> Result<(), ConnectError> {
        let summary = self.summary_by_title(vault_id, title).await?;
        let item_id = require_id(summary.id, ResourceKind::Item)?;
        self.remove(vault_id.as_str(), item_id.as_str()).await
    }

    /// Current code of the item's first one-time-password field.
    ///
    /// # Errors
    ///
    /// [`DomainError::OtpNotFound`] if the first OTP field is missing or empty.
    #[instrument(skip(self, vault_id), fields(vault_id = %vault_id))]
    pub async fn otp(&self, vault_id: &VaultId, query: &str) -> Result<String, ConnectError> {
        let item = self.get(vault_id, query).await?;
        match item.otp() {
            Some(code) => Ok(code.to_owned()),
            None => Err(DomainError::OtpNotFound {
                item_id: item.id.as_ref().map(ItemId::to_string).unwrap_or_default(),
            }
            .into()),
        }
    }

    async fn fetch(&self, vault_id: &str, item_id: &str) -> Result<FullItem, ConnectError> {
        let request = Request::get(paths::item(vault_id, item_id));
        let body = send_json(self.transport.as_ref(), request).await?;
        Ok(from_wire(body)?)
    }

    async fn remove(&self, vault_id: &str, item_id: &str) -> Result<(), ConnectError> {
        send_raw(self.transport.as_ref(), Request::delete(paths::item(vault_id, item_id))).await?;
        Ok(())
    }

    async fn search(&self, vault_id: &VaultId, filter: String) -> Result<Vec<ItemSummary>, ConnectError> {
        let request = Request::get(paths::items(vault_id.as_str())).with_query(paths::FILTER_PARAM, filter);
        let body = send_json(self.transport.as_ref(), request).await?;
        Ok(from_wire_list(body)?)
    }

    /// Fetches every summary in full, concurrently. Output order follows input
    /// order; the first failure aborts the rest.
    async fn hydrate(&self, vault_id: &VaultId, matches: Vec<ItemSummary>) -> Result<Vec<FullItem>, ConnectError> {
        let ids = matches
            .into_iter()
            .map(|summary| require_id(summary.id, ResourceKind::Item))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = ids.len(), "hydrating items");
        try_join_all(ids.iter().map(|id| self.fetch(vault_id.as_str(), id.as_str()))).await
    }
}

impl std::fmt::Debug for Items {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Items").finish_non_exhaustive()
    }
}
