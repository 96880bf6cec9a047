//! Files attached to items.
//!
//! Both the vault and the item may be named by id or title. The vault is
//! resolved first, then the item inside it, and only then is the file path
//! composed.

use std::sync::Arc;

use domain::{
    from_wire, from_wire_list, ByteStream, ConnectError, DomainError, ItemFile, Query, Request,
    ResourceKind, Transport, ValidationError, VaultId,
};
use tracing::{debug, instrument};

use crate::items::Items;
use crate::paths;
use crate::resolve::{require_id, send_json, send_raw};
use crate::vaults::Vaults;

/// File metadata and content.
#[derive(Clone)]
pub struct Files {
    transport: Arc<dyn Transport>,
    vaults: Vaults,
    items: Items,
}

impl Files {
    pub fn new(transport: Arc<dyn Transport>, vaults: Vaults, items: Items) -> Self {
        Self {
            transport,
            vaults,
            items,
        }
    }

    /// Metadata of every file on the item.
    #[instrument(skip(self))]
    pub async fn list(&self, vault_query: &str, item_query: &str) -> Result<Vec<ItemFile>, ConnectError> {
        let (vault_id, item_id) = self.resolve(vault_query, item_query).await?;
        let body = send_json(self.transport.as_ref(), Request::get(paths::files(&vault_id, &item_id))).await?;
        Ok(from_wire_list(body)?)
    }

    /// Metadata of one file.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingFileId`] for an empty `file_id`, before any
    /// lookup is made.
    #[instrument(skip(self))]
    pub async fn get(&self, vault_query: &str, item_query: &str, file_id: &str) -> Result<ItemFile, ConnectError> {
        require_file_id(file_id)?;
        let (vault_id, item_id) = self.resolve(vault_query, item_query).await?;
        let request = Request::get(paths::file(&vault_id, &item_id, file_id));
        let body = send_json(self.transport.as_ref(), request).await?;
        Ok(from_wire(body)?)
    }

    /// The file's content, buffered into a string.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingFileId`] for an empty `file_id`;
    /// [`DomainError::ContentNotUtf8`] if the content is not text.
    #[instrument(skip(self))]
    pub async fn content(&self, vault_query: &str, item_query: &str, file_id: &str) -> Result<String, ConnectError> {
        require_file_id(file_id)?;
        let (vault_id, item_id) = self.resolve(vault_query, item_query).await?;
        let request = Request::get(paths::file_content(&vault_id, &item_id, file_id));
        let response = send_raw(self.transport.as_ref(), request).await?;
        String::from_utf8(response.body).map_err(|_| {
            DomainError::ContentNotUtf8 {
                file_id: file_id.to_owned(),
            }
            .into()
        })
    }

    /// The file's content as a stream of chunks.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingFileId`] for an empty `file_id`.
    #[instrument(skip(self))]
    pub async fn content_stream(
        &self,
        vault_query: &str,
        item_query: &str,
        file_id: &str,
    ) -> Result<ByteStream, ConnectError> {
        require_file_id(file_id)?;
        let (vault_id, item_id) = self.resolve(vault_query, item_query).await?;
        let request = Request::get(paths::file_content(&vault_id, &item_id, file_id));
        debug!(method = %request.method, path = %request.path, "opening content stream");
        Ok(self.transport.send_streaming(request).await?)
    }

    async fn resolve(&self, vault_query: &str, item_query: &str) -> Result<(String, String), ConnectError> {
        let vault_id = match Query::classify(vault_query)? {
            Query::ById(id) => id,
            Query::ByTitle(title) => {
                let vault = self.vaults.get_by_title(&title).await?;
                require_id(vault.id, ResourceKind::Vault)?.to_string()
            }
        };
        let item_id = match Query::classify(item_query)? {
            Query::ById(id) => id,
            Query::ByTitle(title) => {
                let vault = require_id(VaultId::new(vault_id.as_str()), ResourceKind::Vault)?;
                let summary = self.items.summary_by_title(&vault, &title).await?;
                require_id(summary.id, ResourceKind::Item)?.to_string()
            }
        };
        Ok((vault_id, item_id))
    }
}

fn require_file_id(file_id: &str) -> Result<(), ValidationError> {
    if file_id.is_empty() {
        Err(ValidationError::MissingFileId)
    } else {
        Ok(())
    }
}

impl std::fmt::Debug for Files {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Files").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use domain::Method;
    use futures::TryStreamExt;
    use serde_json::json;

    use super::*;
    use crate::resolve::scripted::ScriptedTransport;

    const VAULT: &str = "hfnjvi6aymbsnfc2xeeoheizda";
    const ITEM: &str = "llriqid2uq6ucvxpe2nta4hcb1";
    const FILE: &str = "6r65pjq33banznomn7q22sj44e";

    fn files(transport: ScriptedTransport) -> (Files, Arc<ScriptedTransport>) {
        let transport: Arc<ScriptedTransport> = Arc::new(transport);
        let shared: Arc<dyn Transport> = transport.clone();
        let files = Files::new(
            shared.clone(),
            Vaults::new(shared.clone()),
            Items::new(shared),
        );
        (files, transport)
    }

    fn files_path() -> String {
        format!("v1/vaults/{VAULT}/items/{ITEM}/files/")
    }

    #[tokio::test]
    async fn list_with_ids_skips_resolution() {
        let (files, transport) = files(ScriptedTransport::new().json(
            Method::Get,
            &files_path(),
            json!([{"id": FILE, "name": "cert.pem", "size": 1254, "content_path": "/x"}]),
        ));
        let list = files.list(VAULT, ITEM).await.unwrap();
        assert_eq!(list[0].size, Some(1254));
        assert_eq!(list[0].content_path.as_deref(), Some("/x"));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn titles_resolve_vault_before_item() {
        let (files, transport) = files(
            ScriptedTransport::new()
                .json(Method::Get, r#"v1/vaults/?title eq "Work""#, json!([{"id": VAULT}]))
                .json(
                    Method::Get,
                    &format!("v1/vaults/{VAULT}/items/?title eq \"Server\""),
                    json!([{"id": ITEM}]),
                )
                .json(Method::Get, &files_path(), json!([])),
        );
        assert!(files.list("Work", "Server").await.unwrap().is_empty());
        assert_eq!(
            transport.sent_keys(),
            vec![
                r#"GET v1/vaults/?title eq "Work""#.to_owned(),
                format!("GET v1/vaults/{VAULT}/items/?title eq \"Server\""),
                format!("GET {}", files_path()),
            ]
        );
    }

    #[tokio::test]
    async fn get_fetches_single_file() {
        let (files, _) = files(ScriptedTransport::new().json(
            Method::Get,
            &format!("{}{FILE}", files_path()),
            json!({"id": FILE, "name": "cert.pem"}),
        ));
        let file = files.get(VAULT, ITEM, FILE).await.unwrap();
        assert_eq!(file.name.as_deref(), Some("cert.pem"));
    }

    #[tokio::test]
    async fn empty_file_id_fails_before_any_request() {
        let (files, transport) = files(ScriptedTransport::new());
        for err in [
            files.get("Work", "Server", "").await.unwrap_err(),
            files.content("Work", "Server", "").await.unwrap_err(),
            files.content_stream("Work", "Server", "").await.err().unwrap(),
        ] {
            assert!(matches!(err, ConnectError::Validation(ValidationError::MissingFileId)));
        }
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn content_is_buffered_as_text() {
        let (files, _) = files(ScriptedTransport::new().bytes(
            Method::Get,
            &format!("{}{FILE}/content", files_path()),
            b"-----BEGIN CERTIFICATE-----",
        ));
        let text = files.content(VAULT, ITEM, FILE).await.unwrap();
        assert_eq!(text, "-----BEGIN CERTIFICATE-----");
    }

    #[tokio::test]
    async fn binary_content_is_not_text() {
        let (files, _) = files(ScriptedTransport::new().bytes(
            Method::Get,
            &format!("{}{FILE}/content", files_path()),
            &[0xff, 0xfe, 0x00],
        ));
        let err = files.content(VAULT, ITEM, FILE).await.unwrap_err();
        assert!(matches!(err, ConnectError::Domain(DomainError::ContentNotUtf8 { .. })));
    }

    #[tokio::test]
    async fn content_stream_yields_all_bytes() {
        let (files, _) = files(ScriptedTransport::new().bytes(
            Method::Get,
            &format!("{}{FILE}/content", files_path()),
            b"streamed file body",
        ));
        let stream = files.content_stream(VAULT, ITEM, FILE).await.unwrap();
        let chunks: Vec<Vec<u8>> = stream.try_collect().await.unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), b"streamed file body");
    }
}
