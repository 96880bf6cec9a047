//! `opconnect` entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Wire observability**: install a `tracing-subscriber` honouring
//!    `RUST_LOG` (default `info`), emitting JSON when
//!    `OPCONNECT_LOG_FORMAT=json`.
//! 2. **Load configuration**: `OP_CONNECT_HOST`, `OP_CONNECT_TOKEN` and the
//!    optional transport settings, plus `OP_VAULT` and `SECRET_STRING`.
//! 3. **Construct infrastructure**: an [`HttpTransport`] shared by a
//!    [`ConnectClient`].
//! 4. **Run the walkthrough**: build a LOGIN item holding the secret, create
//!    it in the vault, read it back by id, and delete it when `--delete` is
//!    given.

use std::sync::Arc;

use anyhow::{bail, Context};
use domain::{FieldSpec, FieldType, ItemBuilder, VaultId};
use resources::ConnectClient;
use tracing::info;
use tracing_subscriber::EnvFilter;
use transport::{ConnectConfig, HttpTransport};

const VAULT_ENV: &str = "OP_VAULT";
const SECRET_ENV: &str = "SECRET_STRING";
const LOG_FORMAT_ENV: &str = "OPCONNECT_LOG_FORMAT";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let delete = match std::env::args().nth(1).as_deref() {
        None => false,
        Some("--delete") => true,
        Some(other) => bail!("unexpected argument '{other}' (usage: opconnect [--delete])"),
    };

    let config = ConnectConfig::from_env().context("loading Connect configuration")?;
    let vault_id = std::env::var(VAULT_ENV)
        .ok()
        .and_then(VaultId::new)
        .with_context(|| format!("{VAULT_ENV} must be set"))?;
    let secret = std::env::var(SECRET_ENV).with_context(|| format!("{SECRET_ENV} must be set"))?;

    let transport = HttpTransport::new(&config).context("building HTTP transport")?;
    let client = ConnectClient::new(Arc::new(transport));
    info!(server = %config.server_url, "client created");

    let draft = ItemBuilder::new()
        .set_category("LOGIN")?
        .add_field(FieldSpec::new().value(secret).field_type(FieldType::String))?
        .build()?;

    let created = client
        .create_item(&vault_id, draft)
        .await
        .context("creating item")?;
    let item_id = created
        .id
        .clone()
        .context("server returned the created item without an id")?;
    info!(item_id = %item_id, vault_id = %vault_id, "item created");

    let retrieved = client
        .get_item_by_id(&vault_id, &item_id)
        .await
        .context("retrieving item")?;
    info!(item_id = %item_id, fields = retrieved.fields.len(), "item retrieved");

    if delete {
        client
            .delete_item_by_id(&vault_id, &item_id)
            .await
            .context("deleting item")?;
        info!(item_id = %item_id, "item deleted");
    }

    Ok(())
}
