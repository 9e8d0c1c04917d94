use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Error;
use crate::file::File;
use crate::folder::Folder;
use crate::path::{self, Destination};
use crate::policy::{ExistsPolicy, RestorePolicy, VersionConflict};
use crate::transport::{ENDPOINT_FILES, ENDPOINT_FOLDERS, RestClient};

/// Pending application-data keys use this to remember where a trashed item
/// lived, so a restore can find it again.
pub(crate) const ORIGINAL_PATH_KEY: &str = "_original_path";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
    /// The server reports the filesystem root as its own kind; it behaves as
    /// a folder.
    Root,
}

impl ItemKind {
    pub fn is_container(self) -> bool {
        !matches!(self, ItemKind::File)
    }

    pub(crate) fn endpoint(self) -> &'static str {
        match self {
            ItemKind::File => ENDPOINT_FILES,
            ItemKind::Folder | ItemKind::Root => ENDPOINT_FOLDERS,
        }
    }
}

/// Raw item attributes as the server reports them.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemMeta {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub name: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub date_created: Option<i64>,
    #[serde(default)]
    pub date_meta_last_modified: Option<i64>,
    #[serde(default)]
    pub date_content_last_modified: Option<i64>,
    #[serde(default)]
    pub is_mirrored: Option<bool>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "blocklist_key")]
    pub content_descriptor: Option<String>,
    #[serde(default, rename = "blocklist_id")]
    pub content_id: Option<String>,
    #[serde(default)]
    pub application_data: Map<String, Value>,
}

/// Where an item sits relative to the live tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemFlags {
    pub in_trash: bool,
    pub in_share: bool,
    pub old_version: bool,
}

impl ItemFlags {
    pub(crate) fn trashed() -> Self {
        Self {
            in_trash: true,
            ..Self::default()
        }
    }
}

/// Locally modified attributes not yet written back. Application data merges
/// key-wise instead of replacing the whole map.
#[derive(Debug, Clone, Default)]
pub(crate) struct PendingChanges {
    name: Option<String>,
    extension: Option<String>,
    mime: Option<String>,
    date_created: Option<i64>,
    date_meta_last_modified: Option<i64>,
    date_content_last_modified: Option<i64>,
    application_data: Map<String, Value>,
}

impl PendingChanges {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.extension.is_none()
            && self.mime.is_none()
            && self.date_created.is_none()
            && self.date_meta_last_modified.is_none()
            && self.date_content_last_modified.is_none()
            && self.application_data.is_empty()
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn to_form(&self) -> Vec<(String, String)> {
        let mut form = Vec::new();
        if let Some(name) = &self.name {
            form.push(("name".to_string(), name.clone()));
        }
        if let Some(extension) = &self.extension {
            form.push(("extension".to_string(), extension.clone()));
        }
        if let Some(mime) = &self.mime {
            form.push(("mime".to_string(), mime.clone()));
        }
        if let Some(ts) = self.date_created {
            form.push(("date_created".to_string(), ts.to_string()));
        }
        if let Some(ts) = self.date_meta_last_modified {
            form.push(("date_meta_last_modified".to_string(), ts.to_string()));
        }
        if let Some(ts) = self.date_content_last_modified {
            form.push(("date_content_last_modified".to_string(), ts.to_string()));
        }
        if !self.application_data.is_empty() {
            form.push((
                "application_data".to_string(),
                Value::Object(self.application_data.clone()).to_string(),
            ));
        }
        form
    }
}

/// Shared state and behaviour of every remote item. `Folder` and `File`
/// wrap this and add their own operations.
pub struct ItemState {
    client: Arc<RestClient>,
    meta: ItemMeta,
    address: String,
    flags: ItemFlags,
    exists: bool,
    pending: PendingChanges,
}

impl ItemState {
    pub(crate) fn new(
        client: Arc<RestClient>,
        parent: &str,
        flags: ItemFlags,
        meta: ItemMeta,
    ) -> Self {
        let address = path::compute_address(parent, &meta.id);
        Self {
            client,
            meta,
            address,
            flags,
            exists: true,
            pending: PendingChanges::default(),
        }
    }

    // ------------------------------------------------------------------
    // accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// The id-addressed absolute path of this item.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn kind(&self) -> ItemKind {
        self.meta.kind
    }

    pub fn version(&self) -> u64 {
        self.meta.version
    }

    pub fn date_created(&self) -> Option<i64> {
        self.meta.date_created
    }

    pub fn date_meta_last_modified(&self) -> Option<i64> {
        self.meta.date_meta_last_modified
    }

    pub fn date_content_last_modified(&self) -> Option<i64> {
        self.meta.date_content_last_modified
    }

    pub fn is_mirrored(&self) -> bool {
        self.meta.is_mirrored.unwrap_or(false)
    }

    pub fn mime(&self) -> Option<&str> {
        self.meta.mime.as_deref()
    }

    pub fn extension(&self) -> Option<&str> {
        self.meta.extension.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.meta.size.unwrap_or(0)
    }

    pub fn application_data(&self) -> &Map<String, Value> {
        &self.meta.application_data
    }

    /// Content-addressing key of a file's data, if the server reported one.
    pub fn content_descriptor(&self) -> Option<&str> {
        self.meta.content_descriptor.as_deref()
    }

    pub fn content_id(&self) -> Option<&str> {
        self.meta.content_id.as_deref()
    }

    pub fn in_trash(&self) -> bool {
        self.flags.in_trash
    }

    pub fn in_share(&self) -> bool {
        self.flags.in_share
    }

    pub fn is_old_version(&self) -> bool {
        self.flags.old_version
    }

    /// False once the item has been permanently removed.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub(crate) fn client(&self) -> &Arc<RestClient> {
        &self.client
    }

    pub(crate) fn flags(&self) -> ItemFlags {
        self.flags
    }

    // ------------------------------------------------------------------
    // local mutation, written back by save()
    // ------------------------------------------------------------------

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.meta.name = name.clone();
        self.pending.name = Some(name);
    }

    /// The server derives the stored extension from the name; this only
    /// records the caller's intent for the next save.
    pub fn set_extension(&mut self, extension: impl Into<String>) {
        let extension = extension.into();
        self.meta.extension = Some(extension.clone());
        self.pending.extension = Some(extension);
    }

    pub fn set_mime(&mut self, mime: impl Into<String>) {
        let mime = mime.into();
        self.meta.mime = Some(mime.clone());
        self.pending.mime = Some(mime);
    }

    pub fn set_date_created(&mut self, seconds_since_epoch: i64) {
        self.meta.date_created = Some(seconds_since_epoch);
        self.pending.date_created = Some(seconds_since_epoch);
    }

    pub fn set_date_meta_last_modified(&mut self, seconds_since_epoch: i64) {
        self.meta.date_meta_last_modified = Some(seconds_since_epoch);
        self.pending.date_meta_last_modified = Some(seconds_since_epoch);
    }

    pub fn set_date_content_last_modified(&mut self, seconds_since_epoch: i64) {
        self.meta.date_content_last_modified = Some(seconds_since_epoch);
        self.pending.date_content_last_modified = Some(seconds_since_epoch);
    }

    /// Merges the given keys into the item's application data.
    pub fn merge_application_data(&mut self, data: Map<String, Value>) {
        for (key, value) in data {
            self.meta.application_data.insert(key.clone(), value.clone());
            self.pending.application_data.insert(key, value);
        }
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    // ------------------------------------------------------------------
    // state guards
    // ------------------------------------------------------------------

    fn ensure_exists(&self) -> Result<(), Error> {
        if self.exists { Ok(()) } else { Err(Error::InvalidItem) }
    }

    pub(crate) fn ensure_operable(&self, allow_trash: bool) -> Result<(), Error> {
        self.ensure_exists()?;
        if self.flags.old_version {
            return Err(Error::OperationNotAllowed(
                "old file versions are read-only snapshots".into(),
            ));
        }
        if self.flags.in_share {
            return Err(Error::OperationNotAllowed(
                "items browsed through a share cannot be modified".into(),
            ));
        }
        if !allow_trash && self.flags.in_trash {
            return Err(Error::OperationNotAllowed(
                "item is in trash; restore it first".into(),
            ));
        }
        Ok(())
    }

    fn apply_meta(&mut self, parent: &str, flags: ItemFlags, meta: ItemMeta) {
        self.address = path::compute_address(parent, &meta.id);
        self.meta = meta;
        self.flags = flags;
        self.exists = true;
        self.pending.clear();
    }

    // ------------------------------------------------------------------
    // remote operations
    // ------------------------------------------------------------------

    /// Moves this item into `destination`, updating it in place. Pending
    /// local changes are discarded.
    pub(crate) async fn perform_move(
        &mut self,
        destination: Destination<'_>,
        name: Option<&str>,
        exists: ExistsPolicy,
    ) -> Result<(), Error> {
        self.ensure_operable(false)?;
        let exists = exists.ensure_transferable("move")?;
        let destination = destination.resolve();
        let name = name.unwrap_or(&self.meta.name).to_string();
        let meta = self
            .client
            .move_item(self.kind().endpoint(), &self.address, &destination, &name, exists)
            .await?;
        self.apply_meta(&destination, ItemFlags::default(), meta);
        Ok(())
    }

    /// Copies this item into `destination` and returns the copy's meta and
    /// parent address. This item is left untouched.
    pub(crate) async fn perform_copy(
        &self,
        destination: Destination<'_>,
        name: Option<&str>,
        exists: ExistsPolicy,
    ) -> Result<(String, ItemMeta), Error> {
        self.ensure_operable(false)?;
        let exists = exists.ensure_transferable("copy")?;
        let destination = destination.resolve();
        let name = name.unwrap_or(&self.meta.name).to_string();
        let meta = self
            .client
            .copy_item(self.kind().endpoint(), &self.address, &destination, &name, exists)
            .await?;
        Ok((destination, meta))
    }

    pub(crate) async fn perform_delete(&mut self, force: bool, commit: bool) -> Result<(), Error> {
        self.ensure_operable(true)?;
        if self.flags.in_trash {
            // Already trashed; only a commit does anything.
            if commit {
                self.client.delete_trash_item(&self.address).await?;
                self.exists = false;
                self.flags.in_trash = false;
            }
            return Ok(());
        }
        self.client
            .delete_item(self.kind().endpoint(), &self.address, commit, force)
            .await?;
        if commit {
            self.exists = false;
            self.flags.in_trash = false;
        } else {
            let original_parent = path::parent_of(&self.address).to_string();
            self.meta
                .application_data
                .insert(ORIGINAL_PATH_KEY.to_string(), Value::String(original_parent));
            self.address = path::compute_address("/", &self.meta.id);
            self.flags.in_trash = true;
        }
        self.pending.clear();
        Ok(())
    }

    pub(crate) async fn perform_restore(
        &mut self,
        destination: Option<Destination<'_>>,
        policy: RestorePolicy,
    ) -> Result<(), Error> {
        if !self.flags.in_trash {
            return Err(Error::OperationNotAllowed(
                "only trashed items can be restored".into(),
            ));
        }
        self.ensure_exists()?;
        let destination = destination.map(Destination::resolve);
        self.client
            .recover_trash_item(&self.address, policy, destination.as_deref())
            .await?;
        self.locate_restored(destination.as_deref(), policy).await
    }

    /// After a restore the server does not say where the item landed. Try the
    /// original parent first, then fall back per the restore policy.
    async fn locate_restored(
        &mut self,
        destination: Option<&str>,
        policy: RestorePolicy,
    ) -> Result<(), Error> {
        let endpoint = self.kind().endpoint();
        let original_parent = self
            .meta
            .application_data
            .get(ORIGINAL_PATH_KEY)
            .and_then(Value::as_str)
            .unwrap_or("/")
            .to_string();
        let candidate = path::compute_address(&original_parent, &self.meta.id);
        match self.client.get_meta(endpoint, &candidate).await {
            Ok(meta) => {
                self.apply_meta(&original_parent, ItemFlags::default(), meta);
                return Ok(());
            }
            Err(err) => {
                if policy == RestorePolicy::Fail {
                    return Err(err);
                }
                warn!(
                    address = %candidate,
                    policy = %policy,
                    "original location lookup failed, trying fallback"
                );
            }
        }
        let parent = match policy {
            RestorePolicy::Rescue => destination.unwrap_or("/").to_string(),
            RestorePolicy::Recreate => {
                self.client
                    .address_of_named_path(destination.unwrap_or("/"))
                    .await?
            }
            RestorePolicy::Fail => unreachable!("handled above"),
        };
        let candidate = path::compute_address(&parent, &self.meta.id);
        let meta = self.client.get_meta(endpoint, &candidate).await?;
        self.apply_meta(&parent, ItemFlags::default(), meta);
        Ok(())
    }

    /// Writes pending local changes back to the server. No-op when nothing
    /// changed.
    pub(crate) async fn perform_save(
        &mut self,
        version_conflict: VersionConflict,
    ) -> Result<(), Error> {
        self.ensure_operable(false)?;
        if self.pending.is_empty() {
            return Ok(());
        }
        let form = self.pending.to_form();
        let meta = self
            .client
            .alter_meta(
                self.kind().endpoint(),
                &self.address,
                self.meta.version,
                version_conflict,
                form,
            )
            .await?;
        let parent = path::parent_of(&self.address).to_string();
        let flags = self.flags;
        self.apply_meta(&parent, flags, meta);
        Ok(())
    }

    /// Reloads attributes from the server, discarding pending local changes.
    pub(crate) async fn perform_refresh(&mut self) -> Result<(), Error> {
        self.ensure_exists()?;
        if self.flags.old_version {
            return Err(Error::OperationNotAllowed(
                "old file versions are read-only snapshots".into(),
            ));
        }
        let meta = if self.flags.in_trash {
            let listing = self.client.browse_trash(Some(&self.address)).await?;
            listing
                .meta
                .ok_or_else(|| Error::Protocol("trash listing carried no meta".into()))?
        } else {
            self.client.get_meta(self.kind().endpoint(), &self.address).await?
        };
        let parent = path::parent_of(&self.address).to_string();
        let flags = self.flags;
        self.apply_meta(&parent, flags, meta);
        Ok(())
    }
}

impl fmt::Debug for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemState")
            .field("id", &self.meta.id)
            .field("kind", &self.meta.kind)
            .field("name", &self.meta.name)
            .field("address", &self.address)
            .field("flags", &self.flags)
            .field("exists", &self.exists)
            .finish_non_exhaustive()
    }
}

// Items are the same item when they share an id, wherever they sit.
impl PartialEq for ItemState {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id == other.meta.id
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.state() == other.state()
    }
}

/// Options for [`Item::delete`] and the folder/file equivalents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteOptions {
    /// Delete a folder even when it is not empty.
    pub force: bool,
    /// Skip the trash and remove permanently.
    pub commit: bool,
    /// Propagate service failures instead of reporting `false`.
    pub raise_on_error: bool,
}

/// Errors a delete/restore call reports as `Ok(false)` unless the caller
/// opted into raising: recoverable transport failures plus the item-state
/// refusals. Argument errors always propagate.
fn suppressible(err: &Error) -> bool {
    err.is_recoverable()
        || matches!(err, Error::InvalidItem | Error::OperationNotAllowed(_))
}

pub(crate) fn swallow_result(result: Result<(), Error>, raise_on_error: bool) -> Result<bool, Error> {
    match result {
        Ok(()) => Ok(true),
        Err(err) if !raise_on_error && suppressible(&err) => {
            warn!(error = %err, "operation failed, reporting false");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// A remote item of either kind. Listings return these; match to get at the
/// kind-specific operations.
#[derive(Debug)]
pub enum Item {
    File(File),
    Folder(Folder),
}

impl Item {
    pub(crate) fn from_meta(
        client: Arc<RestClient>,
        parent: &str,
        flags: ItemFlags,
        meta: ItemMeta,
    ) -> Item {
        let state = ItemState::new(client, parent, flags, meta);
        if state.kind().is_container() {
            Item::Folder(Folder::from_state(state))
        } else {
            Item::File(File::from_state(state))
        }
    }

    pub fn state(&self) -> &ItemState {
        match self {
            Item::File(file) => file.state(),
            Item::Folder(folder) => folder.state(),
        }
    }

    pub fn state_mut(&mut self) -> &mut ItemState {
        match self {
            Item::File(file) => file.state_mut(),
            Item::Folder(folder) => folder.state_mut(),
        }
    }

    pub fn name(&self) -> &str {
        self.state().name()
    }

    pub fn id(&self) -> &str {
        self.state().id()
    }

    pub fn address(&self) -> &str {
        self.state().address()
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Item::Folder(_))
    }

    pub fn into_folder(self) -> Option<Folder> {
        match self {
            Item::Folder(folder) => Some(folder),
            Item::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<File> {
        match self {
            Item::File(file) => Some(file),
            Item::Folder(_) => None,
        }
    }

    /// Moves this item into `destination`, updating it in place.
    pub async fn move_to(
        &mut self,
        destination: impl Into<Destination<'_>>,
        name: Option<&str>,
        exists: ExistsPolicy,
    ) -> Result<(), Error> {
        self.state_mut()
            .perform_move(destination.into(), name, exists)
            .await
    }

    /// Copies this item into `destination`, returning the new item and
    /// leaving this one untouched.
    pub async fn copy_to(
        &self,
        destination: impl Into<Destination<'_>>,
        name: Option<&str>,
        exists: ExistsPolicy,
    ) -> Result<Item, Error> {
        let state = self.state();
        let (parent, meta) = state.perform_copy(destination.into(), name, exists).await?;
        Ok(Item::from_meta(
            Arc::clone(state.client()),
            &parent,
            ItemFlags::default(),
            meta,
        ))
    }

    /// Deletes this item. Without `commit` the item moves to trash; with it
    /// the item is gone for good and refuses further operations.
    pub async fn delete(&mut self, options: DeleteOptions) -> Result<bool, Error> {
        let result = self
            .state_mut()
            .perform_delete(options.force, options.commit)
            .await;
        swallow_result(result, options.raise_on_error)
    }

    /// Restores this item from trash. See [`RestorePolicy`] for where it
    /// lands when the original location is gone.
    pub async fn restore(
        &mut self,
        destination: Option<Destination<'_>>,
        policy: RestorePolicy,
        raise_on_error: bool,
    ) -> Result<bool, Error> {
        let result = self.state_mut().perform_restore(destination, policy).await;
        swallow_result(result, raise_on_error)
    }

    pub async fn save(&mut self, version_conflict: VersionConflict) -> Result<(), Error> {
        self.state_mut().perform_save(version_conflict).await
    }

    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.state_mut().perform_refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RestConfig;
    use serde_json::json;

    fn client() -> Arc<RestClient> {
        Arc::new(
            RestClient::new("id", "secret", "https://files.example.com", RestConfig::default())
                .expect("client"),
        )
    }

    fn folder_meta(id: &str, name: &str) -> ItemMeta {
        serde_json::from_value(json!({
            "id": id,
            "type": "folder",
            "name": name,
            "version": 3,
        }))
        .expect("meta")
    }

    #[test]
    fn meta_deserializes_wire_fields() {
        let meta: ItemMeta = serde_json::from_value(json!({
            "id": "f1",
            "type": "file",
            "name": "report.pdf",
            "version": 7,
            "mime": "application/pdf",
            "extension": "pdf",
            "size": 1234,
            "blocklist_key": "abcd",
            "application_data": {"team": "finance"},
        }))
        .expect("meta");
        assert_eq!(meta.kind, ItemKind::File);
        assert_eq!(meta.version, 7);
        assert_eq!(meta.size, Some(1234));
        assert_eq!(meta.content_descriptor.as_deref(), Some("abcd"));
        assert_eq!(meta.application_data["team"], "finance");
    }

    #[test]
    fn root_kind_becomes_a_folder() {
        let meta: ItemMeta = serde_json::from_value(json!({
            "id": "root",
            "type": "root",
            "name": "",
        }))
        .expect("meta");
        let item = Item::from_meta(client(), "/", ItemFlags::default(), meta);
        assert!(item.is_folder());
    }

    #[test]
    fn address_is_parent_plus_id() {
        let state = ItemState::new(client(), "/a/b", ItemFlags::default(), folder_meta("c", "docs"));
        assert_eq!(state.address(), "/a/b/c");
        let top = ItemState::new(client(), "/", ItemFlags::default(), folder_meta("x", "top"));
        assert_eq!(top.address(), "/x");
    }

    #[test]
    fn setters_record_pending_changes() {
        let mut state =
            ItemState::new(client(), "/", ItemFlags::default(), folder_meta("x", "old"));
        assert!(!state.has_pending_changes());
        state.set_name("new");
        assert_eq!(state.name(), "new");
        assert!(state.has_pending_changes());
        let form = state.pending.to_form();
        assert_eq!(form, vec![("name".to_string(), "new".to_string())]);
    }

    #[test]
    fn application_data_merges_keywise() {
        let mut state =
            ItemState::new(client(), "/", ItemFlags::default(), folder_meta("x", "a"));
        let mut first = Map::new();
        first.insert("a".into(), json!(1));
        first.insert("b".into(), json!(2));
        state.merge_application_data(first);
        let mut second = Map::new();
        second.insert("b".into(), json!(3));
        state.merge_application_data(second);
        assert_eq!(state.application_data()["a"], 1);
        assert_eq!(state.application_data()["b"], 3);
    }

    #[tokio::test]
    async fn old_versions_refuse_mutation() {
        let flags = ItemFlags {
            old_version: true,
            ..ItemFlags::default()
        };
        let mut state = ItemState::new(client(), "/", flags, folder_meta("x", "a"));
        let err = state
            .perform_save(VersionConflict::Fail)
            .await
            .expect_err("guarded");
        assert!(matches!(err, Error::OperationNotAllowed(_)));
    }

    #[tokio::test]
    async fn shared_items_refuse_mutation() {
        let flags = ItemFlags {
            in_share: true,
            ..ItemFlags::default()
        };
        let mut state = ItemState::new(client(), "/", flags, folder_meta("x", "a"));
        let err = state
            .perform_move(Destination::Path("/y"), None, ExistsPolicy::Rename)
            .await
            .expect_err("guarded");
        assert!(matches!(err, Error::OperationNotAllowed(_)));
    }

    #[tokio::test]
    async fn restore_requires_trash() {
        let mut state =
            ItemState::new(client(), "/", ItemFlags::default(), folder_meta("x", "a"));
        let err = state
            .perform_restore(None, RestorePolicy::Fail)
            .await
            .expect_err("guarded");
        assert!(matches!(err, Error::OperationNotAllowed(_)));
    }

    #[test]
    fn suppressible_spares_transport_failures() {
        assert!(suppressible(&Error::NotAuthenticated));
        assert!(suppressible(&Error::InvalidItem));
        assert!(suppressible(&Error::OperationNotAllowed("trashed".into())));
        assert!(!suppressible(&Error::Protocol("bad json".into())));
    }

    #[test]
    fn argument_errors_propagate_even_when_not_raising() {
        let result = swallow_result(Err(Error::Argument("blank name".into())), false);
        assert!(matches!(result, Err(Error::Argument(_))));
        // the state refusals still report false
        let refused = swallow_result(Err(Error::InvalidItem), false);
        assert!(matches!(refused, Ok(false)));
    }

    #[test]
    fn debug_output_names_the_item() {
        let state = ItemState::new(client(), "/a", ItemFlags::default(), folder_meta("c", "docs"));
        let rendered = format!("{state:?}");
        assert!(rendered.contains("docs"));
        assert!(rendered.contains("/a/c"));
    }
}
