use std::path::Path;
use std::sync::Arc;

use crate::error::Error;
use crate::file::File;
use crate::item::{DeleteOptions, Item, ItemFlags, ItemState};
use crate::path::Destination;
use crate::policy::{ExistsPolicy, RestorePolicy, VersionConflict};

/// A remote folder. Obtained from [`crate::FileSystem::root`], a listing, or
/// [`Folder::create_folder`].
#[derive(Debug)]
pub struct Folder {
    state: ItemState,
}

impl Folder {
    pub(crate) fn from_state(state: ItemState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ItemState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ItemState {
        &mut self.state
    }

    pub fn name(&self) -> &str {
        self.state.name()
    }

    pub fn id(&self) -> &str {
        self.state.id()
    }

    pub fn address(&self) -> &str {
        self.state.address()
    }

    pub fn in_trash(&self) -> bool {
        self.state.in_trash()
    }

    /// Lists the folder's direct children. A trashed folder lists its
    /// trashed contents.
    pub async fn list(&self) -> Result<Vec<Item>, Error> {
        if !self.state.exists() {
            return Err(Error::InvalidItem);
        }
        let client = self.state.client();
        let flags = ItemFlags {
            in_trash: self.state.in_trash(),
            ..self.state.flags()
        };
        let metas = if self.state.in_trash() {
            client.browse_trash(Some(self.address())).await?.items
        } else {
            client.list_folder(Some(self.address()), Some(1), None).await?
        };
        Ok(metas
            .into_iter()
            .map(|meta| Item::from_meta(Arc::clone(client), self.address(), flags, meta))
            .collect())
    }

    /// Creates a child folder. `ExistsPolicy::Reuse` returns the existing
    /// folder of that name instead of failing.
    pub async fn create_folder(
        &self,
        name: &str,
        exists: ExistsPolicy,
    ) -> Result<Folder, Error> {
        self.state.ensure_operable(false)?;
        let meta = self
            .state
            .client()
            .create_folder(name, Some(self.address()), exists)
            .await?;
        let state = ItemState::new(
            Arc::clone(self.state.client()),
            self.address(),
            ItemFlags::default(),
            meta,
        );
        Ok(Folder::from_state(state))
    }

    /// Uploads a local file into this folder. `name` defaults to the file's
    /// own name.
    pub async fn upload(
        &self,
        local_path: impl AsRef<Path>,
        name: Option<&str>,
        exists: ExistsPolicy,
    ) -> Result<File, Error> {
        self.state.ensure_operable(false)?;
        let local_path = local_path.as_ref();
        let name = match name {
            Some(name) => name.to_string(),
            None => local_path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::Argument("upload path has no usable file name".into())
                })?,
        };
        let data = tokio::fs::read(local_path).await?;
        self.upload_bytes(&name, data, exists).await
    }

    /// Uploads in-memory bytes as a file in this folder.
    pub async fn upload_bytes(
        &self,
        name: &str,
        data: Vec<u8>,
        exists: ExistsPolicy,
    ) -> Result<File, Error> {
        self.state.ensure_operable(false)?;
        let exists = exists.ensure_transferable("upload")?;
        let meta = self
            .state
            .client()
            .upload(self.address(), name, data, exists)
            .await?;
        let state = ItemState::new(
            Arc::clone(self.state.client()),
            self.address(),
            ItemFlags::default(),
            meta,
        );
        Ok(File::from_state(state))
    }

    pub async fn move_to(
        &mut self,
        destination: impl Into<Destination<'_>>,
        name: Option<&str>,
        exists: ExistsPolicy,
    ) -> Result<(), Error> {
        self.state.perform_move(destination.into(), name, exists).await
    }

    pub async fn copy_to(
        &self,
        destination: impl Into<Destination<'_>>,
        name: Option<&str>,
        exists: ExistsPolicy,
    ) -> Result<Item, Error> {
        let (parent, meta) = self
            .state
            .perform_copy(destination.into(), name, exists)
            .await?;
        Ok(Item::from_meta(
            Arc::clone(self.state.client()),
            &parent,
            ItemFlags::default(),
            meta,
        ))
    }

    pub async fn delete(&mut self, options: DeleteOptions) -> Result<bool, Error> {
        let result = self.state.perform_delete(options.force, options.commit).await;
        crate::item::swallow_result(result, options.raise_on_error)
    }

    pub async fn restore(
        &mut self,
        destination: Option<Destination<'_>>,
        policy: RestorePolicy,
        raise_on_error: bool,
    ) -> Result<bool, Error> {
        let result = self.state.perform_restore(destination, policy).await;
        crate::item::swallow_result(result, raise_on_error)
    }

    pub async fn save(&mut self, version_conflict: VersionConflict) -> Result<(), Error> {
        self.state.perform_save(version_conflict).await
    }

    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.state.perform_refresh().await
    }
}

impl PartialEq for Folder {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}
