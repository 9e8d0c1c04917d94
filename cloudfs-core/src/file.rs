use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::Error;
use crate::item::{DeleteOptions, Item, ItemFlags, ItemState};
use crate::path::{self, Destination};
use crate::policy::{ExistsPolicy, RestorePolicy, VersionConflict};

/// Where a [`File::seek`] offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// A remote file with a read cursor. Reads advance the cursor; the cursor is
/// client-side only and never touches the server.
#[derive(Debug)]
pub struct File {
    state: ItemState,
    offset: u64,
}

impl File {
    pub(crate) fn from_state(state: ItemState) -> Self {
        Self { state, offset: 0 }
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

    pub fn size(&self) -> u64 {
        self.state.size()
    }

    pub fn mime(&self) -> Option<&str> {
        self.state.mime()
    }

    pub fn extension(&self) -> Option<&str> {
        self.state.extension()
    }

    pub fn in_trash(&self) -> bool {
        self.state.in_trash()
    }

    pub fn is_old_version(&self) -> bool {
        self.state.is_old_version()
    }

    // ------------------------------------------------------------------
    // cursor io
    // ------------------------------------------------------------------

    /// Reads up to `count` bytes from the cursor position, or the rest of the
    /// file when `count` is `None`. Requests past end of file return empty
    /// without touching the network.
    pub async fn read(&mut self, count: Option<u64>) -> Result<Bytes, Error> {
        self.state.ensure_operable(false)?;
        if count == Some(0) || self.offset >= self.size() {
            return Ok(Bytes::new());
        }
        let remaining = self.size() - self.offset;
        let count = count.map_or(remaining, |c| c.min(remaining));
        let data = self
            .state
            .client()
            .download(self.address(), self.offset, Some(count))
            .await?;
        self.offset += data.len() as u64;
        Ok(data)
    }

    /// Moves the read cursor and returns the new position.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, Error> {
        let base = match whence {
            Whence::Start => 0i64,
            Whence::Current => self.offset as i64,
            Whence::End => self.size() as i64,
        };
        let target = base.checked_add(offset).ok_or_else(|| {
            Error::Argument(format!("seek offset {offset} overflows the cursor"))
        })?;
        if target < 0 {
            return Err(Error::Argument(format!(
                "seek target {target} is before the start of the file"
            )));
        }
        self.offset = target as u64;
        Ok(self.offset)
    }

    pub fn tell(&self) -> u64 {
        self.offset
    }

    pub fn rewind(&mut self) {
        self.offset = 0;
    }

    /// Streams the whole file into `directory`, chunk by chunk, without
    /// buffering it in memory. Returns the path written. `filename` defaults
    /// to the remote name.
    pub async fn download(
        &self,
        directory: impl AsRef<Path>,
        filename: Option<&str>,
    ) -> Result<PathBuf, Error> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            return Err(Error::Argument(format!(
                "download target {} is not a directory",
                directory.display()
            )));
        }
        self.state.ensure_operable(false)?;
        let target = directory.join(filename.unwrap_or_else(|| self.name()));
        let response = self.state.client().download_response(self.address()).await?;
        let mut stream = response.bytes_stream();
        let mut output = tokio::fs::File::create(&target).await?;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(crate::error::transport_error)?;
            output.write_all(&chunk).await?;
        }
        output.flush().await?;
        Ok(target)
    }

    /// Lists older versions of this file. The returned files are read-only
    /// snapshots; their metadata is accurate but they refuse mutation.
    pub async fn versions(
        &self,
        start_version: u64,
        stop_version: Option<u64>,
        limit: u32,
    ) -> Result<Vec<File>, Error> {
        self.state.ensure_operable(false)?;
        let metas = self
            .state
            .client()
            .list_file_versions(self.address(), start_version, stop_version, limit)
            .await?;
        let parent = path::parent_of(self.address()).to_string();
        let flags = ItemFlags {
            old_version: true,
            ..self.state.flags()
        };
        Ok(metas
            .into_iter()
            .map(|meta| {
                File::from_state(ItemState::new(
                    Arc::clone(self.state.client()),
                    &parent,
                    flags,
                    meta,
                ))
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // shared item operations
    // ------------------------------------------------------------------

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

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}
