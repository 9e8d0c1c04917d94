use std::sync::Arc;

use crate::error::Error;
use crate::folder::Folder;
use crate::item::{Item, ItemFlags, ItemState};
use crate::transport::{ENDPOINT_FOLDERS, RestClient};

/// Entry point into the remote tree. Cheap to create; holds no state beyond
/// the shared transport.
pub struct FileSystem {
    client: Arc<RestClient>,
}

impl FileSystem {
    pub(crate) fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    /// The root folder of the user's filesystem.
    pub async fn root(&self) -> Result<Folder, Error> {
        let meta = self.client.get_meta(ENDPOINT_FOLDERS, "/").await?;
        let state = ItemState::new(Arc::clone(&self.client), "/", ItemFlags::default(), meta);
        Ok(Folder::from_state(state))
    }

    /// Items at the top level of the trash.
    pub async fn list_trash(&self) -> Result<Vec<Item>, Error> {
        let listing = self.client.browse_trash(None).await?;
        Ok(listing
            .items
            .into_iter()
            .map(|meta| {
                Item::from_meta(Arc::clone(&self.client), "/", ItemFlags::trashed(), meta)
            })
            .collect())
    }
}
