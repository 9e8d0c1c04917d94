mod error;
mod file;
mod filesystem;
mod folder;
mod item;
mod path;
mod policy;
mod session;
mod transport;

pub use error::{Error, ErrorCategory, RequestContext, ServiceError, ServiceErrorKind};
pub use file::{File, Whence};
pub use filesystem::FileSystem;
pub use folder::Folder;
pub use item::{DeleteOptions, Item, ItemFlags, ItemKind, ItemMeta, ItemState};
pub use path::Destination;
pub use policy::{ExistsPolicy, RestorePolicy, VersionConflict};
pub use session::{Account, AccountPlan, NewAccount, Session, StorageQuota, User};
pub use transport::{RestClient, RestConfig};
