use crate::folder::Folder;

/// Builds an item's absolute address from its parent's address and its id.
/// This is the single place address strings are constructed.
pub(crate) fn compute_address(parent: &str, id: &str) -> String {
    if parent == "/" {
        format!("/{id}")
    } else {
        format!("{parent}/{id}")
    }
}

/// Parent address of an absolute address. The parent of a top-level item
/// is the root `/`.
pub(crate) fn parent_of(address: &str) -> &str {
    match address.rfind('/') {
        Some(0) | None => "/",
        Some(index) => &address[..index],
    }
}

/// Ensures an address carries a leading slash; blank means root.
pub(crate) fn absolute(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// A move/copy/restore destination: either a raw address or a folder object.
/// Accepting only these two shapes makes the "destination must be a folder"
/// check a compile-time property.
#[derive(Debug, Clone, Copy)]
pub enum Destination<'a> {
    Path(&'a str),
    Folder(&'a Folder),
}

impl<'a> Destination<'a> {
    pub(crate) fn resolve(self) -> String {
        match self {
            Destination::Path(path) => absolute(path),
            Destination::Folder(folder) => folder.address().to_string(),
        }
    }
}

impl<'a> From<&'a str> for Destination<'a> {
    fn from(path: &'a str) -> Self {
        Destination::Path(path)
    }
}

impl<'a> From<&'a String> for Destination<'a> {
    fn from(path: &'a String) -> Self {
        Destination::Path(path)
    }
}

impl<'a> From<&'a Folder> for Destination<'a> {
    fn from(folder: &'a Folder) -> Self {
        Destination::Folder(folder)
    }
}
