// The in-memory workspace model: a virtual file tree plus the editor tabs
// that point into it. As far as the rest of the crate is concerned, paths are
// `/`-separated strings relative to the workspace root.

pub(crate) mod editor;
pub(crate) mod paths;
pub(crate) mod tree;

pub(crate) use editor::{EditorState, EditorStatus};
pub(crate) use tree::{FileTree, FlatFile, Listing, NodeView};
