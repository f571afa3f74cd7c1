//! Directory operations — listing, recursive tree enumeration, mkdir,
//! recursive delete.

use log::{debug, warn};

use crate::ftp::client::FtpClient;
use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::parser;
use crate::ftp::transport::RequestMethod;
use crate::ftp::types::{FtpDirectory, FtpEntry};

/// Recursion ceiling for tree enumeration. A server that lists a
/// directory inside itself would otherwise recurse without bound.
pub const MAX_TREE_DEPTH: usize = 64;

impl FtpClient {
    // ─── Listing ─────────────────────────────────────────────────

    /// Name-only listing of a directory.
    pub async fn list_names(&self, path: &str) -> FtpResult<Vec<String>> {
        let text = self
            .transport
            .text_command(path, RequestMethod::ListNames)
            .await?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    /// Detailed listing of one directory, parsed into a tree.
    ///
    /// A transport refusal is an error, distinct from an existing but
    /// empty directory — servers refuse invalid paths outright.
    pub async fn list_tree(&self, path: &str) -> FtpResult<FtpDirectory> {
        let text = self
            .transport
            .text_command(path, RequestMethod::ListDetails)
            .await?;
        Ok(parser::parse_directory(&text, path))
    }

    /// Pre-order, depth-first enumeration of `root` and every
    /// directory below it, root first.
    ///
    /// All-or-nothing: any nested listing failure discards the partial
    /// result, so callers never act on an incomplete picture of the
    /// remote tree.
    pub async fn list_all_trees(&self, root: &str) -> FtpResult<Vec<FtpDirectory>> {
        let tree = self.list_tree(root).await?;
        let mut out = Vec::new();
        self.collect_trees(tree, 0, &mut out).await?;
        debug!("enumerated {} tree(s) under {}", out.len(), root);
        Ok(out)
    }

    async fn collect_trees(
        &self,
        tree: FtpDirectory,
        depth: usize,
        out: &mut Vec<FtpDirectory>,
    ) -> FtpResult<()> {
        if depth >= MAX_TREE_DEPTH {
            warn!("tree enumeration exceeded depth {} at {}", depth, tree.path);
            return Err(FtpError::tree_enumeration(format!(
                "directory nesting beneath {} exceeds the depth ceiling",
                tree.path
            )));
        }

        let subdirs: Vec<String> = tree.directories.iter().map(|e| e.full_path()).collect();
        out.push(tree);

        for sub in subdirs {
            let subtree = self.list_tree(&sub).await.map_err(|e| {
                FtpError::tree_enumeration(format!("listing {} failed: {}", sub, e))
            })?;
            Box::pin(self.collect_trees(subtree, depth + 1, out)).await?;
        }
        Ok(())
    }

    /// Every file entry under `root`, in pre-order tree order.
    pub async fn list_all_files(&self, root: &str) -> FtpResult<Vec<FtpEntry>> {
        let trees = self.list_all_trees(root).await?;
        Ok(trees.into_iter().flat_map(|t| t.files).collect())
    }

    // ─── Existence / creation ────────────────────────────────────

    /// A directory exists when its name listing is non-empty.
    /// Refusals read as absent rather than failing the caller.
    pub async fn directory_exists(&self, path: &str) -> FtpResult<bool> {
        match self.list_names(path).await {
            Ok(names) => Ok(!names.is_empty()),
            Err(e) if e.is_refusal() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create `path`, creating missing ancestors transitively.
    pub async fn create_directory(&self, path: &str) -> FtpResult<()> {
        if self
            .transport
            .text_command(path, RequestMethod::MakeDirectory)
            .await
            .is_ok()
        {
            return Ok(());
        }

        // The direct attempt failed; walk the ancestor chain and fill
        // in whatever is missing.
        for ancestor in ancestor_chain(path) {
            if !self.directory_exists(&ancestor).await? {
                self.transport
                    .text_command(&ancestor, RequestMethod::MakeDirectory)
                    .await
                    .map_err(|e| {
                        FtpError::directory_creation(format!(
                            "creating {} failed: {}",
                            ancestor, e
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Existence check plus create, run before transferring into a
    /// destination directory.
    pub async fn ensure_directory(&self, path: &str) -> FtpResult<()> {
        if self.directory_exists(path).await? {
            return Ok(());
        }
        debug!("creating destination directory {}", path);
        self.create_directory(path).await
    }

    // ─── Recursive delete ────────────────────────────────────────

    /// Remove a directory and everything below it.
    ///
    /// The full tree is resolved up front, so a listing failure
    /// discovered halfway can never leave a half-deleted hierarchy
    /// behind.
    pub async fn remove_directory_all(&self, path: &str) -> FtpResult<()> {
        // An already-empty directory removes directly.
        if self
            .transport
            .text_command(path, RequestMethod::RemoveDirectory)
            .await
            .is_ok()
        {
            return Ok(());
        }

        let trees = self.list_all_trees(path).await?;
        for tree in trees.iter().rev() {
            for file in &tree.files {
                self.delete_file(&file.full_path()).await?;
            }
            self.transport
                .text_command(&tree.path, RequestMethod::RemoveDirectory)
                .await?;
        }
        Ok(())
    }
}

/// Successive prefixes of a slash-separated path, shortest first,
/// ending with the full path itself.
fn ancestor_chain(path: &str) -> Vec<String> {
    let absolute = path.starts_with('/');
    let mut chain = Vec::new();
    let mut current = String::new();
    for comp in path.split('/').filter(|c| !c.is_empty()) {
        if current.is_empty() {
            current = if absolute {
                format!("/{}", comp)
            } else {
                comp.to_string()
            };
        } else {
            current = format!("{}/{}", current, comp);
        }
        chain.push(current.clone());
    }
    chain
}
