//! Directory resolution
//!
//! Guarantees that directory levels exist before a node is placed under them.
//! The project root is a special always-present node (`parent_id = None`,
//! hidden); intermediate levels are materialized on demand, physical folder
//! first, catalog row second. Resolution is idempotent: an existing level is
//! returned, never duplicated.

use crate::catalog::{Catalog, Node};
use crate::error::EngineError;
use crate::pathkey;
use crate::storage::Storage;
use crate::types::{IdGenerator, NodeId, ProjectScope};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub struct DirectoryResolver {
    catalog: Arc<dyn Catalog>,
    storage: Arc<dyn Storage>,
    ids: Arc<dyn IdGenerator>,
}

impl DirectoryResolver {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        storage: Arc<dyn Storage>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            catalog,
            storage,
            ids,
        }
    }

    /// Id of the project root directory, creating it on first use.
    ///
    /// Creation is physical-first: the folder must exist in storage before
    /// the catalog row is written, so a storage failure here is fatal.
    pub fn ensure_root(&self, scope: &ProjectScope) -> Result<NodeId, EngineError> {
        let roots = self.catalog.siblings(scope.id, None)?;
        if let Some(root) = roots.first() {
            return Ok(root.id);
        }

        let root_key = pathkey::normalize_dir_key(&scope.work_root);
        self.storage.create_folder(&scope.work_root, &root_key)?;

        let now = Utc::now();
        let root = Node {
            id: self.ids.next_id(),
            project_id: scope.id,
            parent_id: None,
            is_directory: true,
            sort: 0,
            file_key: root_key,
            name: "/".to_string(),
            is_hidden: true,
            size: 0,
            created_at: now,
            updated_at: now,
        };
        let root_id = root.id;

        let mut tx = self.catalog.begin()?;
        tx.insert(root)?;
        tx.commit()?;

        info!(project_id = %scope.id, root_id = %root_id, "Created project root directory");
        Ok(root_id)
    }

    /// Id of the deepest directory in `relative_dir_path`, creating every
    /// missing level. An empty path resolves to the root itself.
    pub fn ensure_path(
        &self,
        scope: &ProjectScope,
        relative_dir_path: &str,
    ) -> Result<NodeId, EngineError> {
        let mut current = self.ensure_root(scope)?;
        let mut current_path = String::new();

        for segment in pathkey::segments(relative_dir_path) {
            if segment == "." || segment == ".." {
                return Err(EngineError::Validation(format!(
                    "traversal segment in directory path: {}",
                    relative_dir_path
                )));
            }
            if current_path.is_empty() {
                current_path.push_str(segment);
            } else {
                current_path.push('/');
                current_path.push_str(segment);
            }

            let children = self.catalog.siblings(scope.id, Some(current))?;
            match children.iter().find(|c| c.name == segment) {
                Some(child) if child.is_directory => {
                    current = child.id;
                }
                Some(_) => {
                    return Err(EngineError::Validation(format!(
                        "path segment {} exists but is not a directory",
                        current_path
                    )));
                }
                None => {
                    current = self.create_directory(scope, current, segment, &current_path)?;
                }
            }
        }

        Ok(current)
    }

    /// Parent directory id for a full leaf key, materializing missing levels.
    pub fn parent_for_key(
        &self,
        scope: &ProjectScope,
        full_file_key: &str,
    ) -> Result<NodeId, EngineError> {
        if !pathkey::is_within(&scope.work_root, full_file_key) {
            return Err(EngineError::Validation(format!(
                "file key outside project work root: {}",
                full_file_key
            )));
        }
        let relative = pathkey::relative_to(&scope.work_root, full_file_key)
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "file key outside project work root: {}",
                    full_file_key
                ))
            })?;

        let dir = pathkey::dir_of(relative);
        if dir.is_empty() {
            self.ensure_root(scope)
        } else {
            self.ensure_path(scope, dir)
        }
    }

    fn create_directory(
        &self,
        scope: &ProjectScope,
        parent: NodeId,
        name: &str,
        relative_path: &str,
    ) -> Result<NodeId, EngineError> {
        let dir_key = pathkey::normalize_dir_key(&pathkey::join(&scope.work_root, relative_path));
        self.storage.create_folder(&scope.work_root, &dir_key)?;

        let now = Utc::now();
        let dir = Node {
            id: self.ids.next_id(),
            project_id: scope.id,
            parent_id: Some(parent),
            is_directory: true,
            sort: 0,
            file_key: dir_key,
            name: name.to_string(),
            is_hidden: false,
            size: 0,
            created_at: now,
            updated_at: now,
        };
        let dir_id = dir.id;

        let mut tx = self.catalog.begin()?;
        tx.insert(dir)?;
        tx.commit()?;

        info!(
            project_id = %scope.id,
            dir_id = %dir_id,
            path = %relative_path,
            "Materialized missing directory level"
        );
        Ok(dir_id)
    }
}
