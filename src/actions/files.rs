//! Sandboxed file operations.
//!
//! Every operation passes the gateway first, then records `ok` or `error`
//! under its own action name. Moves and renames gate both the source and
//! the destination.

use serde_json::json;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::ActionDispatcher;
use crate::security::AuditStatus;

const NO_PATH: &str = "Please specify a path.";
const OP_CANCELLED: &str = "Operation cancelled.";

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

impl ActionDispatcher {
    fn allow_file_op(&mut self, operation: &str, target: &str) -> bool {
        self.gateway
            .verify_file_operation(self.operator.as_mut(), operation, target)
    }

    fn allow_transfer(&mut self, operation: &str, source: &str, target: &str) -> bool {
        self.gateway
            .verify_file_transfer(self.operator.as_mut(), operation, source, target)
    }

    fn file_op_failed(&self, operation: &str, details: serde_json::Value, e: &io::Error) -> String {
        warn!("{} failed: {}", operation, e);
        self.audit(operation, AuditStatus::Error, super::with_error(details, e));
        let verb = match operation {
            "create_folder" => "create folder",
            "create_file" => "create file",
            "list_dir" => "list",
            other => other,
        };
        format!("Failed to {}: {}", verb, e)
    }

    pub fn create_folder(&mut self, path: &str) -> String {
        if path.is_empty() {
            return NO_PATH.to_string();
        }
        if !self.allow_file_op("create_folder", path) {
            return OP_CANCELLED.to_string();
        }

        let details = json!({ "path": path });
        match fs::create_dir_all(expand(path)) {
            Ok(()) => {
                self.audit("create_folder", AuditStatus::Ok, details);
                format!("Created folder: {}", path)
            }
            Err(e) => self.file_op_failed("create_folder", details, &e),
        }
    }

    pub fn create_file(&mut self, path: &str, content: &str) -> String {
        if path.is_empty() {
            return NO_PATH.to_string();
        }
        if !self.allow_file_op("create_file", path) {
            return OP_CANCELLED.to_string();
        }

        let details = json!({ "path": path });
        let target = expand(path);
        let written = ensure_parent(&target).and_then(|()| fs::write(&target, content));
        match written {
            Ok(()) => {
                self.audit("create_file", AuditStatus::Ok, details);
                format!("Created file: {}", path)
            }
            Err(e) => self.file_op_failed("create_file", details, &e),
        }
    }

    pub fn move_path(&mut self, from: &str, to: &str) -> String {
        if from.is_empty() || to.is_empty() {
            return NO_PATH.to_string();
        }
        if !self.allow_transfer("move", from, to) {
            return OP_CANCELLED.to_string();
        }

        let details = json!({ "from": from, "to": to });
        let dest = expand(to);
        match ensure_parent(&dest).and_then(|()| fs::rename(expand(from), &dest)) {
            Ok(()) => {
                self.audit("move", AuditStatus::Ok, details);
                format!("Moved to: {}", to)
            }
            Err(e) => self.file_op_failed("move", details, &e),
        }
    }

    /// Rename in place: a move to `new_name` inside the same parent.
    pub fn rename(&mut self, path: &str, new_name: &str) -> String {
        if path.is_empty() || new_name.is_empty() {
            return NO_PATH.to_string();
        }
        if Path::new(new_name).components().count() != 1 {
            return "The new name must not contain a path.".to_string();
        }

        let source = expand(path);
        let dest = source
            .parent()
            .map(|parent| parent.join(new_name))
            .unwrap_or_else(|| PathBuf::from(new_name));
        if !self.allow_transfer("rename", path, &dest.display().to_string()) {
            return OP_CANCELLED.to_string();
        }

        let details = json!({ "from": path, "to": dest.display().to_string() });
        match fs::rename(&source, &dest) {
            Ok(()) => {
                self.audit("rename", AuditStatus::Ok, details);
                format!("Renamed to: {}", dest.display())
            }
            Err(e) => self.file_op_failed("rename", details, &e),
        }
    }

    /// Entry names, one per line, sorted.
    pub fn list_dir(&mut self, path: &str) -> String {
        if path.is_empty() {
            return NO_PATH.to_string();
        }
        if !self.allow_file_op("list_dir", path) {
            return OP_CANCELLED.to_string();
        }

        let listed = fs::read_dir(expand(path)).and_then(|entries| {
            entries
                .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
                .collect::<io::Result<Vec<_>>>()
        });
        match listed {
            Ok(mut names) => {
                names.sort();
                self.audit(
                    "list_dir",
                    AuditStatus::Ok,
                    json!({ "path": path, "count": names.len() }),
                );
                if names.is_empty() {
                    "(empty)".to_string()
                } else {
                    names.join("\n")
                }
            }
            Err(e) => self.file_op_failed("list_dir", json!({ "path": path }), &e),
        }
    }

    /// Delete a file or a whole directory tree.
    pub fn delete(&mut self, path: &str) -> String {
        if path.is_empty() {
            return NO_PATH.to_string();
        }
        if !self.allow_file_op("delete", path) {
            return OP_CANCELLED.to_string();
        }

        let target = expand(path);
        let details = json!({ "path": path });
        let removed = match fs::symlink_metadata(&target) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&target),
            Ok(_) => fs::remove_file(&target),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return "Nothing to delete.".to_string();
            }
            Err(e) => Err(e),
        };
        match removed {
            Ok(()) => {
                self.audit("delete", AuditStatus::Ok, details);
                format!("Deleted: {}", path)
            }
            Err(e) => self.file_op_failed("delete", details, &e),
        }
    }
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
