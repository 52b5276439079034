//! Append-only audit record of accepted vote codes.
//!
//! One code per line under a `votecode` header, written only after the
//! ledger has acknowledged the submission. The file is bootstrapped on
//! startup if absent.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, error, info};

use common::{VoteAnchorError, VoteCode};

pub struct VoteAuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl VoteAuditLog {
    /// Open the audit file for appending, writing the header if the file
    /// is new.
    pub fn open(path: &Path) -> Result<Self, VoteAnchorError> {
        let fresh = !path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                VoteAnchorError::Configuration(format!(
                    "cannot open audit file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        if fresh {
            writeln!(file, "votecode").map_err(|e| {
                VoteAnchorError::Configuration(format!(
                    "cannot initialize audit file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            info!("Created audit file {}", path.display());
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Record an accepted vote code.
    ///
    /// The vote is already on the ledger at this point, so a write failure
    /// is logged rather than propagated back to the voter.
    pub fn append(&self, code: &VoteCode, tx_hash: &str) {
        let Ok(mut file) = self.file.lock() else {
            error!("Audit file lock poisoned, dropping entry for {}", tx_hash);
            return;
        };
        match writeln!(file, "{}", code) {
            Ok(()) => debug!("Audited vote for transaction {}", tx_hash),
            Err(e) => error!(
                "Failed to append to audit file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
