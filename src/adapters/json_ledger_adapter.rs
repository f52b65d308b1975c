//! JSON file ledger adapter.
//!
//! The whole ledger is rewritten on every save: it is serialized to a
//! sibling temp file which then replaces the ledger file.

use crate::domain::error::DipledgerError;
use crate::domain::ledger::Ledger;
use crate::ports::ledger_port::LedgerPort;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct JsonLedgerAdapter {
    path: PathBuf,
}

impl JsonLedgerAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerPort for JsonLedgerAdapter {
    fn load(&self) -> Result<Ledger, DipledgerError> {
        if !self.path.exists() {
            info!("No ledger at {}, starting empty", self.path.display());
            let ledger = Ledger::default();
            self.save(&ledger)?;
            return Ok(ledger);
        }

        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| DipledgerError::LedgerCorrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn save(&self, ledger: &Ledger) -> Result<(), DipledgerError> {
        ledger.validate()?;
        let json = serde_json::to_string_pretty(ledger).map_err(|e| {
            DipledgerError::LedgerInvariant {
                reason: format!("cannot serialize ledger: {}", e),
            }
        })?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
