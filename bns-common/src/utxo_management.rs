//! Local view of spendable outputs between broadcasts
//!
//! Chain indexers lag behind the mempool, so a client that broadcasts a
//! preorder and immediately builds the register would see the preorder's
//! inputs as unspent and its change as missing. `UtxoSetView` overlays the
//! chain view with what this client has broadcast itself: outputs it created
//! are included per address and inputs it consumed are excluded globally.

use crate::error::BnsResult;
use crate::types::Utxo;
use bitcoin::consensus::deserialize;
use bitcoin::{Address, Network, OutPoint, Transaction};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Per-address include overlay plus a global exclude set
#[derive(Debug, Clone)]
pub struct UtxoSetView {
    network: Network,
    include: HashMap<String, Vec<Utxo>>,
    exclude: HashSet<OutPoint>,
}

impl UtxoSetView {
    /// Creates an empty view for the given network
    pub fn new(network: Network) -> Self {
        UtxoSetView {
            network,
            include: HashMap::new(),
            exclude: HashSet::new(),
        }
    }

    /// Network whose addresses the overlay is keyed by
    pub fn network(&self) -> Network {
        self.network
    }

    /// Merge the chain's UTXOs for `address` with the overlay
    ///
    /// Outputs this client created are added, outputs this client spent are
    /// removed. A UTXO present in both the chain view and the overlay is
    /// returned once.
    pub fn utxos(&self, address: &str, chain_view: Vec<Utxo>) -> Vec<Utxo> {
        let mut seen: HashSet<OutPoint> = HashSet::new();
        let overlay = self.include.get(address).into_iter().flatten().cloned();

        chain_view
            .into_iter()
            .chain(overlay)
            .filter(|utxo| !self.exclude.contains(&utxo.outpoint))
            .filter(|utxo| seen.insert(utxo.outpoint))
            .collect()
    }

    /// Record a broadcast transaction
    ///
    /// Every input it spends is excluded; every output that pays an address
    /// is included for that address with zero confirmations. Null-data
    /// outputs and scripts with no address form are skipped.
    pub fn advance(&mut self, signed_tx_hex: &str) -> BnsResult<()> {
        let raw = hex::decode(signed_tx_hex)?;
        let tx: Transaction = deserialize(&raw)?;
        let txid = tx.txid();

        for txin in &tx.input {
            self.exclude.insert(txin.previous_output);
        }

        for (vout, txout) in tx.output.iter().enumerate() {
            if txout.script_pubkey.is_op_return() {
                continue;
            }

            let address = match Address::from_script(&txout.script_pubkey, self.network) {
                Ok(address) => address.to_string(),
                Err(e) => {
                    warn!("Skipping output {}:{} without an address form: {}", txid, vout, e);
                    continue;
                }
            };

            let utxo = Utxo::new(OutPoint::new(txid, vout as u32), txout.value, Some(0));
            self.include.entry(address).or_default().push(utxo);
        }

        debug!(
            "Advanced UTXO view with {} ({} inputs excluded, {} outputs)",
            txid,
            tx.input.len(),
            tx.output.len()
        );

        Ok(())
    }

    /// Forget the overlay for `address` and every recorded exclusion
    pub fn reset(&mut self, address: &str) {
        self.include.remove(address);
        self.exclude.clear();
    }

    /// Whether `outpoint` was spent by a transaction this view advanced past
    pub fn is_excluded(&self, outpoint: &OutPoint) -> bool {
        self.exclude.contains(outpoint)
    }

    /// Overlay entries for `address`
    pub fn included(&self, address: &str) -> &[Utxo] {
        self.include.get(address).map(Vec::as_slice).unwrap_or(&[])
    }
}
