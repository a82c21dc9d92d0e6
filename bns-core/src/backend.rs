//! External collaborators of the transaction engine
//!
//! The engine never talks to the network itself. Prices, consensus hashes,
//! UTXOs, fee rates and broadcasting are provided by a `NamingBackend`,
//! usually a client of a naming node and a chain indexer. Backend errors
//! are propagated as they are; the engine does not retry.

use crate::operations::TransactionBuilder;
use async_trait::async_trait;
use bns_common::config::TxConfig;
use bns_common::error::BnsResult;
use bns_common::logging::{log_network, log_params, sanitize_for_logging, LogLevel};
use bns_common::types::{PriceQuote, Utxo};
use bns_common::utxo_management::UtxoSetView;

/// Data sources and broadcast endpoint for naming transactions
#[async_trait]
pub trait NamingBackend: Send + Sync {
    /// Current consensus hash, hex-encoded
    async fn get_consensus_hash(&self) -> BnsResult<String>;

    /// Price of registering or renewing a name
    async fn get_name_price(&self, name: &str) -> BnsResult<PriceQuote>;

    /// Price of preordering a namespace
    async fn get_namespace_price(&self, namespace_id: &str) -> BnsResult<PriceQuote>;

    /// Address that receives name prices paid in the native asset
    async fn get_namespace_burn_address(&self, namespace_id: &str) -> BnsResult<String>;

    /// Unspent outputs of an address as the chain indexer sees them
    async fn get_utxos(&self, address: &str) -> BnsResult<Vec<Utxo>>;

    /// Fee rate in satoshis per byte; 0 when the backend has no estimate
    async fn get_fee_rate(&self) -> BnsResult<u64>;

    /// Broadcast a signed transaction, returning its txid
    async fn broadcast_transaction(&self, tx_hex: &str) -> BnsResult<String>;
}

/// A backend paired with the local UTXO view and configuration
///
/// Builds borrow the view immutably; only a confirmed broadcast or an
/// explicit reset mutates it.
pub struct NamingNetwork<B: NamingBackend> {
    backend: B,
    utxo_view: UtxoSetView,
    config: TxConfig,
}

impl<B: NamingBackend> NamingNetwork<B> {
    pub fn new(backend: B, config: TxConfig) -> BnsResult<Self> {
        config.validate()?;
        let utxo_view = UtxoSetView::new(config.bitcoin_network()?);

        Ok(NamingNetwork {
            backend,
            utxo_view,
            config,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &TxConfig {
        &self.config
    }

    pub fn utxo_view(&self) -> &UtxoSetView {
        &self.utxo_view
    }

    /// Transaction builder over this network's backend and UTXO view
    pub fn builder(&self) -> BnsResult<TransactionBuilder<'_, B>> {
        TransactionBuilder::new(&self.backend, &self.utxo_view, &self.config)
    }

    /// UTXOs of `address`, merged with outputs this client created and
    /// without outputs it already spent
    pub async fn get_utxos(&self, address: &str) -> BnsResult<Vec<Utxo>> {
        let chain_view = self.backend.get_utxos(address).await?;
        Ok(self.utxo_view.utxos(address, chain_view))
    }

    /// Broadcast `tx_hex` and record it in the UTXO view once accepted
    pub async fn broadcast_and_advance(&mut self, tx_hex: &str) -> BnsResult<String> {
        let txid = self.backend.broadcast_transaction(tx_hex).await?;
        self.utxo_view.advance(tx_hex)?;

        log_network(
            LogLevel::Info,
            "Broadcast transaction",
            Some(log_params(vec![("txid", txid.clone())])),
        );
        Ok(txid)
    }

    /// Forget locally tracked outputs of `address` and all recorded spends
    pub fn reset_utxos(&mut self, address: &str) {
        log::debug!("Resetting UTXO view for {}", sanitize_for_logging(address));
        self.utxo_view.reset(address);
    }
}
