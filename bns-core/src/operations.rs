//! Operation facade: from a naming operation to a signed transaction
//!
//! Every builder runs the same pipeline:
//!
//! 1. Quote: fetch the consensus hash, prices, UTXOs and fee rate
//!    concurrently from the backend
//! 2. Skeleton: encode the payload and the operation's outputs
//! 3. Fund: add the owner input when the operation needs one, then payer
//!    inputs and a change output
//! 4. Sign: the owner signs input 0, the payer signs the rest
//! 5. Serialize: hex-encode the transaction for broadcast
//!
//! Any failure aborts the build; nothing is retried. Estimators run the
//! skeleton step against placeholder hashes and return the fee of the
//! fully-funded transaction plus the value of its outputs.

use crate::backend::NamingBackend;
use crate::namespace::NamespaceDescriptor;
use crate::payload::hash160;
use crate::signer::{SignerInput, TransactionSigner};
use crate::signing::{serialize_transaction, sign_inputs};
use crate::skeleton::SkeletonEncoder;
use bitcoin::absolute::LockTime;
use bitcoin::{Address, Network, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use bns_common::config::TxConfig;
use bns_common::error::{BnsError, BnsResult};
use bns_common::logging::{log_funding, log_params, log_transaction, LogLevel};
use bns_common::math::{calculate_fee, estimate_tx_bytes, min_economical_change, sum_output_values};
use bns_common::types::{Utxo, VALUE_HASH_LENGTH};
use bns_common::utxo_management::UtxoSetView;
use bns_common::utxo_selection::{fund_inputs, fund_transaction, Funded, FundingOutcome};
use bns_common::validation::{
    decode_fixed_hex, namespace_of, parse_address, validate_name, validate_namespace_id,
};
use log::{debug, warn};
use num_bigint::BigUint;

/// Consensus hash used by estimators
pub const DUMMY_CONSENSUS_HASH: &str = "00000000000000000000000000000000";

/// Zone file hash used by estimators
pub const DUMMY_ZONEFILE_HASH: &str = "ffffffffffffffffffffffffffffffffffffffff";

/// Preorder skeletons pay their change to the preorder output
const PREORDER_CHANGE_INDEX: usize = 1;

/// Renewal output paying the last owner
const LAST_OWNER_OUTPUT: usize = 2;

/// The owner input added to owner-controlled operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OwnerInput {
    index: usize,
    value: u64,
}

/// Zone file hash from either a zone file or an explicit value hash
fn resolve_value_hash(zonefile: Option<&str>, value_hash: Option<&str>) -> BnsResult<Option<String>> {
    match (zonefile, value_hash) {
        (Some(_), Some(_)) => Err(BnsError::validation(
            "Can specify either a zone file or a value hash, not both",
        )),
        (Some(zonefile), None) => Ok(Some(hex::encode(hash160(zonefile.as_bytes())))),
        (None, Some(hash)) => {
            decode_fixed_hex::<VALUE_HASH_LENGTH>("value hash", hash)?;
            Ok(Some(hash.to_string()))
        }
        (None, None) => Ok(None),
    }
}

/// Builds, funds and signs naming transactions
pub struct TransactionBuilder<'a, B: NamingBackend + ?Sized> {
    backend: &'a B,
    utxo_view: &'a UtxoSetView,
    config: &'a TxConfig,
    encoder: SkeletonEncoder,
    build_incomplete: bool,
}

impl<'a, B: NamingBackend + ?Sized> TransactionBuilder<'a, B> {
    pub fn new(backend: &'a B, utxo_view: &'a UtxoSetView, config: &'a TxConfig) -> BnsResult<Self> {
        config.validate()?;

        Ok(TransactionBuilder {
            backend,
            utxo_view,
            config,
            encoder: SkeletonEncoder::from_config(config)?,
            build_incomplete: false,
        })
    }

    /// Return transactions even when some inputs are left unsigned
    pub fn build_incomplete(mut self, build_incomplete: bool) -> Self {
        self.build_incomplete = build_incomplete;
        self
    }

    pub fn network(&self) -> Network {
        self.encoder.network()
    }

    pub fn encoder(&self) -> &SkeletonEncoder {
        &self.encoder
    }

    /// UTXOs of `address` from the backend, seen through the local view
    pub async fn get_utxos(&self, address: &str) -> BnsResult<Vec<Utxo>> {
        let chain_view = self.backend.get_utxos(address).await?;
        Ok(self.utxo_view.utxos(address, chain_view))
    }

    async fn fee_rate(&self) -> BnsResult<u64> {
        let rate = self.backend.get_fee_rate().await?;
        if rate == 0 {
            warn!(
                "Backend has no fee estimate, using default rate of {} sat/byte",
                self.config.transactions.default_fee_rate
            );
            return Ok(self.config.transactions.default_fee_rate);
        }
        Ok(rate)
    }

    fn address(&self, address: &str) -> BnsResult<Address> {
        parse_address(address, self.network())
    }

    fn script_for(&self, address: &str) -> BnsResult<ScriptBuf> {
        Ok(self.address(address)?.script_pubkey())
    }

    fn default_burn_address(&self) -> BnsResult<String> {
        Ok(self.config.burn_address()?.to_string())
    }

    fn dust_minimum(&self) -> u64 {
        self.config.dust_minimum()
    }

    /// Spend the owner's smallest UTXO as the next input
    ///
    /// With `add_change_out` the owner is paid the UTXO's value back in a
    /// new output.
    fn add_owner_input(
        &self,
        tx: &mut Transaction,
        owner_utxos: &[Utxo],
        owner_address: &str,
        add_change_out: bool,
    ) -> BnsResult<OwnerInput> {
        let owner_utxo = owner_utxos
            .iter()
            .min_by_key(|utxo| utxo.value)
            .ok_or(BnsError::InsufficientFunds { shortfall: 0 })?;

        tx.input.push(TxIn {
            previous_output: owner_utxo.outpoint,
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        });

        if add_change_out {
            tx.output.push(TxOut {
                value: owner_utxo.value,
                script_pubkey: self.script_for(owner_address)?,
            });
        }

        Ok(OwnerInput {
            index: tx.input.len() - 1,
            value: owner_utxo.value,
        })
    }

    /// Payer UTXOs that are not already spent by an owner input
    fn payer_utxos(tx: &Transaction, utxos: Vec<Utxo>) -> Vec<Utxo> {
        utxos
            .into_iter()
            .filter(|utxo| !tx.input.iter().any(|txin| txin.previous_output == utxo.outpoint))
            .collect()
    }

    fn fund_from(
        &self,
        tx: Transaction,
        payer_address: &str,
        utxos: &[Utxo],
        fee_rate: u64,
        in_amounts: u64,
        change_index: Option<usize>,
    ) -> BnsResult<Transaction> {
        let payer_script = self.script_for(payer_address)?;
        let funded = fund_transaction(
            tx,
            &payer_script,
            utxos,
            fee_rate,
            in_amounts,
            change_index,
            self.dust_minimum(),
        )?;

        log_funding(
            LogLevel::Debug,
            "Funded transaction",
            Some(log_params(vec![
                ("payer", payer_address.to_string()),
                ("inputs", funded.input.len().to_string()),
                ("fee_rate", fee_rate.to_string()),
            ])),
        );
        Ok(funded)
    }

    async fn sign_and_serialize(
        &self,
        operation: &str,
        tx: Transaction,
        default_signer: &dyn TransactionSigner,
        overrides: &[(usize, &dyn TransactionSigner)],
    ) -> BnsResult<String> {
        let signed = sign_inputs(tx, default_signer, overrides).await?;
        let tx_hex = serialize_transaction(&signed, self.build_incomplete)?;

        log_transaction(
            LogLevel::Info,
            &format!("Built {} transaction", operation),
            Some(log_params(vec![
                ("txid", signed.txid().to_string()),
                ("inputs", signed.input.len().to_string()),
                ("outputs", signed.output.len().to_string()),
            ])),
        );
        Ok(tx_hex)
    }

    fn estimate_total(tx: &Transaction, additional_inputs: usize, additional_outputs: usize, fee_rate: u64) -> u64 {
        let bytes = estimate_tx_bytes(tx, additional_inputs, additional_outputs);
        calculate_fee(bytes, fee_rate) + sum_output_values(tx)
    }

    /// Preorder `name` for `destination_address`, paid by `payment`
    pub async fn make_preorder(
        &self,
        name: &str,
        destination_address: &str,
        payment: SignerInput<'_>,
    ) -> BnsResult<String> {
        validate_name(name)?;
        let namespace = namespace_of(name)?;
        self.address(destination_address)?;

        let payer = payment.into_signer(self.network())?;
        let payer_address = payer.address().await?;

        let (consensus_hash, price, burn_address, utxos, fee_rate) = futures::try_join!(
            self.backend.get_consensus_hash(),
            self.backend.get_name_price(name),
            self.backend.get_namespace_burn_address(namespace),
            self.get_utxos(&payer_address),
            self.fee_rate(),
        )?;

        let tx = self.encoder.preorder(
            name,
            &consensus_hash,
            &payer_address,
            &burn_address,
            &price,
            destination_address,
        )?;
        let tx = self.fund_from(tx, &payer_address, &utxos, fee_rate, 0, Some(PREORDER_CHANGE_INDEX))?;

        self.sign_and_serialize("preorder", tx, &payer, &[]).await
    }

    /// Register a preordered `name` to `owner_address`
    pub async fn make_register(
        &self,
        name: &str,
        owner_address: &str,
        payment: SignerInput<'_>,
        zonefile: Option<&str>,
        value_hash: Option<&str>,
    ) -> BnsResult<String> {
        validate_name(name)?;
        self.address(owner_address)?;
        let value_hash = resolve_value_hash(zonefile, value_hash)?;

        let payer = payment.into_signer(self.network())?;
        let payer_address = payer.address().await?;

        let (utxos, fee_rate) =
            futures::try_join!(self.get_utxos(&payer_address), self.fee_rate())?;

        let tx = self
            .encoder
            .register(name, owner_address, value_hash.as_deref(), None)?;
        let tx = self.fund_from(tx, &payer_address, &utxos, fee_rate, 0, None)?;

        self.sign_and_serialize("register", tx, &payer, &[]).await
    }

    /// Point `name` at a new zone file or value hash
    pub async fn make_update(
        &self,
        name: &str,
        owner: SignerInput<'_>,
        payment: SignerInput<'_>,
        zonefile: Option<&str>,
        value_hash: Option<&str>,
    ) -> BnsResult<String> {
        validate_name(name)?;
        let value_hash = resolve_value_hash(zonefile, value_hash)?.ok_or_else(|| {
            BnsError::missing("zonefile", "Need a zone file or a value hash")
        })?;

        let owner = owner.into_signer(self.network())?;
        let payer = payment.into_signer(self.network())?;
        let owner_address = owner.address().await?;
        let payer_address = payer.address().await?;

        let (consensus_hash, owner_utxos, payer_utxos, fee_rate) = futures::try_join!(
            self.backend.get_consensus_hash(),
            self.get_utxos(&owner_address),
            self.get_utxos(&payer_address),
            self.fee_rate(),
        )?;

        let mut tx = self.encoder.update(name, &consensus_hash, &value_hash)?;
        let owner_input = self.add_owner_input(&mut tx, &owner_utxos, &owner_address, true)?;
        let payer_utxos = Self::payer_utxos(&tx, payer_utxos);
        let tx = self.fund_from(tx, &payer_address, &payer_utxos, fee_rate, owner_input.value, None)?;

        let owner: &dyn TransactionSigner = &owner;
        self.sign_and_serialize("update", tx, &payer, &[(owner_input.index, owner)])
            .await
    }

    /// Transfer `name` to `destination_address`
    pub async fn make_transfer(
        &self,
        name: &str,
        destination_address: &str,
        owner: SignerInput<'_>,
        payment: SignerInput<'_>,
        keep_zonefile: bool,
    ) -> BnsResult<String> {
        validate_name(name)?;
        self.address(destination_address)?;

        let owner = owner.into_signer(self.network())?;
        let payer = payment.into_signer(self.network())?;
        let owner_address = owner.address().await?;
        let payer_address = payer.address().await?;

        let (consensus_hash, owner_utxos, payer_utxos, fee_rate) = futures::try_join!(
            self.backend.get_consensus_hash(),
            self.get_utxos(&owner_address),
            self.get_utxos(&payer_address),
            self.fee_rate(),
        )?;

        let mut tx =
            self.encoder
                .transfer(name, &consensus_hash, destination_address, keep_zonefile)?;
        let owner_input = self.add_owner_input(&mut tx, &owner_utxos, &owner_address, true)?;
        let payer_utxos = Self::payer_utxos(&tx, payer_utxos);
        let tx = self.fund_from(tx, &payer_address, &payer_utxos, fee_rate, owner_input.value, None)?;

        let owner: &dyn TransactionSigner = &owner;
        self.sign_and_serialize("transfer", tx, &payer, &[(owner_input.index, owner)])
            .await
    }

    /// Renew `name`, sending it to `destination_address`
    ///
    /// The owner's UTXO is consumed without a change output of its own; its
    /// value is carried by the last-owner output instead.
    pub async fn make_renewal(
        &self,
        name: &str,
        destination_address: &str,
        owner: SignerInput<'_>,
        payment: SignerInput<'_>,
        zonefile: Option<&str>,
        value_hash: Option<&str>,
    ) -> BnsResult<String> {
        validate_name(name)?;
        let namespace = namespace_of(name)?;
        self.address(destination_address)?;
        let value_hash = resolve_value_hash(zonefile, value_hash)?;

        let owner = owner.into_signer(self.network())?;
        let payer = payment.into_signer(self.network())?;
        let owner_address = owner.address().await?;
        let payer_address = payer.address().await?;

        let (price, burn_address, owner_utxos, payer_utxos, fee_rate) = futures::try_join!(
            self.backend.get_name_price(name),
            self.backend.get_namespace_burn_address(namespace),
            self.get_utxos(&owner_address),
            self.get_utxos(&payer_address),
            self.fee_rate(),
        )?;

        let mut tx = self.encoder.renewal(
            name,
            destination_address,
            &owner_address,
            &burn_address,
            &price,
            value_hash.as_deref(),
        )?;
        let owner_input = self.add_owner_input(&mut tx, &owner_utxos, &owner_address, false)?;

        let owner_script = self.script_for(&owner_address)?;
        match tx.output.get_mut(LAST_OWNER_OUTPUT) {
            Some(output) if output.script_pubkey == owner_script => output.value = owner_input.value,
            _ => {
                return Err(BnsError::validation(
                    "renewal output 2 does not pay the owner's address",
                ))
            }
        }

        let payer_utxos = Self::payer_utxos(&tx, payer_utxos);
        let tx = self.fund_from(tx, &payer_address, &payer_utxos, fee_rate, owner_input.value, None)?;

        let owner: &dyn TransactionSigner = &owner;
        self.sign_and_serialize("renewal", tx, &payer, &[(owner_input.index, owner)])
            .await
    }

    /// Revoke `name`
    pub async fn make_revoke(
        &self,
        name: &str,
        owner: SignerInput<'_>,
        payment: SignerInput<'_>,
    ) -> BnsResult<String> {
        validate_name(name)?;

        let owner = owner.into_signer(self.network())?;
        let payer = payment.into_signer(self.network())?;
        let owner_address = owner.address().await?;
        let payer_address = payer.address().await?;

        let (owner_utxos, payer_utxos, fee_rate) = futures::try_join!(
            self.get_utxos(&owner_address),
            self.get_utxos(&payer_address),
            self.fee_rate(),
        )?;

        let mut tx = self.encoder.revoke(name)?;
        let owner_input = self.add_owner_input(&mut tx, &owner_utxos, &owner_address, true)?;
        let payer_utxos = Self::payer_utxos(&tx, payer_utxos);
        let tx = self.fund_from(tx, &payer_address, &payer_utxos, fee_rate, owner_input.value, None)?;

        let owner: &dyn TransactionSigner = &owner;
        self.sign_and_serialize("revoke", tx, &payer, &[(owner_input.index, owner)])
            .await
    }

    /// Preorder `namespace_id`, to be revealed by `reveal_address`
    pub async fn make_namespace_preorder(
        &self,
        namespace_id: &str,
        reveal_address: &str,
        payment: SignerInput<'_>,
    ) -> BnsResult<String> {
        validate_namespace_id(namespace_id)?;
        self.address(reveal_address)?;
        let burn_address = self.default_burn_address()?;

        let payer = payment.into_signer(self.network())?;
        let payer_address = payer.address().await?;

        let (consensus_hash, price, utxos, fee_rate) = futures::try_join!(
            self.backend.get_consensus_hash(),
            self.backend.get_namespace_price(namespace_id),
            self.get_utxos(&payer_address),
            self.fee_rate(),
        )?;

        let tx = self.encoder.namespace_preorder(
            namespace_id,
            &consensus_hash,
            &payer_address,
            reveal_address,
            &burn_address,
            &price,
        )?;
        let tx = self.fund_from(tx, &payer_address, &utxos, fee_rate, 0, Some(PREORDER_CHANGE_INDEX))?;

        self.sign_and_serialize("namespace preorder", tx, &payer, &[]).await
    }

    /// Reveal a preordered namespace
    pub async fn make_namespace_reveal(
        &self,
        namespace: &NamespaceDescriptor,
        reveal_address: &str,
        payment: SignerInput<'_>,
    ) -> BnsResult<String> {
        namespace.check()?;
        self.address(reveal_address)?;

        let payer = payment.into_signer(self.network())?;
        let payer_address = payer.address().await?;

        let (utxos, fee_rate) =
            futures::try_join!(self.get_utxos(&payer_address), self.fee_rate())?;

        let tx = self.encoder.namespace_reveal(namespace, reveal_address)?;
        let tx = self.fund_from(tx, &payer_address, &utxos, fee_rate, 0, None)?;

        self.sign_and_serialize("namespace reveal", tx, &payer, &[]).await
    }

    /// Launch a revealed namespace; paid and signed by the reveal key
    pub async fn make_namespace_ready(
        &self,
        namespace_id: &str,
        reveal: SignerInput<'_>,
    ) -> BnsResult<String> {
        validate_namespace_id(namespace_id)?;

        let revealer = reveal.into_signer(self.network())?;
        let reveal_address = revealer.address().await?;

        let (utxos, fee_rate) =
            futures::try_join!(self.get_utxos(&reveal_address), self.fee_rate())?;

        let tx = self.encoder.namespace_ready(namespace_id)?;
        let tx = self.fund_from(tx, &reveal_address, &utxos, fee_rate, 0, None)?;

        self.sign_and_serialize("namespace ready", tx, &revealer, &[]).await
    }

    /// Import `name` into a revealed namespace for `recipient_address`
    pub async fn make_name_import(
        &self,
        name: &str,
        recipient_address: &str,
        zonefile_hash: &str,
        importer: SignerInput<'_>,
    ) -> BnsResult<String> {
        validate_name(name)?;
        self.address(recipient_address)?;
        decode_fixed_hex::<VALUE_HASH_LENGTH>("zone file hash", zonefile_hash)?;

        let importer = importer.into_signer(self.network())?;
        let importer_address = importer.address().await?;

        let (utxos, fee_rate) =
            futures::try_join!(self.get_utxos(&importer_address), self.fee_rate())?;

        let tx = self
            .encoder
            .name_import(name, recipient_address, zonefile_hash)?;
        let tx = self.fund_from(tx, &importer_address, &utxos, fee_rate, 0, None)?;

        self.sign_and_serialize("name import", tx, &importer, &[]).await
    }

    /// Announce a message by its hash
    pub async fn make_announce(
        &self,
        message_hash: &str,
        sender: SignerInput<'_>,
    ) -> BnsResult<String> {
        decode_fixed_hex::<VALUE_HASH_LENGTH>("message hash", message_hash)?;

        let sender = sender.into_signer(self.network())?;
        let sender_address = sender.address().await?;

        let (utxos, fee_rate) =
            futures::try_join!(self.get_utxos(&sender_address), self.fee_rate())?;

        let tx = self.encoder.announce(message_hash)?;
        let tx = self.fund_from(tx, &sender_address, &utxos, fee_rate, 0, None)?;

        self.sign_and_serialize("announce", tx, &sender, &[]).await
    }

    /// Transfer tokens from `sender` to `recipient_address`
    ///
    /// With a `btc_funder`, the sender only contributes its smallest UTXO
    /// (returned in a change output) and the funder pays the fees.
    pub async fn make_token_transfer(
        &self,
        recipient_address: &str,
        token_type: &str,
        token_amount: &BigUint,
        scratch_area: &str,
        sender: SignerInput<'_>,
        btc_funder: Option<SignerInput<'_>>,
    ) -> BnsResult<String> {
        self.address(recipient_address)?;

        let sender = sender.into_signer(self.network())?;
        let sender_address = sender.address().await?;

        let funder = match btc_funder {
            Some(funder) => Some(funder.into_signer(self.network())?),
            None => None,
        };
        let funder_address = match &funder {
            Some(funder) => Some(funder.address().await?),
            None => None,
        };

        let funder_utxos = async {
            match &funder_address {
                Some(address) => self.get_utxos(address).await.map(Some),
                None => Ok(None),
            }
        };

        let (consensus_hash, sender_utxos, funder_utxos, fee_rate) = futures::try_join!(
            self.backend.get_consensus_hash(),
            self.get_utxos(&sender_address),
            funder_utxos,
            self.fee_rate(),
        )?;

        let mut tx = self.encoder.token_transfer(
            recipient_address,
            &consensus_hash,
            token_type,
            token_amount,
            scratch_area,
        )?;

        match (&funder, &funder_address, funder_utxos) {
            (Some(funder), Some(funder_address), Some(funder_utxos)) => {
                let sender_input =
                    self.add_owner_input(&mut tx, &sender_utxos, &sender_address, true)?;
                let funder_utxos = Self::payer_utxos(&tx, funder_utxos);
                let tx = self.fund_from(
                    tx,
                    funder_address,
                    &funder_utxos,
                    fee_rate,
                    sender_input.value,
                    None,
                )?;

                let sender: &dyn TransactionSigner = &sender;
                self.sign_and_serialize("token transfer", tx, funder, &[(sender_input.index, sender)])
                    .await
            }
            _ => {
                let tx = self.fund_from(tx, &sender_address, &sender_utxos, fee_rate, 0, None)?;
                self.sign_and_serialize("token transfer", tx, &sender, &[]).await
            }
        }
    }

    /// Send `amount` satoshis to `destination_address`, fees included
    ///
    /// The fee is taken out of the amount sent. When the payer cannot fund
    /// the full amount, everything it has is sent instead.
    pub async fn make_bitcoin_spend(
        &self,
        destination_address: &str,
        payment: SignerInput<'_>,
        amount: u64,
    ) -> BnsResult<String> {
        if amount == 0 {
            return Err(BnsError::validation("amount must be greater than zero"));
        }
        let destination = self.address(destination_address)?;

        let payer = payment.into_signer(self.network())?;
        let payer_address = payer.address().await?;

        let (utxos, fee_rate) =
            futures::try_join!(self.get_utxos(&payer_address), self.fee_rate())?;

        let tx = Transaction {
            version: 1,
            lock_time: LockTime::ZERO,
            input: vec![],
            output: vec![TxOut {
                value: 0,
                script_pubkey: destination.script_pubkey(),
            }],
        };

        let (mut tx, change, amount) = match fund_inputs(tx, &utxos, amount as i64, fee_rate, false) {
            FundingOutcome::Funded(Funded { tx, change }) => (tx, change, amount),
            FundingOutcome::Exhausted { tx, shortfall } => {
                debug!("Spend short by {} sats, sending the remainder", shortfall);
                (tx, 0, amount.saturating_sub(shortfall))
            }
        };

        let mut fees = calculate_fee(estimate_tx_bytes(&tx, 0, 0), fee_rate);
        let fee_for_change = min_economical_change(&tx, fee_rate);

        if change > fee_for_change {
            fees += fee_for_change;
            tx.output.push(TxOut {
                value: change,
                script_pubkey: self.script_for(&payer_address)?,
            });
        }

        let output_amount = amount.saturating_sub(fees);
        if amount < fees || output_amount < self.dust_minimum() {
            return Err(BnsError::InvalidAmount { fees, amount });
        }
        tx.output[0].value = output_amount;

        self.sign_and_serialize("bitcoin spend", tx, &payer, &[]).await
    }

    /// Cost of a preorder: burn, dust outputs and fees
    pub async fn estimate_preorder(
        &self,
        name: &str,
        destination_address: &str,
        payment_address: &str,
        payment_utxos: usize,
    ) -> BnsResult<u64> {
        validate_name(name)?;
        let namespace = namespace_of(name)?;

        let (price, burn_address, fee_rate) = futures::try_join!(
            self.backend.get_name_price(name),
            self.backend.get_namespace_burn_address(namespace),
            self.fee_rate(),
        )?;

        let tx = self.encoder.preorder(
            name,
            DUMMY_CONSENSUS_HASH,
            payment_address,
            &burn_address,
            &price,
            destination_address,
        )?;

        Ok(Self::estimate_total(&tx, payment_utxos, 0, fee_rate))
    }

    /// Cost of a register, optionally carrying a zone file hash
    pub async fn estimate_register(
        &self,
        name: &str,
        owner_address: &str,
        including_zonefile: bool,
        payment_utxos: usize,
    ) -> BnsResult<u64> {
        let value_hash = including_zonefile.then_some(DUMMY_ZONEFILE_HASH);
        let fee_rate = self.fee_rate().await?;

        let tx = self.encoder.register(name, owner_address, value_hash, None)?;

        // Payer change output
        Ok(Self::estimate_total(&tx, payment_utxos, 1, fee_rate))
    }

    /// Cost of an update
    pub async fn estimate_update(&self, name: &str, payment_utxos: usize) -> BnsResult<u64> {
        let fee_rate = self.fee_rate().await?;
        let tx = self
            .encoder
            .update(name, DUMMY_CONSENSUS_HASH, DUMMY_ZONEFILE_HASH)?;

        // Owner input and change, payer change
        Ok(Self::estimate_total(&tx, 1 + payment_utxos, 2, fee_rate))
    }

    /// Cost of a transfer
    pub async fn estimate_transfer(
        &self,
        name: &str,
        destination_address: &str,
        payment_utxos: usize,
    ) -> BnsResult<u64> {
        let fee_rate = self.fee_rate().await?;
        let tx = self
            .encoder
            .transfer(name, DUMMY_CONSENSUS_HASH, destination_address, false)?;

        Ok(Self::estimate_total(&tx, 1 + payment_utxos, 2, fee_rate))
    }

    /// Cost of a renewal, including the renewal price
    pub async fn estimate_renewal(
        &self,
        name: &str,
        destination_address: &str,
        owner_address: &str,
        including_zonefile: bool,
        payment_utxos: usize,
    ) -> BnsResult<u64> {
        validate_name(name)?;
        let namespace = namespace_of(name)?;
        let value_hash = including_zonefile.then_some(DUMMY_ZONEFILE_HASH);

        let (price, burn_address, fee_rate) = futures::try_join!(
            self.backend.get_name_price(name),
            self.backend.get_namespace_burn_address(namespace),
            self.fee_rate(),
        )?;

        let tx = self.encoder.renewal(
            name,
            destination_address,
            owner_address,
            &burn_address,
            &price,
            value_hash,
        )?;

        // Owner input, payer change
        Ok(Self::estimate_total(&tx, 1 + payment_utxos, 1, fee_rate))
    }

    /// Cost of a revoke
    pub async fn estimate_revoke(&self, name: &str, payment_utxos: usize) -> BnsResult<u64> {
        let fee_rate = self.fee_rate().await?;
        let tx = self.encoder.revoke(name)?;

        Ok(Self::estimate_total(&tx, 1 + payment_utxos, 2, fee_rate))
    }

    /// Cost of a namespace preorder, including the namespace price
    pub async fn estimate_namespace_preorder(
        &self,
        namespace_id: &str,
        reveal_address: &str,
        payment_address: &str,
        payment_utxos: usize,
    ) -> BnsResult<u64> {
        validate_namespace_id(namespace_id)?;
        let burn_address = self.default_burn_address()?;

        let (price, fee_rate) = futures::try_join!(
            self.backend.get_namespace_price(namespace_id),
            self.fee_rate(),
        )?;

        let tx = self.encoder.namespace_preorder(
            namespace_id,
            DUMMY_CONSENSUS_HASH,
            payment_address,
            reveal_address,
            &burn_address,
            &price,
        )?;

        Ok(Self::estimate_total(&tx, payment_utxos, 0, fee_rate))
    }

    /// Cost of a namespace reveal
    pub async fn estimate_namespace_reveal(
        &self,
        namespace: &NamespaceDescriptor,
        reveal_address: &str,
        payment_utxos: usize,
    ) -> BnsResult<u64> {
        let fee_rate = self.fee_rate().await?;
        let tx = self.encoder.namespace_reveal(namespace, reveal_address)?;

        Ok(Self::estimate_total(&tx, payment_utxos, 1, fee_rate))
    }

    /// Cost of launching a namespace
    pub async fn estimate_namespace_ready(
        &self,
        namespace_id: &str,
        reveal_utxos: usize,
    ) -> BnsResult<u64> {
        let fee_rate = self.fee_rate().await?;
        let tx = self.encoder.namespace_ready(namespace_id)?;

        Ok(Self::estimate_total(&tx, reveal_utxos, 1, fee_rate))
    }

    /// Cost of a name import
    pub async fn estimate_name_import(
        &self,
        name: &str,
        recipient_address: &str,
        zonefile_hash: &str,
        import_utxos: usize,
    ) -> BnsResult<u64> {
        let fee_rate = self.fee_rate().await?;
        let tx = self
            .encoder
            .name_import(name, recipient_address, zonefile_hash)?;

        Ok(Self::estimate_total(&tx, import_utxos, 1, fee_rate))
    }

    /// Cost of an announcement
    pub async fn estimate_announce(
        &self,
        message_hash: &str,
        sender_utxos: usize,
    ) -> BnsResult<u64> {
        let fee_rate = self.fee_rate().await?;
        let tx = self.encoder.announce(message_hash)?;

        Ok(Self::estimate_total(&tx, sender_utxos, 1, fee_rate))
    }

    /// Cost of a token transfer
    pub async fn estimate_token_transfer(
        &self,
        recipient_address: &str,
        token_type: &str,
        token_amount: &BigUint,
        scratch_area: &str,
        sender_utxos: usize,
        additional_outputs: usize,
    ) -> BnsResult<u64> {
        let fee_rate = self.fee_rate().await?;
        let tx = self.encoder.token_transfer(
            recipient_address,
            DUMMY_CONSENSUS_HASH,
            token_type,
            token_amount,
            scratch_area,
        )?;

        Ok(Self::estimate_total(&tx, sender_utxos, additional_outputs, fee_rate))
    }

    /// Cost of sending `amount` with a change output
    pub async fn estimate_bitcoin_spend(
        &self,
        destination_address: &str,
        amount: u64,
        payment_utxos: usize,
    ) -> BnsResult<u64> {
        let destination = self.address(destination_address)?;
        let fee_rate = self.fee_rate().await?;

        let tx = Transaction {
            version: 1,
            lock_time: LockTime::ZERO,
            input: vec![],
            output: vec![TxOut {
                value: amount,
                script_pubkey: destination.script_pubkey(),
            }],
        };

        Ok(Self::estimate_total(&tx, payment_utxos, 1, fee_rate))
    }
}
