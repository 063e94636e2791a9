use crate::{error::SignerError, transport::SubmissionReceipt};
use ethers::{
    providers::Middleware,
    types::{Address, I256, U256, U64},
};
use quill_contracts::{EntryPoint, ERC20API};
use std::sync::Arc;
use tracing::{info, warn};

/// The resource the smart account spends on gas
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpendAsset {
    /// Native value held by the account
    Native,
    /// A fungible token the paymaster charges the account in
    Erc20(Address),
}

/// Outcome of reconciling one confirmed operation.
///
/// Ephemeral and for observability only; never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    /// Nonce of the reconciled operation
    pub nonce: U256,
    /// What the account actually paid, from the balance delta
    pub gas_paid: U256,
    /// Gas usage the entry point reported in its completion event
    pub gas_used: U256,
    /// `gas_paid - gas_used`; a persistent non-zero value across many
    /// operations points at a pricing bug in the paymaster
    pub delta: I256,
}

/// Re-derives what a confirmed operation actually cost the account and
/// cross-checks it against the entry point's completion event
pub struct Reconciler<M: Middleware + 'static> {
    eth_client: Arc<M>,
    entry_point: EntryPoint<M>,
    asset: SpendAsset,
    search_window: u64,
}

impl<M: Middleware + 'static> Reconciler<M> {
    /// Creates a reconciler watching the given asset
    pub fn new(eth_client: Arc<M>, entry_point: Address, asset: SpendAsset) -> Self {
        let entry_point = EntryPoint::new(eth_client.clone(), entry_point);
        Self { eth_client, entry_point, asset, search_window: 0 }
    }

    /// Widens the completion event search past the confirming block.
    ///
    /// Defaults to 0, i.e. only the confirming block is examined; relays
    /// that batch across blocks may need a wider window.
    pub fn with_search_window(mut self, blocks: u64) -> Self {
        self.search_window = blocks;
        self
    }

    /// Balance of the watched asset for the given account.
    ///
    /// Taken once before submission; the delta against the post-confirmation
    /// balance is what the account paid.
    pub async fn snapshot(&self, account: Address) -> Result<U256, SignerError> {
        match self.asset {
            SpendAsset::Native => self
                .eth_client
                .get_balance(account, None)
                .await
                .map_err(SignerError::provider),
            SpendAsset::Erc20(token) => {
                ERC20API::new(token, self.eth_client.clone())
                    .balance_of(account)
                    .call()
                    .await
                    .map_err(SignerError::provider)
            }
        }
    }

    /// Reconciles a confirmed operation against the entry point's completion
    /// event.
    ///
    /// The event is searched only within `[block, block + search_window]`;
    /// an operation whose event cannot be located there is reported as
    /// [SignerError::ReconciliationIncomplete], never assumed zero-cost.
    pub async fn reconcile(
        &self,
        receipt: &SubmissionReceipt,
        balance_before: U256,
    ) -> Result<Reconciliation, SignerError> {
        let balance_after = self.snapshot(receipt.sender).await?;
        let gas_paid = balance_before.saturating_sub(balance_after);

        let from_block = receipt.block_number;
        let to_block = from_block + U64::from(self.search_window);
        let event = self
            .entry_point
            .query_user_operation_event(receipt.sender, receipt.nonce, from_block, to_block)
            .await
            .map_err(SignerError::provider)?;

        let Some((event, _meta)) = event else {
            return Err(SignerError::ReconciliationIncomplete {
                sender: receipt.sender,
                nonce: receipt.nonce,
                block: receipt.block_number,
            });
        };

        let reconciliation = reconcile_amounts(receipt.nonce, gas_paid, event.actual_gas_used);

        if reconciliation.delta.is_zero() {
            info!(
                "Gas reconciled, sender: {:?}, nonce: {}, paid: {}",
                receipt.sender, receipt.nonce, reconciliation.gas_paid
            );
        } else {
            warn!(
                "Gas reconciliation discrepancy, sender: {:?}, nonce: {}, paid: {}, entry point reported: {}, delta: {}",
                receipt.sender,
                receipt.nonce,
                reconciliation.gas_paid,
                reconciliation.gas_used,
                reconciliation.delta
            );
        }

        if let Some(relay_gas_used) = receipt.relay_gas_used {
            if relay_gas_used != event.actual_gas_used {
                warn!(
                    "Relay reported gas {} but entry point event reported {}, sender: {:?}, nonce: {}",
                    relay_gas_used, event.actual_gas_used, receipt.sender, receipt.nonce
                );
            }
        }

        Ok(reconciliation)
    }
}

/// Pairs what the account paid with what the entry point reported
pub fn reconcile_amounts(nonce: U256, gas_paid: U256, gas_used: U256) -> Reconciliation {
    let delta = I256::from_raw(gas_paid) - I256::from_raw(gas_used);
    Reconciliation { nonce, gas_paid, gas_used, delta }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_reflects_overpayment() {
        let reconciliation = reconcile_amounts(1.into(), 100.into(), 97.into());
        assert_eq!(reconciliation.gas_paid, U256::from(100));
        assert_eq!(reconciliation.gas_used, U256::from(97));
        assert_eq!(reconciliation.delta, I256::from(3));
    }

    #[test]
    fn delta_is_negative_when_fully_sponsored() {
        let reconciliation = reconcile_amounts(2.into(), U256::zero(), 42.into());
        assert_eq!(reconciliation.delta, I256::from(-42));
    }

    #[test]
    fn exact_match_has_zero_delta() {
        let reconciliation = reconcile_amounts(3.into(), 97.into(), 97.into());
        assert!(reconciliation.delta.is_zero());
    }
}
