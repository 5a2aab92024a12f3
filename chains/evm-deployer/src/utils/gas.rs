use core_logic::NetworkConfig;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::U256;

/// Per-network gas overrides applied to deployment transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GasPolicy {
    /// Fixed legacy gas price in wei, used exactly as configured.
    pub gas_price: Option<U256>,
    /// Scales the node's gas estimate.
    pub gas_multiplier: Option<f64>,
}

impl GasPolicy {
    pub fn from_network(network: &NetworkConfig) -> Self {
        Self {
            gas_price: network.gas_price.map(U256::from),
            gas_multiplier: network.gas_multiplier,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.gas_price.is_some()
    }

    /// Set the fixed gas price on an already-legacy transaction.
    pub fn apply_price(&self, tx: &mut TypedTransaction) {
        if let Some(gas_price) = self.gas_price {
            tx.set_gas_price(gas_price);
        }
    }

    /// Scale a filled-in gas limit by the configured multiplier.
    pub fn apply_multiplier(&self, tx: &mut TypedTransaction) {
        if let (Some(multiplier), Some(gas)) = (self.gas_multiplier, tx.gas().copied()) {
            tx.set_gas(scale_gas(gas, multiplier));
        }
    }
}

/// `ceil(estimate * multiplier)`, saturating at `u128::MAX`.
pub fn scale_gas(estimate: U256, multiplier: f64) -> U256 {
    let base = if estimate > U256::from(u128::MAX) {
        u128::MAX
    } else {
        estimate.as_u128()
    };
    U256::from((base as f64 * multiplier).ceil() as u128)
}
