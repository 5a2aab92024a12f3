//! # EVM Deployer
//!
//! Deploys compiled Solidity contracts to configured EVM networks and
//! verifies their sources on Etherscan.
//!
//! - [`artifacts`] - Hardhat build artifacts and build info
//! - [`args`] - Constructor argument encoding
//! - [`deployer`] - The [`deployer::ContractDeployer`] seam and its ethers implementation
//! - [`records`] - Saved deployments per network
//! - [`etherscan`] - Source verification client
//! - [`task`] - The deploy and verify scripts

pub mod args;
pub mod artifacts;
pub mod deployer;
pub mod etherscan;
pub mod records;
pub mod task;
pub mod utils;
