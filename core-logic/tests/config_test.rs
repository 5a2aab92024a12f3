use core_logic::{ConfigError, DeployConfig, SecretRef};
use std::io::Write;

const PROJECT_CONFIG: &str = r#"
default_network = "rinkeby"

[networks.hardhat]
chain_id = 31337

[networks.rinkeby]
url = "https://rinkeby.infura.io/v3/project-id"
accounts = ["env:RINKEBY_PRIVATE_KEY"]
chain_id = 4
live = true
save_deployments = true

[networks.mainnet]
url = "https://mainnet.infura.io/v3/project-id"
accounts = ["keystore:wallet-json/mainnet.json"]
gas_price = 120000000000

[solidity]
version = "0.8.0"

[solidity.settings.optimizer]
enabled = true
runs = 200

[paths]
sources = "./contracts"
cache = "./cache"
artifacts = "./artifacts"

[etherscan]
api_key = "env:ETHERSCAN_API_KEY"

[test]
timeout_ms = 20000
"#;

#[test]
fn test_project_config_parsing() {
    let config = DeployConfig::from_toml_str(PROJECT_CONFIG).unwrap();

    assert_eq!(config.default_network, "rinkeby");
    assert_eq!(config.networks.len(), 3);

    let rinkeby = config.network("rinkeby").unwrap();
    assert_eq!(rinkeby.chain_id, Some(4));
    assert!(rinkeby.live);
    assert!(rinkeby.save_deployments);
    assert_eq!(
        rinkeby.accounts,
        vec![SecretRef::Env("RINKEBY_PRIVATE_KEY".to_string())]
    );

    assert_eq!(config.solidity.version, "0.8.0");
    assert!(config.solidity.settings.optimizer.enabled);
    assert_eq!(config.test.timeout_ms, 20000);
    assert_eq!(
        config.etherscan.api_key,
        Some(SecretRef::Env("ETHERSCAN_API_KEY".to_string()))
    );
}

#[test]
fn test_values_pass_through_unmodified() {
    let config = DeployConfig::from_toml_str(PROJECT_CONFIG).unwrap();

    let rinkeby = config.network("rinkeby").unwrap();
    assert_eq!(
        rinkeby.url.as_deref(),
        Some("https://rinkeby.infura.io/v3/project-id")
    );
    assert_eq!(rinkeby.expected_chain_id("rinkeby"), Some(4));
    assert_eq!(config.solidity.settings.optimizer.runs, 200);

    let mainnet = config.network("mainnet").unwrap();
    assert_eq!(mainnet.gas_price, Some(120_000_000_000));
    assert_eq!(mainnet.chain_id, None);
}

#[test]
fn test_defaults_match_project() {
    let config = DeployConfig::from_toml_str(
        r#"
        [networks.rinkeby]
        url = "https://rinkeby.example.com"
        "#,
    )
    .unwrap();

    assert_eq!(config.default_network, "rinkeby");
    assert_eq!(config.solidity.version, "0.8.0");
    assert!(config.solidity.settings.optimizer.enabled);
    assert_eq!(config.solidity.settings.optimizer.runs, 200);
    assert_eq!(config.paths.artifacts, "./artifacts");
    assert_eq!(config.paths.deployments, "./deployments");
    assert_eq!(config.test.timeout_ms, 20000);
}

#[test]
fn test_select_network() {
    let config = DeployConfig::from_toml_str(PROJECT_CONFIG).unwrap();

    let (name, _) = config.select_network(None).unwrap();
    assert_eq!(name, "rinkeby");

    let (name, network) = config.select_network(Some("mainnet")).unwrap();
    assert_eq!(name, "mainnet");
    assert_eq!(network.gas_price, Some(120_000_000_000));

    assert!(matches!(
        config.select_network(Some("goerli")),
        Err(ConfigError::UnknownNetwork { .. })
    ));
}

#[test]
fn test_literal_private_key_rejected() {
    let result = DeployConfig::from_toml_str(
        r#"
        default_network = "rinkeby"
        [networks.rinkeby]
        url = "https://rinkeby.example.com"
        accounts = ["4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"]
        "#,
    );

    match result {
        Err(ConfigError::Load { msg, .. }) => assert!(msg.contains("Literal secret")),
        other => panic!("Expected literal secret rejection, got {:?}", other),
    }
}

#[test]
fn test_missing_default_network() {
    let result = DeployConfig::from_toml_str(
        r#"
        default_network = "mainnet"
        [networks.rinkeby]
        url = "https://rinkeby.example.com"
        "#,
    );

    assert!(matches!(result, Err(ConfigError::UnknownNetwork { .. })));
}

#[test]
fn test_invalid_values() {
    let zero_runs = DeployConfig::from_toml_str(
        r#"
        [networks.rinkeby]
        url = "https://rinkeby.example.com"
        [solidity.settings.optimizer]
        enabled = true
        runs = 0
        "#,
    );
    assert!(matches!(zero_runs, Err(ConfigError::InvalidValue { .. })));

    let bad_multiplier = DeployConfig::from_toml_str(
        r#"
        [networks.rinkeby]
        url = "https://rinkeby.example.com"
        gas_multiplier = -2.0
        "#,
    );
    assert!(matches!(
        bad_multiplier,
        Err(ConfigError::InvalidValue { .. })
    ));

    let bad_url = DeployConfig::from_toml_str(
        r#"
        [networks.rinkeby]
        url = "not a url"
        "#,
    );
    assert!(matches!(bad_url, Err(ConfigError::InvalidRpcUrl { .. })));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(PROJECT_CONFIG.as_bytes()).unwrap();

    let config = DeployConfig::load(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.network("rinkeby").unwrap().chain_id, Some(4));
}

#[test]
fn test_environment_overrides_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(PROJECT_CONFIG.as_bytes()).unwrap();

    std::env::set_var("DEPLOYENVTEST__DEFAULT_NETWORK", "mainnet");
    std::env::set_var("DEPLOYENVTEST__NETWORKS__RINKEBY__CHAIN_ID", "5");

    let config =
        DeployConfig::load_with_env_prefix(file.path().to_str().unwrap(), "DEPLOYENVTEST")
            .unwrap();

    assert_eq!(config.default_network, "mainnet");
    assert_eq!(config.network("rinkeby").unwrap().chain_id, Some(5));
    // untouched keys keep the file's values
    assert_eq!(config.network("mainnet").unwrap().gas_price, Some(120_000_000_000));
}
