use anyhow::{Context, Result};
use core_logic::ArtifactError;
use ethers::abi::token::{LenientTokenizer, Tokenizer};
use ethers::abi::{Abi, Token};

/// Tokenize command-line constructor arguments against the constructor's
/// input types. `string` parameters receive the argument verbatim.
pub fn encode_constructor_args(contract: &str, abi: &Abi, args: &[String]) -> Result<Vec<Token>> {
    let inputs = abi
        .constructor()
        .map(|c| c.inputs.as_slice())
        .unwrap_or_default();

    if inputs.len() != args.len() {
        return Err(ArtifactError::ArgumentCount {
            name: contract.to_string(),
            expected: inputs.len(),
            actual: args.len(),
        }
        .into());
    }

    inputs
        .iter()
        .zip(args)
        .map(|(param, value)| {
            LenientTokenizer::tokenize(&param.kind, value).with_context(|| {
                format!(
                    "Invalid value '{}' for constructor parameter '{}' ({})",
                    value, param.name, param.kind
                )
            })
        })
        .collect()
}

/// ABI-encoded constructor arguments as appended to creation code.
pub fn encoded_args_hex(tokens: &[Token]) -> String {
    hex::encode(ethers::abi::encode(tokens))
}
