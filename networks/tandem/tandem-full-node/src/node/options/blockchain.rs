use super::{OptionProducer, OptionSet};
use anyhow::{bail, Context};
use tandem_config::NodeConfig;

/// Data directory, network identity and fork-choice inputs.
pub struct Blockchain;

impl OptionProducer for Blockchain {
	fn name(&self) -> &'static str {
		"blockchain"
	}

	fn produce(&self, config: &NodeConfig) -> Result<OptionSet, anyhow::Error> {
		let data_dir = config.data_dir.clone();
		let network = config.network;
		let mut set = OptionSet::new(self.name())
			.with("datadir", move |settings| settings.data_dir = Some(data_dir.clone()))
			.with("network", move |settings| settings.network = Some(network));

		if let Some(path) = config.chain_config_file.clone() {
			set = set.with("chain-config-file", move |settings| {
				settings.chain_config_file = Some(path.clone())
			});
		}
		if let Some(chain_id) = config.chain_id {
			set = set.with("chain-id", move |settings| settings.chain_id = Some(chain_id));
		}
		if let Some(network_id) = config.network_id {
			set = set.with("network-id", move |settings| settings.network_id = Some(network_id));
		}

		if let Some(recipient) = &config.blockchain.suggested_fee_recipient {
			let recipient = parse_fee_recipient(recipient)?;
			set = set.with("suggested-fee-recipient", move |settings| {
				settings.suggested_fee_recipient = Some(recipient.clone())
			});
		}
		if let Some(checkpoint) = &config.blockchain.weak_subjectivity_checkpoint {
			parse_weak_subjectivity_checkpoint(checkpoint)?;
			let checkpoint = checkpoint.clone();
			set = set.with("weak-subjectivity-checkpoint", move |settings| {
				settings.weak_subjectivity_checkpoint = Some(checkpoint.clone())
			});
		}

		Ok(set)
	}
}

/// Checks a `0x`-prefixed 20-byte address and returns it lowercased.
fn parse_fee_recipient(value: &str) -> Result<String, anyhow::Error> {
	let Some(digits) = value.strip_prefix("0x") else {
		bail!("fee recipient {value} must start with 0x");
	};
	let bytes = hex::decode(digits).with_context(|| format!("fee recipient {value} is not hex"))?;
	if bytes.len() != 20 {
		bail!("fee recipient {value} is {} bytes long, expected 20", bytes.len());
	}
	Ok(format!("0x{}", hex::encode(bytes)))
}

/// Parses `0x<block root>:<epoch>`.
fn parse_weak_subjectivity_checkpoint(value: &str) -> Result<([u8; 32], u64), anyhow::Error> {
	let Some((root, epoch)) = value.split_once(':') else {
		bail!("weak subjectivity checkpoint {value} must be formatted as block_root:epoch");
	};
	let Some(root) = root.strip_prefix("0x") else {
		bail!("weak subjectivity checkpoint root {root} must start with 0x");
	};
	let root: [u8; 32] = hex::decode(root)
		.with_context(|| format!("weak subjectivity checkpoint root 0x{root} is not hex"))?
		.try_into()
		.map_err(|bytes: Vec<u8>| {
			anyhow::anyhow!(
				"weak subjectivity checkpoint root is {} bytes long, expected 32",
				bytes.len()
			)
		})?;
	let epoch = epoch
		.parse()
		.with_context(|| format!("weak subjectivity checkpoint epoch {epoch} is not a number"))?;
	Ok((root, epoch))
}
