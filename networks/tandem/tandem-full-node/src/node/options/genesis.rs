use super::{OptionProducer, OptionSet};
use anyhow::{ensure, Context};
use std::io::Read;
use tandem_config::{GenesisSource, NodeConfig};

/// Genesis state, from a local file or a beacon API.
pub struct Genesis;

impl OptionProducer for Genesis {
	fn name(&self) -> &'static str {
		"genesis"
	}

	fn produce(&self, config: &NodeConfig) -> Result<OptionSet, anyhow::Error> {
		let set = OptionSet::new(self.name());
		match config.genesis.clone() {
			None => Ok(set),
			Some(GenesisSource::File(path)) => {
				let mut file = std::fs::File::open(&path)
					.with_context(|| format!("failed to open genesis state {}", path.display()))?;
				let mut first = [0u8; 1];
				let read = file
					.read(&mut first)
					.with_context(|| format!("failed to read genesis state {}", path.display()))?;
				ensure!(read > 0, "genesis state {} is empty", path.display());
				Ok(set.with("genesis-state", move |settings| {
					settings.genesis_state = Some(path.clone())
				}))
			}
			Some(GenesisSource::Remote(url)) => Ok(set.with("genesis-beacon-api-url", move |settings| {
				settings.genesis_beacon_api_url = Some(url.clone())
			})),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::node::options::test_support::default_config;
	use url::Url;

	#[test]
	fn test_file_source() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("genesis.ssz");
		std::fs::write(&path, b"\x01\x02")?;

		let mut config = default_config();
		config.genesis = Some(GenesisSource::File(path.clone()));
		assert_eq!(Genesis.produce(&config)?.options()[0].name(), "genesis-state");

		std::fs::write(&path, b"")?;
		let err = Genesis.produce(&config).unwrap_err();
		assert!(err.to_string().contains("is empty"), "{err}");
		Ok(())
	}

	#[test]
	fn test_remote_source() -> Result<(), anyhow::Error> {
		let mut config = default_config();
		assert!(Genesis.produce(&config)?.is_empty());

		config.genesis = Some(GenesisSource::Remote(Url::parse("https://beacon.example.com")?));
		assert_eq!(Genesis.produce(&config)?.options()[0].name(), "genesis-beacon-api-url");
		Ok(())
	}
}
