use super::{OptionProducer, OptionSet};
use anyhow::{bail, Context};
use tandem_config::{JwtSecret, NodeConfig};

/// Where an inline JWT secret is written for the clients to read.
pub const JWT_SECRET_FILE: &str = "jwtsecret";

/// The Engine API connection to the execution client. Produces nothing when no execution
/// endpoint is configured.
pub struct Execution;

impl OptionProducer for Execution {
	fn name(&self) -> &'static str {
		"execution"
	}

	fn produce(&self, config: &NodeConfig) -> Result<OptionSet, anyhow::Error> {
		let set = OptionSet::new(self.name());
		let Some(engine) = &config.execution else {
			return Ok(set);
		};

		let (secret, secret_file) = match &engine.jwt_secret {
			JwtSecret::File(path) => {
				let contents = std::fs::read_to_string(path)
					.with_context(|| format!("failed to read JWT secret {}", path.display()))?;
				let secret = parse_jwt_secret(contents.trim())
					.with_context(|| format!("invalid JWT secret in {}", path.display()))?;
				(secret, path.clone())
			}
			JwtSecret::Inline(value) => {
				(parse_jwt_secret(value)?, config.data_dir.join(JWT_SECRET_FILE))
			}
		};

		let endpoint = engine.endpoint.clone();
		let mut set = set
			.with("execution-endpoint", move |settings| {
				settings.execution_endpoint = Some(endpoint.clone())
			})
			.with("jwt-secret", move |settings| {
				settings.jwt_secret = Some(secret);
				settings.jwt_secret_file = Some(secret_file.clone());
			});

		if let Some(jwt_id) = engine.jwt_id.clone() {
			set = set.with("jwt-id", move |settings| settings.jwt_id = Some(jwt_id.clone()));
		}
		if !engine.headers.is_empty() {
			let headers = engine.headers.clone();
			set = set.with("execution-headers", move |settings| {
				settings.execution_headers = headers.clone()
			});
		}

		Ok(set)
	}
}

/// Decodes a 32-byte hex secret, with or without `0x`.
pub fn parse_jwt_secret(value: &str) -> Result<[u8; 32], anyhow::Error> {
	let digits = value.strip_prefix("0x").unwrap_or(value);
	let bytes = hex::decode(digits).context("JWT secret is not hex")?;
	match <[u8; 32]>::try_from(bytes) {
		Ok(secret) => Ok(secret),
		Err(bytes) => bail!("JWT secret is {} bytes long, expected 32", bytes.len()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::node::options::test_support::default_config;
	use crate::node::options::ComposedPlan;
	use tandem_config::ExecutionEngine;
	use url::Url;

	const SECRET: &str = "f1d2d2f924e986ac86fdf7b36c94bcdf32beec15a3a1d9f1d9f3b8f9e3c3b2a1";

	fn engine(jwt_secret: JwtSecret) -> Result<ExecutionEngine, anyhow::Error> {
		Ok(ExecutionEngine {
			endpoint: Url::parse("http://127.0.0.1:8551")?,
			jwt_secret,
			jwt_id: None,
			headers: Vec::new(),
		})
	}

	#[test]
	fn test_no_engine_produces_nothing() -> Result<(), anyhow::Error> {
		assert!(Execution.produce(&default_config())?.is_empty());
		Ok(())
	}

	#[test]
	fn test_secret_from_file() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("jwtsecret");
		std::fs::write(&path, format!("0x{SECRET}\n"))?;

		let mut config = default_config();
		config.execution = Some(engine(JwtSecret::File(path.clone()))?);
		let plan: ComposedPlan = [Execution.produce(&config)?].into_iter().collect();
		let settings = plan.settings();

		assert_eq!(settings.jwt_secret_file, Some(path));
		assert_eq!(settings.jwt_secret.map(hex::encode).as_deref(), Some(SECRET));
		assert_eq!(
			settings.execution_endpoint.as_ref().map(Url::as_str),
			Some("http://127.0.0.1:8551/")
		);
		Ok(())
	}

	#[test]
	fn test_inline_secret_is_written_under_data_dir() -> Result<(), anyhow::Error> {
		let mut config = default_config();
		config.execution = Some(engine(JwtSecret::Inline(SECRET.to_string()))?);
		let plan: ComposedPlan = [Execution.produce(&config)?].into_iter().collect();
		let settings = plan.settings();
		assert_eq!(settings.jwt_secret_file, Some(config.data_dir.join(JWT_SECRET_FILE)));
		Ok(())
	}

	#[test]
	fn test_bad_secrets_are_rejected() -> Result<(), anyhow::Error> {
		assert!(parse_jwt_secret("abcd").is_err());
		assert!(parse_jwt_secret(&"zz".repeat(32)).is_err());
		assert!(parse_jwt_secret(SECRET).is_ok());

		let mut config = default_config();
		config.execution = Some(engine(JwtSecret::File("/nonexistent/jwtsecret".into()))?);
		assert!(Execution.produce(&config).is_err());
		Ok(())
	}
}
