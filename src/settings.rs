use crate::networking::api_message::Framing;
use crate::peer::Peer;
use crate::util::format_url_string;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_NAME: &str = "config";
pub const DEFAULT_SWARM_ADDRESS: &str = "192.168.0.111";
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NetworkSettings {
    pub host: [u8; 4],
    pub port: u16,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SwarmSettings {
    pub default_address: String,
    /// Port a swarm peer listens on for layer traffic; joins probe it.
    pub probe_port: u16,
    pub probe_timeout_ms: u64,
    #[serde(default)]
    pub peers: Vec<Peer>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeneratorSettings {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientSettings {
    pub api_base: String,
    pub framing: Framing,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Settings {
    pub network: NetworkSettings,
    pub swarm: SwarmSettings,
    pub generator: GeneratorSettings,
    pub client: ClientSettings,
}

impl Settings {
    /// Loads `<config_name>.toml` (optional) on top of the built-in defaults, then applies
    /// `AURA_SECTION__KEY` environment overrides (e.g. `AURA_NETWORK__PORT=9000`).
    pub fn load(config_name: &str) -> crate::Result<Settings> {
        let mut settings = Settings::defaults()?;
        settings.merge(File::with_name(config_name).required(false))?;
        settings.merge(Environment::with_prefix("AURA").separator("__"))?;
        let settings: Settings = settings.try_into()?;
        settings.validate()?;
        Ok(settings)
    }

    fn defaults() -> crate::Result<Config> {
        let mut settings = Config::default();
        settings.set_default("network.host", vec![0i64, 0, 0, 0])?;
        settings.set_default("network.port", 8000i64)?;
        settings.set_default("swarm.default_address", DEFAULT_SWARM_ADDRESS)?;
        settings.set_default("swarm.probe_port", 5555i64)?;
        settings.set_default("swarm.probe_timeout_ms", 2000i64)?;
        settings.set_default("generator.program", "python3")?;
        settings.set_default("generator.args", vec!["-u", "prompt.py"])?;
        settings.set_default("client.api_base", DEFAULT_API_BASE)?;
        settings.set_default("client.framing", "legacy")?;
        Ok(settings)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.generator.program.trim().is_empty() {
            return Err(crate::SwarmError::Config(String::from(
                "generator.program must not be empty",
            )));
        }
        for peer in self.swarm.peers.iter() {
            peer.validate()?;
        }
        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format_url_string(self.network.host, self.network.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            network: NetworkSettings {
                host: [0, 0, 0, 0],
                port: 8000,
            },
            swarm: SwarmSettings {
                default_address: String::from(DEFAULT_SWARM_ADDRESS),
                probe_port: 5555,
                probe_timeout_ms: 2000,
                peers: vec![],
            },
            generator: GeneratorSettings {
                program: String::from("python3"),
                args: vec![String::from("-u"), String::from("prompt.py")],
            },
            client: ClientSettings {
                api_base: String::from(DEFAULT_API_BASE),
                framing: Framing::Legacy,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file_test() {
        let settings = Settings::load("does/not/exist").unwrap();
        assert_eq!(settings.network.port, 8000);
        assert_eq!(settings.swarm.default_address, DEFAULT_SWARM_ADDRESS);
        assert_eq!(settings.swarm.probe_port, 5555);
        assert_eq!(settings.client.framing, Framing::Legacy);
        assert_eq!(settings.generator.args, vec!["-u", "prompt.py"]);
        assert_eq!(settings.listen_address(), "0.0.0.0:8000");
    }

    #[test]
    fn repository_config_test() {
        let settings = Settings::load(DEFAULT_CONFIG_NAME).unwrap();
        assert_eq!(settings.swarm.peers.len(), 1);
        assert_eq!(settings.swarm.peers[0].name, "Home Server");
        assert!(settings.swarm.peers[0].is_online());
    }
}
