//! Agent strategy selection

use std::sync::Arc;

use tracing::{info, warn};

use crate::local::LocalAgent;
use crate::remote::RemoteAgent;
use crate::vlm::{GeminiVlm, VisionModel};
use crate::{AgentConfig, NavigationAgent};

/// Builds the configured agent
pub struct AgentFactory;

impl AgentFactory {
    /// Remote agent when enabled and configured, otherwise the local agent.
    /// Client construction failures degrade to the next option.
    pub fn create_agent(config: &AgentConfig) -> Box<dyn NavigationAgent> {
        let local = Self::create_local_agent(config);

        if config.remote_enabled() {
            match RemoteAgent::new(config, local) {
                Ok(remote) => {
                    info!("Creating remote navigation agent");
                    return Box::new(remote);
                }
                Err(e) => {
                    warn!("Could not initialize remote agent: {}. Using local agent.", e);
                    return Box::new(Self::create_local_agent(config));
                }
            }
        }

        info!("Creating local navigation agent");
        Box::new(local)
    }

    /// Local agent, with the vision model attached when enabled
    pub fn create_local_agent(config: &AgentConfig) -> LocalAgent {
        LocalAgent::new(Self::create_vlm(config))
    }

    fn create_vlm(config: &AgentConfig) -> Option<Arc<dyn VisionModel>> {
        if !config.vlm_enabled() {
            info!("Gemini API not configured. Using template responses.");
            return None;
        }
        match GeminiVlm::new(config) {
            Ok(vlm) => Some(Arc::new(vlm)),
            Err(e) => {
                warn!("Could not initialize Gemini: {}. Using template responses.", e);
                None
            }
        }
    }

    /// Agent types the configuration allows
    pub fn available_agents(config: &AgentConfig) -> Vec<&'static str> {
        let mut available = vec!["local"];
        if config.has_remote_agent() {
            available.push("remote");
        }
        available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_local_without_vlm() {
        let agent = AgentFactory::create_agent(&AgentConfig::default());
        assert_eq!(agent.agent_type(), "local");
        assert!(!agent.vlm_available());
        assert_eq!(AgentFactory::available_agents(&AgentConfig::default()), vec!["local"]);
    }

    #[test]
    fn test_remote_selected_when_configured() {
        let config = AgentConfig {
            use_remote_agent: true,
            agent_endpoint: Some("http://127.0.0.1:9/invoke".to_string()),
            ..Default::default()
        };
        let agent = AgentFactory::create_agent(&config);
        assert_eq!(agent.agent_type(), "remote");
        assert_eq!(AgentFactory::available_agents(&config), vec!["local", "remote"]);
    }

    #[test]
    fn test_endpoint_without_flag_stays_local() {
        let config = AgentConfig {
            agent_endpoint: Some("http://127.0.0.1:9/invoke".to_string()),
            ..Default::default()
        };
        assert_eq!(AgentFactory::create_agent(&config).agent_type(), "local");
    }

    #[test]
    fn test_vlm_attached_with_key() {
        let config = AgentConfig {
            use_gemini: true,
            gemini_api_key: "abc".to_string(),
            ..Default::default()
        };
        assert!(AgentFactory::create_agent(&config).vlm_available());

        let mocked = AgentConfig { mock_mode: true, ..config };
        assert!(!AgentFactory::create_agent(&mocked).vlm_available());
    }
}
