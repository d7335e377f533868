use serde::{Deserialize, Serialize};

use crate::clients::ClientOrigin;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClientsConfig {
    /// Profiles contacted for every player request, e.g. `["WEB", "IOS"]`.
    #[serde(default = "default_playback")]
    pub playback: Vec<String>,
    #[serde(default = "default_hl")]
    pub hl: String,
    #[serde(default = "default_gl")]
    pub gl: String,
    pub po_token: Option<String>,
    pub visitor_data: Option<String>,
}

fn default_playback() -> Vec<String> {
    ClientOrigin::DEFAULT_SELECTION
        .iter()
        .map(|o| o.as_str().to_string())
        .collect()
}

fn default_hl() -> String {
    "en".to_string()
}

fn default_gl() -> String {
    "US".to_string()
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            playback: default_playback(),
            hl: default_hl(),
            gl: default_gl(),
            po_token: None,
            visitor_data: None,
        }
    }
}

impl ClientsConfig {
    /// Resolves configured names, skipping unknown ones. Falls back to the
    /// default selection when nothing usable is left.
    pub fn origins(&self) -> Vec<ClientOrigin> {
        let mut origins = Vec::new();
        for name in &self.playback {
            match name.parse::<ClientOrigin>() {
                Ok(ClientOrigin::Unknown) | Err(_) => {
                    tracing::warn!("Unknown client profile: {}", name);
                }
                Ok(origin) => {
                    if !origins.contains(&origin) {
                        origins.push(origin);
                    }
                }
            }
        }

        if origins.is_empty() {
            tracing::warn!("No valid client profiles configured! Falling back to defaults.");
            return ClientOrigin::DEFAULT_SELECTION.to_vec();
        }
        origins
    }
}
