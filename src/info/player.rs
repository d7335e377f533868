use std::{collections::BTreeMap, sync::Arc};

use futures::future::join_all;
use tracing::{debug, error, info};

use crate::clients::{
    ClientError, ClientOrigin, ClientProfile, ClientsParams, PlayabilityStatus, PlayerResponse,
    VideoDetails,
};
use crate::common::errors::{Error, Result};
use crate::info::formats::{StreamDescriptor, build_catalog};

/// How one origin's player request settled.
#[derive(Debug, Clone)]
pub enum ClientOutcome {
    Success(PlayerResponse),
    Failed(ClientError),
    /// Not part of the selection, never contacted.
    NotSelected,
}

impl ClientOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The body the origin returned, whether or not it was usable.
    pub fn contents(&self) -> Option<&PlayerResponse> {
        match self {
            Self::Success(res) => Some(res),
            Self::Failed(err) => err.contents.as_ref(),
            Self::NotSelected => None,
        }
    }
}

static NOT_SELECTED: ClientOutcome = ClientOutcome::NotSelected;

/// Per-origin outcomes of one fan-out, keyed by every known profile.
#[derive(Debug, Clone)]
pub struct AggregationResult {
    outcomes: BTreeMap<ClientOrigin, ClientOutcome>,
    pub is_minimal_mode: bool,
}

impl AggregationResult {
    pub fn outcome(&self, origin: ClientOrigin) -> &ClientOutcome {
        self.outcomes
            .get(&origin)
            .unwrap_or(&NOT_SELECTED)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (ClientOrigin, &ClientOutcome)> {
        self.outcomes.iter().map(|(origin, outcome)| (*origin, outcome))
    }

    pub fn response(&self, origin: ClientOrigin) -> Option<&PlayerResponse> {
        self.outcome(origin).contents()
    }

    /// Successful responses in profile order.
    pub fn successes(&self) -> impl Iterator<Item = (ClientOrigin, &PlayerResponse)> {
        self.outcomes.iter().filter_map(|(origin, outcome)| match outcome {
            ClientOutcome::Success(res) => Some((*origin, res)),
            _ => None,
        })
    }

    pub fn succeeded_origins(&self) -> Vec<ClientOrigin> {
        self.successes().map(|(origin, _)| origin).collect()
    }

    pub fn catalog(&self) -> Vec<StreamDescriptor> {
        build_catalog(self.successes())
    }

    /// First video details any origin returned, successful ones first.
    pub fn video_details(&self) -> Option<&VideoDetails> {
        self.successes()
            .find_map(|(_, res)| res.video_details.as_ref())
            .or_else(|| {
                self.outcomes
                    .values()
                    .filter_map(ClientOutcome::contents)
                    .find_map(|res| res.video_details.as_ref())
            })
    }

    pub fn playability_status(&self) -> Option<&PlayabilityStatus> {
        self.successes()
            .find_map(|(_, res)| res.playability_status.as_ref())
            .or_else(|| {
                self.outcomes
                    .values()
                    .filter_map(ClientOutcome::contents)
                    .find_map(|res| res.playability_status.as_ref())
            })
    }
}

/// Fans a player request out to the selected profiles and settles them all.
pub struct ResponseAggregator {
    profiles: BTreeMap<ClientOrigin, Arc<dyn ClientProfile>>,
}

impl ResponseAggregator {
    pub fn new(profiles: Vec<Arc<dyn ClientProfile>>) -> Self {
        let profiles = profiles
            .into_iter()
            .filter(|p| p.origin() != ClientOrigin::Unknown)
            .map(|p| (p.origin(), p))
            .collect();
        Self { profiles }
    }

    async fn request_one(&self, origin: ClientOrigin, params: &ClientsParams) -> ClientOutcome {
        let Some(profile) = self.profiles.get(&origin) else {
            return ClientOutcome::Failed(ClientError::new(origin, "profile is not registered"));
        };

        match profile.request(params).await {
            Ok(res) => {
                debug!("[ {} ]: Success", origin);
                ClientOutcome::Success(res)
            }
            Err(e) => {
                debug!("[ {} ]: Error (Reason: {})", origin, e.reason);
                ClientOutcome::Failed(e)
            }
        }
    }

    /// Requests every selected origin concurrently and waits for all of them.
    ///
    /// When nothing succeeded the result is in minimal mode: an ios body
    /// without video details is escalated as [`Error::Unrecoverable`],
    /// otherwise the web profile is asked once more if it produced nothing.
    pub async fn aggregate(
        &self,
        params: &ClientsParams,
        selected: &[ClientOrigin],
    ) -> Result<AggregationResult> {
        let settled = join_all(ClientOrigin::PROFILES.iter().map(|&origin| async move {
            let outcome = if selected.contains(&origin) {
                self.request_one(origin, params).await
            } else {
                ClientOutcome::NotSelected
            };
            (origin, outcome)
        }))
        .await;

        let mut result = AggregationResult {
            is_minimal_mode: settled.iter().all(|(_, outcome)| !outcome.is_success()),
            outcomes: settled.into_iter().collect(),
        };

        if !result.is_minimal_mode {
            return Ok(result);
        }

        let names: Vec<&str> = selected.iter().map(|o| o.as_str()).collect();
        let error_text = format!(
            "All player APIs responded with an error. (Clients: {})",
            names.join(", ")
        );

        if let Some(ios) = result.response(ClientOrigin::Ios) {
            if ios.video_details.is_none() {
                let reason = ios
                    .playability_reason()
                    .unwrap_or("no video details")
                    .to_string();
                error!("{} This error cannot continue processing. (Details: {})", error_text, reason);
                return Err(Error::Unrecoverable { reason });
            }
        }

        if result.response(ClientOrigin::Web).is_none() {
            info!("As a fallback to obtain the minimum information, the web client is forced to adapt.");
            let outcome = self.request_one(ClientOrigin::Web, params).await;
            result.outcomes.insert(ClientOrigin::Web, outcome);
        }

        error!("{}", error_text);
        info!("Only minimal information is available, as information from the player API is not available.");

        Ok(result)
    }
}
