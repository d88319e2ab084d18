//! Replayable host scenarios.

use std::path::Path;

use heymic_protocols::message::{HostEvent, PageEvent, Request};
use heymic_protocols::types::TabId;
use serde::Deserialize;
use thiserror::Error;

use crate::failure::FailureScript;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Scenario parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scenario has no steps")]
    Empty,
}

/// One scenario step. Steps are distinguished by their single key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Host {
        host: HostEvent,
    },
    Request {
        request: Request,
        #[serde(default)]
        sender: Option<TabId>,
    },
    Page {
        page: PageEvent,
        sender: TabId,
    },
    Fail {
        fail: FailureScript,
    },
}

/// An ordered list of steps, stored as a JSON array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(content: &str) -> Result<Self, SimulationError> {
        let scenario: Scenario = serde_json::from_str(content)?;
        if scenario.steps.is_empty() {
            return Err(SimulationError::Empty);
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, SimulationError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
