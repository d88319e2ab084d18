//! Scenario replay against the simulated browser.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::broadcast::Receiver;
use tracing::{debug, info};

use heymic_config::Config;
use heymic_host_simulated::{Scenario, SimulatedBrowser, Step};
use heymic_protocols::message::BroadcastEvent;
use heymic_runtime::Controller;

/// Drives one controller and its simulated host through scenario steps.
pub(crate) struct Replayer {
    browser: Arc<SimulatedBrowser>,
    controller: Controller,
    rx: Receiver<BroadcastEvent>,
}

impl Replayer {
    pub(crate) fn new(config: &Config, docked_panel: bool) -> Self {
        let browser = Arc::new(SimulatedBrowser::new());
        let env = if docked_panel {
            browser.environment()
        } else {
            browser.environment_without_panel()
        };
        let controller = Controller::new(env, config);
        let rx = controller.subscribe();
        Self {
            browser,
            controller,
            rx,
        }
    }

    /// Run every step, returning the output lines in order.
    pub(crate) async fn run(&mut self, scenario: Scenario) -> Vec<Value> {
        info!(steps = scenario.steps.len(), "replaying scenario");
        let mut lines = Vec::new();
        for (index, step) in scenario.steps.into_iter().enumerate() {
            lines.extend(self.step(index, step).await);
        }
        lines
    }

    async fn step(&mut self, index: usize, step: Step) -> Vec<Value> {
        let mut lines = Vec::new();
        match step {
            Step::Host { host } => {
                debug!(step = index, "host event");
                self.browser.apply(&host);
                self.controller.handle_host_event(host).await;
            }
            Step::Request { request, sender } => {
                let name = request.name();
                let response = self.controller.handle_request(request, sender).await;
                lines.push(json!({
                    "step": index,
                    "request": name,
                    "response": response,
                }));
            }
            Step::Page { page, sender } => {
                self.controller.handle_page_event(page, sender).await;
            }
            Step::Fail { fail } => self.browser.fail(fail),
        }

        while let Ok(event) = self.rx.try_recv() {
            lines.push(json!({ "step": index, "broadcast": event }));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut config = Config::default();
        config.panel.retry_delay_ms = 1;
        config
    }

    #[tokio::test]
    async fn test_replay_prints_responses_and_broadcasts() {
        let scenario = Scenario::from_json(
            r#"[
                {"host": {"type": "tabCreated", "tab": {"id": 1, "windowId": 1, "url": "https://one.example", "active": true}}},
                {"host": {"type": "tabCreated", "tab": {"id": 2, "windowId": 1, "url": "https://two.example", "active": true}}},
                {"request": {"command": "enableMicForTab", "tabId": 1}},
                {"request": {"command": "enableMicForTab", "tabId": 2}},
                {"request": {"command": "getMicEnabledTab"}}
            ]"#,
        )
        .unwrap();

        let mut replayer = Replayer::new(&config(), true);
        let lines = replayer.run(scenario).await;

        let broadcasts: Vec<&Value> = lines.iter().filter_map(|l| l.get("broadcast")).collect();
        assert_eq!(
            broadcasts,
            vec![
                &json!({"event": "micStateChanged", "tabId": 1, "enabled": true}),
                &json!({"event": "micStateChanged", "tabId": 1, "enabled": false}),
                &json!({"event": "micStateChanged", "tabId": 2, "enabled": true}),
            ]
        );
        let last = lines.last().unwrap();
        assert_eq!(last["request"], "getMicEnabledTab");
        assert_eq!(last["response"]["tab"]["id"], 2);
        assert_eq!(last["response"]["tab"]["url"], "https://two.example");
        assert_eq!(last["response"]["tab"]["windowId"], 1);
    }

    #[tokio::test]
    async fn test_replay_fail_step_forces_companion_tab() {
        let scenario = Scenario::from_json(
            r#"[
                {"host": {"type": "tabCreated", "tab": {"id": 5, "windowId": 1, "url": "https://example.com", "active": true}}},
                {"fail": {"operation": "openPanel", "tabId": 5, "message": "Try again later", "times": 2}},
                {"request": {"command": "openCompanionPanel", "tabId": 5}}
            ]"#,
        )
        .unwrap();

        let mut replayer = Replayer::new(&config(), true);
        let lines = replayer.run(scenario).await;

        let response = lines
            .iter()
            .find_map(|l| l.get("response"))
            .unwrap();
        assert_eq!(response["ok"], true);
        assert_eq!(response["outcome"]["kind"], "companionTab");
    }
}
