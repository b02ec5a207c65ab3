// FILE: src/engine/strategy.rs
//! Execution strategy: native delegation or local simulation.
//!
//! The strategy is chosen once per operation. A delegate that turns out to be
//! missing collapses into `Execution::Simulated`; a delegate that runs and
//! fails stays `Execution::Rejected`.

use crate::config::Config;
use crate::engine::command::NativeCommand;
use crate::engine::delegate::{ToolOutcome, ToolOutput, ToolRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NativeDelegate,
    Simulated,
}

impl Strategy {
    /// Capability probe. Hosts known not to carry the tool skip the spawn entirely.
    pub fn probe(config: &Config) -> Self {
        if config.native_platform {
            Strategy::NativeDelegate
        } else {
            Strategy::Simulated
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    Native(ToolOutput),
    Rejected { stderr: String, exit_code: Option<i32> },
    Simulated,
}

impl Strategy {
    pub fn execute(self, runner: &dyn ToolRunner, command: &NativeCommand<'_>) -> Execution {
        match self {
            Strategy::Simulated => {
                tracing::debug!("Simulating {} (native tool not expected on this host)", command.describe());
                Execution::Simulated
            }
            Strategy::NativeDelegate => match runner.invoke(&command.args()) {
                ToolOutcome::Ok(output) => Execution::Native(output),
                ToolOutcome::ToolError { stderr, exit_code } => {
                    tracing::warn!(
                        "Native tool failed to {} (exit code {:?}): {}",
                        command.describe(),
                        exit_code,
                        stderr.trim()
                    );
                    Execution::Rejected { stderr, exit_code }
                }
                ToolOutcome::ToolUnavailable => {
                    tracing::info!("Native tool not available, simulating {}", command.describe());
                    Execution::Simulated
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Target;
    use crate::engine::delegate::testing::ScriptedRunner;

    fn features_cmd(target: &Target) -> NativeCommand<'_> {
        NativeCommand::GetFeatures { target }
    }

    #[test]
    fn test_probe_follows_platform_flag() {
        assert_eq!(Strategy::probe(&Config::simulated("/tmp/x")), Strategy::Simulated);
        assert_eq!(Strategy::probe(&Config::native("/tmp/x", "dism")), Strategy::NativeDelegate);
    }

    #[test]
    fn test_simulated_strategy_never_spawns() {
        let runner = ScriptedRunner::succeeding("ignored");
        let target = Target::Online;
        let result = Strategy::Simulated.execute(&runner, &features_cmd(&target));
        assert_eq!(result, Execution::Simulated);
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_three_way_classification() {
        let target = Target::Online;

        let ok = ScriptedRunner::succeeding("Feature list");
        match Strategy::NativeDelegate.execute(&ok, &features_cmd(&target)) {
            Execution::Native(output) => assert_eq!(output.stdout, "Feature list"),
            other => panic!("unexpected: {:?}", other),
        }

        let rejected = ScriptedRunner::failing("Access denied", 5);
        assert_eq!(
            Strategy::NativeDelegate.execute(&rejected, &features_cmd(&target)),
            Execution::Rejected { stderr: "Access denied".into(), exit_code: Some(5) }
        );

        let missing = ScriptedRunner::unavailable();
        assert_eq!(
            Strategy::NativeDelegate.execute(&missing, &features_cmd(&target)),
            Execution::Simulated
        );
        assert_eq!(missing.last_call(), Some(vec!["/Online".to_string(), "/Get-Features".to_string()]));
    }
}
