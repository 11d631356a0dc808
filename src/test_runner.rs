//! Headless session scripts.
//!
//! One step per line:
//! - `cmd:<command>` runs a session command (`cmd:open_templates`,
//!   `cmd:enter_destination:2024`), then waits for the session to settle
//! - `wait` / `settle` waits for fetches, copies and debounce timers
//! - `wait:<ms>` sleeps, then applies whatever results arrived
//! - `assert:<property>:<value>` compares a snapshot property
//! - `immediate` / `settle_mode` toggle waiting after commands
//! - `#` starts a comment
//!
//! ```text
//! cmd:open_templates
//! cmd:select_template:template.docx
//! cmd:select_destination:/sites/team/Shared Documents/2024
//! cmd:confirm
//! assert:phase:Succeeded
//! ```

use crate::command::Command;
use crate::error::{Result, TemplateCopyError};
use crate::executor::{ExecutionResult, Executor};
use crate::session::SessionController;
use crate::snapshot::SessionSnapshot;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Run { command: Command, immediate: bool },
    Settle,
    Sleep(Duration),
    Assert { property: String, expected: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestScript {
    pub steps: Vec<ScriptStep>,
}

impl TestScript {
    pub fn parse(content: &str) -> Result<Self> {
        let mut steps = Vec::new();
        let mut immediate = false;

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            let invalid = |reason: String| {
                TemplateCopyError::Command(format!("line {}: {}", index + 1, reason))
            };

            match line {
                "" => continue,
                _ if line.starts_with('#') => continue,
                "immediate" => immediate = true,
                "settle_mode" => immediate = false,
                "wait" | "settle" => steps.push(ScriptStep::Settle),
                _ => {
                    let step = if let Some(text) = line.strip_prefix("cmd:") {
                        ScriptStep::Run {
                            command: Command::from_string(text).map_err(invalid)?,
                            immediate,
                        }
                    } else if let Some(ms) = line.strip_prefix("wait:") {
                        let ms = ms
                            .trim()
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("invalid wait duration: {}", ms)))?;
                        ScriptStep::Sleep(Duration::from_millis(ms))
                    } else if let Some(assertion) = line.strip_prefix("assert:") {
                        let (property, expected) = assertion.split_once(':').ok_or_else(|| {
                            invalid("assertion must be in format 'property:value'".to_string())
                        })?;
                        ScriptStep::Assert {
                            property: property.to_string(),
                            expected: expected.to_string(),
                        }
                    } else {
                        return Err(invalid(format!("unrecognised step: {}", line)));
                    };
                    steps.push(step);
                }
            }
        }

        Ok(Self { steps })
    }
}

#[derive(Debug, Clone)]
pub struct TestRunner {
    pub script: TestScript,
    pub max_settle_time: Duration,
    last_execution: ExecutionResult,
}

impl TestRunner {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_string(&std::fs::read_to_string(path)?)
    }

    pub fn from_string(content: &str) -> Result<Self> {
        Ok(Self {
            script: TestScript::parse(content)?,
            max_settle_time: Duration::from_secs(5),
            last_execution: ExecutionResult::default(),
        })
    }

    pub async fn run(&mut self, session: &mut SessionController) -> Result<TestResult> {
        let started = Instant::now();
        let mut result = TestResult::default();
        log::info!("🧪 running {} script steps", self.script.steps.len());

        let steps = self.script.steps.clone();
        for (index, step) in steps.into_iter().enumerate() {
            log::debug!("🧪 step {}: {:?}", index, step);
            match step {
                ScriptStep::Run { command, immediate } => {
                    self.last_execution = Executor::execute(session, command).await;
                    result.commands_executed += 1;
                    if immediate {
                        session.drain_ready().await?;
                    } else if let Err(e) = self.settle(session).await {
                        result.errors.push(format!("step {}: {}", index + 1, e));
                    }
                }
                ScriptStep::Settle => {
                    if let Err(e) = self.settle(session).await {
                        result.errors.push(format!("step {}: {}", index + 1, e));
                    }
                }
                ScriptStep::Sleep(duration) => {
                    tokio::time::sleep(duration).await;
                    session.drain_ready().await?;
                }
                ScriptStep::Assert { property, expected } => {
                    match self.check(session, &property, &expected) {
                        Ok(Check::Pass) => result.assertions_passed += 1,
                        Ok(Check::Fail(actual)) => {
                            result.assertions_failed += 1;
                            result.errors.push(format!(
                                "Assertion failed: {}:{} (actual: {})",
                                property, expected, actual
                            ));
                        }
                        Err(e) => {
                            result.assertions_failed += 1;
                            result.errors.push(format!("Assertion error: {}", e));
                        }
                    }
                }
            }
        }

        result.duration = started.elapsed();
        result.success = result.assertions_failed == 0 && result.errors.is_empty();
        log::info!("🧪 script finished in {:?}", result.duration);
        Ok(result)
    }

    async fn settle(&self, session: &mut SessionController) -> Result<()> {
        tokio::time::timeout(self.max_settle_time, session.settle())
            .await
            .map_err(|_| {
                TemplateCopyError::Generic(format!(
                    "session still busy after {:?}",
                    self.max_settle_time
                ))
            })?
    }

    fn check(&self, session: &SessionController, property: &str, expected: &str) -> Result<Check> {
        let last = &self.last_execution;
        let (passed, actual) = match property {
            "status_contains" => {
                let status = last.status_message.clone().unwrap_or_default();
                (status.contains(expected), status)
            }
            "error_contains" => {
                let error = last.error.clone().unwrap_or_default();
                (error.contains(expected), error)
            }
            "rejected" => {
                let wanted = expected.parse::<bool>().map_err(|_| {
                    TemplateCopyError::Command("rejected expects true or false".to_string())
                })?;
                let rejected = last.error.is_some();
                (rejected == wanted, rejected.to_string())
            }
            _ => {
                let actual = SessionSnapshot::capture(session)
                    .property(property)
                    .ok_or_else(|| {
                        TemplateCopyError::Command(format!("Unknown assertion property: {}", property))
                    })?;
                (actual == expected, actual)
            }
        };
        Ok(if passed { Check::Pass } else { Check::Fail(actual) })
    }
}

enum Check {
    Pass,
    Fail(String),
}

#[derive(Debug, Clone, Default)]
pub struct TestResult {
    pub duration: Duration,
    pub commands_executed: usize,
    pub assertions_passed: usize,
    pub assertions_failed: usize,
    pub errors: Vec<String>,
    pub success: bool,
}

impl TestResult {
    pub fn print_summary(&self) {
        let verdict = if self.success { "✅ PASSED" } else { "❌ FAILED" };
        println!(
            "🧪 {}: {} commands, {} assertions passed, {} failed ({:?})",
            verdict,
            self.commands_executed,
            self.assertions_passed,
            self.assertions_failed,
            self.duration
        );
        for error in &self.errors {
            println!("   - {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        let script = TestScript::parse(
            r#"
# open and check
cmd:open_templates
wait:100
assert:templates.listing:Policies,template.docx
settle
"#,
        )
        .unwrap();
        assert_eq!(
            script.steps,
            vec![
                ScriptStep::Run {
                    command: Command::OpenTemplates,
                    immediate: false
                },
                ScriptStep::Sleep(Duration::from_millis(100)),
                ScriptStep::Assert {
                    property: "templates.listing".to_string(),
                    expected: "Policies,template.docx".to_string(),
                },
                ScriptStep::Settle,
            ]
        );
    }

    #[test]
    fn test_immediate_mode_applies_to_following_commands() {
        let script = TestScript::parse(
            "cmd:open_templates\nimmediate\ncmd:open_picker\ncmd:load_more\nsettle_mode\ncmd:confirm\n",
        )
        .unwrap();
        let flags: Vec<bool> = script
            .steps
            .iter()
            .filter_map(|step| match step {
                ScriptStep::Run { immediate, .. } => Some(*immediate),
                _ => None,
            })
            .collect();
        assert_eq!(flags, vec![false, true, true, false]);
    }

    #[test]
    fn test_assertion_value_may_contain_colons() {
        let script = TestScript::parse("assert:outcome.url:https://contoso.example/a.docx").unwrap();
        assert_eq!(
            script.steps[0],
            ScriptStep::Assert {
                property: "outcome.url".to_string(),
                expected: "https://contoso.example/a.docx".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_lines_are_rejected() {
        assert!(TestScript::parse("key:down").is_err());
        assert!(TestScript::parse("cmd:fly_away").is_err());
        assert!(TestScript::parse("wait:soon").is_err());
        assert!(TestScript::parse("assert:phase").is_err());
    }
}
