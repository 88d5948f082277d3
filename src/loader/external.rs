//! External-runner loader: each reference is handed to a runner command.

use super::{DiscoveredTest, LabelMapping, Loader, WhichTests};
use crate::config::Settings;
use crate::error::LoaderError;
use crate::variant::ParamMap;
use log::debug;
use serde_json::Value;

const KIND: &str = "external";

/// Where the runner should be started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerChdir {
    Runner,
    Test,
}

impl RunnerChdir {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "runner" => Some(RunnerChdir::Runner),
            "test" => Some(RunnerChdir::Test),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            RunnerChdir::Runner => "runner",
            RunnerChdir::Test => "test",
        }
    }
}

/// Turns every reference into one test run by `external_runner`.
///
/// The runner comes from the `runner` extra parameter, falling back to the
/// `external_runner` setting. Without a runner nothing is discovered.
#[derive(Debug)]
pub struct ExternalLoader {
    runner: Option<String>,
    chdir: Option<RunnerChdir>,
    testdir: Option<String>,
    type_labels: LabelMapping,
    decorators: LabelMapping,
}

impl ExternalLoader {
    pub const NAME: &'static str = "external";

    pub fn new(settings: &Settings, extra: &ParamMap) -> Result<Self, LoaderError> {
        let runner = match extra.get("runner") {
            None | Some(Value::Null) => settings.get_str("external_runner")?.map(str::to_string),
            Some(Value::String(runner)) => Some(runner.clone()),
            Some(_) => {
                return Err(LoaderError::InvalidExtra {
                    name: "runner".into(),
                    reason: "must be a string".into(),
                })
            }
        };

        let chdir = settings
            .get_str("external_runner_chdir")?
            .map(parse_chdir)
            .transpose()?;
        let testdir = settings
            .get_str("external_runner_testdir")?
            .map(str::to_string);

        Ok(Self {
            runner,
            chdir,
            testdir,
            type_labels: LabelMapping::new(),
            decorators: LabelMapping::new(),
        })
    }

    pub fn runner(&self) -> Option<&str> {
        self.runner.as_deref()
    }
}

impl Loader for ExternalLoader {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn discover(
        &mut self,
        reference: &str,
        _which: WhichTests,
    ) -> Result<Vec<DiscoveredTest>, LoaderError> {
        let Some(runner) = &self.runner else {
            debug!("{}: no runner configured for {reference}", Self::NAME);
            return Ok(vec![]);
        };

        let mut test = DiscoveredTest::new(KIND, reference);
        test = test.with_metadata("runner", runner.as_str());
        if let Some(chdir) = self.chdir {
            test = test.with_metadata("chdir", chdir.as_str());
        }
        if let Some(testdir) = &self.testdir {
            test = test.with_metadata("testdir", testdir.as_str());
        }

        self.type_labels.insert(KIND.into(), "EXTERNAL".into());
        self.decorators.insert(KIND.into(), "healthy".into());
        Ok(vec![test])
    }

    fn full_type_label_mapping(&self) -> LabelMapping {
        self.type_labels.clone()
    }

    fn full_decorator_mapping(&self) -> LabelMapping {
        self.decorators.clone()
    }
}

fn parse_chdir(value: &str) -> Result<RunnerChdir, LoaderError> {
    RunnerChdir::parse(value).ok_or_else(|| LoaderError::InvalidExtra {
        name: "external_runner_chdir".into(),
        reason: format!("must be \"runner\" or \"test\", got {value:?}"),
    })
}
