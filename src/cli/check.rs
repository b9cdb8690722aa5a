use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    error::HostPolicyError,
    policy::{HostPolicy, ObjectRef, PolicyViolation, Verdict, validate},
};

/// Validation result for one manifest checked offline
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub path: PathBuf,
    pub reference: ObjectRef,
    pub result: Result<(), PolicyViolation>,
}

impl CheckResult {
    pub fn verdict(&self) -> Verdict {
        match self.result {
            Ok(()) => Verdict::Ok,
            Err(_) => Verdict::NotOk,
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(()) => write!(f, "{}: {}", self.reference, Verdict::Ok),
            Err(violation) => write!(
                f,
                "{}: {} ({} section: {})",
                self.reference,
                Verdict::NotOk,
                violation.section,
                violation.kind.message()
            ),
        }
    }
}

/// Validate manifests without touching any store
pub fn check_manifests<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<CheckResult>, HostPolicyError> {
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let policy = HostPolicy::load(path)?;
            let reference = policy.reference();
            let result = validate(&policy, &reference);
            log::debug!("Checked {}: {:?}", path.display(), result);
            Ok(CheckResult {
                path: path.to_path_buf(),
                reference,
                result,
            })
        })
        .collect()
}
