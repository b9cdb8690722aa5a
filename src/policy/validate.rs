use std::fmt;

use thiserror::Error;

use super::model::{Action, HostPolicy, MatchRule, ObjectRef, SourceRef};

/// Rule group of a host policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Process,
    File,
    Network,
    Capabilities,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Process => "process",
            Section::File => "file",
            Section::Network => "network",
            Section::Capabilities => "capabilities",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    OwnerOnlyRequiresAllow,
    RecursiveOnPath,
}

impl ViolationKind {
    pub fn message(&self) -> &'static str {
        match self {
            ViolationKind::OwnerOnlyRequiresAllow => "ownerOnly works with the Allow action",
            ViolationKind::RecursiveOnPath => {
                "recursive is only effective with directories, not paths"
            }
        }
    }
}

/// First semantic rule broken by a policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} {}", .kind.message(), .reference)]
pub struct PolicyViolation {
    pub kind: ViolationKind,
    pub section: Section,
    pub reference: ObjectRef,
}

/// How `fromSource` entries of a section are judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceCheck {
    /// Any entry with a path is rejected, whatever its `recursive` flag says
    AnyPath,
    /// Only entries with a path and `recursive: true` are rejected
    RecursivePath,
}

impl SourceCheck {
    fn rejects(self, source: &SourceRef) -> bool {
        if source.path.is_empty() {
            return false;
        }
        match self {
            SourceCheck::AnyPath => true,
            SourceCheck::RecursivePath => source.recursive,
        }
    }
}

/// Walk rules in order, returning the first broken constraint
///
/// For every rule the owner-only constraint is checked before its sources.
/// `sources` is `None` for rule kinds whose `fromSource` entries are not inspected.
fn check_rules<'a, R, I>(
    action: Action,
    rules: I,
    sources: Option<SourceCheck>,
) -> Result<(), ViolationKind>
where
    R: MatchRule + 'a,
    I: IntoIterator<Item = &'a R>,
{
    for rule in rules {
        if action != Action::Allow && rule.owner_only() {
            return Err(ViolationKind::OwnerOnlyRequiresAllow);
        }
        if let Some(check) = sources
            && rule.from_source().iter().any(|source| check.rejects(source))
        {
            return Err(ViolationKind::RecursiveOnPath);
        }
    }
    Ok(())
}

fn violation(
    section: Section,
    reference: &ObjectRef,
) -> impl FnOnce(ViolationKind) -> PolicyViolation + '_ {
    move |kind| PolicyViolation {
        kind,
        section,
        reference: reference.clone(),
    }
}

pub fn validate_process(policy: &HostPolicy, reference: &ObjectRef) -> Result<(), PolicyViolation> {
    let action = policy.spec.action;
    let process = &policy.spec.process;

    check_rules(action, &process.match_paths, Some(SourceCheck::AnyPath))
        .and_then(|()| check_rules(action, &process.match_directories, None))
        .and_then(|()| check_rules(action, &process.match_patterns, None))
        .map_err(violation(Section::Process, reference))
}

pub fn validate_file(policy: &HostPolicy, reference: &ObjectRef) -> Result<(), PolicyViolation> {
    let action = policy.spec.action;
    let file = &policy.spec.file;

    check_rules(action, &file.match_paths, Some(SourceCheck::RecursivePath))
        .and_then(|()| check_rules(action, &file.match_directories, None))
        .and_then(|()| check_rules(action, &file.match_patterns, None))
        .map_err(violation(Section::File, reference))
}

pub fn validate_network(policy: &HostPolicy, reference: &ObjectRef) -> Result<(), PolicyViolation> {
    check_rules(
        policy.spec.action,
        &policy.spec.network.match_protocols,
        Some(SourceCheck::AnyPath),
    )
    .map_err(violation(Section::Network, reference))
}

pub fn validate_capabilities(
    policy: &HostPolicy,
    reference: &ObjectRef,
) -> Result<(), PolicyViolation> {
    check_rules(
        policy.spec.action,
        &policy.spec.capabilities.match_capabilities,
        Some(SourceCheck::AnyPath),
    )
    .map_err(violation(Section::Capabilities, reference))
}

/// Validate all sections in order: process, file, network, capabilities
///
/// Stops at the first section reporting a violation; later sections are not evaluated.
pub fn validate(policy: &HostPolicy, reference: &ObjectRef) -> Result<(), PolicyViolation> {
    validate_process(policy, reference)?;
    validate_file(policy, reference)?;
    validate_network(policy, reference)?;
    validate_capabilities(policy, reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{
        capabilities::MatchCapability,
        file::{FileMatchDirectory, FileMatchPath, FileMatchPattern},
        net::MatchProtocol,
        process::{ProcessMatchDirectory, ProcessMatchPath, ProcessMatchPattern},
    };
    use rstest::rstest;

    fn reference() -> ObjectRef {
        ObjectRef::new("hsp-test")
    }

    fn policy(action: Action) -> HostPolicy {
        HostPolicy::new(reference(), action)
    }

    fn source(path: &str, recursive: bool) -> SourceRef {
        SourceRef {
            path: path.to_string(),
            recursive,
        }
    }

    // === Owner-only ===

    #[rstest]
    #[case(Action::Block, true, false)]
    #[case(Action::Audit, true, false)]
    #[case(Action::Allow, true, true)]
    #[case(Action::Block, false, true)]
    #[case(Action::Audit, false, true)]
    fn test_process_match_path_owner_only(
        #[case] action: Action,
        #[case] owner_only: bool,
        #[case] valid: bool,
    ) {
        let mut policy = policy(action);
        policy.spec.process.match_paths.push(ProcessMatchPath {
            path: "/usr/bin/sleep".to_string(),
            owner_only,
            ..Default::default()
        });
        assert_eq!(validate_process(&policy, &reference()).is_ok(), valid);
        assert_eq!(validate(&policy, &reference()).is_ok(), valid);
    }

    #[rstest]
    #[case(Action::Block, false)]
    #[case(Action::Audit, false)]
    #[case(Action::Allow, true)]
    fn test_owner_only_on_every_process_and_file_rule(#[case] action: Action, #[case] valid: bool) {
        let mut cases = Vec::new();

        let mut p = policy(action);
        p.spec.process.match_directories.push(ProcessMatchDirectory {
            dir: "/bin/".to_string(),
            owner_only: true,
            ..Default::default()
        });
        cases.push(p);

        let mut p = policy(action);
        p.spec.process.match_patterns.push(ProcessMatchPattern {
            pattern: "/tmp/**/*.sh".to_string(),
            owner_only: true,
        });
        cases.push(p);

        let mut p = policy(action);
        p.spec.file.match_paths.push(FileMatchPath {
            path: "/etc/shadow".to_string(),
            owner_only: true,
            ..Default::default()
        });
        cases.push(p);

        let mut p = policy(action);
        p.spec.file.match_directories.push(FileMatchDirectory {
            dir: "/etc/".to_string(),
            owner_only: true,
            ..Default::default()
        });
        cases.push(p);

        let mut p = policy(action);
        p.spec.file.match_patterns.push(FileMatchPattern {
            pattern: "/home/*/.ssh/*".to_string(),
            owner_only: true,
            ..Default::default()
        });
        cases.push(p);

        for p in cases {
            let result = validate(&p, &reference());
            assert_eq!(result.is_ok(), valid, "{:?}", p.spec);
            if let Err(violation) = result {
                assert_eq!(violation.kind, ViolationKind::OwnerOnlyRequiresAllow);
            }
        }
    }

    // === Source scoping ===

    #[rstest]
    #[case("/bin/bash", false, false, "path without recursive")]
    #[case("/bin/bash", true, false, "path with recursive")]
    #[case("", true, true, "empty path with recursive")]
    #[case("", false, true, "empty path")]
    fn test_process_from_source(
        #[case] path: &str,
        #[case] recursive: bool,
        #[case] valid: bool,
        #[case] _description: &str,
    ) {
        let mut policy = policy(Action::Allow);
        policy.spec.process.match_paths.push(ProcessMatchPath {
            path: "/usr/bin/sleep".to_string(),
            from_source: vec![source(path, recursive)],
            ..Default::default()
        });
        let result = validate_process(&policy, &reference());
        assert_eq!(result.is_ok(), valid);
        if let Err(violation) = result {
            assert_eq!(violation.kind, ViolationKind::RecursiveOnPath);
            assert_eq!(violation.section, Section::Process);
        }
    }

    #[rstest]
    #[case("/bin/bash", false, true, "path without recursive")]
    #[case("/bin/bash", true, false, "path with recursive")]
    #[case("", true, true, "empty path with recursive")]
    #[case("", false, true, "empty path")]
    fn test_file_from_source(
        #[case] path: &str,
        #[case] recursive: bool,
        #[case] valid: bool,
        #[case] _description: &str,
    ) {
        let mut policy = policy(Action::Allow);
        policy.spec.file.match_paths.push(FileMatchPath {
            path: "/etc/hosts".to_string(),
            from_source: vec![source(path, recursive)],
            ..Default::default()
        });
        let result = validate_file(&policy, &reference());
        assert_eq!(result.is_ok(), valid);
        if let Err(violation) = result {
            assert_eq!(violation.kind, ViolationKind::RecursiveOnPath);
            assert_eq!(violation.section, Section::File);
        }
    }

    #[rstest]
    #[case("/bin/ping", false, false)]
    #[case("/bin/ping", true, false)]
    #[case("", false, true)]
    fn test_network_from_source(
        #[case] path: &str,
        #[case] recursive: bool,
        #[case] valid: bool,
    ) {
        let mut policy = policy(Action::Block);
        policy.spec.network.match_protocols.push(MatchProtocol {
            protocol: "icmp".to_string(),
            from_source: vec![source(path, recursive)],
        });
        assert_eq!(validate_network(&policy, &reference()).is_ok(), valid);
    }

    #[rstest]
    #[case("/bin/ping", false, false)]
    #[case("/bin/ping", true, false)]
    #[case("", true, true)]
    fn test_capabilities_from_source(
        #[case] path: &str,
        #[case] recursive: bool,
        #[case] valid: bool,
    ) {
        let mut policy = policy(Action::Block);
        policy
            .spec
            .capabilities
            .match_capabilities
            .push(MatchCapability {
                capability: "net_raw".to_string(),
                from_source: vec![source(path, recursive)],
            });
        assert_eq!(validate_capabilities(&policy, &reference()).is_ok(), valid);
    }

    #[test]
    fn test_directory_sources_are_not_inspected() {
        let mut policy = policy(Action::Allow);
        policy.spec.process.match_directories.push(ProcessMatchDirectory {
            dir: "/usr/bin/".to_string(),
            from_source: vec![source("/bin/bash", true)],
            ..Default::default()
        });
        policy.spec.file.match_directories.push(FileMatchDirectory {
            dir: "/etc/".to_string(),
            from_source: vec![source("/bin/bash", true)],
            ..Default::default()
        });
        assert!(validate(&policy, &reference()).is_ok());
    }

    // === Ordering ===

    #[test]
    fn test_owner_only_checked_before_sources_of_same_rule() {
        let mut policy = policy(Action::Block);
        policy.spec.process.match_paths.push(ProcessMatchPath {
            path: "/usr/bin/sleep".to_string(),
            owner_only: true,
            from_source: vec![source("/bin/bash", false)],
        });
        let violation = validate_process(&policy, &reference()).unwrap_err();
        assert_eq!(violation.kind, ViolationKind::OwnerOnlyRequiresAllow);
    }

    #[test]
    fn test_rules_evaluated_in_given_order() {
        let mut policy = policy(Action::Block);
        policy.spec.process.match_paths.push(ProcessMatchPath {
            path: "/usr/bin/a".to_string(),
            from_source: vec![source("/bin/bash", false)],
            ..Default::default()
        });
        policy.spec.process.match_paths.push(ProcessMatchPath {
            path: "/usr/bin/b".to_string(),
            owner_only: true,
            ..Default::default()
        });
        let violation = validate_process(&policy, &reference()).unwrap_err();
        assert_eq!(violation.kind, ViolationKind::RecursiveOnPath);
    }

    #[test]
    fn test_paths_checked_before_patterns() {
        let mut policy = policy(Action::Audit);
        policy.spec.file.match_patterns.push(FileMatchPattern {
            pattern: "/tmp/*".to_string(),
            owner_only: true,
            ..Default::default()
        });
        policy.spec.file.match_paths.push(FileMatchPath {
            path: "/etc/hosts".to_string(),
            from_source: vec![source("/bin/bash", true)],
            ..Default::default()
        });
        let violation = validate_file(&policy, &reference()).unwrap_err();
        assert_eq!(violation.kind, ViolationKind::RecursiveOnPath);
    }

    #[test]
    fn test_process_section_reported_before_file_section() {
        let mut policy = policy(Action::Block);
        policy.spec.process.match_paths.push(ProcessMatchPath {
            owner_only: true,
            ..Default::default()
        });
        policy.spec.file.match_paths.push(FileMatchPath {
            from_source: vec![source("/bin/bash", true)],
            ..Default::default()
        });
        let violation = validate(&policy, &reference()).unwrap_err();
        assert_eq!(violation.section, Section::Process);
        assert_eq!(violation.kind, ViolationKind::OwnerOnlyRequiresAllow);
    }

    #[test]
    fn test_network_reported_before_capabilities() {
        let mut policy = policy(Action::Allow);
        policy.spec.network.match_protocols.push(MatchProtocol {
            protocol: "tcp".to_string(),
            from_source: vec![source("/bin/curl", false)],
        });
        policy
            .spec
            .capabilities
            .match_capabilities
            .push(MatchCapability {
                capability: "net_raw".to_string(),
                from_source: vec![source("/bin/ping", false)],
            });
        let violation = validate(&policy, &reference()).unwrap_err();
        assert_eq!(violation.section, Section::Network);
    }

    #[test]
    fn test_empty_policy_is_valid() {
        assert!(validate(&policy(Action::Block), &reference()).is_ok());
    }

    #[test]
    fn test_violation_message_carries_reference() {
        let mut policy = policy(Action::Block);
        policy.spec.process.match_paths.push(ProcessMatchPath {
            owner_only: true,
            ..Default::default()
        });
        let reference = ObjectRef::namespaced("kube-system", "hsp-test");
        let violation = validate(&policy, &reference).unwrap_err();
        assert_eq!(
            violation.to_string(),
            "ownerOnly works with the Allow action kube-system/hsp-test"
        );
    }
}
