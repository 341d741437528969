//! Semantic policy diff (spec §4.6).
//!
//! Compares two loaded policies element kind by element kind and reports
//! additions, removals, and (where a stable identity key exists across both
//! policies) modifications. Unlike the query layer, diffing never consults
//! the rule hash index — it walks each policy's own tables and matches
//! elements by name/identity key, the same approach `libpoldiff` takes per
//! `original_source/libpoldiff/src/*.c`.

use crate::classes::PermissionSet;
use crate::identity::{ClassId, HandleId};
use crate::mls::{Dominance, compare_levels};
use crate::policy::Policy;
use crate::rbac::{Role, User};
use crate::rules::{AvRule, AvRuleKind, RoleAllow, TeRule, TeRuleKind};
use crate::types::{Type, TypeKind};
use std::collections::{HashMap, HashSet};

/// Which element kind a `Diff` entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum DiffKind {
    Type,
    Attribute,
    Class,
    Role,
    User,
    Boolean,
    AvRule,
    TeRule,
    RoleAllow,
}

impl DiffKind {
    pub const ALL: &'static [DiffKind] = &[
        DiffKind::Type,
        DiffKind::Attribute,
        DiffKind::Class,
        DiffKind::Role,
        DiffKind::User,
        DiffKind::Boolean,
        DiffKind::AvRule,
        DiffKind::TeRule,
        DiffKind::RoleAllow,
    ];

    /// Name used by `polidiff`'s `--kind` selection (spec §6's "bitmask of
    /// kinds").
    pub fn name(&self) -> &'static str {
        match self {
            DiffKind::Type => "types",
            DiffKind::Attribute => "attributes",
            DiffKind::Class => "classes",
            DiffKind::Role => "roles",
            DiffKind::User => "users",
            DiffKind::Boolean => "booleans",
            DiffKind::AvRule => "avrules",
            DiffKind::TeRule => "terules",
            DiffKind::RoleAllow => "role_allows",
        }
    }

    pub fn from_name(name: &str) -> Option<DiffKind> {
        Self::ALL.iter().find(|k| k.name() == name).copied()
    }
}

/// Shape of a single diff entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum DiffForm {
    Added,
    Removed,
    Modified,
    /// A type changed kind (concrete ↔ attribute) or an attribute's
    /// member-type list changed; carried separately from a plain
    /// `Modified` since it has its own payload shape (spec §4.6).
    AddedType,
    RemovedType,
}

/// One diffed element: its kind, its form, and a human-readable payload
/// description. Payload is a rendered string rather than a typed enum per
/// kind — `libpoldiff`'s own reporting layer (`poldiff_*_to_string`)
/// renders to text at the same boundary, and a diff consumer (CLI, test)
/// has no need of anything more structured than "what changed, described".
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Diff {
    pub kind: DiffKind,
    pub form: DiffForm,
    pub name: String,
    pub payload: String,
}

/// Per-kind counts, replacing `poldiff_user_get_stats`'s positional
/// `size_t[5]` array with named fields (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub added_type: usize,
    pub removed_type: usize,
}

impl DiffStats {
    fn record(&mut self, form: &DiffForm) {
        match form {
            DiffForm::Added => self.added += 1,
            DiffForm::Removed => self.removed += 1,
            DiffForm::Modified => self.modified += 1,
            DiffForm::AddedType => self.added_type += 1,
            DiffForm::RemovedType => self.removed_type += 1,
        }
    }
}

/// The full result of diffing two policies: every `Diff` found plus
/// per-kind stats (spec §4.6).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DiffReport {
    pub diffs: Vec<Diff>,
}

impl DiffReport {
    fn push(&mut self, diff: Diff) {
        self.diffs.push(diff);
    }

    pub fn get_stats(&self, kind: DiffKind) -> DiffStats {
        let mut stats = DiffStats::default();
        for diff in self.diffs.iter().filter(|d| d.kind == kind) {
            stats.record(&diff.form);
        }
        stats
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }
}

/// Diff two policies (spec §4.6). Symmetric: `diff(p2, p1)` reports the
/// same elements with `Added`/`Removed` (and `AddedType`/`RemovedType`)
/// swapped, and `Modified` entries unchanged in identity. Idempotent:
/// `diff(p, p)` is empty.
pub fn diff_policies(left: &Policy, right: &Policy) -> DiffReport {
    let mut report = DiffReport::default();
    diff_types(left, right, &mut report);
    diff_classes(left, right, &mut report);
    diff_roles(left, right, &mut report);
    diff_users(left, right, &mut report);
    diff_booleans(left, right, &mut report);
    diff_av_rules(left, right, &mut report);
    diff_te_rules(left, right, &mut report);
    diff_role_allows(left, right, &mut report);
    report
}

fn name_index<Id: HandleId, Record>(
    table: &crate::symbol::SymbolTable<Id, Record>,
    name_of: impl Fn(&Record) -> &str,
) -> HashMap<String, Id> {
    table.iter().map(|(id, record)| (name_of(record).to_string(), id)).collect()
}

fn diff_types(left: &Policy, right: &Policy, report: &mut DiffReport) {
    let left_names = name_index(&left.types, |t: &Type| t.name.as_str());
    let right_names = name_index(&right.types, |t: &Type| t.name.as_str());

    for (name, &lid) in &left_names {
        match right_names.get(name) {
            None => {
                let kind = diff_kind_for_type(left, lid);
                report.push(Diff {
                    kind,
                    form: DiffForm::Removed,
                    name: name.clone(),
                    payload: format!("{name} removed"),
                });
            }
            Some(&rid) => {
                let left_kind = left.types.kind_of(lid);
                let right_kind = right.types.kind_of(rid);
                if left_kind != right_kind {
                    let kind = diff_kind_for_type(left, lid);
                    report.push(Diff {
                        kind,
                        form: DiffForm::Modified,
                        name: name.clone(),
                        payload: format!("{name} changed kind from {left_kind:?} to {right_kind:?}"),
                    });
                    continue;
                }
                if left_kind == Some(TypeKind::Attribute) {
                    let left_members: HashSet<String> =
                        left.types.members_of(lid).filter_map(|m| left.types.get(m)).map(|t| t.name.clone()).collect();
                    let right_members: HashSet<String> =
                        right.types.members_of(rid).filter_map(|m| right.types.get(m)).map(|t| t.name.clone()).collect();
                    let added: Vec<&String> = right_members.difference(&left_members).collect();
                    let removed: Vec<&String> = left_members.difference(&right_members).collect();
                    if !added.is_empty() {
                        report.push(Diff {
                            kind: DiffKind::Attribute,
                            form: DiffForm::AddedType,
                            name: name.clone(),
                            payload: format!("{name} gained members: {added:?}"),
                        });
                    }
                    if !removed.is_empty() {
                        report.push(Diff {
                            kind: DiffKind::Attribute,
                            form: DiffForm::RemovedType,
                            name: name.clone(),
                            payload: format!("{name} lost members: {removed:?}"),
                        });
                    }
                }
            }
        }
    }
    for (name, &rid) in &right_names {
        if !left_names.contains_key(name) {
            let kind = diff_kind_for_type(right, rid);
            report.push(Diff {
                kind,
                form: DiffForm::Added,
                name: name.clone(),
                payload: format!("{name} added"),
            });
        }
    }
}

fn diff_kind_for_type(policy: &Policy, id: crate::identity::TypeId) -> DiffKind {
    match policy.types.kind_of(id) {
        Some(TypeKind::Attribute) => DiffKind::Attribute,
        _ => DiffKind::Type,
    }
}

fn diff_classes(left: &Policy, right: &Policy, report: &mut DiffReport) {
    let left_names = name_index(&left.classes, |c: &crate::classes::ObjectClass| c.name.as_str());
    let right_names = name_index(&right.classes, |c: &crate::classes::ObjectClass| c.name.as_str());

    for (name, &lid) in &left_names {
        match right_names.get(name) {
            None => report.push(Diff {
                kind: DiffKind::Class,
                form: DiffForm::Removed,
                name: name.clone(),
                payload: format!("{name} removed"),
            }),
            Some(&rid) => {
                let left_perms: HashSet<&str> =
                    left.classes.get(lid).map(|c| c.own_perms().iter().map(|p| p.name.as_str()).collect()).unwrap_or_default();
                let right_perms: HashSet<&str> =
                    right.classes.get(rid).map(|c| c.own_perms().iter().map(|p| p.name.as_str()).collect()).unwrap_or_default();
                if left_perms != right_perms {
                    let added: Vec<&&str> = right_perms.difference(&left_perms).collect();
                    let removed: Vec<&&str> = left_perms.difference(&right_perms).collect();
                    report.push(Diff {
                        kind: DiffKind::Class,
                        form: DiffForm::Modified,
                        name: name.clone(),
                        payload: format!("{name} permissions changed: +{added:?} -{removed:?}"),
                    });
                }
            }
        }
    }
    for name in right_names.keys() {
        if !left_names.contains_key(name) {
            report.push(Diff {
                kind: DiffKind::Class,
                form: DiffForm::Added,
                name: name.clone(),
                payload: format!("{name} added"),
            });
        }
    }
}

fn diff_roles(left: &Policy, right: &Policy, report: &mut DiffReport) {
    let left_names = name_index(&left.roles, |r: &Role| r.name.as_str());
    let right_names = name_index(&right.roles, |r: &Role| r.name.as_str());

    for (name, &lid) in &left_names {
        match right_names.get(name) {
            None => report.push(Diff {
                kind: DiffKind::Role,
                form: DiffForm::Removed,
                name: name.clone(),
                payload: format!("{name} removed"),
            }),
            Some(&rid) => {
                let left_types: HashSet<String> =
                    left.roles.get(lid).into_iter().flat_map(|r| r.types.iter()).filter_map(|t| left.types.get(t)).map(|t| t.name.clone()).collect();
                let right_types: HashSet<String> =
                    right.roles.get(rid).into_iter().flat_map(|r| r.types.iter()).filter_map(|t| right.types.get(t)).map(|t| t.name.clone()).collect();
                if left_types != right_types {
                    let added: Vec<&String> = right_types.difference(&left_types).collect();
                    let removed: Vec<&String> = left_types.difference(&right_types).collect();
                    report.push(Diff {
                        kind: DiffKind::Role,
                        form: DiffForm::Modified,
                        name: name.clone(),
                        payload: format!("{name} types changed: +{added:?} -{removed:?}"),
                    });
                }
            }
        }
    }
    for name in right_names.keys() {
        if !left_names.contains_key(name) {
            report.push(Diff {
                kind: DiffKind::Role,
                form: DiffForm::Added,
                name: name.clone(),
                payload: format!("{name} added"),
            });
        }
    }
}

fn diff_users(left: &Policy, right: &Policy, report: &mut DiffReport) {
    let left_names = name_index(&left.users, |u: &User| u.name.as_str());
    let right_names = name_index(&right.users, |u: &User| u.name.as_str());

    for (name, &lid) in &left_names {
        match right_names.get(name) {
            None => report.push(Diff {
                kind: DiffKind::User,
                form: DiffForm::Removed,
                name: name.clone(),
                payload: format!("{name} removed"),
            }),
            Some(&rid) => {
                let left_roles: HashSet<String> =
                    left.users.get(lid).into_iter().flat_map(|u| u.roles.iter()).filter_map(|r| left.roles.get(r)).map(|r| r.name.clone()).collect();
                let right_roles: HashSet<String> =
                    right.users.get(rid).into_iter().flat_map(|u| u.roles.iter()).filter_map(|r| right.roles.get(r)).map(|r| r.name.clone()).collect();
                let level_changed = match (
                    left.users.get(lid).and_then(|u| u.default_level.as_ref()),
                    right.users.get(rid).and_then(|u| u.default_level.as_ref()),
                ) {
                    (Some(l), Some(r)) => compare_levels(l, r, &left.sens) != Dominance::Equal,
                    (None, None) => false,
                    _ => true,
                };
                if left_roles != right_roles || level_changed {
                    let added: Vec<&String> = right_roles.difference(&left_roles).collect();
                    let removed: Vec<&String> = left_roles.difference(&right_roles).collect();
                    report.push(Diff {
                        kind: DiffKind::User,
                        form: DiffForm::Modified,
                        name: name.clone(),
                        payload: format!("{name} changed: roles +{added:?} -{removed:?}, level_changed={level_changed}"),
                    });
                }
            }
        }
    }
    for name in right_names.keys() {
        if !left_names.contains_key(name) {
            report.push(Diff {
                kind: DiffKind::User,
                form: DiffForm::Added,
                name: name.clone(),
                payload: format!("{name} added"),
            });
        }
    }
}

fn diff_booleans(left: &Policy, right: &Policy, report: &mut DiffReport) {
    let left_names = name_index(&left.bools, |b: &crate::conditional::Boolean| b.name.as_str());
    let right_names = name_index(&right.bools, |b: &crate::conditional::Boolean| b.name.as_str());

    for (name, &lid) in &left_names {
        match right_names.get(name) {
            None => report.push(Diff {
                kind: DiffKind::Boolean,
                form: DiffForm::Removed,
                name: name.clone(),
                payload: format!("{name} removed"),
            }),
            Some(&rid) => {
                let left_default = left.bools.get(lid).map(|b| b.default_value).unwrap_or_default();
                let right_default = right.bools.get(rid).map(|b| b.default_value).unwrap_or_default();
                if left_default != right_default {
                    report.push(Diff {
                        kind: DiffKind::Boolean,
                        form: DiffForm::Modified,
                        name: name.clone(),
                        payload: format!("{name} default changed from {left_default} to {right_default}"),
                    });
                }
            }
        }
    }
    for name in right_names.keys() {
        if !left_names.contains_key(name) {
            report.push(Diff {
                kind: DiffKind::Boolean,
                form: DiffForm::Added,
                name: name.clone(),
                payload: format!("{name} added"),
            });
        }
    }
}

/// Identity key for an AV rule: (kind, source names, target names, class
/// names) — the same tuple the query layer's rule index groups on, giving
/// diff and query a consistent notion of "the same rule" (spec §4.6, §4.2).
fn av_rule_key(policy: &Policy, rule: &AvRule) -> (AvRuleKind, Vec<String>, Vec<String>, Vec<String>) {
    let mut source: Vec<String> = rule.source.types.iter().filter_map(|id| policy.types.get(id)).map(|t| t.name.clone()).collect();
    source.sort_unstable();
    let mut target: Vec<String> = rule.target.types.iter().filter_map(|id| policy.types.get(id)).map(|t| t.name.clone()).collect();
    target.sort_unstable();
    if rule.target.includes_self {
        target.push("self".to_string());
    }
    let mut classes: Vec<String> = rule.classes().filter_map(|id| policy.classes.get(id)).map(|c| c.name.clone()).collect();
    classes.sort_unstable();
    (rule.kind, source, target, classes)
}

fn diff_av_rules(left: &Policy, right: &Policy, report: &mut DiffReport) {
    let left_index: HashMap<_, &AvRule> = left.av_rules().iter().map(|r| (av_rule_key(left, r), r)).collect();
    let right_index: HashMap<_, &AvRule> = right.av_rules().iter().map(|r| (av_rule_key(right, r), r)).collect();

    for (key, lrule) in &left_index {
        let label = format!("{} {} {} : {}", key.0.keyword(), key.1.join(","), key.2.join(","), key.3.join(","));
        match right_index.get(key) {
            None => report.push(Diff {
                kind: DiffKind::AvRule,
                form: DiffForm::Removed,
                name: label.clone(),
                payload: format!("{label} removed"),
            }),
            Some(rrule) => {
                let (added, removed) = perm_map_diff(left, &lrule.perms, right, &rrule.perms);
                if !added.is_empty() || !removed.is_empty() {
                    report.push(Diff {
                        kind: DiffKind::AvRule,
                        form: DiffForm::Modified,
                        name: label.clone(),
                        payload: format!("{label} permissions changed: +{added:?} -{removed:?}"),
                    });
                }
            }
        }
    }
    for (key, _) in &right_index {
        if !left_index.contains_key(key) {
            let label = format!("{} {} {} : {}", key.0.keyword(), key.1.join(","), key.2.join(","), key.3.join(","));
            report.push(Diff {
                kind: DiffKind::AvRule,
                form: DiffForm::Added,
                name: label.clone(),
                payload: format!("{label} added"),
            });
        }
    }
}

/// Component-wise permission diff (spec §4.6 point 3): per class shared by
/// both sides, the permission names present on the right but not the left
/// are "added", and vice versa for "removed". A class present on only one
/// side contributes its whole permission set to that side's bucket.
fn perm_map_diff(
    left_policy: &Policy,
    left: &HashMap<ClassId, PermissionSet>,
    right_policy: &Policy,
    right: &HashMap<ClassId, PermissionSet>,
) -> (Vec<String>, Vec<String>) {
    let left_by_name: HashMap<&str, &PermissionSet> =
        left.iter().filter_map(|(c, p)| left_policy.classes.get(*c).map(|c| (c.name.as_str(), p))).collect();
    let right_by_name: HashMap<&str, &PermissionSet> =
        right.iter().filter_map(|(c, p)| right_policy.classes.get(*c).map(|c| (c.name.as_str(), p))).collect();

    let mut added = Vec::new();
    let mut removed = Vec::new();

    let mut class_names: Vec<&str> = left_by_name.keys().chain(right_by_name.keys()).copied().collect();
    class_names.sort_unstable();
    class_names.dedup();

    for class_name in class_names {
        let left_set = left_by_name.get(class_name);
        let right_set = right_by_name.get(class_name);
        let class = left_policy
            .classes
            .id_of(class_name)
            .and_then(|id| left_policy.classes.get(id))
            .or_else(|| right_policy.classes.id_of(class_name).and_then(|id| right_policy.classes.get(id)));
        let Some(class) = class else { continue };
        let store = if left_policy.classes.id_of(class_name).is_some() { &left_policy.classes } else { &right_policy.classes };
        for perm in class.effective_perms(store) {
            let Some(idx) = class.effective_index_of(&perm.name, store) else { continue };
            let in_left = left_set.map(|s| s.contains(idx)).unwrap_or(false);
            let in_right = right_set.map(|s| s.contains(idx)).unwrap_or(false);
            if in_right && !in_left {
                added.push(perm.name.clone());
            } else if in_left && !in_right {
                removed.push(perm.name.clone());
            }
        }
    }

    added.sort_unstable();
    removed.sort_unstable();
    (added, removed)
}

fn te_rule_key(policy: &Policy, rule: &TeRule) -> (TeRuleKind, Vec<String>, Vec<String>, Vec<String>) {
    let mut source: Vec<String> = rule.source.types.iter().filter_map(|id| policy.types.get(id)).map(|t| t.name.clone()).collect();
    source.sort_unstable();
    let mut target: Vec<String> = rule.target.types.iter().filter_map(|id| policy.types.get(id)).map(|t| t.name.clone()).collect();
    target.sort_unstable();
    let mut classes: Vec<String> = rule.classes.iter().filter_map(|id| policy.classes.get(id)).map(|c| c.name.clone()).collect();
    classes.sort_unstable();
    (rule.kind, source, target, classes)
}

fn diff_te_rules(left: &Policy, right: &Policy, report: &mut DiffReport) {
    let left_index: HashMap<_, &TeRule> = left.te_rules().iter().map(|r| (te_rule_key(left, r), r)).collect();
    let right_index: HashMap<_, &TeRule> = right.te_rules().iter().map(|r| (te_rule_key(right, r), r)).collect();

    for (key, lrule) in &left_index {
        let label = format!("{} {} {} : {}", key.0.keyword(), key.1.join(","), key.2.join(","), key.3.join(","));
        match right_index.get(key) {
            None => report.push(Diff {
                kind: DiffKind::TeRule,
                form: DiffForm::Removed,
                name: label.clone(),
                payload: format!("{label} removed"),
            }),
            Some(rrule) => {
                let left_default = left.types.get(lrule.default_type).map(|t| t.name.as_str()).unwrap_or("");
                let right_default = right.types.get(rrule.default_type).map(|t| t.name.as_str()).unwrap_or("");
                if left_default != right_default {
                    report.push(Diff {
                        kind: DiffKind::TeRule,
                        form: DiffForm::Modified,
                        name: label.clone(),
                        payload: format!("{label} default changed from {left_default} to {right_default}"),
                    });
                }
            }
        }
    }
    for (key, _) in &right_index {
        if !left_index.contains_key(key) {
            let label = format!("{} {} {} : {}", key.0.keyword(), key.1.join(","), key.2.join(","), key.3.join(","));
            report.push(Diff {
                kind: DiffKind::TeRule,
                form: DiffForm::Added,
                name: label.clone(),
                payload: format!("{label} added"),
            });
        }
    }
}

/// Identity key for a role-allow rule: its sorted source role names. A
/// policy rarely declares two `allow` RBAC rules with the same source role
/// set, so the source side alone is a stable enough key to key modified vs.
/// added/removed on the target role set (spec §4.6, §3's `RoleAllow`).
fn role_allow_key(policy: &Policy, rule: &RoleAllow) -> Vec<String> {
    let mut source: Vec<String> = rule.source.iter().filter_map(|id| policy.roles.get(id)).map(|r| r.name.clone()).collect();
    source.sort_unstable();
    source
}

fn role_name_set(policy: &Policy, ids: &crate::idset::IdSet<crate::identity::RoleId>) -> Vec<String> {
    let mut names: Vec<String> = ids.iter().filter_map(|id| policy.roles.get(id)).map(|r| r.name.clone()).collect();
    names.sort_unstable();
    names
}

fn diff_role_allows(left: &Policy, right: &Policy, report: &mut DiffReport) {
    let left_index: HashMap<Vec<String>, &RoleAllow> = left.role_allows.iter().map(|r| (role_allow_key(left, r), r)).collect();
    let right_index: HashMap<Vec<String>, &RoleAllow> = right.role_allows.iter().map(|r| (role_allow_key(right, r), r)).collect();

    for (key, lrule) in &left_index {
        let label = format!("allow {} ...;", key.join(","));
        match right_index.get(key) {
            None => report.push(Diff {
                kind: DiffKind::RoleAllow,
                form: DiffForm::Removed,
                name: label.clone(),
                payload: format!("{label} removed"),
            }),
            Some(rrule) => {
                let left_targets = role_name_set(left, &lrule.target);
                let right_targets = role_name_set(right, &rrule.target);
                if left_targets != right_targets {
                    report.push(Diff {
                        kind: DiffKind::RoleAllow,
                        form: DiffForm::Modified,
                        name: label.clone(),
                        payload: format!("{label} target roles changed from {{{}}} to {{{}}}", left_targets.join(","), right_targets.join(",")),
                    });
                }
            }
        }
    }
    for (key, _) in &right_index {
        if !left_index.contains_key(key) {
            let label = format!("allow {} ...;", key.join(","));
            report.push(Diff {
                kind: DiffKind::RoleAllow,
                form: DiffForm::Added,
                name: label.clone(),
                payload: format!("{label} added"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::ObjectClass;
    use crate::config::PolicyEngineConfig;
    use crate::identity::PermId;
    use crate::rules::{AvRule, TypeSet};
    use crate::types::TypeKind;
    use std::collections::HashMap as StdHashMap;

    fn base_policy() -> Policy {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let t_a = policy.types.declare("t_a", TypeKind::Concrete);
        let t_b = policy.types.declare("t_b", TypeKind::Concrete);
        let file_id = policy.classes.insert("file", ObjectClass::new("file", None));
        let read_idx = {
            let file = policy.classes.get_mut(file_id).unwrap();
            file.add_perm(PermId::from_index(0), "read", file_id)
        };
        let mut perms = PermissionSet::new();
        perms.insert(read_idx);
        let mut perm_map = StdHashMap::new();
        perm_map.insert(file_id, perms);
        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t_a),
            target: TypeSet::single(t_b),
            perms: perm_map,
            conditional: None,
        });
        policy
    }

    #[test]
    fn diffing_a_policy_against_itself_is_empty() {
        let policy = base_policy();
        let report = diff_policies(&policy, &policy);
        assert!(report.is_empty(), "unexpected diffs: {:?}", report.diffs);
    }

    #[test]
    fn added_type_is_reported_in_forward_diff_and_removed_in_reverse() {
        let left = base_policy();
        let mut right = base_policy();
        right.types.declare("t_c", TypeKind::Concrete);

        let forward = diff_policies(&left, &right);
        let forward_stats = forward.get_stats(DiffKind::Type);
        assert_eq!(forward_stats.added, 1);
        assert_eq!(forward_stats.removed, 0);

        let backward = diff_policies(&right, &left);
        let backward_stats = backward.get_stats(DiffKind::Type);
        assert_eq!(backward_stats.added, 0);
        assert_eq!(backward_stats.removed, 1);
    }

    #[test]
    fn av_rule_permission_change_reports_modified() {
        let left = base_policy();
        let mut right = base_policy();
        right.types.declare_alias("unused", right.types.resolve("t_a").unwrap());
        let t_a = right.types.resolve("t_a").unwrap();
        let t_b = right.types.resolve("t_b").unwrap();
        let file_id = right.classes.id_of("file").unwrap();
        let write_idx = {
            let file = right.classes.get_mut(file_id).unwrap();
            file.add_perm(PermId::from_index(1), "write", file_id)
        };
        // Rebuild the rule with an added permission rather than mutating
        // the stored one (the AV rule table has no mutation API by design).
        let mut perms = PermissionSet::new();
        let read_idx = right.classes.get(file_id).unwrap().local_index_of("read").unwrap();
        perms.insert(read_idx);
        perms.insert(write_idx);
        let mut perm_map = StdHashMap::new();
        perm_map.insert(file_id, perms);
        let mut replacement = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        replacement.types = right.types.clone();
        replacement.classes = right.classes.clone();
        replacement.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t_a),
            target: TypeSet::single(t_b),
            perms: perm_map,
            conditional: None,
        });

        let report = diff_policies(&left, &replacement);
        let stats = report.get_stats(DiffKind::AvRule);
        assert_eq!(stats.modified, 1);
    }

    #[test]
    fn role_allow_target_change_reports_modified() {
        let mut left = base_policy();
        let sysadm = left.roles.insert("sysadm_r", crate::rbac::Role::new("sysadm_r"));
        let staff = left.roles.insert("staff_r", crate::rbac::Role::new("staff_r"));
        let mut source = crate::idset::IdSet::new();
        source.insert(sysadm);
        let mut target = crate::idset::IdSet::new();
        target.insert(staff);
        left.role_allows.push(RoleAllow {
            source: source.clone(),
            target: target.clone(),
        });

        let mut right = base_policy();
        let sysadm_r = right.roles.insert("sysadm_r", crate::rbac::Role::new("sysadm_r"));
        let staff_r = right.roles.insert("staff_r", crate::rbac::Role::new("staff_r"));
        let secadm_r = right.roles.insert("secadm_r", crate::rbac::Role::new("secadm_r"));
        let mut right_source = crate::idset::IdSet::new();
        right_source.insert(sysadm_r);
        let mut right_target = crate::idset::IdSet::new();
        right_target.insert(staff_r);
        right_target.insert(secadm_r);
        right.role_allows.push(RoleAllow {
            source: right_source,
            target: right_target,
        });

        let report = diff_policies(&left, &right);
        let stats = report.get_stats(DiffKind::RoleAllow);
        assert_eq!(stats.modified, 1);
        assert_eq!(stats.added, 0);
        assert_eq!(stats.removed, 0);
    }

    #[test]
    fn role_allow_added_in_forward_removed_in_reverse() {
        let left = base_policy();
        let mut right = base_policy();
        let sysadm = right.roles.insert("sysadm_r", crate::rbac::Role::new("sysadm_r"));
        let staff = right.roles.insert("staff_r", crate::rbac::Role::new("staff_r"));
        let mut source = crate::idset::IdSet::new();
        source.insert(sysadm);
        let mut target = crate::idset::IdSet::new();
        target.insert(staff);
        right.role_allows.push(RoleAllow { source, target });

        let forward = diff_policies(&left, &right);
        assert_eq!(forward.get_stats(DiffKind::RoleAllow).added, 1);

        let backward = diff_policies(&right, &left);
        assert_eq!(backward.get_stats(DiffKind::RoleAllow).removed, 1);
    }
}
