use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Dashboard,
    Candidates,
    Jobs,
    EmployerRequests,
    Blog,
    AuditLog,
    Settings,
    Users,
}

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Dashboard,
        Module::Candidates,
        Module::Jobs,
        Module::EmployerRequests,
        Module::Blog,
        Module::AuditLog,
        Module::Settings,
        Module::Users,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Candidates => "candidates",
            Module::Jobs => "jobs",
            Module::EmployerRequests => "employer_requests",
            Module::Blog => "blog",
            Module::AuditLog => "audit_log",
            Module::Settings => "settings",
            Module::Users => "users",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown module '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    Archive,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::View,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Archive => "archive",
        }
    }
}

pub fn capability(module: Module, action: Action) -> String {
    format!("{}:{}", module.as_str(), action.as_str())
}

const SUPER_ADMIN: &[&str] = &[
    "dashboard:view",
    "candidates:view",
    "candidates:create",
    "candidates:update",
    "candidates:delete",
    "jobs:view",
    "jobs:create",
    "jobs:update",
    "jobs:delete",
    "jobs:archive",
    "employer_requests:view",
    "employer_requests:delete",
    "blog:view",
    "blog:create",
    "blog:update",
    "blog:delete",
    "audit_log:view",
    "settings:view",
    "settings:update",
    "users:view",
    "users:create",
    "users:update",
    "users:delete",
];

// Editors may archive jobs but never delete them.
const EDITOR: &[&str] = &[
    "dashboard:view",
    "candidates:view",
    "candidates:update",
    "jobs:view",
    "jobs:create",
    "jobs:update",
    "jobs:archive",
    "employer_requests:view",
    "blog:view",
    "blog:create",
    "blog:update",
    "settings:view",
    "settings:update",
];

const VIEWER: &[&str] = &[
    "dashboard:view",
    "candidates:view",
    "jobs:view",
    "employer_requests:view",
    "blog:view",
    "settings:view",
    "settings:update",
];

pub fn permissions_for(role: Role) -> &'static [&'static str] {
    match role {
        Role::SuperAdmin => SUPER_ADMIN,
        Role::Editor => EDITOR,
        Role::Viewer => VIEWER,
    }
}

/// `principal` is `None` for unauthenticated callers, who are denied everything.
pub fn has_permission(principal: Option<Role>, capability: &str) -> bool {
    match principal {
        Some(role) => permissions_for(role).contains(&capability),
        None => false,
    }
}

fn check(principal: Option<Role>, module: Module, suffix: &str) -> bool {
    has_permission(principal, &format!("{}:{}", module.as_str(), suffix))
}

pub fn can_view(principal: Option<Role>, module: Module) -> bool {
    check(principal, module, "view")
}

pub fn can_create(principal: Option<Role>, module: Module) -> bool {
    check(principal, module, "create")
}

pub fn can_update(principal: Option<Role>, module: Module) -> bool {
    check(principal, module, "update")
}

pub fn can_delete(principal: Option<Role>, module: Module) -> bool {
    check(principal, module, "delete")
}

pub fn can_archive(principal: Option<Role>, module: Module) -> bool {
    check(principal, module, "archive")
}
