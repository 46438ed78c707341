use std::fmt;

/// One of the three access levels a workspace grants.
///
/// Each tier owns a Role and a RoleBinding in the workspace namespace. The
/// verbs granted shrink monotonically from admin to viewer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Admin,
    Editor,
    Viewer,
}

const READ: &[&str] = &["get", "list", "watch"];
const WRITE: &[&str] = &["get", "list", "watch", "create", "update", "patch"];
const ALL: &[&str] = &["get", "list", "watch", "create", "update", "patch", "delete"];

// === impl Tier ===

impl Tier {
    /// Tiers in the order the controller ensures them.
    pub const ALL: [Tier; 3] = [Tier::Admin, Tier::Editor, Tier::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    /// The verbs granted on every resource in the workspace namespace.
    pub fn verbs(&self) -> &'static [&'static str] {
        match self {
            Self::Admin => ALL,
            Self::Editor => WRITE,
            Self::Viewer => READ,
        }
    }

    /// `<workspace>-<tier>`
    pub fn role_name(&self, workspace: &str) -> String {
        format!("{}-{}", workspace, self.as_str())
    }

    /// `<workspace>-<tier>-rb`
    pub fn binding_name(&self, workspace: &str) -> String {
        format!("{}-{}-rb", workspace, self.as_str())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_shrink_monotonically() {
        let [admin, editor, viewer] = Tier::ALL.map(|t| t.verbs());
        assert!(editor.iter().all(|v| admin.contains(v)));
        assert!(viewer.iter().all(|v| editor.contains(v)));
        assert_eq!(admin.len(), 7);
        assert_eq!(editor.len(), 6);
        assert_eq!(viewer.len(), 3);
        assert!(!editor.contains(&"delete"));
        assert!(!viewer.contains(&"create"));
    }

    #[test]
    fn derived_names() {
        assert_eq!(Tier::Admin.role_name("test"), "test-admin");
        assert_eq!(Tier::Editor.role_name("test"), "test-editor");
        assert_eq!(Tier::Viewer.binding_name("test"), "test-viewer-rb");
    }
}
