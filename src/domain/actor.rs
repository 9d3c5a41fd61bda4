use crate::domain::account::Role;
use crate::domain::department::Department;

/// The authenticated caller of an operation, as established by its session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub account_id: String,
    pub scope: ActorScope,
}

/// What the caller is allowed to see. Department admins are bound to one
/// department; there is no stored link between admins and complaints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorScope {
    Student,
    DepartmentAdmin(Department),
    SuperAdmin,
}

impl Actor {
    pub fn student(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            scope: ActorScope::Student,
        }
    }

    pub fn department_admin(account_id: impl Into<String>, department: Department) -> Self {
        Self {
            account_id: account_id.into(),
            scope: ActorScope::DepartmentAdmin(department),
        }
    }

    pub fn super_admin(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            scope: ActorScope::SuperAdmin,
        }
    }

    /// Rebuilds the actor from session claims; a department admin without a
    /// department claim is not a valid actor.
    pub fn from_claims(
        account_id: &str,
        role: Role,
        department: Option<Department>,
    ) -> Option<Self> {
        let scope = match role {
            Role::Student => ActorScope::Student,
            Role::DepartmentAdmin => ActorScope::DepartmentAdmin(department?),
            Role::SuperAdmin => ActorScope::SuperAdmin,
        };
        Some(Self {
            account_id: account_id.to_string(),
            scope,
        })
    }

    pub fn role(&self) -> Role {
        match self.scope {
            ActorScope::Student => Role::Student,
            ActorScope::DepartmentAdmin(_) => Role::DepartmentAdmin,
            ActorScope::SuperAdmin => Role::SuperAdmin,
        }
    }

    pub fn is_staff(&self) -> bool {
        !matches!(self.scope, ActorScope::Student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_claims() {
        let actor = Actor::from_claims("a1", Role::DepartmentAdmin, Some(Department::Canteen));
        assert_eq!(actor, Some(Actor::department_admin("a1", Department::Canteen)));
        assert_eq!(Actor::from_claims("a1", Role::DepartmentAdmin, None), None);
        let actor = Actor::from_claims("a2", Role::Student, Some(Department::Canteen)).unwrap();
        assert_eq!(actor.scope, ActorScope::Student);
        assert!(!actor.is_staff());
    }
}
