//! Authorization decisions for complaint operations.
//!
//! Listing is scoped up front through [`AccessPolicy::scope_filter`], so the
//! store never returns rows the caller may not see. Single-complaint
//! operations fetch by id first and then ask [`AccessPolicy::can_view`] or
//! [`AccessPolicy::can_mutate`], because an id does not reveal its category.

use crate::application::errors::ServiceError;
use crate::domain::actor::{Actor, ActorScope};
use crate::domain::complaint::{Complaint, ComplaintFilter};
use crate::domain::department::Department;

pub struct AccessPolicy;

impl AccessPolicy {
    pub fn can_view(actor: &Actor, complaint: &Complaint) -> bool {
        match actor.scope {
            ActorScope::Student => complaint.created_by == actor.account_id,
            ActorScope::DepartmentAdmin(department) => complaint.category == department,
            ActorScope::SuperAdmin => true,
        }
    }

    /// Students never mutate; department admins only inside their department.
    pub fn can_mutate(actor: &Actor, complaint: &Complaint) -> bool {
        match actor.scope {
            ActorScope::Student => false,
            ActorScope::DepartmentAdmin(department) => complaint.category == department,
            ActorScope::SuperAdmin => true,
        }
    }

    /// Store filter bounding what `actor` may list. `requested_category` is
    /// honored for super admins only.
    pub fn scope_filter(actor: &Actor, requested_category: Option<Department>) -> ComplaintFilter {
        match actor.scope {
            ActorScope::Student => ComplaintFilter::created_by(actor.account_id.clone()),
            ActorScope::DepartmentAdmin(department) => ComplaintFilter::in_category(department),
            ActorScope::SuperAdmin => ComplaintFilter {
                category: requested_category,
                ..ComplaintFilter::default()
            },
        }
    }

    /// Gate for the staff-only operations.
    pub fn require_staff(actor: &Actor) -> Result<(), ServiceError> {
        if actor.is_staff() {
            Ok(())
        } else {
            Err(ServiceError::access_denied())
        }
    }
}
