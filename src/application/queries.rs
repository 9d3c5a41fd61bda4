/// Query for the staff complaint listing. `category` only narrows the
/// result for super admins; department admins are always scoped to their
/// own department.
#[derive(Debug, Clone, Default)]
pub struct ListComplaintsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
}
