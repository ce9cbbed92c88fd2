pub mod guard;

pub use guard::{
    AllowedActionSpec, GuardError, allowed_roles, comparison_rights_for_admins,
    skips_hierarchy_check,
};
