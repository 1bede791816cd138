pub mod extension;

pub use extension::{ExtensionSnapshot, MembershipRole, NamespaceMembership};
