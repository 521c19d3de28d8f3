//! Tenant-scoped namespace derivation.
//!
//! Every fragment belongs to exactly one namespace and every query touches
//! exactly one namespace. Organization-owned documents share the
//! `ORG_{organization_id}` partition; everything else lands in the owner's
//! personal `USER_{owner_id}` partition.

use super::types::{NamespaceError, OwnerType};

/// Derive the storage namespace from ownership data.
///
/// `ORGANIZATION` ownership with an organization id maps to `ORG_{id}`;
/// otherwise the owner's personal namespace `USER_{owner_id}` is used.
/// Declaring organization ownership without an organization id is rejected.
pub fn resolve_namespace(
    owner_type: OwnerType,
    owner_id: &str,
    organization_id: Option<&str>,
) -> Result<String, NamespaceError> {
    let organization_id = organization_id.map(str::trim).filter(|id| !id.is_empty());
    match owner_type {
        OwnerType::Organization => match organization_id {
            Some(id) => Ok(format!("ORG_{id}")),
            None => Err(NamespaceError::MissingOrganizationId),
        },
        OwnerType::Personal => {
            let owner_id = owner_id.trim();
            if owner_id.is_empty() {
                return Err(NamespaceError::MissingOwnerId);
            }
            Ok(format!("USER_{owner_id}"))
        }
    }
}
