//! Request batch

use crate::permission::{Permission, PermissionName};

/// Ordered set of rights to request
///
/// Names are unique. Adding a name that is already present removes the earlier
/// occurrence and appends the new one, so the last write wins while every
/// other right keeps its relative position.
///
/// ```
/// use permflow::batch::PermissionBatch;
/// use permflow::catalog;
///
/// let mut batch = PermissionBatch::new();
/// batch.push(catalog::camera());
/// batch.push(catalog::record_audio());
/// batch.push(catalog::camera());
/// assert_eq!(batch.as_slice(), &[catalog::record_audio(), catalog::camera()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionBatch {
    items: Vec<Permission>,
}

impl PermissionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a right, replacing any earlier occurrence of the same name
    pub fn push(&mut self, permission: Permission) {
        self.items.retain(|p| p != &permission);
        self.items.push(permission);
    }

    pub fn contains(&self, name: &(impl PermissionName + ?Sized)) -> bool {
        crate::permission::contains_permission(&self.items, name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Permission> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Permission] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Permission> {
        self.items
    }
}

impl Extend<Permission> for PermissionBatch {
    fn extend<I: IntoIterator<Item = Permission>>(&mut self, iter: I) {
        for permission in iter {
            self.push(permission);
        }
    }
}

impl FromIterator<Permission> for PermissionBatch {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut batch = Self::new();
        batch.extend(iter);
        batch
    }
}

impl From<Vec<Permission>> for PermissionBatch {
    fn from(items: Vec<Permission>) -> Self {
        items.into_iter().collect()
    }
}

impl IntoIterator for PermissionBatch {
    type Item = Permission;
    type IntoIter = std::vec::IntoIter<Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a PermissionBatch {
    type Item = &'a Permission;
    type IntoIter = std::slice::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, names};

    #[test]
    fn test_last_occurrence_wins() {
        let batch: PermissionBatch = vec![catalog::camera(), catalog::body_sensors(), catalog::camera()].into();
        assert_eq!(batch.as_slice(), &[catalog::body_sensors(), catalog::camera()]);
    }

    #[test]
    fn test_order_preserved_for_others() {
        let mut batch = PermissionBatch::new();
        batch.extend([
            catalog::camera(),
            catalog::record_audio(),
            catalog::read_contacts(),
        ]);
        batch.push(catalog::record_audio());

        let order: Vec<&str> = batch.iter().map(|p| p.name()).collect();
        assert_eq!(order, vec![names::CAMERA, names::READ_CONTACTS, names::RECORD_AUDIO]);
        assert!(batch.contains(names::READ_CONTACTS));
        assert_eq!(batch.len(), 3);
    }
}
