//! Access control for docserver files
//!
//! Every collection grants a permission tier per source file type. A user
//! can read a file when one of the document's collections grants a tier the
//! user holds. Without any grant only staff can read the file. Module output
//! (derived data) is public.

use dunya_common::types::PermissionTier;
use serde::Serialize;
use uuid::Uuid;

/// The identity attached to a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Viewer {
    pub user_id: Option<Uuid>,
    pub is_staff: bool,
    pub can_access_restricted: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Tiers the viewer holds, most privileged first
pub fn user_permissions(viewer: &Viewer) -> Vec<PermissionTier> {
    if viewer.is_staff {
        vec![PermissionTier::Staff, PermissionTier::Restricted, PermissionTier::Unrestricted]
    } else if viewer.can_access_restricted {
        vec![PermissionTier::Restricted, PermissionTier::Unrestricted]
    } else {
        vec![PermissionTier::Unrestricted]
    }
}

/// What a file type slug refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugKind {
    SourceType,
    Module,
    Unknown,
}

/// A collection permission row for the requested file type, restricted to the
/// collections the document belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    pub collection_id: Uuid,
    pub permission: PermissionTier,
    pub streamable: bool,
}

pub fn user_has_access(viewer: &Viewer, kind: SlugKind, grants: &[Grant]) -> bool {
    if viewer.is_staff {
        return true;
    }

    match kind {
        SlugKind::Module => true,
        SlugKind::Unknown => false,
        SlugKind::SourceType => {
            let held = user_permissions(viewer);
            grants.iter().any(|g| held.contains(&g.permission))
        },
    }
}

/// Whether downloads of this file should be throttled for the viewer.
///
/// Staff are never throttled. Otherwise the `streamable` flag of a grant the
/// viewer holds decides; no such grant means no throttling.
pub fn has_rate_limit(viewer: &Viewer, grants: &[Grant]) -> bool {
    if viewer.is_staff {
        return false;
    }

    let held = user_permissions(viewer);
    grants
        .iter()
        .filter(|g| held.contains(&g.permission))
        .any(|g| g.streamable)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three collections: the first grants unrestricted access to scores, the
    /// second restricted (streamable) access to mp3s, the third nothing.
    struct Fixture {
        col1: Uuid,
        col2: Uuid,
        col3: Uuid,
        rows: Vec<(Uuid, &'static str, Grant)>,
    }

    const MP3: &str = "mp3";
    const PDF: &str = "application/pdf";

    impl Fixture {
        fn new() -> Self {
            let col1 = Uuid::new_v4();
            let col2 = Uuid::new_v4();
            let col3 = Uuid::new_v4();
            let rows = vec![
                (
                    col1,
                    PDF,
                    Grant {
                        collection_id: col1,
                        permission: PermissionTier::Unrestricted,
                        streamable: false,
                    },
                ),
                (
                    col2,
                    MP3,
                    Grant {
                        collection_id: col2,
                        permission: PermissionTier::Restricted,
                        streamable: true,
                    },
                ),
            ];
            Self {
                col1,
                col2,
                col3,
                rows,
            }
        }

        fn grants(&self, document_collections: &[Uuid], slug: &str) -> Vec<Grant> {
            self.rows
                .iter()
                .filter(|(c, s, _)| document_collections.contains(c) && *s == slug)
                .map(|(_, _, g)| g.clone())
                .collect()
        }

        fn access(&self, viewer: &Viewer, doc: Uuid, slug: &str) -> bool {
            user_has_access(viewer, SlugKind::SourceType, &self.grants(&[doc], slug))
        }

        fn limited(&self, viewer: &Viewer, doc: Uuid, slug: &str) -> bool {
            has_rate_limit(viewer, &self.grants(&[doc], slug))
        }
    }

    fn normal() -> Viewer {
        Viewer {
            user_id: Some(Uuid::new_v4()),
            ..Default::default()
        }
    }

    fn restricted() -> Viewer {
        Viewer {
            user_id: Some(Uuid::new_v4()),
            can_access_restricted: true,
            ..Default::default()
        }
    }

    fn staff() -> Viewer {
        Viewer {
            user_id: Some(Uuid::new_v4()),
            is_staff: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_user_permissions() {
        assert_eq!(user_permissions(&Viewer::anonymous()), vec![PermissionTier::Unrestricted]);
        assert_eq!(
            user_permissions(&restricted()),
            vec![PermissionTier::Restricted, PermissionTier::Unrestricted]
        );
        assert_eq!(user_permissions(&staff()).len(), 3);
    }

    #[test]
    fn test_regular_user_access() {
        let f = Fixture::new();
        let user = normal();
        assert!(f.access(&user, f.col1, PDF));
        assert!(!f.access(&user, f.col2, MP3));
        assert!(!f.access(&user, f.col2, PDF));
        assert!(!f.access(&user, f.col1, MP3));
    }

    #[test]
    fn test_anonymous_user_matches_regular_user() {
        let f = Fixture::new();
        let anon = Viewer::anonymous();
        assert!(!anon.is_authenticated());
        assert!(f.access(&anon, f.col1, PDF));
        assert!(!f.access(&anon, f.col2, MP3));
    }

    #[test]
    fn test_restricted_user_access() {
        let f = Fixture::new();
        let user = restricted();
        assert!(f.access(&user, f.col2, MP3));
        assert!(f.access(&user, f.col1, PDF));
        assert!(!f.access(&user, f.col3, MP3));
        assert!(!f.access(&user, f.col3, PDF));
    }

    #[test]
    fn test_staff_user_access() {
        let f = Fixture::new();
        let user = staff();
        assert!(f.access(&user, f.col2, MP3));
        assert!(f.access(&user, f.col3, MP3));
        assert!(f.access(&user, f.col1, PDF));
        assert!(f.access(&user, f.col3, PDF));
        assert!(f.access(&user, f.col1, MP3));
    }

    #[test]
    fn test_rate_limit() {
        let f = Fixture::new();
        assert!(!f.limited(&staff(), f.col3, MP3));
        assert!(!f.limited(&restricted(), f.col1, PDF));
        assert!(f.limited(&restricted(), f.col2, MP3));
        assert!(!f.limited(&staff(), f.col2, MP3));
    }

    #[test]
    fn test_document_in_several_collections() {
        let f = Fixture::new();
        let grants = f.grants(&[f.col3, f.col1], PDF);
        assert!(user_has_access(&normal(), SlugKind::SourceType, &grants));
    }

    #[test]
    fn test_module_slugs_are_public() {
        assert!(user_has_access(&Viewer::anonymous(), SlugKind::Module, &[]));
        assert!(!user_has_access(&Viewer::anonymous(), SlugKind::Unknown, &[]));
        assert!(user_has_access(&staff(), SlugKind::Unknown, &[]));
        assert!(!has_rate_limit(&Viewer::anonymous(), &[]));
    }
}
