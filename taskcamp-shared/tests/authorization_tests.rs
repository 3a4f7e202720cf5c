/// Authorization guard tests over the in-memory membership store.

mod common;

use common::workspace_fixture;
use taskcamp_shared::auth::authorization::{AuthzError, ProjectRole, ANY_MEMBER, PROJECT_MANAGERS};
use taskcamp_shared::models::member::NewMember;
use taskcamp_shared::store::MembershipStore;
use uuid::Uuid;

async fn seed_member(
    fixture: &common::WorkspaceFixture,
    project_id: Uuid,
    role: ProjectRole,
) -> Uuid {
    let user_id = Uuid::new_v4();
    fixture
        .memberships
        .insert(NewMember {
            user_id,
            project_id,
            role,
        })
        .await
        .unwrap();
    user_id
}

#[tokio::test]
async fn resolve_role_fails_for_non_members() {
    let fixture = workspace_fixture();
    let project_id = Uuid::new_v4();

    let err = fixture
        .guard
        .resolve_role(Uuid::new_v4(), project_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::NotAMember(p) if p == project_id));
}

#[tokio::test]
async fn resolve_role_returns_the_membership_role() {
    let fixture = workspace_fixture();
    let project_id = Uuid::new_v4();

    let admin = seed_member(&fixture, project_id, ProjectRole::Admin).await;
    let member = seed_member(&fixture, project_id, ProjectRole::Member).await;

    assert_eq!(
        fixture.guard.resolve_role(admin, project_id).await.unwrap(),
        ProjectRole::Admin
    );
    assert_eq!(
        fixture.guard.resolve_role(member, project_id).await.unwrap(),
        ProjectRole::Member
    );
}

#[tokio::test]
async fn require_role_enforces_the_allow_list() {
    let fixture = workspace_fixture();
    let project_id = Uuid::new_v4();

    let admin = seed_member(&fixture, project_id, ProjectRole::Admin).await;
    let member = seed_member(&fixture, project_id, ProjectRole::Member).await;

    // A plain member is forbidden where only admins qualify
    let err = fixture
        .guard
        .require_role(member, project_id, &[ProjectRole::Admin])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthzError::Forbidden {
            actual: ProjectRole::Member,
            ..
        }
    ));

    // The admin passes and gets their role back for branching
    let role = fixture
        .guard
        .require_role(admin, project_id, &[ProjectRole::Admin])
        .await
        .unwrap();
    assert_eq!(role, ProjectRole::Admin);
}

#[tokio::test]
async fn require_role_distinguishes_non_member_from_forbidden() {
    let fixture = workspace_fixture();
    let project_id = Uuid::new_v4();

    let outsider = Uuid::new_v4();
    let err = fixture
        .guard
        .require_role(outsider, project_id, PROJECT_MANAGERS)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::NotAMember(_)));
}

#[tokio::test]
async fn no_role_is_implicitly_above_another() {
    let fixture = workspace_fixture();
    let project_id = Uuid::new_v4();

    let admin = seed_member(&fixture, project_id, ProjectRole::Admin).await;
    let project_admin = seed_member(&fixture, project_id, ProjectRole::ProjectAdmin).await;

    // An allow-list naming only project_admin does not admit admin
    let err = fixture
        .guard
        .require_role(admin, project_id, &[ProjectRole::ProjectAdmin])
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::Forbidden { .. }));

    // And vice versa
    let err = fixture
        .guard
        .require_role(project_admin, project_id, &[ProjectRole::Admin])
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::Forbidden { .. }));

    // Both pass the managers set, any role passes ANY_MEMBER
    assert!(fixture
        .guard
        .require_role(admin, project_id, PROJECT_MANAGERS)
        .await
        .is_ok());
    assert!(fixture
        .guard
        .require_role(project_admin, project_id, ANY_MEMBER)
        .await
        .is_ok());
}

#[tokio::test]
async fn membership_is_project_scoped() {
    let fixture = workspace_fixture();
    let project_a = Uuid::new_v4();
    let project_b = Uuid::new_v4();

    let admin_in_a = seed_member(&fixture, project_a, ProjectRole::Admin).await;

    // Holding admin in project A grants nothing in project B
    let err = fixture
        .guard
        .resolve_role(admin_in_a, project_b)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::NotAMember(p) if p == project_b));
}
