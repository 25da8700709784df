//! End-to-end flows through the domain actions: sign up, create an
//! organization, invite, accept, and operate under the resolved tenant
//! context.

use std::sync::Arc;

use atrium::{
    auth::{AuthError, IdentityProvider, LocalIdentityProvider, SessionHandle,
           require_org_context},
    authz::Permission,
    config::AuthConfig,
    db::DbPool,
    domains::{ActionState, RawInput, auth, invitations, members, org, projects},
    models::OrgRole,
    services::{MemoryMailer, Services},
};

struct World {
    services: Services,
    provider: Arc<dyn IdentityProvider>,
    mailer: Arc<MemoryMailer>,
}

static TRACING: std::sync::Once = std::sync::Once::new();

async fn world() -> World {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let db = Arc::new(DbPool::from_sqlite(pool));
    let mailer = Arc::new(MemoryMailer::new());
    let config = AuthConfig::default();
    let provider: Arc<dyn IdentityProvider> = Arc::new(LocalIdentityProvider::new(
        Arc::clone(&db),
        mailer.clone(),
        &config,
    ));
    let services = Services::new(db, mailer.clone(), &config);

    World {
        services,
        provider,
        mailer,
    }
}

async fn signed_up(w: &World, email: &str) -> SessionHandle {
    let session = w
        .provider
        .sign_up(email, "a strong password")
        .await
        .expect("Failed to sign up");
    SessionHandle::new(Arc::clone(&w.provider), session)
}

fn raw(pairs: &[(&str, &str)]) -> RawInput {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn create_org_derives_slug_from_name() {
    let w = world().await;
    let mut owner = signed_up(&w, "owner@example.com").await;

    let state = org::action(
        &w.services,
        &mut owner,
        raw(&[("operation", "create"), ("name", "Acme Inc.")]),
    )
    .await;

    match state {
        ActionState::Success {
            data: Some(org::OrgData::Created(created)),
            ..
        } => {
            assert_eq!(created.slug, "acme-inc");
            assert_eq!(created.name, "Acme Inc.");
        }
        other => panic!("Expected created org, got {:?}", other),
    }

    // The creator comes out of the flow with the org active and owning it
    let context = require_org_context(&mut owner)
        .await
        .expect("Owner should have an active org");
    assert_eq!(context.role, Some(OrgRole::Owner));
}

#[tokio::test]
async fn create_org_rejects_one_char_name_per_field() {
    let w = world().await;
    let mut owner = signed_up(&w, "owner@example.com").await;

    let state = org::action(&w.services, &mut owner, raw(&[("name", "A")])).await;

    match state {
        ActionState::Error {
            message,
            field_errors,
            default_values,
        } => {
            assert_eq!(message, "Please check your input.");
            assert_eq!(
                field_errors["name"],
                vec!["Name must be at least 2 characters"]
            );
            // Submitted values come back so the form can re-render
            assert_eq!(default_values["name"], "A");
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn context_fails_closed_for_a_fresh_user() {
    let w = world().await;
    let mut fresh = signed_up(&w, "new@example.com").await;

    // No memberships anywhere: even after the refresh step there is no
    // org to resolve, and that surfaces as the user-correctable error.
    let result = require_org_context(&mut fresh).await;
    assert!(matches!(result, Err(AuthError::NoOrgSelected)));
}

#[tokio::test]
async fn switch_is_idempotent() {
    let w = world().await;
    let mut owner = signed_up(&w, "owner@example.com").await;

    let first = create_org(&w, &mut owner, "First Org").await;
    create_org(&w, &mut owner, "Second Org").await;

    for _ in 0..2 {
        let state = org::action(
            &w.services,
            &mut owner,
            raw(&[("operation", "switch"), ("org_id", &first.to_string())]),
        )
        .await;
        match state {
            ActionState::Success {
                data: Some(org::OrgData::Switched { org_id, role }),
                ..
            } => {
                assert_eq!(org_id, first);
                assert_eq!(role, OrgRole::Owner);
            }
            other => panic!("Expected switch success, got {:?}", other),
        }
    }

    let context = require_org_context(&mut owner).await.unwrap();
    assert_eq!(context.org_id, first);
}

#[tokio::test]
async fn switch_to_foreign_org_fails() {
    let w = world().await;
    let mut alice = signed_up(&w, "alice@example.com").await;
    let mut bob = signed_up(&w, "bob@example.com").await;

    let alices_org = create_org(&w, &mut alice, "Alice Org").await;

    let state = org::action(
        &w.services,
        &mut bob,
        raw(&[("operation", "switch"), ("org_id", &alices_org.to_string())]),
    )
    .await;

    match state {
        ActionState::Error { message, .. } => {
            assert_eq!(message, "You are not a member of this organization");
        }
        other => panic!("Expected error, got {:?}", other),
    }
}

#[tokio::test]
async fn invite_accept_and_member_permissions() {
    let w = world().await;
    let mut owner = signed_up(&w, "owner@example.com").await;
    let org_id = create_org(&w, &mut owner, "Acme Inc.").await;

    // Owner invites
    let state = invitations::action(
        &w.services,
        &mut owner,
        raw(&[("operation", "create"), ("email", "guest@example.com")]),
    )
    .await;
    let invitation = match state {
        ActionState::Success {
            data: Some(invitations::InvitationData::Sent(invitation)),
            ..
        } => invitation,
        other => panic!("Expected sent invitation, got {:?}", other),
    };
    assert_eq!(invitation.role, OrgRole::Member);
    let outbox = w.mailer.outbox();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].to, "guest@example.com");

    // The invitee signs up and accepts
    let mut guest = signed_up(&w, "guest@example.com").await;
    let state = invitations::action(
        &w.services,
        &mut guest,
        raw(&[
            ("operation", "accept"),
            ("token", &invitation.token.to_string()),
        ]),
    )
    .await;
    match state {
        ActionState::Success {
            data: Some(invitations::InvitationData::Accepted { organization_id, role }),
            ..
        } => {
            assert_eq!(organization_id, org_id);
            assert_eq!(role, OrgRole::Member);
        }
        other => panic!("Expected accepted invitation, got {:?}", other),
    }

    // Accepting lands the guest in the org with member permissions
    let context = require_org_context(&mut guest).await.unwrap();
    assert_eq!(context.org_id, org_id);
    assert_eq!(context.role, Some(OrgRole::Member));
    assert!(guest.has_permission(Permission::ProjectsCreate));
    assert!(!guest.has_permission(Permission::MembersInvite));

    // And the permission check holds at the action layer too
    let state = invitations::action(
        &w.services,
        &mut guest,
        raw(&[("operation", "create"), ("email", "other@example.com")]),
    )
    .await;
    assert!(state.is_error());
}

#[tokio::test]
async fn duplicate_pending_invitation_is_a_conflict() {
    let w = world().await;
    let mut owner = signed_up(&w, "owner@example.com").await;
    create_org(&w, &mut owner, "Acme Inc.").await;

    let first = invitations::action(
        &w.services,
        &mut owner,
        raw(&[("operation", "create"), ("email", "guest@example.com")]),
    )
    .await;
    assert!(first.is_success());

    let second = invitations::action(
        &w.services,
        &mut owner,
        raw(&[("operation", "create"), ("email", "guest@example.com")]),
    )
    .await;
    match second {
        ActionState::Error { message, .. } => {
            assert_eq!(message, "An invitation has already been sent to this email");
        }
        other => panic!("Expected conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn deleting_active_org_clears_context() {
    let w = world().await;
    let mut owner = signed_up(&w, "owner@example.com").await;
    let org_id = create_org(&w, &mut owner, "Doomed Org").await;

    let state = org::action(
        &w.services,
        &mut owner,
        raw(&[("operation", "delete"), ("org_id", &org_id.to_string())]),
    )
    .await;
    assert!(state.is_success());

    let result = require_org_context(&mut owner).await;
    assert!(matches!(result, Err(AuthError::NoOrgSelected)));
}

#[tokio::test]
async fn viewer_is_read_only_for_projects() {
    let w = world().await;
    let mut owner = signed_up(&w, "owner@example.com").await;
    let org_id = create_org(&w, &mut owner, "Acme Inc.").await;

    // Owner creates a project
    let state = projects::action(
        &w.services,
        &mut owner,
        raw(&[("name", "Launch plan")]),
    )
    .await;
    assert!(state.is_success());

    // Owner invites a viewer, who accepts
    let state = invitations::action(
        &w.services,
        &mut owner,
        raw(&[
            ("operation", "create"),
            ("email", "viewer@example.com"),
            ("role", "viewer"),
        ]),
    )
    .await;
    let invitation = match state {
        ActionState::Success {
            data: Some(invitations::InvitationData::Sent(invitation)),
            ..
        } => invitation,
        other => panic!("Expected sent invitation, got {:?}", other),
    };

    let mut viewer = signed_up(&w, "viewer@example.com").await;
    let state = invitations::action(
        &w.services,
        &mut viewer,
        raw(&[
            ("operation", "accept"),
            ("token", &invitation.token.to_string()),
        ]),
    )
    .await;
    assert!(state.is_success());
    let context = require_org_context(&mut viewer).await.unwrap();
    assert_eq!(context.org_id, org_id);

    // Listing works, creating does not
    let state = projects::action(&w.services, &mut viewer, raw(&[("operation", "list")])).await;
    match state {
        ActionState::Success {
            data: Some(projects::ProjectData::Listed(list)),
            ..
        } => assert_eq!(list.len(), 1),
        other => panic!("Expected project list, got {:?}", other),
    }

    let state = projects::action(
        &w.services,
        &mut viewer,
        raw(&[("name", "Not allowed")]),
    )
    .await;
    assert!(state.is_error());
}

#[tokio::test]
async fn members_can_be_managed_after_acceptance() {
    let w = world().await;
    let mut owner = signed_up(&w, "owner@example.com").await;
    create_org(&w, &mut owner, "Acme Inc.").await;

    let state = invitations::action(
        &w.services,
        &mut owner,
        raw(&[("operation", "create"), ("email", "guest@example.com")]),
    )
    .await;
    let invitation = match state {
        ActionState::Success {
            data: Some(invitations::InvitationData::Sent(invitation)),
            ..
        } => invitation,
        other => panic!("Expected sent invitation, got {:?}", other),
    };

    let mut guest = signed_up(&w, "guest@example.com").await;
    let state = invitations::action(
        &w.services,
        &mut guest,
        raw(&[
            ("operation", "accept"),
            ("token", &invitation.token.to_string()),
        ]),
    )
    .await;
    assert!(state.is_success());
    let guest_id = guest.user_id();

    // Owner promotes the guest to admin
    let state = members::action(
        &w.services,
        &mut owner,
        raw(&[
            ("operation", "update-role"),
            ("user_id", &guest_id.to_string()),
            ("role", "admin"),
        ]),
    )
    .await;
    match state {
        ActionState::Success {
            data: Some(members::MemberData::RoleUpdated(member)),
            ..
        } => assert_eq!(member.role, OrgRole::Admin),
        other => panic!("Expected role update, got {:?}", other),
    }

    // And removes them again
    let state = members::action(
        &w.services,
        &mut owner,
        raw(&[
            ("operation", "remove"),
            ("user_id", &guest_id.to_string()),
        ]),
    )
    .await;
    assert!(state.is_success());
}

#[tokio::test]
async fn auth_actions_cover_the_session_lifecycle() {
    let w = world().await;

    // Signup through the form action
    let state = auth::action(
        &w.provider,
        None,
        raw(&[
            ("operation", "signup"),
            ("email", "new@example.com"),
            ("password", "long enough"),
            ("confirm_password", "long enough"),
        ]),
    )
    .await;
    let session = match state {
        ActionState::Success {
            data: Some(auth::AuthData::SignedIn(session)),
            ..
        } => session,
        other => panic!("Expected signed-in session, got {:?}", other),
    };
    assert_eq!(session.email, "new@example.com");

    // Wrong password does not leak which part was wrong
    let state = auth::action(
        &w.provider,
        None,
        raw(&[
            ("operation", "login"),
            ("email", "new@example.com"),
            ("password", "wrong password"),
        ]),
    )
    .await;
    match state {
        ActionState::Error { message, .. } => {
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("Expected error, got {:?}", other),
    }

    // Magic link lands in the outbox with the advertised banner message
    let state = auth::action(
        &w.provider,
        None,
        raw(&[("operation", "magic-link"), ("email", "new@example.com")]),
    )
    .await;
    match state {
        ActionState::Success { message, .. } => {
            assert_eq!(message, "Check your email for the magic link");
        }
        other => panic!("Expected success, got {:?}", other),
    }
    assert_eq!(w.mailer.outbox().len(), 1);

    // Logout redirects rather than erroring
    let handle = SessionHandle::new(Arc::clone(&w.provider), session);
    let state = auth::action(&w.provider, Some(handle), raw(&[("operation", "logout")])).await;
    assert_eq!(
        state_redirect(&state),
        Some("/login"),
        "got {:?} instead of a redirect",
        state
    );
}

fn state_redirect<T>(state: &ActionState<T>) -> Option<&str> {
    match state {
        ActionState::Redirect { to } => Some(to.as_str()),
        _ => None,
    }
}

async fn create_org(w: &World, handle: &mut SessionHandle, name: &str) -> uuid::Uuid {
    let state = org::action(
        &w.services,
        handle,
        raw(&[("operation", "create"), ("name", name)]),
    )
    .await;
    match state {
        ActionState::Success {
            data: Some(org::OrgData::Created(created)),
            ..
        } => created.id,
        other => panic!("Expected created org, got {:?}", other),
    }
}
