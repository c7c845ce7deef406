use std::sync::Arc;

use bson::oid::ObjectId;
use sitedesk_db::models::UserRole;
use sitedesk_services::notify::{Directory, FallbackStyle, NameResolver};

use crate::fixtures::{self, memory::MemoryDirectory};

fn resolver(directory: MemoryDirectory, fallback: FallbackStyle) -> NameResolver {
    let directory: Arc<dyn Directory> = Arc::new(directory);
    NameResolver::new(directory, fallback)
}

#[tokio::test]
async fn auth_id_match_wins() {
    let uid = ObjectId::new();
    let directory = MemoryDirectory::default().with_users(vec![fixtures::user(
        uid,
        "Alice Mason",
        Some("auth0|alice"),
        UserRole::Member,
    )]);
    let names = resolver(directory, FallbackStyle::Sentinel);

    assert_eq!(names.resolve_user_name("auth0|alice").await, "Alice Mason");
}

#[tokio::test]
async fn object_id_match_is_second_in_the_chain() {
    let uid = ObjectId::new();
    let directory = MemoryDirectory::default().with_users(vec![fixtures::user(
        uid,
        "Bob Turner",
        None,
        UserRole::Member,
    )]);
    let names = resolver(directory, FallbackStyle::Sentinel);

    assert_eq!(names.resolve_user_name(&uid.to_hex()).await, "Bob Turner");
}

#[tokio::test]
async fn profile_is_the_last_lookup_source() {
    let directory = MemoryDirectory::default()
        .with_profiles(vec![fixtures::profile("auth0|carol", "Carol Weiss")]);
    let names = resolver(directory, FallbackStyle::Sentinel);

    assert_eq!(names.resolve_user_name("auth0|carol").await, "Carol Weiss");
}

#[tokio::test]
async fn blank_user_name_falls_through_to_profile() {
    let uid = ObjectId::new();
    let mut user = fixtures::user(uid, "placeholder", Some("auth0|dana"), UserRole::Member);
    user.name = Some("   ".to_string());

    let directory = MemoryDirectory::default()
        .with_users(vec![user])
        .with_profiles(vec![fixtures::profile("auth0|dana", "Dana Fox")]);
    let names = resolver(directory, FallbackStyle::Sentinel);

    assert_eq!(names.resolve_user_name("auth0|dana").await, "Dana Fox");
}

#[tokio::test]
async fn exhausted_chain_uses_sentinel_fallback() {
    let names = resolver(MemoryDirectory::default(), FallbackStyle::Sentinel);
    assert_eq!(names.resolve_user_name("auth0|nobody").await, "Unknown User");
}

#[tokio::test]
async fn exhausted_chain_uses_truncated_id_fallback() {
    let names = resolver(MemoryDirectory::default(), FallbackStyle::TruncatedId);
    assert_eq!(
        names.resolve_user_name("auth0|1234567890").await,
        "User auth0|12..."
    );
}

#[tokio::test]
async fn project_name_resolves_and_degrades() {
    let pid = ObjectId::new();
    let directory = MemoryDirectory::default()
        .with_projects(vec![fixtures::project(pid, "Riverside House", None)]);
    let names = resolver(directory, FallbackStyle::Sentinel);

    assert_eq!(names.resolve_project_name(pid).await, "Riverside House");
    assert_eq!(
        names.resolve_project_name(ObjectId::new()).await,
        "Unknown Project"
    );
}
