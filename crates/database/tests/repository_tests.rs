use gatehouse_config::DatabaseConfig;
use gatehouse_database::{
    department_repository, identity_repository, initialize_database, profile_repository,
    DatabaseError, NewDepartment, NewIdentity, NewProfile, Role, VerificationStatus,
};
use sqlx::SqlitePool;
use tempfile::TempDir;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

struct TestContext {
    pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("repos.sqlite").display()),
            max_connections: 4,
        };
        let pool = initialize_database(&config).await?;
        Ok(Self {
            pool,
            _temp_dir: temp_dir,
        })
    }
}

fn new_identity(email: &str, username: &str, role: Role) -> NewIdentity {
    NewIdentity {
        email: email.to_string(),
        username: username.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        role,
    }
}

#[tokio::test]
async fn insert_and_find_identity() -> TestResult {
    let ctx = TestContext::new().await?;

    let created =
        identity_repository::insert(&ctx.pool, &new_identity("a@x.com", "alice", Role::User))
            .await?;
    assert!(!created.is_verified);
    assert_eq!(created.verification_status, VerificationStatus::Pending);
    assert!(!created.public_id.is_empty());

    let by_email = identity_repository::find_by_email(&ctx.pool, "a@x.com")
        .await?
        .expect("identity by email");
    assert_eq!(by_email.id, created.id);
    assert_eq!(by_email.role, Role::User);

    let by_public = identity_repository::find_by_public_id(&ctx.pool, &created.public_id)
        .await?
        .expect("identity by public id");
    assert_eq!(by_public.email, "a@x.com");

    assert!(identity_repository::find_by_email(&ctx.pool, "missing@x.com")
        .await?
        .is_none());
    Ok(())
}

#[tokio::test]
async fn unique_constraints_surface_as_duplicates() -> TestResult {
    let ctx = TestContext::new().await?;
    identity_repository::insert(&ctx.pool, &new_identity("a@x.com", "alice", Role::User)).await?;

    let same_email =
        identity_repository::insert(&ctx.pool, &new_identity("a@x.com", "other", Role::User)).await;
    assert!(matches!(same_email, Err(DatabaseError::Duplicate(_))));

    let same_username =
        identity_repository::insert(&ctx.pool, &new_identity("b@x.com", "alice", Role::Admin))
            .await;
    assert!(matches!(same_username, Err(DatabaseError::Duplicate(_))));

    assert!(
        identity_repository::exists_by_email_or_username(&ctx.pool, "zzz@x.com", "alice").await?
    );
    assert!(identity_repository::exists_by_email_or_username(&ctx.pool, "a@x.com", "zzz").await?);
    assert!(
        !identity_repository::exists_by_email_or_username(&ctx.pool, "c@x.com", "carol").await?
    );
    Ok(())
}

#[tokio::test]
async fn mark_verified_only_succeeds_once() -> TestResult {
    let ctx = TestContext::new().await?;
    let identity =
        identity_repository::insert(&ctx.pool, &new_identity("a@x.com", "alice", Role::User))
            .await?;

    assert!(identity_repository::mark_verified(&ctx.pool, identity.id).await?);
    assert!(!identity_repository::mark_verified(&ctx.pool, identity.id).await?);

    let stored = identity_repository::find_by_id(&ctx.pool, identity.id)
        .await?
        .expect("identity");
    assert!(stored.is_verified);
    assert_eq!(stored.verification_status, VerificationStatus::Verified);
    Ok(())
}

#[tokio::test]
async fn rejected_identity_cannot_be_verified() -> TestResult {
    let ctx = TestContext::new().await?;
    let identity =
        identity_repository::insert(&ctx.pool, &new_identity("s@x.com", "staff", Role::Staff))
            .await?;

    assert!(identity_repository::mark_rejected(&ctx.pool, identity.id).await?);
    assert!(!identity_repository::mark_verified(&ctx.pool, identity.id).await?);
    assert!(!identity_repository::mark_rejected(&ctx.pool, identity.id).await?);

    let stored = identity_repository::find_by_id(&ctx.pool, identity.id)
        .await?
        .expect("identity");
    assert!(!stored.is_verified);
    assert_eq!(stored.verification_status, VerificationStatus::Rejected);
    Ok(())
}

#[tokio::test]
async fn verified_flag_and_status_cannot_disagree() -> TestResult {
    let ctx = TestContext::new().await?;
    let identity =
        identity_repository::insert(&ctx.pool, &new_identity("a@x.com", "alice", Role::User))
            .await?;

    let result = sqlx::query("UPDATE identities SET is_verified = 1 WHERE id = ?")
        .bind(identity.id)
        .execute(&ctx.pool)
        .await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn department_cascade_targets_owner_only() -> TestResult {
    let ctx = TestContext::new().await?;
    let first =
        identity_repository::insert(&ctx.pool, &new_identity("a1@x.com", "admin1", Role::Admin))
            .await?;
    let second =
        identity_repository::insert(&ctx.pool, &new_identity("a2@x.com", "admin2", Role::Admin))
            .await?;

    let owned = department_repository::insert(
        &ctx.pool,
        &NewDepartment {
            name: "Radiology".into(),
            description: "Imaging".into(),
            admin_identity_id: first.id,
        },
    )
    .await?;
    let other = department_repository::insert(
        &ctx.pool,
        &NewDepartment {
            name: "Cardiology".into(),
            description: String::new(),
            admin_identity_id: second.id,
        },
    )
    .await?;

    assert_eq!(department_repository::mark_verified_for_admin(&ctx.pool, first.id).await?, 1);
    // idempotent
    assert_eq!(department_repository::mark_verified_for_admin(&ctx.pool, first.id).await?, 1);

    let owned = department_repository::find_by_id(&ctx.pool, owned.id)
        .await?
        .expect("owned department");
    let other = department_repository::find_by_id(&ctx.pool, other.id)
        .await?
        .expect("other department");
    assert_eq!(owned.verification_status, VerificationStatus::Verified);
    assert_eq!(other.verification_status, VerificationStatus::Pending);

    let verified =
        department_repository::list_by_status(&ctx.pool, VerificationStatus::Verified).await?;
    assert_eq!(verified.len(), 1);
    assert_eq!(verified[0].name, "Radiology");

    let orphan =
        identity_repository::insert(&ctx.pool, &new_identity("a3@x.com", "admin3", Role::Admin))
            .await?;
    assert_eq!(department_repository::mark_verified_for_admin(&ctx.pool, orphan.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn admin_owns_at_most_one_department() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin =
        identity_repository::insert(&ctx.pool, &new_identity("a@x.com", "admin", Role::Admin))
            .await?;
    let request = NewDepartment {
        name: "Radiology".into(),
        description: String::new(),
        admin_identity_id: admin.id,
    };
    department_repository::insert(&ctx.pool, &request).await?;

    let second = department_repository::insert(&ctx.pool, &request).await;
    assert!(matches!(second, Err(DatabaseError::Duplicate(_))));
    Ok(())
}

#[tokio::test]
async fn staff_listing_filters_by_department_and_status() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin =
        identity_repository::insert(&ctx.pool, &new_identity("a@x.com", "admin", Role::Admin))
            .await?;
    let department = department_repository::insert(
        &ctx.pool,
        &NewDepartment {
            name: "Radiology".into(),
            description: String::new(),
            admin_identity_id: admin.id,
        },
    )
    .await?;

    let mut staff_ids = Vec::new();
    for (email, username) in [("s1@x.com", "staff1"), ("s2@x.com", "staff2")] {
        let staff =
            identity_repository::insert(&ctx.pool, &new_identity(email, username, Role::Staff))
                .await?;
        profile_repository::insert(
            &ctx.pool,
            &NewProfile {
                identity_id: staff.id,
                name: format!("Staff {username}"),
                phone: Some("555-0100".into()),
                department_id: Some(department.id),
            },
        )
        .await?;
        staff_ids.push(staff.id);
    }

    let mut tx = ctx.pool.begin().await?;
    assert!(identity_repository::mark_verified(&mut *tx, staff_ids[0]).await?);
    assert!(profile_repository::set_approved_by(&mut *tx, staff_ids[0], admin.id).await?);
    tx.commit().await?;

    let pending = profile_repository::list_staff_by_department(
        &ctx.pool,
        department.id,
        VerificationStatus::Pending,
    )
    .await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].email, "s2@x.com");
    assert_eq!(pending[0].name, "Staff staff2");

    let approved = profile_repository::find_by_identity(&ctx.pool, staff_ids[0])
        .await?
        .expect("profile");
    assert_eq!(approved.approved_by, Some(admin.id));
    assert_eq!(approved.department_id, Some(department.id));
    Ok(())
}

#[tokio::test]
async fn rolled_back_transaction_leaves_nothing_behind() -> TestResult {
    let ctx = TestContext::new().await?;

    let mut tx = ctx.pool.begin().await?;
    let identity =
        identity_repository::insert(&mut *tx, &new_identity("a@x.com", "alice", Role::Admin))
            .await?;
    profile_repository::insert(
        &mut *tx,
        &NewProfile {
            identity_id: identity.id,
            name: "Alice".into(),
            phone: None,
            department_id: None,
        },
    )
    .await?;
    tx.rollback().await?;

    assert_eq!(identity_repository::count_by_email(&ctx.pool, "a@x.com").await?, 0);
    assert_eq!(profile_repository::count_for_identity(&ctx.pool, identity.id).await?, 0);
    assert_eq!(department_repository::count(&ctx.pool).await?, 0);
    Ok(())
}

#[tokio::test]
async fn profile_requires_existing_department() -> TestResult {
    let ctx = TestContext::new().await?;
    let staff =
        identity_repository::insert(&ctx.pool, &new_identity("s@x.com", "staff", Role::Staff))
            .await?;

    let result = profile_repository::insert(
        &ctx.pool,
        &NewProfile {
            identity_id: staff.id,
            name: "Staff".into(),
            phone: None,
            department_id: Some(9_999),
        },
    )
    .await;
    assert!(result.is_err());
    Ok(())
}
