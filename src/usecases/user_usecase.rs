use std::sync::Arc;

use uuid::Uuid;

use crate::{
    authentication::auth::{hash_password, verify_password, TokenService},
    caller::Caller,
    data_access::user_repository::UserRepository,
    login_request::LoginRequest,
    register_request::RegisterRequest,
    role::Role,
    settings::Timeouts,
    shared::validation::{validate_email, validate_password},
    update_user_request::UpdateUserRequest,
    usecases::task_usecase::bounded,
    user::{normalize_email, User},
    DomainError, DomainResult, TaskUsecase,
};

/// Accounts, credentials, and the task cascade that follows an account out the door.
#[derive(Clone)]
pub struct UserUsecase {
    repository: Arc<dyn UserRepository>,
    tasks: TaskUsecase,
    tokens: TokenService,
    timeouts: Timeouts,
}

impl UserUsecase {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        tasks: TaskUsecase,
        tokens: TokenService,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            repository,
            tasks,
            tokens,
            timeouts,
        }
    }

    /// Self-service sign-up. Always a regular account.
    pub async fn register(&self, request: RegisterRequest) -> DomainResult<User> {
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        let user = User::new(&request.email, hash_password(&request.password).await?, Role::Regular);
        bounded(
            self.timeouts.user_create,
            self.repository.create(&user),
            DomainError::from_user_repository,
        )
        .await?;

        tracing::info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn login(&self, request: LoginRequest) -> DomainResult<(User, String)> {
        let email = normalize_email(&request.email);
        let user = match bounded(
            self.timeouts.user_login,
            self.repository.get_by_email(&email),
            DomainError::from_user_repository,
        )
        .await
        {
            Ok(user) => user,
            Err(DomainError::UserNotFound) => return Err(DomainError::Unauthenticated),
            Err(e) => return Err(e),
        };

        if !verify_password(&request.password, &user.password_hash).await {
            tracing::warn!(email = %email, "login rejected");
            return Err(DomainError::Unauthenticated);
        }

        let token = self
            .tokens
            .create_token(&user)
            .map_err(|e| DomainError::InternalServer(format!("token signing failed: {e}")))?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }

    /// Verify a bearer token and resolve it against the stored account.
    ///
    /// The role comes from the stored record, not the token, and a token whose account
    /// is gone is rejected.
    pub async fn authenticate(&self, token: &str) -> DomainResult<Caller> {
        let claims = self.tokens.verify_token(token).map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            DomainError::Unauthenticated
        })?;

        match self.fetch(claims.sub).await {
            Ok(user) => Ok(user.caller()),
            Err(DomainError::UserNotFound) => Err(DomainError::Unauthenticated),
            Err(e) => Err(e),
        }
    }

    pub async fn update_account(&self, caller: &Caller, request: UpdateUserRequest) -> DomainResult<User> {
        let mut user = self.fetch(caller.id).await?;

        if let Some(email) = &request.email {
            validate_email(email)?;
        }
        if let Some(password) = &request.password {
            validate_password(password)?;
        }

        if let Some(email) = request.email {
            user.email = normalize_email(&email);
        }
        if let Some(password) = request.password {
            user.password_hash = hash_password(&password).await?;
        }

        bounded(
            self.timeouts.user_create,
            self.repository.update(&user),
            DomainError::from_user_repository,
        )
        .await?;

        tracing::info!(user_id = %user.id, "account updated");
        Ok(user)
    }

    /// Remove the caller's own account after re-checking their password.
    pub async fn delete_account(&self, caller: &Caller, password: &str) -> DomainResult<()> {
        let user = self.fetch(caller.id).await?;
        if !verify_password(password, &user.password_hash).await {
            tracing::warn!(user_id = %user.id, "account deletion rejected");
            return Err(DomainError::Unauthenticated);
        }
        self.remove(user.id).await
    }

    pub async fn delete_user(&self, caller: &Caller, id: Uuid) -> DomainResult<()> {
        if !caller.is_admin() {
            tracing::warn!(caller = %caller.id, target = %id, "non-admin attempted to delete a user");
            return Err(DomainError::AccessDenied);
        }
        let user = self.fetch(id).await?;
        self.remove(user.id).await
    }

    /// Seed an admin account when the store has no users at all. Returns whether one was created.
    pub async fn ensure_default_admin(&self, email: &str, password: &str) -> DomainResult<bool> {
        let count = bounded(
            self.timeouts.user_login,
            self.repository.count(),
            DomainError::from_user_repository,
        )
        .await?;
        if count > 0 {
            return Ok(false);
        }

        let admin = User::new(email, hash_password(password).await?, Role::Admin);
        bounded(
            self.timeouts.user_create,
            self.repository.create(&admin),
            DomainError::from_user_repository,
        )
        .await?;

        tracing::info!(email = %admin.email, "default admin created");
        Ok(true)
    }

    async fn fetch(&self, id: Uuid) -> DomainResult<User> {
        bounded(
            self.timeouts.user_login,
            self.repository.get_by_id(id),
            DomainError::from_user_repository,
        )
        .await
    }

    // The account goes first. A task create racing this either lands before the sweep below
    // or finds its owner missing and removes itself, so no task outlives its owner.
    async fn remove(&self, id: Uuid) -> DomainResult<()> {
        bounded(
            self.timeouts.user_delete,
            self.repository.delete(id),
            DomainError::from_user_repository,
        )
        .await?;
        let removed_tasks = self.tasks.delete_all_for_owner(id).await?;

        tracing::info!(user_id = %id, removed_tasks, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        create_task_request::CreateTaskRequest,
        data_access::memory_repository::{MemoryTaskRepository, MemoryUserRepository},
        ValidationError,
    };

    const PASSWORD: &str = "password123";

    fn usecases() -> (UserUsecase, TaskUsecase) {
        let accounts = Arc::new(MemoryUserRepository::new());
        let tasks = TaskUsecase::new(
            Arc::new(MemoryTaskRepository::new()),
            accounts.clone(),
            Timeouts::default(),
        );
        let users = UserUsecase::new(
            accounts,
            tasks.clone(),
            TokenService::new("test-secret", 60),
            Timeouts::default(),
        );
        (users, tasks)
    }

    fn sign_up(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: PASSWORD.to_string(),
        }
    }

    fn sign_in(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn titled(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn registration_is_regular_and_unique() {
        let (users, _) = usecases();

        let user = users.register(sign_up("U1@Example.com")).await.unwrap();
        assert_eq!(user.role, Role::Regular);
        assert_eq!(user.email, "u1@example.com");

        assert_eq!(users.register(sign_up("u1@example.com")).await, Err(DomainError::UserExists));
    }

    #[tokio::test]
    async fn registration_validates_credentials() {
        let (users, _) = usecases();

        assert_eq!(
            users.register(sign_up("no-at-sign")).await,
            Err(DomainError::InvalidPayload(ValidationError::InvalidEmail))
        );
        let short = RegisterRequest {
            email: "u1@example.com".into(),
            password: "short".into(),
        };
        assert!(matches!(
            users.register(short).await,
            Err(DomainError::InvalidPayload(ValidationError::PasswordTooShort { .. }))
        ));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (users, _) = usecases();
        users.register(sign_up("u1@example.com")).await.unwrap();

        assert_eq!(
            users.login(sign_in("u1@example.com", "wrong-password")).await,
            Err(DomainError::Unauthenticated)
        );
        assert_eq!(
            users.login(sign_in("ghost@example.com", PASSWORD)).await,
            Err(DomainError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn login_token_authenticates() {
        let (users, _) = usecases();
        let user = users.register(sign_up("u1@example.com")).await.unwrap();

        let (logged_in, token) = users.login(sign_in("U1@example.com", PASSWORD)).await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let caller = users.authenticate(&token).await.unwrap();
        assert_eq!(caller, Caller::regular(user.id));
        assert_eq!(users.authenticate("garbage").await, Err(DomainError::Unauthenticated));
    }

    #[tokio::test]
    async fn deleted_account_cascades_and_revokes_token() {
        let (users, tasks) = usecases();
        let user = users.register(sign_up("u1@example.com")).await.unwrap();
        let (_, token) = users.login(sign_in("u1@example.com", PASSWORD)).await.unwrap();
        let caller = users.authenticate(&token).await.unwrap();
        tasks.create(&caller, titled("a")).await.unwrap();
        tasks.create(&caller, titled("b")).await.unwrap();

        assert_eq!(
            users.delete_account(&caller, "wrong-password").await,
            Err(DomainError::Unauthenticated)
        );
        users.delete_account(&caller, PASSWORD).await.unwrap();

        let admin = Caller::admin(Uuid::new_v4());
        let remaining = tasks.get_all_for_caller(&admin).await.unwrap();
        assert!(remaining.iter().all(|t| t.owner != user.id));
        assert_eq!(users.authenticate(&token).await, Err(DomainError::Unauthenticated));
    }

    #[tokio::test]
    async fn create_after_account_deletion_is_refused() {
        let (users, tasks) = usecases();
        let user = users.register(sign_up("u1@example.com")).await.unwrap();
        let (_, token) = users.login(sign_in("u1@example.com", PASSWORD)).await.unwrap();
        let caller = users.authenticate(&token).await.unwrap();

        // The request authenticated before the account went away.
        users.delete_account(&caller, PASSWORD).await.unwrap();
        assert_eq!(tasks.create(&caller, titled("late")).await, Err(DomainError::Unauthenticated));

        let admin = Caller::admin(Uuid::new_v4());
        let remaining = tasks.get_all_for_caller(&admin).await.unwrap();
        assert!(remaining.iter().all(|t| t.owner != user.id));
    }

    #[tokio::test]
    async fn only_admins_delete_other_users() {
        let (users, tasks) = usecases();
        users.ensure_default_admin("admin@localhost", "adminadmin").await.unwrap();
        let (admin, _) = users.login(sign_in("admin@localhost", "adminadmin")).await.unwrap();
        let victim = users.register(sign_up("u1@example.com")).await.unwrap();
        let bystander = users.register(sign_up("u2@example.com")).await.unwrap();
        tasks.create(&victim.caller(), titled("doomed")).await.unwrap();
        tasks.create(&bystander.caller(), titled("kept")).await.unwrap();

        assert_eq!(
            users.delete_user(&bystander.caller(), victim.id).await,
            Err(DomainError::AccessDenied)
        );
        users.delete_user(&admin.caller(), victim.id).await.unwrap();
        assert_eq!(
            users.delete_user(&admin.caller(), victim.id).await,
            Err(DomainError::UserNotFound)
        );

        let remaining = tasks.get_all_for_caller(&admin.caller()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].owner, bystander.id);
    }

    #[tokio::test]
    async fn account_update_changes_credentials() {
        let (users, _) = usecases();
        let u1 = users.register(sign_up("u1@example.com")).await.unwrap();
        users.register(sign_up("u2@example.com")).await.unwrap();

        let steal = UpdateUserRequest {
            email: Some("u2@example.com".into()),
            password: None,
        };
        assert_eq!(users.update_account(&u1.caller(), steal).await, Err(DomainError::UserExists));

        let change = UpdateUserRequest {
            email: Some("renamed@example.com".into()),
            password: Some("new-password".into()),
        };
        users.update_account(&u1.caller(), change).await.unwrap();

        assert!(users.login(sign_in("renamed@example.com", "new-password")).await.is_ok());
        assert_eq!(
            users.login(sign_in("u1@example.com", PASSWORD)).await,
            Err(DomainError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn default_admin_seeded_once() {
        let (users, _) = usecases();

        assert!(users.ensure_default_admin("admin@localhost", "adminadmin").await.unwrap());
        assert!(!users.ensure_default_admin("admin@localhost", "adminadmin").await.unwrap());

        let (admin, _) = users.login(sign_in("admin@localhost", "adminadmin")).await.unwrap();
        assert_eq!(admin.role, Role::Admin);
    }
}
