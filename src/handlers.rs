pub mod auth;
pub mod leads;
pub mod submission;

#[cfg(test)]
pub(crate) mod test_support {
    use std::{sync::Arc, time::Duration};

    use uuid::Uuid;

    use crate::{
        common::retry::RetryPolicy,
        config::{AppState, Backends, Policies},
        db::memory::{MemoryLeadStore, MemoryRoleStore, MemoryUserStore},
        services::submission::tests::ScriptedTransformer,
    };

    pub const JWT_SECRET: &str = "segredo-dos-testes";

    /// Estado completo da aplicação sobre as implementações em memória.
    pub struct Harness {
        pub state: AppState,
        pub leads: Arc<MemoryLeadStore>,
        pub roles: Arc<MemoryRoleStore>,
        pub transformer: Arc<ScriptedTransformer>,
        pub admin_id: Uuid,
    }

    impl Harness {
        pub fn new(transformer: ScriptedTransformer) -> Self {
            let admin_id = Uuid::new_v4();
            let leads = Arc::new(MemoryLeadStore::new());
            let users = Arc::new(MemoryUserStore::with_user(admin_id, "admin@x.com"));
            let roles = Arc::new(MemoryRoleStore::with_admin(admin_id));
            let transformer = Arc::new(transformer);

            let backends = Backends {
                leads: leads.clone(),
                users,
                roles: roles.clone(),
                transformer: transformer.clone(),
            };
            let policies = Policies {
                generation_limit: 3,
                max_image_bytes: 1024,
                generation_retry: RetryPolicy::fixed(3, Duration::ZERO),
                store_retry: RetryPolicy::linear(3, Duration::ZERO),
            };

            Self {
                state: AppState::new(backends, JWT_SECRET.to_string(), policies),
                leads,
                roles,
                transformer,
                admin_id,
            }
        }

        pub fn admin_token(&self) -> String {
            self.state.auth_service.create_token(self.admin_id).unwrap()
        }
    }
}
