// Implementações em memória dos repositórios, usadas nos testes.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU32, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LeadStore, RoleStore, UserStore},
    models::{
        auth::{AppRole, User},
        lead::{
            GenerationRecord, LeadImages, LeadStats, LeadStatus, LeadSummary, LeadUpdate,
            NewGeneration,
        },
    },
};

/// Falha de infraestrutura simulada.
fn outage() -> AppError {
    AppError::DatabaseError(sqlx::Error::PoolTimedOut)
}

/// Contador de chamadas + falhas injetadas.
#[derive(Default)]
pub struct Faults {
    calls: AtomicU32,
    failures_left: AtomicU32,
    always_fail: std::sync::atomic::AtomicBool,
}

impl Faults {
    pub fn fail_next(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn fail_always(&self) {
        self.always_fail.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.always_fail.load(Ordering::SeqCst) {
            return Err(outage());
        }
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(outage());
        }
        Ok(())
    }
}

/// Linha completa da tabela `leads`, com as imagens.
#[derive(Debug, Clone)]
pub struct Lead {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub status: LeadStatus,
    pub photos_generated: i32,
    pub reference_image: Option<String>,
    pub generated_image: Option<String>,
    pub salesperson: Option<String>,
    pub sale_value: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Lead> for LeadSummary {
    fn from(lead: &Lead) -> Self {
        Self {
            id: lead.id,
            email: lead.email.clone(),
            name: lead.name.clone(),
            phone: lead.phone.clone(),
            status: lead.status,
            photos_generated: lead.photos_generated,
            salesperson: lead.salesperson.clone(),
            sale_value: lead.sale_value,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        }
    }
}

#[derive(Default)]
pub struct MemoryLeadStore {
    leads: Mutex<HashMap<Uuid, Lead>>,
    pub faults: Faults,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, lead: Lead) {
        self.leads.lock().unwrap().insert(lead.id, lead);
    }

    pub fn get(&self, id: Uuid) -> Option<Lead> {
        self.leads.lock().unwrap().get(&id).cloned()
    }

    pub fn by_email(&self, email: &str) -> Option<Lead> {
        self.leads
            .lock()
            .unwrap()
            .values()
            .find(|lead| lead.email == email)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.leads.lock().unwrap().len()
    }
}

/// Lead de exemplo, pronto para `MemoryLeadStore::insert`.
pub fn sample_lead(email: &str, photos_generated: i32) -> Lead {
    let now = Utc::now();
    Lead {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: "Maria".to_string(),
        phone: "11999990000".to_string(),
        status: LeadStatus::PhotoGenerated,
        photos_generated,
        reference_image: Some("data:image/png;base64,cmVm".to_string()),
        generated_image: Some("data:image/png;base64,Z2Vu".to_string()),
        salesperson: None,
        sale_value: None,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<LeadSummary>, AppError> {
        self.faults.enter()?;
        Ok(self.by_email(email).as_ref().map(LeadSummary::from))
    }

    async fn record_generation(
        &self,
        generation: &NewGeneration,
        limit: i32,
    ) -> Result<GenerationRecord, AppError> {
        self.faults.enter()?;
        let mut leads = self.leads.lock().unwrap();

        if let Some(lead) = leads.values_mut().find(|lead| lead.email == generation.email) {
            if lead.photos_generated >= limit {
                return Ok(GenerationRecord::LimitReached { count: lead.photos_generated });
            }
            lead.photos_generated += 1;
            lead.reference_image = Some(generation.reference_image.clone());
            lead.generated_image = Some(generation.generated_image.clone());
            // Garante que updated_at avance mesmo com o relógio na mesma marca.
            lead.updated_at = Utc::now().max(lead.updated_at + Duration::microseconds(1));
            return Ok(GenerationRecord::Updated(LeadSummary::from(&*lead)));
        }

        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            email: generation.email.clone(),
            name: generation.name.clone(),
            phone: generation.phone.clone(),
            status: LeadStatus::PhotoGenerated,
            photos_generated: 1,
            reference_image: Some(generation.reference_image.clone()),
            generated_image: Some(generation.generated_image.clone()),
            salesperson: None,
            sale_value: None,
            created_at: now,
            updated_at: now,
        };
        let summary = LeadSummary::from(&lead);
        leads.insert(lead.id, lead);
        Ok(GenerationRecord::Created(summary))
    }

    async fn list(&self, limit: i64) -> Result<Vec<LeadSummary>, AppError> {
        self.faults.enter()?;
        let leads = self.leads.lock().unwrap();
        let mut summaries: Vec<LeadSummary> = leads.values().map(LeadSummary::from).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(summaries)
    }

    async fn get_images(&self, id: Uuid) -> Result<Option<LeadImages>, AppError> {
        self.faults.enter()?;
        Ok(self.get(id).map(|lead| LeadImages {
            reference_image: lead.reference_image,
            generated_image: lead.generated_image,
        }))
    }

    async fn update_fields(
        &self,
        id: Uuid,
        changes: &LeadUpdate,
    ) -> Result<Option<LeadSummary>, AppError> {
        self.faults.enter()?;
        let mut leads = self.leads.lock().unwrap();
        let Some(lead) = leads.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            lead.name = name.clone();
        }
        if let Some(phone) = &changes.phone {
            lead.phone = phone.clone();
        }
        if let Some(status) = changes.status {
            lead.status = status;
        }
        if let Some(salesperson) = &changes.salesperson {
            lead.salesperson = salesperson.clone();
        }
        if let Some(sale_value) = changes.sale_value {
            lead.sale_value = sale_value;
        }
        lead.updated_at = Utc::now().max(lead.updated_at + Duration::microseconds(1));

        Ok(Some(LeadSummary::from(&*lead)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        self.faults.enter()?;
        Ok(self.leads.lock().unwrap().remove(&id).is_some())
    }

    async fn stats(&self) -> Result<LeadStats, AppError> {
        self.faults.enter()?;
        // Mesma agregação do SELECT com FILTER de LeadRepository::stats.
        let leads = self.leads.lock().unwrap();
        let stats = leads.values().fold(LeadStats::default(), |mut stats, lead| {
            stats.photos_generated += i64::from(lead.photos_generated);
            if lead.status != LeadStatus::PhotoGenerated {
                stats.contacts_made += 1;
            }
            match lead.status {
                LeadStatus::SaleCompleted => {
                    stats.sales_completed += 1;
                    stats.revenue += lead.sale_value.unwrap_or_default();
                }
                LeadStatus::SaleLost => stats.sales_lost += 1,
                _ => {}
            }
            stats
        });
        Ok(stats)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    pub faults: Faults,
}

impl MemoryUserStore {
    pub fn with_user(id: Uuid, email: &str) -> Self {
        let store = Self::default();
        let now = Utc::now();
        store.users.lock().unwrap().push(User {
            id,
            email: email.to_string(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        });
        store
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.faults.enter()?;
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.faults.enter()?;
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        self.faults.enter()?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemoryRoleStore {
    admins: Mutex<HashSet<Uuid>>,
    pub faults: Faults,
}

impl MemoryRoleStore {
    pub fn with_admin(user_id: Uuid) -> Self {
        let store = Self::default();
        store.admins.lock().unwrap().insert(user_id);
        store
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn has_role(&self, user_id: Uuid, role: AppRole) -> Result<bool, AppError> {
        self.faults.enter()?;
        Ok(role == AppRole::Admin && self.admins.lock().unwrap().contains(&user_id))
    }

    async fn grant_role(&self, user_id: Uuid, role: AppRole) -> Result<(), AppError> {
        self.faults.enter()?;
        if role == AppRole::Admin {
            self.admins.lock().unwrap().insert(user_id);
        }
        Ok(())
    }
}
