//! In-process stand-ins for the accounts, provider and content services.
//!
//! Standalone mode registers these on an [`InMemoryTransport`] so the
//! orchestrator can be driven end to end without a broker.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use common::PageQuery;
use domain::{
    BlogListQuery, BlogPost, CreateDoctorProfile, CreateStaffAccount, DoctorListQuery,
    DoctorProfile, IdQuery, IdsQuery, ServicePattern, Specialty, StaffAccount, UpstreamPage,
};
use rpc::{InMemoryTransport, RemoteError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Directory {
    accounts: Vec<StaffAccount>,
    doctors: Vec<DoctorProfile>,
    specialties: Vec<Specialty>,
    posts: Vec<BlogPost>,
}

impl Directory {
    fn seeded() -> Self {
        let specialty = |id: &str, name: &str| Specialty {
            id: id.into(),
            name: name.into(),
            slug: Some(name.to_lowercase()),
        };
        let account = |id: &str, email: &str, name: &str, role: &str| StaffAccount {
            id: id.into(),
            email: email.into(),
            full_name: name.into(),
            phone: None,
            role: role.into(),
            is_active: true,
        };
        let doctor = |id: &str, account: &str, degree: &str, specialties: &[&str]| DoctorProfile {
            id: id.into(),
            staff_account_id: account.into(),
            degree: Some(degree.into()),
            position: None,
            years_experience: None,
            specialty_ids: specialties.iter().map(|s| s.to_string()).collect(),
            avatar_url: None,
            is_active: true,
        };
        let post = |id: &str, title: &str, author: &str| BlogPost {
            id: id.into(),
            title: title.into(),
            slug: id.trim_start_matches("b-").into(),
            excerpt: None,
            author_id: author.into(),
            cover_image_url: None,
            published_at: Some(Utc::now()),
        };

        Self {
            accounts: vec![
                account("s-ana", "ana@clinic.test", "Ana Lima", "DOCTOR"),
                account("s-bruno", "bruno@clinic.test", "Bruno Costa", "DOCTOR"),
                account("s-carla", "carla@clinic.test", "Carla Reis", "EDITOR"),
            ],
            doctors: vec![
                doctor("d-ana", "s-ana", "MD", &["sp-cardiology"]),
                doctor("d-bruno", "s-bruno", "MD", &["sp-dermatology", "sp-pediatrics"]),
            ],
            specialties: vec![
                specialty("sp-cardiology", "Cardiology"),
                specialty("sp-dermatology", "Dermatology"),
                specialty("sp-pediatrics", "Pediatrics"),
            ],
            posts: vec![
                post("b-heart-health", "Heart health basics", "s-carla"),
                post("b-sun-care", "Sun care for children", "s-bruno"),
            ],
        }
    }

    fn create_account(&mut self, cmd: CreateStaffAccount) -> rpc::Result<StaffAccount> {
        let pattern = ServicePattern::StaffCreate;
        if self.accounts.iter().any(|a| a.email == cmd.email) {
            return Err(RemoteError::rejected(
                pattern.as_str(),
                409,
                format!("Email {} already registered", cmd.email),
            ));
        }
        let account = StaffAccount {
            id: Uuid::new_v4().to_string(),
            email: cmd.email,
            full_name: cmd.full_name,
            phone: cmd.phone,
            role: cmd.role,
            is_active: true,
        };
        self.accounts.push(account.clone());
        Ok(account)
    }

    fn create_doctor(&mut self, cmd: CreateDoctorProfile) -> rpc::Result<DoctorProfile> {
        let pattern = ServicePattern::DoctorProfileCreate.as_str();
        if !self.accounts.iter().any(|a| a.id == cmd.staff_account_id) {
            return Err(RemoteError::not_found(
                pattern,
                format!("Staff account {} not found", cmd.staff_account_id),
            ));
        }
        if self
            .doctors
            .iter()
            .any(|d| d.staff_account_id == cmd.staff_account_id)
        {
            return Err(RemoteError::rejected(
                pattern,
                409,
                "Doctor profile already exists",
            ));
        }
        if let Some(unknown) = cmd
            .details
            .specialty_ids
            .iter()
            .find(|id| !self.specialties.iter().any(|s| &s.id == *id))
        {
            return Err(RemoteError::rejected(
                pattern,
                422,
                format!("Unknown specialty {unknown}"),
            ));
        }

        let details = cmd.details;
        let profile = DoctorProfile {
            id: Uuid::new_v4().to_string(),
            staff_account_id: cmd.staff_account_id,
            degree: details.degree,
            position: details.position,
            years_experience: details.years_experience,
            specialty_ids: details.specialty_ids,
            avatar_url: details.avatar_url,
            is_active: true,
        };
        self.doctors.push(profile.clone());
        Ok(profile)
    }

    fn list_doctors(&self, query: DoctorListQuery) -> UpstreamPage<DoctorProfile> {
        let search = query.search.as_deref().map(str::to_lowercase);
        let matches: Vec<DoctorProfile> = self
            .doctors
            .iter()
            .filter(|d| query.is_active.is_none_or(|active| d.is_active == active))
            .filter(|d| {
                query
                    .specialty_id
                    .as_ref()
                    .is_none_or(|s| d.specialty_ids.contains(s))
            })
            .filter(|d| {
                search.as_deref().is_none_or(|needle| {
                    self.accounts
                        .iter()
                        .find(|a| a.id == d.staff_account_id)
                        .is_some_and(|a| a.full_name.to_lowercase().contains(needle))
                })
            })
            .cloned()
            .collect();
        paginate(matches, query.page)
    }

    fn list_posts(&self, query: BlogListQuery) -> UpstreamPage<BlogPost> {
        let search = query.search.as_deref().map(str::to_lowercase);
        let matches: Vec<BlogPost> = self
            .posts
            .iter()
            .filter(|p| query.author_id.as_ref().is_none_or(|a| &p.author_id == a))
            .filter(|p| {
                search
                    .as_deref()
                    .is_none_or(|needle| p.title.to_lowercase().contains(needle))
            })
            .cloned()
            .collect();
        paginate(matches, query.page)
    }
}

fn paginate<T>(items: Vec<T>, page: PageQuery) -> UpstreamPage<T> {
    let page = page.normalized();
    let total = items.len() as u64;
    let skip = (page.page - 1).saturating_mul(page.limit) as usize;
    let data = items
        .into_iter()
        .skip(skip)
        .take(page.limit as usize)
        .collect();
    UpstreamPage { data, total }
}

/// Seeded upstream services answering every [`ServicePattern`].
#[derive(Clone)]
pub struct StandaloneServices {
    directory: Arc<RwLock<Directory>>,
}

impl StandaloneServices {
    /// Registers seeded services on `transport`.
    pub fn install(transport: &InMemoryTransport) -> Self {
        let services = Self {
            directory: Arc::new(RwLock::new(Directory::seeded())),
        };

        services.serve(transport, ServicePattern::StaffCreate, |dir, cmd| {
            dir.create_account(cmd)
        });
        services.serve(transport, ServicePattern::StaffDelete, |dir, q: IdQuery| {
            let before = dir.accounts.len();
            dir.accounts.retain(|a| a.id != q.id);
            if dir.accounts.len() == before {
                return Err(RemoteError::not_found(
                    ServicePattern::StaffDelete.as_str(),
                    format!("Staff account {} not found", q.id),
                ));
            }
            Ok(())
        });
        services.serve(transport, ServicePattern::StaffFindOne, |dir, q: IdQuery| {
            dir.accounts
                .iter()
                .find(|a| a.id == q.id)
                .cloned()
                .ok_or_else(|| {
                    RemoteError::not_found(
                        ServicePattern::StaffFindOne.as_str(),
                        format!("Staff account {} not found", q.id),
                    )
                })
        });
        services.serve(transport, ServicePattern::StaffFindByIds, |dir, q: IdsQuery| {
            Ok(dir
                .accounts
                .iter()
                .filter(|a| q.ids.contains(&a.id))
                .cloned()
                .collect::<Vec<_>>())
        });
        services.serve(transport, ServicePattern::DoctorProfileCreate, |dir, cmd| {
            dir.create_doctor(cmd)
        });
        services.serve(transport, ServicePattern::DoctorProfileDelete, |dir, q: IdQuery| {
            dir.doctors.retain(|d| d.id != q.id);
            Ok(())
        });
        services.serve(transport, ServicePattern::DoctorProfileFindOne, |dir, q: IdQuery| {
            dir.doctors
                .iter()
                .find(|d| d.id == q.id)
                .cloned()
                .ok_or_else(|| {
                    RemoteError::not_found(
                        ServicePattern::DoctorProfileFindOne.as_str(),
                        format!("Doctor {} not found", q.id),
                    )
                })
        });
        services.serve(transport, ServicePattern::DoctorProfileList, |dir, q| {
            Ok(dir.list_doctors(q))
        });
        services.serve(transport, ServicePattern::SpecialtyFindByIds, |dir, q: IdsQuery| {
            Ok(dir
                .specialties
                .iter()
                .filter(|s| q.ids.contains(&s.id))
                .cloned()
                .collect::<Vec<_>>())
        });
        services.serve(transport, ServicePattern::BlogList, |dir, q| {
            Ok(dir.list_posts(q))
        });

        services
    }

    /// Number of staff accounts currently stored.
    pub fn account_count(&self) -> usize {
        self.read(|dir| dir.accounts.len())
    }

    /// Number of doctor profiles currently stored.
    pub fn doctor_count(&self) -> usize {
        self.read(|dir| dir.doctors.len())
    }

    fn read<T>(&self, f: impl FnOnce(&Directory) -> T) -> T {
        f(&self.directory.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn serve<Req, Resp, F>(&self, transport: &InMemoryTransport, pattern: ServicePattern, f: F)
    where
        Req: DeserializeOwned + 'static,
        Resp: Serialize + 'static,
        F: Fn(&mut Directory, Req) -> rpc::Result<Resp> + Send + Sync + 'static,
    {
        let directory = self.directory.clone();
        transport.register(pattern, move |payload| {
            let request: Req = serde_json::from_value(payload)
                .map_err(|e| RemoteError::rejected(pattern.as_str(), 400, e.to_string()))?;
            let reply = {
                let mut dir = directory.write().unwrap_or_else(PoisonError::into_inner);
                f(&mut dir, request)?
            };
            serde_json::to_value(reply).map_err(|e| RemoteError::InvalidPayload {
                pattern: pattern.as_str().to_string(),
                reason: e.to_string(),
            })
        });
    }
}
