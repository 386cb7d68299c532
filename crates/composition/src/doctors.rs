//! Doctor composites: profile + staff account + specialties.

use std::collections::HashMap;

use cache::keys;
use common::{PaginatedResponse, batch_array, create_pagination_meta, merge_arrays_by_key, to_map};
use domain::{
    DoctorComposite, DoctorListQuery, DoctorProfile, IdQuery, IdsQuery, ServicePattern,
    Specialty, StaffAccount, UpstreamPage,
};
use futures_util::future::join_all;
use rpc::RemoteError;

use crate::composer::{Composed, ReadComposer, optional, unique_ids};
use crate::{CompositionError, Result};

impl ReadComposer {
    /// Returns the composite view of one doctor.
    ///
    /// The profile lookup is essential: a missing profile is
    /// [`CompositionError::NotFound`] and nothing is cached. Account and
    /// specialty lookups run in parallel and degrade to partial data.
    #[tracing::instrument(skip(self))]
    pub async fn doctor_composite(&self, id: &str) -> Result<DoctorComposite> {
        let key = keys::item(keys::DOCTORS, id);
        self.cached(&key, || self.load_doctor(id)).await
    }

    /// Returns one page of doctor composites.
    #[tracing::instrument(skip(self))]
    pub async fn doctor_list_composite(
        &self,
        query: DoctorListQuery,
    ) -> Result<PaginatedResponse<DoctorComposite>> {
        let query = DoctorListQuery {
            page: query.page.normalized(),
            ..query
        };
        let key = keys::list(keys::DOCTORS, &query.cache_fragment());
        self.cached(&key, || self.load_doctor_page(&query)).await
    }

    async fn load_doctor(&self, id: &str) -> Result<Composed<DoctorComposite>> {
        let retry = self.config.retry;
        let profile: Option<DoctorProfile> = match self
            .client
            .call_with_retry(ServicePattern::DoctorProfileFindOne, &IdQuery::new(id), retry)
            .await
        {
            Ok(profile) => profile,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        let profile = profile.ok_or_else(|| CompositionError::NotFound {
            resource: "doctor",
            id: id.to_string(),
        })?;

        let account_query = IdQuery::new(profile.staff_account_id.clone());
        let account_fut = self.client.call_with_retry::<_, Option<StaffAccount>>(
            ServicePattern::StaffFindOne,
            &account_query,
            retry,
        );
        let specialties_fut = self.fetch_specialties(&profile.specialty_ids);
        let (account, specialties) = tokio::join!(account_fut, specialties_fut);

        let (account, account_degraded) = optional("account", account);
        let (specialties, specialties_degraded) = optional("specialties", specialties);

        Ok(Composed {
            value: DoctorComposite {
                profile,
                account,
                specialties,
            },
            degraded: account_degraded || specialties_degraded,
        })
    }

    async fn load_doctor_page(
        &self,
        query: &DoctorListQuery,
    ) -> Result<Composed<PaginatedResponse<DoctorComposite>>> {
        let page: UpstreamPage<DoctorProfile> = self
            .client
            .call_with_retry(ServicePattern::DoctorProfileList, query, self.config.retry)
            .await?;

        let account_ids = unique_ids(page.data.iter().map(|p| &p.staff_account_id));
        let specialty_ids = unique_ids(page.data.iter().flat_map(|p| &p.specialty_ids));
        let (accounts, specialties) = tokio::join!(
            self.fetch_accounts(&account_ids),
            self.fetch_specialties(&specialty_ids),
        );
        let (accounts, accounts_degraded) = accounts;
        let (specialties, specialties_degraded) = optional("specialties", specialties);
        let specialties_by_id = to_map(specialties, |s| s.id.clone());

        let data = merge_arrays_by_key(
            page.data,
            accounts,
            |p| p.staff_account_id.clone(),
            |a| a.id.clone(),
            |profile, account| {
                let specialties = pick(&specialties_by_id, &profile.specialty_ids);
                DoctorComposite {
                    profile,
                    account: account.cloned(),
                    specialties,
                }
            },
        );

        let meta = create_pagination_meta(query.page.page, query.page.limit, page.total);
        Ok(Composed {
            value: PaginatedResponse::new(data, meta),
            degraded: accounts_degraded || specialties_degraded,
        })
    }

    /// Looks up specialties by id. An empty id list issues no call.
    async fn fetch_specialties(
        &self,
        ids: &[String],
    ) -> std::result::Result<Vec<Specialty>, RemoteError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .call_with_retry(
                ServicePattern::SpecialtyFindByIds,
                &IdsQuery::new(ids.to_vec()),
                self.config.retry,
            )
            .await
    }

    /// Looks up staff accounts in parallel batches.
    ///
    /// Failed batches are skipped; the flag reports whether any batch failed
    /// on transport.
    pub(crate) async fn fetch_accounts(&self, ids: &[String]) -> (Vec<StaffAccount>, bool) {
        let queries: Vec<IdsQuery> = batch_array(ids, self.config.batch_size)
            .into_iter()
            .map(IdsQuery::new)
            .collect();
        let results = join_all(queries.iter().map(|query| {
            self.client.call_with_retry::<_, Vec<StaffAccount>>(
                ServicePattern::StaffFindByIds,
                query,
                self.config.retry,
            )
        }))
        .await;

        let mut accounts = Vec::with_capacity(ids.len());
        let mut degraded = false;
        for result in results {
            let (batch, batch_degraded) = optional("accounts", result);
            accounts.extend(batch);
            degraded |= batch_degraded;
        }
        (accounts, degraded)
    }
}

fn pick(by_id: &HashMap<String, Specialty>, ids: &[String]) -> Vec<Specialty> {
    ids.iter().filter_map(|id| by_id.get(id).cloned()).collect()
}
