use std::sync::Arc;

use async_trait::async_trait;
use prefkit_security::Principal;
use preferences_sdk::{
    NamedPreference, Preference, PreferenceError, PreferenceForm, PreferenceGrid, PreferenceId,
    PreferencesClientV1,
};

use crate::domain::service::Service;

/// In-process client backed directly by the domain service.
pub struct LocalClient {
    service: Arc<Service>,
}

impl LocalClient {
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl PreferencesClientV1 for LocalClient {
    async fn get_any_by_usuario(
        &self,
        principal: &Principal,
        usuario: &str,
    ) -> Result<Vec<NamedPreference>, PreferenceError> {
        self.service
            .get_any_by_usuario(principal, usuario)
            .await
            .map_err(Into::into)
    }

    async fn get_grid_by_name(
        &self,
        principal: &Principal,
        usuario: &str,
        grid_name: &str,
    ) -> Result<PreferenceGrid, PreferenceError> {
        self.service
            .get_grid_by_name(principal, usuario, grid_name, None)
            .await
            .map_err(Into::into)
    }

    async fn get_form_by_name(
        &self,
        principal: &Principal,
        usuario: &str,
        form_name: &str,
    ) -> Result<PreferenceForm, PreferenceError> {
        self.service
            .get_form_by_name(principal, usuario, form_name, None)
            .await
            .map_err(Into::into)
    }

    async fn save(
        &self,
        principal: &Principal,
        preference: Preference,
    ) -> Result<PreferenceId, PreferenceError> {
        self.service
            .save(principal, preference)
            .await
            .map_err(Into::into)
    }

    async fn delete(&self, principal: &Principal, id: PreferenceId) -> Result<(), PreferenceError> {
        self.service.delete(principal, id).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::domain::access::AccessGate;
    use crate::domain::service::ServiceConfig;
    use crate::infra::storage::{GraphPreferenceRepository, MemoryGraphStore, RetryPolicy};

    fn client() -> LocalClient {
        let repo = GraphPreferenceRepository::new(
            Arc::new(MemoryGraphStore::new()),
            RetryPolicy::default(),
        );
        let service = Service::new(
            Arc::new(repo),
            AccessGate::new("cartera.read", vec!["ADMINLEGO".to_owned()]),
            ServiceConfig::default(),
        );
        LocalClient::new(Arc::new(service))
    }

    fn reader(name: &str) -> Principal {
        Principal::builder()
            .username(name)
            .scope("cartera.read")
            .build()
    }

    #[tokio::test]
    async fn saves_and_lists_through_the_client() {
        let client = client();
        let ana = reader("ana");

        let id = client
            .save(
                &ana,
                NamedPreference {
                    pref_name: "tema".to_owned(),
                    owner: "ana".to_owned(),
                    ..NamedPreference::default()
                }
                .into(),
            )
            .await
            .unwrap();
        assert!(id > 0);

        let found = client.get_any_by_usuario(&ana, "ana").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
    }

    #[tokio::test]
    async fn domain_errors_surface_as_sdk_errors() {
        let client = client();
        let nobody = Principal::builder().username("nobody").build();

        let err = client.get_any_by_usuario(&nobody, "nobody").await.unwrap_err();
        assert!(matches!(err, PreferenceError::Forbidden { .. }));

        let err = client.delete(&reader("ana"), 99).await.unwrap_err();
        assert!(matches!(err, PreferenceError::NotFound { .. }));
    }
}
