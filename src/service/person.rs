//! Person lookups on top of the generic service.

use super::GenericEntityService;
use crate::backend::CacheBackend;
use crate::error::{Error, Result};
use crate::key::CacheKeyBuilder;
use crate::mapper::Mapper;
use crate::model::{Person, PersonDto, PersonMapper, PersonStore};
use crate::page::{Page, PageRequest};

/// Entity service for persons.
pub type PersonService<S, B> = GenericEntityService<Person, PersonDto, S, PersonMapper, B>;

impl<S, B> GenericEntityService<Person, PersonDto, S, PersonMapper, B>
where
    S: PersonStore,
    B: CacheBackend,
{
    /// Persons whose first name, last name, email or DNI contains `text`.
    pub async fn get_by_filter(&self, text: &str) -> Result<Vec<PersonDto>> {
        let key = CacheKeyBuilder::for_lookup("filter", &text);
        self.cached_collection(&key, || async {
            let found = self.store().find_by_filter(text).await?;
            self.represent_all(found)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    pub async fn get_by_filter_paged(
        &self,
        text: &str,
        request: PageRequest,
    ) -> Result<Page<PersonDto>> {
        let (page, size) = (request.page().to_string(), request.size().to_string());
        let key = CacheKeyBuilder::build_composite(&["filter_paged", text, &page, &size]);
        self.cached_collection(&key, || async {
            let found = self.store().find_by_filter_paged(text, request).await?;
            self.represent_page(found)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    /// # Errors
    /// `NotFound` with `DNI_NOT_FOUND: {dni}`.
    pub async fn get_by_dni(&self, dni: &str) -> Result<PersonDto> {
        let key = CacheKeyBuilder::for_lookup("dni", &dni);
        self.cached_single(&key, || async {
            let found = self.store().find_by_dni(dni).await?;
            self.represent_found(found, "DNI", dni)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    /// # Errors
    /// `NotFound` with `EMAIL_NOT_FOUND: {email}`.
    pub async fn get_by_email(&self, email: &str) -> Result<PersonDto> {
        let key = CacheKeyBuilder::for_lookup("email", &email);
        self.cached_single(&key, || async {
            let found = self.store().find_by_email(email).await?;
            self.represent_found(found, "EMAIL", email)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    /// # Errors
    /// `NotFound` with `USERNAME_NOT_FOUND: {user_name}`.
    pub async fn get_by_username(&self, user_name: &str) -> Result<PersonDto> {
        let key = CacheKeyBuilder::for_lookup("username", &user_name);
        self.cached_single(&key, || async {
            let found = self.store().find_by_username(user_name).await?;
            self.represent_found(found, "USERNAME", user_name)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    fn represent_found(&self, found: Option<Person>, label: &str, key: &str) -> Result<PersonDto> {
        match found {
            Some(person) => self.mapper().to_representation(&person),
            None => Err(Error::NotFound(format!("{}_NOT_FOUND: {}", label, key))),
        }
    }
}
