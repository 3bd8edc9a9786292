//! Person entity with embedded account and address.

use super::{contains_ignore_case, merge_field, required};
use crate::entity::{Entity, EntityKind};
use crate::error::Result;
use crate::mapper::Mapper;
use crate::page::{Page, PageRequest};
use crate::repository::{Audited, FieldValue, InMemoryStore, Sortable, Store};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Undefined,
}

impl Gender {
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Undefined => "Undefined",
        }
    }
}

/// Access level of a person's account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Manager,
    Admin,
    SuperAdmin,
}

/// Login credentials embedded in a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccess {
    pub user_name: String,
    pub hashed_password: String,
    pub role: Role,
}

/// Public part of [`UserAccess`]. The password hash never leaves the entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccessDto {
    pub user_name: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

/// Stored person.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: Option<u64>,
    pub first_name: String,
    pub last_name: String,
    /// National identity document number, unique.
    pub dni: String,
    /// Unique.
    pub email: String,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub important: bool,
    pub user_access: Option<UserAccess>,
    pub address: Option<Address>,
    pub log_date_created: Option<DateTime<Utc>>,
    pub log_last_updated: Option<DateTime<Utc>>,
}

impl Person {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        dni: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Person {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            dni: dni.into(),
            email: email.into(),
            gender: None,
            phone: None,
            date_of_birth: None,
            important: false,
            user_access: None,
            address: None,
            log_date_created: None,
            log_last_updated: None,
        }
    }

    /// First name, last name, email or DNI contains `needle_lower`.
    pub fn matches_filter(&self, needle_lower: &str) -> bool {
        [&self.first_name, &self.last_name, &self.email, &self.dni]
            .into_iter()
            .any(|field| contains_ignore_case(field, needle_lower))
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_access.as_ref().map(|ua| ua.user_name.as_str())
    }
}

impl Entity for Person {
    type Id = u64;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn kind() -> EntityKind {
        EntityKind::Person
    }
}

impl Sortable for Person {
    fn field_value(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "firstName" => FieldValue::from(self.first_name.as_str()),
            "lastName" => FieldValue::from(self.last_name.as_str()),
            "dni" => FieldValue::from(self.dni.as_str()),
            "email" => FieldValue::from(self.email.as_str()),
            "gender" => FieldValue::from(self.gender.map(|g| g.label())),
            "dateOfBirth" => FieldValue::from(self.date_of_birth),
            "important" => FieldValue::Bool(self.important),
            _ => return None,
        };
        Some(value)
    }
}

impl Audited for Person {
    fn audit(&mut self, previous: Option<&Self>, now: DateTime<Utc>) {
        if let Some(previous) = previous {
            self.log_date_created = previous.log_date_created;
        }
        self.log_date_created = self.log_date_created.or(Some(now));
        self.log_last_updated = Some(now);
    }
}

/// API-facing shape of a person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDto {
    pub id: Option<u64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dni: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub important: Option<bool>,
    pub user_access: Option<UserAccessDto>,
    pub address: Option<Address>,
}

impl PersonDto {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        dni: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        PersonDto {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            dni: Some(dni.into()),
            email: Some(email.into()),
            ..PersonDto::default()
        }
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_access = Some(UserAccessDto {
            user_name: Some(user_name.into()),
            role: None,
        });
        self
    }
}

/// Converts between [`Person`] and [`PersonDto`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonMapper;

impl Mapper<Person, PersonDto> for PersonMapper {
    fn to_representation(&self, person: &Person) -> Result<PersonDto> {
        Ok(PersonDto {
            id: person.id,
            first_name: Some(person.first_name.clone()),
            last_name: Some(person.last_name.clone()),
            dni: Some(person.dni.clone()),
            email: Some(person.email.clone()),
            gender: person.gender,
            phone: person.phone.clone(),
            date_of_birth: person.date_of_birth,
            important: Some(person.important),
            user_access: person.user_access.as_ref().map(|ua| UserAccessDto {
                user_name: Some(ua.user_name.clone()),
                role: Some(ua.role),
            }),
            address: person.address.clone(),
        })
    }

    fn to_entity(&self, dto: &PersonDto) -> Result<Person> {
        let user_access = match &dto.user_access {
            Some(ua) => Some(UserAccess {
                user_name: required(&ua.user_name, "userAccess.userName")?,
                hashed_password: String::new(),
                role: ua.role.unwrap_or_default(),
            }),
            None => None,
        };

        Ok(Person {
            id: dto.id,
            first_name: required(&dto.first_name, "firstName")?,
            last_name: required(&dto.last_name, "lastName")?,
            dni: required(&dto.dni, "dni")?,
            email: required(&dto.email, "email")?,
            gender: dto.gender,
            phone: dto.phone.clone(),
            date_of_birth: dto.date_of_birth,
            important: dto.important.unwrap_or(false),
            user_access,
            address: dto.address.clone(),
            log_date_created: None,
            log_last_updated: None,
        })
    }

    /// Identifier, password hash and audit stamps are never merged.
    fn merge_into(&self, dto: &PersonDto, person: &mut Person) -> Result<()> {
        merge_field(&mut person.first_name, &dto.first_name);
        merge_field(&mut person.last_name, &dto.last_name);
        merge_field(&mut person.dni, &dto.dni);
        merge_field(&mut person.email, &dto.email);
        merge_field(&mut person.important, &dto.important);
        if dto.gender.is_some() {
            person.gender = dto.gender;
        }
        if dto.phone.is_some() {
            person.phone = dto.phone.clone();
        }
        if dto.date_of_birth.is_some() {
            person.date_of_birth = dto.date_of_birth;
        }
        if dto.address.is_some() {
            person.address = dto.address.clone();
        }

        if let Some(ua_dto) = &dto.user_access {
            match person.user_access.as_mut() {
                Some(ua) => {
                    merge_field(&mut ua.user_name, &ua_dto.user_name);
                    merge_field(&mut ua.role, &ua_dto.role);
                }
                None => {
                    person.user_access = Some(UserAccess {
                        user_name: required(&ua_dto.user_name, "userAccess.userName")?,
                        hashed_password: String::new(),
                        role: ua_dto.role.unwrap_or_default(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Person-specific queries on top of the generic store.
#[allow(async_fn_in_trait)]
pub trait PersonStore: Store<Person> {
    /// First name, last name, email or DNI contains `text`, ignoring case.
    async fn find_by_filter(&self, text: &str) -> Result<Vec<Person>>;

    /// Paged variant of [`PersonStore::find_by_filter`].
    async fn find_by_filter_paged(&self, text: &str, request: PageRequest)
        -> Result<Page<Person>>;

    async fn find_by_dni(&self, dni: &str) -> Result<Option<Person>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Person>>;

    async fn find_by_username(&self, user_name: &str) -> Result<Option<Person>>;
}

impl PersonStore for InMemoryStore<Person> {
    async fn find_by_filter(&self, text: &str) -> Result<Vec<Person>> {
        let needle = text.to_lowercase();
        self.find_matching(|p| p.matches_filter(&needle))
    }

    async fn find_by_filter_paged(
        &self,
        text: &str,
        request: PageRequest,
    ) -> Result<Page<Person>> {
        let needle = text.to_lowercase();
        let matching = self.find_matching(|p| p.matches_filter(&needle))?;
        Ok(Page::from_all(matching, request))
    }

    async fn find_by_dni(&self, dni: &str) -> Result<Option<Person>> {
        self.find_first_matching(|p| p.dni == dni)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Person>> {
        self.find_first_matching(|p| p.email == email)
    }

    async fn find_by_username(&self, user_name: &str) -> Result<Option<Person>> {
        self.find_first_matching(|p| p.user_name() == Some(user_name))
    }
}
