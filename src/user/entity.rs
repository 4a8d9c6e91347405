use crate::cache::Entity;
use crate::domain::{validation, User, UserCreate, UserPatch};
use crate::error::ValidationError;

impl Entity for User {
    type Id = String;
    type CreatePayload = UserCreate;
    type Patch = UserPatch;

    fn id(&self) -> &String {
        &self.id
    }

    fn apply_patch(&mut self, patch: &UserPatch) {
        self.apply(patch);
    }

    fn validate_create(payload: &UserCreate) -> Result<(), ValidationError> {
        validation::validate_create(payload)
    }

    fn validate_patch(patch: &UserPatch) -> Result<(), ValidationError> {
        validation::validate_patch(patch)
    }
}
